use std::fs::File;
use std::io;
use std::os::unix::process::CommandExt;
use std::path::PathBuf;
use std::process::{Command, ExitStatus, Stdio};

use thiserror::Error;

use crate::program::Program;

#[derive(Debug, Error)]
pub enum ExecutionError {
	#[error("could not open input file {}", path.display())]
	Input {
		path: PathBuf,
		#[source]
		source: io::Error,
	},

	#[error("failed to launch {} on core {core}", executable.display())]
	Launch {
		executable: PathBuf,
		core: usize,
		#[source]
		source: io::Error,
	},

	#[error("{} exited unsuccessfully ({status})", executable.display())]
	Exit { executable: PathBuf, status: ExitStatus },
}

/// Runs a program to completion on one core.
///
/// Launching is split in two steps so that callers can time only the run:
/// [`prepare`](Executor::prepare) does the setup that is not part of the
/// program's execution, [`run`](Executor::run) spawns it and waits.
pub trait Executor {
	type Prepared;

	fn prepare(&mut self, program: &Program, core: usize) -> Result<Self::Prepared, ExecutionError>;

	fn run(&mut self, prepared: Self::Prepared) -> Result<(), ExecutionError>;

	fn execute(&mut self, program: &Program, core: usize) -> Result<(), ExecutionError> {
		let prepared = self.prepare(program, core)?;
		self.run(prepared)
	}
}

/// Spawns programs with a hard CPU affinity set before `exec`.
///
/// Output is discarded, stdin comes from the program's input file or is empty.
#[derive(Debug, Clone, Copy, Default)]
pub struct PinnedRunner;

impl PinnedRunner {
	pub fn new() -> Self {
		Self
	}
}

/// A command with its input file already opened, ready to be spawned
#[derive(Debug)]
pub struct PinnedCommand {
	command: Command,
	executable: PathBuf,
	core: usize,
}

impl Executor for PinnedRunner {
	type Prepared = PinnedCommand;

	fn prepare(&mut self, program: &Program, core: usize) -> Result<PinnedCommand, ExecutionError> {
		let stdin = match &program.input_file {
			Some(path) => Stdio::from(File::open(path).map_err(|source| ExecutionError::Input {
				path: path.clone(),
				source,
			})?),
			None => Stdio::null(),
		};

		let mut command = Command::new(&program.executable);
		command
			.args(&program.arguments)
			.stdin(stdin)
			.stdout(Stdio::null())
			.stderr(Stdio::null());

		// Runs in the forked child, the affinity is inherited by the exec'd image.
		unsafe {
			command.pre_exec(move || pin_to_core(core));
		}

		Ok(PinnedCommand {
			command,
			executable: program.executable.clone(),
			core,
		})
	}

	fn run(&mut self, mut prepared: PinnedCommand) -> Result<(), ExecutionError> {
		let status = prepared.command.status().map_err(|source| ExecutionError::Launch {
			executable: prepared.executable.clone(),
			core: prepared.core,
			source,
		})?;

		if status.success() {
			Ok(())
		} else {
			Err(ExecutionError::Exit {
				executable: prepared.executable,
				status,
			})
		}
	}
}

/// Restricts the calling process to a single logical core
#[cfg(target_os = "linux")]
pub fn pin_to_core(core: usize) -> io::Result<()> {
	use std::mem::MaybeUninit;

	if core >= libc::CPU_SETSIZE as usize {
		return Err(io::Error::from_raw_os_error(libc::EINVAL));
	}

	unsafe {
		let mut set = MaybeUninit::<libc::cpu_set_t>::zeroed();
		let set_ref = set.assume_init_mut();

		libc::CPU_ZERO(set_ref);
		libc::CPU_SET(core, set_ref);

		let result = libc::sched_setaffinity(0, std::mem::size_of::<libc::cpu_set_t>(), set_ref);

		if result == 0 {
			Ok(())
		} else {
			Err(io::Error::last_os_error())
		}
	}
}

#[cfg(not(target_os = "linux"))]
pub fn pin_to_core(_core: usize) -> io::Result<()> {
	Err(io::Error::new(io::ErrorKind::Unsupported, "hard CPU affinity is only available on Linux"))
}
