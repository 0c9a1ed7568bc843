use std::io;
use std::path::PathBuf;

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};

use energy_toolkit::config::{self, MeasurementConfig};
use energy_toolkit::constants::{DEFAULT_DATAPOINTS, DEFAULT_MAX_RETRIES, DEFAULT_OUTPUT_DIR, DEFAULT_REPETITIONS};
use energy_toolkit::{FailurePolicy, LogHandle, report};

/// Energy toolkit - measure and analyze the energy consumption of programs.
#[derive(Parser)]
#[command(version, about)]
struct Cli {
	#[command(subcommand)]
	command: Command,
}

#[derive(Subcommand)]
enum Command {
	/// Measure the energy consumption of the executables listed in the PROGRAMS file.
	///
	/// Energy is read from the RAPL counters of the selected core. The datapoints
	/// and derived statistics are saved to the output directory.
	Measure {
		/// TOML file listing the programs to measure
		programs: PathBuf,

		/// Core the measurement should be performed on
		#[arg(short, long, default_value_t = 0)]
		core: usize,

		/// Repetitions averaged into one datapoint
		#[arg(short, long, default_value_t = DEFAULT_REPETITIONS)]
		repetitions: usize,

		/// Datapoints collected per program
		#[arg(short, long, default_value_t = DEFAULT_DATAPOINTS)]
		datapoints: usize,

		/// Output directory for results
		#[arg(short, long, default_value = DEFAULT_OUTPUT_DIR)]
		output: PathBuf,

		/// Redo budget per repetition for invalid readings and failed executions
		#[arg(long, default_value_t = DEFAULT_MAX_RETRIES)]
		max_retries: usize,

		/// How to treat a repetition whose program fails
		#[arg(long, value_enum, default_value_t = FailurePolicy::Exclude)]
		on_failure: FailurePolicy,

		/// Output debug messages
		#[arg(short, long)]
		verbose: bool,

		/// Print statistics after execution
		#[arg(short, long)]
		stats: bool,
	},

	/// Check that a PROGRAMS file is valid
	Validate {
		/// TOML file listing the programs to measure
		programs: PathBuf,
	},
}

fn is_admin() -> bool {
	unsafe { libc::geteuid() == 0 }
}

fn main() -> anyhow::Result<()> {
	match Cli::parse().command {
		Command::Measure {
			programs,
			core,
			repetitions,
			datapoints,
			output,
			max_retries,
			on_failure,
			verbose,
			stats,
		} => {
			if !is_admin() {
				bail!("measure has to be run with elevated rights (e.g. sudo), otherwise the energy counters cannot be read");
			}
			let log = LogHandle::from_env(if verbose { "debug" } else { "info" });

			let config = MeasurementConfig {
				datapoints,
				repetitions,
				core,
				max_retries,
				failure_policy: on_failure,
			};
			config.validate()?;

			log.debug(format_args!("Validating programs configuration {}", programs.display()));
			let programs = config::load_programs(&programs)?;
			log.debug(format_args!("Configuration valid, {} programs", programs.len()));
			log.debug(format_args!("Resulting files will be saved at {}", output.display()));

			let campaign = energy_toolkit::measure_programs(config, programs, &output, log.clone())?;

			if stats {
				report::print_statistics(&mut io::stdout().lock(), campaign.programs(), campaign.statistics())
					.context("failed to print statistics")?;
			}
			log.flush();
			Ok(())
		},
		Command::Validate { programs } => {
			let log = LogHandle::from_env("info");
			log.info(format_args!("Validating programs file {}", programs.display()));
			match config::load_programs(&programs) {
				Ok(list) => {
					log.info(format_args!("Configuration valid, {} programs", list.len()));
					Ok(())
				},
				Err(e) => {
					log.error(format_args!("Programs config invalid: {e}"));
					Err(e.into())
				},
			}
		},
	}
}
