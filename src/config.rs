use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::constants::{DEFAULT_DATAPOINTS, DEFAULT_MAX_RETRIES, DEFAULT_REPETITIONS};
use crate::program::Program;

#[derive(Debug, Error)]
pub enum ConfigError {
	#[error("could not read program list {}", path.display())]
	Read {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error("invalid program list: {0}")]
	Parse(#[from] toml::de::Error),

	#[error("'programs' list must contain at least one entry")]
	NoPrograms,

	#[error("executable '{}' in entry {index} does not exist", executable.display())]
	MissingExecutable { index: usize, executable: PathBuf },

	#[error("{name} must be at least 1")]
	NotPositive { name: &'static str },

	#[error("core {core} is not available, this machine has {available} logical cores")]
	InvalidCore { core: usize, available: usize },
}

/// What to do with a repetition whose program did not run successfully
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum FailurePolicy {
	/// Discard the sample and redo the repetition
	#[default]
	Exclude,
	/// Keep the sample in the average
	Accept,
}

/// Scalar parameters of a measurement run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MeasurementConfig {
	/// Number of datapoints recorded per program
	pub datapoints: usize,
	/// Number of executions averaged into one datapoint
	pub repetitions: usize,
	/// Logical core the programs run on and whose counter is sampled
	pub core: usize,
	/// Redo budget per repetition, for invalid readings and for failed executions
	pub max_retries: usize,
	pub failure_policy: FailurePolicy,
}

impl Default for MeasurementConfig {
	fn default() -> Self {
		Self {
			datapoints: DEFAULT_DATAPOINTS,
			repetitions: DEFAULT_REPETITIONS,
			core: 0,
			max_retries: DEFAULT_MAX_RETRIES,
			failure_policy: FailurePolicy::default(),
		}
	}
}

impl MeasurementConfig {
	pub fn validate(&self) -> Result<(), ConfigError> {
		self.validate_with_cores(num_cpus::get())
	}

	fn validate_with_cores(&self, available: usize) -> Result<(), ConfigError> {
		if self.datapoints == 0 {
			return Err(ConfigError::NotPositive { name: "datapoints" });
		}
		if self.repetitions == 0 {
			return Err(ConfigError::NotPositive { name: "repetitions" });
		}
		if self.core >= available {
			return Err(ConfigError::InvalidCore {
				core: self.core,
				available,
			});
		}
		Ok(())
	}
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ProgramList {
	programs: Vec<Program>,
}

/// Parses a TOML program list without checking the executables
pub fn parse_programs(content: &str) -> Result<Vec<Program>, ConfigError> {
	let list: ProgramList = toml::from_str(content)?;
	Ok(list.programs)
}

/// Checks that the list is non-empty and that every executable exists
pub fn validate_programs(programs: &[Program]) -> Result<(), ConfigError> {
	if programs.is_empty() {
		return Err(ConfigError::NoPrograms);
	}
	for (index, program) in programs.iter().enumerate() {
		if !program.executable.is_file() {
			return Err(ConfigError::MissingExecutable {
				index,
				executable: program.executable.clone(),
			});
		}
	}
	Ok(())
}

/// Reads, parses and validates a program list file
pub fn load_programs(path: &Path) -> Result<Vec<Program>, ConfigError> {
	let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
		path: path.to_owned(),
		source,
	})?;
	let programs = parse_programs(&content)?;
	validate_programs(&programs)?;
	Ok(programs)
}
