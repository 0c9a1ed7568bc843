use std::fmt;
use std::path::PathBuf;

use serde::Deserialize;

/// An executable to measure, with its arguments and optional stdin file
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Program {
	pub executable: PathBuf,
	#[serde(default, rename = "args")]
	pub arguments: Vec<String>,
	#[serde(default, rename = "input")]
	pub input_file: Option<PathBuf>,
}

impl Program {
	pub fn new(executable: impl Into<PathBuf>) -> Self {
		Self {
			executable: executable.into(),
			arguments: Vec::new(),
			input_file: None,
		}
	}

	pub fn with_args<I, S>(mut self, args: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.arguments = args.into_iter().map(Into::into).collect();
		self
	}

	pub fn with_input(mut self, input_file: impl Into<PathBuf>) -> Self {
		self.input_file = Some(input_file.into());
		self
	}
}

impl fmt::Display for Program {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.executable.display())?;
		for arg in &self.arguments {
			write!(f, " {arg}")?;
		}
		if let Some(input) = &self.input_file {
			write!(f, " < {}", input.display())?;
		}
		Ok(())
	}
}
