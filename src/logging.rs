use std::fmt;
use std::sync::Arc;

use env_logger::Env;
use log::{Level, Log, Metadata, Record};

const LOG_TARGET: &str = "energy_toolkit";

/// Explicitly constructed logger, handed to the components that report progress.
///
/// Every clone writes to the same underlying logger, so messages keep the
/// order in which they were emitted.
#[derive(Clone)]
pub struct LogHandle {
	inner: Arc<dyn Log>,
}

impl LogHandle {
	pub fn new(logger: impl Log + 'static) -> Self {
		Self { inner: Arc::new(logger) }
	}

	/// Builds an `env_logger` backend filtered by `RUST_LOG`, or by `default_filter` when unset
	pub fn from_env(default_filter: &str) -> Self {
		let logger = env_logger::Builder::from_env(Env::default().default_filter_or(default_filter)).build();
		Self::new(logger)
	}

	/// Discards everything
	pub fn disabled() -> Self {
		Self::new(NullLogger)
	}

	pub fn enabled(&self, level: Level) -> bool {
		let metadata = Metadata::builder().level(level).target(LOG_TARGET).build();
		self.inner.enabled(&metadata)
	}

	pub fn log(&self, level: Level, args: fmt::Arguments<'_>) {
		if !self.enabled(level) {
			return;
		}
		self.inner.log(
			&Record::builder()
				.level(level)
				.target(LOG_TARGET)
				.args(args)
				.build(),
		);
	}

	pub fn error(&self, args: fmt::Arguments<'_>) {
		self.log(Level::Error, args);
	}

	pub fn warn(&self, args: fmt::Arguments<'_>) {
		self.log(Level::Warn, args);
	}

	pub fn info(&self, args: fmt::Arguments<'_>) {
		self.log(Level::Info, args);
	}

	pub fn debug(&self, args: fmt::Arguments<'_>) {
		self.log(Level::Debug, args);
	}

	pub fn flush(&self) {
		self.inner.flush();
	}
}

impl fmt::Debug for LogHandle {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("LogHandle").finish_non_exhaustive()
	}
}

struct NullLogger;

impl Log for NullLogger {
	fn enabled(&self, _metadata: &Metadata<'_>) -> bool {
		false
	}

	fn log(&self, _record: &Record<'_>) {}

	fn flush(&self) {}
}


#[cfg(test)]
mod tests {
	use super::testing::CapturingLogger;
	use super::*;

	#[test]
	fn clones_share_the_same_sink_in_order() {
		let capture = CapturingLogger::default();
		let handle = LogHandle::new(capture.clone());
		let other = handle.clone();

		handle.info(format_args!("first {}", 1));
		other.warn(format_args!("second"));
		handle.debug(format_args!("third"));

		assert_eq!(
			capture.records(),
			vec![
				(Level::Info, "first 1".to_owned()),
				(Level::Warn, "second".to_owned()),
				(Level::Debug, "third".to_owned()),
			]
		);
	}

	#[test]
	fn disabled_handle_accepts_everything() {
		let handle = LogHandle::disabled();
		assert!(!handle.enabled(Level::Error));
		handle.error(format_args!("dropped"));
	}
}
