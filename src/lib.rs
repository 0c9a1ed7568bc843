pub mod campaign;
pub mod config;
pub mod constants;
pub mod cpu_type;
pub mod datapoint;
pub mod energy;
pub mod logging;
pub mod program;
pub mod report;
pub mod runner;
pub mod statistics;
pub mod util;

use std::path::Path;

use anyhow::Context;

pub use crate::campaign::{Campaign, MeasureError};
pub use crate::config::{FailurePolicy, MeasurementConfig};
pub use crate::cpu_type::CpuVendor;
pub use crate::datapoint::{Datapoint, MeasurementResult};
pub use crate::energy::{EnergyCounter, EnergyError, MsrEnergyReader};
pub use crate::logging::LogHandle;
pub use crate::program::Program;
pub use crate::runner::{ExecutionError, Executor, PinnedRunner};
pub use crate::statistics::{MetricStatistics, ProgramStatistics, Statistics};

/// Measures the programs on the hardware counters and writes the result files
///
/// This is the main entry point of the measurement functionality. The
/// returned campaign holds the results and statistics of the run.
pub fn measure_programs(
	config: MeasurementConfig,
	programs: Vec<Program>,
	output: &Path,
	log: LogHandle,
) -> anyhow::Result<Campaign<MsrEnergyReader, PinnedRunner>> {
	let vendor = cpu_type::detect_cpu_vendor();
	log.info(format_args!("Detected {vendor} CPU"));

	let mut campaign = Campaign::with_hardware(config, vendor, log.clone());
	for program in programs {
		campaign.add_program(program);
	}

	log.info(format_args!(
		"Recording {} datapoints of {} repetitions per program on core {}",
		config.datapoints, config.repetitions, config.core
	));
	campaign.measure()?;

	let stale = report::remove_stale_results(output, campaign.results())
		.with_context(|| format!("failed to clean up previous results in {}", output.display()))?;
	for dir in &stale {
		log.debug(format_args!("Removed stale results in {}", dir.display()));
	}
	let results = report::write_results(output, campaign.results())
		.with_context(|| format!("failed to write results to {}", output.display()))?;
	let statistics = report::write_statistics(output, campaign.statistics())
		.with_context(|| format!("failed to write statistics to {}", output.display()))?;
	log.info(format_args!(
		"Wrote {} result and {} statistics files to {}",
		results.len(),
		statistics.len(),
		output.display()
	));
	for index in campaign.results().abandoned() {
		log.warn(format_args!("Program {index} was abandoned and has no result files"));
	}

	Ok(campaign)
}
