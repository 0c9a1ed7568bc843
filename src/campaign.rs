use std::error::Error as _;
use std::time::Instant;

use thiserror::Error;

use crate::config::{ConfigError, FailurePolicy, MeasurementConfig};
use crate::cpu_type::CpuVendor;
use crate::datapoint::{Datapoint, MeasurementResult};
use crate::energy::{EnergyCounter, EnergyError, MsrEnergyReader};
use crate::logging::LogHandle;
use crate::program::Program;
use crate::runner::{ExecutionError, Executor, PinnedRunner};
use crate::statistics::{Statistics, StatisticsError};
use crate::util::energy_delta;

#[derive(Debug, Error)]
pub enum MeasureError {
	#[error("{0} CPUs expose no energy counters")]
	UnsupportedVendor(CpuVendor),

	#[error(transparent)]
	Config(#[from] ConfigError),

	#[error(transparent)]
	Counter(#[from] EnergyError),

	#[error("energy counter of core {core} gave no valid reading in {attempts} attempts")]
	CounterUnreadable { core: usize, attempts: usize },

	#[error(transparent)]
	Statistics(#[from] StatisticsError),
}

/// Measures a list of programs one after another on a single core.
///
/// Each program is executed `datapoints × repetitions` times. The energy
/// counter is sampled right before and right after every execution, and the
/// samples of `repetitions` executions are averaged into one [`Datapoint`].
pub struct Campaign<C, E> {
	config: MeasurementConfig,
	vendor: CpuVendor,
	programs: Vec<Program>,
	counter: C,
	executor: E,
	log: LogHandle,
	results: MeasurementResult,
	statistics: Statistics,
}

impl Campaign<MsrEnergyReader, PinnedRunner> {
	/// Campaign reading the MSR energy counters and spawning real processes
	pub fn with_hardware(config: MeasurementConfig, vendor: CpuVendor, log: LogHandle) -> Self {
		Self::new(config, vendor, MsrEnergyReader::new(), PinnedRunner::new(), log)
	}
}

impl<C: EnergyCounter, E: Executor> Campaign<C, E> {
	pub fn new(config: MeasurementConfig, vendor: CpuVendor, counter: C, executor: E, log: LogHandle) -> Self {
		Self {
			config,
			vendor,
			programs: Vec::new(),
			counter,
			executor,
			log,
			results: MeasurementResult::new(),
			statistics: Statistics::default(),
		}
	}

	/// Adds a program at the end of the list, its index is its position
	pub fn add_program(&mut self, program: Program) -> usize {
		self.programs.push(program);
		self.programs.len() - 1
	}

	pub fn clear_programs(&mut self) {
		self.programs.clear();
	}

	pub fn programs(&self) -> &[Program] {
		&self.programs
	}

	pub fn config(&self) -> &MeasurementConfig {
		&self.config
	}

	pub fn vendor(&self) -> CpuVendor {
		self.vendor
	}

	/// Datapoints of the last successful run, empty after a failed one
	pub fn results(&self) -> &MeasurementResult {
		&self.results
	}

	/// Statistics of the last successful run, empty after a failed one
	pub fn statistics(&self) -> &Statistics {
		&self.statistics
	}

	/// Runs every program and replaces the previous results and statistics.
	///
	/// Fails before executing anything when the vendor has no energy counters
	/// or when the counter interface of the core cannot be opened. Any failure
	/// leaves both the results and the statistics empty.
	pub fn measure(&mut self) -> Result<(), MeasureError> {
		self.results = MeasurementResult::new();
		self.statistics = Statistics::default();

		if self.config.datapoints == 0 {
			return Err(ConfigError::NotPositive { name: "datapoints" }.into());
		}
		if self.config.repetitions == 0 {
			return Err(ConfigError::NotPositive { name: "repetitions" }.into());
		}
		if !self.vendor.has_energy_counters() {
			return Err(MeasureError::UnsupportedVendor(self.vendor));
		}
		self.counter.check_access(self.vendor, self.config.core)?;

		let mut results = MeasurementResult::new();
		let mut sampler = Sampler {
			config: self.config,
			vendor: self.vendor,
			counter: &mut self.counter,
			executor: &mut self.executor,
			log: &self.log,
		};
		for (index, program) in self.programs.iter().enumerate() {
			sampler.measure_program(index, program, &mut results)?;
		}

		self.statistics = Statistics::compute(&results)?;
		self.results = results;
		self.log.info(format_args!(
			"Measured {} of {} programs on core {}",
			self.results.len(),
			self.programs.len(),
			self.config.core
		));
		Ok(())
	}
}

/// Position of a repetition within the run, for log correlation
#[derive(Debug, Clone, Copy)]
struct Position<'p> {
	index: usize,
	program: &'p Program,
	datapoint: usize,
	repetition: usize,
}

enum Sample {
	Valid { energy: f64, time: f64 },
	Abandoned { failures: usize },
}

struct Sampler<'a, C, E> {
	config: MeasurementConfig,
	vendor: CpuVendor,
	counter: &'a mut C,
	executor: &'a mut E,
	log: &'a LogHandle,
}

impl<C: EnergyCounter, E: Executor> Sampler<'_, C, E> {
	fn measure_program(
		&mut self,
		index: usize,
		program: &Program,
		results: &mut MeasurementResult,
	) -> Result<(), MeasureError> {
		self.log.info(format_args!("Measuring program {index}: {program}"));

		for datapoint in 1..=self.config.datapoints {
			let mut samples = Vec::with_capacity(self.config.repetitions);
			for repetition in 1..=self.config.repetitions {
				let position = Position {
					index,
					program,
					datapoint,
					repetition,
				};
				match self.sample(position)? {
					Sample::Valid { energy, time } => samples.push((energy, time)),
					Sample::Abandoned { failures } => {
						self.log.error(format_args!(
							"Abandoning program {index} ({}): {failures} failed executions in datapoint {datapoint}, repetition {repetition}",
							program.executable.display()
						));
						results.abandon(index);
						return Ok(());
					},
				}
			}

			if let Some(point) = Datapoint::average(&samples) {
				self.log.debug(format_args!(
					"Program {index}, datapoint {datapoint}/{}: {:.6} J in {:.6} s",
					self.config.datapoints, point.energy, point.time
				));
				results.push(index, point);
			}
		}

		self.log.info(format_args!(
			"Program {index} complete: {} datapoints of {} repetitions",
			self.config.datapoints, self.config.repetitions
		));
		Ok(())
	}

	/// Executes the program once between two counter readings.
	///
	/// Attempts with an invalid reading, or with a failed execution under
	/// [`FailurePolicy::Exclude`], are redone and do not count as a repetition.
	fn sample(&mut self, at: Position<'_>) -> Result<Sample, MeasureError> {
		let core = self.config.core;
		let mut invalid_readings = 0;
		let mut failed_executions = 0;

		loop {
			let prepared = self.executor.prepare(at.program, core);

			let start = Instant::now();
			let before = self.counter.read(self.vendor, core)?;
			let outcome = prepared.and_then(|command| self.executor.run(command));
			let after = self.counter.read(self.vendor, core)?;
			let time = start.elapsed().as_secs_f64();

			if let Err(e) = outcome {
				self.report_failure(&at, &e);
				if self.config.failure_policy == FailurePolicy::Exclude {
					failed_executions += 1;
					if failed_executions > self.config.max_retries {
						return Ok(Sample::Abandoned {
							failures: failed_executions,
						});
					}
					continue;
				}
			}

			if !(before > 0.0 && after > 0.0) {
				invalid_readings += 1;
				if invalid_readings > self.config.max_retries {
					return Err(MeasureError::CounterUnreadable {
						core,
						attempts: invalid_readings,
					});
				}
				self.log.debug(format_args!(
					"Invalid energy reading ({before} J, {after} J) for program {} in datapoint {}, repetition {}, retrying",
					at.index, at.datapoint, at.repetition
				));
				continue;
			}

			let span = if after < before {
				self.counter.wrap_span(self.vendor, core)?
			} else {
				None
			};
			let (energy, wrapped) = energy_delta(before, after, span);
			if wrapped {
				match span {
					Some(_) => self.log.warn(format_args!(
						"Energy counter of core {core} wrapped around during program {} (datapoint {}, repetition {}), corrected delta {energy:.6} J",
						at.index, at.datapoint, at.repetition
					)),
					None => self.log.warn(format_args!(
						"Energy counter of core {core} went backwards during program {} (datapoint {}, repetition {}), delta {energy:.6} J",
						at.index, at.datapoint, at.repetition
					)),
				}
			}
			return Ok(Sample::Valid { energy, time });
		}
	}

	fn report_failure(&self, at: &Position<'_>, error: &ExecutionError) {
		let cause = error.source().map(|s| format!(": {s}")).unwrap_or_default();
		self.log.warn(format_args!(
			"Program {} ({}) failed in datapoint {}, repetition {}: {error}{cause}",
			at.index,
			at.program.executable.display(),
			at.datapoint,
			at.repetition
		));
	}
}
