use std::collections::BTreeMap;

use thiserror::Error;

use crate::datapoint::{Datapoint, MeasurementResult};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StatisticsError {
	#[error("program {program} has no datapoints")]
	EmptyDatapoints { program: usize },
}

/// Mean, population variance and standard deviation of one metric
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MetricStatistics {
	pub mean: f64,
	pub variance: f64,
	pub std_deviation: f64,
}

impl MetricStatistics {
	/// Returns `None` for an empty sample
	pub fn from_samples(samples: impl ExactSizeIterator<Item = f64> + Clone) -> Option<Self> {
		let n = samples.len();
		if n == 0 {
			return None;
		}
		let mean = samples.clone().sum::<f64>() / n as f64;
		let variance = samples.map(|x| (x - mean).powi(2)).sum::<f64>() / n as f64;
		Some(Self {
			mean,
			variance,
			std_deviation: variance.sqrt(),
		})
	}
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProgramStatistics {
	pub time: MetricStatistics,
	pub energy: MetricStatistics,
}

impl ProgramStatistics {
	pub fn from_datapoints(program: usize, datapoints: &[Datapoint]) -> Result<Self, StatisticsError> {
		let empty = || StatisticsError::EmptyDatapoints { program };
		Ok(Self {
			time: MetricStatistics::from_samples(datapoints.iter().map(|d| d.time)).ok_or_else(empty)?,
			energy: MetricStatistics::from_samples(datapoints.iter().map(|d| d.energy)).ok_or_else(empty)?,
		})
	}
}

/// Per-program statistics, keyed by the same index as the [`MeasurementResult`]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Statistics {
	programs: BTreeMap<usize, ProgramStatistics>,
}

impl Statistics {
	/// Reduces every program's datapoints. Fails on the first program without any.
	pub fn compute(result: &MeasurementResult) -> Result<Self, StatisticsError> {
		let programs: BTreeMap<usize, ProgramStatistics> = result
			.iter()
			.map(|(index, datapoints)| ProgramStatistics::from_datapoints(index, datapoints).map(|stats| (index, stats)))
			.collect::<Result<_, _>>()?;
		Ok(Self { programs })
	}

	pub fn get(&self, program: usize) -> Option<&ProgramStatistics> {
		self.programs.get(&program)
	}

	pub fn iter(&self) -> impl Iterator<Item = (usize, &ProgramStatistics)> {
		self.programs.iter().map(|(&index, stats)| (index, stats))
	}

	pub fn len(&self) -> usize {
		self.programs.len()
	}

	pub fn is_empty(&self) -> bool {
		self.programs.is_empty()
	}
}
