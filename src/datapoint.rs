use std::collections::{BTreeMap, BTreeSet};

/// Energy and execution time averaged over a number of repetitions
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Datapoint {
	/// Energy in joules
	pub energy: f64,
	/// Wall-clock time in seconds
	pub time: f64,
}

impl Datapoint {
	pub fn new(energy: f64, time: f64) -> Self {
		Self { energy, time }
	}

	/// Averages the given (energy, time) samples, `None` when there are none
	pub fn average(samples: &[(f64, f64)]) -> Option<Self> {
		if samples.is_empty() {
			return None;
		}
		let n = samples.len() as f64;
		let (energy, time) = samples
			.iter()
			.fold((0.0, 0.0), |(e, t), &(energy, time)| (e + energy, t + time));
		Some(Self::new(energy / n, time / n))
	}
}

/// Datapoints recorded for each program, keyed by the program index
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeasurementResult {
	datapoints: BTreeMap<usize, Vec<Datapoint>>,
	abandoned: BTreeSet<usize>,
}

impl MeasurementResult {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn push(&mut self, program: usize, datapoint: Datapoint) {
		self.datapoints.entry(program).or_default().push(datapoint);
	}

	/// Drops the datapoints of a program that could not be measured
	pub fn abandon(&mut self, program: usize) {
		self.datapoints.remove(&program);
		self.abandoned.insert(program);
	}

	pub fn get(&self, program: usize) -> Option<&[Datapoint]> {
		self.datapoints.get(&program).map(Vec::as_slice)
	}

	/// Iterates over the programs in index order
	pub fn iter(&self) -> impl Iterator<Item = (usize, &[Datapoint])> {
		self.datapoints.iter().map(|(&index, points)| (index, points.as_slice()))
	}

	/// Indices of the programs that were abandoned during the run
	pub fn abandoned(&self) -> impl Iterator<Item = usize> + '_ {
		self.abandoned.iter().copied()
	}

	pub fn len(&self) -> usize {
		self.datapoints.len()
	}

	pub fn is_empty(&self) -> bool {
		self.datapoints.is_empty()
	}
}

impl FromIterator<(usize, Vec<Datapoint>)> for MeasurementResult {
	fn from_iter<T: IntoIterator<Item = (usize, Vec<Datapoint>)>>(iter: T) -> Self {
		Self {
			datapoints: iter.into_iter().collect(),
			abandoned: BTreeSet::new(),
		}
	}
}
