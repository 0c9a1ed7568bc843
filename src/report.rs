use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::datapoint::MeasurementResult;
use crate::program::Program;
use crate::statistics::{MetricStatistics, Statistics};

// Column headers are parsed by name by the plotting tool
pub const RESULTS_FILE: &str = "results.csv";
pub const RESULTS_HEADER: [&str; 2] = ["# Time", "Energy"];
pub const STATISTICS_FILE: &str = "statistics.csv";
pub const STATISTICS_HEADER: [&str; 4] = ["# Metric", "Mean", "Variance", "StdDeviation"];

fn program_dir(base: &Path, index: usize) -> io::Result<PathBuf> {
	let dir = base.join(index.to_string());
	fs::create_dir_all(&dir)?;
	Ok(dir)
}

/// Removes numbered program directories under `base` that hold no result of this run
///
/// Directories of abandoned programs, and of programs beyond the end of the
/// current list, would otherwise keep the files of an earlier run.
///
/// # Returns
///
/// The removed directories, in index order
pub fn remove_stale_results(base: &Path, result: &MeasurementResult) -> io::Result<Vec<PathBuf>> {
	let entries = match fs::read_dir(base) {
		Ok(entries) => entries,
		Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
		Err(e) => return Err(e),
	};

	let mut stale = Vec::new();
	for entry in entries {
		let entry = entry?;
		let Some(index) = entry.file_name().to_str().and_then(|name| name.parse::<usize>().ok()) else {
			continue;
		};
		if entry.file_type()?.is_dir() && result.get(index).is_none() {
			stale.push((index, entry.path()));
		}
	}
	stale.sort_unstable_by_key(|(index, _)| *index);

	for (_, dir) in &stale {
		fs::remove_dir_all(dir)?;
	}
	Ok(stale.into_iter().map(|(_, dir)| dir).collect())
}

fn write_row<W: Write>(writer: &mut W, fields: &[&str]) -> io::Result<()> {
	writeln!(writer, "{}", fields.join(","))
}

/// Writes `<base>/<index>/results.csv` for every measured program
///
/// # Returns
///
/// The paths of the written files, in program order
pub fn write_results(base: &Path, result: &MeasurementResult) -> io::Result<Vec<PathBuf>> {
	let mut written = Vec::with_capacity(result.len());
	for (index, datapoints) in result.iter() {
		let path = program_dir(base, index)?.join(RESULTS_FILE);
		let mut writer = BufWriter::new(File::create(&path)?);
		write_row(&mut writer, &RESULTS_HEADER)?;
		for point in datapoints {
			writeln!(writer, "{},{}", point.time, point.energy)?;
		}
		writer.flush()?;
		written.push(path);
	}
	Ok(written)
}

/// Writes `<base>/<index>/statistics.csv` for every measured program
pub fn write_statistics(base: &Path, statistics: &Statistics) -> io::Result<Vec<PathBuf>> {
	let mut written = Vec::with_capacity(statistics.len());
	for (index, stats) in statistics.iter() {
		let path = program_dir(base, index)?.join(STATISTICS_FILE);
		let mut writer = BufWriter::new(File::create(&path)?);
		write_row(&mut writer, &STATISTICS_HEADER)?;
		write_metric(&mut writer, "Time", &stats.time)?;
		write_metric(&mut writer, "Energy", &stats.energy)?;
		writer.flush()?;
		written.push(path);
	}
	Ok(written)
}

fn write_metric<W: Write>(writer: &mut W, name: &str, metric: &MetricStatistics) -> io::Result<()> {
	writeln!(
		writer,
		"{name},{},{},{}",
		metric.mean, metric.variance, metric.std_deviation
	)
}

/// Prints a table with the statistics of every program
pub fn print_statistics<W: Write>(out: &mut W, programs: &[Program], statistics: &Statistics) -> io::Result<()> {
	writeln!(
		out,
		"{:<4} {:<32} {:>14} {:>14} {:>14} {:>14}",
		"#", "Program", "Time (s)", "σ Time", "Energy (J)", "σ Energy"
	)?;
	for (index, stats) in statistics.iter() {
		let name = programs
			.get(index)
			.map(|p| p.executable.display().to_string())
			.unwrap_or_else(|| "?".to_owned());
		writeln!(
			out,
			"{:<4} {:<32} {:>14.6} {:>14.6} {:>14.6} {:>14.6}",
			index, name, stats.time.mean, stats.time.std_deviation, stats.energy.mean, stats.energy.std_deviation
		)?;
	}
	out.flush()
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::datapoint::Datapoint;
	use pretty_assertions::assert_eq;

	fn sample_result() -> MeasurementResult {
		[
			(0, vec![Datapoint::new(2.5, 0.5), Datapoint::new(4.5, 0.25)]),
			(2, vec![Datapoint::new(1.0, 0.125)]),
		]
		.into_iter()
		.collect()
	}

	#[test]
	fn results_file_per_program() -> anyhow::Result<()> {
		let dir = tempfile::tempdir()?;
		let written = write_results(dir.path(), &sample_result())?;

		assert_eq!(
			written,
			vec![dir.path().join("0/results.csv"), dir.path().join("2/results.csv")]
		);
		assert_eq!(
			fs::read_to_string(&written[0])?,
			"# Time,Energy\n0.5,2.5\n0.25,4.5\n"
		);
		assert_eq!(fs::read_to_string(&written[1])?, "# Time,Energy\n0.125,1\n");
		Ok(())
	}

	#[test]
	fn statistics_file_per_program() -> anyhow::Result<()> {
		let dir = tempfile::tempdir()?;
		let stats = Statistics::compute(&sample_result())?;
		let written = write_statistics(dir.path(), &stats)?;

		assert_eq!(written.len(), 2);
		assert_eq!(
			fs::read_to_string(&written[1])?,
			"# Metric,Mean,Variance,StdDeviation\nTime,0.125,0,0\nEnergy,1,0,0\n"
		);
		let first = fs::read_to_string(&written[0])?;
		assert!(first.contains("\nEnergy,3.5,1,1\n"), "{first}");
		Ok(())
	}

	#[test]
	fn rewriting_removes_directories_of_unmeasured_programs() -> anyhow::Result<()> {
		let dir = tempfile::tempdir()?;
		let first: MeasurementResult = [
			(0, vec![Datapoint::new(1.0, 1.0)]),
			(1, vec![Datapoint::new(9.0, 9.0)]),
			(2, vec![Datapoint::new(5.0, 5.0)]),
		]
		.into_iter()
		.collect();
		write_results(dir.path(), &first)?;
		write_statistics(dir.path(), &Statistics::compute(&first)?)?;
		fs::create_dir(dir.path().join("plots"))?;
		fs::write(dir.path().join("7"), "not a program directory")?;

		// Program 1 abandoned, program 2 no longer in the list
		let mut second = MeasurementResult::new();
		second.push(0, Datapoint::new(2.0, 2.0));
		second.push(1, Datapoint::new(3.0, 3.0));
		second.abandon(1);

		let removed = remove_stale_results(dir.path(), &second)?;
		write_results(dir.path(), &second)?;
		write_statistics(dir.path(), &Statistics::compute(&second)?)?;

		assert_eq!(removed, vec![dir.path().join("1"), dir.path().join("2")]);
		assert!(!dir.path().join("1").exists());
		assert!(!dir.path().join("2").exists());
		assert_eq!(
			fs::read_to_string(dir.path().join("0").join(RESULTS_FILE))?,
			"# Time,Energy\n2,2\n"
		);
		assert!(dir.path().join("plots").is_dir());
		assert!(dir.path().join("7").is_file());
		Ok(())
	}

	#[test]
	fn missing_output_directory_has_nothing_stale() -> anyhow::Result<()> {
		let dir = tempfile::tempdir()?;
		let removed = remove_stale_results(&dir.path().join("results"), &sample_result())?;
		assert!(removed.is_empty());
		Ok(())
	}

	#[test]
	fn statistics_table() -> anyhow::Result<()> {
		let stats = Statistics::compute(&sample_result())?;
		let programs = vec![Program::new("./bubblesort"), Program::new("./quicksort"), Program::new("./stdsort")];
		let mut out = Vec::new();
		print_statistics(&mut out, &programs, &stats)?;

		let table = String::from_utf8(out)?;
		let lines: Vec<&str> = table.lines().collect();
		assert_eq!(lines.len(), 3);
		assert!(lines[1].starts_with("0    ./bubblesort"), "{}", lines[1]);
		assert!(lines[2].starts_with("2    ./stdsort"), "{}", lines[2]);
		assert!(lines[2].contains("1.000000"), "{}", lines[2]);
		Ok(())
	}
}
