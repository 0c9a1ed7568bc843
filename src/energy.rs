use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::cpu_type::CpuVendor;
use crate::util::msr::{check_msr_access, msr_device_path, read_msr};
use crate::util::{counter_span_joules, decode_energy};

#[derive(Debug, Error)]
pub enum EnergyError {
	#[error("permission denied opening {}, the energy counters require elevated rights (e.g. sudo)", path.display())]
	Privilege { core: usize, path: PathBuf },

	#[error("energy counter interface {} does not exist, check the core index and that the msr kernel module is loaded", path.display())]
	MissingInterface { core: usize, path: PathBuf },

	#[error("failed to read MSR {register:#x} on core {core}")]
	Io {
		register: u32,
		core: usize,
		#[source]
		source: io::Error,
	},
}

/// Source of monotonically increasing energy readings, in joules
pub trait EnergyCounter {
	/// Reads the energy accumulated so far by `core`.
	///
	/// Vendors without an energy counter read as `0.0`, which is never a
	/// valid measurement.
	fn read(&mut self, vendor: CpuVendor, core: usize) -> Result<f64, EnergyError>;

	/// Joules covered by one full cycle of the counter, if known.
	fn wrap_span(&mut self, vendor: CpuVendor, core: usize) -> Result<Option<f64>, EnergyError> {
		let _ = (vendor, core);
		Ok(None)
	}

	/// Fails when the counter interface of `core` cannot be opened.
	fn check_access(&self, vendor: CpuVendor, core: usize) -> Result<(), EnergyError> {
		let _ = (vendor, core);
		Ok(())
	}
}

/// Reads the RAPL energy counters through /dev/cpu/<core>/msr
#[derive(Debug, Clone, Copy, Default)]
pub struct MsrEnergyReader;

impl MsrEnergyReader {
	pub fn new() -> Self {
		Self
	}

	fn read_register(register: u32, core: usize) -> Result<u64, EnergyError> {
		read_msr(register, core).map_err(|source| EnergyError::Io { register, core, source })
	}
}

impl EnergyCounter for MsrEnergyReader {
	fn read(&mut self, vendor: CpuVendor, core: usize) -> Result<f64, EnergyError> {
		let Some(registers) = vendor.registers() else {
			return Ok(0.0);
		};
		let ticks = Self::read_register(registers.energy, core)?;
		let unit = Self::read_register(registers.unit, core)?;
		Ok(decode_energy(ticks, unit))
	}

	fn wrap_span(&mut self, vendor: CpuVendor, core: usize) -> Result<Option<f64>, EnergyError> {
		match vendor.registers() {
			Some(registers) => {
				let unit = Self::read_register(registers.unit, core)?;
				Ok(Some(counter_span_joules(unit)))
			},
			None => Ok(None),
		}
	}

	fn check_access(&self, vendor: CpuVendor, core: usize) -> Result<(), EnergyError> {
		if !vendor.has_energy_counters() {
			return Ok(());
		}
		match check_msr_access(core) {
			Ok(_) => Ok(()),
			Err(e) => {
				let path = msr_device_path(core);
				Err(match e.kind() {
					io::ErrorKind::PermissionDenied => EnergyError::Privilege { core, path },
					io::ErrorKind::NotFound => EnergyError::MissingInterface { core, path },
					_ => EnergyError::Io {
						register: vendor.registers().map(|r| r.energy).unwrap_or_default(),
						core,
						source: e,
					},
				})
			},
		}
	}
}
