use msru::{Accessor, Msr};
use std::fs::File;
use std::io;
use std::path::PathBuf;

use crate::constants::MSR_DEVICE_DIR;

/// Reads a value from a Model-Specific Register (MSR)
///
/// # Arguments
///
/// * `msr_address` - The address of the MSR to read
/// * `cpu_id` - The CPU ID to read the MSR from
///
/// # Returns
///
/// The value read from the MSR, or an io::Error if the read fails
pub fn read_msr(msr_address: u32, cpu_id: usize) -> io::Result<u64> {
	let cpu = u16::try_from(cpu_id).map_err(|_| {
		io::Error::new(io::ErrorKind::InvalidInput, format!("cpu id {cpu_id} is out of range"))
	})?;
	Msr::new(msr_address, cpu)
		.map_err(|e| io::Error::new(io::ErrorKind::Other, e))?
		.read()
		.map_err(|e| io::Error::new(io::ErrorKind::Other, e))
}

/// Path of the MSR device node of a logical core
pub fn msr_device_path(cpu_id: usize) -> PathBuf {
	PathBuf::from(format!("{MSR_DEVICE_DIR}/{cpu_id}/msr"))
}

/// Opens the MSR device of a core read-only and closes it again.
///
/// The `msru` accessor reports every failure as an opaque error, this keeps
/// the OS error kind (permission denied, not found) intact.
pub fn check_msr_access(cpu_id: usize) -> io::Result<PathBuf> {
	let path = msr_device_path(cpu_id);
	File::open(&path)?;
	Ok(path)
}
