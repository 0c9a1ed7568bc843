use std::fmt;
use std::fs;

use crate::constants::{AMD_ENERGY_CORE_MSR, AMD_ENERGY_UNIT_MSR, INTEL_POWER_UNIT_MSR, INTEL_PP0_ENERGY_MSR};

/// Represents CPU manufacturer types that can be detected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CpuVendor {
	/// Intel CPU architecture
	Intel,
	/// AMD CPU architecture
	Amd,
	/// Apple M-series SoC, no MSR interface
	AppleSilicon,
	/// Any other CPU architecture not explicitly supported
	Unsupported,
}

/// Location of the per-core energy counter and of its unit register
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RaplRegisters {
	/// MSR holding the accumulated energy ticks
	pub energy: u32,
	/// MSR holding the energy status unit in bits 8..=12
	pub unit: u32,
}

impl CpuVendor {
	/// Returns the energy registers for this vendor, or `None` when the vendor
	/// exposes no readable energy counter.
	pub const fn registers(self) -> Option<RaplRegisters> {
		match self {
			CpuVendor::Intel => Some(RaplRegisters {
				energy: INTEL_PP0_ENERGY_MSR,
				unit: INTEL_POWER_UNIT_MSR,
			}),
			CpuVendor::Amd => Some(RaplRegisters {
				energy: AMD_ENERGY_CORE_MSR,
				unit: AMD_ENERGY_UNIT_MSR,
			}),
			CpuVendor::AppleSilicon | CpuVendor::Unsupported => None,
		}
	}

	pub const fn has_energy_counters(self) -> bool {
		self.registers().is_some()
	}

	pub fn as_str(&self) -> &'static str {
		match self {
			CpuVendor::Intel => "Intel",
			CpuVendor::Amd => "AMD",
			CpuVendor::AppleSilicon => "Apple Silicon",
			CpuVendor::Unsupported => "unsupported",
		}
	}
}

impl fmt::Display for CpuVendor {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// Detects the CPU manufacturer of the executing machine
pub fn detect_cpu_vendor() -> CpuVendor {
	if cfg!(all(target_os = "macos", target_arch = "aarch64")) {
		return CpuVendor::AppleSilicon;
	}
	let cpuinfo = fs::read_to_string("/proc/cpuinfo").unwrap_or_default();
	parse_cpu_vendor(&cpuinfo)
}

/// Extracts the vendor from the content of /proc/cpuinfo
pub fn parse_cpu_vendor(cpuinfo: &str) -> CpuVendor {
	let vendor_id = cpuinfo
		.lines()
		.filter_map(|line| line.split_once(':'))
		.find(|(key, _)| key.trim() == "vendor_id")
		.map(|(_, value)| value.trim());

	match vendor_id {
		Some("GenuineIntel") => CpuVendor::Intel,
		Some("AuthenticAMD") => CpuVendor::Amd,
		Some(_) => CpuVendor::Unsupported,
		None => {
			// Some kernels (e.g. Asahi on arm64) only report an implementer code
			if cpuinfo.contains("CPU implementer\t: 0x61") {
				CpuVendor::AppleSilicon
			} else {
				CpuVendor::Unsupported
			}
		},
	}
}
