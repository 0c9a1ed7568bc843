// AMD RAPL MSR addresses
pub const AMD_ENERGY_UNIT_MSR: u32 = 0xC001_0299;
pub const AMD_ENERGY_CORE_MSR: u32 = 0xC001_029A;

// Intel RAPL MSR addresses
pub const INTEL_POWER_UNIT_MSR: u32 = 0x606;
pub const INTEL_PP0_ENERGY_MSR: u32 = 0x639;

// Energy status unit: bits 8..=12 of the unit register
pub const ENERGY_UNIT_SHIFT: u32 = 8;
pub const ENERGY_UNIT_MASK: u64 = 0x1F;

// Width of the energy status counters, in bits
pub const ENERGY_COUNTER_BITS: u32 = 32;

// Per-core MSR device exposed by the `msr` kernel module
pub const MSR_DEVICE_DIR: &str = "/dev/cpu";

// Run defaults
pub const DEFAULT_DATAPOINTS: usize = 100;
pub const DEFAULT_REPETITIONS: usize = 100;
pub const DEFAULT_MAX_RETRIES: usize = 100;
pub const DEFAULT_OUTPUT_DIR: &str = "./results";
