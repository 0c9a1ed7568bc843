pub mod msr;

use crate::constants::{ENERGY_COUNTER_BITS, ENERGY_UNIT_MASK, ENERGY_UNIT_SHIFT};

/// Extracts the energy status unit from the raw unit register
pub const fn energy_unit_exponent(unit_register: u64) -> u32 {
	((unit_register >> ENERGY_UNIT_SHIFT) & ENERGY_UNIT_MASK) as u32
}

/// Converts raw counter ticks to joules
///
/// # Arguments
///
/// * `ticks` - Raw value of the energy status register
/// * `unit_register` - Raw value of the unit register
///
/// # Returns
///
/// `ticks × 2^-u` where `u` is the energy status unit
pub fn decode_energy(ticks: u64, unit_register: u64) -> f64 {
	ticks as f64 * 0.5f64.powi(energy_unit_exponent(unit_register) as i32)
}

/// Joules accumulated by one full cycle of the energy counter
pub fn counter_span_joules(unit_register: u64) -> f64 {
	(1u64 << ENERGY_COUNTER_BITS) as f64 * 0.5f64.powi(energy_unit_exponent(unit_register) as i32)
}

/// Difference between two counter readings in joules
///
/// When the end reading is lower than the start reading and the span of the
/// counter is known, the counter is assumed to have wrapped exactly once.
///
/// # Returns
///
/// The (corrected) difference and whether a wraparound was detected
pub fn energy_delta(start: f64, end: f64, span: Option<f64>) -> (f64, bool) {
	if end >= start {
		return (end - start, false);
	}
	match span {
		// Handle counter wrap-around
		Some(span) => (end + span - start, true),
		None => (end - start, true),
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn unit_exponent_uses_bits_8_to_12() {
		assert_eq!(energy_unit_exponent(0x000A_0E03), 0x0E);
		assert_eq!(energy_unit_exponent(0xFFFF_FFFF_FFFF_E0FF), 0);
		assert_eq!(energy_unit_exponent(0x1F00), 31);
		assert_eq!(energy_unit_exponent(0x2000), 0);
	}

	#[test]
	fn decode_is_ticks_times_two_to_minus_unit() {
		let ticks: u64 = 123_456_789;
		for unit in 0..=31u64 {
			let expected = ticks as f64 / (1u64 << unit) as f64;
			assert_eq!(decode_energy(ticks, unit << 8), expected, "unit {unit}");
		}
		// Upper unit register bits do not leak into the exponent
		assert_eq!(decode_energy(1 << 20, 0xA_0E03), 64.0);
		assert_eq!(decode_energy(0, 0xE00), 0.0);
	}

	#[test]
	fn decode_full_width_ticks() {
		let ticks = u64::MAX - 1023;
		assert_eq!(decode_energy(ticks, 0x1000), ticks as f64 / 65536.0);
	}

	#[test]
	fn span_covers_32_bit_counter() {
		assert_eq!(counter_span_joules(0), 4_294_967_296.0);
		assert_eq!(counter_span_joules(0xE00), 262_144.0);
	}

	#[test]
	fn delta_without_wrap() {
		assert_eq!(energy_delta(10.0, 12.5, Some(100.0)), (2.5, false));
		assert_eq!(energy_delta(3.0, 3.0, None), (0.0, false));
	}

	#[test]
	fn delta_with_wrap() {
		assert_eq!(energy_delta(90.0, 10.0, Some(100.0)), (20.0, true));
		assert_eq!(energy_delta(90.0, 10.0, None), (-80.0, true));
	}
}
