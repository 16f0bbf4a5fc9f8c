use fixed::types::{I16F16, I32F32};

/// Q32.32 fixed-point: 32 integer bits, 32 fractional bits.
pub type Fixed64 = I32F32;

/// Q16.16 fixed-point for compact storage (drop weights, bonus tables).
pub type Fixed32 = I16F16;

/// Simulation time, in seconds. The engine is advanced by one delta per
/// frame; all timers accumulate in this type.
pub type Seconds = Fixed64;

/// Convert an f64 to Fixed64. Use only for initialization, never in sim loop.
#[inline]
pub fn f64_to_fixed64(v: f64) -> Fixed64 {
    Fixed64::from_num(v)
}

/// Convert Fixed64 to f64. Use only for display and the save boundary.
#[inline]
pub fn fixed64_to_f64(v: Fixed64) -> f64 {
    v.to_num::<f64>()
}

/// Clamp a fraction to [0, 1].
#[inline]
pub fn clamp01(v: Fixed64) -> Fixed64 {
    v.clamp(Fixed64::ZERO, Fixed64::from_num(1))
}

/// Round to the nearest integer, ties away from zero. Reward amounts are
/// computed in fixed-point and paid out as whole currency units.
#[inline]
pub fn round_to_i64(v: Fixed64) -> i64 {
    v.round().to_num::<i64>()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seconds_arithmetic() {
        let base = f64_to_fixed64(480.0);
        let penalty = f64_to_fixed64(0.1);
        let adjusted = base * (Fixed64::from_num(1) + penalty * Fixed64::from_num(2));
        assert_eq!(fixed64_to_f64(adjusted), 576.0);
    }

    #[test]
    fn clamp01_bounds() {
        assert_eq!(clamp01(f64_to_fixed64(-0.5)), Fixed64::ZERO);
        assert_eq!(clamp01(f64_to_fixed64(1.5)), Fixed64::from_num(1));
        assert_eq!(clamp01(f64_to_fixed64(0.25)), f64_to_fixed64(0.25));
    }

    #[test]
    fn round_half_away_from_zero() {
        assert_eq!(round_to_i64(f64_to_fixed64(2.5)), 3);
        assert_eq!(round_to_i64(f64_to_fixed64(2.4)), 2);
        assert_eq!(round_to_i64(f64_to_fixed64(-2.5)), -3);
    }

    #[test]
    fn determinism() {
        let a = f64_to_fixed64(1.0 / 3.0);
        let b = f64_to_fixed64(1.0 / 3.0);
        assert_eq!(a * f64_to_fixed64(480.0), b * f64_to_fixed64(480.0));
    }
}
