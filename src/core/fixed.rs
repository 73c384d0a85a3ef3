//! Q16.16 Fixed-Point Arithmetic
//!
//! Deterministic fixed-point math for the board simulation.
//! Metric positions, speeds and cell sizes all use this format so that two
//! runs fed the same commands and clock readings end up bit-identical.
//!
//! ## Format: Q16.16
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Bit Layout: Q16.16 (32-bit signed integer)                 │
//! ├─────────────────────────────────────────────────────────────┤
//! │  [S][IIIIIIIIIIIIIIII][FFFFFFFFFFFFFFFF]                    │
//! │   │  └──── 16 bits ────┘└──── 16 bits ────┘                 │
//! │   └─ Sign bit                                               │
//! │                                                             │
//! │  Range: -32768.0 to +32767.99998 (approx)                   │
//! │  Precision: 1/65536 ≈ 0.000015 metres                       │
//! └─────────────────────────────────────────────────────────────┘
//! ```

/// Q16.16 fixed-point number stored as i32.
/// 16 bits integer, 16 bits fractional.
pub type Fixed = i32;

/// Number of fractional bits (16)
pub const FIXED_SCALE: i32 = 16;

/// 1.0 in fixed-point (65536)
pub const FIXED_ONE: Fixed = 1 << FIXED_SCALE; // 65536

/// 0.5 in fixed-point (32768)
pub const FIXED_HALF: Fixed = FIXED_ONE >> 1; // 32768

// =============================================================================
// ENGINE DEFAULTS (All as integer literals - NO float conversion!)
// =============================================================================

/// Default physical cell size: 1.0 metre
pub const DEFAULT_CELL_SIZE: Fixed = FIXED_ONE;

/// Default move speed: 1.0 m/s = 65536
pub const DEFAULT_MOVE_SPEED: Fixed = FIXED_ONE;

/// Default jump duration in milliseconds
pub const DEFAULT_JUMP_MS: i64 = 100;

/// Default rest duration in milliseconds
pub const DEFAULT_REST_MS: i64 = 3000;

// =============================================================================
// CORE OPERATIONS (All deterministic)
// =============================================================================

/// Convert a float to fixed-point.
///
/// # Warning
/// Only use at configuration time. NEVER in the tick loop.
///
/// # Example
/// ```
/// use realtime_chess::core::fixed::{to_fixed, FIXED_ONE};
/// const MY_VALUE: i32 = to_fixed(2.5);
/// assert_eq!(MY_VALUE, FIXED_ONE * 2 + FIXED_ONE / 2);
/// ```
#[inline]
pub const fn to_fixed(f: f64) -> Fixed {
    (f * (FIXED_ONE as f64)) as Fixed
}

/// Divide two fixed-point numbers.
///
/// Pre-shifts numerator to maintain precision.
/// Returns 0 on divide-by-zero.
#[inline]
pub fn fixed_div(a: Fixed, b: Fixed) -> Fixed {
    if b == 0 {
        return 0;
    }
    let wide = (a as i64) << FIXED_SCALE;
    (wide / b as i64) as Fixed
}

/// Floor of the square root of a non-negative i64.
///
/// Newton iteration on integers; terminates once the estimate stops
/// decreasing, so the result is exact for every input.
#[inline]
pub fn isqrt_i64(n: i64) -> i64 {
    if n <= 0 {
        return 0;
    }
    let mut x = n;
    let mut y = (x + 1) / 2;
    while y < x {
        x = y;
        y = (x + n / x) / 2;
    }
    x
}

/// Euclidean length of `(dx, dy)` in fixed-point.
///
/// The sum of squares of two Q16.16 values is a Q32.32 value, whose integer
/// square root is Q16.16 again, truncated toward zero.
#[inline]
pub fn fixed_hypot(dx: Fixed, dy: Fixed) -> Fixed {
    let sq = (dx as i64) * (dx as i64) + (dy as i64) * (dy as i64);
    isqrt_i64(sq) as Fixed
}

/// Round a fixed-point value to the nearest integer (half rounds up).
#[inline]
pub fn fixed_round(x: Fixed) -> i32 {
    (x.wrapping_add(FIXED_HALF)) >> FIXED_SCALE
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_constants() {
        assert_eq!(FIXED_ONE, 65536);
        assert_eq!(FIXED_HALF, 32768);
        assert_eq!(FIXED_SCALE, 16);
    }

    #[test]
    fn test_to_fixed() {
        assert_eq!(to_fixed(1.0), FIXED_ONE);
        assert_eq!(to_fixed(0.5), FIXED_HALF);
        assert_eq!(to_fixed(-1.0), -FIXED_ONE);
    }

    #[test]
    fn test_fixed_div() {
        assert_eq!(fixed_div(to_fixed(6.0), to_fixed(2.0)), to_fixed(3.0));
        assert_eq!(fixed_div(FIXED_ONE, to_fixed(4.0)), to_fixed(0.25));

        // Divide by zero returns 0
        assert_eq!(fixed_div(FIXED_ONE, 0), 0);
    }

    #[test]
    fn test_isqrt() {
        assert_eq!(isqrt_i64(0), 0);
        assert_eq!(isqrt_i64(-5), 0);
        assert_eq!(isqrt_i64(1), 1);
        assert_eq!(isqrt_i64(15), 3);
        assert_eq!(isqrt_i64(16), 4);
        assert_eq!(isqrt_i64(1 << 40), 1 << 20);
    }

    #[test]
    fn test_fixed_hypot() {
        // Axis-aligned distances are exact
        assert_eq!(fixed_hypot(to_fixed(2.0), 0), to_fixed(2.0));
        assert_eq!(fixed_hypot(0, to_fixed(-7.0)), to_fixed(7.0));

        // 3-4-5 triangle
        assert_eq!(fixed_hypot(to_fixed(3.0), to_fixed(4.0)), to_fixed(5.0));

        assert_eq!(fixed_hypot(0, 0), 0);
    }

    #[test]
    fn test_fixed_round() {
        assert_eq!(fixed_round(to_fixed(2.49)), 2);
        assert_eq!(fixed_round(to_fixed(2.5)), 3);
        assert_eq!(fixed_round(to_fixed(-0.4)), 0);
        assert_eq!(fixed_round(to_fixed(-0.6)), -1);
    }
}
