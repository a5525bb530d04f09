use crate::SvError;

/// Floating point type used throughout the results layer
pub type Real = f64;

/// One tolerance for everything
#[derive(Clone, Copy, Debug)]
pub struct Tolerances {
    pub abs: Real,
    pub rel: Real,
}

impl Default for Tolerances {
    fn default() -> Self {
        Self {
            abs: 1e-12,
            rel: 1e-9,
        }
    }
}

pub fn nearly_equal(a: Real, b: Real, tol: Tolerances) -> bool {
    let diff = (a - b).abs();
    if diff <= tol.abs {
        return true;
    }
    diff <= tol.rel * a.abs().max(b.abs())
}

pub fn ensure_finite(v: Real, what: &'static str) -> Result<Real, SvError> {
    if v.is_finite() {
        Ok(v)
    } else {
        Err(SvError::NonFinite { what, value: v })
    }
}

/// Round half away from zero to `digits` decimal places.
///
/// Used for display only; stored statistics keep full precision.
pub fn round_to(v: Real, digits: u32) -> Real {
    if !v.is_finite() {
        return v;
    }
    let scale = 10f64.powi(digits as i32);
    (v * scale).round() / scale
}

/// Bytes to mebibytes.
pub fn bytes_to_mib(bytes: u64) -> Real {
    bytes as Real / (1024.0 * 1024.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn nearly_equal_basic() {
        let tol = Tolerances {
            abs: 1e-12,
            rel: 1e-9,
        };
        assert!(nearly_equal(1.0, 1.0 + 1e-12, tol));
        assert!(nearly_equal(0.0, 1e-13, tol));
        assert!(!nearly_equal(1.0, 1.0 + 1e-6, tol));
    }

    #[test]
    fn ensure_finite_detects_nan() {
        let err = ensure_finite(Real::NAN, "test").unwrap_err();
        let msg = format!("{err}");
        assert!(msg.contains("Non-finite"));
    }

    #[test]
    fn round_to_two_digits() {
        assert_eq!(round_to(3.14159, 2), 3.14);
        assert_eq!(round_to(2.675_000_1, 2), 2.68);
        assert_eq!(round_to(-1.005_01, 2), -1.01);
        assert_eq!(round_to(7.0, 2), 7.0);
        assert!(round_to(Real::NAN, 2).is_nan());
    }

    #[test]
    fn mib_conversion() {
        assert_eq!(bytes_to_mib(1024 * 1024), 1.0);
        assert_eq!(bytes_to_mib(512 * 1024), 0.5);
    }

    proptest! {
        #[test]
        fn rounding_moves_at_most_half_a_unit(v in -1e6_f64..1e6_f64) {
            let r = round_to(v, 2);
            prop_assert!((r - v).abs() <= 0.005 + 1e-9);
            prop_assert_eq!(round_to(r, 2), r);
        }
    }
}
