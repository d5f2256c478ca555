//! Reflection/transmission to impedance conversions
//!
//! Non-finite results (a reflection of exactly +1, a zero transmission) are
//! reported as errors instead of infinities.

use num_complex::Complex64;

use crate::constants::{NEAR_ZERO, SERIES_Z0_OHMS, Z0_OHMS};
use crate::error::{DeembedError, Result, Stage};

/// One-port impedance `Z0 * (1 + S11) / (1 - S11)` with `Z0 = 50` ohms
pub fn reflection_2_impedance(s11: Complex64) -> Result<Complex64> {
    let one = Complex64::new(1.0, 0.0);
    let den = one - s11;
    if den.norm() <= NEAR_ZERO {
        return Err(DeembedError::singular(Stage::OnePort));
    }
    Ok(Z0_OHMS * (one + s11) / den)
}

/// Series impedance `2*Z0 * (1 - S21) / S21` of a two-port
pub fn transmission_2_series_impedance(s21: Complex64) -> Result<Complex64> {
    if s21.norm() <= NEAR_ZERO {
        return Err(DeembedError::singular(Stage::Cascade));
    }
    Ok(SERIES_Z0_OHMS * (Complex64::new(1.0, 0.0) - s21) / s21)
}

/// Rotate by `exp(+i*2*pi*f*dt)`, removing a delay of `dt` seconds at `f` Hz
#[inline]
pub fn remove_delay(s: Complex64, f: f64, dt: f64) -> Complex64 {
    s * Complex64::from_polar(1.0, 2.0 * std::f64::consts::PI * f * dt)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_reflection_2_impedance() {
        let z = reflection_2_impedance(Complex64::new(0.0, 0.0)).unwrap();
        assert_relative_eq!(z.re, 50.0);
        let z = reflection_2_impedance(Complex64::new(-1.0, 0.0)).unwrap();
        assert_relative_eq!(z.norm(), 0.0);
        let z = reflection_2_impedance(Complex64::new(1.0 / 3.0, 0.0)).unwrap();
        assert_relative_eq!(z.re, 100.0, epsilon = 1e-12);
        assert!(reflection_2_impedance(Complex64::new(1.0, 0.0)).is_err());
    }

    #[test]
    fn test_transmission_2_series_impedance() {
        let z = transmission_2_series_impedance(Complex64::new(1.0, 0.0)).unwrap();
        assert_relative_eq!(z.norm(), 0.0);
        // 50 ohm series element between 50 ohm ports: S21 = 2/3
        let z = transmission_2_series_impedance(Complex64::new(2.0 / 3.0, 0.0)).unwrap();
        assert_relative_eq!(z.re, 50.0, epsilon = 1e-12);
        assert!(transmission_2_series_impedance(Complex64::new(0.0, 0.0)).is_err());
    }

    #[test]
    fn test_remove_delay() {
        let f = 1e9;
        let dt = 1.25e-10;
        let delayed = Complex64::from_polar(0.5, -2.0 * std::f64::consts::PI * f * dt);
        let s = remove_delay(delayed, f, dt);
        assert_relative_eq!(s.re, 0.5, epsilon = 1e-12);
        assert_relative_eq!(s.im, 0.0, epsilon = 1e-12);
    }
}
