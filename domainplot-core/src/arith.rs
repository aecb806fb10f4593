//! Pure functions over [`Complex`].
//!
//! Division and inversion return an error on a zero operand rather than
//! producing infinities that would later be indistinguishable from a genuine
//! overflow. The logarithm of zero is *not* trapped: it yields a real part of
//! negative infinity, which propagates and is rendered as undefined.

use crate::complex::Complex;
use crate::error::CoreError;

/// `1 / (2i)`, the factor shared by the exponential form of sine.
const INV_TWO_I: Complex = Complex { re: 0.0, im: -0.5 };

#[inline]
pub fn add(a: Complex, b: Complex) -> Complex {
    a + b
}

#[inline]
pub fn sub(a: Complex, b: Complex) -> Complex {
    a - b
}

#[inline]
pub fn mul(a: Complex, b: Complex) -> Complex {
    a * b
}

/// `a / b`, computed as `a × inv(b)`.
#[inline]
pub fn div(a: Complex, b: Complex) -> crate::Result<Complex> {
    Ok(mul(a, inv(b)?))
}

#[inline]
pub fn conj(z: Complex) -> Complex {
    Complex::new(z.re, -z.im)
}

/// Multiplicative inverse: `(re / d, -im / d)` with `d = re² + im²`.
#[inline]
pub fn inv(z: Complex) -> crate::Result<Complex> {
    if z.is_zero() {
        return Err(CoreError::DivisionByZero);
    }
    let d = z.norm_sq();
    Ok(Complex::new(z.re / d, -(z.im / d)))
}

#[inline]
pub fn neg(z: Complex) -> Complex {
    -z
}

/// `e^re · (cos im + i sin im)`.
#[inline]
pub fn exp(z: Complex) -> Complex {
    let scale = z.re.exp();
    let (sin, cos) = z.im.sin_cos();
    Complex::new(scale * cos, scale * sin)
}

/// Principal natural logarithm: `ln|z| + i·arg(z)`.
#[inline]
pub fn ln(z: Complex) -> Complex {
    Complex::new(z.norm().ln(), z.arg())
}

/// `(e^(iz) − e^(−iz)) / (2i)`.
pub fn sin(z: Complex) -> Complex {
    let (pos, negative) = exp_pair(z);
    (pos - negative) * INV_TWO_I
}

/// `(e^(iz) + e^(−iz)) / 2`.
pub fn cos(z: Complex) -> Complex {
    let (pos, negative) = exp_pair(z);
    (pos + negative) * 0.5
}

/// `(e^(iz), e^(−iz))`.
#[inline]
fn exp_pair(z: Complex) -> (Complex, Complex) {
    let iz = Complex::I * z;
    (exp(iz), exp(-iz))
}

/// Principal power `exp(ln(a) × b)`.
///
/// Only the principal branch is produced. `pow(0, b)` goes through `ln(0)`
/// and is therefore non-finite.
#[inline]
pub fn pow(a: Complex, b: Complex) -> Complex {
    exp(ln(a) * b)
}

/// `|z|` as a real-valued complex number.
#[inline]
pub fn modulus(z: Complex) -> Complex {
    Complex::from_real(z.norm())
}

/// `arg(z)` as a real-valued complex number.
#[inline]
pub fn argument(z: Complex) -> Complex {
    Complex::from_real(z.arg())
}

#[inline]
pub fn real_part(z: Complex) -> Complex {
    Complex::from_real(z.re)
}

#[inline]
pub fn imag_part(z: Complex) -> Complex {
    Complex::from_real(z.im)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    const EPSILON: f64 = 1e-12;

    fn approx(a: Complex, b: Complex) -> bool {
        (a.re - b.re).abs() < EPSILON && (a.im - b.im).abs() < EPSILON
    }

    #[test]
    fn division() {
        // (-5 + 10i) / (3 + 4i) = 1 + 2i
        let q = div(Complex::new(-5.0, 10.0), Complex::new(3.0, 4.0)).unwrap();
        assert!(approx(q, Complex::new(1.0, 2.0)));
    }

    #[test]
    fn division_by_zero_is_an_error() {
        assert_eq!(
            div(Complex::ONE, Complex::ZERO),
            Err(CoreError::DivisionByZero)
        );
        assert_eq!(inv(Complex::ZERO), Err(CoreError::DivisionByZero));
    }

    #[test]
    fn inverse() {
        let z = inv(Complex::I).unwrap();
        assert!(approx(z, Complex::new(0.0, -1.0)));
    }

    #[test]
    fn conjugate_and_negate() {
        let z = Complex::new(1.5, -2.0);
        assert_eq!(conj(z), Complex::new(1.5, 2.0));
        assert_eq!(neg(z), Complex::new(-1.5, 2.0));
    }

    #[test]
    fn euler_identity() {
        let z = exp(Complex::new(0.0, PI));
        assert!(approx(z, Complex::new(-1.0, 0.0)));
    }

    #[test]
    fn log_inverts_exp() {
        let z = Complex::new(0.3, -1.2);
        assert!(approx(ln(exp(z)), z));
    }

    #[test]
    fn log_of_zero_is_negative_infinity() {
        let z = ln(Complex::ZERO);
        assert_eq!(z.re, f64::NEG_INFINITY);
        assert!(!z.is_finite());
    }

    #[test]
    fn sine_and_cosine_on_real_axis() {
        let x = 0.7;
        assert!(approx(sin(Complex::from_real(x)), Complex::from_real(x.sin())));
        assert!(approx(cos(Complex::from_real(x)), Complex::from_real(x.cos())));
    }

    #[test]
    fn sine_on_imaginary_axis_is_sinh() {
        // sin(iy) = i sinh(y)
        let y = 0.9;
        assert!(approx(sin(Complex::new(0.0, y)), Complex::new(0.0, y.sinh())));
    }

    #[test]
    fn pythagorean_identity() {
        let z = Complex::new(0.4, 0.25);
        let s = sin(z);
        let c = cos(z);
        assert!(approx(s * s + c * c, Complex::ONE));
    }

    #[test]
    fn principal_power() {
        // i^i = e^(-π/2)
        let z = pow(Complex::I, Complex::I);
        assert!(approx(z, Complex::from_real((-PI / 2.0).exp())));
        let sq = pow(Complex::new(2.0, 0.0), Complex::from_real(2.0));
        assert!(approx(sq, Complex::from_real(4.0)));
    }

    #[test]
    fn power_of_zero_is_not_finite() {
        assert!(!pow(Complex::ZERO, Complex::from_real(2.0)).is_finite());
    }

    #[test]
    fn real_valued_projections() {
        let z = Complex::new(3.0, -4.0);
        assert_eq!(modulus(z), Complex::from_real(5.0));
        assert_eq!(real_part(z), Complex::from_real(3.0));
        assert_eq!(imag_part(z), Complex::from_real(-4.0));
        assert!(approx(argument(z), Complex::from_real((-4.0f64).atan2(3.0))));
    }
}
