//! Numeric readout for the point under the cursor.

use std::fmt;

use crate::complex::Complex;
use crate::error::CoreError;
use crate::request::PlotRequest;

/// A complex value with its polar form, displayed to three decimals.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointSummary {
    pub value: Complex,
    pub modulus: f64,
    pub argument: f64,
}

impl From<Complex> for PointSummary {
    fn from(value: Complex) -> Self {
        Self {
            value,
            modulus: value.norm(),
            argument: value.arg(),
        }
    }
}

impl fmt::Display for PointSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "re = {:.3}, im = {:.3}, |z| = {:.3}, arg = {:.3}",
            self.value.re, self.value.im, self.modulus, self.argument
        )
    }
}

/// The input under a pixel and its image under the current function.
///
/// The markers are the pixel positions of the input and of the output in
/// the same viewport, for drawing overlay dots. Either may fall outside the
/// image; the output marker is `None` when the output is undefined.
#[derive(Debug, Clone, PartialEq)]
pub struct Readout {
    pub input: PointSummary,
    pub output: Result<PointSummary, CoreError>,
    pub input_marker: Option<(i64, i64)>,
    pub output_marker: Option<(i64, i64)>,
}

impl Readout {
    /// Readout for pixel `(col, row)` of a `width × height` image of
    /// `request`.
    pub fn at_pixel(
        request: &PlotRequest,
        col: f64,
        row: f64,
        width: u32,
        height: u32,
    ) -> crate::Result<Self> {
        if width == 0 || height == 0 {
            return Err(CoreError::InvalidDimensions { width, height });
        }
        let z = request.viewport.pixel_to_complex(col, row, width, height);
        Ok(Self::at_point(request, z, width, height))
    }

    /// Readout for an explicit input point.
    pub fn at_point(request: &PlotRequest, z: Complex, width: u32, height: u32) -> Self {
        let viewport = &request.viewport;
        let output = request.expression.eval(z).map(PointSummary::from);
        let output_marker = match &output {
            Ok(summary) => viewport.complex_to_pixel(summary.value, width, height),
            Err(_) => None,
        };
        Self {
            input: PointSummary::from(z),
            output,
            input_marker: viewport.complex_to_pixel(z, width, height),
            output_marker,
        }
    }
}

impl fmt::Display for Readout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "z    : {}", self.input)?;
        match &self.output {
            Ok(out) => write!(f, "f(z) : {out}"),
            Err(e) => write!(f, "f(z) : undefined ({e})"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::Expression;
    use crate::viewport::Viewport;

    fn request(src: &str) -> PlotRequest {
        PlotRequest::new(
            Expression::parse(src).unwrap(),
            Viewport::new(2.0, -2.0, 2.0, -2.0).unwrap(),
        )
    }

    #[test]
    fn identity_readout() {
        let r = Readout::at_pixel(&request("z"), 0.0, 0.0, 4, 4).unwrap();
        assert_eq!(r.input.value, Complex::new(-2.0, 2.0));
        assert_eq!(r.output, Ok(r.input));
        assert_eq!(r.input_marker, Some((0, 0)));
        assert_eq!(r.output_marker, r.input_marker);
    }

    #[test]
    fn squared_readout_moves_marker() {
        let req = request("z z *");
        let r = Readout::at_point(&req, Complex::new(1.0, 1.0), 100, 100);
        let out = r.output.clone().unwrap();
        assert!((out.value.re).abs() < 1e-12);
        assert!((out.value.im - 2.0).abs() < 1e-12);
        assert!((out.modulus - 2.0).abs() < 1e-12);
        // 2i sits on the top edge of a viewport whose upper bound is 2.
        assert_eq!(r.output_marker, Some((50, 0)));
    }

    #[test]
    fn failed_output_has_no_marker() {
        let r = Readout::at_point(&request("1 z /"), Complex::ZERO, 10, 10);
        assert_eq!(r.output, Err(CoreError::DivisionByZero));
        assert_eq!(r.output_marker, None);
        assert!(r.to_string().contains("undefined"));
    }

    #[test]
    fn zero_sized_image_is_rejected() {
        assert!(Readout::at_pixel(&request("z"), 0.0, 0.0, 0, 10).is_err());
    }

    #[test]
    fn three_decimal_formatting() {
        let s = PointSummary::from(Complex::new(3.0, 4.0)).to_string();
        assert_eq!(s, "re = 3.000, im = 4.000, |z| = 5.000, arg = 0.927");
    }
}
