use tracing::debug;

use crate::error::{CoreError, ValidationError};
use crate::expr::Expression;
use crate::viewport::Viewport;

pub const FIELD_EXPRESSION: &str = "expression";
pub const FIELD_RE_UPPER: &str = "re_upper";
pub const FIELD_RE_LOWER: &str = "re_lower";
pub const FIELD_IM_UPPER: &str = "im_upper";
pub const FIELD_IM_LOWER: &str = "im_lower";
pub const FIELD_VIEWPORT: &str = "viewport";

/// A validated function and viewport, ready to render.
///
/// Holds its own copy of both so a render can keep reading it while the
/// interactive side goes on editing.
#[derive(Debug, Clone, PartialEq)]
pub struct PlotRequest {
    pub expression: Expression,
    pub viewport: Viewport,
}

impl PlotRequest {
    pub fn new(expression: Expression, viewport: Viewport) -> Self {
        Self {
            expression,
            viewport,
        }
    }

    /// Validate the five text fields of a plot submission.
    ///
    /// Every field is checked, and all failures are returned together; a
    /// request is produced only if nothing failed. The expression is checked
    /// structurally only, so an expression with a pole (`1 z /`) is accepted.
    pub fn from_fields(
        expression: &str,
        re_upper: &str,
        re_lower: &str,
        im_upper: &str,
        im_lower: &str,
    ) -> Result<Self, ValidationError> {
        let mut failures = Vec::new();

        let expression = Expression::parse(expression)
            .map_err(|e| failures.push((FIELD_EXPRESSION, e)))
            .ok();

        let mut bound = |field: &'static str, text: &str| {
            parse_bound(field, text)
                .map_err(|e| failures.push((field, e)))
                .ok()
        };
        let bounds = (
            bound(FIELD_RE_UPPER, re_upper),
            bound(FIELD_RE_LOWER, re_lower),
            bound(FIELD_IM_UPPER, im_upper),
            bound(FIELD_IM_LOWER, im_lower),
        );

        let viewport = match bounds {
            (Some(ru), Some(rl), Some(iu), Some(il)) => Viewport::new(ru, rl, iu, il)
                .map_err(|e| failures.push((FIELD_VIEWPORT, e)))
                .ok(),
            _ => None,
        };

        match (expression, viewport) {
            (Some(expression), Some(viewport)) if failures.is_empty() => {
                Ok(Self::new(expression, viewport))
            }
            _ => {
                debug!(failures = failures.len(), "Rejected plot configuration");
                Err(ValidationError { failures })
            }
        }
    }
}

impl Default for PlotRequest {
    /// The identity function over the default viewport.
    fn default() -> Self {
        Self::new(Expression::default(), Viewport::default())
    }
}

/// Parse one viewport bound as a plain, finite decimal number.
pub fn parse_bound(field: &'static str, text: &str) -> crate::Result<f64> {
    let failure = || CoreError::ParseFailure {
        field,
        value: text.to_string(),
    };
    let value: f64 = text.trim().parse().map_err(|_| failure())?;
    if value.is_finite() {
        Ok(value)
    } else {
        Err(failure())
    }
}
