use thiserror::Error;

/// Errors originating from the numeric kernel and the expression evaluator.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoreError {
    #[error("invalid token: {0:?}")]
    InvalidToken(String),

    #[error("malformed expression: {reason}")]
    MalformedExpression { reason: String },

    #[error("division by zero")]
    DivisionByZero,

    #[error("invalid viewport: {reason}")]
    InvalidViewport { reason: String },

    #[error("{field}: {value:?} is not a decimal number")]
    ParseFailure { field: &'static str, value: String },

    #[error("invalid image dimensions: {width}×{height}")]
    InvalidDimensions { width: u32, height: u32 },
}

/// A rejected plot configuration.
///
/// Collects every field that failed so the caller can report them together
/// instead of applying half of a configuration.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{}", summarize(.failures))]
pub struct ValidationError {
    pub failures: Vec<(&'static str, CoreError)>,
}

impl ValidationError {
    /// The error recorded for `field`, if it failed.
    pub fn failure(&self, field: &str) -> Option<&CoreError> {
        self.failures
            .iter()
            .find(|(name, _)| *name == field)
            .map(|(_, e)| e)
    }
}

fn summarize(failures: &[(&'static str, CoreError)]) -> String {
    let parts: Vec<String> = failures
        .iter()
        .map(|(field, e)| format!("{field}: {e}"))
        .collect();
    format!("invalid plot configuration ({})", parts.join("; "))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_error_lists_every_field() {
        let err = ValidationError {
            failures: vec![
                ("expression", CoreError::InvalidToken("foo".into())),
                (
                    "re_upper",
                    CoreError::ParseFailure {
                        field: "re_upper",
                        value: "abc".into(),
                    },
                ),
            ],
        };
        let msg = err.to_string();
        assert!(msg.contains("expression"));
        assert!(msg.contains("foo"));
        assert!(msg.contains("abc"));
        assert!(err.failure("re_upper").is_some());
        assert!(err.failure("im_lower").is_none());
    }
}
