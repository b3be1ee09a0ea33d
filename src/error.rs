use std::error::Error;
use std::fmt::{Display, Formatter};

/// Failures raised by the network core.
///
/// `InvalidConfiguration` is returned synchronously from setters and from
/// weight regeneration, before anything is allocated. `ShapeMismatch` means a
/// required regeneration was skipped and is not recoverable by the caller.
#[derive(Debug, Clone, PartialEq)]
pub enum CppnError {
    InvalidConfiguration {
        field: &'static str,
        reason: String,
    },
    ShapeMismatch {
        context: &'static str,
        expected: (usize, usize),
        actual: (usize, usize),
    },
}

impl CppnError {
    pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidConfiguration {
            field,
            reason: reason.into(),
        }
    }

    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::ShapeMismatch { .. })
    }
}

impl Display for CppnError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidConfiguration { field, reason } => {
                write!(f, "invalid configuration for '{field}': {reason}")
            }
            Self::ShapeMismatch {
                context,
                expected,
                actual,
            } => write!(
                f,
                "shape mismatch in {context}: expected {}x{}, got {}x{}",
                expected.0, expected.1, actual.0, actual.1
            ),
        }
    }
}

impl Error for CppnError {}

pub type CppnResult<T> = Result<T, CppnError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_configuration_names_the_field() {
        let error = CppnError::invalid("activation", "unknown activation 'bogus'");
        assert_eq!(
            error.to_string(),
            "invalid configuration for 'activation': unknown activation 'bogus'"
        );
        assert!(!error.is_fatal());
    }

    #[test]
    fn shape_mismatch_is_fatal() {
        let error = CppnError::ShapeMismatch {
            context: "input layer",
            expected: (5, 30),
            actual: (5, 16),
        };
        assert!(error.is_fatal());
        assert!(error.to_string().contains("expected 5x30, got 5x16"));
    }
}
