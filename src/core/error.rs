//! Error handling logic

use thiserror::Error;

/// Error types raised by basis construction and by the operations defined on a basis.
///
/// Every variant is raised synchronously by the call that detects it. Nothing is retried
/// internally, and a failed construction never hands back a partially built basis.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BasisError {
    /// Invalid or mutually incompatible constructor parameters.
    #[error("Configuration Error ({parameter}): {message}")]
    Configuration {
        /// Name of the offending parameter, e.g. `"pblock"` or `"L"`.
        parameter: String,
        /// Configuration failure message
        message: String,
    },

    /// Bad operator string or site indices. The basis stays valid.
    #[error("Invalid Operator: {message}")]
    InvalidOperator {
        /// Characters of the operator string that the basis does not recognize (sorted, unique).
        unrecognized: Vec<char>,
        /// InvalidOperator failure message
        message: String,
    },

    /// The requested numeric type cannot represent the symmetry phases.
    #[error("Type Consistency Error: {message}")]
    TypeConsistency {
        /// TypeConsistency failure message
        message: String,
    },

    /// Combination of arguments that has no implementation (e.g. sparse mixed-state traces).
    #[error("Not Implemented: {message}")]
    NotImplemented {
        /// NotImplemented failure message
        message: String,
    },

    /// An argument outside its admissible range (negative Renyi index, vector shape mismatch...).
    #[error("Invalid Argument ({parameter}): {message}")]
    InvalidArgument {
        /// Name of the offending argument.
        parameter: String,
        /// InvalidArgument failure message
        message: String,
    },
}

impl BasisError {
    pub(crate) fn config(parameter: &str, message: impl Into<String>) -> Self {
        BasisError::Configuration { parameter: parameter.to_string(), message: message.into() }
    }

    pub(crate) fn argument(parameter: &str, message: impl Into<String>) -> Self {
        BasisError::InvalidArgument { parameter: parameter.to_string(), message: message.into() }
    }

    pub(crate) fn operator(message: impl Into<String>) -> Self {
        BasisError::InvalidOperator { unrecognized: Vec::new(), message: message.into() }
    }

    /// Name of the parameter or argument the error refers to, when there is one.
    pub fn parameter(&self) -> Option<&str> {
        match self {
            BasisError::Configuration { parameter, .. } | BasisError::InvalidArgument { parameter, .. } => {
                Some(parameter)
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_names_parameter() {
        let err = BasisError::config("pblock", "pblock must be +/- 1");
        assert_eq!(err.to_string(), "Configuration Error (pblock): pblock must be +/- 1");
        assert_eq!(err.parameter(), Some("pblock"));
    }

    #[test]
    fn test_operator_error_has_no_parameter() {
        let err = BasisError::operator("length of opstr does not match length of indx");
        assert_eq!(err.parameter(), None);
        assert!(err.to_string().starts_with("Invalid Operator"));
    }
}
