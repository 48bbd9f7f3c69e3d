// src/error.rs

//! Structured errors for type checking and coercion
//!
//! A plain type mismatch is never an error: the matcher reports it as
//! `false` and leaves the decision to the caller. Everything in
//! [`TypeError`] is either a bug in a static registry definition, a failed
//! coercion, or input too deeply nested to walk.

use crate::typespec::TypeSpec;
use crate::value::TypeTag;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, TypeError>;

/// Errors surfaced by the matcher, converter, and parameter checker
///
/// Values appear only as bounded textual summaries, never verbatim.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TypeError {
    /// Defect in a static type or registry definition, not bad input data
    ///
    /// Never recoverable at runtime; fix the definition.
    #[error("type registry defect: {reason}")]
    Defect { reason: String },

    /// A registered coercion function failed
    #[error("cannot coerce {value} ({found}) to {target}: {cause}")]
    CoercionFailed {
        value: String,
        found: TypeTag,
        target: TypeSpec,
        #[source]
        cause: Box<TypeError>,
    },

    /// A coercion returned a value that does not match its own target
    #[error("coercing {value} to {target} produced a non-conforming {got}")]
    CoercionMismatch {
        value: String,
        target: TypeSpec,
        got: TypeTag,
    },

    /// No coercion is registered for the target spec
    #[error("no coercion available for target type {target}")]
    NoCoercion { target: TypeSpec },

    /// A domain coercion could not resolve the input to its canonical shape
    #[error("ambiguous value shape: {reason} (got {value})")]
    AmbiguousShape { value: String, reason: String },

    /// Value nesting exceeded the recursion guard
    #[error("value nesting exceeds the depth limit of {limit}")]
    TooDeep { limit: usize },
}

impl TypeError {
    pub fn defect(reason: impl Into<String>) -> Self {
        TypeError::Defect {
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_carry_structured_fields() {
        let err = TypeError::NoCoercion {
            target: TypeSpec::TUPLE,
        };
        assert_eq!(err.to_string(), "no coercion available for target type tuple");

        let err = TypeError::CoercionFailed {
            value: "\"gcc\"".to_string(),
            found: TypeTag::Str,
            target: TypeSpec::INT,
            cause: Box::new(TypeError::AmbiguousShape {
                value: "\"gcc\"".to_string(),
                reason: "not an integer literal".to_string(),
            }),
        };
        let message = err.to_string();
        assert!(message.contains("\"gcc\""));
        assert!(message.contains("string"));
        assert!(message.contains("integer"));
        assert!(message.contains("not an integer literal"));
    }
}
