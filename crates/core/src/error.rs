//! Domain error model.

use thiserror::Error;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-level error.
///
/// Keep this focused on deterministic failures of domain values (validation,
/// malformed records). Detector and store transport failures belong to the
/// infrastructure layer.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A value failed validation (e.g. an empty record name).
    #[error("validation failed: {0}")]
    Validation(String),

    /// A stored record could not be parsed into a typed value.
    ///
    /// Required fields are never silently coerced; the whole fetch that produced
    /// the record is unusable.
    #[error("malformed record: field `{field}`: {reason}")]
    MalformedRecord { field: String, reason: String },
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn malformed(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedRecord {
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub fn is_malformed_record(&self) -> bool {
        matches!(self, Self::MalformedRecord { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn malformed_record_message_names_the_field() {
        let err = DomainError::malformed("Quantity", "expected a non-negative integer, got `lots`");
        assert!(err.is_malformed_record());
        assert_eq!(
            err.to_string(),
            "malformed record: field `Quantity`: expected a non-negative integer, got `lots`"
        );
    }

    #[test]
    fn validation_is_not_a_malformed_record() {
        assert!(!DomainError::validation("name cannot be empty").is_malformed_record());
    }
}
