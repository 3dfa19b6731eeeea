use thiserror::Error;

/// Errors raised while validating schemas or translating items and queries.
///
/// Every variant displays its message unchanged; callers match on the literal
/// message prefix, so the text is part of the contract.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MappingError {
    /// A required hash key is absent.
    #[error("{0}")]
    MissingKey(String),
    /// Corresponding key components have incompatible scalar types.
    #[error("{0}")]
    TypeMismatch(String),
    /// A range key exists on one side but not the other.
    #[error("{0}")]
    StructuralMismatch(String),
    /// The physical table breaks the string-hash-key invariant.
    #[error("{0}")]
    SchemaInvalid(String),
    /// No compatible physical secondary index exists.
    #[error("{0}")]
    IndexNotFound(String),
    /// Two virtual secondary indexes resolve to the same name.
    #[error("{0}")]
    Duplicate(String),
    /// A qualifier or tenant context contains the delimiter.
    #[error("{0}")]
    InvalidName(String),
    /// An item or condition cannot be translated.
    #[error("{0}")]
    Codec(String),
}

impl MappingError {
    /// Short name of the failure category, used as a structured log field.
    pub fn kind(&self) -> &'static str {
        match self {
            MappingError::MissingKey(_) => "missing_key",
            MappingError::TypeMismatch(_) => "type_mismatch",
            MappingError::StructuralMismatch(_) => "structural_mismatch",
            MappingError::SchemaInvalid(_) => "schema_invalid",
            MappingError::IndexNotFound(_) => "index_not_found",
            MappingError::Duplicate(_) => "duplicate",
            MappingError::InvalidName(_) => "invalid_name",
            MappingError::Codec(_) => "codec",
        }
    }
}

/// Result type for mapping operations.
pub type Result<T> = std::result::Result<T, MappingError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_display_verbatim() {
        let error = MappingError::SchemaInvalid(
            "physical table t's primary-key hash key must be type S, encountered type N"
                .to_string(),
        );
        assert_eq!(
            error.to_string(),
            "physical table t's primary-key hash key must be type S, encountered type N"
        );
    }

    #[test]
    fn test_kind() {
        assert_eq!(MappingError::Duplicate("x".into()).kind(), "duplicate");
        assert_eq!(MappingError::Codec("x".into()).kind(), "codec");
    }
}
