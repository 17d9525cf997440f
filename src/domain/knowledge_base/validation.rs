//! Knowledge base validation utilities

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;

/// Maximum length for knowledge base IDs
pub const MAX_KB_ID_LENGTH: usize = 128;

/// Maximum length for query and rewrite text, in characters
pub const MAX_QUERY_LENGTH: usize = 2000;

/// Knowledge base IDs are opaque but must be printable without whitespace
static KB_ID_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s\p{Cc}]+$").expect("valid knowledge base ID pattern"));

/// Knowledge base validation errors
#[derive(Debug, Clone, PartialEq)]
pub enum KnowledgeBaseValidationError {
    /// ID is empty
    EmptyId,
    /// ID exceeds maximum length
    IdTooLong { length: usize, max: usize },
    /// ID contains whitespace or control characters
    InvalidIdFormat { id: String },
    /// Query or rewrite text is empty or too long
    InvalidText { field: &'static str, length: usize, max: usize },
    /// No knowledge base IDs were requested
    NoKnowledgeBases,
    /// Invalid top_k value
    InvalidTopK { value: u32, min: u32, max: u32 },
    /// Invalid score threshold
    InvalidThreshold { value: f32 },
}

impl fmt::Display for KnowledgeBaseValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyId => write!(f, "Knowledge base ID cannot be empty"),
            Self::IdTooLong { length, max } => {
                write!(
                    f,
                    "Knowledge base ID too long: {} characters (max {})",
                    length, max
                )
            }
            Self::InvalidIdFormat { id } => {
                write!(
                    f,
                    "Invalid knowledge base ID format '{}': must not contain whitespace",
                    id
                )
            }
            Self::InvalidText { field, length, max } => {
                write!(
                    f,
                    "Invalid {}: {} characters (must be between 1 and {})",
                    field, length, max
                )
            }
            Self::NoKnowledgeBases => {
                write!(f, "At least one knowledge base ID is required")
            }
            Self::InvalidTopK { value, min, max } => {
                write!(
                    f,
                    "Invalid top_k {}: must be between {} and {}",
                    value, min, max
                )
            }
            Self::InvalidThreshold { value } => {
                write!(
                    f,
                    "Invalid threshold {}: must be between 0.0 and 1.0",
                    value
                )
            }
        }
    }
}

impl std::error::Error for KnowledgeBaseValidationError {}

/// Validate a knowledge base ID
pub fn validate_knowledge_base_id(id: &str) -> Result<(), KnowledgeBaseValidationError> {
    if id.is_empty() {
        return Err(KnowledgeBaseValidationError::EmptyId);
    }

    if id.len() > MAX_KB_ID_LENGTH {
        return Err(KnowledgeBaseValidationError::IdTooLong {
            length: id.len(),
            max: MAX_KB_ID_LENGTH,
        });
    }

    if !KB_ID_PATTERN.is_match(id) {
        return Err(KnowledgeBaseValidationError::InvalidIdFormat { id: id.to_string() });
    }

    Ok(())
}

/// Validate query or rewrite text
pub fn validate_query_text(
    field: &'static str,
    text: &str,
) -> Result<(), KnowledgeBaseValidationError> {
    let length = text.chars().count();

    if length == 0 || length > MAX_QUERY_LENGTH {
        return Err(KnowledgeBaseValidationError::InvalidText {
            field,
            length,
            max: MAX_QUERY_LENGTH,
        });
    }

    Ok(())
}

/// Validate the list of requested knowledge base IDs
///
/// Only the list itself is checked. Individual IDs are looked up as-is, and
/// ones that match no knowledge base are dropped at search time.
pub fn validate_knowledge_base_ids(ids: &[String]) -> Result<(), KnowledgeBaseValidationError> {
    if ids.is_empty() {
        return Err(KnowledgeBaseValidationError::NoKnowledgeBases);
    }

    Ok(())
}

/// Validate top_k value
pub fn validate_top_k(top_k: u32, max: u32) -> Result<(), KnowledgeBaseValidationError> {
    const MIN: u32 = 1;

    if !(MIN..=max).contains(&top_k) {
        return Err(KnowledgeBaseValidationError::InvalidTopK {
            value: top_k,
            min: MIN,
            max,
        });
    }

    Ok(())
}

/// Validate score threshold
pub fn validate_threshold(threshold: f32) -> Result<(), KnowledgeBaseValidationError> {
    if !(0.0..=1.0).contains(&threshold) {
        return Err(KnowledgeBaseValidationError::InvalidThreshold { value: threshold });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_kb_ids() {
        assert!(validate_knowledge_base_id("a").is_ok());
        assert!(validate_knowledge_base_id("my-kb").is_ok());
        assert!(validate_knowledge_base_id("kb_2024.v1").is_ok());
        assert!(validate_knowledge_base_id("3f6c1c1e-8f0b-4a7e-9a52-4d1b2f0c9e11").is_ok());
    }

    #[test]
    fn test_invalid_kb_ids() {
        assert!(matches!(
            validate_knowledge_base_id(""),
            Err(KnowledgeBaseValidationError::EmptyId)
        ));

        let long_id = "a".repeat(MAX_KB_ID_LENGTH + 1);
        assert!(matches!(
            validate_knowledge_base_id(&long_id),
            Err(KnowledgeBaseValidationError::IdTooLong { .. })
        ));

        assert!(matches!(
            validate_knowledge_base_id("my kb"),
            Err(KnowledgeBaseValidationError::InvalidIdFormat { .. })
        ));

        assert!(matches!(
            validate_knowledge_base_id("kb\n"),
            Err(KnowledgeBaseValidationError::InvalidIdFormat { .. })
        ));
    }

    #[test]
    fn test_query_text_validation() {
        assert!(validate_query_text("query", "x").is_ok());
        assert!(validate_query_text("query", &"é".repeat(MAX_QUERY_LENGTH)).is_ok());

        assert!(validate_query_text("query", "").is_err());
        assert!(validate_query_text("query", &"x".repeat(MAX_QUERY_LENGTH + 1)).is_err());
    }

    #[test]
    fn test_knowledge_base_ids_validation() {
        assert!(validate_knowledge_base_ids(&["kb-1".to_string()]).is_ok());

        assert_eq!(
            validate_knowledge_base_ids(&[]),
            Err(KnowledgeBaseValidationError::NoKnowledgeBases)
        );
        assert!(
            validate_knowledge_base_ids(&["kb-1".to_string(), "legacy kb".to_string()]).is_ok()
        );
    }

    #[test]
    fn test_top_k_validation() {
        assert!(validate_top_k(1, 100).is_ok());
        assert!(validate_top_k(100, 100).is_ok());

        assert!(validate_top_k(0, 100).is_err());
        assert!(validate_top_k(101, 100).is_err());
    }

    #[test]
    fn test_threshold_validation() {
        assert!(validate_threshold(0.0).is_ok());
        assert!(validate_threshold(0.5).is_ok());
        assert!(validate_threshold(1.0).is_ok());

        assert!(validate_threshold(-0.1).is_err());
        assert!(validate_threshold(1.1).is_err());
        assert!(validate_threshold(f32::NAN).is_err());
    }
}
