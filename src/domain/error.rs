use std::fmt;

use thiserror::Error;

/// Pipeline stage that produced an upstream failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchStage {
    Retrieval,
    Rerank,
}

impl fmt::Display for SearchStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Retrieval => write!(f, "retrieval"),
            Self::Rerank => write!(f, "rerank"),
        }
    }
}

/// Core domain errors
#[derive(Debug, Error)]
pub enum DomainError {
    /// No active sync session, or the replica holds no knowledge bases yet
    #[error("Not ready: {message}")]
    NotReady { message: String },

    #[error("Not found: {message}")]
    NotFound { message: String },

    #[error("Validation error: {message}")]
    Validation { message: String },

    /// A retrieval or rerank collaborator failed for one knowledge base
    #[error("Upstream failure in {stage} for knowledge base '{knowledge_base_id}': {message}")]
    Upstream {
        knowledge_base_id: String,
        stage: SearchStage,
        message: String,
    },

    #[error("Provider error: {provider} - {message}")]
    Provider { provider: String, message: String },

    #[error("Channel error: {message}")]
    Channel { message: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl DomainError {
    pub fn not_ready(message: impl Into<String>) -> Self {
        Self::NotReady {
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn upstream(
        knowledge_base_id: impl Into<String>,
        stage: SearchStage,
        message: impl Into<String>,
    ) -> Self {
        Self::Upstream {
            knowledge_base_id: knowledge_base_id.into(),
            stage,
            message: message.into(),
        }
    }

    pub fn provider(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Provider {
            provider: provider.into(),
            message: message.into(),
        }
    }

    pub fn channel(message: impl Into<String>) -> Self {
        Self::Channel {
            message: message.into(),
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Whether the caller may retry the same request later
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::NotReady { .. } | Self::Channel { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_ready_error() {
        let error = DomainError::not_ready("No active sync session");
        assert_eq!(error.to_string(), "Not ready: No active sync session");
        assert!(error.is_retryable());
    }

    #[test]
    fn test_not_found_error() {
        let error = DomainError::not_found("No matching knowledge bases");
        assert_eq!(error.to_string(), "Not found: No matching knowledge bases");
        assert!(!error.is_retryable());
    }

    #[test]
    fn test_upstream_error_carries_context() {
        let error = DomainError::upstream("kb-1", SearchStage::Rerank, "timeout");
        assert_eq!(
            error.to_string(),
            "Upstream failure in rerank for knowledge base 'kb-1': timeout"
        );
        assert!(!error.is_retryable());
    }
}
