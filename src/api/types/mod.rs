//! API request and response types

pub mod error;
pub mod json;
pub mod knowledge_base;

pub use error::{ApiError, ApiErrorResponse};
pub use json::Json;
pub use knowledge_base::{KnowledgeBasesResponse, SearchResponse};
