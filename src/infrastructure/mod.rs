//! Infrastructure layer - stateful implementations and external integrations

pub mod knowledge_base;
pub mod logging;
pub mod observability;
pub mod services;
pub mod sync;
