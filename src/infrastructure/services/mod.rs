//! Infrastructure services

mod knowledge_base_search_service;

pub use knowledge_base_search_service::KnowledgeBaseSearchService;
