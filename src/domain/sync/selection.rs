//! Allow-list of knowledge bases exposed to the search server

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::domain::knowledge_base::KnowledgeBase;

/// Signature used when every knowledge base is selected
pub const ALL_SELECTION: &str = "ALL";

/// Knowledge base IDs the owner is allowed to replicate
///
/// An empty allow-list selects every knowledge base.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AllowList(Vec<String>);

impl AllowList {
    pub fn new<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(ids.into_iter().map(Into::into).collect())
    }

    /// Allow-list selecting every knowledge base
    pub fn all() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn allows(&self, id: &str) -> bool {
        self.0.is_empty() || self.0.iter().any(|allowed| allowed == id)
    }

    /// Deterministic description of the selection: sorted IDs, or `ALL`
    pub fn signature(&self) -> String {
        if self.0.is_empty() {
            return ALL_SELECTION.to_string();
        }

        let mut ids: Vec<&str> = self.0.iter().map(String::as_str).collect();
        ids.sort_unstable();
        ids.join(",")
    }

    /// Bases passing the allow-list, in their original order
    pub fn select<'a>(&self, bases: &'a [KnowledgeBase]) -> Vec<&'a KnowledgeBase> {
        bases.iter().filter(|base| self.allows(&base.id)).collect()
    }

    /// Allow-listed IDs that are absent from `bases`
    pub fn missing(&self, bases: &[KnowledgeBase]) -> Vec<String> {
        let present: HashSet<&str> = bases.iter().map(|base| base.id.as_str()).collect();

        self.0
            .iter()
            .filter(|id| !present.contains(id.as_str()))
            .cloned()
            .collect()
    }
}
