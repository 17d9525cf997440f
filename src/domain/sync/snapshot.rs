//! Snapshot building on the owner side

use crate::domain::knowledge_base::{KnowledgeBase, SyncEntry};

use super::fingerprint::fingerprint;
use super::selection::AllowList;

/// Full set of entries for one push
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub entries: Vec<SyncEntry>,
    /// Allow-listed IDs that had no matching base
    pub missing: Vec<String>,
    pub fingerprint: String,
}

impl Snapshot {
    /// Project the bases selected by `allow_list` into sync entries
    pub fn build(bases: &[KnowledgeBase], allow_list: &AllowList) -> Self {
        let entries = allow_list
            .select(bases)
            .into_iter()
            .map(SyncEntry::from_knowledge_base)
            .collect();

        Self {
            entries,
            missing: allow_list.missing(bases),
            fingerprint: fingerprint(bases, allow_list),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
