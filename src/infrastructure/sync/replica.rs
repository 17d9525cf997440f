//! Server-side replica of the owner's knowledge bases

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info};

use crate::domain::{
    DomainError, KnowledgeBaseMetadata, KnowledgeBaseParams, OwnerPeer, SyncAck, SyncEntry,
};
use crate::infrastructure::observability::{record_replica_cleared, record_sync_received};

/// Immutable view of one accepted sync
#[derive(Debug, Clone, Default)]
pub struct ReplicaSnapshot {
    entries: Vec<SyncEntry>,
    index: HashMap<String, usize>,
    synced_at: Option<DateTime<Utc>>,
}

impl ReplicaSnapshot {
    /// Build from a pushed payload; a repeated id keeps the last entry at the
    /// position where the id first appeared
    fn from_entries(payload: Vec<SyncEntry>, synced_at: DateTime<Utc>) -> Self {
        let mut entries: Vec<SyncEntry> = Vec::with_capacity(payload.len());
        let mut index = HashMap::with_capacity(payload.len());

        for entry in payload {
            match index.get(entry.id()) {
                Some(&position) => entries[position] = entry,
                None => {
                    index.insert(entry.id().to_string(), entries.len());
                    entries.push(entry);
                }
            }
        }

        Self {
            entries,
            index,
            synced_at: Some(synced_at),
        }
    }

    pub fn get(&self, id: &str) -> Option<&SyncEntry> {
        self.index.get(id).map(|&position| &self.entries[position])
    }

    pub fn entries(&self) -> &[SyncEntry] {
        &self.entries
    }

    pub fn metadata(&self) -> Vec<KnowledgeBaseMetadata> {
        self.entries.iter().map(|e| e.metadata.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn synced_at(&self) -> Option<DateTime<Utc>> {
        self.synced_at
    }
}

/// Session summary for the admin surface
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SyncStatus {
    pub active: bool,
    pub knowledge_base_count: usize,
    pub synced_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Default)]
struct ReplicaState {
    active: bool,
    snapshot: Arc<ReplicaSnapshot>,
}

/// Holds the most recently accepted snapshot while a session is active
#[derive(Debug)]
pub struct StoreReplica {
    state: RwLock<ReplicaState>,
    owner: Arc<dyn OwnerPeer>,
}

impl StoreReplica {
    pub fn new(owner: Arc<dyn OwnerPeer>) -> Self {
        Self {
            state: RwLock::new(ReplicaState::default()),
            owner,
        }
    }

    /// Replace the whole replica with `entries` if a session is active
    pub fn accept_sync(&self, entries: Vec<SyncEntry>) -> SyncAck {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);

        if !state.active {
            debug!(count = entries.len(), "Ignoring sync while session is inactive");
            record_sync_received(false, 0);
            return SyncAck::rejected();
        }

        let synced_at = Utc::now();
        state.snapshot = Arc::new(ReplicaSnapshot::from_entries(entries, synced_at));

        debug!(count = state.snapshot.len(), "Accepted knowledge base sync");
        record_sync_received(true, state.snapshot.len());

        SyncAck::accepted(synced_at)
    }

    /// Activate the session and ask the owner for a snapshot
    ///
    /// Asks again when already active, so a restarted server catches up.
    pub async fn start_session(&self) -> Result<(), DomainError> {
        let was_active = {
            let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
            std::mem::replace(&mut state.active, true)
        };

        if was_active {
            info!("Sync session already active, requesting a fresh snapshot");
        } else {
            info!("Sync session started");
        }

        self.owner.request_sync().await
    }

    /// Deactivate, drop all replicated bases and tell the owner to stop
    pub async fn stop_session(&self) -> Result<(), DomainError> {
        self.clear();
        info!("Sync session stopped");

        self.owner.stop_sync().await
    }

    /// The owner ended the session on its side
    pub fn handle_peer_stopped(&self) {
        self.clear();
        info!("Owner stopped the sync session");
    }

    pub fn list_metadata(&self) -> Vec<KnowledgeBaseMetadata> {
        self.snapshot().metadata()
    }

    pub fn get(&self, id: &str) -> Option<SyncEntry> {
        self.snapshot().get(id).cloned()
    }

    pub fn params(&self, id: &str) -> Option<KnowledgeBaseParams> {
        self.snapshot().get(id).map(|entry| entry.params.clone())
    }

    pub fn has_bases(&self) -> bool {
        !self.snapshot().is_empty()
    }

    pub fn is_active(&self) -> bool {
        self.read_state(|state| state.active)
    }

    pub fn last_synced_at(&self) -> Option<DateTime<Utc>> {
        self.snapshot().synced_at()
    }

    /// Current replica contents, unaffected by later syncs
    pub fn snapshot(&self) -> Arc<ReplicaSnapshot> {
        self.read_state(|state| Arc::clone(&state.snapshot))
    }

    /// The snapshot, only while a session is active
    pub fn active_snapshot(&self) -> Option<Arc<ReplicaSnapshot>> {
        self.read_state(|state| state.active.then(|| Arc::clone(&state.snapshot)))
    }

    pub fn status(&self) -> SyncStatus {
        self.read_state(|state| SyncStatus {
            active: state.active,
            knowledge_base_count: state.snapshot.len(),
            synced_at: state.snapshot.synced_at(),
        })
    }

    fn read_state<T>(&self, f: impl FnOnce(&ReplicaState) -> T) -> T {
        f(&self.state.read().unwrap_or_else(PoisonError::into_inner))
    }

    fn clear(&self) {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        state.active = false;
        state.snapshot = Arc::new(ReplicaSnapshot::default());
        record_replica_cleared();
    }
}
