//! Messages exchanged between the owner process and the search server

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::knowledge_base::SyncEntry;

/// One message on the owner/server channel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum SyncMessage {
    /// Server asks the owner to start (or refresh) pushing snapshots
    RequestSync,
    /// Server asks the owner to stop pushing
    StopSync,
    /// Owner pushes a complete snapshot
    SyncBases { entries: Vec<SyncEntry> },
    /// Owner reports that its session has ended
    SessionStopped,
}

impl SyncMessage {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::RequestSync => "requestSync",
            Self::StopSync => "stopSync",
            Self::SyncBases { .. } => "syncBases",
            Self::SessionStopped => "sessionStopped",
        }
    }
}

/// Replica's answer to a `syncBases` push
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncAck {
    pub accepted: bool,
    #[serde(rename = "syncedAt", default, skip_serializing_if = "Option::is_none")]
    pub synced_at: Option<DateTime<Utc>>,
}

impl SyncAck {
    pub fn accepted(synced_at: DateTime<Utc>) -> Self {
        Self {
            accepted: true,
            synced_at: Some(synced_at),
        }
    }

    pub fn rejected() -> Self {
        Self {
            accepted: false,
            synced_at: None,
        }
    }
}
