//! Handles each side holds on the other end of the sync channel

use std::fmt::Debug;

use async_trait::async_trait;

use crate::domain::error::DomainError;
use crate::domain::knowledge_base::SyncEntry;

use super::message::SyncAck;

/// Owner's view of the search server
#[async_trait]
pub trait ReplicaPeer: Send + Sync + Debug {
    /// Push a complete snapshot; the replica answers whether it was applied
    async fn push_bases(&self, entries: Vec<SyncEntry>) -> Result<SyncAck, DomainError>;

    /// Tell the replica the owner-side session has ended
    async fn notify_stopped(&self) -> Result<(), DomainError>;
}

/// Search server's view of the owner
#[async_trait]
pub trait OwnerPeer: Send + Sync + Debug {
    async fn request_sync(&self) -> Result<(), DomainError>;

    async fn stop_sync(&self) -> Result<(), DomainError>;
}
