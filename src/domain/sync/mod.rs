//! Sync domain - replication of knowledge bases from owner to server

mod fingerprint;
mod message;
mod peer;
mod selection;
mod snapshot;

pub use fingerprint::{EMPTY_MARKER, fingerprint};
pub use message::{SyncAck, SyncMessage};
pub use peer::{OwnerPeer, ReplicaPeer};
pub use selection::{ALL_SELECTION, AllowList};
pub use snapshot::Snapshot;

#[cfg(test)]
pub use peer::mock::{RecordingOwnerPeer, RecordingReplicaPeer};
