//! Sync session plumbing: owner controller, server replica and the channel between them

mod channel;
mod controller;
mod replica;

pub use channel::{
    Envelope, LocalChannel, LocalOwnerPeer, LocalReplicaPeer, spawn_owner_endpoint,
    spawn_replica_endpoint,
};
pub use controller::SyncSessionController;
pub use replica::{ReplicaSnapshot, StoreReplica, SyncStatus};
