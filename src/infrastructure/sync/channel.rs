//! In-process sync channel between owner and replica
//!
//! Two bounded queues, one per direction, carry [`SyncMessage`]s. Each side
//! runs an endpoint task that dispatches inbound messages.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::domain::{DomainError, OwnerPeer, ReplicaPeer, SyncAck, SyncEntry, SyncMessage};

use super::controller::SyncSessionController;
use super::replica::StoreReplica;

/// A message plus the reply slot for acknowledged messages
#[derive(Debug)]
pub struct Envelope {
    pub message: SyncMessage,
    reply: Option<oneshot::Sender<SyncAck>>,
}

impl Envelope {
    fn new(message: SyncMessage) -> Self {
        Self {
            message,
            reply: None,
        }
    }
}

/// Both halves of a local channel
#[derive(Debug)]
pub struct LocalChannel {
    /// Handle the owner uses to reach the replica
    pub replica_peer: Arc<LocalReplicaPeer>,
    /// Handle the replica uses to reach the owner
    pub owner_peer: Arc<LocalOwnerPeer>,
    /// Messages addressed to the owner
    pub owner_inbox: mpsc::Receiver<Envelope>,
    /// Messages addressed to the replica
    pub replica_inbox: mpsc::Receiver<Envelope>,
}

impl LocalChannel {
    pub fn new(buffer: usize) -> Self {
        let (to_owner, owner_inbox) = mpsc::channel(buffer.max(1));
        let (to_replica, replica_inbox) = mpsc::channel(buffer.max(1));

        Self {
            replica_peer: Arc::new(LocalReplicaPeer { to_replica }),
            owner_peer: Arc::new(LocalOwnerPeer { to_owner }),
            owner_inbox,
            replica_inbox,
        }
    }
}

async fn send(sender: &mpsc::Sender<Envelope>, envelope: Envelope) -> Result<(), DomainError> {
    let kind = envelope.message.kind();
    sender
        .send(envelope)
        .await
        .map_err(|_| DomainError::channel(format!("Sync channel closed while sending {}", kind)))
}

/// Owner-side sender towards the replica
#[derive(Debug, Clone)]
pub struct LocalReplicaPeer {
    to_replica: mpsc::Sender<Envelope>,
}

#[async_trait]
impl ReplicaPeer for LocalReplicaPeer {
    async fn push_bases(&self, entries: Vec<SyncEntry>) -> Result<SyncAck, DomainError> {
        let (reply, ack) = oneshot::channel();
        let envelope = Envelope {
            message: SyncMessage::SyncBases { entries },
            reply: Some(reply),
        };

        send(&self.to_replica, envelope).await?;

        ack.await
            .map_err(|_| DomainError::channel("Replica dropped the sync without answering"))
    }

    async fn notify_stopped(&self) -> Result<(), DomainError> {
        send(&self.to_replica, Envelope::new(SyncMessage::SessionStopped)).await
    }
}

/// Replica-side sender towards the owner
#[derive(Debug, Clone)]
pub struct LocalOwnerPeer {
    to_owner: mpsc::Sender<Envelope>,
}

#[async_trait]
impl OwnerPeer for LocalOwnerPeer {
    async fn request_sync(&self) -> Result<(), DomainError> {
        send(&self.to_owner, Envelope::new(SyncMessage::RequestSync)).await
    }

    async fn stop_sync(&self) -> Result<(), DomainError> {
        send(&self.to_owner, Envelope::new(SyncMessage::StopSync)).await
    }
}

/// Dispatch owner-bound messages to the controller until the channel closes
pub fn spawn_owner_endpoint(
    mut inbox: mpsc::Receiver<Envelope>,
    controller: SyncSessionController,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(envelope) = inbox.recv().await {
            match envelope.message {
                SyncMessage::RequestSync => controller.start().await,
                SyncMessage::StopSync => controller.stop().await,
                other => warn!(kind = other.kind(), "Owner received unexpected sync message"),
            }
        }
        debug!("Owner sync endpoint closed");
    })
}

/// Dispatch replica-bound messages to the store until the channel closes
pub fn spawn_replica_endpoint(
    mut inbox: mpsc::Receiver<Envelope>,
    replica: Arc<StoreReplica>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(envelope) = inbox.recv().await {
            match envelope.message {
                SyncMessage::SyncBases { entries } => {
                    let ack = replica.accept_sync(entries);
                    let answered = envelope.reply.map(|reply| reply.send(ack).is_ok());
                    if answered == Some(false) {
                        debug!("Owner stopped waiting for sync acknowledgement");
                    }
                }
                SyncMessage::SessionStopped => replica.handle_peer_stopped(),
                other => warn!(kind = other.kind(), "Replica received unexpected sync message"),
            }
        }
        debug!("Replica sync endpoint closed");
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use crate::domain::{AllowList, ClientDescriptor, KnowledgeBase};
    use crate::infrastructure::knowledge_base::KnowledgeBaseRegistry;

    fn base(id: &str) -> KnowledgeBase {
        KnowledgeBase::new(
            id,
            format!("Base {}", id),
            1024,
            ClientDescriptor::new("cohere", "embed-english-v3.0", "https://api.cohere.ai/v1"),
        )
    }

    struct Wired {
        registry: Arc<KnowledgeBaseRegistry>,
        controller: SyncSessionController,
        replica: Arc<StoreReplica>,
    }

    fn wire(ids: &[&str]) -> Wired {
        let registry = Arc::new(
            KnowledgeBaseRegistry::with_bases(ids.iter().map(|id| base(id)).collect()).unwrap(),
        );
        let channel = LocalChannel::new(8);
        let controller = SyncSessionController::new(
            Arc::clone(&registry),
            channel.replica_peer.clone(),
            AllowList::all(),
        );
        let replica = Arc::new(StoreReplica::new(channel.owner_peer.clone()));

        spawn_owner_endpoint(channel.owner_inbox, controller.clone());
        spawn_replica_endpoint(channel.replica_inbox, Arc::clone(&replica));

        Wired {
            registry,
            controller,
            replica,
        }
    }

    async fn eventually(mut condition: impl FnMut() -> bool) {
        for _ in 0..100 {
            if condition() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("condition not reached in time");
    }

    #[tokio::test]
    async fn test_start_session_replicates_bases() {
        let wired = wire(&["a", "b"]);

        wired.replica.start_session().await.unwrap();

        eventually(|| wired.replica.has_bases()).await;
        assert!(wired.controller.is_active());
        assert_eq!(wired.replica.list_metadata().len(), 2);
    }

    #[tokio::test]
    async fn test_mutations_flow_to_replica() {
        let wired = wire(&["a"]);
        wired.replica.start_session().await.unwrap();
        eventually(|| wired.replica.has_bases()).await;

        wired.registry.upsert(base("b")).unwrap();
        eventually(|| wired.replica.get("b").is_some()).await;

        wired.registry.remove("a");
        eventually(|| wired.replica.get("a").is_none()).await;
        assert_eq!(wired.replica.list_metadata().len(), 1);
    }

    #[tokio::test]
    async fn test_replica_stop_stops_controller() {
        let wired = wire(&["a"]);
        wired.replica.start_session().await.unwrap();
        eventually(|| wired.controller.is_active()).await;

        wired.replica.stop_session().await.unwrap();

        eventually(|| !wired.controller.is_active()).await;
        assert!(!wired.replica.has_bases());
        assert_eq!(wired.registry.listener_count(), 0);
    }

    #[tokio::test]
    async fn test_owner_stop_clears_replica() {
        let wired = wire(&["a"]);
        wired.replica.start_session().await.unwrap();
        eventually(|| wired.replica.has_bases()).await;

        wired.controller.stop().await;

        eventually(|| !wired.replica.is_active()).await;
        assert!(!wired.replica.has_bases());
    }

    #[tokio::test]
    async fn test_push_without_session_is_rejected() {
        let channel = LocalChannel::new(4);
        let replica = Arc::new(StoreReplica::new(channel.owner_peer.clone()));
        spawn_replica_endpoint(channel.replica_inbox, Arc::clone(&replica));

        let ack = channel.replica_peer.push_bases(vec![]).await.unwrap();

        assert!(!ack.accepted);
    }

    #[tokio::test]
    async fn test_closed_channel_is_channel_error() {
        let channel = LocalChannel::new(4);
        drop(channel.owner_inbox);

        let error = channel.owner_peer.request_sync().await.unwrap_err();

        assert!(matches!(error, DomainError::Channel { .. }));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_mutation_burst_leaves_replica_current() {
        let wired = wire(&["a"]);
        wired.replica.start_session().await.unwrap();
        eventually(|| wired.replica.has_bases()).await;

        let registry = Arc::clone(&wired.registry);
        tokio::spawn(async move {
            for n in 0..5 {
                registry.upsert(base(&format!("n{}", n))).unwrap();
            }
        })
        .await
        .unwrap();

        let owner_ids: Vec<String> = wired.registry.list().into_iter().map(|b| b.id).collect();
        let replica_ids = || -> Vec<String> {
            wired
                .replica
                .list_metadata()
                .into_iter()
                .map(|m| m.id)
                .collect()
        };

        eventually(|| replica_ids() == owner_ids).await;
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(replica_ids(), owner_ids);
    }
}

