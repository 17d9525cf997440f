//! Owner-side sync session controller
//!
//! While a session is active the controller watches the registry and pushes a
//! fresh snapshot to the replica whenever the selection fingerprint changes.
//! Snapshots go through a per-session queue drained by one worker task, so the
//! replica receives them in the order they were built.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, Weak};

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::domain::sync::fingerprint;
use crate::domain::{AllowList, KnowledgeBase, ReplicaPeer, Snapshot};
use crate::infrastructure::knowledge_base::{KnowledgeBaseRegistry, RegistryListener, Subscription};
use crate::infrastructure::observability::{PushTrigger, record_sync_push};

/// A snapshot waiting for the push worker
#[derive(Debug)]
struct PushJob {
    snapshot: Snapshot,
    done: Option<oneshot::Sender<()>>,
}

/// Resources owned by a running session
#[derive(Debug)]
struct ActiveSession {
    subscription: Subscription,
    queue: mpsc::UnboundedSender<PushJob>,
    worker: JoinHandle<()>,
}

#[derive(Debug, Default)]
struct SessionState {
    session: Option<ActiveSession>,
    last_fingerprint: Option<String>,
}

impl SessionState {
    fn is_active(&self) -> bool {
        self.session.is_some()
    }
}

#[derive(Debug)]
struct Inner {
    registry: Arc<KnowledgeBaseRegistry>,
    peer: Arc<dyn ReplicaPeer>,
    allow_list: AllowList,
    state: Mutex<SessionState>,
    pushes: AtomicU64,
}

/// Drives snapshot pushes from the owner registry to the replica peer
#[derive(Debug, Clone)]
pub struct SyncSessionController {
    inner: Arc<Inner>,
}

impl SyncSessionController {
    pub fn new(
        registry: Arc<KnowledgeBaseRegistry>,
        peer: Arc<dyn ReplicaPeer>,
        allow_list: AllowList,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                registry,
                peer,
                allow_list,
                state: Mutex::new(SessionState::default()),
                pushes: AtomicU64::new(0),
            }),
        }
    }

    /// Start a session, or refresh the replica if one is already running
    ///
    /// Must be called from within a tokio runtime; the session's push worker
    /// is spawned onto it. Returns once this call's snapshot has been pushed.
    pub async fn start(&self) {
        let done = {
            let mut state = self.inner.lock_state();

            let trigger = if state.is_active() {
                PushTrigger::Refresh
            } else {
                state.last_fingerprint = None;
                state.session = Some(self.open_session());
                info!(
                    allow_list = %self.inner.allow_list.signature(),
                    "Knowledge base sync session started"
                );
                PushTrigger::Start
            };

            let snapshot = Snapshot::build(&self.inner.registry.list(), &self.inner.allow_list);
            let (done_tx, done_rx) = oneshot::channel();
            self.inner.enqueue(&mut state, snapshot, trigger, Some(done_tx));
            done_rx
        };

        if done.await.is_err() {
            debug!("Push worker exited before the start snapshot was pushed");
        }
    }

    /// End the session and tell the replica to drop its copy
    ///
    /// Snapshots already queued are pushed before the replica is notified.
    pub async fn stop(&self) {
        let session = {
            let mut state = self.inner.lock_state();
            state.last_fingerprint = None;
            state.session.take()
        };

        let Some(ActiveSession {
            subscription,
            queue,
            worker,
        }) = session
        else {
            return;
        };

        subscription.cancel();
        drop(queue);
        if let Err(e) = worker.await {
            warn!(error = %e, "Push worker terminated abnormally");
        }
        info!("Knowledge base sync session stopped");

        if let Err(e) = self.inner.peer.notify_stopped().await {
            warn!(error = %e, "Failed to notify replica that the session stopped");
        }
    }

    pub fn is_active(&self) -> bool {
        self.inner.lock_state().is_active()
    }

    /// Number of snapshot pushes issued since construction
    pub fn pushes_issued(&self) -> u64 {
        self.inner.pushes.load(Ordering::SeqCst)
    }

    fn open_session(&self) -> ActiveSession {
        let (queue, jobs) = mpsc::unbounded_channel();
        let worker = tokio::spawn(run_push_worker(Arc::downgrade(&self.inner), jobs));

        let inner: Weak<Inner> = Arc::downgrade(&self.inner);
        let listener: RegistryListener = Arc::new(move |_bases: &[KnowledgeBase]| {
            if let Some(inner) = inner.upgrade() {
                inner.on_mutation();
            }
        });

        ActiveSession {
            subscription: self.inner.registry.subscribe(listener),
            queue,
            worker,
        }
    }
}

/// Push queued snapshots one at a time until the session drops its sender
async fn run_push_worker(inner: Weak<Inner>, mut jobs: mpsc::UnboundedReceiver<PushJob>) {
    while let Some(job) = jobs.recv().await {
        let Some(inner) = inner.upgrade() else {
            break;
        };

        inner.push(job.snapshot).await;
        if let Some(done) = job.done {
            let _ = done.send(());
        }
    }
}

impl Inner {
    fn lock_state(&self) -> std::sync::MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// React to a registry change
    ///
    /// The registry is re-read under the session lock, so the newest queued
    /// snapshot always reflects the newest registry state even when listener
    /// calls from concurrent mutations interleave.
    fn on_mutation(&self) {
        let mut state = self.lock_state();
        if !state.is_active() {
            return;
        }

        let bases = self.registry.list();
        let current = fingerprint(&bases, &self.allow_list);
        if state.last_fingerprint.as_deref() == Some(current.as_str()) {
            return;
        }

        let snapshot = Snapshot::build(&bases, &self.allow_list);
        self.enqueue(&mut state, snapshot, PushTrigger::Mutation, None);
    }

    fn enqueue(
        &self,
        state: &mut SessionState,
        snapshot: Snapshot,
        trigger: PushTrigger,
        done: Option<oneshot::Sender<()>>,
    ) {
        let Some(session) = state.session.as_ref() else {
            return;
        };

        state.last_fingerprint = Some(snapshot.fingerprint.clone());
        self.pushes.fetch_add(1, Ordering::SeqCst);
        record_sync_push(trigger);

        if session.queue.send(PushJob { snapshot, done }).is_err() {
            warn!("Push worker is gone, snapshot dropped");
        }
    }

    async fn push(&self, snapshot: Snapshot) {
        if !snapshot.missing.is_empty() {
            warn!(
                missing = ?snapshot.missing,
                "Allow-listed knowledge bases not found, pushing the ones present"
            );
        }

        let count = snapshot.entries.len();
        match self.peer.push_bases(snapshot.entries).await {
            Ok(ack) if ack.accepted => {
                debug!(count, synced_at = ?ack.synced_at, "Replica accepted snapshot");
            }
            Ok(_) => debug!(count, "Replica rejected snapshot"),
            Err(e) => warn!(error = %e, count, "Failed to push knowledge base snapshot"),
        }
    }
}
