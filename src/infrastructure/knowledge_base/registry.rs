//! Owner-side registry of knowledge bases
//!
//! Holds the authoritative knowledge base list and notifies subscribers after
//! every mutation that changed it.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock, Weak};

use tracing::debug;

use crate::domain::knowledge_base::validate_knowledge_base_id;
use crate::domain::{DomainError, KnowledgeBase, KnowledgeItem};

/// Callback invoked with the post-mutation knowledge base list
pub type RegistryListener = Arc<dyn Fn(&[KnowledgeBase]) + Send + Sync>;

/// In-memory knowledge base registry with change notification
pub struct KnowledgeBaseRegistry {
    bases: RwLock<Vec<KnowledgeBase>>,
    listeners: Mutex<Vec<(u64, RegistryListener)>>,
    next_listener_id: AtomicU64,
}

impl std::fmt::Debug for KnowledgeBaseRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KnowledgeBaseRegistry")
            .field("bases", &self.list().len())
            .finish()
    }
}

impl Default for KnowledgeBaseRegistry {
    fn default() -> Self {
        Self {
            bases: RwLock::new(Vec::new()),
            listeners: Mutex::new(Vec::new()),
            next_listener_id: AtomicU64::new(0),
        }
    }
}

impl KnowledgeBaseRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry pre-populated with `bases`
    pub fn with_bases(bases: Vec<KnowledgeBase>) -> Result<Self, DomainError> {
        for (index, base) in bases.iter().enumerate() {
            validate_knowledge_base_id(&base.id)
                .map_err(|e| DomainError::validation(e.to_string()))?;

            if bases[..index].iter().any(|other| other.id == base.id) {
                return Err(DomainError::validation(format!(
                    "Duplicate knowledge base ID '{}'",
                    base.id
                )));
            }
        }

        let registry = Self::new();
        *registry.bases.write().unwrap_or_else(PoisonError::into_inner) = bases;
        Ok(registry)
    }

    /// All knowledge bases in insertion order
    pub fn list(&self) -> Vec<KnowledgeBase> {
        self.bases
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn get(&self, id: &str) -> Option<KnowledgeBase> {
        self.bases
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .find(|base| base.id == id)
            .cloned()
    }

    /// Insert a new knowledge base or replace an existing one
    ///
    /// Replacing keeps the position and bumps the version past the stored one.
    pub fn upsert(&self, mut base: KnowledgeBase) -> Result<KnowledgeBase, DomainError> {
        validate_knowledge_base_id(&base.id).map_err(|e| DomainError::validation(e.to_string()))?;

        let stored = self.mutate(|bases| {
            let stored = match bases.iter_mut().find(|existing| existing.id == base.id) {
                Some(existing) => {
                    base.version = existing.version;
                    base.created_at = existing.created_at;
                    base.touch();
                    *existing = base;
                    existing.clone()
                }
                None => {
                    bases.push(base.clone());
                    base
                }
            };
            (stored, true)
        });

        Ok(stored)
    }

    /// Apply `f` to a knowledge base and record the modification
    pub fn update<F>(&self, id: &str, f: F) -> Result<KnowledgeBase, DomainError>
    where
        F: FnOnce(&mut KnowledgeBase),
    {
        self.mutate(|bases| match bases.iter_mut().find(|base| base.id == id) {
            Some(base) => {
                f(base);
                base.touch();
                (Some(base.clone()), true)
            }
            None => (None, false),
        })
        .ok_or_else(|| DomainError::not_found(format!("Knowledge base '{}' not found", id)))
    }

    /// Remove a knowledge base, returning whether it existed
    pub fn remove(&self, id: &str) -> bool {
        self.mutate(|bases| match bases.iter().position(|base| base.id == id) {
            Some(index) => {
                bases.remove(index);
                (true, true)
            }
            None => (false, false),
        })
    }

    pub fn add_item(&self, id: &str, item: KnowledgeItem) -> Result<KnowledgeBase, DomainError> {
        self.update(id, |base| base.items.push(item))
    }

    /// Remove an item, returning whether it existed
    pub fn remove_item(&self, id: &str, item_id: &str) -> Result<bool, DomainError> {
        let removed = self.mutate(|bases| {
            let Some(base) = bases.iter_mut().find(|base| base.id == id) else {
                return (None, false);
            };

            match base.items.iter().position(|item| item.id == item_id) {
                Some(index) => {
                    base.items.remove(index);
                    base.touch();
                    (Some(true), true)
                }
                None => (Some(false), false),
            }
        });

        removed.ok_or_else(|| DomainError::not_found(format!("Knowledge base '{}' not found", id)))
    }

    /// Register a listener for mutations
    ///
    /// The listener stays registered until the returned handle is cancelled.
    pub fn subscribe(self: &Arc<Self>, listener: RegistryListener) -> Subscription {
        let id = self.next_listener_id.fetch_add(1, Ordering::Relaxed);

        self.listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((id, listener));
        debug!(listener_id = id, "Registry listener subscribed");

        Subscription {
            id,
            registry: Arc::downgrade(self),
        }
    }

    pub fn listener_count(&self) -> usize {
        self.listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    fn unsubscribe(&self, id: u64) {
        self.listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .retain(|(listener_id, _)| *listener_id != id);
        debug!(listener_id = id, "Registry listener unsubscribed");
    }

    /// Run `f` under the write lock and notify listeners if it reports a change
    ///
    /// Listeners run after the lock is released, so they may read the registry.
    fn mutate<T, F>(&self, f: F) -> T
    where
        F: FnOnce(&mut Vec<KnowledgeBase>) -> (T, bool),
    {
        let (outcome, current) = {
            let mut bases = self.bases.write().unwrap_or_else(PoisonError::into_inner);
            let (outcome, changed) = f(&mut bases);
            (outcome, changed.then(|| bases.clone()))
        };

        if let Some(current) = current {
            self.notify(&current);
        }

        outcome
    }

    fn notify(&self, bases: &[KnowledgeBase]) {
        let listeners: Vec<RegistryListener> = self
            .listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect();

        for listener in listeners {
            listener(bases);
        }
    }
}

/// Cancellation handle for a registry listener
#[derive(Debug)]
pub struct Subscription {
    id: u64,
    registry: Weak<KnowledgeBaseRegistry>,
}

impl Subscription {
    /// Remove the listener from the registry
    pub fn cancel(self) {
        if let Some(registry) = self.registry.upgrade() {
            registry.unsubscribe(self.id);
        }
    }
}
