//! Context → thread resolution with at most one remote thread per context.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use crow_assistants::AssistantsClient;
use tokio::sync::Mutex as AsyncMutex;

use crate::thread_store::ThreadStore;
use crate::RelayError;

/// Lazily creates remote threads and caches the mapping.
///
/// Lookups for known contexts only take the shared read lock. A miss takes a
/// per-context creation lock, so concurrent first messages for one context
/// produce a single remote thread while other contexts proceed independently.
pub struct ThreadRegistry {
    client: Arc<dyn AssistantsClient>,
    store: Arc<dyn ThreadStore>,
    threads: RwLock<HashMap<String, String>>,
    creating: Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
}

impl ThreadRegistry {
    pub fn new(client: Arc<dyn AssistantsClient>, store: Arc<dyn ThreadStore>) -> Self {
        Self {
            client,
            store,
            threads: RwLock::new(HashMap::new()),
            creating: Mutex::new(HashMap::new()),
        }
    }

    pub fn cached(&self, context_id: &str) -> Option<String> {
        self.threads
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(context_id)
            .cloned()
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.threads
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    #[cfg(test)]
    fn pending_gates(&self) -> usize {
        self.creating
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub async fn get_or_create_thread(&self, context_id: &str) -> Result<String, RelayError> {
        if context_id.trim().is_empty() {
            return Err(RelayError::Validation(
                "conversation context cannot be empty".to_string(),
            ));
        }
        if let Some(thread_id) = self.cached(context_id) {
            return Ok(thread_id);
        }

        let gate = self.creation_gate(context_id);
        let _guard = gate.lock.lock().await;
        if let Some(thread_id) = self.cached(context_id) {
            return Ok(thread_id);
        }

        let thread_id = match self.store.load_thread(context_id).await {
            Ok(Some(thread_id)) => {
                tracing::debug!(context_id, thread_id = %thread_id, "restored thread mapping");
                thread_id
            }
            Ok(None) => self.create_thread(context_id).await?,
            Err(error) => {
                tracing::warn!(context_id, error = %error, "thread store lookup failed");
                self.create_thread(context_id).await?
            }
        };

        self.threads
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(context_id.to_string(), thread_id.clone());
        Ok(thread_id)
    }

    async fn create_thread(&self, context_id: &str) -> Result<String, RelayError> {
        let thread = self
            .client
            .create_thread()
            .await
            .map_err(RelayError::platform("create_thread"))?;
        tracing::info!(context_id, thread_id = %thread.id, "created assistant thread");
        if let Err(error) = self.store.save_thread(context_id, &thread.id).await {
            tracing::warn!(
                context_id,
                thread_id = %thread.id,
                error = %error,
                "failed to persist thread mapping"
            );
        }
        Ok(thread.id)
    }

    fn creation_gate<'a>(&'a self, context_id: &'a str) -> CreationGate<'a> {
        let lock = self
            .creating
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(context_id.to_string())
            .or_default()
            .clone();
        CreationGate {
            creating: &self.creating,
            context_id,
            lock,
        }
    }
}

/// Per-context creation lock; the map entry is dropped with its last holder.
struct CreationGate<'a> {
    creating: &'a Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
    context_id: &'a str,
    lock: Arc<AsyncMutex<()>>,
}

impl Drop for CreationGate<'_> {
    fn drop(&mut self) {
        let mut creating = self
            .creating
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        // Two references: the map entry and this gate.
        let last_holder = creating
            .get(self.context_id)
            .is_some_and(|entry| Arc::ptr_eq(entry, &self.lock))
            && Arc::strong_count(&self.lock) == 2;
        if last_holder {
            creating.remove(self.context_id);
        }
    }
}
