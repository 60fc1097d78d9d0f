use asistente_core::session::{SESSION_KEY, generate_session_id, is_well_formed};

use crate::store::{KeyValueStore, StoreError};

/// Owns the persisted session identifier.
pub struct SessionManager {
    store: Box<dyn KeyValueStore>,
    namespace: String,
}

impl SessionManager {
    pub fn new(store: Box<dyn KeyValueStore>, namespace: impl Into<String>) -> Self {
        Self {
            store,
            namespace: namespace.into(),
        }
    }

    /// Return the stored identifier, generating and persisting one if absent.
    /// Only writes when nothing usable is stored.
    pub fn get_or_create(&mut self) -> Result<String, StoreError> {
        if let Some(id) = self.store.get(SESSION_KEY).filter(|id| !id.trim().is_empty()) {
            if !is_well_formed(&id, &self.namespace) {
                tracing::debug!(session_id = %id, "stored session id has a foreign format, keeping it");
            }
            return Ok(id);
        }
        let id = generate_session_id(&self.namespace);
        self.store.set(SESSION_KEY, &id)?;
        tracing::debug!(session_id = %id, "created session id");
        Ok(id)
    }

    /// Forget the current identifier and create a fresh one.
    pub fn reset(&mut self) -> Result<String, StoreError> {
        self.store.remove(SESSION_KEY)?;
        self.get_or_create()
    }

    pub fn store(&self) -> &dyn KeyValueStore {
        self.store.as_ref()
    }
}
