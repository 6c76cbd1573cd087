//! In-memory intent store

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{decode_intent, encode_intent, Error, IntentStore};
use crate::types::RegistrationIntent;

#[derive(Debug, Default)]
struct Inner {
    pending_registration: Option<String>,
    current_transaction: Option<String>,
}

/// In-memory [`IntentStore`]
///
/// Keeps the serialized form, so a corrupt entry behaves exactly like it
/// would in a durable store.
#[derive(Debug, Clone, Default)]
pub struct MemoryIntentStore {
    inner: Arc<RwLock<Inner>>,
}

impl MemoryIntentStore {
    /// Create empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrite the stored pending registration with raw bytes
    pub async fn insert_raw<S: Into<String>>(&self, raw: S) {
        self.inner.write().await.pending_registration = Some(raw.into());
    }

    /// Raw stored pending registration
    pub async fn raw(&self) -> Option<String> {
        self.inner.read().await.pending_registration.clone()
    }
}

#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
impl IntentStore for MemoryIntentStore {
    async fn save_intent(&self, intent: RegistrationIntent) -> Result<(), Error> {
        let raw = encode_intent(&intent)?;
        self.inner.write().await.pending_registration = Some(raw);
        Ok(())
    }

    async fn load_intent(&self) -> Result<Option<RegistrationIntent>, Error> {
        Ok(self
            .inner
            .read()
            .await
            .pending_registration
            .as_deref()
            .and_then(decode_intent))
    }

    async fn clear_intent(&self) -> Result<(), Error> {
        self.inner.write().await.pending_registration = None;
        Ok(())
    }

    async fn set_current_transaction(&self, transaction_id: &str) -> Result<(), Error> {
        self.inner.write().await.current_transaction = Some(transaction_id.to_string());
        Ok(())
    }

    async fn current_transaction(&self) -> Result<Option<String>, Error> {
        Ok(self.inner.read().await.current_transaction.clone())
    }

    async fn clear_current_transaction(&self) -> Result<(), Error> {
        self.inner.write().await.current_transaction = None;
        Ok(())
    }
}
