//! Registration intent storage
//!
//! An [`IntentStore`] holds at most one pending [`RegistrationIntent`] and the
//! last issued transaction id for a single session. It must survive the
//! process going away while the payer is on the gateway.

use std::fmt::Debug;

use async_trait::async_trait;
use thiserror::Error;

use crate::types::RegistrationIntent;

mod memory;

pub use memory::MemoryIntentStore;

/// Intent store error
#[derive(Debug, Error)]
pub enum Error {
    /// Intent is missing a field the store requires
    #[error("Intent is missing `{0}`")]
    MissingField(&'static str),
    /// Serde Json error
    #[error(transparent)]
    Serde(#[from] serde_json::Error),
    /// Backend specific error
    #[error(transparent)]
    Database(Box<dyn std::error::Error + Send + Sync>),
}

/// Session scoped durable storage for the pending registration
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
pub trait IntentStore: Debug {
    /// Persist `intent`, replacing whatever was stored
    async fn save_intent(&self, intent: RegistrationIntent) -> Result<(), Error>;

    /// Load the stored intent.
    ///
    /// Stored data that fails to parse is reported as `None`.
    async fn load_intent(&self) -> Result<Option<RegistrationIntent>, Error>;

    /// Remove the stored intent. Clearing an empty store is a no-op.
    async fn clear_intent(&self) -> Result<(), Error>;

    /// Remember the last issued transaction id
    async fn set_current_transaction(&self, transaction_id: &str) -> Result<(), Error>;

    /// Last issued transaction id
    async fn current_transaction(&self) -> Result<Option<String>, Error>;

    /// Forget the last issued transaction id
    async fn clear_current_transaction(&self) -> Result<(), Error>;
}

/// Serialize an intent for storage, rejecting intents without a tournament or
/// team name.
pub fn encode_intent(intent: &RegistrationIntent) -> Result<String, Error> {
    if intent.tournament_id.is_empty() {
        return Err(Error::MissingField("tournamentId"));
    }
    if intent.team_name.is_empty() {
        return Err(Error::MissingField("teamName"));
    }

    Ok(serde_json::to_string(intent)?)
}

/// Parse a stored intent. Corrupt data is logged and treated as absent.
pub fn decode_intent(raw: &str) -> Option<RegistrationIntent> {
    match serde_json::from_str(raw) {
        Ok(intent) => Some(intent),
        Err(e) => {
            tracing::warn!("Ignoring unparsable pending registration: {}", e);
            None
        }
    }
}
