//! Checkout
//!
//! [`Checkout`] ties an [`IntentStore`] and a [`TournamentConnector`] together
//! and exposes the two halves of the payment flow.
//!
//! ```rust,no_run
//! # async fn example(checkout: entrypay::Checkout, form: entrypay::TeamForm) -> anyhow::Result<()> {
//! use entrypay::{Amount, CallbackParams};
//!
//! // Before the redirect: opens a payment session and hands off to the gateway
//! let handoff = checkout.initiate(&form, "tournament-id", Amount::from(200)).await?;
//!
//! // After the redirect: resolves the outcome and registers the team
//! let params: CallbackParams = "https://app.example/payment?id=tx1&code=PAYMENT_SUCCESS".parse()?;
//! let state = checkout.resolve(&params).await;
//! # Ok(())
//! # }
//! ```

use std::fmt::Debug;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::instrument;

use crate::callback::CallbackParams;
use crate::client::TournamentConnector;
use crate::database::IntentStore;
use crate::types::{Amount, PaymentHandoff, RegistrationIntent, TeamForm, TerminalState};
use crate::Error;

pub mod initiate;
mod recovery;
pub mod resolve;
#[cfg(test)]
pub(crate) mod test_support;

pub use initiate::InitiateSaga;
pub use recovery::RecoveryReport;
pub use resolve::ResolveSaga;

/// Hands the payer off to the gateway checkout page
pub trait Navigator: Debug {
    /// Leave the application for `url`
    fn navigate(&self, url: &str);
}

/// [`Navigator`] that only logs the payment url
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNavigator;

impl Navigator for LogNavigator {
    fn navigate(&self, url: &str) {
        tracing::info!("Continue payment at {}", url);
    }
}

/// What the resolver does when the payment status lookup fails
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnknownStatusPolicy {
    /// Assume the payer was charged and register the team
    #[default]
    Register,
    /// Keep a stored intent for reconciliation and report an ambiguous outcome
    Defer,
}

/// Callback resolver options
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverOptions {
    /// Fall back to the last issued transaction id when the redirect has none
    pub use_stored_transaction: bool,
    /// Handling of a failed status lookup
    pub unknown_status_policy: UnknownStatusPolicy,
}

/// Payment-confirmed team registration for one session
#[derive(Debug, Clone)]
pub struct Checkout {
    /// Session intent store
    pub localstore: Arc<dyn IntentStore + Send + Sync>,
    /// Tournament API
    pub client: Arc<dyn TournamentConnector + Send + Sync>,
    navigator: Arc<dyn Navigator + Send + Sync>,
    options: ResolverOptions,
    state: Arc<watch::Sender<TerminalState>>,
}

impl Checkout {
    /// Create checkout with default options and a logging navigator
    pub fn new(
        localstore: Arc<dyn IntentStore + Send + Sync>,
        client: Arc<dyn TournamentConnector + Send + Sync>,
    ) -> Self {
        let (state, _) = watch::channel(TerminalState::Resolving);

        Self {
            localstore,
            client,
            navigator: Arc::new(LogNavigator),
            options: ResolverOptions::default(),
            state: Arc::new(state),
        }
    }

    /// Resolver options
    pub fn options(&self) -> ResolverOptions {
        self.options
    }

    /// Watch resolver state transitions
    pub fn subscribe(&self) -> watch::Receiver<TerminalState> {
        self.state.subscribe()
    }

    pub(crate) fn publish(&self, state: TerminalState) {
        self.state.send_replace(state);
    }

    pub(crate) fn navigator(&self) -> &(dyn Navigator + Send + Sync) {
        self.navigator.as_ref()
    }

    /// Validate `form`, open a payment session for `entry_fee` and hand the
    /// payer off to the gateway.
    ///
    /// Nothing is persisted and no request is sent when the form is invalid.
    /// Nothing is persisted when the backend refuses the session.
    #[instrument(skip(self, form))]
    pub async fn initiate(
        &self,
        form: &TeamForm,
        tournament_id: &str,
        entry_fee: Amount,
    ) -> Result<PaymentHandoff, Error> {
        let confirmed = InitiateSaga::new(self.clone())
            .prepare(form, tournament_id, entry_fee)?
            .confirm()
            .await?;

        Ok(confirmed.handoff().clone())
    }

    /// Resolve a gateway redirect into a terminal state.
    ///
    /// Never fails: every error is reported as [`TerminalState::Failed`] or
    /// [`TerminalState::AmbiguousError`].
    #[instrument(skip_all, fields(transaction_id = ?params.transaction_id()))]
    pub async fn resolve(&self, params: &CallbackParams) -> TerminalState {
        self.publish(TerminalState::Resolving);

        let state = match ResolveSaga::new(self.clone(), params.clone())
            .identify()
            .await
        {
            Ok(identified) => identified.determine_outcome().await.settle().await,
            Err(ambiguity) => TerminalState::AmbiguousError(ambiguity),
        };

        tracing::info!("Callback resolved: {:?}", state);
        self.publish(state.clone());
        state
    }

    /// Stored pending registration, if any
    pub async fn pending_intent(&self) -> Result<Option<RegistrationIntent>, Error> {
        Ok(self.localstore.load_intent().await?)
    }

    /// Drop the pending registration and the current transaction id
    #[instrument(skip(self))]
    pub async fn discard_pending_intent(&self) -> Result<(), Error> {
        self.localstore.clear_intent().await?;
        self.localstore.clear_current_transaction().await?;
        Ok(())
    }

    /// Clear the intent and, when it still points at `transaction_id`, the
    /// current transaction key. Failures are logged; the next reconciliation
    /// run cleans up leftovers.
    pub(crate) async fn release_intent(&self, transaction_id: &str) {
        if let Err(e) = self.localstore.clear_intent().await {
            tracing::warn!(
                "Failed to clear pending registration for {}: {}",
                transaction_id,
                e
            );
        }

        match self.localstore.current_transaction().await {
            Ok(Some(current)) if current == transaction_id => {
                if let Err(e) = self.localstore.clear_current_transaction().await {
                    tracing::warn!("Failed to clear current transaction {}: {}", current, e);
                }
            }
            Ok(_) => {}
            Err(e) => tracing::warn!("Failed to read current transaction: {}", e),
        }
    }
}

/// Builder for [`Checkout`]
#[derive(Debug, Default)]
pub struct CheckoutBuilder {
    localstore: Option<Arc<dyn IntentStore + Send + Sync>>,
    client: Option<Arc<dyn TournamentConnector + Send + Sync>>,
    navigator: Option<Arc<dyn Navigator + Send + Sync>>,
    options: ResolverOptions,
}

impl CheckoutBuilder {
    /// New builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Intent store for the session
    pub fn localstore(mut self, localstore: Arc<dyn IntentStore + Send + Sync>) -> Self {
        self.localstore = Some(localstore);
        self
    }

    /// Tournament API connector
    pub fn client(mut self, client: Arc<dyn TournamentConnector + Send + Sync>) -> Self {
        self.client = Some(client);
        self
    }

    /// Gateway hand-off
    pub fn navigator(mut self, navigator: Arc<dyn Navigator + Send + Sync>) -> Self {
        self.navigator = Some(navigator);
        self
    }

    /// Resolver options
    pub fn options(mut self, options: ResolverOptions) -> Self {
        self.options = options;
        self
    }

    /// Build the checkout
    pub fn build(self) -> Result<Checkout, Error> {
        let localstore = self
            .localstore
            .ok_or_else(|| Error::Custom("Localstore is required".to_string()))?;
        let client = self
            .client
            .ok_or_else(|| Error::Custom("Client is required".to_string()))?;
        let mut checkout = Checkout::new(localstore, client);
        if let Some(navigator) = self.navigator {
            checkout.navigator = navigator;
        }
        checkout.options = self.options;

        Ok(checkout)
    }
}
