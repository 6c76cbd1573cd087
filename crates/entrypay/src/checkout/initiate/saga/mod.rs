//! Initiate Saga - Type State Pattern Implementation
//!
//! # Type State Flow
//!
//! ```text
//! InitiateSaga<Initial>
//!   └─> prepare() -> InitiateSaga<Prepared>
//!         └─> confirm() -> InitiateSaga<Confirmed>
//! ```
//!
//! # Persistence
//!
//! - `prepare()` touches neither the store nor the network
//! - `confirm()` writes the intent and the current transaction key only after
//!   the backend returned a payment session, then hands off to the gateway

use tracing::instrument;

use self::state::{Confirmed, Initial, Prepared};
use crate::checkout::Checkout;
use crate::client::PaymentInitiateRequest;
use crate::types::{Amount, PaymentHandoff, RegistrationIntent, TeamForm};
use crate::Error;

pub mod state;

/// Saga pattern implementation for payment initiation.
pub struct InitiateSaga<S> {
    checkout: Checkout,
    state_data: S,
}

impl InitiateSaga<Initial> {
    /// Create a new initiate saga in the Initial state.
    pub fn new(checkout: Checkout) -> Self {
        Self {
            checkout,
            state_data: Initial {
                operation_id: uuid::Uuid::new_v4(),
            },
        }
    }

    /// Validate the form and build the payment session request.
    ///
    /// Fails with [`Error::Validation`] on any missing field. No side effects.
    #[instrument(skip_all)]
    pub fn prepare(
        self,
        form: &TeamForm,
        tournament_id: &str,
        entry_fee: Amount,
    ) -> Result<InitiateSaga<Prepared>, Error> {
        tracing::debug!(
            "Preparing payment for team {} with operation {}",
            form.name,
            self.state_data.operation_id
        );

        form.validate(tournament_id)?;

        let request = PaymentInitiateRequest {
            name: form.captain_name.trim().to_string(),
            mobile_number: form.captain_phone.trim().to_string(),
            amount: entry_fee,
            description: Some(format!("Tournament registration fee for {}", form.name.trim())),
        };

        Ok(InitiateSaga {
            checkout: self.checkout,
            state_data: Prepared {
                operation_id: self.state_data.operation_id,
                intent: RegistrationIntent::new(form, tournament_id, entry_fee),
                request,
            },
        })
    }
}

impl InitiateSaga<Prepared> {
    /// Intent that will be persisted
    pub fn intent(&self) -> &RegistrationIntent {
        &self.state_data.intent
    }

    /// Amount that will be charged
    pub fn amount(&self) -> Amount {
        self.state_data.request.amount
    }

    /// Open the payment session, persist the intent and hand off.
    ///
    /// A backend failure maps to [`Error::PaymentInitiation`] and leaves the
    /// store untouched.
    ///
    /// # Rollback
    ///
    /// If the current transaction key cannot be written after the intent was
    /// saved, the intent that was pending before is put back, or the new one
    /// cleared when there was none.
    #[instrument(skip_all)]
    pub async fn confirm(self) -> Result<InitiateSaga<Confirmed>, Error> {
        let operation_id = self.state_data.operation_id;
        tracing::info!("Requesting payment session for operation {}", operation_id);

        let session = self
            .checkout
            .client
            .post_payment_initiate(self.state_data.request.clone())
            .await
            .map_err(|e| {
                tracing::error!("Payment session request failed: {}", e);
                Error::PaymentInitiation(e.to_string())
            })?;

        if session.transaction_id.is_empty() || session.payment_url.is_empty() {
            return Err(Error::PaymentInitiation(
                "payment session is missing transaction id or payment url".to_string(),
            ));
        }

        let localstore = self.checkout.localstore.clone();

        let previous = localstore.load_intent().await.ok().flatten();
        if let Some(previous) = &previous {
            tracing::warn!(
                "Replacing pending registration for transaction {:?}",
                previous.transaction_id
            );
        }

        let intent = self
            .state_data
            .intent
            .with_transaction_id(session.transaction_id.clone());
        localstore.save_intent(intent).await?;

        if let Err(e) = localstore
            .set_current_transaction(&session.transaction_id)
            .await
        {
            tracing::error!(
                "Could not record transaction {}: {}",
                session.transaction_id,
                e
            );

            let rollback = match previous {
                Some(previous) => localstore.save_intent(previous).await,
                None => localstore.clear_intent().await,
            };
            if let Err(rollback_err) = rollback {
                tracing::error!(
                    "Could not roll back pending registration for transaction {}: {}",
                    session.transaction_id,
                    rollback_err
                );
            }

            return Err(e.into());
        }

        tracing::info!(
            "Handing off transaction {} to the payment gateway",
            session.transaction_id
        );
        self.checkout.navigator().navigate(&session.payment_url);

        Ok(InitiateSaga {
            checkout: self.checkout,
            state_data: Confirmed {
                operation_id,
                handoff: PaymentHandoff {
                    transaction_id: session.transaction_id,
                    payment_url: session.payment_url,
                },
            },
        })
    }
}

impl InitiateSaga<Confirmed> {
    /// Get the operation ID
    pub fn operation_id(&self) -> uuid::Uuid {
        self.state_data.operation_id
    }

    /// Where the payer was sent
    pub fn handoff(&self) -> &PaymentHandoff {
        &self.state_data.handoff
    }
}

impl std::fmt::Debug for InitiateSaga<Prepared> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InitiateSaga<Prepared>")
            .field("operation_id", &self.state_data.operation_id)
            .field("tournament_id", &self.state_data.intent.tournament_id)
            .field("team_name", &self.state_data.intent.team_name)
            .field("amount", &self.state_data.request.amount)
            .finish()
    }
}
