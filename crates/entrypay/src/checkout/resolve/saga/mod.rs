//! Resolve Saga - Type State Pattern Implementation
//!
//! # Type State Flow
//!
//! ```text
//! ResolveSaga<Initial>
//!   └─> identify() -> ResolveSaga<Identified>      (or missing transaction id)
//!         └─> determine_outcome() -> ResolveSaga<Determined>
//!               └─> settle() -> TerminalState
//! ```
//!
//! # Single use intent
//!
//! The stored intent gates registration: it is cleared once the payment
//! failed or the team was registered, so a repeated callback for the same
//! transaction finds nothing to register. It is kept when registration after
//! a successful payment fails.

use tracing::instrument;

use self::state::{Determined, Identified, Initial};
use crate::callback::{lookup_status, redirect_status, CallbackParams};
use crate::checkout::{Checkout, UnknownStatusPolicy};
use crate::client::TeamRegistrationRequest;
use crate::types::{
    Ambiguity, FailureReason, OutcomeSource, PaymentOutcome, PaymentStatus, RegistrationIntent,
    RegistrationSummary, SuccessDetails, TeamInfo, TerminalState,
};

pub mod state;

/// Saga pattern implementation for callback resolution.
pub struct ResolveSaga<S> {
    checkout: Checkout,
    state_data: S,
}

impl ResolveSaga<Initial> {
    /// Create a new resolve saga for the redirect `params`.
    pub fn new(checkout: Checkout, params: CallbackParams) -> Self {
        Self {
            checkout,
            state_data: Initial { params },
        }
    }

    /// Find the transaction id and load the matching intent.
    ///
    /// Without a transaction id the callback cannot be resolved at all and no
    /// store or network access happens (unless the stored transaction fallback
    /// is enabled). An intent that is missing, unreadable, or belongs to
    /// another transaction is treated as absent and left in place.
    #[instrument(skip_all)]
    pub async fn identify(self) -> Result<ResolveSaga<Identified>, Ambiguity> {
        let params = self.state_data.params;
        let localstore = &self.checkout.localstore;

        let transaction_id = match params.transaction_id() {
            Some(id) => id.to_string(),
            None if self.checkout.options().use_stored_transaction => {
                match localstore.current_transaction().await {
                    Ok(Some(id)) if !id.is_empty() => {
                        tracing::info!("Redirect has no transaction id, using stored {}", id);
                        id
                    }
                    Ok(_) => return Err(Ambiguity::MissingTransactionId),
                    Err(e) => {
                        tracing::warn!("Could not read stored transaction id: {}", e);
                        return Err(Ambiguity::MissingTransactionId);
                    }
                }
            }
            None => {
                tracing::warn!("Redirect reached without a transaction id");
                return Err(Ambiguity::MissingTransactionId);
            }
        };

        let intent = match localstore.load_intent().await {
            Ok(Some(intent)) if intent.matches(&transaction_id) => Some(intent),
            Ok(Some(intent)) => {
                tracing::warn!(
                    "Pending registration belongs to transaction {:?}, not {}; leaving it untouched",
                    intent.transaction_id,
                    transaction_id
                );
                None
            }
            Ok(None) => None,
            Err(e) => {
                tracing::warn!("Could not load pending registration: {}", e);
                None
            }
        };

        if intent.is_none() {
            tracing::info!(
                "No pending registration for {}; registration will not be attempted",
                transaction_id
            );
        }

        Ok(ResolveSaga {
            checkout: self.checkout,
            state_data: Identified {
                params,
                transaction_id,
                intent,
            },
        })
    }
}

impl ResolveSaga<Identified> {
    /// Transaction the callback is about
    pub fn transaction_id(&self) -> &str {
        &self.state_data.transaction_id
    }

    /// Pending registration for this transaction
    pub fn intent(&self) -> Option<&RegistrationIntent> {
        self.state_data.intent.as_ref()
    }

    /// Determine the payment outcome.
    ///
    /// A `code` or `status` redirect parameter decides the outcome directly.
    /// Otherwise the backend status lookup is authoritative; if it fails the
    /// outcome is [`PaymentStatus::Unknown`].
    #[instrument(skip_all)]
    pub async fn determine_outcome(self) -> ResolveSaga<Determined> {
        let Identified {
            params,
            transaction_id,
            intent,
        } = self.state_data;

        let (outcome, provider_status) = match params.outcome_code() {
            Some(code) => {
                tracing::debug!("Outcome from redirect code {}", code);
                let outcome = PaymentOutcome {
                    transaction_id: transaction_id.clone(),
                    status: redirect_status(code),
                    raw: params.to_json(),
                    source: OutcomeSource::Redirect,
                };
                (outcome, Some(code.to_string()))
            }
            None => match self.checkout.client.get_payment_status(&transaction_id).await {
                Ok(response) => {
                    tracing::debug!("Outcome from status lookup {}", response.status);
                    let outcome = PaymentOutcome {
                        transaction_id: transaction_id.clone(),
                        status: lookup_status(&response.status),
                        raw: response.raw,
                        source: OutcomeSource::StatusLookup,
                    };
                    (outcome, Some(response.status))
                }
                Err(e) => {
                    tracing::warn!("Payment status lookup for {} failed: {}", transaction_id, e);
                    let outcome = PaymentOutcome {
                        transaction_id: transaction_id.clone(),
                        status: PaymentStatus::Unknown,
                        raw: serde_json::json!({ "error": e.to_string() }),
                        source: OutcomeSource::Unavailable,
                    };
                    (outcome, None)
                }
            },
        };

        ResolveSaga {
            checkout: self.checkout,
            state_data: Determined {
                transaction_id,
                intent,
                outcome,
                provider_status,
            },
        }
    }
}

impl ResolveSaga<Determined> {
    /// Resolved payment outcome
    pub fn outcome(&self) -> &PaymentOutcome {
        &self.state_data.outcome
    }

    /// Act on the outcome and produce the terminal state.
    #[instrument(skip_all)]
    pub async fn settle(self) -> TerminalState {
        let Determined {
            transaction_id,
            intent,
            outcome,
            provider_status,
        } = self.state_data;

        if outcome.status == PaymentStatus::Unknown
            && intent.is_some()
            && self.checkout.options().unknown_status_policy == UnknownStatusPolicy::Defer
        {
            tracing::warn!(
                "Payment status of {} unknown; deferring registration",
                transaction_id
            );
            return TerminalState::AmbiguousError(Ambiguity::PaymentStatusUnknown {
                reason: outcome
                    .raw
                    .get("error")
                    .and_then(|e| e.as_str())
                    .unwrap_or("status lookup failed")
                    .to_string(),
                transaction_id,
            });
        }

        if !outcome.permits_registration() {
            tracing::info!("Payment {} failed", transaction_id);
            if intent.is_some() {
                self.checkout.release_intent(&transaction_id).await;
            }
            return TerminalState::Failed(FailureReason {
                transaction_id,
                provider_status,
            });
        }

        if outcome.status == PaymentStatus::Unknown {
            tracing::warn!(
                "Payment status of {} unknown; assuming success since the payer reached the callback",
                transaction_id
            );
        }

        let intent = match intent {
            Some(intent) => intent,
            None => {
                return TerminalState::Succeeded(SuccessDetails {
                    outcome,
                    registration: RegistrationSummary::NotAttempted,
                })
            }
        };

        let request = TeamRegistrationRequest::for_paid_intent(&intent, &transaction_id);
        let failure = match self.checkout.client.post_register_team(request).await {
            Ok(result) if result.accepted => {
                tracing::info!(
                    "Team {} registered for tournament {} (team id {:?})",
                    intent.team_name,
                    intent.tournament_id,
                    result.team_id
                );
                self.checkout.release_intent(&transaction_id).await;

                let tournament = match self.checkout.client.get_tournament(&intent.tournament_id).await {
                    Ok(tournament) => Some(tournament),
                    Err(e) => {
                        tracing::warn!(
                            "Could not fetch tournament {}: {}",
                            intent.tournament_id,
                            e
                        );
                        None
                    }
                };

                return TerminalState::Succeeded(SuccessDetails {
                    outcome,
                    registration: RegistrationSummary::Registered {
                        team: TeamInfo {
                            team_id: result.team_id,
                            name: intent.team_name,
                            captain_name: intent.captain_name,
                            member_count: intent.members.len(),
                        },
                        tournament,
                    },
                });
            }
            Ok(result) => result
                .failure_reason
                .unwrap_or_else(|| "registration was not accepted".to_string()),
            Err(e) => e.to_string(),
        };

        tracing::error!(
            "Payment {} succeeded but registering team {} failed: {}. Pending registration kept",
            transaction_id,
            intent.team_name,
            failure
        );

        TerminalState::AmbiguousError(Ambiguity::RegistrationAfterPayment {
            transaction_id,
            reason: failure,
        })
    }
}
