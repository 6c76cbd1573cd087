//! Pending registration recovery.
//!
//! A pending registration survives when the payer never came back from the
//! gateway, or when registering the team failed after the payment succeeded.
//! Recovery replays it against the authoritative payment status.
//!
//! # Usage
//!
//! ```rust,ignore
//! let report = checkout.recover_pending_registration().await?;
//! if report.recovered > 0 {
//!     tracing::info!("Registered {} team(s) from a previous session", report.recovered);
//! }
//! ```
//!
//! # Recovery Strategy
//!
//! - **No transaction id**: The payment session was never opened. Compensate by
//!   clearing the intent.
//! - **Settled successfully**: Register the team and clear the intent.
//! - **Pending** or **status unavailable**: Skip, retry on the next run.
//! - **Any other status**: The payment failed. Compensate by clearing the intent.

use tracing::instrument;

use crate::callback::settlement_status;
use crate::checkout::Checkout;
use crate::client::TeamRegistrationRequest;
use crate::types::{PaymentStatus, RegistrationIntent};
use crate::Error;

/// Report of recovery operations performed
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RecoveryReport {
    /// Number of registrations completed
    pub recovered: usize,
    /// Number of intents dropped because the payment did not go through
    pub compensated: usize,
    /// Number of intents left for a later run
    pub skipped: usize,
    /// Number of intents that could not be recovered
    pub failed: usize,
}

impl Checkout {
    /// Replay a stored pending registration.
    ///
    /// Unlike [`Checkout::resolve`] this never registers on an unknown
    /// payment status.
    #[instrument(skip(self))]
    pub async fn recover_pending_registration(&self) -> Result<RecoveryReport, Error> {
        let mut report = RecoveryReport::default();

        let intent = match self.localstore.load_intent().await? {
            Some(intent) => intent,
            None => {
                self.cleanup_orphaned_transaction().await?;
                tracing::debug!("No pending registration to recover");
                return Ok(report);
            }
        };

        tracing::info!(
            "Recovering pending registration of team {} (transaction: {:?})",
            intent.team_name,
            intent.transaction_id
        );

        match self.recover_intent(&intent).await {
            Ok(RecoveryAction::Recovered) => {
                tracing::info!("Pending registration of {} recovered", intent.team_name);
                report.recovered += 1;
            }
            Ok(RecoveryAction::Compensated) => {
                tracing::info!("Pending registration of {} dropped", intent.team_name);
                report.compensated += 1;
            }
            Ok(RecoveryAction::Skipped) => {
                tracing::info!("Pending registration of {} skipped", intent.team_name);
                report.skipped += 1;
            }
            Err(e) => {
                tracing::error!(
                    "Failed to recover pending registration of {}: {}",
                    intent.team_name,
                    e
                );
                report.failed += 1;
            }
        }

        tracing::info!(
            "Recovery complete: {} recovered, {} compensated, {} skipped, {} failed",
            report.recovered,
            report.compensated,
            report.skipped,
            report.failed
        );

        Ok(report)
    }

    async fn recover_intent(&self, intent: &RegistrationIntent) -> Result<RecoveryAction, Error> {
        let transaction_id = match intent.transaction_id.as_deref() {
            Some(id) if !id.is_empty() => id,
            _ => {
                tracing::warn!("Pending registration has no transaction id, clearing it");
                self.localstore.clear_intent().await?;
                return Ok(RecoveryAction::Compensated);
            }
        };

        let response = match self.client.get_payment_status(transaction_id).await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(
                    "Can't check payment {} ({}), skipping",
                    transaction_id,
                    e
                );
                return Ok(RecoveryAction::Skipped);
            }
        };

        match settlement_status(&response.status) {
            PaymentStatus::Success => {
                let request = TeamRegistrationRequest::for_paid_intent(intent, transaction_id);
                let result = self.client.post_register_team(request).await?;
                if !result.accepted {
                    return Err(Error::Rejected(result.failure_reason.unwrap_or_else(|| {
                        "registration was not accepted".to_string()
                    })));
                }

                tracing::info!(
                    "Team {} registered for tournament {} (team id {:?})",
                    intent.team_name,
                    intent.tournament_id,
                    result.team_id
                );
                self.release_intent(transaction_id).await;
                Ok(RecoveryAction::Recovered)
            }
            PaymentStatus::Pending => {
                tracing::info!("Payment {} still pending", transaction_id);
                Ok(RecoveryAction::Skipped)
            }
            PaymentStatus::Failed | PaymentStatus::Unknown => {
                tracing::info!(
                    "Payment {} reported {}, clearing pending registration",
                    transaction_id,
                    response.status
                );
                self.localstore.clear_intent().await?;
                self.localstore.clear_current_transaction().await?;
                Ok(RecoveryAction::Compensated)
            }
        }
    }

    /// Clear a current transaction key left without a pending registration.
    async fn cleanup_orphaned_transaction(&self) -> Result<(), Error> {
        if let Some(transaction_id) = self.localstore.current_transaction().await? {
            tracing::warn!(
                "Found orphaned current transaction {} without a pending registration. Clearing.",
                transaction_id
            );
            if let Err(e) = self.localstore.clear_current_transaction().await {
                tracing::error!(
                    "Failed to clear orphaned transaction {}: {}",
                    transaction_id,
                    e
                );
            }
        }

        Ok(())
    }
}

/// Internal enum for recovery actions
enum RecoveryAction {
    /// The team was registered
    Recovered,
    /// The intent was cleared
    Compensated,
    /// The intent was left for later (e.g., backend unreachable)
    Skipped,
}
