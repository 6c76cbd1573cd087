//! Entrypay Types

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::util::unix_time;

/// Entry fee amount in whole rupees
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Amount(u64);

impl Amount {
    /// Amount zero
    pub const ZERO: Amount = Amount(0);
}

impl From<u64> for Amount {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl From<Amount> for u64 {
    fn from(value: Amount) -> Self {
        value.0
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Team member descriptor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamMember {
    /// Player identifier
    pub player: String,
}

impl TeamMember {
    /// Create member for player id
    pub fn new<S: Into<String>>(player: S) -> Self {
        Self {
            player: player.into(),
        }
    }
}

/// In-progress team registration form
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamForm {
    /// Team name
    pub name: String,
    /// Captain name
    pub captain_name: String,
    /// Captain email
    pub captain_email: String,
    /// Captain phone number, also used as the payer mobile number
    pub captain_phone: String,
    /// Team members in roster order
    #[serde(default)]
    pub members: Vec<TeamMember>,
}

impl TeamForm {
    /// Check every field the registration endpoint requires.
    ///
    /// Whitespace-only values are treated as empty.
    pub fn validate(&self, tournament_id: &str) -> Result<(), Error> {
        let required = [
            ("tournament", tournament_id),
            ("team name", self.name.as_str()),
            ("captain name", self.captain_name.as_str()),
            ("captain email", self.captain_email.as_str()),
            ("captain phone", self.captain_phone.as_str()),
        ];

        for (field, value) in required {
            crate::ensure_entrypay!(
                !value.trim().is_empty(),
                Error::Validation(format!("{field} is required"))
            );
        }

        for (index, member) in self.members.iter().enumerate() {
            crate::ensure_entrypay!(
                !member.player.trim().is_empty(),
                Error::Validation(format!("member {} has no player selected", index + 1))
            );
        }

        Ok(())
    }
}

/// Durable record of a team registration waiting on payment confirmation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationIntent {
    /// Target tournament
    pub tournament_id: String,
    /// Team name
    pub team_name: String,
    /// Captain name
    pub captain_name: String,
    /// Captain email
    pub captain_email: String,
    /// Captain phone
    pub captain_phone: String,
    /// Team members in roster order
    #[serde(default)]
    pub members: Vec<TeamMember>,
    /// Transaction id returned by the payment session
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_id: Option<String>,
    /// Entry fee charged
    #[serde(default)]
    pub amount: Amount,
    /// Unix time the intent was created
    #[serde(default)]
    pub created_at: u64,
}

impl RegistrationIntent {
    /// Build intent from a validated form
    pub fn new(form: &TeamForm, tournament_id: &str, amount: Amount) -> Self {
        Self {
            tournament_id: tournament_id.to_string(),
            team_name: form.name.clone(),
            captain_name: form.captain_name.clone(),
            captain_email: form.captain_email.clone(),
            captain_phone: form.captain_phone.clone(),
            members: form.members.clone(),
            transaction_id: None,
            amount,
            created_at: unix_time(),
        }
    }

    /// Set the transaction id the intent is correlated with
    pub fn with_transaction_id<S: Into<String>>(mut self, transaction_id: S) -> Self {
        self.transaction_id = Some(transaction_id.into());
        self
    }

    /// Whether the intent belongs to `transaction_id`
    pub fn matches(&self, transaction_id: &str) -> bool {
        self.transaction_id.as_deref() == Some(transaction_id)
    }
}

/// Payment status as resolved by the client
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PaymentStatus {
    /// Payment succeeded
    Success,
    /// Payment failed or was declined
    Failed,
    /// Payment still in progress at the provider
    Pending,
    /// Status could not be determined
    Unknown,
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PaymentStatus::Success => write!(f, "SUCCESS"),
            PaymentStatus::Failed => write!(f, "FAILED"),
            PaymentStatus::Pending => write!(f, "PENDING"),
            PaymentStatus::Unknown => write!(f, "UNKNOWN"),
        }
    }
}

/// Where a payment outcome came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutcomeSource {
    /// Status or code query parameter of the redirect
    Redirect,
    /// Backend payment status lookup
    StatusLookup,
    /// Status lookup failed
    Unavailable,
}

/// Resolved result of a payment attempt
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentOutcome {
    /// Transaction id
    pub transaction_id: String,
    /// Resolved status
    pub status: PaymentStatus,
    /// Provider specific fields, kept for display and audit
    pub raw: serde_json::Value,
    /// Path that produced this outcome
    pub source: OutcomeSource,
}

impl PaymentOutcome {
    /// Whether a team registration may follow this outcome
    pub fn permits_registration(&self) -> bool {
        matches!(self.status, PaymentStatus::Success | PaymentStatus::Unknown)
    }
}

/// Outcome of submitting a team for registration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamRegistrationResult {
    /// Whether the backend accepted the team
    pub accepted: bool,
    /// Identifier assigned by the backend
    pub team_id: Option<String>,
    /// Reason given when not accepted
    pub failure_reason: Option<String>,
}

impl TeamRegistrationResult {
    /// Accepted registration
    pub fn accepted<S: Into<String>>(team_id: S) -> Self {
        Self {
            accepted: true,
            team_id: Some(team_id.into()),
            failure_reason: None,
        }
    }

    /// Rejected registration
    pub fn rejected<S: Into<String>>(reason: S) -> Self {
        Self {
            accepted: false,
            team_id: None,
            failure_reason: Some(reason.into()),
        }
    }
}

/// Registered team as shown on the success screen
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamInfo {
    /// Backend team id
    pub team_id: Option<String>,
    /// Team name
    pub name: String,
    /// Captain name
    pub captain_name: String,
    /// Number of members
    pub member_count: usize,
}

/// Tournament display information
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TournamentInfo {
    /// Tournament id
    #[serde(rename = "_id")]
    pub id: String,
    /// Tournament name
    #[serde(default)]
    pub name: Option<String>,
    /// Game title
    #[serde(default)]
    pub game: Option<String>,
    /// Start date as sent by the backend
    #[serde(default, rename = "startDate")]
    pub start_date: Option<String>,
}

/// What happened to the team registration on a successful payment
#[derive(Debug, Clone, PartialEq)]
pub enum RegistrationSummary {
    /// Team was registered
    Registered {
        /// Team details
        team: TeamInfo,
        /// Tournament details, when they could be fetched
        tournament: Option<TournamentInfo>,
    },
    /// Payment resolved, registration not attempted (no matching intent)
    NotAttempted,
}

/// Details of a successful resolution
#[derive(Debug, Clone, PartialEq)]
pub struct SuccessDetails {
    /// Payment outcome
    pub outcome: PaymentOutcome,
    /// Registration summary
    pub registration: RegistrationSummary,
}

/// Why a payment is reported as failed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailureReason {
    /// Transaction id
    pub transaction_id: String,
    /// Status reported by the provider or backend
    pub provider_status: Option<String>,
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.provider_status {
            Some(status) => write!(f, "payment {} failed ({status})", self.transaction_id),
            None => write!(f, "payment {} failed", self.transaction_id),
        }
    }
}

/// Outcomes that cannot be cleanly reported as success or failure
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Ambiguity {
    /// Callback carried no usable transaction id
    MissingTransactionId,
    /// Status lookup failed and registration was deferred; the intent is preserved
    PaymentStatusUnknown {
        /// Transaction id
        transaction_id: String,
        /// Why the lookup failed
        reason: String,
    },
    /// Money moved but the team was not registered; the intent is preserved
    RegistrationAfterPayment {
        /// Transaction id
        transaction_id: String,
        /// Why registration failed
        reason: String,
    },
}

impl fmt::Display for Ambiguity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Ambiguity::MissingTransactionId => write!(f, "missing transaction id"),
            Ambiguity::PaymentStatusUnknown { .. } => write!(f, "payment status unknown"),
            Ambiguity::RegistrationAfterPayment { .. } => {
                write!(f, "payment succeeded, registration failed")
            }
        }
    }
}

impl From<&Ambiguity> for Error {
    fn from(value: &Ambiguity) -> Self {
        match value {
            Ambiguity::MissingTransactionId => Error::MissingTransactionId,
            Ambiguity::PaymentStatusUnknown {
                transaction_id,
                reason,
            } => Error::PaymentStatusUnknown {
                transaction_id: transaction_id.clone(),
                reason: reason.clone(),
            },
            Ambiguity::RegistrationAfterPayment {
                transaction_id,
                reason,
            } => Error::RegistrationAfterPayment {
                transaction_id: transaction_id.clone(),
                reason: reason.clone(),
            },
        }
    }
}

/// Resolver state as rendered by a screen
#[derive(Debug, Clone, PartialEq)]
pub enum TerminalState {
    /// Outcome not known yet
    Resolving,
    /// Payment confirmed, and the team registered when an intent existed
    Succeeded(SuccessDetails),
    /// Payment failed; the flow may be restarted from scratch
    Failed(FailureReason),
    /// Outcome needs support attention
    AmbiguousError(Ambiguity),
}

impl TerminalState {
    /// Whether no further automatic transition follows
    pub fn is_terminal(&self) -> bool {
        !matches!(self, TerminalState::Resolving)
    }

    /// Taxonomy error for non success states
    pub fn error(&self) -> Option<Error> {
        match self {
            TerminalState::Resolving | TerminalState::Succeeded(_) => None,
            TerminalState::Failed(reason) => {
                Some(Error::PaymentFailed(reason.transaction_id.clone()))
            }
            TerminalState::AmbiguousError(ambiguity) => Some(ambiguity.into()),
        }
    }
}

/// Result of a successful initiation: where the payer must go next
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentHandoff {
    /// Transaction id issued by the backend
    pub transaction_id: String,
    /// Gateway checkout page
    pub payment_url: String,
}
