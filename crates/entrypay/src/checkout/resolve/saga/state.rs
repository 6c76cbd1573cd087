//! State types for the Resolve saga.

use crate::callback::CallbackParams;
use crate::types::{PaymentOutcome, RegistrationIntent};

/// Initial state - redirect parameters received.
///
/// Only `identify()` is available.
pub struct Initial {
    /// Redirect query parameters
    pub params: CallbackParams,
}

/// Identified state - transaction id known, intent loaded when it matches.
pub struct Identified {
    /// Redirect query parameters
    pub params: CallbackParams,
    /// Transaction the callback is about
    pub transaction_id: String,
    /// Pending registration for this transaction
    pub intent: Option<RegistrationIntent>,
}

/// Determined state - payment outcome known.
pub struct Determined {
    /// Transaction the callback is about
    pub transaction_id: String,
    /// Pending registration for this transaction
    pub intent: Option<RegistrationIntent>,
    /// Resolved payment outcome
    pub outcome: PaymentOutcome,
    /// Status string as reported by the redirect or the backend
    pub provider_status: Option<String>,
}
