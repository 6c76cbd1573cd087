//! State types for the Initiate saga.
//!
//! Each state is a distinct type that holds the data relevant to that stage
//! of the initiation. The type state pattern ensures that only valid
//! operations are available at each stage.

use uuid::Uuid;

use crate::client::PaymentInitiateRequest;
use crate::types::{PaymentHandoff, RegistrationIntent};

/// Initial state - operation ID assigned but no work done yet.
///
/// Only `prepare()` is available.
pub struct Initial {
    /// Unique operation identifier for log correlation
    pub operation_id: Uuid,
}

/// Prepared state - the form passed validation.
///
/// Methods available: `confirm()`
pub struct Prepared {
    /// Unique operation identifier
    pub operation_id: Uuid,
    /// Intent to persist once the session exists; no transaction id yet
    pub intent: RegistrationIntent,
    /// Payment session request
    pub request: PaymentInitiateRequest,
}

/// Confirmed state - session created, intent persisted, payer handed off.
pub struct Confirmed {
    /// Unique operation identifier
    pub operation_id: Uuid,
    /// Where the payer was sent
    pub handoff: PaymentHandoff,
}
