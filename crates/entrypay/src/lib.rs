//! Entrypay
//!
//! Payment-confirmed team registration for tournament entry fees.
//!
//! The workflow has two halves separated by a redirect to the payment gateway:
//!
//! 1. [`Checkout::initiate`] validates the team form, opens a payment session,
//!    persists a [`RegistrationIntent`] and hands the payer off to the gateway.
//! 2. [`Checkout::resolve`] runs when the gateway redirects back. It determines
//!    the payment outcome and, on success, consumes the intent to register the
//!    team at most once.

#![warn(missing_docs)]
#![warn(rustdoc::bare_urls)]

pub mod callback;
pub mod checkout;
pub mod client;
pub mod database;
pub mod error;
pub mod types;
pub mod util;

#[doc(hidden)]
#[macro_export]
macro_rules! ensure_entrypay {
    ($cond:expr, $err:expr) => {
        if !$cond {
            return Err($err);
        }
    };
}

pub use self::callback::CallbackParams;
pub use self::checkout::{
    Checkout, CheckoutBuilder, Navigator, RecoveryReport, ResolverOptions, UnknownStatusPolicy,
};
pub use self::client::TournamentConnector;
#[cfg(feature = "http")]
pub use self::client::HttpClient;
pub use self::database::{IntentStore, MemoryIntentStore};
pub use self::error::Error;
pub use self::types::{
    Amount, PaymentHandoff, PaymentOutcome, PaymentStatus, RegistrationIntent, TeamForm,
    TeamMember, TerminalState,
};
