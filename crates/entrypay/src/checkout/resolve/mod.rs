//! Callback resolution
//!
//! Runs when the gateway redirects the payer back. Determines the payment
//! outcome and consumes the stored intent to register the team at most once.

pub mod saga;

pub use saga::ResolveSaga;
