//! Payment initiation
//!
//! Opens a gateway payment session for a validated team form and records the
//! registration intent before the payer leaves for the gateway.

pub mod saga;

pub use saga::InitiateSaga;
