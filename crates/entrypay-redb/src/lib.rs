//! Redb storage backend for entrypay

#![warn(missing_docs)]
#![warn(rustdoc::bare_urls)]

pub mod error;
mod store;

pub use store::IntentRedbStore;
