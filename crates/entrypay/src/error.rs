//! Errors

use thiserror::Error;

use crate::database;

/// Entrypay Error
#[derive(Debug, Error)]
pub enum Error {
    /// Team form is incomplete or malformed
    #[error("Invalid team form: {0}")]
    Validation(String),
    /// Backend rejected or could not be reached when creating the payment session
    #[error("Payment initiation failed: {0}")]
    PaymentInitiation(String),
    /// Status lookup after the redirect failed
    #[error("Payment status unknown for `{transaction_id}`: {reason}")]
    PaymentStatusUnknown {
        /// Transaction id
        transaction_id: String,
        /// Why the lookup failed
        reason: String,
    },
    /// Payment confirmed but team registration did not complete
    #[error("Payment `{transaction_id}` succeeded but team registration failed: {reason}")]
    RegistrationAfterPayment {
        /// Transaction id
        transaction_id: String,
        /// Why registration failed
        reason: String,
    },
    /// Provider reported the payment as failed
    #[error("Payment `{0}` failed")]
    PaymentFailed(String),
    /// Callback reached without a usable transaction id
    #[error("Missing transaction id")]
    MissingTransactionId,
    /// Backend answered with a non success status code
    #[error("Backend responded with HTTP {status}: {message}")]
    HttpStatus {
        /// HTTP status code
        status: u16,
        /// Response body or message
        message: String,
    },
    /// Backend answered `success: false`
    #[error("Backend rejected request: {0}")]
    Rejected(String),
    /// Response did not have the expected shape
    #[error("Unexpected response: {0}")]
    UnexpectedResponse(String),
    /// Intent store error
    #[error(transparent)]
    Database(#[from] database::Error),
    /// Http transport error
    #[cfg(feature = "http")]
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    /// Serde Json error
    #[error(transparent)]
    SerdeJson(#[from] serde_json::Error),
    /// Url parse error
    #[error(transparent)]
    Url(#[from] url::ParseError),
    /// Custom error
    #[error("`{0}`")]
    Custom(String),
}
