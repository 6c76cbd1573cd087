//! Tournament backend connector

use std::fmt::Debug;

use async_trait::async_trait;

use crate::types::{TeamRegistrationResult, TournamentInfo};
use crate::Error;

pub mod dto;
#[cfg(feature = "http")]
mod http;

pub use dto::{
    PaymentInitiateRequest, PaymentSession, PaymentStatusResponse, TeamRegistrationRequest,
};
#[cfg(feature = "http")]
pub use http::{HttpClient, DEFAULT_PROVIDER};

/// Interface to the tournament REST API
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
pub trait TournamentConnector: Debug {
    /// Create a gateway payment session
    /// [`POST /payments/{provider}/initiate`]
    async fn post_payment_initiate(
        &self,
        request: PaymentInitiateRequest,
    ) -> Result<PaymentSession, Error>;

    /// Look up the payment status of a transaction
    /// [`GET /payments/status/{transactionId}`]
    async fn get_payment_status(&self, transaction_id: &str)
        -> Result<PaymentStatusResponse, Error>;

    /// Register a team for a tournament.
    ///
    /// A backend rejection is an `Ok` result with `accepted == false`; `Err`
    /// is reserved for failures where the backend answer is not known.
    /// [`POST /tournaments/register-team/organizer`]
    async fn post_register_team(
        &self,
        request: TeamRegistrationRequest,
    ) -> Result<TeamRegistrationResult, Error>;

    /// Tournament display information
    /// [`GET /tournaments/{tournamentId}`]
    async fn get_tournament(&self, tournament_id: &str) -> Result<TournamentInfo, Error>;
}
