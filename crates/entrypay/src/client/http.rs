//! HTTP connector

use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::Form;
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::instrument;
use url::Url;

use super::dto::{ApiResponse, RegisteredTeam};
use super::{
    PaymentInitiateRequest, PaymentSession, PaymentStatusResponse, TeamRegistrationRequest,
    TournamentConnector,
};
use crate::types::{TeamRegistrationResult, TournamentInfo};
use crate::Error;

/// Default payment provider path segment
pub const DEFAULT_PROVIDER: &str = "phonepe";

/// Tournament API client over HTTP
#[derive(Debug, Clone)]
pub struct HttpClient {
    inner: Client,
    base_url: Url,
    provider: String,
    auth_token: Option<String>,
}

impl HttpClient {
    /// Create client for the API at `base_url`
    pub fn new(base_url: Url) -> Self {
        Self::with_client(base_url, Client::new())
    }

    /// Create client using a preconfigured reqwest client
    pub fn with_client(base_url: Url, inner: Client) -> Self {
        Self {
            inner,
            base_url,
            provider: DEFAULT_PROVIDER.to_string(),
            auth_token: None,
        }
    }

    /// Create client whose requests time out after `timeout`
    pub fn with_timeout(base_url: Url, timeout: Duration) -> Result<Self, Error> {
        let inner = Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(base_url, inner))
    }

    /// Payment provider path segment
    pub fn provider<S: Into<String>>(mut self, provider: S) -> Self {
        self.provider = provider.into();
        self
    }

    /// Bearer token sent with every request
    pub fn auth_token<S: Into<String>>(mut self, token: S) -> Self {
        self.auth_token = Some(token.into());
        self
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, Error> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| Error::Custom(format!("Invalid base url: {}", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.auth_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn handle_response<T: DeserializeOwned>(response: Response) -> Result<T, Error> {
        let status = response.status();
        if !status.is_success() {
            return Err(Error::HttpStatus {
                status: status.as_u16(),
                message: response.text().await.unwrap_or_default(),
            });
        }

        let body: ApiResponse<T> = response.json().await?;
        body.into_data()
    }
}

#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
impl TournamentConnector for HttpClient {
    #[instrument(skip_all, fields(provider = %self.provider))]
    async fn post_payment_initiate(
        &self,
        request: PaymentInitiateRequest,
    ) -> Result<PaymentSession, Error> {
        let url = self.endpoint(&["payments", &self.provider, "initiate"])?;
        let response = self
            .authorize(self.inner.post(url))
            .json(&request)
            .send()
            .await?;

        Self::handle_response(response).await
    }

    #[instrument(skip(self))]
    async fn get_payment_status(
        &self,
        transaction_id: &str,
    ) -> Result<PaymentStatusResponse, Error> {
        let url = self.endpoint(&["payments", "status", transaction_id])?;
        let response = self.authorize(self.inner.get(url)).send().await?;

        let status = response.status();
        let body = response.text().await?;

        match serde_json::from_str::<ApiResponse<Value>>(&body) {
            Ok(envelope) if status.is_success() => PaymentStatusResponse::from_envelope(envelope),
            Ok(envelope)
                if envelope
                    .data
                    .as_ref()
                    .and_then(|data| data.get("status"))
                    .is_some_and(Value::is_string) =>
            {
                PaymentStatusResponse::from_envelope(envelope)
            }
            Ok(_) => Err(Error::HttpStatus {
                status: status.as_u16(),
                message: body,
            }),
            Err(_) if !status.is_success() => Err(Error::HttpStatus {
                status: status.as_u16(),
                message: body,
            }),
            Err(e) => Err(e.into()),
        }
    }

    #[instrument(skip_all, fields(tournament_id = %request.tournament_id))]
    async fn post_register_team(
        &self,
        request: TeamRegistrationRequest,
    ) -> Result<TeamRegistrationResult, Error> {
        let url = self.endpoint(&["tournaments", "register-team", "organizer"])?;
        let form = request
            .form_fields()?
            .into_iter()
            .fold(Form::new(), |form, (name, value)| form.text(name, value));

        let response = self
            .authorize(self.inner.post(url))
            .multipart(form)
            .send()
            .await?;

        match Self::handle_response::<RegisteredTeam>(response).await {
            Ok(team) => Ok(TeamRegistrationResult::accepted(team.id)),
            Err(Error::Rejected(message)) => Ok(TeamRegistrationResult::rejected(message)),
            Err(Error::HttpStatus { status, message }) if (400..500).contains(&status) => {
                Ok(TeamRegistrationResult::rejected(format!(
                    "HTTP {status}: {message}"
                )))
            }
            Err(e) => Err(e),
        }
    }

    #[instrument(skip(self))]
    async fn get_tournament(&self, tournament_id: &str) -> Result<TournamentInfo, Error> {
        let url = self.endpoint(&["tournaments", tournament_id])?;
        let response = self.authorize(self.inner.get(url)).send().await?;

        Self::handle_response(response).await
    }
}
