//! Shared fixtures for checkout tests

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::json;

use super::{Checkout, CheckoutBuilder, Navigator, ResolverOptions};
use crate::client::{
    PaymentInitiateRequest, PaymentSession, PaymentStatusResponse, TeamRegistrationRequest,
    TournamentConnector,
};
use crate::database::{self, IntentStore, MemoryIntentStore};
use crate::types::{
    Amount, RegistrationIntent, TeamForm, TeamMember, TeamRegistrationResult, TournamentInfo,
};
use crate::Error;

/// Scripted [`TournamentConnector`] counting every call
#[derive(Debug)]
pub(crate) struct MockConnector {
    pub initiate_response: Mutex<Result<PaymentSession, String>>,
    pub status_response: Mutex<Result<PaymentStatusResponse, String>>,
    pub register_response: Mutex<Result<TeamRegistrationResult, String>>,
    pub tournament_response: Mutex<Result<TournamentInfo, String>>,
    pub initiate_calls: AtomicUsize,
    pub status_calls: AtomicUsize,
    pub register_calls: AtomicUsize,
    pub last_registration: Mutex<Option<TeamRegistrationRequest>>,
}

impl MockConnector {
    pub fn new() -> Self {
        Self {
            initiate_response: Mutex::new(Ok(PaymentSession {
                transaction_id: "tx1".to_string(),
                payment_url: "https://gateway.example/pay/tx1".to_string(),
            })),
            status_response: Mutex::new(Ok(status("SUCCESS"))),
            register_response: Mutex::new(Ok(TeamRegistrationResult::accepted("team-1"))),
            tournament_response: Mutex::new(Ok(TournamentInfo {
                id: "t1".to_string(),
                name: Some("Monsoon Cup".to_string()),
                game: Some("Valorant".to_string()),
                start_date: None,
            })),
            initiate_calls: AtomicUsize::new(0),
            status_calls: AtomicUsize::new(0),
            register_calls: AtomicUsize::new(0),
            last_registration: Mutex::new(None),
        }
    }

    pub fn set_initiate_response(&self, response: Result<PaymentSession, String>) {
        *self.initiate_response.lock().unwrap() = response;
    }

    pub fn set_status_response(&self, response: Result<PaymentStatusResponse, String>) {
        *self.status_response.lock().unwrap() = response;
    }

    pub fn set_register_response(&self, response: Result<TeamRegistrationResult, String>) {
        *self.register_response.lock().unwrap() = response;
    }

    pub fn set_tournament_response(&self, response: Result<TournamentInfo, String>) {
        *self.tournament_response.lock().unwrap() = response;
    }

    pub fn initiate_calls(&self) -> usize {
        self.initiate_calls.load(Ordering::SeqCst)
    }

    pub fn status_calls(&self) -> usize {
        self.status_calls.load(Ordering::SeqCst)
    }

    pub fn register_calls(&self) -> usize {
        self.register_calls.load(Ordering::SeqCst)
    }

    fn respond<T: Clone>(response: &Mutex<Result<T, String>>) -> Result<T, Error> {
        response.lock().unwrap().clone().map_err(Error::Custom)
    }
}

#[async_trait]
impl TournamentConnector for MockConnector {
    async fn post_payment_initiate(
        &self,
        _request: PaymentInitiateRequest,
    ) -> Result<PaymentSession, Error> {
        self.initiate_calls.fetch_add(1, Ordering::SeqCst);
        Self::respond(&self.initiate_response)
    }

    async fn get_payment_status(
        &self,
        _transaction_id: &str,
    ) -> Result<PaymentStatusResponse, Error> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);
        Self::respond(&self.status_response)
    }

    async fn post_register_team(
        &self,
        request: TeamRegistrationRequest,
    ) -> Result<TeamRegistrationResult, Error> {
        self.register_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_registration.lock().unwrap() = Some(request);
        Self::respond(&self.register_response)
    }

    async fn get_tournament(&self, _tournament_id: &str) -> Result<TournamentInfo, Error> {
        Self::respond(&self.tournament_response)
    }
}

/// Navigator remembering every url it was sent to
#[derive(Debug, Default)]
pub(crate) struct RecordingNavigator {
    pub urls: Mutex<Vec<String>>,
}

impl Navigator for RecordingNavigator {
    fn navigate(&self, url: &str) {
        self.urls.lock().unwrap().push(url.to_string());
    }
}

/// Memory store whose current transaction key cannot be written
#[derive(Debug, Default)]
pub(crate) struct BrokenTransactionStore {
    pub inner: MemoryIntentStore,
}

#[async_trait]
impl IntentStore for BrokenTransactionStore {
    async fn save_intent(&self, intent: RegistrationIntent) -> Result<(), database::Error> {
        self.inner.save_intent(intent).await
    }

    async fn load_intent(&self) -> Result<Option<RegistrationIntent>, database::Error> {
        self.inner.load_intent().await
    }

    async fn clear_intent(&self) -> Result<(), database::Error> {
        self.inner.clear_intent().await
    }

    async fn set_current_transaction(&self, _transaction_id: &str) -> Result<(), database::Error> {
        Err(database::Error::Database("disk full".into()))
    }

    async fn current_transaction(&self) -> Result<Option<String>, database::Error> {
        self.inner.current_transaction().await
    }

    async fn clear_current_transaction(&self) -> Result<(), database::Error> {
        self.inner.clear_current_transaction().await
    }
}

pub(crate) fn status(value: &str) -> PaymentStatusResponse {
    PaymentStatusResponse {
        status: value.to_string(),
        raw: json!({ "status": value, "amount": 200 }),
    }
}

pub(crate) fn test_form() -> TeamForm {
    TeamForm {
        name: "Night Owls".to_string(),
        captain_name: "Asha".to_string(),
        captain_email: "asha@example.com".to_string(),
        captain_phone: "9999999999".to_string(),
        members: vec![TeamMember::new("p1"), TeamMember::new("p2")],
    }
}

pub(crate) fn test_intent(transaction_id: &str) -> RegistrationIntent {
    RegistrationIntent::new(&test_form(), "t1", Amount::from(200)).with_transaction_id(transaction_id)
}

pub(crate) struct Fixture {
    pub checkout: Checkout,
    pub store: MemoryIntentStore,
    pub client: Arc<MockConnector>,
    pub navigator: Arc<RecordingNavigator>,
}

pub(crate) fn fixture() -> Fixture {
    fixture_with(ResolverOptions::default())
}

pub(crate) fn fixture_with(options: ResolverOptions) -> Fixture {
    let store = MemoryIntentStore::new();
    let client = Arc::new(MockConnector::new());
    let navigator = Arc::new(RecordingNavigator::default());

    let checkout = CheckoutBuilder::new()
        .localstore(Arc::new(store.clone()))
        .client(client.clone())
        .navigator(navigator.clone())
        .options(options)
        .build()
        .unwrap();

    Fixture {
        checkout,
        store,
        client,
        navigator,
    }
}
