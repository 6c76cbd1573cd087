//! Checkout Flow Integration Tests
//!
//! Full initiate, pay, redirect cycles against the scripted backend:
//! - Registration happens once and only after payment
//! - Ambiguous outcomes keep the pending registration
//! - The pending registration survives a restart on the redb store
//! - Recovery replays a kept registration

use std::sync::Arc;

use anyhow::Result;
use entrypay::types::{Ambiguity, OutcomeSource, RegistrationSummary};
use entrypay::{
    Amount, CallbackParams, Error, IntentStore, MemoryIntentStore, PaymentStatus, ResolverOptions,
    TerminalState, UnknownStatusPolicy,
};
use entrypay_integration_tests::init_pure_tests::*;
use entrypay_redb::IntentRedbStore;

const TOURNAMENT: &str = "tournament-42";

fn fee() -> Amount {
    Amount::from(500)
}

// =============================================================================
// Happy path
// =============================================================================

/// Tests a paid session registers the team exactly once, with the payment reference
#[tokio::test]
async fn test_paid_registration_end_to_end() -> Result<()> {
    setup_tracing();
    let backend = ScriptedBackend::new();
    let store = IntentRedbStore::in_memory("tab-1")?;
    let checkout =
        create_test_checkout(backend.clone(), Arc::new(store.clone()), Default::default())?;

    let handoff = checkout
        .initiate(&test_team_form("Night Owls"), TOURNAMENT, fee())
        .await?;
    assert!(handoff.payment_url.ends_with(&handoff.transaction_id));

    let request = &backend.initiate_requests()[0];
    assert_eq!(request.name, "Asha Rao");
    assert_eq!(request.mobile_number, "9876543210");
    assert_eq!(request.amount, fee());

    backend.pay(&handoff.transaction_id);
    let state = checkout
        .resolve(&redirect(&format!(
            "merchantTransactionId={}",
            handoff.transaction_id
        ))?)
        .await;

    let TerminalState::Succeeded(details) = state else {
        panic!("expected success, got {state:?}");
    };
    assert_eq!(details.outcome.source, OutcomeSource::StatusLookup);
    match details.registration {
        RegistrationSummary::Registered { team, tournament } => {
            assert_eq!(team.name, "Night Owls");
            assert_eq!(team.member_count, 3);
            assert_eq!(team.team_id.as_deref(), Some("team-1"));
            assert_eq!(tournament.and_then(|t| t.name).as_deref(), Some("Monsoon Cup"));
        }
        other => panic!("expected registration, got {other:?}"),
    }

    let registrations = backend.registrations();
    assert_eq!(registrations.len(), 1);
    assert_eq!(
        registrations[0].payment_details.transaction_id,
        handoff.transaction_id
    );
    assert_eq!(registrations[0].payment_details.amount, fee());
    assert_eq!(registrations[0].tournament_id, TOURNAMENT);

    assert!(store.load_intent().await?.is_none());
    assert!(store.current_transaction().await?.is_none());

    Ok(())
}

/// Tests the redirect code decides the outcome without a status lookup
#[tokio::test]
async fn test_redirect_code_takes_precedence() -> Result<()> {
    setup_tracing();
    let backend = ScriptedBackend::new();
    let checkout = create_test_checkout(
        backend.clone(),
        Arc::new(MemoryIntentStore::new()),
        Default::default(),
    )?;

    let handoff = checkout
        .initiate(&test_team_form("Night Owls"), TOURNAMENT, fee())
        .await?;

    // Backend still reports the session as pending
    let state = checkout
        .resolve(&redirect(&format!(
            "id={}&code=PAYMENT_SUCCESS",
            handoff.transaction_id
        ))?)
        .await;

    assert!(matches!(state, TerminalState::Succeeded(ref d) if d.outcome.source == OutcomeSource::Redirect));
    assert_eq!(backend.status_calls(), 0);
    assert_eq!(backend.registrations().len(), 1);

    Ok(())
}

// =============================================================================
// At most once
// =============================================================================

/// Tests replaying the same redirect never registers a second time
#[tokio::test]
async fn test_repeated_redirect_registers_once() -> Result<()> {
    setup_tracing();
    let backend = ScriptedBackend::new();
    let checkout = create_test_checkout(
        backend.clone(),
        Arc::new(MemoryIntentStore::new()),
        Default::default(),
    )?;

    let handoff = checkout
        .initiate(&test_team_form("Night Owls"), TOURNAMENT, fee())
        .await?;
    backend.pay(&handoff.transaction_id);
    let callback = redirect(&format!("id={}", handoff.transaction_id))?;

    let first = checkout.resolve(&callback).await;
    let second = checkout.resolve(&callback).await;
    let third = checkout.resolve(&callback).await;

    assert!(matches!(first, TerminalState::Succeeded(ref d)
        if matches!(d.registration, RegistrationSummary::Registered { .. })));
    for state in [second, third] {
        assert!(matches!(state, TerminalState::Succeeded(ref d)
            if d.registration == RegistrationSummary::NotAttempted));
    }
    assert_eq!(backend.register_calls(), 1);

    Ok(())
}

// =============================================================================
// Failure and ambiguity
// =============================================================================

/// Tests a declined payment never registers and clears the pending registration
#[tokio::test]
async fn test_declined_payment_is_not_registered() -> Result<()> {
    setup_tracing();
    let backend = ScriptedBackend::new();
    let store = MemoryIntentStore::new();
    let checkout =
        create_test_checkout(backend.clone(), Arc::new(store.clone()), Default::default())?;

    let handoff = checkout
        .initiate(&test_team_form("Night Owls"), TOURNAMENT, fee())
        .await?;
    backend.decline(&handoff.transaction_id);

    let state = checkout
        .resolve(&redirect(&format!("id={}", handoff.transaction_id))?)
        .await;

    match state {
        TerminalState::Failed(reason) => {
            assert_eq!(reason.transaction_id, handoff.transaction_id);
            assert_eq!(reason.provider_status.as_deref(), Some(STATUS_DECLINED));
        }
        other => panic!("expected failure, got {other:?}"),
    }
    assert_eq!(backend.register_calls(), 0);
    assert!(store.load_intent().await?.is_none());

    Ok(())
}

/// Tests a session the payer abandoned resolves as failed, not success
#[tokio::test]
async fn test_unpaid_session_is_not_success() -> Result<()> {
    setup_tracing();
    let backend = ScriptedBackend::new();
    let checkout = create_test_checkout(
        backend.clone(),
        Arc::new(MemoryIntentStore::new()),
        Default::default(),
    )?;

    let handoff = checkout
        .initiate(&test_team_form("Night Owls"), TOURNAMENT, fee())
        .await?;

    let state = checkout
        .resolve(&redirect(&format!("id={}", handoff.transaction_id))?)
        .await;

    assert!(matches!(state, TerminalState::Failed(_)));
    assert!(backend.registrations().is_empty());

    Ok(())
}

/// Tests registration failing after payment keeps the pending registration
#[tokio::test]
async fn test_registration_failure_after_payment_keeps_intent() -> Result<()> {
    setup_tracing();
    let backend = ScriptedBackend::new();
    let store = MemoryIntentStore::new();
    let checkout =
        create_test_checkout(backend.clone(), Arc::new(store.clone()), Default::default())?;

    let handoff = checkout
        .initiate(&test_team_form("Night Owls"), TOURNAMENT, fee())
        .await?;
    let before = store.load_intent().await?;
    backend.pay(&handoff.transaction_id);
    backend.set_registration_down(true);

    let state = checkout
        .resolve(&redirect(&format!("id={}", handoff.transaction_id))?)
        .await;

    assert!(matches!(
        state,
        TerminalState::AmbiguousError(Ambiguity::RegistrationAfterPayment { .. })
    ));
    assert!(matches!(
        state.error(),
        Some(Error::RegistrationAfterPayment { .. })
    ));
    assert_eq!(store.load_intent().await?, before);

    Ok(())
}

/// Tests a redirect without transaction id touches neither store nor backend
#[tokio::test]
async fn test_redirect_without_transaction_id() -> Result<()> {
    setup_tracing();
    let backend = ScriptedBackend::new();
    let store = MemoryIntentStore::new();
    let checkout =
        create_test_checkout(backend.clone(), Arc::new(store.clone()), Default::default())?;

    checkout
        .initiate(&test_team_form("Night Owls"), TOURNAMENT, fee())
        .await?;

    for callback in [
        CallbackParams::default(),
        redirect("code=PAYMENT_SUCCESS")?,
        redirect("id=&merchantTransactionId=")?,
    ] {
        let state = checkout.resolve(&callback).await;
        assert_eq!(
            state,
            TerminalState::AmbiguousError(Ambiguity::MissingTransactionId)
        );
    }

    assert_eq!(backend.status_calls(), 0);
    assert_eq!(backend.register_calls(), 0);
    assert!(store.load_intent().await?.is_some());

    Ok(())
}

/// Tests an unreachable status service registers under the default policy
/// and defers under the strict one
#[tokio::test]
async fn test_unknown_status_policies() -> Result<()> {
    setup_tracing();

    let backend = ScriptedBackend::new();
    backend.set_status_down(true);
    let lenient = create_test_checkout(
        backend.clone(),
        Arc::new(MemoryIntentStore::new()),
        Default::default(),
    )?;
    let handoff = lenient
        .initiate(&test_team_form("Night Owls"), TOURNAMENT, fee())
        .await?;
    let state = lenient
        .resolve(&redirect(&format!("id={}", handoff.transaction_id))?)
        .await;
    assert!(matches!(state, TerminalState::Succeeded(ref d)
        if d.outcome.status == PaymentStatus::Unknown));
    assert_eq!(backend.registrations().len(), 1);

    let backend = ScriptedBackend::new();
    backend.set_status_down(true);
    let store = MemoryIntentStore::new();
    let strict = create_test_checkout(
        backend.clone(),
        Arc::new(store.clone()),
        ResolverOptions {
            unknown_status_policy: UnknownStatusPolicy::Defer,
            ..Default::default()
        },
    )?;
    let handoff = strict
        .initiate(&test_team_form("Night Owls"), TOURNAMENT, fee())
        .await?;
    let state = strict
        .resolve(&redirect(&format!("id={}", handoff.transaction_id))?)
        .await;
    assert!(matches!(
        state,
        TerminalState::AmbiguousError(Ambiguity::PaymentStatusUnknown { .. })
    ));
    assert!(backend.registrations().is_empty());
    assert!(store.load_intent().await?.is_some());

    Ok(())
}

// =============================================================================
// Initiation
// =============================================================================

/// Tests an invalid form sends nothing and stores nothing
#[tokio::test]
async fn test_invalid_form_is_rejected_before_payment() -> Result<()> {
    setup_tracing();
    let backend = ScriptedBackend::new();
    let store = MemoryIntentStore::new();
    let checkout =
        create_test_checkout(backend.clone(), Arc::new(store.clone()), Default::default())?;

    let mut form = test_team_form("Night Owls");
    form.members[1].player = "  ".to_string();

    let result = checkout.initiate(&form, TOURNAMENT, fee()).await;

    assert!(matches!(result, Err(Error::Validation(_))));
    assert!(backend.initiate_requests().is_empty());
    assert!(store.load_intent().await?.is_none());

    Ok(())
}

/// Tests a refused payment session leaves no pending registration behind
#[tokio::test]
async fn test_initiation_failure_persists_nothing() -> Result<()> {
    setup_tracing();
    let backend = ScriptedBackend::new();
    backend.set_initiate_down(true);
    let store = MemoryIntentStore::new();
    let checkout =
        create_test_checkout(backend.clone(), Arc::new(store.clone()), Default::default())?;

    let result = checkout
        .initiate(&test_team_form("Night Owls"), TOURNAMENT, fee())
        .await;

    assert!(matches!(result, Err(Error::PaymentInitiation(_))));
    assert!(store.load_intent().await?.is_none());
    assert!(store.current_transaction().await?.is_none());

    Ok(())
}

// =============================================================================
// Persistence
// =============================================================================

/// Tests the pending registration survives reopening the database
#[tokio::test]
async fn test_intent_survives_restart() -> Result<()> {
    setup_tracing();
    let path = temp_db_path("restart");
    let _ = std::fs::remove_file(&path);
    let backend = ScriptedBackend::new();

    let transaction_id = {
        let store = IntentRedbStore::new(&path, "tab-1")?;
        let checkout =
            create_test_checkout(backend.clone(), Arc::new(store), Default::default())?;
        checkout
            .initiate(&test_team_form("Night Owls"), TOURNAMENT, fee())
            .await?
            .transaction_id
    };

    backend.pay(&transaction_id);

    let store = IntentRedbStore::new(&path, "tab-1")?;
    let checkout = create_test_checkout(backend.clone(), Arc::new(store), Default::default())?;
    let state = checkout
        .resolve(&redirect(&format!("id={transaction_id}"))?)
        .await;

    assert!(matches!(state, TerminalState::Succeeded(ref d)
        if matches!(d.registration, RegistrationSummary::Registered { .. })));
    assert_eq!(backend.registrations().len(), 1);

    drop(checkout);
    std::fs::remove_file(&path)?;

    Ok(())
}

/// Tests a callback in one session does not consume another session's intent
#[tokio::test]
async fn test_sessions_do_not_share_intents() -> Result<()> {
    setup_tracing();
    let backend = ScriptedBackend::new();
    let tab_1 = IntentRedbStore::in_memory("tab-1")?;
    let tab_2 = tab_1.for_session("tab-2")?;

    let first = create_test_checkout(backend.clone(), Arc::new(tab_1.clone()), Default::default())?;
    let second = create_test_checkout(backend.clone(), Arc::new(tab_2.clone()), Default::default())?;

    let handoff = first
        .initiate(&test_team_form("Night Owls"), TOURNAMENT, fee())
        .await?;
    backend.pay(&handoff.transaction_id);

    let state = second
        .resolve(&redirect(&format!("id={}", handoff.transaction_id))?)
        .await;

    assert!(matches!(state, TerminalState::Succeeded(ref d)
        if d.registration == RegistrationSummary::NotAttempted));
    assert!(backend.registrations().is_empty());
    assert!(tab_1.load_intent().await?.is_some());

    Ok(())
}

/// Tests a corrupt stored registration resolves like a missing one
#[tokio::test]
async fn test_corrupt_intent_is_ignored() -> Result<()> {
    setup_tracing();
    let backend = ScriptedBackend::new();
    let store = IntentRedbStore::in_memory("tab-1")?;
    let checkout =
        create_test_checkout(backend.clone(), Arc::new(store.clone()), Default::default())?;

    let handoff = checkout
        .initiate(&test_team_form("Night Owls"), TOURNAMENT, fee())
        .await?;
    store.insert_raw("{ definitely not an intent")?;
    backend.pay(&handoff.transaction_id);

    let state = checkout
        .resolve(&redirect(&format!("id={}", handoff.transaction_id))?)
        .await;

    assert!(matches!(state, TerminalState::Succeeded(ref d)
        if d.registration == RegistrationSummary::NotAttempted));
    assert!(backend.registrations().is_empty());

    Ok(())
}

// =============================================================================
// Recovery
// =============================================================================

/// Tests recovery registers a paid intent kept after a registration failure
#[tokio::test]
async fn test_recover_after_registration_failure() -> Result<()> {
    setup_tracing();
    let backend = ScriptedBackend::new();
    let store = MemoryIntentStore::new();
    let checkout =
        create_test_checkout(backend.clone(), Arc::new(store.clone()), Default::default())?;

    let handoff = checkout
        .initiate(&test_team_form("Night Owls"), TOURNAMENT, fee())
        .await?;
    backend.pay(&handoff.transaction_id);
    backend.set_registration_down(true);
    checkout
        .resolve(&redirect(&format!("id={}", handoff.transaction_id))?)
        .await;

    // Backend still down: nothing changes
    let report = checkout.recover_pending_registration().await?;
    assert_eq!(report.failed, 1);
    assert!(store.load_intent().await?.is_some());

    backend.set_registration_down(false);
    let report = checkout.recover_pending_registration().await?;
    assert_eq!(report.recovered, 1);
    assert!(store.load_intent().await?.is_none());
    assert_eq!(backend.registrations().len(), 1);

    // Nothing left to do
    let report = checkout.recover_pending_registration().await?;
    assert_eq!(report.recovered, 0);
    assert_eq!(backend.registrations().len(), 1);

    Ok(())
}

/// Tests recovery waits on pending payments and leaves intents on lookup errors
#[tokio::test]
async fn test_recover_waits_for_settlement() -> Result<()> {
    setup_tracing();
    let backend = ScriptedBackend::new();
    let store = MemoryIntentStore::new();
    let checkout =
        create_test_checkout(backend.clone(), Arc::new(store.clone()), Default::default())?;

    let handoff = checkout
        .initiate(&test_team_form("Night Owls"), TOURNAMENT, fee())
        .await?;

    let report = checkout.recover_pending_registration().await?;
    assert_eq!(report.skipped, 1);

    backend.set_status_down(true);
    let report = checkout.recover_pending_registration().await?;
    assert_eq!(report.skipped, 1);
    assert!(store.load_intent().await?.is_some());

    backend.set_status_down(false);
    backend.decline(&handoff.transaction_id);
    let report = checkout.recover_pending_registration().await?;
    assert_eq!(report.compensated, 1);
    assert!(store.load_intent().await?.is_none());
    assert!(backend.registrations().is_empty());

    Ok(())
}
