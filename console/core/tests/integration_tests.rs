//! Integration tests for the console call lifecycle
//!
//! These tests drive a full `Console` against in-memory stores and check
//! the behavior a surface relies on:
//! - Simulated arrivals and their timing
//! - Answer, decline, dial and end-of-call bookkeeping
//! - History capping and ordering
//! - Sign-out rules
//! - Store failure reporting

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, TimeZone, Utc};
use pretty_assertions::assert_eq;
use tokio::sync::mpsc;

use console_core::{
    AgentStatus, Background, CallDirection, CallDisposition, CallPhase, CallRecord, CallStore,
    Console, ConsoleConfig, ConsoleEvent, ConsoleMessage, MemoryStore, NewCallRecord, NotifyLevel,
    RecordId, RefreshTicket, StoreError, StoreOutcome,
};

// =============================================================================
// Helpers
// =============================================================================

/// Memory store that can be switched into failing mode
#[derive(Default)]
struct FlakyStore {
    inner: MemoryStore,
    failing: AtomicBool,
}

impl FlakyStore {
    fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    fn check(&self) -> Result<(), StoreError> {
        if self.failing.load(Ordering::SeqCst) {
            Err(StoreError::Unavailable("injected failure".to_string()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl CallStore for FlakyStore {
    fn name(&self) -> &str {
        "flaky"
    }

    async fn health_check(&self) -> bool {
        !self.failing.load(Ordering::SeqCst)
    }

    async fn insert(&self, record: NewCallRecord) -> Result<CallRecord, StoreError> {
        self.check()?;
        self.inner.insert(record).await
    }

    async fn update_duration(&self, id: &RecordId, duration: &str) -> Result<(), StoreError> {
        self.check()?;
        self.inner.update_duration(id, duration).await
    }

    async fn latest_for_number(
        &self,
        phone_number: &str,
        directions: &[CallDirection],
    ) -> Result<Option<CallRecord>, StoreError> {
        self.check()?;
        self.inner.latest_for_number(phone_number, directions).await
    }

    async fn recent(&self, limit: usize) -> Result<Vec<CallRecord>, StoreError> {
        self.check()?;
        self.inner.recent(limit).await
    }
}

fn console_with<S: CallStore + 'static>(
    store: S,
) -> (Console<S>, mpsc::Receiver<ConsoleMessage>) {
    let (tx, rx) = mpsc::channel(1024);
    (Console::new(store, ConsoleConfig::default(), tx), rx)
}

fn drain(rx: &mut mpsc::Receiver<ConsoleMessage>) -> Vec<ConsoleMessage> {
    let mut messages = Vec::new();
    while let Ok(msg) = rx.try_recv() {
        messages.push(msg);
    }
    messages
}

/// Apply background results until a call is ringing
async fn wait_for_ring<S: CallStore + 'static>(console: &mut Console<S>) {
    while console.incoming().is_none() {
        let background = tokio::time::timeout(Duration::from_secs(10), console.next_background())
            .await
            .expect("no arrival within 10s")
            .expect("background channel closed");
        console.apply_background(background).await.unwrap();
    }
}

async fn dial<S: CallStore + 'static>(console: &mut Console<S>, number: &str) {
    console
        .handle_event(ConsoleEvent::DialerReplace {
            text: number.to_string(),
        })
        .await
        .unwrap();
    console.handle_event(ConsoleEvent::PlaceCall).await.unwrap();
}

async fn select<S: CallStore + 'static>(console: &mut Console<S>, status: AgentStatus) {
    console
        .handle_event(ConsoleEvent::SelectStatus { status })
        .await
        .unwrap();
}

// =============================================================================
// Arrival Timing
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_incoming_arrives_exactly_after_delay() {
    let (mut console, _rx) = console_with(MemoryStore::new());
    console.start().await.unwrap();
    console.settle().await.unwrap();

    let early =
        tokio::time::timeout(Duration::from_millis(2_999), console.next_background()).await;
    assert!(early.is_err(), "call arrived before 3s");

    let on_time = tokio::time::timeout(Duration::from_millis(2), console.next_background())
        .await
        .expect("call did not arrive at 3s")
        .unwrap();
    assert!(matches!(on_time, Background::IncomingArrived { .. }));

    console.apply_background(on_time).await.unwrap();
    assert_eq!(console.phase(), CallPhase::Ringing);
}

#[tokio::test(start_paused = true)]
async fn test_no_second_arrival_while_ringing() {
    let (mut console, _rx) = console_with(MemoryStore::new());
    console.start().await.unwrap();
    wait_for_ring(&mut console).await;
    console.settle().await.unwrap();

    assert!(!console.is_arrival_armed());
    let next = tokio::time::timeout(Duration::from_secs(60), console.next_background()).await;
    assert!(next.is_err(), "unexpected background event while ringing");
}

#[tokio::test(start_paused = true)]
async fn test_no_arrival_outside_available() {
    let (mut console, _rx) = console_with(MemoryStore::new());
    console.start().await.unwrap();
    select(&mut console, AgentStatus::Break).await;
    console.settle().await.unwrap();

    let next = tokio::time::timeout(Duration::from_secs(30), console.next_background()).await;
    assert!(next.is_err());
    assert!(console.incoming().is_none());
}

#[tokio::test(start_paused = true)]
async fn test_reselecting_available_keeps_countdown() {
    let (mut console, _rx) = console_with(MemoryStore::new());
    console.start().await.unwrap();
    console.settle().await.unwrap();

    tokio::time::sleep(Duration::from_secs(2)).await;
    select(&mut console, AgentStatus::Available).await;

    // Countdown was not restarted, so the call lands one second later
    let arrival = tokio::time::timeout(Duration::from_millis(1_001), console.next_background())
        .await
        .expect("countdown was restarted")
        .unwrap();
    assert!(matches!(arrival, Background::IncomingArrived { .. }));
}

// =============================================================================
// Call Lifecycle
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_answer_records_inbound_call() {
    let (mut console, mut rx) = console_with(MemoryStore::new());
    console.start().await.unwrap();
    wait_for_ring(&mut console).await;
    drain(&mut rx);

    console.handle_event(ConsoleEvent::AnswerCall).await.unwrap();
    console.settle().await.unwrap();

    assert_eq!(console.status().current(), AgentStatus::OnCall);
    assert_eq!(
        console.status().status_before_call(),
        Some(AgentStatus::Available)
    );
    assert!(console.incoming().is_none());
    let call = console.active_call().unwrap();
    assert_eq!(call.number, "+1 234-567-8900");
    assert_eq!(call.elapsed_secs, 0);
    assert_eq!(console.calls_handled(), 1);

    let records = console.store().snapshot();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].phone_number, "+1 234-567-8900");
    assert_eq!(records[0].direction, CallDirection::Inbound);
    assert_eq!(records[0].disposition, CallDisposition::Answered);
    assert_eq!(records[0].duration, "00:00");
    assert_eq!(console.history().records().len(), 1);

    let messages = drain(&mut rx);
    assert!(messages.contains(&ConsoleMessage::IncomingCleared));
    assert!(messages.contains(&ConsoleMessage::CallStarted {
        number: "+1 234-567-8900".to_string(),
        direction: CallDirection::Inbound,
    }));
    assert!(messages
        .iter()
        .any(|m| matches!(m, ConsoleMessage::HistoryUpdated { records } if records.len() == 1)));
}

#[tokio::test(start_paused = true)]
async fn test_decline_records_and_keeps_status() {
    let (mut console, _rx) = console_with(MemoryStore::new());
    console.start().await.unwrap();
    wait_for_ring(&mut console).await;

    console.handle_event(ConsoleEvent::DeclineCall).await.unwrap();
    console.settle().await.unwrap();

    assert_eq!(console.status().current(), AgentStatus::Available);
    assert!(console.incoming().is_none());
    assert!(console.active_call().is_none());
    assert_eq!(console.calls_handled(), 0);

    let records = console.store().snapshot();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].disposition, CallDisposition::Declined);
    assert_eq!(records[0].duration, "00:00");

    // Still Available with nothing pending, so the next call is on its way
    assert!(console.is_arrival_armed());
    wait_for_ring(&mut console).await;
}

#[tokio::test(start_paused = true)]
async fn test_end_call_saves_duration_and_forces_after_call_work() {
    let (mut console, mut rx) = console_with(MemoryStore::new());
    console.start().await.unwrap();
    select(&mut console, AgentStatus::OutBound).await;

    dial(&mut console, "5551234").await;
    let now = Utc::now();
    for _ in 0..65 {
        console.tick_at(now).await;
    }
    drain(&mut rx);

    console.handle_event(ConsoleEvent::EndCall).await.unwrap();
    console.settle().await.unwrap();

    assert_eq!(console.status().current(), AgentStatus::AfterCallWork);
    assert_eq!(
        console.status().status_before_call(),
        Some(AgentStatus::OutBound)
    );
    assert!(console.active_call().is_none());

    let records = console.store().snapshot();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].duration, "01:05");

    let messages = drain(&mut rx);
    assert!(messages.contains(&ConsoleMessage::CallEnded {
        number: "5551234".to_string(),
        duration: "01:05".to_string(),
    }));
    assert!(messages.contains(&ConsoleMessage::StatusChanged {
        status: AgentStatus::AfterCallWork,
        previous: AgentStatus::OnCall,
        before_call: Some(AgentStatus::OutBound),
    }));
}

#[tokio::test(start_paused = true)]
async fn test_end_call_updates_most_recent_matching_record() {
    let base = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
    let earlier = NewCallRecord::dialed("5551234", base).into_record(RecordId::new("earlier"));
    let store = MemoryStore::with_records(vec![earlier]);

    let (mut console, _rx) = console_with(store);
    select(&mut console, AgentStatus::Break).await;
    dial(&mut console, "5551234").await;
    let now = Utc::now();
    for _ in 0..9 {
        console.tick_at(now).await;
    }
    console.handle_event(ConsoleEvent::EndCall).await.unwrap();
    console.settle().await.unwrap();

    let records = console.store().snapshot();
    assert_eq!(records[0].duration, "00:00");
    assert_eq!(records[1].duration, "00:09");
}

#[tokio::test(start_paused = true)]
async fn test_dial_creates_outbound_record() {
    let (mut console, mut rx) = console_with(MemoryStore::new());
    select(&mut console, AgentStatus::OutBound).await;

    for ch in "555x1234".chars() {
        console
            .handle_event(ConsoleEvent::DialerInput { ch })
            .await
            .unwrap();
    }
    assert_eq!(console.dialer().as_str(), "5551234");

    console.handle_event(ConsoleEvent::PlaceCall).await.unwrap();
    console.settle().await.unwrap();

    assert_eq!(console.active_call().map(|c| c.number.as_str()), Some("5551234"));
    assert_eq!(
        console.active_call().map(|c| c.direction),
        Some(CallDirection::Outbound)
    );
    assert!(console.dialer().is_empty());
    assert_eq!(console.status().current(), AgentStatus::OnCall);

    let records = console.store().snapshot();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].direction, CallDirection::Outbound);
    assert_eq!(records[0].disposition, CallDisposition::Answered);

    let messages = drain(&mut rx);
    assert!(messages.contains(&ConsoleMessage::DialerUpdated {
        text: String::new()
    }));
}

#[tokio::test(start_paused = true)]
async fn test_dial_while_ringing_places_call() {
    let (mut console, _rx) = console_with(MemoryStore::new());
    console.start().await.unwrap();
    wait_for_ring(&mut console).await;
    assert_eq!(console.phase(), CallPhase::Ringing);

    dial(&mut console, "5551234").await;
    console.settle().await.unwrap();

    assert_eq!(console.phase(), CallPhase::Active);
    assert_eq!(console.active_call().map(|c| c.number.as_str()), Some("5551234"));
    assert!(console.dialer().is_empty());
    let records = console.store().snapshot();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].direction, CallDirection::Outbound);

    // The ringing call waits behind the active one
    assert!(console.incoming().is_some());
    console.handle_event(ConsoleEvent::AnswerCall).await.unwrap();
    console.settle().await.unwrap();
    assert_eq!(console.active_call().map(|c| c.number.as_str()), Some("5551234"));
    assert_eq!(console.store().len(), 1);

    console.handle_event(ConsoleEvent::EndCall).await.unwrap();
    console.handle_event(ConsoleEvent::DeclineCall).await.unwrap();
    console.settle().await.unwrap();
    assert_eq!(console.phase(), CallPhase::Idle);
    assert_eq!(console.store().len(), 2);
}

#[tokio::test]
async fn test_guards_ignore_invalid_actions() {
    let (mut console, mut rx) = console_with(MemoryStore::new());

    console.handle_event(ConsoleEvent::AnswerCall).await.unwrap();
    console.handle_event(ConsoleEvent::DeclineCall).await.unwrap();
    console.handle_event(ConsoleEvent::EndCall).await.unwrap();
    console.handle_event(ConsoleEvent::PlaceCall).await.unwrap();

    assert_eq!(console.pending_jobs(), 0);
    assert!(console.store().is_empty());
    assert!(drain(&mut rx).is_empty());

    // Second dial during a call is ignored
    dial(&mut console, "5551234").await;
    dial(&mut console, "5559999").await;
    console.settle().await.unwrap();
    assert_eq!(console.store().len(), 1);
    assert_eq!(console.dialer().as_str(), "5559999");
}

// =============================================================================
// Status Accounting
// =============================================================================

#[tokio::test]
async fn test_status_timer_resets_and_totals_accumulate() {
    let (mut console, mut rx) = console_with(MemoryStore::new());
    let now = Utc::now();

    for (i, status) in AgentStatus::SELECTABLE.into_iter().rev().enumerate() {
        select(&mut console, status).await;
        assert_eq!(console.status().current(), status);
        assert_eq!(console.status().seconds_in_status(), 0);
        for _ in 0..=i {
            console.tick_at(now).await;
        }
    }

    let durations = console.status().durations();
    assert_eq!(durations.get(AgentStatus::OutBound), 1);
    assert_eq!(durations.get(AgentStatus::Available), 8);
    assert_eq!(durations.get(AgentStatus::OnCall), 0);
    assert_eq!(durations.total(), console.session_secs());

    let last_tick = drain(&mut rx)
        .into_iter()
        .rev()
        .find(|m| matches!(m, ConsoleMessage::Tick { .. }))
        .unwrap();
    assert!(matches!(
        last_tick,
        ConsoleMessage::Tick {
            status_secs: 8,
            session_secs: 36,
            ..
        }
    ));
}

// =============================================================================
// History
// =============================================================================

#[tokio::test]
async fn test_history_is_capped_and_newest_first() {
    let base = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
    let records = (0..20)
        .map(|i| {
            NewCallRecord::answered(format!("555-{i:04}"), base + ChronoDuration::minutes(i))
                .into_record(RecordId::new(i.to_string()))
        })
        .collect();

    let (mut console, _rx) = console_with(MemoryStore::with_records(records));
    console.start().await.unwrap();
    console.settle().await.unwrap();

    let history = console.history().records();
    assert_eq!(history.len(), 15);
    assert_eq!(history[0].phone_number, "555-0019");
    assert!(history
        .windows(2)
        .all(|pair| pair[0].start_time >= pair[1].start_time));
}

#[tokio::test]
async fn test_stale_refresh_is_discarded() {
    let (mut console, mut rx) = console_with(MemoryStore::new());
    dial(&mut console, "5551234").await;
    console.settle().await.unwrap();
    assert_eq!(console.history().records().len(), 1);
    drain(&mut rx);

    console
        .apply_background(Background::Store(StoreOutcome::Refreshed {
            ticket: RefreshTicket(0),
            records: Vec::new(),
        }))
        .await
        .unwrap();

    assert_eq!(console.history().records().len(), 1);
    assert!(!drain(&mut rx)
        .iter()
        .any(|m| matches!(m, ConsoleMessage::HistoryUpdated { .. })));
}

// =============================================================================
// Sign Out
// =============================================================================

#[tokio::test]
async fn test_sign_out_only_when_gone_home() {
    let (mut console, mut rx) = console_with(MemoryStore::new());

    console.handle_event(ConsoleEvent::SignOut).await.unwrap();
    assert!(!console.is_signed_out());
    let messages = drain(&mut rx);
    assert!(messages.iter().any(|m| matches!(
        m,
        ConsoleMessage::Notify {
            level: NotifyLevel::Warning,
            ..
        }
    )));

    select(&mut console, AgentStatus::GoneHome).await;
    console.handle_event(ConsoleEvent::SignOut).await.unwrap();
    assert!(console.is_signed_out());
    assert!(!console.is_arrival_armed());

    let messages = drain(&mut rx);
    assert!(messages.contains(&ConsoleMessage::SignedOut {
        agent_name: "Console Agent".to_string(),
    }));
}

// =============================================================================
// Store Failures
// =============================================================================

#[tokio::test]
async fn test_store_failure_raises_and_clears_degraded_indicator() {
    let (mut console, mut rx) = console_with(FlakyStore::default());
    console.store().set_failing(true);

    dial(&mut console, "5551234").await;
    console.settle().await.unwrap();

    // The call goes ahead locally even though nothing was written
    assert!(console.is_store_degraded());
    assert_eq!(console.status().current(), AgentStatus::OnCall);
    assert!(console.store().inner.is_empty());
    let messages = drain(&mut rx);
    assert!(messages.iter().any(|m| matches!(
        m,
        ConsoleMessage::StoreHealth {
            degraded: true,
            detail: Some(_),
        }
    )));

    console.store().set_failing(false);
    console.handle_event(ConsoleEvent::EndCall).await.unwrap();
    console.settle().await.unwrap();

    assert!(!console.is_store_degraded());
    let messages = drain(&mut rx);
    assert!(messages.contains(&ConsoleMessage::StoreHealth {
        degraded: false,
        detail: None,
    }));
}

#[tokio::test]
async fn test_unreachable_store_reported_at_start() {
    let store = FlakyStore::default();
    store.set_failing(true);
    let (mut console, mut rx) = console_with(store);

    console.start().await.unwrap();
    assert!(console.is_store_degraded());
    assert!(drain(&mut rx)
        .iter()
        .any(|m| matches!(m, ConsoleMessage::StoreHealth { degraded: true, .. })));
}
