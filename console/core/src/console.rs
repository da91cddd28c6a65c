//! Console - The Agent Console Core
//!
//! The Console owns every piece of agent state and drives it:
//! - Agent status and per-status time accounting
//! - The simulated call lifecycle (ringing, active, ended)
//! - The dialer buffer
//! - The call history, refreshed from the record store
//!
//! # Driving the Console
//!
//! The Console is UI-agnostic. A surface drives it from one loop:
//! - [`Console::handle_event`] for [`ConsoleEvent`]s raised by the agent
//! - [`Console::tick`] once per second
//! - [`Console::next_background`] / [`Console::apply_background`] for the
//!   arrival timer and store results
//!
//! and renders the [`ConsoleMessage`]s it sends back.
//!
//! # Call Lifecycle
//!
//! ```text
//! Idle --(3 s, Available)--> Ringing --answer--> Active --end--> Idle (After Call Work)
//!                            Ringing --decline-> Idle
//! Idle --dial-------------------------------> Active --end--> Idle (After Call Work)
//! ```
//!
//! Store writes never block the Console. They are queued on the
//! [`StoreWorker`] and their results come back as [`Background`] events.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;

use crate::call::{format_duration, ActiveCall, CallDirection, CallPhase, IncomingCall, NewCallRecord};
use crate::config::ConsoleConfig;
use crate::dialer::DialerBuffer;
use crate::error::ConsoleError;
use crate::events::ConsoleEvent;
use crate::history::CallHistory;
use crate::messages::{ConsoleMessage, NotifyLevel, SessionId};
use crate::status::{AgentStatus, StatusChange, StatusEngine};
use crate::store::CallStore;
use crate::timer::ScopedTimer;
use crate::worker::{StoreJob, StoreOutcome, StoreWorker};

/// Work finished in the background, to be applied by the driver loop
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Background {
    /// The arrival timer fired
    IncomingArrived {
        /// Arming generation; stale firings are ignored
        generation: u64,
    },
    /// A store job finished
    Store(StoreOutcome),
}

impl From<StoreOutcome> for Background {
    fn from(outcome: StoreOutcome) -> Self {
        Self::Store(outcome)
    }
}

/// Conditions that decide whether a call may arrive
type ArrivalKey = (AgentStatus, bool, bool);

/// The Console - headless agent console core
pub struct Console<S: CallStore> {
    /// Configuration
    config: ConsoleConfig,
    /// Record store, shared with the worker
    store: Arc<S>,
    /// Session identifier
    session_id: SessionId,
    /// Agent status
    status: StatusEngine,
    /// Call waiting to be answered
    incoming: Option<IncomingCall>,
    /// Call in progress
    active: Option<ActiveCall>,
    /// Number being composed
    dialer: DialerBuffer,
    /// Recent call records
    history: CallHistory,
    /// Seconds since start
    session_secs: u64,
    /// Calls answered or dialed
    calls_handled: u32,
    /// Instant of the last tick
    now: DateTime<Utc>,
    /// Whether the last store operation failed
    store_degraded: bool,
    /// Set once the agent signs out
    signed_out: bool,
    /// Pending arrival, if armed
    arrival: Option<ScopedTimer>,
    /// Bumped on every re-arm
    arrival_generation: u64,
    /// Conditions the arrival was last armed (or disarmed) for
    arrival_key: Option<ArrivalKey>,
    /// Background store task
    worker: StoreWorker,
    /// Jobs submitted but not yet applied
    pending_jobs: usize,
    /// Background results
    bg_tx: mpsc::UnboundedSender<Background>,
    bg_rx: mpsc::UnboundedReceiver<Background>,
    /// Channel to send messages to the surface
    tx: mpsc::Sender<ConsoleMessage>,
}

impl<S: CallStore + 'static> Console<S> {
    /// Create a Console backed by `store`
    ///
    /// Spawns the store worker, so this must be called from within a tokio
    /// runtime.
    pub fn new(store: S, config: ConsoleConfig, tx: mpsc::Sender<ConsoleMessage>) -> Self {
        let store = Arc::new(store);
        let (bg_tx, bg_rx) = mpsc::unbounded_channel();
        let worker = StoreWorker::spawn(store.clone(), bg_tx.clone());
        let history = CallHistory::new(config.calls.history_limit);

        Self {
            config,
            store,
            session_id: SessionId::new(),
            status: StatusEngine::default(),
            incoming: None,
            active: None,
            dialer: DialerBuffer::new(),
            history,
            session_secs: 0,
            calls_handled: 0,
            now: Utc::now(),
            store_degraded: false,
            signed_out: false,
            arrival: None,
            arrival_generation: 0,
            arrival_key: None,
            worker,
            pending_jobs: 0,
            bg_tx,
            bg_rx,
            tx,
        }
    }

    // ============================================
    // Accessors
    // ============================================

    /// Session identifier
    #[must_use]
    pub fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    /// Configuration in use
    #[must_use]
    pub fn config(&self) -> &ConsoleConfig {
        &self.config
    }

    /// The record store
    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Status engine
    #[must_use]
    pub fn status(&self) -> &StatusEngine {
        &self.status
    }

    /// The ringing call, if any
    #[must_use]
    pub fn incoming(&self) -> Option<&IncomingCall> {
        self.incoming.as_ref()
    }

    /// The call in progress, if any
    #[must_use]
    pub fn active_call(&self) -> Option<&ActiveCall> {
        self.active.as_ref()
    }

    /// Where the call lifecycle is
    #[must_use]
    pub fn phase(&self) -> CallPhase {
        if self.active.is_some() {
            CallPhase::Active
        } else if self.incoming.is_some() {
            CallPhase::Ringing
        } else {
            CallPhase::Idle
        }
    }

    /// Dialer contents
    #[must_use]
    pub fn dialer(&self) -> &DialerBuffer {
        &self.dialer
    }

    /// Call history
    #[must_use]
    pub fn history(&self) -> &CallHistory {
        &self.history
    }

    /// Seconds since the session started
    #[must_use]
    pub fn session_secs(&self) -> u64 {
        self.session_secs
    }

    /// Calls answered or dialed this session
    #[must_use]
    pub fn calls_handled(&self) -> u32 {
        self.calls_handled
    }

    /// Whether the last store operation failed
    #[must_use]
    pub fn is_store_degraded(&self) -> bool {
        self.store_degraded
    }

    /// Whether the agent has signed out
    #[must_use]
    pub fn is_signed_out(&self) -> bool {
        self.signed_out
    }

    /// Whether an incoming call is scheduled to arrive
    #[must_use]
    pub fn is_arrival_armed(&self) -> bool {
        self.arrival.as_ref().is_some_and(|timer| !timer.is_finished())
    }

    /// Store jobs whose results have not been applied yet
    #[must_use]
    pub fn pending_jobs(&self) -> usize {
        self.pending_jobs
    }

    // ============================================
    // Lifecycle
    // ============================================

    /// Start the Console: announce the session, load history, arm arrivals
    ///
    /// # Errors
    ///
    /// Returns [`ConsoleError::WorkerStopped`] if the store worker is gone.
    pub async fn start(&mut self) -> Result<(), ConsoleError> {
        tracing::info!(
            session = %self.session_id,
            agent = %self.config.agent_name,
            store = self.store.name(),
            "Console starting"
        );

        self.send(ConsoleMessage::SessionInfo {
            session_id: self.session_id.clone(),
            agent_name: self.config.agent_name.clone(),
            store_name: self.store.name().to_string(),
            status: self.status.current(),
            history_limit: self.history.limit(),
        })
        .await;

        if !self.store.health_check().await {
            tracing::warn!(store = self.store.name(), "Call store not reachable");
            self.mark_degraded("call store not reachable".to_string())
                .await;
        }

        self.refresh_history()?;
        self.sync_arrival();
        Ok(())
    }

    /// Handle an event from the surface
    ///
    /// Events whose preconditions do not hold are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`ConsoleError::WorkerStopped`] if a store job could not be
    /// queued. Local state has already changed when this happens.
    pub async fn handle_event(&mut self, event: ConsoleEvent) -> Result<(), ConsoleError> {
        if self.signed_out && !matches!(event, ConsoleEvent::QuitRequested) {
            tracing::debug!(?event, "Ignoring event after sign-out");
            return Ok(());
        }

        match event {
            ConsoleEvent::SelectStatus { status } => self.select_status(status).await,
            ConsoleEvent::AnswerCall => self.answer().await?,
            ConsoleEvent::DeclineCall => self.decline().await?,
            ConsoleEvent::PlaceCall => self.place_call().await?,
            ConsoleEvent::EndCall => self.end_call().await?,
            ConsoleEvent::ToggleMute => self.toggle_controls(true, false).await,
            ConsoleEvent::ToggleHold => self.toggle_controls(false, true).await,

            ConsoleEvent::DialerInput { ch } => {
                if self.dialer.push(ch) {
                    self.send_dialer().await;
                } else {
                    tracing::debug!(ch = ?ch, "Rejected dialer character");
                }
            }
            ConsoleEvent::DialerBackspace => {
                if self.dialer.backspace() {
                    self.send_dialer().await;
                }
            }
            ConsoleEvent::DialerClear => {
                self.dialer.clear();
                self.send_dialer().await;
            }
            ConsoleEvent::DialerReplace { text } => {
                if self.dialer.replace(&text) {
                    self.send_dialer().await;
                } else {
                    tracing::debug!(text = %text, "Rejected dialer value");
                }
            }

            ConsoleEvent::SignOut => self.sign_out().await,
            ConsoleEvent::QuitRequested => self.shutdown().await,
        }

        self.sync_arrival();
        Ok(())
    }

    /// Advance every counter by one second using the current wall clock
    pub async fn tick(&mut self) {
        self.tick_at(Utc::now()).await;
    }

    /// Advance every counter by one second, with `now` as the shared instant
    pub async fn tick_at(&mut self, now: DateTime<Utc>) {
        self.now = now;
        self.session_secs += 1;
        self.status.tick();
        if let Some(call) = self.active.as_mut() {
            call.elapsed_secs += 1;
        }

        self.send(ConsoleMessage::Tick {
            now,
            session_secs: self.session_secs,
            status_secs: self.status.seconds_in_status(),
            call_secs: self.active.as_ref().map(|call| call.elapsed_secs),
            durations: *self.status.durations(),
            calls_handled: self.calls_handled,
        })
        .await;
    }

    /// Wait for the next background result
    ///
    /// Cancel-safe, so it can sit in a `tokio::select!` arm.
    pub async fn next_background(&mut self) -> Option<Background> {
        self.bg_rx.recv().await
    }

    /// Apply a background result
    ///
    /// # Errors
    ///
    /// Returns [`ConsoleError::WorkerStopped`] if a store job could not be
    /// queued.
    pub async fn apply_background(&mut self, background: Background) -> Result<(), ConsoleError> {
        match background {
            Background::IncomingArrived { generation } => self.incoming_arrived(generation).await,
            Background::Store(outcome) => {
                self.pending_jobs = self.pending_jobs.saturating_sub(1);
                self.apply_store_outcome(outcome).await;
            }
        }
        self.sync_arrival();
        Ok(())
    }

    /// Apply background results until every queued store job has finished
    ///
    /// # Errors
    ///
    /// Returns [`ConsoleError::WorkerStopped`] if the worker exits first.
    pub async fn settle(&mut self) -> Result<(), ConsoleError> {
        while self.pending_jobs > 0 {
            if !self.worker.is_running() && self.bg_rx.is_empty() {
                return Err(ConsoleError::WorkerStopped);
            }
            match self.bg_rx.recv().await {
                Some(background) => self.apply_background(background).await?,
                None => return Err(ConsoleError::WorkerStopped),
            }
        }
        Ok(())
    }

    /// Shut down the Console
    pub async fn shutdown(&mut self) {
        tracing::info!(session = %self.session_id, "Console shutting down");
        self.arrival = None;
        self.send(ConsoleMessage::Quit {
            message: Some("Goodbye!".to_string()),
        })
        .await;
    }

    // ============================================
    // Status
    // ============================================

    async fn select_status(&mut self, status: AgentStatus) {
        if self.active.is_some() {
            tracing::debug!(status = %status, "Status is locked during a call");
            self.notify(NotifyLevel::Warning, "Status is locked while on a call")
                .await;
            return;
        }

        match self.status.select(status) {
            Ok(Some(change)) => self.announce_status(change).await,
            Ok(None) => tracing::debug!(status = %status, "Status already active"),
            Err(e) => {
                tracing::warn!(error = %e, "Rejected status selection");
                self.notify(NotifyLevel::Warning, &e.to_string()).await;
            }
        }
    }

    async fn announce_status(&mut self, change: StatusChange) {
        tracing::info!(from = %change.from, to = %change.to, "Status changed");
        self.send(ConsoleMessage::StatusChanged {
            status: change.to,
            previous: change.from,
            before_call: self.status.status_before_call(),
        })
        .await;
    }

    // ============================================
    // Call Lifecycle
    // ============================================

    async fn incoming_arrived(&mut self, generation: u64) {
        if generation != self.arrival_generation {
            tracing::debug!(generation, "Ignoring stale arrival");
            return;
        }
        self.arrival = None;
        if !self.arrival_allowed() {
            tracing::debug!("Arrival no longer allowed");
            return;
        }

        let number = self.config.calls.incoming_number.clone();
        tracing::info!(number = %number, "Incoming call");
        self.incoming = Some(IncomingCall {
            number: number.clone(),
            arrived_at: Utc::now(),
        });
        self.send(ConsoleMessage::IncomingCall { number }).await;
    }

    async fn answer(&mut self) -> Result<(), ConsoleError> {
        if self.active.is_some() {
            tracing::debug!("Answer ignored: call in progress");
            return Ok(());
        }
        let Some(incoming) = self.incoming.take() else {
            tracing::debug!("Answer ignored: nothing ringing");
            return Ok(());
        };
        let number = incoming.number;
        tracing::info!(number = %number, "Call answered");

        self.send(ConsoleMessage::IncomingCleared).await;
        self.connect(number.clone(), CallDirection::Inbound).await;
        self.submit(StoreJob::Record(NewCallRecord::answered(number, Utc::now())))?;
        self.refresh_history()
    }

    async fn decline(&mut self) -> Result<(), ConsoleError> {
        let Some(incoming) = self.incoming.take() else {
            tracing::debug!("Decline ignored: nothing ringing");
            return Ok(());
        };
        tracing::info!(number = %incoming.number, "Call declined");

        self.send(ConsoleMessage::IncomingCleared).await;
        self.submit(StoreJob::Record(NewCallRecord::declined(
            incoming.number,
            Utc::now(),
        )))?;
        self.refresh_history()
    }

    async fn place_call(&mut self) -> Result<(), ConsoleError> {
        if self.active.is_some() {
            tracing::debug!("Dial ignored: call in progress");
            return Ok(());
        }
        if self.dialer.is_empty() {
            tracing::debug!("Dial ignored: empty dialer");
            return Ok(());
        }

        let number = self.dialer.take();
        tracing::info!(number = %number, "Placing call");

        self.send_dialer().await;
        self.connect(number.clone(), CallDirection::Outbound).await;
        self.submit(StoreJob::Record(NewCallRecord::dialed(number, Utc::now())))?;
        self.refresh_history()
    }

    /// Enter On Call with a fresh active call
    async fn connect(&mut self, number: String, direction: CallDirection) {
        if let Some(change) = self.status.enter_call() {
            self.announce_status(change).await;
        }
        self.calls_handled += 1;
        self.active = Some(ActiveCall::new(number.clone(), direction));
        self.send(ConsoleMessage::CallStarted { number, direction })
            .await;
    }

    async fn end_call(&mut self) -> Result<(), ConsoleError> {
        let Some(call) = self.active.take() else {
            tracing::debug!("End ignored: no active call");
            return Ok(());
        };
        let duration = format_duration(call.elapsed_secs);
        tracing::info!(number = %call.number, duration = %duration, "Call ended");

        if let Some(change) = self.status.leave_call() {
            self.announce_status(change).await;
        }
        self.send(ConsoleMessage::CallEnded {
            number: call.number.clone(),
            duration: duration.clone(),
        })
        .await;

        self.submit(StoreJob::CloseCall {
            number: call.number,
            duration,
        })?;
        self.refresh_history()
    }

    async fn toggle_controls(&mut self, mute: bool, hold: bool) {
        let Some(call) = self.active.as_mut() else {
            tracing::debug!("Call control ignored: no active call");
            return;
        };
        if mute {
            call.muted = !call.muted;
        }
        if hold {
            call.on_hold = !call.on_hold;
        }
        let (muted, on_hold) = (call.muted, call.on_hold);
        tracing::debug!(muted, on_hold, "Call controls changed");
        self.send(ConsoleMessage::CallControls { muted, on_hold })
            .await;
    }

    /// Whether a call may arrive right now
    fn arrival_allowed(&self) -> bool {
        !self.signed_out
            && self.status.current() == AgentStatus::Available
            && self.incoming.is_none()
            && self.active.is_none()
    }

    /// Re-arm or cancel the arrival timer when its conditions change
    fn sync_arrival(&mut self) {
        let key = (
            self.status.current(),
            self.incoming.is_some(),
            self.active.is_some() || self.signed_out,
        );
        if self.arrival_key == Some(key) {
            return;
        }
        self.arrival_key = Some(key);

        // Dropping the old handle aborts it
        self.arrival = None;
        self.arrival_generation += 1;

        if self.arrival_allowed() {
            let delay = self.config.calls.arrival_delay;
            tracing::debug!(delay_secs = delay.as_secs(), "Arrival armed");
            self.arrival = Some(ScopedTimer::after(
                delay,
                self.bg_tx.clone(),
                Background::IncomingArrived {
                    generation: self.arrival_generation,
                },
            ));
        }
    }

    // ============================================
    // Session
    // ============================================

    async fn sign_out(&mut self) {
        let status = self.status.current();
        if !status.allows_sign_out() {
            tracing::debug!(status = %status, "Sign-out refused");
            self.notify(
                NotifyLevel::Warning,
                &format!("Set your status to {} before signing out", AgentStatus::GoneHome),
            )
            .await;
            return;
        }

        tracing::info!(agent = %self.config.agent_name, "Agent signed out");
        self.signed_out = true;
        self.send(ConsoleMessage::SignedOut {
            agent_name: self.config.agent_name.clone(),
        })
        .await;
    }

    // ============================================
    // Store
    // ============================================

    fn submit(&mut self, job: StoreJob) -> Result<(), ConsoleError> {
        let kind = job.kind();
        match self.worker.submit(job) {
            Ok(()) => {
                self.pending_jobs += 1;
                Ok(())
            }
            Err(e) => {
                tracing::warn!(job = kind, "Store worker stopped; job dropped");
                self.store_degraded = true;
                Err(e)
            }
        }
    }

    fn refresh_history(&mut self) -> Result<(), ConsoleError> {
        let ticket = self.history.begin_refresh();
        self.submit(StoreJob::Refresh {
            ticket,
            limit: self.history.limit(),
        })
    }

    async fn apply_store_outcome(&mut self, outcome: StoreOutcome) {
        match outcome {
            StoreOutcome::Recorded(_) => self.mark_healthy().await,
            StoreOutcome::CallClosed { number, id } => {
                if id.is_none() {
                    tracing::warn!(number = %number, "No call record found to save duration");
                }
                self.mark_healthy().await;
            }
            StoreOutcome::Refreshed { ticket, records } => {
                if self.history.apply(ticket, records) {
                    self.send(ConsoleMessage::HistoryUpdated {
                        records: self.history.records().to_vec(),
                    })
                    .await;
                }
                self.mark_healthy().await;
            }
            StoreOutcome::Failed { job, error } => {
                tracing::warn!(job, error = %error, "Store operation failed");
                self.mark_degraded(format!("{job} failed: {error}")).await;
            }
        }
    }

    async fn mark_healthy(&mut self) {
        if self.store_degraded {
            tracing::info!(store = self.store.name(), "Call store recovered");
            self.store_degraded = false;
            self.send(ConsoleMessage::StoreHealth {
                degraded: false,
                detail: None,
            })
            .await;
        }
    }

    async fn mark_degraded(&mut self, detail: String) {
        self.store_degraded = true;
        self.send(ConsoleMessage::StoreHealth {
            degraded: true,
            detail: Some(detail),
        })
        .await;
    }

    // ============================================
    // Surface Messages
    // ============================================

    async fn send_dialer(&self) {
        self.send(ConsoleMessage::DialerUpdated {
            text: self.dialer.as_str().to_string(),
        })
        .await;
    }

    /// Send notification
    async fn notify(&self, level: NotifyLevel, message: &str) {
        self.send(ConsoleMessage::Notify {
            level,
            title: None,
            message: message.to_string(),
        })
        .await;
    }

    /// Send a message to the surface
    async fn send(&self, msg: ConsoleMessage) {
        if let Err(e) = self.tx.send(msg).await {
            tracing::warn!("Failed to send message to surface: {}", e);
        }
    }
}
