//! Display State Types
//!
//! Types that represent the current display state for the TUI.
//! These are derived from ConsoleMessages and used for rendering.
//!
//! # Design Philosophy
//!
//! The TUI is a "thin client" - it just renders what the Console tells it to.
//! Display state is the bridge between ConsoleMessages and rendering; it
//! never decides anything about calls or statuses on its own.

use std::time::Duration;

use chrono::{DateTime, Local, Utc};
use console_core::{
    clock_bar, format_duration, format_received, AgentStatus, CallDirection, CallRecord,
    ConsoleMessage, NotifyLevel, SessionId, StatusDurations, ZoneReading,
};

/// How long a notification stays in the footer
pub const NOTIFICATION_TTL: Duration = Duration::from_secs(5);

/// The call shown in the interactions panel
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DisplayCall {
    /// Remote party's number
    pub number: String,
    /// Inbound or outbound
    pub direction: CallDirection,
    /// Seconds since connect, from the last tick
    pub secs: u64,
    /// Microphone muted
    pub muted: bool,
    /// On hold
    pub on_hold: bool,
}

impl DisplayCall {
    /// Elapsed time as `mm:ss`
    pub fn elapsed(&self) -> String {
        format_duration(self.secs)
    }
}

/// One row of the activity log, already formatted
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HistoryRow {
    /// Phone number
    pub number: String,
    /// Inbound / Outbound
    pub call_type: &'static str,
    /// `hh:mm AM` or `Mon d, hh:mm AM`
    pub received: String,
    /// Answered / Declined
    pub call_status: &'static str,
    /// `mm:ss`
    pub duration: String,
}

/// A notification to display
#[derive(Clone, Debug, PartialEq)]
pub struct DisplayNotification {
    /// Notification level
    pub level: NotifyLevel,
    /// Optional title
    pub title: Option<String>,
    /// Message content
    pub message: String,
    /// Time left on screen
    pub remaining: Duration,
}

impl DisplayNotification {
    /// Title and message on one line
    pub fn text(&self) -> String {
        match &self.title {
            Some(title) => format!("{title}: {}", self.message),
            None => self.message.clone(),
        }
    }
}

/// The full display state for the TUI
#[derive(Debug)]
pub struct DisplayState {
    /// Agent display name
    pub agent_name: String,
    /// Session info
    pub session_id: Option<SessionId>,
    /// Backing store name
    pub store_name: String,
    /// Current status
    pub status: AgentStatus,
    /// Status before the last change
    pub previous: Option<AgentStatus>,
    /// Status held when the last call started
    pub before_call: Option<AgentStatus>,
    /// Seconds in the current status
    pub status_secs: u64,
    /// Seconds since sign-in
    pub session_secs: u64,
    /// Accumulated seconds per status
    pub durations: StatusDurations,
    /// Calls answered or dialed
    pub calls_handled: u32,
    /// Shared "now" from the last tick
    pub now: DateTime<Utc>,
    /// Ringing caller, if any
    pub incoming: Option<String>,
    /// Connected call, if any
    pub active: Option<DisplayCall>,
    /// Dialer contents
    pub dialer: String,
    /// Recent calls, newest first
    pub history: Vec<CallRecord>,
    /// Activity log capacity
    pub history_limit: usize,
    /// Whether the store is failing
    pub store_degraded: bool,
    /// What the store last failed on
    pub store_detail: Option<String>,
    /// Pending notification (if any)
    pub notification: Option<DisplayNotification>,
    /// Set once the console confirmed sign-out
    pub signed_out: bool,
    /// Set once the console asked the surface to close
    pub quit: bool,
}

impl Default for DisplayState {
    fn default() -> Self {
        Self {
            agent_name: String::new(),
            session_id: None,
            store_name: String::new(),
            status: AgentStatus::Available,
            previous: None,
            before_call: None,
            status_secs: 0,
            session_secs: 0,
            durations: StatusDurations::default(),
            calls_handled: 0,
            now: Utc::now(),
            incoming: None,
            active: None,
            dialer: String::new(),
            history: Vec::new(),
            history_limit: 0,
            store_degraded: false,
            store_detail: None,
            notification: None,
            signed_out: false,
            quit: false,
        }
    }
}

impl DisplayState {
    /// Create a new display state
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply a ConsoleMessage to update display state
    pub fn apply_message(&mut self, msg: ConsoleMessage) {
        match msg {
            // Session
            ConsoleMessage::SessionInfo {
                session_id,
                agent_name,
                store_name,
                status,
                history_limit,
            } => {
                self.session_id = Some(session_id);
                self.agent_name = agent_name;
                self.store_name = store_name;
                self.status = status;
                self.history_limit = history_limit;
            }
            ConsoleMessage::Tick {
                now,
                session_secs,
                status_secs,
                call_secs,
                durations,
                calls_handled,
            } => {
                self.now = now;
                self.session_secs = session_secs;
                self.status_secs = status_secs;
                self.durations = durations;
                self.calls_handled = calls_handled;
                if let (Some(call), Some(secs)) = (self.active.as_mut(), call_secs) {
                    call.secs = secs;
                }
            }

            // Status
            ConsoleMessage::StatusChanged {
                status,
                previous,
                before_call,
            } => {
                self.status = status;
                self.previous = Some(previous);
                self.before_call = before_call;
                self.status_secs = 0;
            }

            // Calls
            ConsoleMessage::IncomingCall { number } => {
                self.incoming = Some(number);
            }
            ConsoleMessage::IncomingCleared => {
                self.incoming = None;
            }
            ConsoleMessage::CallStarted { number, direction } => {
                self.active = Some(DisplayCall {
                    number,
                    direction,
                    secs: 0,
                    muted: false,
                    on_hold: false,
                });
            }
            ConsoleMessage::CallControls { muted, on_hold } => {
                if let Some(call) = self.active.as_mut() {
                    call.muted = muted;
                    call.on_hold = on_hold;
                }
            }
            ConsoleMessage::CallEnded { .. } => {
                self.active = None;
            }
            ConsoleMessage::DialerUpdated { text } => {
                self.dialer = text;
            }
            ConsoleMessage::HistoryUpdated { records } => {
                self.history = records;
            }

            // Store
            ConsoleMessage::StoreHealth { degraded, detail } => {
                self.store_degraded = degraded;
                self.store_detail = detail;
            }

            // System
            ConsoleMessage::Notify {
                level,
                title,
                message,
            } => {
                self.notify(level, title, message);
            }
            ConsoleMessage::SignedOut { agent_name } => {
                self.signed_out = true;
                self.notify(
                    NotifyLevel::Info,
                    None,
                    format!("{agent_name} signed out"),
                );
            }
            ConsoleMessage::Quit { message } => {
                self.quit = true;
                if let Some(msg) = message {
                    self.notify(NotifyLevel::Info, Some("Goodbye".to_string()), msg);
                }
            }
        }
    }

    fn notify(&mut self, level: NotifyLevel, title: Option<String>, message: String) {
        self.notification = Some(DisplayNotification {
            level,
            title,
            message,
            remaining: NOTIFICATION_TTL,
        });
    }

    /// Update timers
    pub fn update(&mut self, delta: Duration) {
        if let Some(notification) = self.notification.as_mut() {
            notification.remaining = notification.remaining.saturating_sub(delta);
            if notification.remaining.is_zero() {
                self.notification = None;
            }
        }
    }

    /// Clear the notification
    pub fn clear_notification(&mut self) {
        self.notification = None;
    }

    /// Whether a call is connected
    pub fn has_active_call(&self) -> bool {
        self.active.is_some()
    }

    /// Whether the console reported the end of the session
    pub fn is_finished(&self) -> bool {
        self.signed_out || self.quit
    }

    /// Clock bar readings at the last tick
    pub fn clocks(&self) -> Vec<ZoneReading> {
        clock_bar(self.now)
    }

    /// Activity log rows, received times in local time
    pub fn history_rows(&self) -> Vec<HistoryRow> {
        self.history_rows_at(&self.now.with_timezone(&Local))
    }

    /// Activity log rows relative to a given local "now"
    pub fn history_rows_at<Tz: chrono::TimeZone>(&self, now: &DateTime<Tz>) -> Vec<HistoryRow>
    where
        Tz::Offset: std::fmt::Display,
    {
        self.history
            .iter()
            .map(|record| HistoryRow {
                number: record.phone_number.clone(),
                call_type: record.direction.label(),
                received: format_received(&record.start_time, now),
                call_status: record.disposition.label(),
                duration: record.duration.clone(),
            })
            .collect()
    }

    /// Current-status timer as `mm:ss`
    pub fn status_timer(&self) -> String {
        format_duration(self.status_secs)
    }

    /// Session timer as `mm:ss`
    pub fn session_timer(&self) -> String {
        format_duration(self.session_secs)
    }
}
