//! Console Messages
//!
//! Messages sent from the [`Console`](crate::Console) to a surface. The
//! surface keeps no business logic: it renders what these messages say.
//!
//! A [`ConsoleMessage::Tick`] is sent once per second and carries every
//! counter computed from the same instant, so clocks, status timers and the
//! call timer never drift apart on screen.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::call::{CallDirection, CallRecord};
use crate::status::{AgentStatus, StatusDurations};

/// Unique identifier for a console session
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub String);

impl SessionId {
    /// Generate a new session ID
    #[must_use]
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Messages from the console to a surface
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum ConsoleMessage {
    // ============================================
    // Session
    // ============================================
    /// Sent once at start-up
    SessionInfo {
        /// Session identifier
        session_id: SessionId,
        /// Agent display name
        agent_name: String,
        /// Backing store name (`rest`, `memory`, ...)
        store_name: String,
        /// Status at start-up
        status: AgentStatus,
        /// Records kept in the activity log
        history_limit: usize,
    },

    /// Once-per-second counters, all computed from `now`
    Tick {
        /// Shared wall-clock instant
        now: DateTime<Utc>,
        /// Seconds since the session started
        session_secs: u64,
        /// Seconds in the current status
        status_secs: u64,
        /// Seconds on the active call, if any
        call_secs: Option<u64>,
        /// Accumulated seconds per status
        durations: StatusDurations,
        /// Calls answered or dialed this session
        calls_handled: u32,
    },

    // ============================================
    // Status
    // ============================================
    /// The agent's status changed
    StatusChanged {
        /// New status
        status: AgentStatus,
        /// Status that was left
        previous: AgentStatus,
        /// Status held when the last call started
        before_call: Option<AgentStatus>,
    },

    // ============================================
    // Calls
    // ============================================
    /// A call is ringing
    IncomingCall {
        /// Caller's number
        number: String,
    },

    /// The ringing call was answered or declined
    IncomingCleared,

    /// A call connected
    CallStarted {
        /// Remote party's number
        number: String,
        /// Inbound or outbound
        direction: CallDirection,
    },

    /// Mute or hold changed on the active call
    CallControls {
        /// Microphone muted
        muted: bool,
        /// Call on hold
        on_hold: bool,
    },

    /// The active call ended
    CallEnded {
        /// Remote party's number
        number: String,
        /// Talk time as `mm:ss`
        duration: String,
    },

    /// Dialer contents changed
    DialerUpdated {
        /// Current contents
        text: String,
    },

    /// Fresh activity log, newest first
    HistoryUpdated {
        /// Recent records
        records: Vec<CallRecord>,
    },

    // ============================================
    // Store
    // ============================================
    /// Store reachability changed
    StoreHealth {
        /// Whether the last store operation failed
        degraded: bool,
        /// What failed, when degraded
        detail: Option<String>,
    },

    // ============================================
    // System
    // ============================================
    /// Show a notification
    Notify {
        /// Notification level
        level: NotifyLevel,
        /// Optional title
        title: Option<String>,
        /// Notification message
        message: String,
    },

    /// The agent signed out; the surface should exit
    SignedOut {
        /// Agent display name
        agent_name: String,
    },

    /// The surface should close
    Quit {
        /// Optional goodbye message
        message: Option<String>,
    },
}

impl ConsoleMessage {
    /// Whether the surface should stop after handling this message
    #[must_use]
    pub fn ends_session(&self) -> bool {
        matches!(self, Self::SignedOut { .. } | Self::Quit { .. })
    }
}

/// Notification levels
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum NotifyLevel {
    /// Informational
    Info,
    /// Warning
    Warning,
    /// Error
    Error,
    /// Success
    Success,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_id_unique() {
        let id1 = SessionId::new();
        let id2 = SessionId::new();
        assert_ne!(id1, id2);
        assert!(!id1.0.is_empty());
    }

    #[test]
    fn test_ends_session() {
        assert!(ConsoleMessage::Quit { message: None }.ends_session());
        assert!(ConsoleMessage::SignedOut {
            agent_name: "Dana".to_string()
        }
        .ends_session());
        assert!(!ConsoleMessage::IncomingCleared.ends_session());
    }
}
