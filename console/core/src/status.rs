//! Agent Status Engine
//!
//! Tracks the agent's current work state, the time spent in it, and the
//! accumulated time per state for the whole session.
//!
//! Two entry points change the status:
//! - [`StatusEngine::select`]: the manual path used by the status menu.
//!   Only [`AgentStatus::SELECTABLE`] states are accepted.
//! - [`StatusEngine::set_status`]: the programmatic path used by the call
//!   lifecycle. Unconditional.
//!
//! "On Call" is only ever entered through [`StatusEngine::enter_call`] and
//! left through [`StatusEngine::leave_call`].

use serde::{Deserialize, Serialize};

use crate::error::ConsoleError;

/// The agent's work/availability state
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AgentStatus {
    /// Ready to take calls
    Available,
    /// Short break
    Break,
    /// Lunch break
    Lunch,
    /// Personal time away
    PersonalTime,
    /// Blocked by a technical problem
    TechIssues,
    /// Done for the day
    GoneHome,
    /// Wrapping up after a call
    AfterCallWork,
    /// Talking to a caller
    OnCall,
    /// Working outbound calls
    OutBound,
}

/// Visual tone of a status, used by surfaces to pick colors
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum StatusTone {
    /// Ready for work (green)
    Ready,
    /// Something is wrong (red)
    Alert,
    /// On a live call (blue)
    Engaged,
    /// Outbound work (light blue)
    Outbound,
    /// Any other away state (orange)
    Away,
}

impl AgentStatus {
    /// Every status, in display order
    pub const ALL: [AgentStatus; 9] = [
        Self::Available,
        Self::Break,
        Self::Lunch,
        Self::PersonalTime,
        Self::TechIssues,
        Self::GoneHome,
        Self::AfterCallWork,
        Self::OnCall,
        Self::OutBound,
    ];

    /// Statuses offered in the status menu
    pub const SELECTABLE: [AgentStatus; 8] = [
        Self::Available,
        Self::Break,
        Self::Lunch,
        Self::PersonalTime,
        Self::TechIssues,
        Self::GoneHome,
        Self::AfterCallWork,
        Self::OutBound,
    ];

    /// Human-readable label
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Available => "Available",
            Self::Break => "Break",
            Self::Lunch => "Lunch",
            Self::PersonalTime => "Personal Time",
            Self::TechIssues => "Tech Issues",
            Self::GoneHome => "Gone Home",
            Self::AfterCallWork => "After Call Work",
            Self::OnCall => "On Call",
            Self::OutBound => "Out Bound",
        }
    }

    /// Parse a status from its label (case-insensitive)
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|status| status.label().eq_ignore_ascii_case(wanted))
    }

    /// Whether the agent may pick this status from the menu
    #[must_use]
    pub fn is_selectable(&self) -> bool {
        !matches!(self, Self::OnCall)
    }

    /// Whether signing out is allowed while in this status
    #[must_use]
    pub fn allows_sign_out(&self) -> bool {
        matches!(self, Self::GoneHome)
    }

    /// Color tone for this status
    #[must_use]
    pub fn tone(&self) -> StatusTone {
        match self {
            Self::Available => StatusTone::Ready,
            Self::TechIssues => StatusTone::Alert,
            Self::OnCall => StatusTone::Engaged,
            Self::OutBound => StatusTone::Outbound,
            _ => StatusTone::Away,
        }
    }

    fn index(self) -> usize {
        match self {
            Self::Available => 0,
            Self::Break => 1,
            Self::Lunch => 2,
            Self::PersonalTime => 3,
            Self::TechIssues => 4,
            Self::GoneHome => 5,
            Self::AfterCallWork => 6,
            Self::OnCall => 7,
            Self::OutBound => 8,
        }
    }
}

impl std::fmt::Display for AgentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Accumulated seconds per status for the session
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusDurations([u64; 9]);

impl StatusDurations {
    /// Seconds accumulated in `status`
    #[must_use]
    pub fn get(&self, status: AgentStatus) -> u64 {
        self.0[status.index()]
    }

    /// Seconds accumulated across all statuses
    #[must_use]
    pub fn total(&self) -> u64 {
        self.0.iter().sum()
    }

    /// Iterate `(status, seconds)` in display order
    pub fn iter(&self) -> impl Iterator<Item = (AgentStatus, u64)> + '_ {
        AgentStatus::ALL.into_iter().map(|s| (s, self.get(s)))
    }

    fn add_second(&mut self, status: AgentStatus) {
        self.0[status.index()] += 1;
    }
}

/// A status transition that actually happened
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StatusChange {
    /// Status before the transition
    pub from: AgentStatus,
    /// Status after the transition
    pub to: AgentStatus,
}

/// Owns the current status and its time accounting
#[derive(Clone, Debug)]
pub struct StatusEngine {
    current: AgentStatus,
    /// Seconds since the last transition
    in_status: u64,
    durations: StatusDurations,
    before_call: Option<AgentStatus>,
}

impl Default for StatusEngine {
    fn default() -> Self {
        Self::new(AgentStatus::Available)
    }
}

impl StatusEngine {
    /// Create an engine starting in `initial`
    #[must_use]
    pub fn new(initial: AgentStatus) -> Self {
        Self {
            current: initial,
            in_status: 0,
            durations: StatusDurations::default(),
            before_call: None,
        }
    }

    /// The active status
    #[must_use]
    pub fn current(&self) -> AgentStatus {
        self.current
    }

    /// Seconds spent in the active status since the last change
    #[must_use]
    pub fn seconds_in_status(&self) -> u64 {
        self.in_status
    }

    /// Accumulated time per status
    #[must_use]
    pub fn durations(&self) -> &StatusDurations {
        &self.durations
    }

    /// Status that was active when the last call started
    #[must_use]
    pub fn status_before_call(&self) -> Option<AgentStatus> {
        self.before_call
    }

    /// Transition unconditionally
    ///
    /// Returns `None` when `new` is already active; the status timer is
    /// only reset by a real change.
    pub fn set_status(&mut self, new: AgentStatus) -> Option<StatusChange> {
        if new == self.current {
            return None;
        }
        let change = StatusChange {
            from: self.current,
            to: new,
        };
        self.current = new;
        self.in_status = 0;
        Some(change)
    }

    /// Transition from the status menu
    ///
    /// # Errors
    ///
    /// Returns [`ConsoleError::NotSelectable`] for "On Call".
    pub fn select(&mut self, new: AgentStatus) -> Result<Option<StatusChange>, ConsoleError> {
        if !new.is_selectable() {
            return Err(ConsoleError::NotSelectable(new));
        }
        Ok(self.set_status(new))
    }

    /// Remember the current status and switch to On Call
    pub fn enter_call(&mut self) -> Option<StatusChange> {
        self.before_call = Some(self.current);
        self.set_status(AgentStatus::OnCall)
    }

    /// Leave a call; always lands in After Call Work
    pub fn leave_call(&mut self) -> Option<StatusChange> {
        self.set_status(AgentStatus::AfterCallWork)
    }

    /// Advance one second
    pub fn tick(&mut self) {
        self.in_status += 1;
        self.durations.add_second(self.current);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_labels_round_trip_through_parse() {
        for status in AgentStatus::ALL {
            assert_eq!(AgentStatus::parse(status.label()), Some(status));
        }
        assert_eq!(AgentStatus::parse("  gone home "), Some(AgentStatus::GoneHome));
        assert_eq!(AgentStatus::parse("Coffee"), None);
    }

    #[test]
    fn test_on_call_is_not_selectable() {
        assert!(!AgentStatus::SELECTABLE.contains(&AgentStatus::OnCall));
        assert_eq!(AgentStatus::SELECTABLE.len(), 8);

        let mut engine = StatusEngine::default();
        let err = engine.select(AgentStatus::OnCall).unwrap_err();
        assert!(matches!(err, ConsoleError::NotSelectable(AgentStatus::OnCall)));
        assert_eq!(engine.current(), AgentStatus::Available);
    }

    #[test]
    fn test_status_timer_resets_on_every_change() {
        let mut engine = StatusEngine::default();
        let sequence = [
            AgentStatus::Break,
            AgentStatus::Lunch,
            AgentStatus::Available,
            AgentStatus::TechIssues,
            AgentStatus::OutBound,
            AgentStatus::GoneHome,
        ];

        for (i, status) in sequence.into_iter().enumerate() {
            for _ in 0..=i {
                engine.tick();
            }
            assert!(engine.seconds_in_status() > 0);

            let change = engine.select(status).unwrap();
            assert!(change.is_some());
            assert_eq!(engine.current(), status);
            assert_eq!(engine.seconds_in_status(), 0);
        }
    }

    #[test]
    fn test_reselecting_same_status_keeps_timer() {
        let mut engine = StatusEngine::default();
        engine.tick();
        engine.tick();

        assert_eq!(engine.select(AgentStatus::Available).unwrap(), None);
        assert_eq!(engine.seconds_in_status(), 2);
    }

    #[test]
    fn test_only_current_status_accumulates() {
        let mut engine = StatusEngine::default();
        engine.tick();
        engine.tick();
        engine.select(AgentStatus::Break).unwrap();
        engine.tick();

        let durations = engine.durations();
        assert_eq!(durations.get(AgentStatus::Available), 2);
        assert_eq!(durations.get(AgentStatus::Break), 1);
        assert_eq!(durations.get(AgentStatus::Lunch), 0);
        assert_eq!(durations.total(), 3);

        // Returning keeps the earlier total
        engine.select(AgentStatus::Available).unwrap();
        engine.tick();
        assert_eq!(engine.durations().get(AgentStatus::Available), 3);
    }

    #[test]
    fn test_call_end_forces_after_call_work() {
        let mut engine = StatusEngine::new(AgentStatus::OutBound);

        let entered = engine.enter_call().unwrap();
        assert_eq!(entered.from, AgentStatus::OutBound);
        assert_eq!(engine.current(), AgentStatus::OnCall);
        assert_eq!(engine.status_before_call(), Some(AgentStatus::OutBound));

        let left = engine.leave_call().unwrap();
        assert_eq!(left.to, AgentStatus::AfterCallWork);
        assert_eq!(engine.current(), AgentStatus::AfterCallWork);
    }

    #[test]
    fn test_tones_and_sign_out() {
        assert_eq!(AgentStatus::Available.tone(), StatusTone::Ready);
        assert_eq!(AgentStatus::TechIssues.tone(), StatusTone::Alert);
        assert_eq!(AgentStatus::OnCall.tone(), StatusTone::Engaged);
        assert_eq!(AgentStatus::OutBound.tone(), StatusTone::Outbound);
        assert_eq!(AgentStatus::Lunch.tone(), StatusTone::Away);

        assert!(AgentStatus::GoneHome.allows_sign_out());
        assert!(!AgentStatus::Available.allows_sign_out());
    }
}
