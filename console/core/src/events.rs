//! Console Events
//!
//! Events sent from a surface to the [`Console`](crate::Console). Surfaces
//! report what the agent did (pressed a key, clicked the keypad); the
//! console decides what that means. An event whose guard does not hold,
//! such as answering with nothing ringing, is ignored.

use serde::{Deserialize, Serialize};

use crate::status::AgentStatus;

/// Events from a surface to the console
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConsoleEvent {
    // ============================================
    // Status
    // ============================================
    /// Agent picked a status from the status menu
    SelectStatus {
        /// Requested status
        status: AgentStatus,
    },

    // ============================================
    // Call Control
    // ============================================
    /// Pick up the ringing call
    AnswerCall,

    /// Reject the ringing call
    DeclineCall,

    /// Dial the number in the dialer
    PlaceCall,

    /// Hang up the active call
    EndCall,

    /// Toggle mute on the active call
    ToggleMute,

    /// Toggle hold on the active call
    ToggleHold,

    // ============================================
    // Dialer
    // ============================================
    /// One character typed or tapped on the keypad
    DialerInput {
        /// The character
        ch: char,
    },

    /// Remove the last dialer character
    DialerBackspace,

    /// Empty the dialer
    DialerClear,

    /// Replace the whole dialer contents
    DialerReplace {
        /// New contents
        text: String,
    },

    // ============================================
    // Session
    // ============================================
    /// Agent asked to sign out
    SignOut,

    /// Surface wants to close
    QuitRequested,
}

impl ConsoleEvent {
    /// Whether this event edits the dialer
    #[must_use]
    pub fn is_dialer_edit(&self) -> bool {
        matches!(
            self,
            Self::DialerInput { .. }
                | Self::DialerBackspace
                | Self::DialerClear
                | Self::DialerReplace { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dialer_edits() {
        assert!(ConsoleEvent::DialerInput { ch: '5' }.is_dialer_edit());
        assert!(ConsoleEvent::DialerClear.is_dialer_edit());
        assert!(!ConsoleEvent::PlaceCall.is_dialer_edit());
        assert!(!ConsoleEvent::SelectStatus {
            status: AgentStatus::Break
        }
        .is_dialer_edit());
    }
}
