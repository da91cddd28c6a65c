//! Input Mapping
//!
//! Turns terminal key presses into console events or local UI actions.
//! Everything here is pure so it can be tested without a terminal.

use console_core::{is_dial_char, AgentStatus, ConsoleEvent};
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

/// Which part of the UI has the keyboard
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Mode {
    /// Panels and dialer
    #[default]
    Normal,
    /// Status picker open, `selected` indexes [`AgentStatus::SELECTABLE`]
    StatusMenu {
        /// Highlighted entry
        selected: usize,
    },
    /// User menu open
    UserMenu,
}

impl Mode {
    /// Whether an overlay is open
    pub fn is_menu(&self) -> bool {
        !matches!(self, Mode::Normal)
    }
}

/// What a key press means in the current mode
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Action {
    /// Forward to the console
    Console(ConsoleEvent),
    /// Open the status picker
    OpenStatusMenu,
    /// Open the user menu
    OpenUserMenu,
    /// Move the highlight up
    MenuUp,
    /// Move the highlight down
    MenuDown,
    /// Confirm the highlighted entry
    MenuSelect,
    /// Close the open menu
    CloseMenu,
    /// Leave the application
    Quit,
}

/// Result of applying an action to the UI
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Intent {
    /// Send this event to the console
    Console(ConsoleEvent),
    /// Exit the application
    Quit,
}

/// Map a key press to an action
///
/// `call_active` disables the dialer keys while a call is connected.
pub fn map_key(mode: Mode, key: KeyEvent, call_active: bool) -> Option<Action> {
    if key.kind == KeyEventKind::Release {
        return None;
    }

    if key.modifiers.contains(KeyModifiers::CONTROL) {
        return match key.code {
            KeyCode::Char('c') => Some(Action::Quit),
            _ => None,
        };
    }

    match mode {
        Mode::Normal => map_normal(key.code, call_active),
        Mode::StatusMenu { .. } => match key.code {
            KeyCode::Up | KeyCode::Char('k') => Some(Action::MenuUp),
            KeyCode::Down | KeyCode::Char('j') => Some(Action::MenuDown),
            KeyCode::Enter => Some(Action::MenuSelect),
            KeyCode::Esc | KeyCode::Char('s') => Some(Action::CloseMenu),
            _ => None,
        },
        Mode::UserMenu => match key.code {
            KeyCode::Enter => Some(Action::MenuSelect),
            KeyCode::Esc | KeyCode::Char('u') => Some(Action::CloseMenu),
            _ => None,
        },
    }
}

fn map_normal(code: KeyCode, call_active: bool) -> Option<Action> {
    let event = match code {
        KeyCode::Esc => return Some(Action::Quit),
        KeyCode::Char('s') => return Some(Action::OpenStatusMenu),
        KeyCode::Char('u') => return Some(Action::OpenUserMenu),
        KeyCode::Char('a') => ConsoleEvent::AnswerCall,
        KeyCode::Char('d') => ConsoleEvent::DeclineCall,
        KeyCode::Char('m') => ConsoleEvent::ToggleMute,
        KeyCode::Char('h') => ConsoleEvent::ToggleHold,
        KeyCode::Char('e') => ConsoleEvent::EndCall,
        KeyCode::Char('c') => ConsoleEvent::DialerClear,
        KeyCode::Char(ch) if is_dial_char(ch) && !call_active => ConsoleEvent::DialerInput { ch },
        KeyCode::Backspace if !call_active => ConsoleEvent::DialerBackspace,
        KeyCode::Enter if !call_active => ConsoleEvent::PlaceCall,
        _ => return None,
    };
    Some(Action::Console(event))
}

/// Apply an action, returning the next mode and what to do about it
///
/// `current` is the agent's status, used to preselect it in the picker.
pub fn step(mode: Mode, action: Action, current: AgentStatus) -> (Mode, Option<Intent>) {
    let options = AgentStatus::SELECTABLE.len();
    match (mode, action) {
        (_, Action::Quit) => (mode, Some(Intent::Quit)),
        (_, Action::Console(event)) => (mode, Some(Intent::Console(event))),
        (Mode::Normal, Action::OpenStatusMenu) => {
            let selected = AgentStatus::SELECTABLE
                .iter()
                .position(|s| *s == current)
                .unwrap_or(0);
            (Mode::StatusMenu { selected }, None)
        }
        (Mode::Normal, Action::OpenUserMenu) => (Mode::UserMenu, None),
        (Mode::StatusMenu { selected }, Action::MenuUp) => (
            Mode::StatusMenu {
                selected: (selected + options - 1) % options,
            },
            None,
        ),
        (Mode::StatusMenu { selected }, Action::MenuDown) => (
            Mode::StatusMenu {
                selected: (selected + 1) % options,
            },
            None,
        ),
        (Mode::StatusMenu { selected }, Action::MenuSelect) => {
            let intent = AgentStatus::SELECTABLE
                .get(selected)
                .map(|status| Intent::Console(ConsoleEvent::SelectStatus { status: *status }));
            (Mode::Normal, intent)
        }
        (Mode::UserMenu, Action::MenuSelect) => {
            (Mode::Normal, Some(Intent::Console(ConsoleEvent::SignOut)))
        }
        (_, Action::CloseMenu) => (Mode::Normal, None),
        (mode, _) => (mode, None),
    }
}
