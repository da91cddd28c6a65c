//! Theme and Colors
//!
//! The console palette. Status colors follow the tone of each agent status
//! so the status badge, menu and timers agree everywhere.

use console_core::{NotifyLevel, StatusTone};
use ratatui::style::Color;

// ============================================================================
// Status Tones
// ============================================================================

/// Available - ready for calls
pub const TONE_READY: Color = Color::Rgb(46, 204, 113);

/// Tech Issues
pub const TONE_ALERT: Color = Color::Rgb(231, 76, 60);

/// On Call
pub const TONE_ENGAGED: Color = Color::Rgb(52, 120, 246);

/// Out Bound
pub const TONE_OUTBOUND: Color = Color::Rgb(120, 180, 255);

/// Break, Lunch, Personal Time, Gone Home, After Call Work
pub const TONE_AWAY: Color = Color::Rgb(255, 165, 0);

/// Color for a status tone
pub fn tone_color(tone: StatusTone) -> Color {
    match tone {
        StatusTone::Ready => TONE_READY,
        StatusTone::Alert => TONE_ALERT,
        StatusTone::Engaged => TONE_ENGAGED,
        StatusTone::Outbound => TONE_OUTBOUND,
        StatusTone::Away => TONE_AWAY,
    }
}

// ============================================================================
// UI Colors
// ============================================================================

/// Titles and focused borders
pub const ACCENT: Color = Color::Rgb(0, 188, 212);

/// Panel borders
pub const BORDER: Color = Color::Rgb(90, 90, 110);

/// System/dim text
pub const DIM_GRAY: Color = Color::Rgb(100, 100, 100);

/// Regular text
pub const TEXT: Color = Color::Rgb(220, 220, 220);

/// Ringing call highlight
pub const RINGING: Color = Color::Rgb(255, 223, 128);

/// Keypad keys
pub const KEY_FACE: Color = Color::Rgb(60, 60, 80);

/// Error red
pub const ERROR_RED: Color = Color::Rgb(255, 80, 80);

/// Warning amber
pub const WARNING_AMBER: Color = Color::Rgb(255, 191, 0);

/// Success green
pub const SUCCESS_GREEN: Color = Color::Rgb(120, 230, 120);

/// Info blue
pub const INFO_BLUE: Color = Color::Rgb(100, 180, 255);

/// Color for a notification level
pub fn notify_color(level: NotifyLevel) -> Color {
    match level {
        NotifyLevel::Info => INFO_BLUE,
        NotifyLevel::Warning => WARNING_AMBER,
        NotifyLevel::Error => ERROR_RED,
        NotifyLevel::Success => SUCCESS_GREEN,
    }
}
