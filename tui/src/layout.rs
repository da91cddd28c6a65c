//! Screen Layout
//!
//! Splits the terminal into the console's panels. The keypad geometry lives
//! here too so that rendering and mouse hit-testing use the same rects.

use console_core::KEYPAD;
use ratatui::layout::{Constraint, Layout, Rect};

/// Width of the right-hand column (status + dialer)
pub const SIDE_WIDTH: u16 = 30;

/// Height of the interactions panel
pub const INTERACTIONS_HEIGHT: u16 = 6;

/// Height of the dialer panel (border, number, gap, four key rows, border)
pub const DIALER_HEIGHT: u16 = 8;

/// Width of a single keypad key
pub const KEY_WIDTH: u16 = 5;

const KEY_STRIDE: u16 = 6;
const KEYPAD_INSET: u16 = 2;
const KEYPAD_TOP: u16 = 2;

/// Rects for every panel on screen
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ScreenLayout {
    /// Whole terminal
    pub area: Rect,
    /// Four wall clocks
    pub clock: Rect,
    /// Title and agent name
    pub header: Rect,
    /// Incoming / active call card
    pub interactions: Rect,
    /// Call history table
    pub activity: Rect,
    /// Status, timers and per-status totals
    pub status: Rect,
    /// Dialer buffer and keypad
    pub dialer: Rect,
    /// Key hints or the current notification
    pub footer: Rect,
    /// Status picker overlay
    pub status_menu: Rect,
    /// User menu overlay
    pub user_menu: Rect,
}

impl ScreenLayout {
    /// Compute the layout for a terminal area
    pub fn compute(area: Rect) -> Self {
        let [clock, header, body, footer] = Layout::vertical([
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .areas(area);

        let [left, right] =
            Layout::horizontal([Constraint::Min(0), Constraint::Length(SIDE_WIDTH)]).areas(body);

        let [interactions, activity] =
            Layout::vertical([Constraint::Length(INTERACTIONS_HEIGHT), Constraint::Min(0)])
                .areas(left);

        let [status, dialer] =
            Layout::vertical([Constraint::Min(0), Constraint::Length(DIALER_HEIGHT)]).areas(right);

        Self {
            area,
            clock,
            header,
            interactions,
            activity,
            status,
            dialer,
            footer,
            status_menu: centered(area, 30, 10),
            user_menu: centered(area, 34, 5),
        }
    }

    /// Screen rect of the keypad key at `row`, `col`
    pub fn key_rect(&self, row: usize, col: usize) -> Rect {
        // Both indices are bounded by the 4x3 keypad
        let row = u16::try_from(row).unwrap_or(u16::MAX);
        let col = u16::try_from(col).unwrap_or(u16::MAX);
        Rect::new(
            self.dialer
                .x
                .saturating_add(1 + KEYPAD_INSET)
                .saturating_add(col.saturating_mul(KEY_STRIDE)),
            self.dialer
                .y
                .saturating_add(1 + KEYPAD_TOP)
                .saturating_add(row),
            KEY_WIDTH,
            1,
        )
    }

    /// Keypad key under a screen position, if any
    pub fn keypad_key_at(&self, x: u16, y: u16) -> Option<char> {
        for (row, keys) in KEYPAD.iter().enumerate() {
            for (col, key) in keys.iter().enumerate() {
                let rect = self.key_rect(row, col);
                let inside_dialer = self.dialer.intersection(rect) == rect;
                if inside_dialer
                    && x >= rect.x
                    && x < rect.x + rect.width
                    && y == rect.y
                {
                    return Some(*key);
                }
            }
        }
        None
    }
}

/// A `width` x `height` rect centered in `area`, clamped to fit
fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect::new(
        area.x + (area.width - width) / 2,
        area.y + (area.height - height) / 2,
        width,
        height,
    )
}
