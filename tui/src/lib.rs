//! Softphone TUI - Terminal surface for the agent console
//!
//! This crate renders a [`console_core::Console`] in the terminal: four
//! wall clocks, the call card, the activity log, the status panel and a
//! clickable dialer.
//!
//! # Architecture
//!
//! - **ConsoleClient**: Embeds the Console and collects its messages
//! - **DisplayState**: What to draw, derived only from ConsoleMessages
//! - **Input**: Key presses to ConsoleEvents and menu actions
//! - **Layout / Compositor**: Panel rects and z-ordered layers with opaque menus

pub mod app;
pub mod compositor;
pub mod console_client;
pub mod display;
pub mod input;
pub mod layout;
pub mod theme;

pub use app::{App, ExitReason};
pub use console_client::ConsoleClient;
pub use display::DisplayState;
