//! Console Core - Headless Agent Console for a Simulated Softphone
//!
//! This crate provides the state machine behind a call-center agent
//! console, completely independent of any UI framework: agent status and
//! time accounting, a simulated call lifecycle, the dialer, wall clocks and
//! a call history kept in an external record store.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                         Surface (TUI)                         │
//! │                              │                                │
//! │                    ConsoleEvent (up)                          │
//! │                   ConsoleMessage (down)                       │
//! └──────────────────────────────┼────────────────────────────────┘
//!                                │
//! ┌──────────────────────────────┼────────────────────────────────┐
//! │                         CONSOLE CORE                          │
//! │  ┌───────────────────────────┴─────────────────────────────┐  │
//! │  │                         Console                          │  │
//! │  │  ┌──────────┐  ┌──────────┐  ┌─────────┐  ┌───────────┐ │  │
//! │  │  │  Status  │  │   Call   │  │ Dialer  │  │  History  │ │  │
//! │  │  │  Engine  │  │ Lifecycle│  │         │  │           │ │  │
//! │  │  └──────────┘  └──────────┘  └─────────┘  └─────┬─────┘ │  │
//! │  └─────────────────────────────────────────────────┼───────┘  │
//! │                                          StoreWorker (FIFO)    │
//! │                                                    │           │
//! │                                  CallStore (REST / memory)     │
//! └────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Key Types
//!
//! - [`Console`]: Owns all agent state and drives it
//! - [`ConsoleEvent`]: Events sent from a surface to the Console
//! - [`ConsoleMessage`]: Messages sent from the Console to a surface
//! - [`CallStore`]: Record store abstraction ([`RestStore`], [`MemoryStore`])
//! - [`ConsoleConfig`]: Layered configuration (file, environment, CLI)
//!
//! # Quick Start
//!
//! ```ignore
//! use console_core::{Console, ConsoleEvent, MemoryStore, load_config};
//! use tokio::sync::mpsc;
//!
//! #[tokio::main]
//! async fn main() {
//!     let (tx, mut rx) = mpsc::channel(100);
//!     let config = load_config().unwrap();
//!     let mut console = Console::new(MemoryStore::new(), config, tx);
//!     console.start().await.unwrap();
//!
//!     let mut ticker = tokio::time::interval(std::time::Duration::from_secs(1));
//!     loop {
//!         tokio::select! {
//!             _ = ticker.tick() => console.tick().await,
//!             Some(bg) = console.next_background() => {
//!                 console.apply_background(bg).await.unwrap();
//!             }
//!         }
//!         while let Ok(msg) = rx.try_recv() {
//!             // Render message
//!         }
//!     }
//! }
//! ```
//!
//! # Module Overview
//!
//! - [`console`]: Main Console struct
//! - [`status`]: Agent status engine and per-status durations
//! - [`call`]: Call records and transient call state
//! - [`dialer`]: Dialer buffer and keypad
//! - [`history`]: Capped, generation-checked call history
//! - [`clock`]: US timezone wall clocks
//! - [`store`]: Record store trait and implementations
//! - [`worker`]: Ordered background store worker
//! - [`timer`]: Cancel-on-drop timers
//! - [`events`] / [`messages`]: The surface protocol
//! - [`config`]: Configuration loading
//!
//! # No TUI Dependencies
//!
//! This crate has no dependency on ratatui, crossterm, or any other UI
//! framework.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod call;
pub mod clock;
pub mod config;
pub mod console;
pub mod dialer;
pub mod error;
pub mod events;
pub mod history;
pub mod messages;
pub mod status;
pub mod store;
pub mod timer;
pub mod worker;

pub use call::{
    format_duration, ActiveCall, CallDirection, CallDisposition, CallPhase, CallRecord,
    IncomingCall, NewCallRecord, RecordId,
};
pub use clock::{clock_bar, UsTimeZone, ZoneReading};
pub use config::{
    default_config_path, load_config, load_config_from_path, load_config_with_env, ConfigError,
    ConfigOverrides, ConfigSource, ConsoleConfig, StoreSettings,
};
pub use console::{Background, Console};
pub use dialer::{is_dial_char, DialerBuffer, KEYPAD};
pub use error::{ConsoleError, StoreError};
pub use events::ConsoleEvent;
pub use history::{format_received, CallHistory, RefreshTicket};
pub use messages::{ConsoleMessage, NotifyLevel, SessionId};
pub use status::{AgentStatus, StatusChange, StatusDurations, StatusEngine, StatusTone};
pub use store::{CallStore, MemoryStore, RestStore};
pub use worker::{StoreJob, StoreOutcome, StoreWorker};
