//! Console Client
//!
//! Thin wrapper around the Console for TUI integration.
//! This client embeds the Console directly (no network) and provides
//! a convenient interface for sending events and receiving messages.
//!
//! # Architecture
//!
//! The TUI is a "thin client" - it doesn't contain any business logic.
//! All call and status handling happens in the Console. The TUI's job is:
//! 1. Convert terminal events to ConsoleEvents
//! 2. Send ConsoleEvents to the Console
//! 3. Receive ConsoleMessages
//! 4. Render display state based on messages

use tokio::sync::mpsc;

use console_core::{
    Background, CallStore, ConfigError, Console, ConsoleConfig, ConsoleError, ConsoleEvent,
    ConsoleMessage, MemoryStore, RestStore,
};

/// Capacity of the Console -> TUI channel
pub const MESSAGE_CAPACITY: usize = 256;

/// Client for communicating with the embedded Console
pub struct ConsoleClient {
    /// The embedded Console instance
    console: Console<Box<dyn CallStore>>,
    /// Receiver for messages from the Console
    rx: mpsc::Receiver<ConsoleMessage>,
}

impl ConsoleClient {
    /// Create a client for `config`
    ///
    /// With `offline` set, calls are kept in memory and no store credentials
    /// are needed. Must be called inside a tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the store URL or key is missing.
    pub fn new(config: ConsoleConfig, offline: bool) -> Result<Self, ConfigError> {
        let store: Box<dyn CallStore> = if offline {
            tracing::info!("Running offline with an in-memory call store");
            Box::new(MemoryStore::new())
        } else {
            Box::new(RestStore::from_settings(&config.store)?)
        };
        Ok(Self::with_store(store, config))
    }

    /// Create a client around an explicit store
    pub fn with_store(store: Box<dyn CallStore>, config: ConsoleConfig) -> Self {
        let (tx, rx) = mpsc::channel(MESSAGE_CAPACITY);
        let console = Console::new(store, config, tx);
        Self { console, rx }
    }

    /// Start the Console (announce session, load history)
    pub async fn start(&mut self) -> Result<(), ConsoleError> {
        self.console.start().await
    }

    /// Send a surface event to the Console
    pub async fn send_event(&mut self, event: ConsoleEvent) -> Result<(), ConsoleError> {
        self.console.handle_event(event).await
    }

    /// Notify the Console that the user wants to quit
    pub async fn request_quit(&mut self) -> Result<(), ConsoleError> {
        self.send_event(ConsoleEvent::QuitRequested).await
    }

    /// One-second tick
    pub async fn tick(&mut self) {
        self.console.tick().await;
    }

    /// Wait for the next background result (cancel-safe)
    pub async fn next_background(&mut self) -> Option<Background> {
        self.console.next_background().await
    }

    /// Apply a background result
    pub async fn apply_background(&mut self, background: Background) -> Result<(), ConsoleError> {
        self.console.apply_background(background).await
    }

    /// Wait for queued store writes to finish
    pub async fn settle(&mut self) -> Result<(), ConsoleError> {
        self.console.settle().await
    }

    /// Try to receive a message from the Console (non-blocking)
    pub fn try_recv(&mut self) -> Option<ConsoleMessage> {
        self.rx.try_recv().ok()
    }

    /// Receive all pending messages from the Console (non-blocking)
    pub fn recv_all(&mut self) -> Vec<ConsoleMessage> {
        let mut messages = Vec::new();
        while let Ok(msg) = self.rx.try_recv() {
            messages.push(msg);
        }
        messages
    }

    /// The embedded Console, for read-only queries
    pub fn console(&self) -> &Console<Box<dyn CallStore>> {
        &self.console
    }
}
