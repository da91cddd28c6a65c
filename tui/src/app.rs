//! Main Application
//!
//! The App struct manages the TUI lifecycle as a thin display client:
//! - Event loop (keyboard, mouse, resize, one-second tick)
//! - ConsoleClient for all call and status handling
//! - DisplayState for rendering
//!
//! The App:
//! 1. Converts terminal events to ConsoleEvents
//! 2. Sends events to the embedded Console via ConsoleClient
//! 3. Receives ConsoleMessages and updates DisplayState
//! 4. Renders based on DisplayState

use std::time::{Duration, Instant};

use console_core::{format_duration, AgentStatus, ConsoleEvent, ConsoleMessage, KEYPAD};
use crossterm::event::{
    Event, EventStream, KeyEvent, KeyEventKind, MouseButton, MouseEvent, MouseEventKind,
};
use futures::StreamExt;
use ratatui::backend::Backend;
use ratatui::layout::{Alignment, Constraint, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Row, Table, Widget};
use ratatui::Terminal;
use tokio::time::MissedTickBehavior;
use unicode_width::UnicodeWidthStr;

use crate::compositor::{Compositor, LayerId};
use crate::console_client::ConsoleClient;
use crate::display::DisplayState;
use crate::input::{map_key, step, Intent, Mode};
use crate::layout::ScreenLayout;
use crate::theme::{
    notify_color, tone_color, ACCENT, BORDER, DIM_GRAY, ERROR_RED, KEY_FACE, RINGING, TEXT,
};

/// One tick of the console clock
const TICK: Duration = Duration::from_secs(1);

/// How long to wait for queued store writes on exit
const SETTLE_TIMEOUT: Duration = Duration::from_secs(2);

const TITLE: &str = " Softphone Console ";

/// Why the app stopped
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExitReason {
    /// The user quit
    Quit,
    /// The agent signed out
    SignedOut,
}

/// Main application state
pub struct App {
    // === Core State ===
    /// Is the app still running?
    running: bool,
    /// Why the loop stopped
    exit: ExitReason,

    // === Console Integration ===
    /// Client for communicating with the embedded Console
    client: ConsoleClient,
    /// Display state derived from ConsoleMessages
    display: DisplayState,

    // === UI Components ===
    /// The layered compositor
    compositor: Compositor,
    /// Layer assignments
    layers: AppLayers,
    /// Panel rects for the current terminal size
    layout: ScreenLayout,
    /// Which overlay has the keyboard
    mode: Mode,

    /// Last frame time (for notification expiry)
    last_frame: Instant,
}

/// Layer IDs for UI regions
struct AppLayers {
    clock: LayerId,
    header: LayerId,
    interactions: LayerId,
    activity: LayerId,
    status: LayerId,
    dialer: LayerId,
    footer: LayerId,
    status_menu: LayerId,
    user_menu: LayerId,
}

impl App {
    /// Create a new App for a terminal of `area`
    pub fn new(client: ConsoleClient, area: Rect) -> Self {
        let layout = ScreenLayout::compute(area);
        let mut compositor = Compositor::new(area);

        let layers = AppLayers {
            clock: compositor.create_layer("clock", layout.clock, 0),
            header: compositor.create_layer("header", layout.header, 0),
            interactions: compositor.create_layer("interactions", layout.interactions, 0),
            activity: compositor.create_layer("activity", layout.activity, 0),
            status: compositor.create_layer("status", layout.status, 0),
            dialer: compositor.create_layer("dialer", layout.dialer, 0),
            footer: compositor.create_layer("footer", layout.footer, 10),
            status_menu: compositor.create_opaque_layer("status_menu", layout.status_menu, 100),
            user_menu: compositor.create_opaque_layer("user_menu", layout.user_menu, 100),
        };
        compositor.set_visible(layers.status_menu, false);
        compositor.set_visible(layers.user_menu, false);

        Self {
            running: true,
            exit: ExitReason::Quit,
            client,
            display: DisplayState::new(),
            compositor,
            layers,
            layout,
            mode: Mode::Normal,
            last_frame: Instant::now(),
        }
    }

    /// Main event loop
    ///
    /// Returns once the user quits or signs out.
    pub async fn run<B: Backend>(
        &mut self,
        terminal: &mut Terminal<B>,
    ) -> anyhow::Result<ExitReason> {
        self.client.start().await?;
        self.process_console_messages();
        self.render(terminal)?;

        let mut event_stream = EventStream::new();
        let mut ticker = tokio::time::interval(TICK);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately
        ticker.tick().await;

        while self.running {
            tokio::select! {
                biased;

                // Terminal events - highest priority
                maybe_event = event_stream.next() => match maybe_event {
                    Some(Ok(event)) => self.handle_terminal_event(event).await,
                    Some(Err(e)) => tracing::warn!("Terminal event error: {}", e),
                    None => self.running = false,
                },

                _ = ticker.tick() => self.client.tick().await,

                Some(background) = self.client.next_background() => {
                    if let Err(e) = self.client.apply_background(background).await {
                        tracing::error!(error = %e, "Failed to apply background result");
                    }
                }
            }

            self.process_console_messages();
            self.update();
            self.render(terminal)?;
        }

        // Let queued store writes land before exiting
        match tokio::time::timeout(SETTLE_TIMEOUT, self.client.settle()).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => tracing::warn!(error = %e, "Store writes not flushed"),
            Err(_) => tracing::warn!("Timed out waiting for store writes"),
        }

        Ok(self.exit)
    }

    /// Process all pending messages from the Console
    fn process_console_messages(&mut self) {
        for msg in self.client.recv_all() {
            if matches!(msg, ConsoleMessage::SignedOut { .. }) {
                self.exit = ExitReason::SignedOut;
            }
            self.display.apply_message(msg);
        }
        if self.display.is_finished() {
            self.running = false;
        }
    }

    async fn send(&mut self, event: ConsoleEvent) {
        if let Err(e) = self.client.send_event(event).await {
            tracing::error!(error = %e, "Console rejected event");
        }
    }

    /// Dispatch a terminal event
    async fn handle_terminal_event(&mut self, event: Event) {
        match event {
            // Only handle Press events (not Release or Repeat)
            Event::Key(key) if key.kind == KeyEventKind::Press => self.handle_key(key).await,
            Event::Mouse(mouse) => self.handle_mouse(mouse).await,
            Event::Resize(w, h) => self.handle_resize(w, h),
            Event::Paste(text) if self.mode == Mode::Normal && !self.display.has_active_call() => {
                let text = format!("{}{}", self.display.dialer, text);
                self.send(ConsoleEvent::DialerReplace { text }).await;
            }
            _ => {}
        }
    }

    /// Handle keyboard input
    async fn handle_key(&mut self, key: KeyEvent) {
        let Some(action) = map_key(self.mode, key, self.display.has_active_call()) else {
            return;
        };

        let (mode, intent) = step(self.mode, action, self.display.status);
        self.mode = mode;

        match intent {
            Some(Intent::Console(event)) => self.send(event).await,
            Some(Intent::Quit) => {
                self.send(ConsoleEvent::QuitRequested).await;
                self.running = false;
            }
            None => {}
        }
    }

    /// Handle mouse input
    async fn handle_mouse(&mut self, mouse: MouseEvent) {
        if mouse.kind != MouseEventKind::Down(MouseButton::Left) || self.mode.is_menu() {
            return;
        }
        if self.compositor.layer_at(mouse.column, mouse.row) != Some(self.layers.dialer) {
            return;
        }
        if let Some(ch) = self.layout.keypad_key_at(mouse.column, mouse.row) {
            self.send(ConsoleEvent::DialerInput { ch }).await;
        }
    }

    /// Handle terminal resize
    fn handle_resize(&mut self, width: u16, height: u16) {
        let area = Rect::new(0, 0, width, height);
        self.layout = ScreenLayout::compute(area);
        self.compositor.resize(area);

        let l = &self.layout;
        let placements = [
            (self.layers.clock, l.clock),
            (self.layers.header, l.header),
            (self.layers.interactions, l.interactions),
            (self.layers.activity, l.activity),
            (self.layers.status, l.status),
            (self.layers.dialer, l.dialer),
            (self.layers.footer, l.footer),
            (self.layers.status_menu, l.status_menu),
            (self.layers.user_menu, l.user_menu),
        ];
        for (id, bounds) in placements {
            self.compositor.set_bounds(id, bounds);
        }
    }

    /// Update timers and overlay visibility
    fn update(&mut self) {
        let now = Instant::now();
        let delta = now - self.last_frame;
        self.last_frame = now;

        self.display.update(delta);

        self.compositor.set_visible(
            self.layers.status_menu,
            matches!(self.mode, Mode::StatusMenu { .. }),
        );
        self.compositor
            .set_visible(self.layers.user_menu, self.mode == Mode::UserMenu);
    }

    // ========================================================================
    // Rendering
    // ========================================================================

    fn render<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> anyhow::Result<()> {
        self.render_clock();
        self.render_header();
        self.render_interactions();
        self.render_activity();
        self.render_status();
        self.render_dialer();
        self.render_footer();
        if self.compositor.is_visible(self.layers.status_menu) {
            self.render_status_menu();
        }
        if self.compositor.is_visible(self.layers.user_menu) {
            self.render_user_menu();
        }

        terminal.draw(|frame| {
            let output = self.compositor.composite();
            let area = frame.area();
            let buf = frame.buffer_mut();

            for y in 0..area.height.min(output.area.height) {
                for x in 0..area.width.min(output.area.width) {
                    let idx = output.index_of(x, y);
                    if let Some(cell) = output.content.get(idx) {
                        buf[(x, y)] = cell.clone();
                    }
                }
            }
        })?;

        Ok(())
    }

    fn panel(title: &str) -> Block<'_> {
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(BORDER))
            .title(Span::styled(
                format!(" {title} "),
                Style::default().fg(ACCENT).add_modifier(Modifier::BOLD),
            ))
    }

    fn render_clock(&mut self) {
        let mut spans = Vec::new();
        for (i, reading) in self.display.clocks().into_iter().enumerate() {
            if i > 0 {
                spans.push(Span::styled("   │   ", Style::default().fg(DIM_GRAY)));
            }
            spans.push(Span::styled(
                format!("{} ", reading.label),
                Style::default().fg(ACCENT),
            ));
            spans.push(Span::styled(reading.time, Style::default().fg(TEXT)));
        }

        let Some(buf) = self.compositor.layer_buffer_mut(self.layers.clock) else {
            return;
        };
        buf.reset();
        let area = buf.area;
        Paragraph::new(Line::from(spans))
            .alignment(Alignment::Center)
            .render(area, buf);
    }

    fn render_header(&mut self) {
        let mut right = vec![Span::styled(
            self.display.agent_name.clone(),
            Style::default().fg(TEXT).add_modifier(Modifier::BOLD),
        )];
        if self.display.store_degraded {
            right.insert(
                0,
                Span::styled("● store unavailable  ", Style::default().fg(ERROR_RED)),
            );
        }
        right.push(Span::styled(" [u] ", Style::default().fg(DIM_GRAY)));
        let right = Line::from(right);

        let Some(buf) = self.compositor.layer_buffer_mut(self.layers.header) else {
            return;
        };
        buf.reset();
        let area = buf.area;

        Paragraph::new(Span::styled(
            TITLE,
            Style::default().fg(ACCENT).add_modifier(Modifier::BOLD),
        ))
        .render(area, buf);

        if TITLE.width() + right.width() < usize::from(area.width) {
            Paragraph::new(right)
                .alignment(Alignment::Right)
                .render(area, buf);
        }
    }

    fn render_interactions(&mut self) {
        let lines = if let Some(call) = &self.display.active {
            let mut flags: Vec<String> = Vec::new();
            if call.muted {
                flags.push("Muted".to_string());
            }
            if call.on_hold {
                flags.push("On hold".to_string());
            }
            if let Some(number) = &self.display.incoming {
                flags.push(format!("Waiting: {number}"));
            }
            vec![
                Line::from(vec![
                    Span::styled(
                        format!("{} call  ", call.direction.label()),
                        Style::default()
                            .fg(tone_color(AgentStatus::OnCall.tone()))
                            .add_modifier(Modifier::BOLD),
                    ),
                    Span::styled(call.number.clone(), Style::default().fg(TEXT)),
                    Span::styled(format!("  {}", call.elapsed()), Style::default().fg(ACCENT)),
                ]),
                Line::styled(flags.join("  "), Style::default().fg(RINGING)),
                Line::styled(
                    "[m] Mute    [h] Hold    [e] End call",
                    Style::default().fg(DIM_GRAY),
                ),
            ]
        } else if let Some(number) = &self.display.incoming {
            vec![
                Line::from(vec![
                    Span::styled(
                        "Incoming call  ",
                        Style::default().fg(RINGING).add_modifier(Modifier::BOLD),
                    ),
                    Span::styled(number.clone(), Style::default().fg(TEXT)),
                ]),
                Line::from(""),
                Line::styled("[a] Answer    [d] Decline", Style::default().fg(DIM_GRAY)),
            ]
        } else {
            vec![Line::styled(
                "No active interactions",
                Style::default().fg(DIM_GRAY),
            )]
        };

        let Some(buf) = self.compositor.layer_buffer_mut(self.layers.interactions) else {
            return;
        };
        buf.reset();
        let area = buf.area;
        Paragraph::new(lines)
            .block(Self::panel("Interactions"))
            .render(area, buf);
    }

    fn render_activity(&mut self) {
        let rows: Vec<Row> = self
            .display
            .history_rows()
            .into_iter()
            .map(|row| {
                Row::new(vec![
                    row.number,
                    row.call_type.to_string(),
                    row.received,
                    row.call_status.to_string(),
                    row.duration,
                ])
                .style(Style::default().fg(TEXT))
            })
            .collect();
        let title = format!(
            "Activity Log ({}/{})",
            self.display.history.len(),
            self.display.history_limit
        );

        let header = Row::new(vec![
            "Phone Number",
            "Call Type",
            "Time Received",
            "Call Status",
            "Call Duration",
        ])
        .style(Style::default().fg(ACCENT).add_modifier(Modifier::BOLD));
        let widths = [
            Constraint::Percentage(26),
            Constraint::Percentage(16),
            Constraint::Percentage(24),
            Constraint::Percentage(16),
            Constraint::Percentage(18),
        ];

        let Some(buf) = self.compositor.layer_buffer_mut(self.layers.activity) else {
            return;
        };
        buf.reset();
        let area = buf.area;
        let table = Table::new(rows, widths)
            .header(header)
            .block(Self::panel(&title));
        Widget::render(table, area, buf);
    }

    fn render_status(&mut self) {
        let status = self.display.status;
        let mut lines = vec![
            Line::from(Span::styled(
                format!("● {status}"),
                Style::default()
                    .fg(tone_color(status.tone()))
                    .add_modifier(Modifier::BOLD),
            )),
            Line::from(format!("In status   {}", self.display.status_timer())),
            Line::from(format!("Session     {}", self.display.session_timer())),
            Line::from(format!("Handled     {}", self.display.calls_handled)),
            Line::from(""),
        ];
        for (s, secs) in self.display.durations.iter() {
            let style = if s == status {
                Style::default().fg(tone_color(s.tone()))
            } else {
                Style::default().fg(DIM_GRAY)
            };
            lines.push(Line::styled(
                format!("{:<16}{}", s.label(), format_duration(secs)),
                style,
            ));
        }

        let Some(buf) = self.compositor.layer_buffer_mut(self.layers.status) else {
            return;
        };
        buf.reset();
        let area = buf.area;
        Paragraph::new(lines)
            .style(Style::default().fg(TEXT))
            .block(Self::panel("Status"))
            .render(area, buf);
    }

    fn render_dialer(&mut self) {
        let number = if self.display.dialer.is_empty() {
            Line::styled("Enter a number", Style::default().fg(DIM_GRAY))
        } else {
            Line::styled(
                format!("> {}", self.display.dialer),
                Style::default().fg(TEXT).add_modifier(Modifier::BOLD),
            )
        };
        let origin = (self.layout.dialer.x, self.layout.dialer.y);
        let keys: Vec<(Rect, char)> = KEYPAD
            .iter()
            .enumerate()
            .flat_map(|(row, keys)| {
                keys.iter()
                    .enumerate()
                    .map(move |(col, key)| (row, col, *key))
            })
            .map(|(row, col, key)| (self.layout.key_rect(row, col), key))
            .collect();

        let Some(buf) = self.compositor.layer_buffer_mut(self.layers.dialer) else {
            return;
        };
        buf.reset();
        let area = buf.area;
        Paragraph::new(number)
            .block(Self::panel("Dialer"))
            .render(area, buf);

        let face = Style::default().fg(TEXT).bg(KEY_FACE);
        for (rect, key) in keys {
            let x = rect.x.saturating_sub(origin.0);
            let y = rect.y.saturating_sub(origin.1);
            // Skip keys clipped by a short or narrow panel
            if x + rect.width < area.width && y + 1 < area.height {
                buf.set_string(x, y, format!("  {key}  "), face);
            }
        }
    }

    fn render_footer(&mut self) {
        let line = match &self.display.notification {
            Some(notification) => Line::styled(
                notification.text(),
                Style::default().fg(notify_color(notification.level)),
            ),
            None => {
                let hints = match self.mode {
                    Mode::Normal => {
                        "a answer  d decline  m mute  h hold  e end  Enter dial  c clear  s status  u user  Esc quit"
                    }
                    Mode::StatusMenu { .. } => "↑/↓ choose  Enter set status  Esc close",
                    Mode::UserMenu => "Enter sign out  Esc close",
                };
                Line::styled(hints, Style::default().fg(DIM_GRAY))
            }
        };

        let Some(buf) = self.compositor.layer_buffer_mut(self.layers.footer) else {
            return;
        };
        buf.reset();
        let area = buf.area;
        Paragraph::new(line).render(area, buf);
    }

    fn render_status_menu(&mut self) {
        let Mode::StatusMenu { selected } = self.mode else {
            return;
        };
        let lines: Vec<Line> = AgentStatus::SELECTABLE
            .iter()
            .enumerate()
            .map(|(i, status)| {
                let color = tone_color(status.tone());
                if i == selected {
                    Line::styled(
                        format!("▸ {status}"),
                        Style::default().fg(color).add_modifier(Modifier::REVERSED),
                    )
                } else {
                    Line::styled(format!("  {status}"), Style::default().fg(color))
                }
            })
            .collect();

        let Some(buf) = self.compositor.layer_buffer_mut(self.layers.status_menu) else {
            return;
        };
        buf.reset();
        let area = buf.area;
        Paragraph::new(lines)
            .block(Self::panel("Set Status"))
            .render(area, buf);
    }

    fn render_user_menu(&mut self) {
        let hint = if self.display.status.allows_sign_out() {
            "Enter to sign out"
        } else {
            "Set status to Gone Home first"
        };
        let lines = vec![
            Line::styled(
                format!("Status: {}", self.display.status),
                Style::default().fg(tone_color(self.display.status.tone())),
            ),
            Line::styled(
                "▸ Sign Out",
                Style::default().fg(TEXT).add_modifier(Modifier::REVERSED),
            ),
            Line::styled(hint, Style::default().fg(DIM_GRAY)),
        ];
        let title = self.display.agent_name.clone();

        let Some(buf) = self.compositor.layer_buffer_mut(self.layers.user_menu) else {
            return;
        };
        buf.reset();
        let area = buf.area;
        Paragraph::new(lines)
            .block(Self::panel(&title))
            .render(area, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use console_core::{ConsoleConfig, MemoryStore};
    use crossterm::event::{KeyCode, KeyModifiers};
    use ratatui::backend::TestBackend;

    fn app() -> App {
        let client =
            ConsoleClient::with_store(Box::new(MemoryStore::new()), ConsoleConfig::default());
        App::new(client, Rect::new(0, 0, 100, 30))
    }

    fn key(code: KeyCode) -> Event {
        Event::Key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    fn screen_text(terminal: &Terminal<TestBackend>) -> String {
        terminal
            .backend()
            .buffer()
            .content
            .iter()
            .map(|cell| cell.symbol())
            .collect()
    }

    #[tokio::test]
    async fn test_renders_every_panel() {
        let mut app = app();
        app.client.start().await.unwrap();
        app.process_console_messages();

        let mut terminal = Terminal::new(TestBackend::new(100, 30)).unwrap();
        app.render(&mut terminal).unwrap();

        let text = screen_text(&terminal);
        let expected_panels = [
            "Softphone Console",
            "EST",
            "PST",
            "Interactions",
            "Activity Log",
            "Phone Number",
            "Dialer",
            "Status",
        ];
        for expected in expected_panels {
            assert!(text.contains(expected), "missing {expected}");
        }
    }

    #[tokio::test]
    async fn test_typing_and_clicking_fill_the_dialer() {
        let mut app = app();
        app.client.start().await.unwrap();

        app.handle_terminal_event(key(KeyCode::Char('5'))).await;
        app.handle_terminal_event(Event::Mouse(MouseEvent {
            kind: MouseEventKind::Down(MouseButton::Left),
            column: 89,
            row: 27,
            modifiers: KeyModifiers::NONE,
        }))
        .await;
        app.process_console_messages();

        assert_eq!(app.display.dialer, "5#");
    }

    #[tokio::test]
    async fn test_paste_appends_to_dialer() {
        let mut app = app();
        app.client.start().await.unwrap();

        app.handle_terminal_event(key(KeyCode::Char('1'))).await;
        app.process_console_messages();
        app.handle_terminal_event(Event::Paste(" (555) 123-4567".to_string()))
            .await;
        app.process_console_messages();
        assert_eq!(app.display.dialer, "1 (555) 123-4567");

        // A bad paste leaves the typed number alone
        app.handle_terminal_event(Event::Paste("ext. 9".to_string()))
            .await;
        app.process_console_messages();
        assert_eq!(app.display.dialer, "1 (555) 123-4567");
    }

    #[tokio::test]
    async fn test_status_menu_changes_status() {
        let mut app = app();
        app.client.start().await.unwrap();

        app.handle_terminal_event(key(KeyCode::Char('s'))).await;
        app.update();
        assert!(app.compositor.is_visible(app.layers.status_menu));

        app.handle_terminal_event(key(KeyCode::Down)).await;
        app.handle_terminal_event(key(KeyCode::Enter)).await;
        app.process_console_messages();
        app.update();

        assert_eq!(app.mode, Mode::Normal);
        assert_eq!(app.display.status, AgentStatus::SELECTABLE[1]);
        assert!(!app.compositor.is_visible(app.layers.status_menu));
    }

    #[tokio::test]
    async fn test_escape_quits() {
        let mut app = app();
        app.client.start().await.unwrap();

        app.handle_terminal_event(key(KeyCode::Esc)).await;
        app.process_console_messages();

        assert!(!app.running);
        assert_eq!(app.exit, ExitReason::Quit);
    }

    #[tokio::test]
    async fn test_resize_moves_layers() {
        let mut app = app();
        app.handle_resize(120, 40);
        assert_eq!(
            app.compositor.bounds(app.layers.dialer),
            Some(app.layout.dialer)
        );
        assert_eq!(app.layout.area, Rect::new(0, 0, 120, 40));
    }
}
