//! Softphone TUI Entry Point
//!
//! Launches the agent console in the terminal.
//!
//! Usage:
//!   softphone-tui [OPTIONS]
//!
//! Options:
//!   --config <FILE>      Config file (default: ~/.config/softphone/console.toml)
//!   --offline            Keep calls in memory instead of the remote store
//!   --agent-name <NAME>  Agent display name
//!   --log-file <FILE>    Write logs to this file

use std::fs::OpenOptions;
use std::io::{self, IsTerminal};
use std::panic;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::Context;
use clap::Parser;
use crossterm::{
    event::{DisableBracketedPaste, DisableMouseCapture, EnableBracketedPaste, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::backend::CrosstermBackend;
use ratatui::layout::Rect;
use ratatui::Terminal;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use console_core::{default_config_path, load_config_from_path, ConfigOverrides};
use softphone_tui::{App, ConsoleClient, ExitReason};

const DEFAULT_LOG_FILTER: &str = "softphone_tui=info,console_core=info";

/// Terminal agent console for a simulated softphone
#[derive(Parser, Debug)]
#[command(name = "softphone-tui")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Config file path
    #[arg(short, long, env = "SOFTPHONE_CONFIG", value_name = "FILE")]
    config: Option<PathBuf>,

    /// Keep call records in memory (no store credentials needed)
    #[arg(long)]
    offline: bool,

    /// Agent display name
    #[arg(short, long, value_name = "NAME")]
    agent_name: Option<String>,

    /// Write logs to this file
    #[arg(short, long, value_name = "FILE")]
    log_file: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut config = load_config_from_path(args.config.clone().or_else(default_config_path))
        .context("Failed to load configuration")?;
    config.apply_overrides(&ConfigOverrides {
        agent_name: args.agent_name.clone(),
        log_file: args.log_file.clone(),
    });

    init_logging(config.log_file.as_deref())?;
    tracing::info!(
        source = ?config.source(),
        agent = %config.agent_name,
        offline = args.offline,
        "Configuration loaded"
    );

    // Missing store credentials are reported before touching the terminal
    let client = ConsoleClient::new(config, args.offline)
        .context("Call store is not configured (pass --offline to run without one)")?;

    // Check if we have a TTY before attempting initialization
    if !io::stdin().is_terminal() || !io::stdout().is_terminal() {
        eprintln!("Error: softphone-tui requires a terminal (TTY)");
        std::process::exit(1);
    }

    // Set up panic hook to restore terminal
    let original_hook = panic::take_hook();
    panic::set_hook(Box::new(move |panic_info| {
        let _ = disable_raw_mode();
        let _ = execute!(
            io::stdout(),
            DisableBracketedPaste,
            DisableMouseCapture,
            LeaveAlternateScreen
        );
        original_hook(panic_info);
    }));

    // Initialize terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(
        stdout,
        EnterAlternateScreen,
        EnableMouseCapture,
        EnableBracketedPaste
    )?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;

    // Run the app
    let result = run_app(&mut terminal, client).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        DisableBracketedPaste,
        DisableMouseCapture,
        LeaveAlternateScreen
    )?;
    terminal.show_cursor()?;

    if result? == ExitReason::SignedOut {
        println!("Signed out");
    }
    Ok(())
}

async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    client: ConsoleClient,
) -> anyhow::Result<ExitReason> {
    let (width, height) = crossterm::terminal::size()?;
    let mut app = App::new(client, Rect::new(0, 0, width, height));
    app.run(terminal).await
}

/// Install the tracing subscriber
///
/// The terminal is in raw mode, so logs only go to a file when one is set.
fn init_logging(log_file: Option<&Path>) -> anyhow::Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    let file_layer = match log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            Some(
                tracing_subscriber::fmt::layer()
                    .with_writer(Mutex::new(file))
                    .with_ansi(false)
                    .with_target(true),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .init();
    Ok(())
}
