//! MorseChat: encrypted Morse code chat in the terminal.
//!
//! Launches the TUI and connects to a `morsechat-relay` hub. Configuration
//! via CLI flags, environment variables, or config file
//! (`~/.config/morsechat/config.toml`).
//!
//! ```bash
//! cargo run --bin morsechat -- --server-url ws://127.0.0.1:4000/ws \
//!     --cipher-key "correct horse battery staple"
//!
//! # Or via environment variables
//! MORSECHAT_CIPHER_KEY=... MORSECHAT_SERVER_URL=ws://hub:4000/ws cargo run --bin morsechat
//! ```
//!
//! If the hub cannot be reached the TUI still starts in offline mode, where
//! the live Morse preview works but nothing is sent.

use std::io;
use std::path::Path;
use std::process::ExitCode;

use clap::Parser;
use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Terminal, backend::CrosstermBackend};
use tokio::sync::mpsc;
use tracing_appender::non_blocking::WorkerGuard;

use morsechat::app::App;
use morsechat::config::{CliArgs, ClientConfig};
use morsechat::net::{self, NetCommand, NetConfig};
use morsechat::ui;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = CliArgs::parse();

    let config = match ClientConfig::load(&cli) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {e}");
            return ExitCode::FAILURE;
        }
    };

    let net_config = match config.to_net_config() {
        Ok(n) => n,
        Err(e) => {
            eprintln!("Error: {e}");
            return ExitCode::FAILURE;
        }
    };

    // Logs go to a file, never stdout, since ratatui owns the terminal.
    let _log_guard = init_logging(&cli.log_level, cli.log_file.as_deref());

    tracing::info!(server_url = %config.server_url, "morsechat starting");

    match run_terminal(net_config, &config).await {
        Ok(()) => {
            tracing::info!("morsechat exiting");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

/// Set up the terminal, run the app, and restore the terminal.
async fn run_terminal(net_config: NetConfig, config: &ClientConfig) -> io::Result<()> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_app(&mut terminal, net_config, config).await;

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

/// Initialize file-based logging.
///
/// Returns a [`WorkerGuard`] that must be held until shutdown to ensure all
/// buffered log entries are flushed.
fn init_logging(level: &str, file_path: Option<&Path>) -> Option<WorkerGuard> {
    let default_path = std::env::temp_dir().join("morsechat.log");
    let log_path = file_path.unwrap_or(&default_path);

    let log_dir = log_path.parent()?;
    let file_name = log_path.file_name()?.to_str()?;

    let file_appender = tracing_appender::rolling::never(log_dir, file_name);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_env_filter(env_filter)
        .with_ansi(false)
        .init();

    Some(guard)
}

/// Main application loop.
async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    net_config: NetConfig,
    config: &ClientConfig,
) -> io::Result<()> {
    let mut app = App::new(config.server_url.clone());

    let (cmd_tx, mut evt_rx) = match net::spawn_net(net_config).await {
        Ok((tx, rx)) => (Some(tx), Some(rx)),
        Err(e) => {
            tracing::warn!(error = %e, "hub unavailable, starting offline");
            app.push_system_message(format!(
                "Could not connect to {}, running offline ({e})",
                config.server_url
            ));
            (None, None)
        }
    };

    loop {
        terminal.draw(|frame| ui::draw(frame, &app))?;

        if let Some(ref mut rx) = evt_rx {
            while let Ok(event) = rx.try_recv() {
                app.apply_net_event(event);
            }
        }

        if event::poll(config.poll_timeout)?
            && let Event::Key(key) = event::read()?
        {
            if key.kind != KeyEventKind::Press {
                continue;
            }

            if let Some(net_cmd) = app.handle_key_event(key) {
                dispatch(&mut app, cmd_tx.as_ref(), net_cmd);
            }
        }

        if app.should_quit {
            if let Some(ref tx) = cmd_tx {
                let _ = tx.try_send(NetCommand::Shutdown);
            }
            return Ok(());
        }
    }
}

/// Hand a command to the networking tasks, reporting why if it can't go.
fn dispatch(app: &mut App, cmd_tx: Option<&mpsc::Sender<NetCommand>>, cmd: NetCommand) {
    let Some(tx) = cmd_tx.filter(|_| app.is_connected) else {
        app.push_system_message("Not connected, message not sent".to_string());
        return;
    };

    match tx.try_send(cmd) {
        Ok(()) => {}
        Err(mpsc::error::TrySendError::Full(_)) => {
            app.push_system_message("Network busy, message dropped".to_string());
        }
        Err(mpsc::error::TrySendError::Closed(_)) => {
            app.push_system_message("Network disconnected".to_string());
        }
    }
}
