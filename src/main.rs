//! jira-tui - a terminal client for Jira issues and Tempo work-logs.
//!
//! The main task owns the terminal and the application model. Remote work
//! runs on background tasks whose results are drained from a channel after
//! every input poll.

mod api;
mod app;
mod config;
mod error;
mod events;
mod logging;
mod pool;
mod tasks;
#[cfg(test)]
mod testing;
mod time;
mod ui;

use std::io::{self, Stdout};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{error, info};

use crate::api::{Gateway, JiraClient};
use crate::app::App;
use crate::config::{Config, Settings};
use crate::error::{AppError, Result};
use crate::events::{Event, EventHandler};
use crate::tasks::{create_task_channel, ApiMessage, TaskSpawner};

type Tui = Terminal<CrosstermBackend<Stdout>>;

/// Terminal client for Jira issues and Tempo work-logs.
#[derive(Debug, Parser)]
#[command(name = "jira-tui", version, about)]
struct Cli {
    /// Path to the config file (defaults to <config dir>/jira-tui/config.toml).
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Write debug-level logs.
    #[arg(long)]
    debug: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = logging::init(cli.debug) {
        eprintln!("Warning: logging is disabled: {}", e);
    }

    let result = start(&cli);
    logging::shutdown();

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "Exiting with error");
            eprintln!("{}", e.user_message());
            if let Some(action) = e.suggested_action() {
                eprintln!("{}", action);
            }
            ExitCode::FAILURE
        }
    }
}

fn start(cli: &Cli) -> Result<()> {
    let config = Config::load(cli.config.as_deref())?;
    let client = JiraClient::new(&config.credentials, &config.settings)?;
    let gateway: Arc<dyn Gateway> = Arc::new(client);

    let mut terminal = setup_terminal()?;
    let result = run(&mut terminal, gateway, &config.settings);
    let restored = restore_terminal(&mut terminal);
    result.and(restored)
}

fn setup_terminal() -> Result<Tui> {
    enable_raw_mode().map_err(terminal_error)?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen).map_err(terminal_error)?;
    Terminal::new(CrosstermBackend::new(stdout)).map_err(terminal_error)
}

fn restore_terminal(terminal: &mut Tui) -> Result<()> {
    disable_raw_mode().map_err(terminal_error)?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen).map_err(terminal_error)?;
    terminal.show_cursor().map_err(terminal_error)
}

fn terminal_error(e: io::Error) -> AppError {
    AppError::terminal(e.to_string())
}

/// The event loop: draw, poll one input, then apply every finished result.
fn run(terminal: &mut Tui, gateway: Arc<dyn Gateway>, settings: &Settings) -> Result<()> {
    let (tx, mut rx) = create_task_channel();
    let spawner = TaskSpawner::new(tx, gateway, settings.worklog_concurrency);
    let events = EventHandler::new(settings.tick_rate_ms);
    let mut app = App::new(settings);

    for effect in app.init() {
        spawner.issue(effect);
    }
    info!("Event loop started");

    loop {
        terminal
            .draw(|frame| ui::render(frame, &app))
            .map_err(terminal_error)?;

        let event = events.next().map_err(terminal_error)?;
        dispatch(&mut app, &spawner, event);
        drain_results(&mut app, &spawner, &mut rx);

        if app.should_quit() {
            return Ok(());
        }
    }
}

fn dispatch(app: &mut App, spawner: &TaskSpawner, event: Event) {
    for effect in app.update(event) {
        spawner.issue(effect);
    }
}

fn drain_results(app: &mut App, spawner: &TaskSpawner, rx: &mut UnboundedReceiver<ApiMessage>) {
    while let Ok(message) = rx.try_recv() {
        dispatch(app, spawner, Event::Api(message));
    }
}
