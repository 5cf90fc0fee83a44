mod app;
mod config;
mod debounce;
mod error;
mod locator;
mod logging;
mod models;
mod runner;
mod session;
mod store;
mod ui;

use std::{
    io,
    path::Path,
    time::{Duration, Instant},
};

use anyhow::{Context, Result, bail};
use clap::Parser;
use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Terminal, backend::CrosstermBackend};
use tracing::info;

use crate::{
    app::{App, Workspace},
    config::{Cli, Settings},
    runner::ProcessRunner,
    session::ScriptSession,
    store::FsStore,
};

type Tui = Terminal<CrosstermBackend<io::Stdout>>;

const TICK_RATE: Duration = Duration::from_millis(250);

fn main() -> Result<()> {
    let cli = Cli::parse();
    let root_dir = match &cli.dir {
        Some(dir) => std::path::absolute(dir)?,
        None => std::env::current_dir()?,
    };

    if !root_dir.is_dir() {
        bail!("Directory '{}' does not exist", root_dir.display());
    }

    let log_path = match &cli.log_file {
        Some(path) => std::path::absolute(path)?,
        None => root_dir.join(logging::DEFAULT_LOG_FILE),
    };

    // Scripts and the interpreter both resolve names relative to the script directory.
    std::env::set_current_dir(&root_dir)
        .with_context(|| format!("Failed to enter {}", root_dir.display()))?;

    let mut settings = Settings::load(Path::new("."))?;
    settings.apply(&cli);

    let _log_guard = logging::init(&log_path)?;
    info!(
        root = %root_dir.display(),
        interpreter = %settings.interpreter,
        debounce_ms = settings.debounce_ms,
        "Starting"
    );

    let runner = ProcessRunner::new(settings.interpreter.clone(), settings.interpreter_args.clone());
    let session = ScriptSession::open(
        FsStore::new("."),
        runner,
        Workspace::new(),
        settings.debounce(),
    )
    .with_context(|| format!("Failed to list scripts in {}", root_dir.display()))?;
    let mut app = App::new(session);

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run(&mut terminal, &mut app);
    app.session.shutdown();

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    info!("Exiting");
    result
}

fn run(terminal: &mut Tui, app: &mut App) -> Result<()> {
    terminal.draw(|f| ui::ui(f, app))?;
    if !app.session.scripts().is_empty() {
        app.session.select(Some(0));
    }

    loop {
        terminal.draw(|f| ui::ui(f, app))?;

        let timeout = match app.session.next_deadline() {
            Some(deadline) => TICK_RATE.min(deadline.saturating_duration_since(Instant::now())),
            None => TICK_RATE,
        };

        if event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press && app.handle_key(key) {
                    return Ok(());
                }
            }
        }

        app.session.tick(Instant::now());
    }
}
