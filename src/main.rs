use anyhow::Result;
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::backend::CrosstermBackend;
use std::io::stdout;
use std::path::Path;
use tracing_subscriber::EnvFilter;

mod account;
mod config;
mod dashboard;
mod landing;
mod picker;
mod profile;
mod status;
mod store;
mod ui;
mod view;

use store::Store;
use ui::Term;
use view::Page;

// ── Logging ───────────────────────────────────────────────────────────────────

/// Log to a file in the data dir; stdout belongs to the TUI.
fn init_tracing(data_dir: &Path) -> Result<()> {
    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(config::log_file(data_dir))?;
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::sync::Arc::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

// ── Terminal setup / teardown ─────────────────────────────────────────────────

fn init_terminal() -> Result<Term> {
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    Ok(ratatui::Terminal::new(backend)?)
}

fn restore_terminal(terminal: &mut Term) -> Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}

// ── Main application loop ─────────────────────────────────────────────────────

fn run(terminal: &mut Term, store: &mut Store) -> Result<()> {
    // Always open on the landing page; a live session is loaded but does
    // not redirect anywhere on its own.
    let mut page = Page::Landing;

    loop {
        page = match view::resolve(page, store.is_logged_in()) {
            Page::Landing => landing::landing(terminal, store)?,
            Page::Signup => account::signup_screen(terminal, store)?,
            Page::Login => account::login_screen(terminal, store)?,
            Page::Dashboard => dashboard::dashboard(terminal, store)?,
            Page::Profile(username) => profile::profile(terminal, store, &username)?,
            Page::Exit => break,
        };
    }
    Ok(())
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    let data_dir = config::default_data_dir();
    std::fs::create_dir_all(&data_dir)?;
    // A broken log file must not keep the gallery from starting.
    let _ = init_tracing(&data_dir);

    let mut store = Store::open(&data_dir);
    let mut terminal = init_terminal()?;

    let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
        run(&mut terminal, &mut store)
    }));

    // Always restore the terminal, even after a panic.
    restore_terminal(&mut terminal).ok();

    match result {
        Ok(Ok(())) => Ok(()),
        Ok(Err(e)) => Err(e),
        Err(_) => {
            eprintln!("showcase crashed; see {}", config::log_file(&data_dir).display());
            Ok(())
        }
    }
}
