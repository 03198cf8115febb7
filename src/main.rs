use anyhow::Result;

mod app;
mod config;
mod handler;
mod leaderboard;
mod logging;
mod models;
mod openrouter;
mod session;
mod store;
mod tui;
mod ui;

use app::App;
use config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    // Logging is best-effort; an unwritable data dir should not keep the
    // arena from starting.
    let _log_guard = logging::init().ok();

    let config = Config::resolved();
    tracing::info!(missing = ?config.missing_keys(), "starting arena");

    let mut app = App::new(&config);

    tui::install_panic_hook();
    let mut terminal = tui::init()?;
    let mut events = tui::EventHandler::new();

    // First paint already shows the current standings
    app.refresh_leaderboard();

    let result = run(&mut terminal, &mut events, &mut app).await;

    tui::restore()?;
    result
}

async fn run(
    terminal: &mut tui::Tui,
    events: &mut tui::EventHandler,
    app: &mut App,
) -> Result<()> {
    while !app.should_quit {
        terminal.draw(|frame| ui::render(app, frame))?;

        match events.next().await {
            Some(event) => handler::handle_event(app, event).await?,
            None => break,
        }
    }
    Ok(())
}
