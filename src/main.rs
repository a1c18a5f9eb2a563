use anyhow::Result;
use chrono::Utc;
use clap::Parser;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{error, info};

mod clock;
mod config;
mod dashboard;
mod db;
mod display;
mod error;
mod feeds;
mod input;
mod leagues;
mod select;
mod tracker;

use clock::SystemClock;
use config::Config;
use dashboard::AppState;
use db::models::Selection;
use db::Database;
use display::ScreenBoard;
use feeds::{GameFeed, LeagueFeed};
use input::{spawn_stdin_buttons, ButtonSignals};
use select::ButtonTeamPicker;
use tracker::{GameTracker, PollScheduler, Runner};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialise tracing / logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = Config::parse();
    config.validate()?;

    // Open database and restore the followed team
    let db = Database::open(&config.database_path)?;
    info!("Database opened: {}", config.database_path);

    let fallback = Selection {
        league: config.league,
        team_id: config.default_team(),
    };
    let selection = db.load_selection(fallback)?;
    info!(
        "Following {} team {} ({})",
        selection.league,
        selection.team_id,
        leagues::team_code_or_err(selection.league, selection.team_id)
    );

    let board = Arc::new(ScreenBoard::new());
    let signals = ButtonSignals::new();
    let _buttons = spawn_stdin_buttons(signals.clone());

    let scheduler = Arc::new(PollScheduler::new(
        config.sleep_tick(),
        config.max_sleep(),
        signals.clone(),
    ));
    let feed: Arc<dyn GameFeed> = Arc::new(LeagueFeed::new(config.http_timeout())?);
    info!("Using {} feed, HTTP timeout {:?}", feed.name(), config.http_timeout());

    let tracker = GameTracker::new(selection, feed, Arc::new(SystemClock), config.timing());
    let picker = Arc::new(ButtonTeamPicker::new(board.clone(), scheduler.clone()));
    let runner = Runner::new(tracker, scheduler, board.clone(), picker, db.clone());

    // Start the dashboard HTTP server
    let app = dashboard::router(AppState {
        board: board.clone(),
        started_at: Utc::now(),
    });
    let addr: SocketAddr = config.dashboard_addr.parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Dashboard listening on http://{}", addr);
    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            error!("Dashboard server stopped: {}", e);
        }
    });

    // Run the tracker (returns only on a fatal error)
    runner.run(config.select_team).await
}
