use axum::{extract::State, response::Html, routing::get, Json, Router};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

use crate::display::{Screen, ScreenBoard};

#[derive(Clone)]
pub struct AppState {
    pub board: Arc<ScreenBoard>,
    pub started_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct Health {
    pub status: &'static str,
    pub version: &'static str,
    pub uptime_secs: i64,
}

/// Build the Axum router for the dashboard.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index_handler))
        .route("/api/screen", get(screen_handler))
        .route("/api/health", get(health_handler))
        .layer(CorsLayer::permissive())
        .with_state(Arc::new(state))
}

async fn index_handler() -> Html<&'static str> {
    Html(DASHBOARD_HTML)
}

/// GET /api/screen
async fn screen_handler(State(state): State<Arc<AppState>>) -> Json<Screen> {
    Json(state.board.snapshot())
}

/// GET /api/health
async fn health_handler(State(state): State<Arc<AppState>>) -> Json<Health> {
    Json(Health {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        uptime_secs: (Utc::now() - state.started_at).num_seconds(),
    })
}

/// Mirrors the scoreboard in a browser, polling /api/screen.
const DASHBOARD_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="UTF-8">
<meta name="viewport" content="width=device-width, initial-scale=1.0">
<title>Team Scoreboard</title>
<style>
  :root { --bg: #0f1117; --card: #1a1d27; --border: #2a2d3a; --green: #00c896; --red: #ff4f6a; --text: #e0e0e0; --muted: #8888aa; }
  * { box-sizing: border-box; margin: 0; padding: 0; }
  body { background: var(--bg); color: var(--text); font-family: 'Segoe UI', system-ui, sans-serif; display: grid; place-items: center; min-height: 100vh; }
  .board { background: #000; border: 6px solid var(--border); border-radius: 10px; padding: 1.5rem 2rem; min-width: 320px; font-family: ui-monospace, monospace; font-size: 1.6rem; line-height: 1.5; }
  .board.error { color: var(--red); }
  .meta { color: var(--muted); font-size: .8rem; margin-top: 1rem; text-align: center; }
</style>
</head>
<body>
<div>
  <div id="board" class="board">…</div>
  <div id="meta" class="meta"></div>
</div>
<script>
async function refresh() {
  try {
    const r = await fetch('/api/screen');
    if (!r.ok) return;
    const s = await r.json();
    const board = document.getElementById('board');
    board.textContent = '';
    for (const line of s.lines) {
      const div = document.createElement('div');
      div.textContent = line;
      board.appendChild(div);
    }
    board.className = 'board' + (s.content.kind === 'error' ? ' error' : '');
    document.getElementById('meta').textContent = 'updated ' + new Date(s.updated_at).toLocaleTimeString();
  } catch (e) {
    document.getElementById('meta').textContent = 'offline';
  }
}
refresh();
setInterval(refresh, 2000);
</script>
</body>
</html>
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::{Display, ScreenContent};

    fn state() -> Arc<AppState> {
        Arc::new(AppState {
            board: Arc::new(ScreenBoard::new()),
            started_at: Utc::now(),
        })
    }

    #[tokio::test]
    async fn test_screen_reflects_board() {
        let state = state();
        state.board.show_no_games();
        let Json(screen) = screen_handler(State(state.clone())).await;
        assert!(matches!(screen.content, ScreenContent::NoGames));

        let body = serde_json::to_value(&screen).unwrap();
        assert_eq!(body["content"]["kind"], "no_games");
    }

    #[tokio::test]
    async fn test_health() {
        let Json(health) = health_handler(State(state())).await;
        assert_eq!(health.status, "ok");
        assert!(health.uptime_secs >= 0);
    }
}
