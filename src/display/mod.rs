use chrono::{DateTime, Local, TimeZone, Utc};
use serde::Serialize;
use std::sync::RwLock;
use tracing::{error, info};

use crate::db::models::{CurrentGame, NextGame};
use crate::leagues::team_code_or_err;
use crate::select::TeamChoice;

/// One-way sink for what the scoreboard should show.
pub trait Display: Send + Sync {
    fn show_next_game(&self, game: &NextGame);
    fn show_live_game(&self, game: &CurrentGame);
    fn show_no_games(&self);
    fn show_team_choice(&self, choice: &TeamChoice);
    fn show_error(&self, message: &str);
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScreenContent {
    Blank,
    NextGame { game: NextGame },
    LiveGame { game: CurrentGame },
    NoGames,
    TeamChoice { choice: TeamChoice },
    Error { message: String },
}

/// The latest frame: structured content plus its text rendering.
#[derive(Debug, Clone, Serialize)]
pub struct Screen {
    pub content: ScreenContent,
    pub lines: Vec<String>,
    pub updated_at: DateTime<Utc>,
}

impl Screen {
    fn new(content: ScreenContent, lines: Vec<String>) -> Self {
        Screen {
            content,
            lines,
            updated_at: Utc::now(),
        }
    }
}

/// Text-mode scoreboard: logs each frame and keeps the last one around for
/// the dashboard.
pub struct ScreenBoard {
    current: RwLock<Screen>,
}

impl ScreenBoard {
    pub fn new() -> Self {
        ScreenBoard {
            current: RwLock::new(Screen::new(ScreenContent::Blank, Vec::new())),
        }
    }

    pub fn snapshot(&self) -> Screen {
        match self.current.read() {
            Ok(screen) => screen.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    fn present(&self, content: ScreenContent, lines: Vec<String>) {
        info!("Display:\n  {}", lines.join("\n  "));
        let screen = Screen::new(content, lines);
        match self.current.write() {
            Ok(mut slot) => *slot = screen,
            Err(poisoned) => *poisoned.into_inner() = screen,
        }
    }
}

impl Default for ScreenBoard {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for ScreenBoard {
    fn show_next_game(&self, game: &NextGame) {
        let lines = render_next_game(game, &Local);
        self.present(ScreenContent::NextGame { game: game.clone() }, lines);
    }

    fn show_live_game(&self, game: &CurrentGame) {
        let lines = render_live_game(game);
        self.present(ScreenContent::LiveGame { game: game.clone() }, lines);
    }

    fn show_no_games(&self) {
        self.present(ScreenContent::NoGames, vec!["No upcoming games".to_string()]);
    }

    fn show_team_choice(&self, choice: &TeamChoice) {
        let lines = render_team_choice(choice);
        self.present(ScreenContent::TeamChoice { choice: *choice }, lines);
    }

    fn show_error(&self, message: &str) {
        error!("{}", message);
        self.present(
            ScreenContent::Error {
                message: message.to_string(),
            },
            vec!["ERROR".to_string(), message.to_string()],
        );
    }
}

/// "Mon, Jan 23" and "7:05" in the given zone.
pub fn friendly_start<Tz: TimeZone>(start: &DateTime<Utc>, tz: &Tz) -> (String, String)
where
    Tz::Offset: std::fmt::Display,
{
    let local = start.with_timezone(tz);
    (
        local.format("%a, %b %-d").to_string(),
        local.format("%-I:%M").to_string(),
    )
}

pub fn render_next_game<Tz: TimeZone>(game: &NextGame, tz: &Tz) -> Vec<String>
where
    Tz::Offset: std::fmt::Display,
{
    let away = team_code_or_err(game.league, game.away_id);
    let home = team_code_or_err(game.league, game.home_id);
    let (date, time) = friendly_start(&game.start_time, tz);

    let mut lines = vec![format!("{} @ {}", away, home)];
    if game.is_playoffs {
        lines.push("PLAYOFFS".to_string());
    } else {
        lines.push(format!("{} / {}", game.away_record, game.home_record));
    }
    lines.push(date);
    lines.push(time);
    lines
}

fn base_mark(occupied: bool) -> char {
    if occupied {
        '#'
    } else {
        'o'
    }
}

pub fn render_live_game(game: &CurrentGame) -> Vec<String> {
    let league = game.league.league();
    let pp = |on: bool| if on && league.tracks_power_play() { " PP" } else { "" };

    let mut lines = vec![
        format!(
            "{} {}{}",
            team_code_or_err(game.league, game.away_id),
            game.away_score,
            pp(game.away_power_play)
        ),
        format!(
            "{} {}{}",
            team_code_or_err(game.league, game.home_id),
            game.home_score,
            pp(game.home_power_play)
        ),
        format!("{} {}", game.division, game.time_remaining)
            .trim()
            .to_string(),
    ];

    let in_play = !game.division.is_empty() && game.division.as_str() != "pre";
    if league.tracks_bases() && in_play {
        let [first, second, third] = game.bases;
        lines.push(format!(
            "{}{}{} {} out",
            base_mark(first),
            base_mark(second),
            base_mark(third),
            game.outs
        ));
    }
    lines
}

pub fn render_team_choice(choice: &TeamChoice) -> Vec<String> {
    match *choice {
        TeamChoice::Team { league, team_id } => vec![
            league.to_string(),
            team_code_or_err(league, team_id).to_string(),
        ],
        TeamChoice::League { league } => vec![format!("Switch to {}", league)],
    }
}
