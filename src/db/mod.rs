use anyhow::{anyhow, Context, Result};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use std::sync::{Arc, Mutex, MutexGuard};

pub mod models;
use models::Selection;

use crate::error::FeedError;
use crate::leagues::LeagueId;

const CURRENT_LEAGUE_KEY: &str = "current_league";

/// Favorite team per league plus the league last shown, kept in SQLite.
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// Open (or create) the SQLite database at the given path
    pub fn open(path: &str) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open database {}", path))?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        let db = Database {
            conn: Arc::new(Mutex::new(conn)),
        };
        db.run_migrations()?;
        Ok(db)
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| anyhow!("database mutex poisoned"))
    }

    /// Run schema migrations (idempotent)
    fn run_migrations(&self) -> Result<()> {
        self.conn()?.execute_batch(SCHEMA_SQL)?;
        Ok(())
    }

    /// Favorite team saved for `league`, if any.
    pub fn favorite_team(&self, league: LeagueId) -> Result<Option<u16>> {
        let conn = self.conn()?;
        let team = conn
            .query_row(
                "SELECT team_id FROM favorite_teams WHERE league_id = ?1",
                params![league.numeric()],
                |row| row.get::<_, u16>(0),
            )
            .optional()?;
        Ok(team)
    }

    fn current_league(&self) -> Result<Option<LeagueId>> {
        let conn = self.conn()?;
        let raw: Option<String> = conn
            .query_row(
                "SELECT value FROM settings WHERE key = ?1",
                params![CURRENT_LEAGUE_KEY],
                |row| row.get(0),
            )
            .optional()?;
        drop(conn);

        let Some(raw) = raw else {
            return Ok(None);
        };
        let numeric: u8 = raw
            .parse()
            .with_context(|| format!("Stored {} is not a number: {:?}", CURRENT_LEAGUE_KEY, raw))?;
        let league = LeagueId::from_numeric(numeric).ok_or(FeedError::UnknownLeague(numeric))?;
        Ok(Some(league))
    }

    /// The persisted selection, or `fallback` for whatever isn't stored yet.
    /// A stored team id that isn't on its league's roster is an error.
    pub fn load_selection(&self, fallback: Selection) -> Result<Selection> {
        let league = self.current_league()?.unwrap_or(fallback.league);
        let team_id = match self.favorite_team(league)? {
            Some(id) => id,
            None if league == fallback.league => fallback.team_id,
            None => league.league().default_team,
        };

        if !league.league().has_team(team_id) {
            return Err(FeedError::UnknownTeam { league, team_id }.into());
        }
        Ok(Selection { league, team_id })
    }

    /// Remember `selection` as both the current league and that league's
    /// favorite team.
    pub fn save_selection(&self, selection: &Selection) -> Result<()> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        tx.execute(
            "INSERT INTO favorite_teams (league_id, team_id, saved_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(league_id) DO UPDATE SET team_id = excluded.team_id, saved_at = excluded.saved_at",
            params![selection.league.numeric(), selection.team_id, Utc::now()],
        )?;
        tx.execute(
            "INSERT INTO settings (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![CURRENT_LEAGUE_KEY, selection.league.numeric().to_string()],
        )?;
        tx.commit()?;
        Ok(())
    }
}

pub const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS favorite_teams (
    league_id   INTEGER PRIMARY KEY,
    team_id     INTEGER NOT NULL,
    saved_at    TEXT    NOT NULL
);

CREATE TABLE IF NOT EXISTS settings (
    key         TEXT    PRIMARY KEY,
    value       TEXT    NOT NULL
);
"#;
