use clap::Parser;
use std::time::Duration;

use crate::leagues::LeagueId;
use crate::tracker::Timing;

/// Follows one team through its schedule and live games
#[derive(Parser, Debug, Clone)]
#[command(name = "team-scoreboard", version, about)]
pub struct Config {
    /// SQLite database path
    #[arg(long, env = "SCOREBOARD_DB", default_value = "scoreboard.db")]
    pub database_path: String,

    /// Dashboard listen address
    #[arg(long, env = "DASHBOARD_ADDR", default_value = "127.0.0.1:8080")]
    pub dashboard_addr: String,

    /// League to follow when nothing has been saved yet
    #[arg(long, env = "SCOREBOARD_LEAGUE", value_enum, default_value = "nhl")]
    pub league: LeagueId,

    /// Team id to follow when nothing has been saved yet (defaults to the league's default team)
    #[arg(long, env = "SCOREBOARD_TEAM")]
    pub team: Option<u16>,

    /// Open the team picker at startup
    #[arg(long, env = "SELECT_TEAM", default_value = "false")]
    pub select_team: bool,

    /// Live game polling interval in seconds
    #[arg(long, env = "GAME_POLL_SECS", default_value = "65")]
    pub game_poll_secs: u64,

    /// Longest single sleep in seconds
    #[arg(long, env = "MAX_SLEEP_SECS", default_value = "3600")]
    pub max_sleep_secs: u64,

    /// How long a final score stays up, in minutes
    #[arg(long, env = "POST_GAME_MINUTES", default_value = "60")]
    pub post_game_minutes: u64,

    /// Button polling granularity while sleeping, in milliseconds
    #[arg(long, env = "SLEEP_TICK_MS", default_value = "50")]
    pub sleep_tick_ms: u64,

    /// Per-request HTTP timeout in seconds
    #[arg(long, env = "HTTP_TIMEOUT_SECS", default_value = "10")]
    pub http_timeout_secs: u64,

    /// Consecutive failed live polls before giving up
    #[arg(long, env = "MAX_LIVE_FAILURES", default_value = "5")]
    pub max_live_failures: u32,
}

impl Config {
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.game_poll_secs == 0 {
            anyhow::bail!("game_poll_secs must be positive");
        }
        if self.max_sleep_secs == 0 {
            anyhow::bail!("max_sleep_secs must be positive");
        }
        if self.post_game_minutes == 0 {
            anyhow::bail!("post_game_minutes must be positive");
        }
        if self.sleep_tick_ms == 0 {
            anyhow::bail!("sleep_tick_ms must be positive");
        }
        if self.http_timeout_secs == 0 {
            anyhow::bail!("http_timeout_secs must be positive");
        }
        if self.max_live_failures == 0 {
            anyhow::bail!("max_live_failures must be positive");
        }
        if self.sleep_tick() >= self.max_sleep() {
            anyhow::bail!("sleep_tick_ms must be shorter than max_sleep_secs");
        }
        if self.http_timeout_secs > self.game_poll_secs {
            anyhow::bail!("http_timeout_secs must not exceed game_poll_secs");
        }
        if let Some(team) = self.team {
            if !self.league.league().has_team(team) {
                anyhow::bail!("team {} is not on the {} roster", team, self.league);
            }
        }
        Ok(())
    }

    pub fn default_team(&self) -> u16 {
        self.team.unwrap_or(self.league.league().default_team)
    }

    pub fn sleep_tick(&self) -> Duration {
        Duration::from_millis(self.sleep_tick_ms)
    }

    pub fn max_sleep(&self) -> Duration {
        Duration::from_secs(self.max_sleep_secs)
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    pub fn timing(&self) -> Timing {
        Timing {
            game_poll: Duration::from_secs(self.game_poll_secs),
            post_game: Duration::from_secs(self.post_game_minutes * 60),
            max_sleep: self.max_sleep(),
            max_live_failures: self.max_live_failures,
        }
    }
}
