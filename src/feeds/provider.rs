use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::db::models::{CurrentGame, NextGame};
use crate::error::FeedResult;
use crate::leagues::LeagueId;

/// One normalized live poll.
#[derive(Debug, Clone, PartialEq)]
pub struct LiveUpdate {
    pub game: CurrentGame,
    pub is_over: bool,
}

/// Trait every schedule/score source must implement.
#[async_trait]
pub trait GameFeed: Send + Sync {
    /// Soonest non-final game for `team_id` other than `exclude_game_id`,
    /// or the `game_id == 0` sentinel when the query window has none.
    async fn find_next_game(
        &self,
        as_of: DateTime<Utc>,
        team_id: u16,
        league: LeagueId,
        exclude_game_id: u32,
    ) -> FeedResult<NextGame>;

    /// Current state of a game. The known team ids fill in for feeds whose
    /// live payload doesn't carry them.
    async fn fetch_current_game(
        &self,
        game_id: u32,
        league: LeagueId,
        known_home_id: u16,
        known_away_id: u16,
    ) -> FeedResult<LiveUpdate>;

    /// Human-readable name for logging.
    fn name(&self) -> &str;
}
