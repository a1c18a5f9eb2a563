pub mod espn;
pub mod http;
pub mod provider;
pub mod statsapi;

pub use http::JsonClient;
pub use provider::{GameFeed, LiveUpdate};

use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use serde_json::error::Category;
use std::time::Duration;
use tracing::{debug, info};

use crate::db::models::{CurrentGame, NextGame};
use crate::error::{FeedError, FeedResult};
use crate::leagues::{team_code_or_err, Adapter, League, LeagueId};

/// How far back and forward the schedule query reaches from `as_of`.
const WINDOW_BACK_DAYS: i64 = 1;
const WINDOW_AHEAD_DAYS: i64 = 7;

/// HTTP-backed [`GameFeed`] covering every league in the registry.
pub struct LeagueFeed {
    client: JsonClient,
}

impl LeagueFeed {
    pub fn new(timeout: Duration) -> anyhow::Result<Self> {
        Ok(LeagueFeed {
            client: JsonClient::new(timeout)?,
        })
    }

    #[cfg(test)]
    fn with_client(client: JsonClient) -> Self {
        LeagueFeed { client }
    }

    async fn fetch_live(
        &self,
        league: &League,
        game_id: u32,
        known_home_id: u16,
        known_away_id: u16,
    ) -> FeedResult<LiveUpdate> {
        let url = match league.adapter {
            Adapter::CompetitorList => espn::live_url(league, game_id)?,
            _ => statsapi::live_url(league, game_id)?,
        };

        match league.adapter {
            Adapter::StatsNumeric => {
                let line: statsapi::NhlLinescore = self.client.get(&url).await?;
                Ok(statsapi::normalize_nhl(game_id, league, &line))
            }
            Adapter::StatsAbstract => {
                let line: statsapi::MlbLinescore = self.client.get(&url).await?;
                let confirmed_final = if line.needs_final_check(league) {
                    let check_url = statsapi::game_schedule_url(league, game_id)?;
                    let schedule: statsapi::ScheduleResponse = self.client.get(&check_url).await?;
                    let done = statsapi::schedule_reports_final(&schedule, league);
                    debug!("Game {} final check at inning {}: {}", game_id, line.current_inning, done);
                    done
                } else {
                    false
                };
                Ok(statsapi::normalize_mlb(
                    game_id,
                    league,
                    known_home_id,
                    known_away_id,
                    &line,
                    confirmed_final,
                ))
            }
            Adapter::CompetitorList => {
                let event: espn::EspnEvent = self.client.get(&url).await?;
                Ok(espn::normalize_event(
                    game_id,
                    league,
                    known_home_id,
                    known_away_id,
                    &event,
                ))
            }
        }
    }
}

#[async_trait]
impl GameFeed for LeagueFeed {
    fn name(&self) -> &str {
        "league-feed"
    }

    async fn find_next_game(
        &self,
        as_of: DateTime<Utc>,
        team_id: u16,
        league: LeagueId,
        exclude_game_id: u32,
    ) -> FeedResult<NextGame> {
        let league = league.league();
        if !league.has_team(team_id) {
            return Err(FeedError::UnknownTeam {
                league: league.id,
                team_id,
            });
        }

        let start = (as_of - ChronoDuration::days(WINDOW_BACK_DAYS)).date_naive();
        let end = (as_of + ChronoDuration::days(WINDOW_AHEAD_DAYS)).date_naive();

        let next = match league.adapter {
            Adapter::StatsNumeric | Adapter::StatsAbstract => {
                let url = statsapi::schedule_url(league, team_id, start, end)?;
                let schedule: statsapi::ScheduleResponse =
                    self.client.get(&url).await.map_err(schedule_failure)?;
                statsapi::select_next_game(&schedule, league, exclude_game_id)
            }
            Adapter::CompetitorList => {
                let url = espn::schedule_url(league, start, end)?;
                let scoreboard: espn::ScoreboardResponse =
                    self.client.get(&url).await.map_err(schedule_failure)?;
                espn::select_next_game(&scoreboard, league, team_id, exclude_game_id)
            }
        };

        log_next_game(&next);
        Ok(next)
    }

    async fn fetch_current_game(
        &self,
        game_id: u32,
        league: LeagueId,
        known_home_id: u16,
        known_away_id: u16,
    ) -> FeedResult<LiveUpdate> {
        let update = self
            .fetch_live(league.league(), game_id, known_home_id, known_away_id)
            .await?;
        log_current_game(&update.game, update.is_over);
        Ok(update)
    }
}

/// Valid JSON in the wrong shape is retried on the next cycle; only a body
/// that isn't JSON at all stays fatal.
fn schedule_failure(err: FeedError) -> FeedError {
    match err {
        FeedError::Malformed { url, source } if source.classify() == Category::Data => {
            FeedError::ScheduleShape { url, source }
        }
        other => other,
    }
}

pub fn log_next_game(game: &NextGame) {
    if game.is_none() {
        info!("NextGame [{}]: none in window", game.league);
        return;
    }
    info!(
        "NextGame [{}] #{}: {} ({}) @ {} ({}) at {}{}",
        game.league,
        game.game_id,
        team_code_or_err(game.league, game.away_id),
        game.away_record,
        team_code_or_err(game.league, game.home_id),
        game.home_record,
        game.start_time.to_rfc3339(),
        if game.is_playoffs { " [playoffs]" } else { "" },
    );
}

pub fn log_current_game(game: &CurrentGame, is_over: bool) {
    info!(
        "CurrentGame [{}] #{}: {} {} - {} {} | {} {}{}",
        game.league,
        game.game_id,
        team_code_or_err(game.league, game.away_id),
        game.away_score,
        team_code_or_err(game.league, game.home_id),
        game.home_score,
        game.division,
        game.time_remaining,
        if is_over { " (over)" } else { "" },
    );
}
