//! ESPN site-API wire types for competitor-list leagues.
//!
//! Events carry a `competitors` array tagged `homeAway` instead of fixed
//! home/away objects, scores arrive as strings and ids as numeric strings.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::Deserialize;
use tracing::warn;
use url::Url;

use crate::db::models::{CurrentGame, NextGame, Record};
use crate::error::FeedResult;
use crate::leagues::League;

use super::http::skip_unreadable;
use super::provider::LiveUpdate;

#[derive(Debug, Deserialize, Default)]
pub struct ScoreboardResponse {
    #[serde(default, deserialize_with = "skip_unreadable")]
    pub events: Vec<EspnEvent>,
}

#[derive(Debug, Deserialize)]
pub struct EspnEvent {
    pub id: String,
    pub date: String,
    pub season: Option<EspnSeason>,
    pub status: EspnStatus,
    #[serde(default)]
    pub competitions: Vec<EspnCompetition>,
}

#[derive(Debug, Deserialize)]
pub struct EspnSeason {
    #[serde(rename = "type")]
    pub season_type: u8,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EspnStatus {
    #[serde(default)]
    pub period: u8,
    #[serde(default)]
    pub display_clock: String,
    #[serde(rename = "type")]
    pub status_type: EspnStatusType,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EspnStatusType {
    #[serde(default)]
    pub name: String, // "STATUS_SCHEDULED", "STATUS_IN_PROGRESS", "STATUS_HALFTIME", "STATUS_FINAL"
    #[serde(default)]
    pub state: String, // "pre" | "in" | "post"
    #[serde(default)]
    pub completed: bool,
}

#[derive(Debug, Deserialize)]
pub struct EspnCompetition {
    #[serde(default)]
    pub competitors: Vec<EspnCompetitor>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EspnCompetitor {
    pub home_away: String,
    pub team: EspnTeamRef,
    pub score: Option<String>,
    #[serde(default)]
    pub records: Vec<EspnRecord>,
}

#[derive(Debug, Deserialize)]
pub struct EspnTeamRef {
    pub id: String,
}

#[derive(Debug, Deserialize)]
pub struct EspnRecord {
    #[serde(default)]
    pub summary: String,
}

pub fn schedule_url(league: &League, start: NaiveDate, end: NaiveDate) -> FeedResult<Url> {
    let base = format!("{}{}", league.base_url, league.schedule_path);
    let dates = format!("{}-{}", start.format("%Y%m%d"), end.format("%Y%m%d"));
    Ok(Url::parse_with_params(
        &base,
        &[("dates", dates.as_str()), ("limit", "200")],
    )?)
}

pub fn live_url(league: &League, game_id: u32) -> FeedResult<Url> {
    Ok(Url::parse(&format!(
        "{}{}",
        league.base_url,
        league.live_path_for(game_id)
    ))?)
}

/// ESPN dates come as "2024-09-06T00:20Z" (no seconds) or full RFC 3339.
fn parse_event_date(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|d| d.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%MZ")
                .ok()
                .map(|n| n.and_utc())
        })
}

impl EspnEvent {
    fn competitors(&self) -> &[EspnCompetitor] {
        self.competitions
            .first()
            .map(|c| c.competitors.as_slice())
            .unwrap_or_default()
    }

    fn side(&self, home_away: &str) -> Option<&EspnCompetitor> {
        self.competitors().iter().find(|c| c.home_away == home_away)
    }

    fn involves(&self, team_id: u16) -> bool {
        self.competitors()
            .iter()
            .any(|c| c.team_id() == Some(team_id))
    }

    fn is_terminal(&self, league: &League) -> bool {
        self.status.status_type.completed
            || league.vocabulary.is_terminal(&self.status.status_type.state)
    }

    fn is_postponed(&self, league: &League) -> bool {
        league.vocabulary.is_postponed(&self.status.status_type.name)
    }
}

impl EspnCompetitor {
    fn team_id(&self) -> Option<u16> {
        self.team.id.parse().ok()
    }

    fn score(&self) -> u8 {
        self.score
            .as_deref()
            .and_then(|s| s.trim().parse().ok())
            .unwrap_or(0)
    }

    /// ESPN already spells records "W-L".
    fn record(&self) -> Record {
        self.records
            .first()
            .map(|r| Record::new(&r.summary))
            .unwrap_or_default()
    }
}

/// Pick the first event for `team_id`, in chronological order, that is not
/// over, not postponed and not excluded.
pub fn select_next_game(
    scoreboard: &ScoreboardResponse,
    league: &League,
    team_id: u16,
    exclude_game_id: u32,
) -> NextGame {
    let mut candidates: Vec<(DateTime<Utc>, u32, &EspnEvent)> = scoreboard
        .events
        .iter()
        .filter(|ev| ev.involves(team_id))
        .filter_map(|ev| {
            let Some(start) = parse_event_date(&ev.date) else {
                warn!(
                    "Skipping {} event {} with unreadable date {:?}",
                    league.name, ev.id, ev.date
                );
                return None;
            };
            let game_id = ev.id.parse::<u32>().ok()?;
            Some((start, game_id, ev))
        })
        .collect();
    candidates.sort_by_key(|(start, _, _)| *start);

    for (start, game_id, ev) in candidates {
        if game_id == 0
            || game_id == exclude_game_id
            || ev.is_terminal(league)
            || ev.is_postponed(league)
        {
            continue;
        }
        let (Some(away), Some(home)) = (ev.side("away"), ev.side("home")) else {
            continue;
        };
        let (Some(away_id), Some(home_id)) = (away.team_id(), home.team_id()) else {
            continue;
        };
        let is_playoffs = ev
            .season
            .as_ref()
            .is_some_and(|s| league.vocabulary.is_playoff(&s.season_type.to_string()));
        return NextGame {
            game_id,
            away_id,
            home_id,
            away_record: away.record(),
            home_record: home.record(),
            is_playoffs,
            start_time: start,
            league: league.id,
        };
    }

    NextGame::none(league.id)
}

fn quarter_label(period: u8) -> String {
    match period {
        1 => "1st".to_string(),
        2 => "2nd".to_string(),
        3 => "3rd".to_string(),
        4 => "4th".to_string(),
        5 => "OT".to_string(),
        n => format!("{}OT", n.saturating_sub(4)),
    }
}

pub fn normalize_event(
    game_id: u32,
    league: &League,
    known_home_id: u16,
    known_away_id: u16,
    ev: &EspnEvent,
) -> LiveUpdate {
    let away = ev.side("away");
    let home = ev.side("home");
    let away_id = away.and_then(|c| c.team_id()).unwrap_or(known_away_id);
    let home_id = home.and_then(|c| c.team_id()).unwrap_or(known_home_id);

    let mut game = CurrentGame::new(game_id, league.id, away_id, home_id);
    let status = &ev.status;

    if status.status_type.state == "pre" || (status.period == 0 && !ev.is_terminal(league)) {
        game.set_labels("pre", "");
        return LiveUpdate { game, is_over: false };
    }

    game.away_score = away.map(|c| c.score()).unwrap_or(0);
    game.home_score = home.map(|c| c.score()).unwrap_or(0);

    if ev.is_postponed(league) {
        warn!("{} game {} is postponed, still polling", league.name, game_id);
        game.set_labels("PPD", "");
        return LiveUpdate { game, is_over: false };
    }

    if ev.is_terminal(league) {
        game.set_labels("", league.final_label);
        return LiveUpdate { game, is_over: true };
    }

    if status.status_type.name == "STATUS_HALFTIME" {
        game.set_labels("Half", "");
    } else {
        game.set_labels(&quarter_label(status.period), &status.display_clock);
    }
    LiveUpdate { game, is_over: false }
}
