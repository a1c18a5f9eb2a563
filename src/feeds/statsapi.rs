//! StatsAPI wire types and normalization, shared by the NHL and MLB feeds.
//!
//! Both leagues serve the same schedule document. They differ in how a game's
//! status is spelled (numeric `statusCode` for NHL, `abstractGameState` for
//! MLB) and in their linescores: the NHL one carries team ids and a "Final"
//! clock marker, the MLB one carries neither.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;
use url::Url;

use crate::db::models::{CurrentGame, NextGame, Record};
use crate::error::FeedResult;
use crate::leagues::{Adapter, League, RecordFormat};

use super::http::skip_unreadable;
use super::provider::LiveUpdate;

// ── Schedule ─────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize, Default)]
pub struct ScheduleResponse {
    #[serde(default, deserialize_with = "skip_unreadable")]
    pub dates: Vec<ScheduleDate>,
}

#[derive(Debug, Deserialize)]
pub struct ScheduleDate {
    #[serde(default, deserialize_with = "skip_unreadable")]
    pub games: Vec<ScheduleGame>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleGame {
    pub game_pk: u32,
    #[serde(default)]
    pub game_type: String,
    pub game_date: DateTime<Utc>,
    pub status: ScheduleStatus,
    pub teams: ScheduleTeams,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleStatus {
    #[serde(default)]
    pub abstract_game_state: String,
    #[serde(default)]
    pub status_code: String,
    #[serde(default)]
    pub detailed_state: String,
}

#[derive(Debug, Deserialize)]
pub struct ScheduleTeams {
    pub away: ScheduleSide,
    pub home: ScheduleSide,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleSide {
    pub team: TeamRef,
    #[serde(default)]
    pub league_record: LeagueRecord,
}

#[derive(Debug, Deserialize)]
pub struct TeamRef {
    pub id: u16,
}

#[derive(Debug, Deserialize, Default)]
pub struct LeagueRecord {
    #[serde(default)]
    pub wins: u16,
    #[serde(default)]
    pub losses: u16,
    #[serde(default)]
    pub ot: u16,
}

pub fn schedule_url(
    league: &League,
    team_id: u16,
    start: NaiveDate,
    end: NaiveDate,
) -> FeedResult<Url> {
    let base = format!("{}{}", league.base_url, league.schedule_path);
    let url = Url::parse_with_params(
        &base,
        &[
            ("sportId", "1".to_string()),
            ("teamId", team_id.to_string()),
            ("startDate", start.format("%Y-%m-%d").to_string()),
            ("endDate", end.format("%Y-%m-%d").to_string()),
        ],
    )?;
    Ok(url)
}

/// Schedule lookup for a single game, used to confirm MLB completion.
pub fn game_schedule_url(league: &League, game_id: u32) -> FeedResult<Url> {
    let base = format!("{}{}", league.base_url, league.schedule_path);
    Ok(Url::parse_with_params(&base, &[("gamePk", game_id.to_string())])?)
}

pub fn live_url(league: &League, game_id: u32) -> FeedResult<Url> {
    Ok(Url::parse(&format!(
        "{}{}",
        league.base_url,
        league.live_path_for(game_id)
    ))?)
}

impl ScheduleStatus {
    fn is_terminal(&self, league: &League) -> bool {
        match league.adapter {
            Adapter::StatsNumeric => league.vocabulary.is_terminal(&self.status_code),
            _ => league.vocabulary.is_terminal(&self.abstract_game_state),
        }
    }

    fn is_postponed(&self, league: &League) -> bool {
        match league.adapter {
            Adapter::StatsNumeric => league.vocabulary.is_postponed(&self.status_code),
            _ => league.vocabulary.is_postponed(&self.detailed_state),
        }
    }
}

/// Pick the first game in chronological order that is neither over,
/// postponed, nor the one being excluded.
pub fn select_next_game(
    schedule: &ScheduleResponse,
    league: &League,
    exclude_game_id: u32,
) -> NextGame {
    let mut games: Vec<&ScheduleGame> = schedule.dates.iter().flat_map(|d| &d.games).collect();
    // stable, so doubleheaders keep feed order
    games.sort_by_key(|g| g.game_date);

    games
        .into_iter()
        .find(|g| {
            g.game_pk != 0
                && g.game_pk != exclude_game_id
                && !g.status.is_terminal(league)
                && !g.status.is_postponed(league)
        })
        .map(|g| NextGame {
            game_id: g.game_pk,
            away_id: g.teams.away.team.id,
            home_id: g.teams.home.team.id,
            away_record: format_record(league.record_format, &g.teams.away.league_record),
            home_record: format_record(league.record_format, &g.teams.home.league_record),
            is_playoffs: league.vocabulary.is_playoff(&g.game_type),
            start_time: g.game_date,
            league: league.id,
        })
        .unwrap_or_else(|| NextGame::none(league.id))
}

fn format_record(format: RecordFormat, r: &LeagueRecord) -> Record {
    match format {
        RecordFormat::WinsLossesOt => Record::new(&format!("{}-{}-{}", r.wins, r.losses, r.ot)),
        RecordFormat::WinsLosses => Record::new(&format!("{}-{}", r.wins, r.losses)),
    }
}

/// Whether the single-game schedule lookup reports the game as over.
/// An empty lookup means "not confirmed". MLB marks a postponed game
/// "Final" too, which doesn't count.
pub fn schedule_reports_final(schedule: &ScheduleResponse, league: &League) -> bool {
    schedule
        .dates
        .first()
        .and_then(|d| d.games.first())
        .is_some_and(|g| g.status.is_terminal(league) && !g.status.is_postponed(league))
}

// ── NHL linescore ────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NhlLinescore {
    #[serde(default)]
    pub current_period: u8,
    pub current_period_ordinal: Option<String>,
    pub current_period_time_remaining: Option<String>,
    pub teams: NhlLineTeams,
}

#[derive(Debug, Deserialize)]
pub struct NhlLineTeams {
    pub home: NhlLineSide,
    pub away: NhlLineSide,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NhlLineSide {
    pub team: TeamRef,
    #[serde(default)]
    pub goals: u8,
    #[serde(default)]
    pub power_play: bool,
}

pub fn normalize_nhl(game_id: u32, league: &League, line: &NhlLinescore) -> LiveUpdate {
    let mut game = CurrentGame::new(game_id, league.id, line.teams.away.team.id, line.teams.home.team.id);
    game.away_score = line.teams.away.goals;
    game.home_score = line.teams.home.goals;

    if line.current_period == 0 {
        game.set_labels("pre", "");
        return LiveUpdate { game, is_over: false };
    }

    let remaining = line.current_period_time_remaining.as_deref().unwrap_or("");
    if remaining.eq_ignore_ascii_case(league.final_label) {
        game.set_labels("", league.final_label);
        return LiveUpdate { game, is_over: true };
    }

    game.set_labels(line.current_period_ordinal.as_deref().unwrap_or(""), remaining);
    game.away_power_play = line.teams.away.power_play;
    game.home_power_play = line.teams.home.power_play;
    LiveUpdate { game, is_over: false }
}

// ── MLB linescore ────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MlbLinescore {
    #[serde(default)]
    pub current_inning: u8,
    pub current_inning_ordinal: Option<String>,
    #[serde(default)]
    pub is_top_inning: bool,
    #[serde(default)]
    pub outs: u8,
    #[serde(default)]
    pub teams: MlbLineTeams,
    #[serde(default)]
    pub offense: MlbOffense,
}

#[derive(Debug, Deserialize, Default)]
pub struct MlbLineTeams {
    #[serde(default)]
    pub home: MlbLineSide,
    #[serde(default)]
    pub away: MlbLineSide,
}

#[derive(Debug, Deserialize, Default)]
pub struct MlbLineSide {
    #[serde(default)]
    pub runs: u8,
}

/// Only presence matters: a key exists when a runner is on that base.
#[derive(Debug, Deserialize, Default)]
pub struct MlbOffense {
    pub first: Option<serde_json::Value>,
    pub second: Option<serde_json::Value>,
    pub third: Option<serde_json::Value>,
}

impl MlbLinescore {
    /// From the shortest official game on, a quiet linescore may mean the
    /// game is over (rain-shortened games never reach the 9th), which only
    /// the schedule feed can confirm.
    pub fn needs_final_check(&self, league: &League) -> bool {
        self.current_inning >= league.final_period
    }
}

pub fn normalize_mlb(
    game_id: u32,
    league: &League,
    known_home_id: u16,
    known_away_id: u16,
    line: &MlbLinescore,
    confirmed_final: bool,
) -> LiveUpdate {
    let mut game = CurrentGame::new(game_id, league.id, known_away_id, known_home_id);

    if line.current_inning == 0 {
        game.set_labels("pre", "");
        return LiveUpdate { game, is_over: false };
    }

    game.home_score = line.teams.home.runs;
    game.away_score = line.teams.away.runs;

    if confirmed_final {
        game.set_labels("", league.final_label);
        return LiveUpdate { game, is_over: true };
    }

    let half = if line.is_top_inning { "top" } else { "bot" };
    game.set_labels(line.current_inning_ordinal.as_deref().unwrap_or(""), half);
    game.outs = line.outs.min(3);
    game.bases = [
        line.offense.first.is_some(),
        line.offense.second.is_some(),
        line.offense.third.is_some(),
    ];
    LiveUpdate { game, is_over: false }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feeds::http::decode;
    use crate::leagues::{LeagueId, MLB, NHL};

    const NHL_SCHEDULE: &str = r#"{
        "totalGames": 3,
        "dates": [
            {"date": "2019-01-21", "games": [{
                "gamePk": 2018020700, "gameType": "R",
                "gameDate": "2019-01-21T00:00:00Z",
                "status": {"abstractGameState": "Final", "statusCode": "7"},
                "teams": {
                    "away": {"leagueRecord": {"wins": 20, "losses": 20, "ot": 5}, "score": 3, "team": {"id": 10, "name": "Toronto Maple Leafs"}},
                    "home": {"leagueRecord": {"wins": 25, "losses": 15, "ot": 6}, "score": 2, "team": {"id": 6, "name": "Boston Bruins"}}
                }
            }]},
            {"date": "2019-01-23", "games": [{
                "gamePk": 2018020720, "gameType": "R",
                "gameDate": "2019-01-24T00:00:00Z",
                "status": {"abstractGameState": "Preview", "statusCode": "1"},
                "teams": {
                    "away": {"leagueRecord": {"wins": 21, "losses": 20, "ot": 5}, "team": {"id": 10}},
                    "home": {"leagueRecord": {"wins": 30, "losses": 12, "ot": 4}, "team": {"id": 8}}
                }
            }]},
            {"date": "2019-01-25", "games": [{
                "gamePk": 2018020740, "gameType": "R",
                "gameDate": "2019-01-26T00:00:00Z",
                "status": {"abstractGameState": "Preview", "statusCode": "1"},
                "teams": {
                    "away": {"team": {"id": 3}},
                    "home": {"team": {"id": 10}}
                }
            }]}
        ]
    }"#;

    fn nhl_schedule() -> ScheduleResponse {
        decode("nhl", NHL_SCHEDULE).unwrap()
    }

    #[test]
    fn test_skips_final_and_picks_first_upcoming() {
        let next = select_next_game(&nhl_schedule(), &NHL, 0);
        assert_eq!(next.game_id, 2018020720);
        assert_eq!(next.away_id, 10);
        assert_eq!(next.home_id, 8);
        assert_eq!(next.away_record.as_str(), "21-20-5");
        assert_eq!(next.home_record.as_str(), "30-12-4");
        assert!(!next.is_playoffs);
        assert_eq!(next.league, LeagueId::Nhl);
        assert_eq!(next.start_time.to_rfc3339(), "2019-01-24T00:00:00+00:00");
    }

    #[test]
    fn test_excluded_game_advances_to_following_one() {
        let next = select_next_game(&nhl_schedule(), &NHL, 2018020720);
        assert_eq!(next.game_id, 2018020740);
        // missing leagueRecord renders as zeros
        assert_eq!(next.home_record.as_str(), "0-0-0");
    }

    #[test]
    fn test_empty_and_all_final_windows_yield_sentinel() {
        let empty: ScheduleResponse = decode("nhl", r#"{"dates": []}"#).unwrap();
        assert!(select_next_game(&empty, &NHL, 0).is_none());

        let no_dates: ScheduleResponse = decode("nhl", r#"{"totalGames": 0}"#).unwrap();
        assert!(select_next_game(&no_dates, &NHL, 0).is_none());

        let all_final = NHL_SCHEDULE.replace(r#""statusCode": "1""#, r#""statusCode": "7""#);
        let all_final: ScheduleResponse = decode("nhl", &all_final).unwrap();
        assert!(select_next_game(&all_final, &NHL, 0).is_none());
    }

    const MLB_DOUBLEHEADER: &str = r#"{
        "dates": [{"date": "2019-07-04", "games": [
            {
                "gamePk": 565001, "gameType": "R", "doubleHeader": "Y",
                "gameDate": "2019-07-04T17:05:00Z",
                "status": {"abstractGameState": "Final", "detailedState": "Final", "statusCode": "F"},
                "teams": {
                    "away": {"leagueRecord": {"wins": 50, "losses": 35, "pct": ".588"}, "team": {"id": 147}},
                    "home": {"leagueRecord": {"wins": 40, "losses": 45, "pct": ".471"}, "team": {"id": 110}}
                }
            },
            {
                "gamePk": 565002, "gameType": "R", "doubleHeader": "Y",
                "gameDate": "2019-07-04T23:05:00Z",
                "status": {"abstractGameState": "Preview", "detailedState": "Scheduled", "statusCode": "S"},
                "teams": {
                    "away": {"leagueRecord": {"wins": 51, "losses": 35}, "team": {"id": 147}},
                    "home": {"leagueRecord": {"wins": 40, "losses": 46}, "team": {"id": 110}}
                }
            }
        ]}]
    }"#;

    #[test]
    fn test_doubleheader_second_game_after_first_is_final() {
        let schedule: ScheduleResponse = decode("mlb", MLB_DOUBLEHEADER).unwrap();
        let next = select_next_game(&schedule, &MLB, 0);
        assert_eq!(next.game_id, 565002);
        assert_eq!(next.away_record.as_str(), "51-35");
        assert_eq!(next.league, LeagueId::Mlb);
    }

    #[test]
    fn test_doubleheader_exclusion_before_first_is_marked_final() {
        let live_first = MLB_DOUBLEHEADER.replacen(
            r#""abstractGameState": "Final", "detailedState": "Final""#,
            r#""abstractGameState": "Live", "detailedState": "In Progress""#,
            1,
        );
        let schedule: ScheduleResponse = decode("mlb", &live_first).unwrap();
        assert_eq!(select_next_game(&schedule, &MLB, 0).game_id, 565001);
        assert_eq!(select_next_game(&schedule, &MLB, 565001).game_id, 565002);
    }

    #[test]
    fn test_postponed_game_is_skipped() {
        let postponed = MLB_DOUBLEHEADER.replace(
            r#""abstractGameState": "Preview", "detailedState": "Scheduled""#,
            r#""abstractGameState": "Preview", "detailedState": "Postponed""#,
        );
        let schedule: ScheduleResponse = decode("mlb", &postponed).unwrap();
        assert!(select_next_game(&schedule, &MLB, 0).is_none());
    }

    #[test]
    fn test_playoff_flag() {
        let playoff = MLB_DOUBLEHEADER.replace(r#""gameType": "R""#, r#""gameType": "W""#);
        let schedule: ScheduleResponse = decode("mlb", &playoff).unwrap();
        assert!(select_next_game(&schedule, &MLB, 0).is_playoffs);
    }

    #[test]
    fn test_schedule_url_window() {
        let start = NaiveDate::from_ymd_opt(2019, 1, 21).unwrap();
        let end = NaiveDate::from_ymd_opt(2019, 1, 29).unwrap();
        let url = schedule_url(&NHL, 10, start, end).unwrap();
        assert_eq!(
            url.as_str(),
            "https://statsapi.web.nhl.com/api/v1/schedule?sportId=1&teamId=10&startDate=2019-01-21&endDate=2019-01-29"
        );
        let url = game_schedule_url(&MLB, 565002).unwrap();
        assert_eq!(url.as_str(), "https://statsapi.mlb.com/api/v1/schedule?gamePk=565002");
        let url = live_url(&MLB, 565002).unwrap();
        assert_eq!(url.as_str(), "https://statsapi.mlb.com/api/v1/game/565002/linescore");
    }

    #[test]
    fn test_nhl_linescore_pregame() {
        let line: NhlLinescore = decode(
            "nhl",
            r#"{"currentPeriod": 0, "teams": {
                "home": {"team": {"id": 8}, "goals": 0, "shotsOnGoal": 0},
                "away": {"team": {"id": 10}, "goals": 0}
            }}"#,
        )
        .unwrap();
        let update = normalize_nhl(2018020720, &NHL, &line);
        assert!(!update.is_over);
        assert_eq!(update.game.division.as_str(), "pre");
        assert_eq!(update.game.time_remaining.as_str(), "");
        assert_eq!(update.game.home_id, 8);
        assert_eq!(update.game.away_id, 10);
    }

    #[test]
    fn test_nhl_linescore_in_progress_with_power_play() {
        let line: NhlLinescore = decode(
            "nhl",
            r#"{"currentPeriod": 2, "currentPeriodOrdinal": "2nd",
                "currentPeriodTimeRemaining": "12:34",
                "teams": {
                    "home": {"team": {"id": 8}, "goals": 1, "powerPlay": true, "numSkaters": 5},
                    "away": {"team": {"id": 10}, "goals": 2, "powerPlay": false, "numSkaters": 4}
                }}"#,
        )
        .unwrap();
        let update = normalize_nhl(2018020720, &NHL, &line);
        assert!(!update.is_over);
        assert_eq!(update.game.division.as_str(), "2nd");
        assert_eq!(update.game.time_remaining.as_str(), "12:34");
        assert_eq!((update.game.away_score, update.game.home_score), (2, 1));
        assert!(update.game.home_power_play);
        assert!(!update.game.away_power_play);
    }

    #[test]
    fn test_nhl_linescore_final() {
        let line: NhlLinescore = decode(
            "nhl",
            r#"{"currentPeriod": 3, "currentPeriodOrdinal": "3rd",
                "currentPeriodTimeRemaining": "Final",
                "teams": {"home": {"team": {"id": 8}, "goals": 4}, "away": {"team": {"id": 10}, "goals": 2}}}"#,
        )
        .unwrap();
        let update = normalize_nhl(2018020720, &NHL, &line);
        assert!(update.is_over);
        assert_eq!(update.game.division.as_str(), "");
        assert_eq!(update.game.time_remaining.as_str(), "Final");
        assert_eq!(update.game.home_score, 4);
    }

    #[test]
    fn test_nhl_shootout_has_no_clock() {
        let line: NhlLinescore = decode(
            "nhl",
            r#"{"currentPeriod": 5, "currentPeriodOrdinal": "SO",
                "currentPeriodTimeRemaining": "00:00",
                "teams": {"home": {"team": {"id": 8}, "goals": 3}, "away": {"team": {"id": 10}, "goals": 3}}}"#,
        )
        .unwrap();
        let update = normalize_nhl(1, &NHL, &line);
        assert_eq!(update.game.division.as_str(), "SO");
        assert_eq!(update.game.time_remaining.as_str(), "");
    }

    #[test]
    fn test_nhl_linescore_missing_teams_is_malformed() {
        let err = decode::<NhlLinescore>("nhl", r#"{"currentPeriod": 1}"#).unwrap_err();
        assert!(err.is_fatal());
    }

    const MLB_LINE_7TH: &str = r#"{
        "currentInning": 7, "currentInningOrdinal": "7th",
        "inningState": "Bottom", "isTopInning": false, "outs": 2,
        "teams": {"home": {"runs": 3, "hits": 7}, "away": {"runs": 5, "hits": 9}},
        "offense": {"batter": {"id": 1}, "first": {"id": 2}, "third": {"id": 3}}
    }"#;

    #[test]
    fn test_mlb_linescore_in_progress() {
        let line: MlbLinescore = decode("mlb", MLB_LINE_7TH).unwrap();
        let update = normalize_mlb(565002, &MLB, 110, 147, &line, false);
        assert!(!update.is_over);
        assert_eq!(update.game.division.as_str(), "7th");
        assert_eq!(update.game.time_remaining.as_str(), "bot");
        assert_eq!(update.game.outs, 2);
        assert_eq!(update.game.bases, [true, false, true]);
        assert_eq!((update.game.away_id, update.game.home_id), (147, 110));
        assert_eq!((update.game.away_score, update.game.home_score), (5, 3));
    }

    #[test]
    fn test_mlb_linescore_pregame() {
        let line: MlbLinescore = decode("mlb", r#"{"teams": {"home": {}, "away": {}}}"#).unwrap();
        let update = normalize_mlb(565002, &MLB, 110, 147, &line, false);
        assert!(!update.is_over);
        assert_eq!(update.game.division.as_str(), "pre");
    }

    #[test]
    fn test_final_check_starts_at_shortest_official_game() {
        let at = |inning: u8| {
            let json = MLB_LINE_7TH.replace(r#""currentInning": 7"#, &format!(r#""currentInning": {}"#, inning));
            decode::<MlbLinescore>("mlb", &json).unwrap().needs_final_check(&MLB)
        };
        assert!(!at(4));
        // a rain-shortened game can end here
        assert!(at(5));
        assert!(at(7));
        assert!(at(11));
    }

    #[test]
    fn test_mlb_ninth_inning_needs_confirmation() {
        let ninth = MLB_LINE_7TH
            .replace(r#""currentInning": 7"#, r#""currentInning": 9"#)
            .replace(r#""7th""#, r#""9th""#);
        let line: MlbLinescore = decode("mlb", &ninth).unwrap();
        assert!(line.needs_final_check(&MLB));

        let unconfirmed = normalize_mlb(565002, &MLB, 110, 147, &line, false);
        assert!(!unconfirmed.is_over);
        assert_eq!(unconfirmed.game.division.as_str(), "9th");

        let confirmed = normalize_mlb(565002, &MLB, 110, 147, &line, true);
        assert!(confirmed.is_over);
        assert_eq!(confirmed.game.division.as_str(), "");
        assert_eq!(confirmed.game.time_remaining.as_str(), "FINAL");
        assert_eq!(confirmed.game.home_score, 3);
    }

    #[test]
    fn test_unreadable_game_entry_is_skipped() {
        let placeholder = NHL_SCHEDULE.replacen(
            r#""date": "2019-01-23", "games": ["#,
            r#""date": "2019-01-23", "games": [{"gamePk": 1, "gameDate": "2019-01-23T00:00:00Z", "status": {"statusCode": "8"}},"#,
            1,
        );
        let schedule: ScheduleResponse = decode("nhl", &placeholder).unwrap();
        assert_eq!(select_next_game(&schedule, &NHL, 0).game_id, 2018020720);
    }

    #[test]
    fn test_schedule_reports_final() {
        let schedule: ScheduleResponse = decode("mlb", MLB_DOUBLEHEADER).unwrap();
        assert!(schedule_reports_final(&schedule, &MLB));
        let empty: ScheduleResponse = decode("mlb", r#"{"dates": []}"#).unwrap();
        assert!(!schedule_reports_final(&empty, &MLB));

        let postponed = MLB_DOUBLEHEADER.replacen(r#""detailedState": "Final""#, r#""detailedState": "Postponed""#, 1);
        let postponed: ScheduleResponse = decode("mlb", &postponed).unwrap();
        assert!(!schedule_reports_final(&postponed, &MLB));
    }
}
