use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};
use std::fmt;
use std::ops::Deref;

use crate::leagues::LeagueId;

/// Short text with a fixed character capacity.
///
/// Anything past `N` characters is dropped on construction, so a label can
/// never grow past the size the display layout was built for.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Label<const N: usize>(String);

impl<const N: usize> Label<N> {
    pub fn new(text: &str) -> Self {
        Label(text.chars().take(N).collect())
    }

    pub fn empty() -> Self {
        Label(String::new())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl<const N: usize> Deref for Label<N> {
    type Target = str;

    fn deref(&self) -> &str {
        &self.0
    }
}

impl<const N: usize> fmt::Display for Label<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl<const N: usize> From<&str> for Label<N> {
    fn from(s: &str) -> Self {
        Label::new(s)
    }
}

impl<const N: usize> Serialize for Label<N> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

/// Win-loss(-tie) record, e.g. "45-30-7"
pub type Record = Label<8>;
/// Period / inning / quarter ordinal, e.g. "2nd", "OT", "pre"
pub type DivisionLabel = Label<4>;
/// Clock or inning half, e.g. "12:34", "top", "FINAL"
pub type ClockLabel = Label<5>;

/// The soonest qualifying game for the selected team.
///
/// `game_id == 0` means no upcoming game is known.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NextGame {
    pub game_id: u32,
    pub away_id: u16,
    pub home_id: u16,
    pub away_record: Record,
    pub home_record: Record,
    pub is_playoffs: bool,
    pub start_time: DateTime<Utc>,
    pub league: LeagueId,
}

impl NextGame {
    /// The "no upcoming game" sentinel.
    pub fn none(league: LeagueId) -> Self {
        NextGame {
            game_id: 0,
            away_id: 0,
            home_id: 0,
            away_record: Record::empty(),
            home_record: Record::empty(),
            is_playoffs: false,
            start_time: DateTime::<Utc>::UNIX_EPOCH,
            league,
        }
    }

    pub fn is_none(&self) -> bool {
        self.game_id == 0
    }
}

/// Normalized snapshot of a game in progress (or just finished).
///
/// League-specific extras are always present; leagues that don't use them
/// leave them at their defaults and the change detector ignores them.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CurrentGame {
    pub game_id: u32,
    pub league: LeagueId,
    pub away_id: u16,
    pub home_id: u16,
    pub away_score: u8,
    pub home_score: u8,
    pub division: DivisionLabel,
    pub time_remaining: ClockLabel,
    /// NHL only
    pub away_power_play: bool,
    /// NHL only
    pub home_power_play: bool,
    /// MLB only
    pub outs: u8,
    /// MLB only: runners on first, second, third
    pub bases: [bool; 3],
}

impl CurrentGame {
    pub fn new(game_id: u32, league: LeagueId, away_id: u16, home_id: u16) -> Self {
        CurrentGame {
            game_id,
            league,
            away_id,
            home_id,
            away_score: 0,
            home_score: 0,
            division: DivisionLabel::empty(),
            time_remaining: ClockLabel::empty(),
            away_power_play: false,
            home_power_play: false,
            outs: 0,
            bases: [false; 3],
        }
    }

    pub fn set_labels(&mut self, division: &str, time_remaining: &str) {
        self.division = DivisionLabel::new(division);
        // shootouts have no clock
        self.time_remaining = if division == "SO" {
            ClockLabel::empty()
        } else {
            ClockLabel::new(time_remaining)
        };
    }
}

/// Lifecycle tag owned by the tracker's state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum GameStatus {
    NewTeam,
    NoGames,
    Scheduled,
    Started,
    Finished,
    AfterGame,
}

impl fmt::Display for GameStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            GameStatus::NewTeam => "NEW_TEAM",
            GameStatus::NoGames => "NO_GAMES",
            GameStatus::Scheduled => "SCHEDULED",
            GameStatus::Started => "STARTED",
            GameStatus::Finished => "FINISHED",
            GameStatus::AfterGame => "AFTER_GAME",
        };
        f.write_str(s)
    }
}

/// The team being followed and the league it plays in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Selection {
    pub league: LeagueId,
    pub team_id: u16,
}
