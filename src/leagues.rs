//! Compiled-in table of supported leagues.
//!
//! Each entry carries everything the rest of the tracker needs to stay
//! league-agnostic: where the feeds live, which team ids exist, how records
//! are formatted and which status strings mean "over" or "postponed".

use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LeagueId {
    Nhl,
    Mlb,
    Nfl,
}

impl LeagueId {
    pub const ALL: [LeagueId; 3] = [LeagueId::Nhl, LeagueId::Mlb, LeagueId::Nfl];

    /// Stable numeric id used in persisted settings.
    pub fn numeric(self) -> u8 {
        match self {
            LeagueId::Nhl => 1,
            LeagueId::Mlb => 2,
            LeagueId::Nfl => 3,
        }
    }

    pub fn from_numeric(n: u8) -> Option<Self> {
        LeagueId::ALL.into_iter().find(|l| l.numeric() == n)
    }

    pub fn league(self) -> &'static League {
        resolve(self)
    }
}

impl fmt::Display for LeagueId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(resolve(*self).name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Team {
    pub id: u16,
    pub code: &'static str,
}

/// Payload family a league's feeds belong to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Adapter {
    /// StatsAPI schedule with numeric `statusCode`; linescore carries team ids
    /// and a "Final" clock marker.
    StatsNumeric,
    /// StatsAPI schedule with `abstractGameState`; linescore has no ids and no
    /// terminal marker, so completion is confirmed against the schedule.
    StatsAbstract,
    /// ESPN-style events with a `competitors` list and `status.type.state`.
    CompetitorList,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordFormat {
    /// "W-L"
    WinsLosses,
    /// "W-L-OT"
    WinsLossesOt,
}

#[derive(Debug, Clone, Copy)]
pub struct StatusVocabulary {
    /// Schedule status values meaning the game is over
    pub terminal: &'static [&'static str],
    /// Schedule status values meaning the game won't be played as scheduled
    pub postponed: &'static [&'static str],
    /// Game-type / season-type values meaning postseason
    pub playoff: &'static [&'static str],
}

impl StatusVocabulary {
    pub fn is_terminal(&self, status: &str) -> bool {
        self.terminal.contains(&status)
    }

    pub fn is_postponed(&self, status: &str) -> bool {
        self.postponed.contains(&status)
    }

    pub fn is_playoff(&self, game_type: &str) -> bool {
        self.playoff.contains(&game_type)
    }
}

#[derive(Debug)]
pub struct League {
    pub id: LeagueId,
    pub name: &'static str,
    pub base_url: &'static str,
    pub schedule_path: &'static str,
    /// `{id}` is replaced with the game id
    pub live_path: &'static str,
    pub teams: &'static [Team],
    pub default_team: u16,
    pub adapter: Adapter,
    pub record_format: RecordFormat,
    pub vocabulary: StatusVocabulary,
    /// Time label shown once the game is over
    pub final_label: &'static str,
    /// First period/inning at which the game may plausibly be over
    pub final_period: u8,
}

impl League {
    pub fn team(&self, team_id: u16) -> Option<&'static Team> {
        self.teams.iter().find(|t| t.id == team_id)
    }

    pub fn has_team(&self, team_id: u16) -> bool {
        self.team(team_id).is_some()
    }

    /// Whether outs and base runners are part of the live state.
    pub fn tracks_bases(&self) -> bool {
        self.id == LeagueId::Mlb
    }

    /// Whether power-play flags are part of the live state.
    pub fn tracks_power_play(&self) -> bool {
        self.id == LeagueId::Nhl
    }

    pub fn live_path_for(&self, game_id: u32) -> String {
        self.live_path.replace("{id}", &game_id.to_string())
    }
}

pub fn resolve(id: LeagueId) -> &'static League {
    match id {
        LeagueId::Nhl => &NHL,
        LeagueId::Mlb => &MLB,
        LeagueId::Nfl => &NFL,
    }
}

/// Three-letter code for a team, or `None` if the id isn't on the roster.
pub fn team_code(league: LeagueId, team_id: u16) -> Option<&'static str> {
    resolve(league).team(team_id).map(|t| t.code)
}

/// Team code for display purposes; unknown ids render as "ERR".
pub fn team_code_or_err(league: LeagueId, team_id: u16) -> &'static str {
    team_code(league, team_id).unwrap_or("ERR")
}

pub static NHL: League = League {
    id: LeagueId::Nhl,
    name: "NHL",
    base_url: "https://statsapi.web.nhl.com/api/v1",
    schedule_path: "/schedule",
    live_path: "/game/{id}/linescore",
    teams: NHL_TEAMS,
    default_team: 24,
    adapter: Adapter::StatsNumeric,
    record_format: RecordFormat::WinsLossesOt,
    vocabulary: StatusVocabulary {
        // 5 = Game Over, 6/7 = Final
        terminal: &["5", "6", "7"],
        postponed: &["9"],
        playoff: &["P"],
    },
    final_label: "Final",
    final_period: 3,
};

pub static MLB: League = League {
    id: LeagueId::Mlb,
    name: "MLB",
    base_url: "https://statsapi.mlb.com/api/v1",
    schedule_path: "/schedule",
    live_path: "/game/{id}/linescore",
    teams: MLB_TEAMS,
    default_team: 109,
    adapter: Adapter::StatsAbstract,
    record_format: RecordFormat::WinsLosses,
    vocabulary: StatusVocabulary {
        terminal: &["Final"],
        postponed: &["Postponed", "Cancelled"],
        playoff: &["F", "D", "L", "W"],
    },
    final_label: "FINAL",
    final_period: 5,
};

pub static NFL: League = League {
    id: LeagueId::Nfl,
    name: "NFL",
    base_url: "https://site.api.espn.com/apis/site/v2/sports/football/nfl",
    schedule_path: "/scoreboard",
    live_path: "/scoreboard/{id}",
    teams: NFL_TEAMS,
    default_team: 12,
    adapter: Adapter::CompetitorList,
    record_format: RecordFormat::WinsLosses,
    vocabulary: StatusVocabulary {
        terminal: &["post"],
        postponed: &["STATUS_POSTPONED", "STATUS_CANCELED"],
        playoff: &["3"],
    },
    final_label: "FINAL",
    final_period: 4,
};

const fn t(id: u16, code: &'static str) -> Team {
    Team { id, code }
}

static NHL_TEAMS: &[Team] = &[
    t(24, "ANA"),
    t(53, "ARI"),
    t(6, "BOS"),
    t(7, "BUF"),
    t(12, "CAR"),
    t(29, "CBJ"),
    t(20, "CGY"),
    t(16, "CHI"),
    t(21, "COL"),
    t(25, "DAL"),
    t(17, "DET"),
    t(22, "EDM"),
    t(13, "FLA"),
    t(26, "LAK"),
    t(30, "MIN"),
    t(8, "MTL"),
    t(1, "NJD"),
    t(18, "NSH"),
    t(2, "NYI"),
    t(3, "NYR"),
    t(9, "OTT"),
    t(4, "PHI"),
    t(5, "PIT"),
    t(55, "SEA"),
    t(28, "SJS"),
    t(19, "STL"),
    t(14, "TBL"),
    t(10, "TOR"),
    t(23, "VAN"),
    t(54, "VGK"),
    t(52, "WPG"),
    t(15, "WSH"),
];

static MLB_TEAMS: &[Team] = &[
    t(109, "ARI"),
    t(144, "ATL"),
    t(110, "BAL"),
    t(111, "BOS"),
    t(112, "CHC"),
    t(145, "CWS"),
    t(113, "CIN"),
    t(114, "CLE"),
    t(115, "COL"),
    t(116, "DET"),
    t(117, "HOU"),
    t(118, "KCR"),
    t(108, "LAA"),
    t(119, "LAD"),
    t(146, "MIA"),
    t(158, "MIL"),
    t(142, "MIN"),
    t(121, "NYM"),
    t(147, "NYY"),
    t(133, "OAK"),
    t(143, "PHI"),
    t(134, "PIT"),
    t(135, "SDP"),
    t(137, "SFG"),
    t(136, "SEA"),
    t(138, "STL"),
    t(139, "TBR"),
    t(140, "TEX"),
    t(141, "TOR"),
    t(120, "WSH"),
];

static NFL_TEAMS: &[Team] = &[
    t(22, "ARI"),
    t(1, "ATL"),
    t(33, "BAL"),
    t(2, "BUF"),
    t(29, "CAR"),
    t(3, "CHI"),
    t(4, "CIN"),
    t(5, "CLE"),
    t(6, "DAL"),
    t(7, "DEN"),
    t(8, "DET"),
    t(9, "GNB"),
    t(34, "HOU"),
    t(11, "IND"),
    t(30, "JAX"),
    t(12, "KAN"),
    t(13, "LVR"),
    t(24, "LAC"),
    t(14, "LAR"),
    t(15, "MIA"),
    t(16, "MIN"),
    t(17, "NWE"),
    t(18, "NOR"),
    t(19, "NYG"),
    t(20, "NYJ"),
    t(21, "PHI"),
    t(23, "PIT"),
    t(25, "SFO"),
    t(26, "SEA"),
    t(27, "TAM"),
    t(10, "TEN"),
    t(28, "WAS"),
];
