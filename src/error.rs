use thiserror::Error;

use crate::leagues::LeagueId;

/// Failures raised while talking to a league feed.
///
/// Transport and status failures are transient: the tracker simply tries
/// again on its next poll. So is a schedule that parses as JSON but not into
/// the expected shape. Any other 200 response that can't be decoded means the
/// feed changed under us, which is fatal.
#[derive(Debug, Error)]
pub enum FeedError {
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("malformed response from {url}: {source}")]
    Malformed {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("unexpected schedule shape from {url}: {source}")]
    ScheduleShape {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid feed URL: {0}")]
    BadUrl(#[from] url::ParseError),

    #[error("no league with id {0}")]
    UnknownLeague(u8),

    #[error("team {team_id} is not on the {league} roster")]
    UnknownTeam { league: LeagueId, team_id: u16 },

    #[error("{consecutive} live updates in a row failed, last: {last}")]
    LiveFeedLost { consecutive: u32, last: String },
}

impl FeedError {
    pub fn is_fatal(&self) -> bool {
        match self {
            FeedError::Transport { .. }
            | FeedError::Status { .. }
            | FeedError::ScheduleShape { .. } => false,
            FeedError::Malformed { .. }
            | FeedError::BadUrl(_)
            | FeedError::UnknownLeague(_)
            | FeedError::UnknownTeam { .. }
            | FeedError::LiveFeedLost { .. } => true,
        }
    }
}

pub type FeedResult<T> = std::result::Result<T, FeedError>;
