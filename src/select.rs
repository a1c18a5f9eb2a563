//! Interactive team picker driven by the single button.

use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;
use tracing::info;

use crate::db::models::Selection;
use crate::display::Display;
use crate::leagues::{LeagueId, Team};
use crate::tracker::{PollScheduler, SleepOutcome, Wait};

/// Runs whenever the tracker needs a (new) team.
#[async_trait]
pub trait TeamSelector: Send + Sync {
    async fn select(&self, current: Selection) -> Selection;
}

/// One slot in the picker's carousel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TeamChoice {
    Team { league: LeagueId, team_id: u16 },
    /// Jump to another league's roster.
    League { league: LeagueId },
}

/// The carousel for `league`: its roster, then one entry per other league.
pub fn choices(league: LeagueId) -> Vec<TeamChoice> {
    let roster = league.league().teams.iter().map(|t: &Team| TeamChoice::Team {
        league,
        team_id: t.id,
    });
    let others = LeagueId::ALL
        .into_iter()
        .filter(|l| *l != league)
        .map(|l| TeamChoice::League { league: l });
    roster.chain(others).collect()
}

/// Short press advances, long press picks.
pub struct ButtonTeamPicker {
    display: Arc<dyn Display>,
    scheduler: Arc<PollScheduler>,
}

impl ButtonTeamPicker {
    pub fn new(display: Arc<dyn Display>, scheduler: Arc<PollScheduler>) -> Self {
        ButtonTeamPicker { display, scheduler }
    }
}

#[async_trait]
impl TeamSelector for ButtonTeamPicker {
    async fn select(&self, current: Selection) -> Selection {
        let mut league = current.league;
        let mut carousel = choices(league);
        let mut idx = carousel
            .iter()
            .position(|c| {
                *c == TeamChoice::Team {
                    league,
                    team_id: current.team_id,
                }
            })
            .unwrap_or(0);

        info!("Team selection: short press = next, long press = choose");
        loop {
            let choice = carousel[idx];
            self.display.show_team_choice(&choice);

            match self.scheduler.wait(Wait::Forever).await {
                SleepOutcome::Dismissed | SleepOutcome::Completed => {
                    idx = (idx + 1) % carousel.len();
                }
                SleepOutcome::Interrupted => match choice {
                    TeamChoice::Team { league, team_id } => {
                        info!("Selected team {} in {}", team_id, league);
                        return Selection { league, team_id };
                    }
                    TeamChoice::League { league: next } => {
                        info!("Switched picker to {}", next);
                        league = next;
                        carousel = choices(league);
                        idx = 0;
                    }
                },
            }
        }
    }
}
