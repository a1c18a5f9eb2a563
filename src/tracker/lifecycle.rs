use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use crate::clock::Clock;
use crate::db::models::{CurrentGame, GameStatus, NextGame, Selection};
use crate::error::{FeedError, FeedResult};
use crate::feeds::GameFeed;

use super::change::changed;
use super::scheduler::Wait;

/// Inputs to the state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    /// The previous wait ran to completion.
    Wake,
    /// Short press.
    Press,
    /// Long press: pick a different team.
    SwitchTeam,
    /// The selection UI returned.
    TeamSelected(Selection),
}

/// What the driver should do with the display after a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    ShowNextGame,
    ShowLiveGame,
    ShowNoGames,
    NoOp,
    SelectTeam,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub action: Action,
    pub wait: Wait,
}

impl Transition {
    fn new(action: Action, wait: Wait) -> Self {
        Transition { action, wait }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Timing {
    /// Live poll cadence, also the retry interval after a transient failure.
    pub game_poll: Duration,
    /// How long a final score stays up before moving on.
    pub post_game: Duration,
    pub max_sleep: Duration,
    /// Consecutive failed live polls tolerated before giving up.
    pub max_live_failures: u32,
}

/// Owns the game lifecycle: which feed to ask, when, and what to show.
///
/// State only changes through [`GameTracker::handle`].
pub struct GameTracker {
    status: GameStatus,
    selection: Selection,
    next_game: NextGame,
    current: Option<CurrentGame>,
    /// Game excluded from the next schedule lookup; 0 when none.
    tracked_game_id: u32,
    finished_at: Option<DateTime<Utc>>,
    live_failures: u32,
    feed: Arc<dyn GameFeed>,
    clock: Arc<dyn Clock>,
    timing: Timing,
}

impl GameTracker {
    pub fn new(
        selection: Selection,
        feed: Arc<dyn GameFeed>,
        clock: Arc<dyn Clock>,
        timing: Timing,
    ) -> Self {
        GameTracker {
            status: GameStatus::NewTeam,
            selection,
            next_game: NextGame::none(selection.league),
            current: None,
            tracked_game_id: 0,
            finished_at: None,
            live_failures: 0,
            feed,
            clock,
            timing,
        }
    }

    pub fn status(&self) -> GameStatus {
        self.status
    }

    pub fn selection(&self) -> Selection {
        self.selection
    }

    pub fn next_game(&self) -> &NextGame {
        &self.next_game
    }

    pub fn current_game(&self) -> Option<&CurrentGame> {
        self.current.as_ref()
    }

    /// Advance the machine by one event. Errors are fatal; transient feed
    /// failures are absorbed and retried on the poll cadence.
    pub async fn handle(&mut self, event: Event) -> FeedResult<Transition> {
        match event {
            Event::SwitchTeam => {
                self.reset();
                Ok(Transition::new(Action::SelectTeam, Wait::Immediate))
            }
            Event::TeamSelected(selection) => {
                self.selection = selection;
                self.reset();
                info!("Following team {} in {}", selection.team_id, selection.league);
                self.resolve_new_team().await
            }
            Event::Wake | Event::Press => match self.status {
                GameStatus::NewTeam => self.resolve_new_team().await,
                GameStatus::NoGames => Ok(Transition::new(Action::NoOp, Wait::Forever)),
                GameStatus::Scheduled => Ok(self.check_start()),
                GameStatus::Started => self.poll_live().await,
                GameStatus::Finished => self.resolve_after_final().await,
                GameStatus::AfterGame => Ok(self.check_after_game(event == Event::Press)),
            },
        }
    }

    fn set_status(&mut self, status: GameStatus) {
        if self.status != status {
            info!("Status {} -> {}", self.status, status);
            self.status = status;
        }
    }

    fn reset(&mut self) {
        self.set_status(GameStatus::NewTeam);
        self.tracked_game_id = 0;
        self.next_game = NextGame::none(self.selection.league);
        self.current = None;
        self.finished_at = None;
        self.live_failures = 0;
    }

    fn retry_later(&self, err: FeedError) -> FeedResult<Transition> {
        if err.is_fatal() {
            return Err(err);
        }
        warn!("{} in {}, retrying in {:?}", err, self.status, self.timing.game_poll);
        Ok(Transition::new(Action::NoOp, Wait::For(self.timing.game_poll)))
    }

    async fn resolve_new_team(&mut self) -> FeedResult<Transition> {
        let now = self.clock.now();
        let Selection { league, team_id } = self.selection;
        match self
            .feed
            .find_next_game(now, team_id, league, self.tracked_game_id)
            .await
        {
            Ok(next) => {
                self.next_game = next;
                Ok(self.show_upcoming())
            }
            Err(e) => self.retry_later(e),
        }
    }

    /// Move to SCHEDULED or NO_GAMES depending on the held next game.
    fn show_upcoming(&mut self) -> Transition {
        if self.next_game.is_none() {
            self.set_status(GameStatus::NoGames);
            Transition::new(Action::ShowNoGames, Wait::Forever)
        } else {
            self.set_status(GameStatus::Scheduled);
            Transition::new(Action::ShowNextGame, self.until_start())
        }
    }

    /// Wait until just past the start time, capped at the sleep ceiling.
    fn until_start(&self) -> Wait {
        let now = self.clock.now();
        if now > self.next_game.start_time {
            return Wait::Immediate;
        }
        let remaining = (self.next_game.start_time - now)
            .to_std()
            .unwrap_or_default()
            + Duration::from_secs(1);
        Wait::For(remaining.min(self.timing.max_sleep))
    }

    fn check_start(&mut self) -> Transition {
        if self.clock.now() > self.next_game.start_time {
            self.set_status(GameStatus::Started);
            self.tracked_game_id = self.next_game.game_id;
            self.current = None;
            self.live_failures = 0;
            Transition::new(Action::NoOp, Wait::Immediate)
        } else {
            Transition::new(Action::NoOp, self.until_start())
        }
    }

    async fn poll_live(&mut self) -> FeedResult<Transition> {
        let game = &self.next_game;
        let result = self
            .feed
            .fetch_current_game(game.game_id, game.league, game.home_id, game.away_id)
            .await;

        let update = match result {
            Ok(update) => update,
            Err(e) if !e.is_fatal() => {
                self.live_failures += 1;
                if self.live_failures >= self.timing.max_live_failures {
                    return Err(FeedError::LiveFeedLost {
                        consecutive: self.live_failures,
                        last: e.to_string(),
                    });
                }
                return self.retry_later(e);
            }
            Err(e) => return Err(e),
        };
        self.live_failures = 0;

        let action = match &self.current {
            Some(prev) if !changed(prev, &update.game) => Action::NoOp,
            _ => {
                self.current = Some(update.game);
                Action::ShowLiveGame
            }
        };

        if update.is_over {
            self.finished_at = Some(self.clock.now());
            self.set_status(GameStatus::Finished);
            Ok(Transition::new(action, Wait::Immediate))
        } else {
            Ok(Transition::new(action, Wait::For(self.timing.game_poll)))
        }
    }

    async fn resolve_after_final(&mut self) -> FeedResult<Transition> {
        let now = self.clock.now();
        let Selection { league, team_id } = self.selection;
        match self
            .feed
            .find_next_game(now, team_id, league, self.tracked_game_id)
            .await
        {
            Ok(next) => {
                self.next_game = next;
                self.set_status(GameStatus::AfterGame);
                Ok(Transition::new(Action::NoOp, self.after_game_wait()))
            }
            Err(e) => self.retry_later(e),
        }
    }

    fn post_game_elapsed(&self) -> bool {
        let Some(finished_at) = self.finished_at else {
            return true;
        };
        (self.clock.now() - finished_at)
            .to_std()
            .is_ok_and(|shown| shown >= self.timing.post_game)
    }

    fn after_game_wait(&self) -> Wait {
        let shown = self
            .finished_at
            .and_then(|f| (self.clock.now() - f).to_std().ok())
            .unwrap_or_default();
        let mut wait = self.timing.post_game.saturating_sub(shown);
        if !self.next_game.is_none() {
            wait = match self.until_start() {
                Wait::For(to_start) => wait.min(to_start),
                _ => Duration::ZERO,
            };
        }
        if wait.is_zero() {
            Wait::Immediate
        } else {
            Wait::For(wait.min(self.timing.max_sleep))
        }
    }

    fn check_after_game(&mut self, pressed: bool) -> Transition {
        let next_started =
            !self.next_game.is_none() && self.clock.now() > self.next_game.start_time;
        if pressed || next_started || self.post_game_elapsed() {
            self.current = None;
            self.show_upcoming()
        } else {
            Transition::new(Action::NoOp, self.after_game_wait())
        }
    }
}
