use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info};

use crate::db::Database;
use crate::display::Display;
use crate::error::FeedError;
use crate::select::TeamSelector;

use super::lifecycle::{Action, Event, GameTracker};
use super::scheduler::{PollScheduler, SleepOutcome};

/// How long a fatal error stays on screen before the process exits.
const ERROR_PAUSE: Duration = Duration::from_secs(5);

/// The main loop: feed events to the tracker, act on what it returns, wait.
pub struct Runner {
    tracker: GameTracker,
    scheduler: Arc<PollScheduler>,
    display: Arc<dyn Display>,
    selector: Arc<dyn TeamSelector>,
    db: Database,
}

impl Runner {
    pub fn new(
        tracker: GameTracker,
        scheduler: Arc<PollScheduler>,
        display: Arc<dyn Display>,
        selector: Arc<dyn TeamSelector>,
        db: Database,
    ) -> Self {
        Runner {
            tracker,
            scheduler,
            display,
            selector,
            db,
        }
    }

    /// Runs until a fatal error. `select_first` opens the team picker before
    /// the first lookup.
    pub async fn run(mut self, select_first: bool) -> Result<()> {
        let mut event = if select_first {
            Event::SwitchTeam
        } else {
            Event::Wake
        };

        loop {
            let transition = match self.tracker.handle(event).await {
                Ok(t) => t,
                Err(e) => return self.fail(e).await,
            };
            debug!(
                "{} after {:?}: {:?}, then {:?}",
                self.tracker.status(),
                event,
                transition.action,
                transition.wait
            );

            match transition.action {
                Action::ShowNextGame => self.display.show_next_game(self.tracker.next_game()),
                Action::ShowLiveGame => {
                    if let Some(game) = self.tracker.current_game() {
                        self.display.show_live_game(game);
                    }
                }
                Action::ShowNoGames => self.display.show_no_games(),
                Action::NoOp => {}
                Action::SelectTeam => {
                    let picked = self.selector.select(self.tracker.selection()).await;
                    self.db
                        .save_selection(&picked)
                        .context("Failed to save team selection")?;
                    event = Event::TeamSelected(picked);
                    continue;
                }
            }

            event = match self.scheduler.wait(transition.wait).await {
                SleepOutcome::Completed => Event::Wake,
                SleepOutcome::Interrupted => {
                    info!("Switch-team requested");
                    Event::SwitchTeam
                }
                SleepOutcome::Dismissed => Event::Press,
            };
        }
    }

    async fn fail(&self, err: FeedError) -> Result<()> {
        error!("Fatal: {}", err);
        self.display.show_error(&err.to_string());
        tokio::time::sleep(ERROR_PAUSE).await;
        Err(err).context("Scoreboard stopped")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::db::models::{CurrentGame, NextGame, Selection};
    use crate::error::FeedResult;
    use crate::feeds::{GameFeed, LiveUpdate};
    use crate::input::ButtonSignals;
    use crate::leagues::LeagueId;
    use crate::select::TeamChoice;
    use crate::tracker::Timing;
    use async_trait::async_trait;
    use chrono::{DateTime, TimeZone, Utc};
    use std::sync::Mutex;

    /// Never has a game; fails every lookup for team 999.
    struct EmptyFeed;

    #[async_trait]
    impl GameFeed for EmptyFeed {
        fn name(&self) -> &str {
            "empty"
        }

        async fn find_next_game(
            &self,
            _as_of: DateTime<Utc>,
            team_id: u16,
            league: LeagueId,
            _exclude_game_id: u32,
        ) -> FeedResult<NextGame> {
            if team_id == 999 {
                return Err(FeedError::UnknownTeam { league, team_id });
            }
            Ok(NextGame::none(league))
        }

        async fn fetch_current_game(
            &self,
            game_id: u32,
            league: LeagueId,
            known_home_id: u16,
            known_away_id: u16,
        ) -> FeedResult<LiveUpdate> {
            Ok(LiveUpdate {
                game: CurrentGame::new(game_id, league, known_away_id, known_home_id),
                is_over: false,
            })
        }
    }

    #[derive(Default)]
    struct Log(Mutex<Vec<String>>);

    impl Display for Log {
        fn show_next_game(&self, game: &NextGame) {
            self.0.lock().unwrap().push(format!("next {}", game.game_id));
        }
        fn show_live_game(&self, game: &CurrentGame) {
            self.0.lock().unwrap().push(format!("live {}", game.game_id));
        }
        fn show_no_games(&self) {
            self.0.lock().unwrap().push("no games".into());
        }
        fn show_team_choice(&self, _choice: &TeamChoice) {}
        fn show_error(&self, message: &str) {
            self.0.lock().unwrap().push(format!("error {}", message));
        }
    }

    struct FixedPick(Selection);

    #[async_trait]
    impl TeamSelector for FixedPick {
        async fn select(&self, _current: Selection) -> Selection {
            self.0
        }
    }

    fn runner(start: Selection, pick: Selection, signals: &Arc<ButtonSignals>) -> (Runner, Arc<Log>, Database) {
        let clock = Arc::new(ManualClock::new(Utc.with_ymd_and_hms(2024, 7, 1, 12, 0, 0).unwrap()));
        let timing = Timing {
            game_poll: Duration::from_secs(65),
            post_game: Duration::from_secs(3600),
            max_sleep: Duration::from_secs(3600),
            max_live_failures: 5,
        };
        let tracker = GameTracker::new(start, Arc::new(EmptyFeed), clock, timing);
        let scheduler = Arc::new(PollScheduler::new(
            Duration::from_millis(50),
            Duration::from_secs(3600),
            signals.clone(),
        ));
        let log = Arc::new(Log::default());
        let db = Database::open(":memory:").unwrap();
        let runner = Runner::new(tracker, scheduler, log.clone(), Arc::new(FixedPick(pick)), db.clone());
        (runner, log, db)
    }

    #[tokio::test(start_paused = true)]
    async fn test_long_press_selects_and_persists() {
        let signals = ButtonSignals::new();
        let start = Selection {
            league: LeagueId::Nhl,
            team_id: 10,
        };
        let pick = Selection {
            league: LeagueId::Nfl,
            team_id: 12,
        };
        let (runner, log, db) = runner(start, pick, &signals);

        let raiser = signals.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(7200)).await;
            raiser.raise_long_press();
        });

        let outcome = tokio::time::timeout(Duration::from_secs(10_000), runner.run(false)).await;
        assert!(outcome.is_err(), "runner should still be idling");
        assert_eq!(*log.0.lock().unwrap(), vec!["no games", "no games"]);
        assert_eq!(db.load_selection(start).unwrap(), pick);
    }

    #[tokio::test(start_paused = true)]
    async fn test_fatal_error_is_shown_then_returned() {
        let signals = ButtonSignals::new();
        let bad = Selection {
            league: LeagueId::Nhl,
            team_id: 999,
        };
        let (runner, log, _db) = runner(bad, bad, &signals);

        let err = runner.run(false).await.unwrap_err();
        assert!(format!("{:#}", err).contains("999"));
        let shown = log.0.lock().unwrap();
        assert_eq!(shown.len(), 1);
        assert!(shown[0].starts_with("error"));
    }
}
