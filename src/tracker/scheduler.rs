use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

use crate::input::InputEvents;

/// How long the tracker wants to stay idle before its next wake.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Wait {
    Immediate,
    For(Duration),
    /// Only a button press ends this one.
    Forever,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SleepOutcome {
    /// The full duration elapsed.
    Completed,
    /// A long press ("switch team") arrived.
    Interrupted,
    /// A short press arrived.
    Dismissed,
}

/// Sleeps in short ticks, checking the button signals between ticks.
pub struct PollScheduler {
    tick: Duration,
    max_sleep: Duration,
    input: Arc<dyn InputEvents>,
}

impl PollScheduler {
    pub fn new(tick: Duration, max_sleep: Duration, input: Arc<dyn InputEvents>) -> Self {
        PollScheduler {
            tick,
            max_sleep,
            input,
        }
    }

    /// Sleep for `duration`, capped at the max-sleep ceiling. A pending
    /// long press wins over a short press.
    pub async fn sleep(&self, duration: Duration) -> SleepOutcome {
        let deadline = Instant::now() + duration.min(self.max_sleep);
        loop {
            if self.input.take_switch_team_signal() {
                debug!("Sleep interrupted by switch-team signal");
                return SleepOutcome::Interrupted;
            }
            if self.input.take_press() {
                debug!("Sleep dismissed by button press");
                return SleepOutcome::Dismissed;
            }
            let now = Instant::now();
            if now >= deadline {
                return SleepOutcome::Completed;
            }
            tokio::time::sleep((deadline - now).min(self.tick)).await;
        }
    }

    pub async fn wait(&self, wait: Wait) -> SleepOutcome {
        match wait {
            Wait::Immediate => self.sleep(Duration::ZERO).await,
            Wait::For(d) => self.sleep(d).await,
            Wait::Forever => loop {
                match self.sleep(self.max_sleep).await {
                    SleepOutcome::Completed => continue,
                    outcome => return outcome,
                }
            },
        }
    }
}
