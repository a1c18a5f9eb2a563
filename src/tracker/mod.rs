pub mod change;
pub mod lifecycle;
pub mod runner;
pub mod scheduler;

pub use lifecycle::{GameTracker, Timing};
pub use runner::Runner;
pub use scheduler::{PollScheduler, SleepOutcome, Wait};
