use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// One-shot button signals consumed by the scheduler and the selection UI.
pub trait InputEvents: Send + Sync {
    /// Consume a pending long press ("switch team").
    fn take_switch_team_signal(&self) -> bool;
    /// Consume a pending short press.
    fn take_press(&self) -> bool;
}

/// Edge-triggered button flags. One writer raises, one reader takes.
#[derive(Debug, Default)]
pub struct ButtonSignals {
    long_press: AtomicBool,
    short_press: AtomicBool,
}

impl ButtonSignals {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn raise_long_press(&self) {
        self.long_press.store(true, Ordering::Release);
    }

    pub fn raise_short_press(&self) {
        self.short_press.store(true, Ordering::Release);
    }
}

impl InputEvents for ButtonSignals {
    fn take_switch_team_signal(&self) -> bool {
        self.long_press.swap(false, Ordering::AcqRel)
    }

    fn take_press(&self) -> bool {
        self.short_press.swap(false, Ordering::AcqRel)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Press {
    Short,
    Long,
}

fn parse_press(line: &str) -> Option<Press> {
    match line.trim().to_ascii_lowercase().as_str() {
        "" | "s" | "short" => Some(Press::Short),
        "l" | "long" => Some(Press::Long),
        _ => None,
    }
}

/// Stand-in for the physical button on a host: each stdin line is a press.
/// `l`/`long` is a long press, an empty line or `s` a short one.
pub fn spawn_stdin_buttons(signals: Arc<ButtonSignals>) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!("Button input on stdin: <enter> = short press, 'l' = long press");
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) => match parse_press(&line) {
                    Some(Press::Short) => {
                        debug!("Short press");
                        signals.raise_short_press();
                    }
                    Some(Press::Long) => {
                        debug!("Long press");
                        signals.raise_long_press();
                    }
                    None => warn!("Ignoring unknown input {:?}", line.trim()),
                },
                Ok(None) => {
                    debug!("stdin closed, button input stopped");
                    break;
                }
                Err(e) => {
                    warn!("stdin read failed: {}", e);
                    break;
                }
            }
        }
    })
}
