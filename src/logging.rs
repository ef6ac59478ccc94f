/// In-game log sink for the `log` facade.
///
/// stderr is unusable while the terminal is in raw / alternate-screen mode,
/// so records are kept in memory and the renderer shows the freshest one on
/// the message line. Messages fade out after `decay`.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, OnceLock};
use std::time::{Duration, Instant};

use log::{Level, LevelFilter, Log, Metadata, Record, SetLoggerError};

const DEFAULT_DECAY: Duration = Duration::from_secs(5);
const DEFAULT_CAPACITY: usize = 32;

static LOGGER: OnceLock<AppLogger> = OnceLock::new();

#[derive(Clone, Debug)]
pub struct Message {
    pub level: Level,
    pub pushed: Instant,
    pub message: String,
}

pub struct AppLogger {
    decay: Duration,
    capacity: usize,
    logs: Mutex<VecDeque<Message>>,
}

pub fn get_logger() -> &'static AppLogger {
    LOGGER.get_or_init(|| AppLogger::new(DEFAULT_DECAY, DEFAULT_CAPACITY))
}

/// Install the in-game logger. Fails only if another logger is already set.
pub fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
    log::set_logger(get_logger())?;
    log::set_max_level(level);
    Ok(())
}

impl AppLogger {
    fn new(decay: Duration, capacity: usize) -> Self {
        AppLogger {
            decay,
            capacity,
            logs: Mutex::new(VecDeque::with_capacity(capacity)),
        }
    }

    fn lock_logs(&self) -> MutexGuard<'_, VecDeque<Message>> {
        // poisoned: keep whatever was queued
        self.logs.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn push(&self, message: Message) {
        let mut logs = self.lock_logs();
        while logs.len() >= self.capacity {
            logs.pop_front();
        }
        logs.push_back(message);
    }

    /// Unexpired messages, newest first.
    pub fn recent(&self, max: usize) -> Vec<Message> {
        let now = Instant::now();
        let mut logs = self.lock_logs();
        logs.retain(|m| now.duration_since(m.pushed) < self.decay);
        logs.iter().rev().take(max).cloned().collect()
    }

    /// Newest unexpired message at `Info` or more severe.
    pub fn latest_notice(&self) -> Option<Message> {
        self.recent(self.capacity).into_iter().find(|m| m.level <= Level::Info)
    }
}

impl Log for AppLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            self.push(Message {
                level: record.level(),
                pushed: Instant::now(),
                message: record.args().to_string(),
            });
        }
    }

    fn flush(&self) {}
}
