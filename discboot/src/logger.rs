//! Boot log: `log` backend that keeps the last records for the boot screen

use alloc::collections::VecDeque;
use alloc::format;
use alloc::string::String;
use alloc::vec::Vec;
use log::{Level, LevelFilter, Log, Metadata, Record, SetLoggerError};
use spin::Mutex;

/// Records kept before the oldest is dropped
pub const MAX_LOG_ENTRIES: usize = 64;

/// One formatted record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    /// Severity
    pub level: Level,
    /// Module or explicit target
    pub target: String,
    /// Formatted message
    pub message: String,
}

/// Ring of the most recent records
pub struct BootLog {
    entries: Mutex<VecDeque<LogEntry>>,
    total: Mutex<usize>,
}

impl BootLog {
    /// Empty log
    pub const fn new() -> Self {
        Self {
            entries: Mutex::new(VecDeque::new()),
            total: Mutex::new(0),
        }
    }

    /// Append a record, dropping the oldest when full
    pub fn push(&self, entry: LogEntry) {
        let mut entries = self.entries.lock();
        if entries.len() == MAX_LOG_ENTRIES {
            entries.pop_front();
        }
        entries.push_back(entry);
        *self.total.lock() += 1;
    }

    /// Snapshot, oldest first
    pub fn entries(&self) -> Vec<LogEntry> {
        self.entries.lock().iter().cloned().collect()
    }

    /// Records currently held
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Is the log empty?
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Records ever pushed, including dropped ones
    pub fn total(&self) -> usize {
        *self.total.lock()
    }

    /// Forget everything
    pub fn clear(&self) {
        self.entries.lock().clear();
        *self.total.lock() = 0;
    }
}

impl Default for BootLog {
    fn default() -> Self {
        Self::new()
    }
}

impl Log for BootLog {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record<'_>) {
        if !self.enabled(record.metadata()) {
            return;
        }
        self.push(LogEntry {
            level: record.level(),
            target: String::from(record.target()),
            message: format!("{}", record.args()),
        });
    }

    fn flush(&self) {}
}

static BOOT_LOG: BootLog = BootLog::new();

/// Install the boot log as the global logger
pub fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
    log::set_logger(&BOOT_LOG)?;
    log::set_max_level(level);
    Ok(())
}

/// Global boot log
pub fn boot_log() -> &'static BootLog {
    &BOOT_LOG
}
