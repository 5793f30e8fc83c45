//! Bounded in-memory log store, written out to flat files in batches.
//!
//! Every log call is echoed to the console.  Stored entries are kept in memory until they are
//! flushed, either explicitly or automatically once the configured limit is reached.

use crate::{log_internal, logging::console_line};
use anyhow::{anyhow, Result};
use chrono::{DateTime, Local};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::task::JoinHandle;

/// Directory log files are written to unless configured otherwise
pub const DEFAULT_LOG_DIR: &str = "log";

const AUTO_FLUSH_POLL: std::time::Duration = std::time::Duration::from_millis(10);

/// A single buffered log line
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LogEntry {
    pub timestamp: DateTime<Local>,
    pub prefix: String,
    pub message: String,
}

impl LogEntry {
    /// Line as written to the log file: `[{timestamp}] [{PREFIX}] {message}`
    pub fn line(&self) -> String {
        format!(
            "[{}] [{}] {}",
            format_timestamp(&self.timestamp),
            self.prefix.to_uppercase(),
            self.message
        )
    }
}

// Several entries may share a millisecond, the sequence number keeps them apart and in order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
struct LogKey {
    timestamp: DateTime<Local>,
    seq: u64,
}

pub type LogFilter = Box<dyn Fn(&LogEntry) -> bool + Send + Sync>;

/// Where and what to flush
pub struct FlushOptions {
    pub dir: PathBuf,
    pub filter: Option<LogFilter>,
    /// Remove flushed entries from memory once written
    pub delete_flushed: bool,
}

impl Default for FlushOptions {
    fn default() -> Self {
        Self {
            dir: PathBuf::from(DEFAULT_LOG_DIR),
            filter: None,
            delete_flushed: true,
        }
    }
}

impl FlushOptions {
    pub fn in_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.dir = dir.into();
        self
    }

    pub fn filter(mut self, filter: impl Fn(&LogEntry) -> bool + Send + Sync + 'static) -> Self {
        self.filter = Some(Box::new(filter));
        self
    }

    pub fn keep_flushed(mut self) -> Self {
        self.delete_flushed = false;
        self
    }
}

pub struct LogBuffer {
    started: DateTime<Local>,
    /// Entry count which triggers an automatic flush.  None means unbounded.
    limit: Option<usize>,
    dir: PathBuf,
    entries: Mutex<BTreeMap<LogKey, LogEntry>>,
    seq: AtomicU64,
    auto_flushing: AtomicBool,
}

impl LogBuffer {
    /// A limit of zero is treated as no limit.
    pub fn new(limit: Option<usize>, dir: impl Into<PathBuf>) -> Self {
        Self {
            started: Local::now(),
            limit: limit.filter(|&limit| limit > 0),
            dir: dir.into(),
            entries: Mutex::new(BTreeMap::new()),
            seq: AtomicU64::new(0),
            auto_flushing: AtomicBool::new(false),
        }
    }

    /// When the buffer was created.  Use as `start` to flush everything.
    pub fn started(&self) -> DateTime<Local> {
        self.started
    }

    pub fn limit(&self) -> Option<usize> {
        self.limit
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Currently buffered entries in chronological order
    pub fn entries(&self) -> Vec<LogEntry> {
        self.lock().values().cloned().collect()
    }

    /// Print a log line to the console and, if `store`, buffer it.
    ///
    /// Once the buffer reaches its limit, everything recorded since startup is flushed in the
    /// background.  The returned handle resolves when that flush is done; a failed flush is
    /// reported to the console and the entries stay buffered for the next attempt.
    pub fn record(
        self: &Arc<Self>,
        prefix: &str,
        message: &str,
        store: bool,
    ) -> Option<JoinHandle<()>> {
        println!("{}", console_line(prefix, message));

        if !store {
            return None;
        }

        let now = Local::now();
        let len = self.insert(now, prefix, message);
        let limit = self.limit?;
        if len < limit {
            return None;
        }

        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            log_internal!("Log limit reached outside of a runtime, not flushing");
            return None;
        };

        // Entries keep arriving while a flush is running; one automatic flush at a time.
        if self.auto_flushing.swap(true, Ordering::AcqRel) {
            return None;
        }

        let buffer = Arc::clone(self);
        Some(runtime.spawn(async move {
            let options = FlushOptions::default().in_dir(buffer.dir.clone());
            if let Err(err) = buffer.flush(buffer.started, now, options).await {
                buffer.record("error", &format!("Could not flush logs: {:#}", err), false);
            }
            buffer.auto_flushing.store(false, Ordering::Release);
        }))
    }

    /// Resolves once no automatic flush is running
    pub async fn wait_for_auto_flush(&self) {
        while self.auto_flushing.load(Ordering::Acquire) {
            tokio::time::sleep(AUTO_FLUSH_POLL).await;
        }
    }

    /// Write all entries with `start <= timestamp <= end` that pass the filter to
    /// `{dir}/{start}-{end}.log`, returning them.
    ///
    /// The matching set is snapshotted before writing.  Only the snapshotted entries are removed,
    /// and only after the write succeeded.
    pub async fn flush(
        &self,
        start: DateTime<Local>,
        end: DateTime<Local>,
        options: FlushOptions,
    ) -> Result<Vec<LogEntry>> {
        let snapshot: Vec<(LogKey, LogEntry)> = self
            .lock()
            .iter()
            .filter(|(key, entry)| {
                key.timestamp >= start
                    && key.timestamp <= end
                    && options.filter.as_ref().map_or(true, |filter| filter(entry))
            })
            .map(|(key, entry)| (*key, entry.clone()))
            .collect();

        let dir = &options.dir;
        tokio::fs::create_dir_all(dir).await.map_err(|e| {
            anyhow!(
                "Could not create log directory `{}`: {}",
                dir.to_string_lossy(),
                e
            )
        })?;

        let path = dir.join(log_file_name(&start, &end));
        let contents = snapshot
            .iter()
            .map(|(_, entry)| entry.line())
            .collect::<Vec<String>>()
            .join("\n");

        tokio::fs::write(&path, contents).await.map_err(|e| {
            anyhow!(
                "Could not write log file `{}`: {}",
                path.to_string_lossy(),
                e
            )
        })?;

        if options.delete_flushed {
            let mut entries = self.lock();
            for (key, _) in &snapshot {
                entries.remove(key);
            }
        }

        Ok(snapshot.into_iter().map(|(_, entry)| entry).collect())
    }

    fn insert(&self, timestamp: DateTime<Local>, prefix: &str, message: &str) -> usize {
        let key = LogKey {
            timestamp,
            seq: self.seq.fetch_add(1, Ordering::Relaxed),
        };
        let entry = LogEntry {
            timestamp,
            prefix: prefix.to_owned(),
            message: message.to_owned(),
        };

        let mut entries = self.lock();
        entries.insert(key, entry);
        entries.len()
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<LogKey, LogEntry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// `YYYY-MM-DD-HH-mm-ss-mmm`.  Every field but the milliseconds is zero-padded.
pub fn format_timestamp(timestamp: &DateTime<Local>) -> String {
    format!(
        "{}-{}",
        timestamp.format("%Y-%m-%d-%H-%M-%S"),
        timestamp.timestamp_subsec_millis()
    )
}

pub fn log_file_name(start: &DateTime<Local>, end: &DateTime<Local>) -> String {
    format!("{}-{}.log", format_timestamp(start), format_timestamp(end))
}
