//! Rotating file appender with size-based rotation and retention
//!
//! The active file is renamed to a timestamped backup once the next write
//! would push it past the size limit. After every rotation, backups are pruned
//! by age and by count, and the survivors are optionally gzipped on a
//! background thread.
//!
//! Backups live next to the active file:
//!
//! ```text
//! logs/shunt.log
//! logs/shunt-2026-10-14T08-30-00.123.log
//! logs/shunt-2026-10-13T21-02-17.940.log.gz
//! ```

use super::compression::{self, compressed_path, CompressionWorker};
use crate::core::appender::Appender;
use crate::core::error::{LoggerError, Result};
use crate::core::fallback::{self, SharedFallback};
use crate::core::log_level::LogLevel;
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

const MEGABYTE: u64 = 1024 * 1024;

/// Timestamp embedded in backup file names (UTC)
const BACKUP_TIME_FORMAT: &str = "%Y-%m-%dT%H-%M-%S%.3f";

/// How long a sink that failed to open stays closed before the next attempt
const REOPEN_BACKOFF: Duration = Duration::from_secs(1);

/// Ages beyond this are treated as this
const MAX_AGE_DAYS: i64 = 100_000;

/// Rotation and retention settings for one log file
///
/// `max_backups` and `max_age_days` of zero mean unlimited.
///
/// # Examples
///
/// ```
/// use rivet_log::{LogLevel, RotationPolicy};
///
/// let policy = RotationPolicy::new()
///     .with_file_path("./logs/shunt.log")
///     .with_level(LogLevel::Info)
///     .with_max_size_mb(64)
///     .with_max_backups(7)
///     .with_compression(false);
///
/// assert!(policy.validate().is_ok());
/// assert_eq!(policy.max_bytes(), 64 * 1024 * 1024);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RotationPolicy {
    pub file_path: PathBuf,
    pub level: LogLevel,
    pub max_size_mb: u64,
    pub max_backups: usize,
    pub max_age_days: u64,
    pub compress: bool,
}

impl Default for RotationPolicy {
    fn default() -> Self {
        Self {
            file_path: PathBuf::from("./logs/rivet.log"),
            level: LogLevel::Debug,
            max_size_mb: 128,
            max_backups: 30,
            max_age_days: 30,
            compress: true,
        }
    }
}

impl RotationPolicy {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_file_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.file_path = path.into();
        self
    }

    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_level(mut self, level: LogLevel) -> Self {
        self.level = level;
        self
    }

    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_max_size_mb(mut self, size_mb: u64) -> Self {
        self.max_size_mb = size_mb;
        self
    }

    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_max_backups(mut self, count: usize) -> Self {
        self.max_backups = count;
        self
    }

    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_max_age_days(mut self, days: u64) -> Self {
        self.max_age_days = days;
        self
    }

    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_compression(mut self, enabled: bool) -> Self {
        self.compress = enabled;
        self
    }

    /// # Errors
    ///
    /// Returns `InvalidConfiguration` if `max_size_mb` is zero or the file path
    /// is empty
    pub fn validate(&self) -> Result<()> {
        if self.file_path.as_os_str().is_empty() {
            return Err(LoggerError::config(
                "RotationPolicy",
                "file_path must not be empty",
            ));
        }
        if self.max_size_mb == 0 {
            return Err(LoggerError::config(
                "RotationPolicy",
                format!(
                    "max_size_mb must be positive (file '{}')",
                    self.file_path.display()
                ),
            ));
        }
        Ok(())
    }

    #[must_use]
    pub fn max_bytes(&self) -> u64 {
        self.max_size_mb.saturating_mul(MEGABYTE)
    }
}

/// Counters shared between an appender and its compression worker
#[derive(Debug, Default)]
pub struct RotationStats {
    rotations: AtomicU64,
    compressed: AtomicU64,
    faults: AtomicU64,
}

impl RotationStats {
    pub fn rotations(&self) -> u64 {
        self.rotations.load(Ordering::Relaxed)
    }

    pub fn compressed(&self) -> u64 {
        self.compressed.load(Ordering::Relaxed)
    }

    /// Rename, delete and compression failures
    pub fn faults(&self) -> u64 {
        self.faults.load(Ordering::Relaxed)
    }

    pub(crate) fn record_rotation(&self) {
        self.rotations.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_compressed(&self) {
        self.compressed.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_fault(&self) {
        self.faults.fetch_add(1, Ordering::Relaxed);
    }
}

#[derive(Debug, Clone)]
struct BackupFile {
    path: PathBuf,
    timestamp: DateTime<Utc>,
    compressed: bool,
}

/// Size-rotating file sink
///
/// The file is opened lazily on the first write.
///
/// # Examples
///
/// ```no_run
/// use rivet_log::appenders::RotatingFileAppender;
/// use rivet_log::Appender;
///
/// // 128 MB per file, keep 30 backups for at most 30 days, gzip them
/// let mut appender = RotatingFileAppender::open("./logs/bow.log", 128, 30, 30, true).unwrap();
/// appender.append("{\"msg\":\"gateway started\"}\n").unwrap();
/// ```
pub struct RotatingFileAppender {
    base_path: PathBuf,
    max_bytes: u64,
    max_backups: usize,
    max_age_days: u64,
    compress: bool,
    file: Option<File>,
    current_size: u64,
    /// Length of the active file after the last complete record
    file_len: u64,
    /// Set after a failed open; no filesystem access before this instant
    retry_after: Option<Instant>,
    /// Timestamp of the newest backup this appender created
    last_backup: Option<DateTime<Utc>>,
    fallback: SharedFallback,
    stats: Arc<RotationStats>,
    compressor: Option<CompressionWorker>,
}

impl RotatingFileAppender {
    /// Create a rotating sink for `path`
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfiguration` if `max_size_mb` is zero
    pub fn open<P: AsRef<Path>>(
        path: P,
        max_size_mb: u64,
        max_backups: usize,
        max_age_days: u64,
        compress: bool,
    ) -> Result<Self> {
        let policy = RotationPolicy {
            file_path: path.as_ref().to_path_buf(),
            max_size_mb,
            max_backups,
            max_age_days,
            compress,
            ..RotationPolicy::default()
        };
        Self::from_policy(&policy)
    }

    /// Create a rotating sink from a policy, using its `file_path`
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfiguration` if the policy does not validate
    pub fn from_policy(policy: &RotationPolicy) -> Result<Self> {
        policy.validate()?;
        Ok(Self::from_validated_policy(policy))
    }

    /// Caller guarantees `policy.validate()` succeeded
    pub(crate) fn from_validated_policy(policy: &RotationPolicy) -> Self {
        Self {
            base_path: policy.file_path.clone(),
            max_bytes: policy.max_bytes(),
            max_backups: policy.max_backups,
            max_age_days: policy.max_age_days,
            compress: policy.compress,
            file: None,
            current_size: 0,
            file_len: 0,
            retry_after: None,
            last_backup: None,
            fallback: fallback::stderr(),
            stats: Arc::new(RotationStats::default()),
            compressor: None,
        }
    }

    /// Report rotation faults to `fallback` instead of stderr
    #[must_use]
    pub fn with_fallback(mut self, fallback: SharedFallback) -> Self {
        self.fallback = fallback;
        self
    }

    /// Bytes written to the active file
    #[must_use]
    pub fn current_size(&self) -> u64 {
        self.current_size
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.base_path
    }

    #[must_use]
    pub fn stats(&self) -> Arc<RotationStats> {
        Arc::clone(&self.stats)
    }

    /// Backup files of this log, newest first
    ///
    /// # Errors
    ///
    /// Returns an error if the log directory cannot be read
    pub fn backups(&self) -> Result<Vec<PathBuf>> {
        let backups = self.list_backups().map_err(|e| {
            LoggerError::file_rotation(
                self.display_path(),
                format!("Failed to list backups: {}", e),
            )
        })?;
        Ok(backups.into_iter().map(|b| b.path).collect())
    }

    /// Close the active file, move it to a backup and start a new one
    ///
    /// # Errors
    ///
    /// Returns `FileRotation` if the active file cannot be renamed, or
    /// `SinkWrite` if the new file cannot be created
    pub fn rotate(&mut self) -> Result<()> {
        self.file = None;
        self.open_new()?;
        self.stats.record_rotation();
        self.mill();
        Ok(())
    }

    fn display_path(&self) -> String {
        self.base_path.display().to_string()
    }

    fn sink_error(&self, message: impl Into<String>, source: io::Error) -> LoggerError {
        LoggerError::sink_write(self.display_path(), message, source)
    }

    fn report(&self, fault: &LoggerError) {
        self.stats.record_fault();
        self.fallback.report(fault);
    }

    fn log_dir(&self) -> PathBuf {
        match self.base_path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        }
    }

    fn create_log_dir(&self) -> Result<()> {
        let dir = self.log_dir();
        fs::create_dir_all(&dir).map_err(|e| {
            self.sink_error(format!("Failed to create directory '{}'", dir.display()), e)
        })
    }

    fn ensure_open(&mut self, write_len: u64) -> Result<()> {
        if self.file.is_some() {
            return Ok(());
        }

        if let Some(at) = self.retry_after {
            if Instant::now() < at {
                return Err(self.sink_error(
                    "Log file unavailable, waiting before reopening",
                    io::Error::new(io::ErrorKind::WouldBlock, "reopen backoff"),
                ));
            }
        }

        match self.open_existing_or_new(write_len) {
            Ok(()) => {
                self.retry_after = None;
                Ok(())
            }
            Err(e) => {
                self.retry_after = Some(Instant::now() + REOPEN_BACKOFF);
                Err(e)
            }
        }
    }

    /// Open the active file for appending, rotating it first if it is full
    fn open_existing_or_new(&mut self, write_len: u64) -> Result<()> {
        self.create_log_dir()?;
        self.mill();

        let existing_len = match fs::metadata(&self.base_path) {
            Ok(meta) => meta.len(),
            Err(e) if e.kind() == io::ErrorKind::NotFound => return self.open_new(),
            Err(e) => return Err(self.sink_error("Cannot access file metadata", e)),
        };

        let mut tracked_size = existing_len;
        if existing_len + write_len >= self.max_bytes {
            match self.rotate() {
                Ok(()) => return Ok(()),
                Err(e @ LoggerError::FileRotation { .. }) => {
                    // Append to the full file until the next rotation attempt
                    self.report(&e);
                    tracked_size = 0;
                }
                Err(e) => return Err(e),
            }
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.base_path)
            .map_err(|e| self.sink_error("Failed to open", e))?;

        self.file = Some(file);
        self.current_size = tracked_size;
        self.file_len = existing_len;
        Ok(())
    }

    /// Move any existing active file aside and create an empty one
    fn open_new(&mut self) -> Result<()> {
        self.create_log_dir()?;

        if self.base_path.exists() {
            let backup = self.next_backup_path();
            fs::rename(&self.base_path, &backup).map_err(|e| {
                LoggerError::file_rotation(
                    self.display_path(),
                    format!("Failed to rename to '{}': {}", backup.display(), e),
                )
            })?;
        }

        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&self.base_path)
            .map_err(|e| self.sink_error("Failed to create new log file", e))?;

        self.file = Some(file);
        self.current_size = 0;
        self.file_len = 0;
        Ok(())
    }

    /// Reopen the active file after a failed rotation
    fn reopen_current(&mut self) -> Result<()> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.base_path)
            .map_err(|e| self.sink_error("Failed to reopen after rotation failure", e))?;
        self.file_len = file.metadata().map(|meta| meta.len()).unwrap_or(0);
        self.file = Some(file);
        Ok(())
    }

    fn backup_path_at(&self, stamp: &DateTime<Utc>) -> PathBuf {
        let stem = self
            .base_path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("rivet");
        let ext = self
            .base_path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| format!(".{}", e))
            .unwrap_or_default();
        self.base_path
            .with_file_name(format!("{}-{}{}", stem, stamp.format(BACKUP_TIME_FORMAT), ext))
    }

    /// Backup name for a rotation happening now
    ///
    /// Timestamps strictly increase across rotations, so rotations within
    /// the same millisecond still get unique, chronologically sorted names.
    fn next_backup_path(&mut self) -> PathBuf {
        let mut stamp = Utc::now();
        if let Some(last) = self.last_backup {
            let next = last + chrono::Duration::milliseconds(1);
            if stamp < next {
                stamp = next;
            }
        }
        loop {
            let candidate = self.backup_path_at(&stamp);
            if !candidate.exists() && !compressed_path(&candidate).exists() {
                self.last_backup = Some(stamp);
                return candidate;
            }
            stamp += chrono::Duration::milliseconds(1);
        }
    }

    /// Parse a directory entry name as one of our backups
    fn parse_backup(&self, name: &str) -> Option<(DateTime<Utc>, bool)> {
        let stem = self.base_path.file_stem()?.to_str()?;
        let ext = self
            .base_path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| format!(".{}", e))
            .unwrap_or_default();

        let (body, compressed) = match name.strip_suffix(".gz") {
            Some(body) => (body, true),
            None => (name, false),
        };
        let stamp = body
            .strip_prefix(stem)?
            .strip_prefix('-')?
            .strip_suffix(ext.as_str())?;
        let naive = NaiveDateTime::parse_from_str(stamp, BACKUP_TIME_FORMAT).ok()?;
        Some((naive.and_utc(), compressed))
    }

    fn list_backups(&self) -> io::Result<Vec<BackupFile>> {
        let entries = match fs::read_dir(self.log_dir()) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e),
        };

        let mut backups = Vec::new();
        for entry in entries {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let name = entry.file_name();
            let Some(name) = name.to_str() else { continue };
            if let Some((timestamp, compressed)) = self.parse_backup(name) {
                backups.push(BackupFile {
                    path: entry.path(),
                    timestamp,
                    compressed,
                });
            }
        }

        backups.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        Ok(backups)
    }

    /// Apply retention to existing backups and queue compression
    ///
    /// Age eviction runs first; the count limit applies to what is left.
    /// A backup and its compressed copy count as one. Once a compression
    /// worker exists, deletes are queued behind it instead of running here.
    fn mill(&mut self) {
        if self.max_backups == 0 && self.max_age_days == 0 && !self.compress {
            return;
        }

        let backups = match self.list_backups() {
            Ok(backups) => backups,
            Err(e) => {
                let fault = LoggerError::file_rotation(
                    self.display_path(),
                    format!("Failed to list backups: {}", e),
                );
                self.report(&fault);
                return;
            }
        };

        let cutoff = if self.max_age_days > 0 {
            let days = i64::try_from(self.max_age_days)
                .unwrap_or(MAX_AGE_DAYS)
                .min(MAX_AGE_DAYS);
            Utc::now().checked_sub_signed(chrono::Duration::days(days))
        } else {
            None
        };

        let mut doomed = Vec::new();
        let mut remaining = Vec::new();
        let mut kept = 0usize;
        let mut last_stamp = None;

        for backup in backups {
            if cutoff.is_some_and(|cutoff| backup.timestamp < cutoff) {
                doomed.push(backup);
                continue;
            }
            if last_stamp != Some(backup.timestamp) {
                kept += 1;
                last_stamp = Some(backup.timestamp);
            }
            if self.max_backups > 0 && kept > self.max_backups {
                doomed.push(backup);
            } else {
                remaining.push(backup);
            }
        }

        for backup in doomed {
            if let Some(ref worker) = self.compressor {
                if worker.remove(backup.path.clone()) {
                    continue;
                }
            }
            if let Err(fault) = compression::remove_backup(&backup.path) {
                self.report(&fault);
            }
        }

        if self.compress {
            for backup in remaining.into_iter().filter(|b| !b.compressed) {
                self.submit_compression(backup.path);
            }
        }
    }

    fn submit_compression(&mut self, path: PathBuf) {
        if self.compressor.is_none() {
            let name = self
                .base_path
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or("rivet")
                .to_string();
            match CompressionWorker::spawn(&name, Arc::clone(&self.fallback), Arc::clone(&self.stats)) {
                Ok(worker) => self.compressor = Some(worker),
                Err(e) => {
                    self.report(&e);
                    return;
                }
            }
        }

        if let Some(ref worker) = self.compressor {
            worker.compress(path);
        }
    }

    /// Cut off the bytes of a record that failed mid-write
    ///
    /// The handle is dropped so the next write reopens the file after the
    /// backoff.
    fn discard_partial_write(&mut self) {
        if let Some(file) = self.file.take() {
            if let Err(e) = file.set_len(self.file_len) {
                self.fallback
                    .report(&self.sink_error("Failed to trim partial record", e));
            }
        }
        self.retry_after = Some(Instant::now() + REOPEN_BACKOFF);
    }
}

impl Appender for RotatingFileAppender {
    fn name(&self) -> &str {
        "rotating_file"
    }

    fn append(&mut self, line: &str) -> Result<()> {
        let write_len = line.len() as u64;
        if write_len > self.max_bytes {
            return Err(self.sink_error(
                format!(
                    "Write length {} exceeds maximum file size {}",
                    write_len, self.max_bytes
                ),
                io::Error::new(io::ErrorKind::InvalidInput, "record too large"),
            ));
        }

        self.ensure_open(write_len)?;

        if self.current_size + write_len > self.max_bytes {
            if let Err(e) = self.rotate() {
                // Keep logging into the current file rather than losing records
                self.report(&e);
                if self.file.is_none() {
                    if let Err(reopen_err) = self.reopen_current() {
                        self.retry_after = Some(Instant::now() + REOPEN_BACKOFF);
                        return Err(reopen_err);
                    }
                }
                // Do not retry the rotation until another full file was written
                self.current_size = 0;
            }
        }

        let written = match self.file.as_mut() {
            Some(file) => file.write_all(line.as_bytes()),
            None => Err(io::Error::new(io::ErrorKind::NotConnected, "no open file")),
        };

        if let Err(e) = written {
            self.discard_partial_write();
            return Err(self.sink_error("Failed to write log entry", e));
        }

        self.current_size += write_len;
        self.file_len += write_len;
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        if let Some(ref mut file) = self.file {
            file.flush()?;
        }
        Ok(())
    }
}
