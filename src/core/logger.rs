//! Main logger implementation

use super::{
    appender::Appender,
    encoder::{EncoderConfig, JsonEncoder},
    error::{LoggerError, Result},
    fallback::{self, SharedFallback},
    log_context::{FieldValue, LogContext},
    log_entry::LogEntry,
    log_level::LogLevel,
    metrics::LoggerMetrics,
};
use parking_lot::{Mutex, RwLock};
use std::panic::Location;

/// After the first failure, only every Nth failure is forwarded to the fallback
const FAULT_REPORT_INTERVAL: u64 = 1000;

/// A labeled logger writing JSON lines to every attached appender
///
/// All methods take `&self`; a logger is meant to be shared behind an `Arc`.
/// Each record is encoded once and written to all appenders under one lock,
/// so lines from concurrent callers never interleave.
pub struct Logger {
    name: Option<String>,
    min_level: RwLock<LogLevel>,
    encoder: JsonEncoder,
    /// Fields attached to every record (e.g. `serviceName`)
    fields: LogContext,
    appenders: Mutex<Vec<Box<dyn Appender>>>,
    fallback: SharedFallback,
    metrics: LoggerMetrics,
}

impl std::fmt::Debug for Logger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Logger")
            .field("name", &self.name)
            .field("min_level", &*self.min_level.read())
            .field("metrics", &self.metrics)
            .finish_non_exhaustive()
    }
}

impl Logger {
    /// Create a logger with no appenders at `info` level
    #[must_use]
    pub fn new() -> Self {
        LoggerBuilder::new().build()
    }

    /// Create a builder for Logger
    ///
    /// # Example
    /// ```
    /// use rivet_log::prelude::*;
    ///
    /// let logger = Logger::builder()
    ///     .name("shunt")
    ///     .min_level(LogLevel::Debug)
    ///     .field("serviceName", "shunt")
    ///     .build();
    ///
    /// logger.info("registered round-robin strategy");
    /// ```
    #[must_use]
    pub fn builder() -> LoggerBuilder {
        LoggerBuilder::new()
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn min_level(&self) -> LogLevel {
        *self.min_level.read()
    }

    pub fn set_min_level(&self, level: LogLevel) {
        *self.min_level.write() = level;
    }

    pub fn is_enabled(&self, level: LogLevel) -> bool {
        level >= self.min_level()
    }

    pub fn fields(&self) -> &LogContext {
        &self.fields
    }

    pub fn appender_names(&self) -> Vec<String> {
        self.appenders
            .lock()
            .iter()
            .map(|a| a.name().to_string())
            .collect()
    }

    pub fn metrics(&self) -> &LoggerMetrics {
        &self.metrics
    }

    #[track_caller]
    pub fn log(&self, level: LogLevel, message: impl Into<String>) {
        self.emit(level, message.into(), LogContext::new(), Location::caller());
    }

    /// Log with structured context fields
    #[track_caller]
    pub fn log_with_fields(&self, level: LogLevel, message: impl Into<String>, fields: LogContext) {
        self.emit(level, message.into(), fields, Location::caller());
    }

    #[inline]
    #[track_caller]
    pub fn debug(&self, message: impl Into<String>) {
        self.log(LogLevel::Debug, message);
    }

    #[inline]
    #[track_caller]
    pub fn info(&self, message: impl Into<String>) {
        self.log(LogLevel::Info, message);
    }

    #[inline]
    #[track_caller]
    pub fn warn(&self, message: impl Into<String>) {
        self.log(LogLevel::Warn, message);
    }

    #[inline]
    #[track_caller]
    pub fn error(&self, message: impl Into<String>) {
        self.log(LogLevel::Error, message);
    }

    #[track_caller]
    pub fn debug_with(&self, message: impl Into<String>, fields: LogContext) {
        self.log_with_fields(LogLevel::Debug, message, fields);
    }

    #[track_caller]
    pub fn info_with(&self, message: impl Into<String>, fields: LogContext) {
        self.log_with_fields(LogLevel::Info, message, fields);
    }

    #[track_caller]
    pub fn warn_with(&self, message: impl Into<String>, fields: LogContext) {
        self.log_with_fields(LogLevel::Warn, message, fields);
    }

    #[track_caller]
    pub fn error_with(&self, message: impl Into<String>, fields: LogContext) {
        self.log_with_fields(LogLevel::Error, message, fields);
    }

    pub fn flush(&self) -> Result<()> {
        let mut appenders = self.appenders.lock();
        for appender in appenders.iter_mut() {
            appender.flush()?;
        }
        Ok(())
    }

    fn emit(
        &self,
        level: LogLevel,
        message: String,
        fields: LogContext,
        location: &Location<'_>,
    ) {
        if !self.is_enabled(level) {
            self.metrics.record_filtered();
            return;
        }

        let entry = LogEntry::new(level, message)
            .with_location(location)
            .with_fields(fields)
            .with_stacktrace_if_needed();
        let line = self.encoder.encode(self.name(), &self.fields, &entry);

        let mut appenders = self.appenders.lock();
        self.process_sync(&mut appenders, &line);
    }

    /// Write one line to every appender with per-appender panic isolation
    ///
    /// A failing appender does not prevent the others from receiving the line.
    fn process_sync(&self, appenders: &mut [Box<dyn Appender>], line: &str) {
        let mut has_error = false;

        for appender in appenders.iter_mut() {
            let append_result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
                appender.append(line)
            }));

            let fault = match append_result {
                Ok(Ok(())) => continue,
                Ok(Err(e)) => e,
                Err(panic_info) => {
                    let panic_msg = if let Some(s) = panic_info.downcast_ref::<&str>() {
                        s.to_string()
                    } else if let Some(s) = panic_info.downcast_ref::<String>() {
                        s.clone()
                    } else {
                        "Unknown panic".to_string()
                    };
                    LoggerError::AppenderPanic {
                        appender: appender.name().to_string(),
                        message: panic_msg,
                    }
                }
            };

            has_error = true;
            self.report_failure(&fault);
        }

        if !has_error {
            self.metrics.record_written();
        }
    }

    fn report_failure(&self, fault: &LoggerError) {
        let previous = self.metrics.record_sink_failure();

        // Alert on first failure and periodically thereafter
        if previous == 0 || (previous + 1) % FAULT_REPORT_INTERVAL == 0 {
            self.metrics.record_fallback_report();
            self.fallback.report(fault);
        }
    }
}

impl Default for Logger {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Logger {
    fn drop(&mut self) {
        if let Err(e) = self.flush() {
            self.fallback.report(&e);
        }
    }
}

/// Builder for constructing Logger with a fluent API
pub struct LoggerBuilder {
    name: Option<String>,
    min_level: LogLevel,
    encoder: EncoderConfig,
    fields: LogContext,
    appenders: Vec<Box<dyn Appender>>,
    fallback: SharedFallback,
}

impl LoggerBuilder {
    /// Create a new builder with default values
    pub fn new() -> Self {
        Self {
            name: None,
            min_level: LogLevel::Info,
            encoder: EncoderConfig::default(),
            fields: LogContext::new(),
            appenders: Vec::new(),
            fallback: fallback::stderr(),
        }
    }

    /// Set the value emitted under the `logger` key
    #[must_use = "builder methods return a new value"]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set minimum log level
    #[must_use = "builder methods return a new value"]
    pub fn min_level(mut self, level: LogLevel) -> Self {
        self.min_level = level;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn encoder(mut self, config: EncoderConfig) -> Self {
        self.encoder = config;
        self
    }

    /// Add a field carried by every record
    #[must_use = "builder methods return a new value"]
    pub fn field(mut self, key: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.fields.add_field(key, value);
        self
    }

    /// Add an appender
    #[must_use = "builder methods return a new value"]
    pub fn appender<A: Appender + 'static>(mut self, appender: A) -> Self {
        self.appenders.push(Box::new(appender));
        self
    }

    /// Set where sink failures are reported
    #[must_use = "builder methods return a new value"]
    pub fn fallback(mut self, fallback: SharedFallback) -> Self {
        self.fallback = fallback;
        self
    }

    /// Build the Logger
    pub fn build(self) -> Logger {
        Logger {
            name: self.name,
            min_level: RwLock::new(self.min_level),
            encoder: JsonEncoder::new(self.encoder),
            fields: self.fields,
            appenders: Mutex::new(self.appenders),
            fallback: self.fallback,
            metrics: LoggerMetrics::new(),
        }
    }
}

impl Default for LoggerBuilder {
    fn default() -> Self {
        Self::new()
    }
}
