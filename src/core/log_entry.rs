//! Log entry structure

use super::log_context::LogContext;
use super::log_level::LogLevel;
use chrono::{DateTime, Utc};
use std::backtrace::Backtrace;
use std::panic::Location;

#[derive(Debug, Clone)]
pub struct LogEntry {
    pub level: LogLevel,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    /// `file:line` of the logging call
    pub caller: Option<String>,
    pub stacktrace: Option<String>,
    pub fields: LogContext,
}

impl LogEntry {
    pub fn new(level: LogLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
            timestamp: Utc::now(),
            caller: None,
            stacktrace: None,
            fields: LogContext::new(),
        }
    }

    pub fn with_location(mut self, location: &Location<'_>) -> Self {
        self.caller = Some(format!("{}:{}", location.file(), location.line()));
        self
    }

    pub fn with_fields(mut self, fields: LogContext) -> Self {
        self.fields = fields;
        self
    }

    /// Capture the current stack if the level asks for one
    pub fn with_stacktrace_if_needed(mut self) -> Self {
        if self.level.captures_stacktrace() {
            self.stacktrace = Some(Backtrace::force_capture().to_string());
        }
        self
    }
}
