//! Fallback sink for faults raised by the logging facility itself
//!
//! Logging calls never return errors to the application. Sink and rotation
//! failures are reported here instead.

use super::error::LoggerError;
use std::sync::Arc;

pub trait FallbackSink: Send + Sync {
    fn report(&self, fault: &LoggerError);
}

pub type SharedFallback = Arc<dyn FallbackSink>;

/// Writes faults to stderr
#[derive(Debug, Clone, Copy, Default)]
pub struct StderrFallback;

impl FallbackSink for StderrFallback {
    fn report(&self, fault: &LoggerError) {
        eprintln!("[LOGGER ERROR] {}", fault);
    }
}

/// Default fallback shared by loggers and sinks
pub fn stderr() -> SharedFallback {
    Arc::new(StderrFallback)
}
