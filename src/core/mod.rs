//! Core logger types and traits

pub mod appender;
pub mod encoder;
pub mod error;
pub mod fallback;
pub mod log_context;
pub mod log_entry;
pub mod log_level;
pub mod logger;
pub mod metrics;
pub mod timestamp;

pub use appender::Appender;
pub use encoder::{EncoderConfig, JsonEncoder};
pub use error::{LoggerError, Result};
pub use fallback::{FallbackSink, SharedFallback, StderrFallback};
pub use log_context::{FieldValue, LogContext};
pub use log_entry::LogEntry;
pub use log_level::LogLevel;
pub use logger::{Logger, LoggerBuilder};
pub use metrics::LoggerMetrics;
