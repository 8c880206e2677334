//! # rivet_log
//!
//! Multi-channel structured logging with size-based file rotation.
//!
//! Every subsystem of a host application logs through its own named channel.
//! Each channel writes JSON lines to `<base_dir>/<name>.log` and mirrors them
//! to stdout. Files are rotated by size, pruned by age and count, and
//! optionally gzipped in the background.
//!
//! ## Features
//!
//! - **Named channels**: `common`, `discovery`, `shunt`, `bow` and the other
//!   well-known subsystems, created once per process
//! - **Rotation**: timestamped backups with age and count retention
//! - **Structured records**: fixed JSON shape with call site, stack trace on
//!   errors, and a `serviceName` tag
//! - **Degrade, don't fail**: sink faults go to a fallback reporter, never to
//!   the caller
//!
//! ```no_run
//! use rivet_log::prelude::*;
//!
//! let registry = Registry::instance();
//! registry.bow().info_with(
//!     "proxied request",
//!     LogContext::new()
//!         .with_field("route", "rivet/shunt")
//!         .with_field("status", 200),
//! );
//! ```

pub mod appenders;
pub mod core;
pub mod macros;
pub mod registry;

pub mod prelude {
    pub use crate::appenders::{ConsoleAppender, RotatingFileAppender, RotationPolicy};
    pub use crate::core::{
        Appender, FallbackSink, FieldValue, LogContext, LogLevel, Logger, LoggerBuilder,
        LoggerError, Result,
    };
    pub use crate::registry::{Channel, ChannelName, CustomChannel, Registry, RegistryConfig};
}

pub use appenders::{ConsoleAppender, RotatingFileAppender, RotationPolicy, RotationStats};
pub use core::{
    Appender, EncoderConfig, FallbackSink, FieldValue, JsonEncoder, LogContext, LogEntry,
    LogLevel, Logger, LoggerBuilder, LoggerError, LoggerMetrics, Result, SharedFallback,
    StderrFallback,
};
pub use registry::{
    Channel, ChannelName, CustomChannel, LazyRegistry, Registry, RegistryConfig,
    DEFAULT_LOG_DIR, DEFAULT_SERVICE_NAME, LOG_PATH_VAR, SERVICE_NAME_FIELD, SERVICE_NAME_VAR,
};
