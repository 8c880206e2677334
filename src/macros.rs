//! Logging macros with `format!`-style arguments
//!
//! The call site recorded under `caller` is the macro invocation.
//!
//! # Examples
//!
//! ```
//! use rivet_log::prelude::*;
//! use rivet_log::info;
//!
//! let logger = Logger::new();
//!
//! info!(logger, "Shunt registered");
//!
//! let service = "test1";
//! info!(logger, "Registered {} with strategy {}", service, "random");
//! ```

/// Log a message at the given level
///
/// # Examples
///
/// ```
/// # use rivet_log::prelude::*;
/// # let logger = Logger::new();
/// use rivet_log::log;
/// log!(logger, LogLevel::Info, "Simple message");
/// log!(logger, LogLevel::Error, "Upstream returned {}", 502);
/// ```
#[macro_export]
macro_rules! log {
    ($logger:expr, $level:expr, $($arg:tt)+) => {
        $logger.log($level, format!($($arg)+))
    };
}

/// Log a debug-level message
///
/// # Examples
///
/// ```
/// # use rivet_log::prelude::*;
/// # let logger = Logger::new();
/// # logger.set_min_level(LogLevel::Debug);
/// use rivet_log::debug;
/// debug!(logger, "Resolved {} instances", 3);
/// ```
#[macro_export]
macro_rules! debug {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Debug, $($arg)+)
    };
}

/// Log an info-level message
///
/// # Examples
///
/// ```
/// # use rivet_log::prelude::*;
/// # let logger = Logger::new();
/// use rivet_log::info;
/// info!(logger, "Listening on port {}", 8083);
/// ```
#[macro_export]
macro_rules! info {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Info, $($arg)+)
    };
}

/// Log a warning-level message
///
/// # Examples
///
/// ```
/// # use rivet_log::prelude::*;
/// # let logger = Logger::new();
/// use rivet_log::warn;
/// warn!(logger, "Retry attempt {} of {}", 3, 5);
/// ```
#[macro_export]
macro_rules! warn {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Warn, $($arg)+)
    };
}

/// Log an error-level message; the record carries a stack trace
///
/// # Examples
///
/// ```
/// # use rivet_log::prelude::*;
/// # let logger = Logger::new();
/// use rivet_log::error;
/// error!(logger, "Fallback invoked for {}", "rivet/shunt");
/// ```
#[macro_export]
macro_rules! error {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Error, $($arg)+)
    };
}

#[cfg(test)]
mod tests {
    use crate::core::{Appender, LogLevel, Logger, Result};
    use parking_lot::Mutex;
    use std::sync::Arc;

    #[derive(Clone, Default)]
    struct MemoryAppender(Arc<Mutex<Vec<String>>>);

    impl Appender for MemoryAppender {
        fn append(&mut self, line: &str) -> Result<()> {
            self.0.lock().push(line.to_string());
            Ok(())
        }

        fn flush(&mut self) -> Result<()> {
            Ok(())
        }

        fn name(&self) -> &str {
            "memory"
        }
    }

    fn record(lines: &Mutex<Vec<String>>, index: usize) -> serde_json::Value {
        serde_json::from_str(&lines.lock()[index]).unwrap()
    }

    #[test]
    fn test_macros_format_and_set_level() {
        let memory = MemoryAppender::default();
        let logger = Logger::builder()
            .min_level(LogLevel::Debug)
            .appender(memory.clone())
            .build();

        log!(logger, LogLevel::Info, "Formatted: {}", 42);
        debug!(logger, "Count: {}", 5);
        info!(logger, "Items: {}", 100);
        warn!(logger, "Retry {} of {}", 1, 3);
        error!(logger, "Code: {}", 500);

        assert_eq!(memory.0.lock().len(), 5);
        assert_eq!(record(&memory.0, 0)["msg"], "Formatted: 42");
        assert_eq!(record(&memory.0, 1)["level"], "debug");
        assert_eq!(record(&memory.0, 3)["msg"], "Retry 1 of 3");
        assert_eq!(record(&memory.0, 4)["level"], "error");
    }

    #[test]
    fn test_macro_records_invocation_site() {
        let memory = MemoryAppender::default();
        let logger = Logger::builder().appender(memory.clone()).build();

        info!(logger, "here");
        let expected_line = line!() - 1;

        let caller = record(&memory.0, 0)["caller"].as_str().unwrap().to_string();
        assert!(caller.ends_with(&format!("macros.rs:{}", expected_line)), "{}", caller);
    }

    #[test]
    fn test_macros_accept_shared_logger() {
        let memory = MemoryAppender::default();
        let logger = Arc::new(Logger::builder().appender(memory.clone()).build());

        warn!(logger, "through an Arc");
        assert_eq!(memory.0.lock().len(), 1);
    }
}
