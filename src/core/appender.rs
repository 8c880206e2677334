//! Appender trait for log output destinations

use super::error::Result;

/// A destination for encoded record lines
///
/// Each call receives one complete line, line ending included.
pub trait Appender: Send + Sync {
    fn append(&mut self, line: &str) -> Result<()>;
    fn flush(&mut self) -> Result<()>;
    fn name(&self) -> &str;
}
