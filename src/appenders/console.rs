//! Console appender implementation
//!
//! Mirrors encoded lines to stdout. Each line is written with a single
//! `write_all` under the stdout lock.

use crate::core::{Appender, Result};
use std::io::{self, Write};

pub struct ConsoleAppender {
    target: Box<dyn Write + Send + Sync>,
}

impl ConsoleAppender {
    pub fn new() -> Self {
        Self {
            target: Box::new(StdoutTarget),
        }
    }

    /// Write to an arbitrary target instead of stdout
    pub fn with_writer<W: Write + Send + Sync + 'static>(writer: W) -> Self {
        Self {
            target: Box::new(writer),
        }
    }
}

impl Default for ConsoleAppender {
    fn default() -> Self {
        Self::new()
    }
}

impl Appender for ConsoleAppender {
    fn append(&mut self, line: &str) -> Result<()> {
        self.target.write_all(line.as_bytes())?;
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.target.flush()?;
        Ok(())
    }

    fn name(&self) -> &str {
        "console"
    }
}

struct StdoutTarget;

impl Write for StdoutTarget {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        io::stdout().lock().write(buf)
    }

    fn write_all(&mut self, buf: &[u8]) -> io::Result<()> {
        io::stdout().lock().write_all(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        io::stdout().flush()
    }
}
