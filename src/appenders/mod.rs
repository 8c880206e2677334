//! Appender implementations

pub mod console;
pub(crate) mod compression;
pub mod rotating_file;

pub use console::ConsoleAppender;
pub use rotating_file::{RotatingFileAppender, RotationPolicy, RotationStats};

pub use crate::core::Appender;
