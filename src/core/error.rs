//! Error types for the logging facility

pub type Result<T> = std::result::Result<T, LoggerError>;

#[derive(Debug, thiserror::Error)]
pub enum LoggerError {
    /// Invalid rotation or channel parameters, detected at build time
    #[error("Invalid configuration for {component}: {message}")]
    InvalidConfiguration { component: String, message: String },

    /// Appending to (or opening) a sink failed
    #[error("Sink write failed for '{path}': {message}")]
    SinkWrite {
        path: String,
        message: String,
        #[source]
        source: std::io::Error,
    },

    /// Renaming, deleting or compressing a rotated file failed
    #[error("File rotation failed for '{path}': {message}")]
    FileRotation { path: String, message: String },

    /// An appender panicked while writing
    #[error("Appender '{appender}' panicked: {message}")]
    AppenderPanic { appender: String, message: String },

    /// Generic IO error (console and flush paths)
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl LoggerError {
    /// Create an invalid configuration error
    pub fn config(component: impl Into<String>, message: impl Into<String>) -> Self {
        LoggerError::InvalidConfiguration {
            component: component.into(),
            message: message.into(),
        }
    }

    /// Create a sink write error
    pub fn sink_write(
        path: impl Into<String>,
        message: impl Into<String>,
        source: std::io::Error,
    ) -> Self {
        LoggerError::SinkWrite {
            path: path.into(),
            message: message.into(),
            source,
        }
    }

    /// Create a file rotation error
    pub fn file_rotation(path: impl Into<String>, message: impl Into<String>) -> Self {
        LoggerError::FileRotation {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Whether this error was raised while building a channel
    pub fn is_configuration(&self) -> bool {
        matches!(self, LoggerError::InvalidConfiguration { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_error_creation() {
        let err = LoggerError::config("RotationPolicy", "max_size_mb must be positive");
        assert!(matches!(err, LoggerError::InvalidConfiguration { .. }));
        assert!(err.is_configuration());

        let err = LoggerError::file_rotation("./logs/shunt.log", "rename failed");
        assert!(matches!(err, LoggerError::FileRotation { .. }));
        assert!(!err.is_configuration());
    }

    #[test]
    fn test_error_display() {
        let err = LoggerError::config("RotationPolicy", "max_size_mb must be positive");
        assert_eq!(
            err.to_string(),
            "Invalid configuration for RotationPolicy: max_size_mb must be positive"
        );

        let err = LoggerError::file_rotation("./logs/bow.log", "Disk full");
        assert_eq!(
            err.to_string(),
            "File rotation failed for './logs/bow.log': Disk full"
        );
    }

    #[test]
    fn test_sink_write_keeps_source() {
        use std::error::Error;

        let io_err = io::Error::new(io::ErrorKind::PermissionDenied, "access denied");
        let err = LoggerError::sink_write("./logs/trans.log", "cannot open", io_err);

        assert!(err.to_string().contains("./logs/trans.log"));
        assert!(err.to_string().contains("cannot open"));
        assert!(err.source().is_some());
    }
}
