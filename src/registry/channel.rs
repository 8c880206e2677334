//! Named channels and the logger assembly they share

use crate::appenders::{ConsoleAppender, RotatingFileAppender, RotationPolicy, RotationStats};
use crate::core::error::{LoggerError, Result};
use crate::core::fallback::SharedFallback;
use crate::core::log_level::LogLevel;
use crate::core::logger::Logger;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

/// Field carried by every record of a channel
pub const SERVICE_NAME_FIELD: &str = "serviceName";

/// Channels the registry creates at startup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelName {
    Common,
    Discovery,
    Examples,
    Rivet,
    Server,
    Bow,
    Shunt,
    Trans,
    Scheduled,
}

impl ChannelName {
    pub const ALL: [ChannelName; 9] = [
        ChannelName::Common,
        ChannelName::Discovery,
        ChannelName::Examples,
        ChannelName::Rivet,
        ChannelName::Server,
        ChannelName::Bow,
        ChannelName::Shunt,
        ChannelName::Trans,
        ChannelName::Scheduled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ChannelName::Common => "common",
            ChannelName::Discovery => "discovery",
            ChannelName::Examples => "examples",
            ChannelName::Rivet => "rivet",
            ChannelName::Server => "server",
            ChannelName::Bow => "bow",
            ChannelName::Shunt => "shunt",
            ChannelName::Trans => "trans",
            ChannelName::Scheduled => "scheduled",
        }
    }

    pub(crate) fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for ChannelName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChannelName {
    type Err = LoggerError;

    fn from_str(s: &str) -> Result<Self> {
        ChannelName::ALL
            .into_iter()
            .find(|name| name.as_str() == s)
            .ok_or_else(|| LoggerError::config("ChannelName", format!("unknown channel '{}'", s)))
    }
}

/// One named logging stream owned by the registry
pub struct Channel {
    name: ChannelName,
    policy: RotationPolicy,
    handle: Arc<Logger>,
    rotation: Arc<RotationStats>,
}

impl Channel {
    pub(crate) fn build(
        name: ChannelName,
        policy: RotationPolicy,
        console: bool,
        fallback: &SharedFallback,
    ) -> Self {
        let (handle, rotation) = assemble(&policy, name.as_str(), console, fallback);
        Self {
            name,
            policy,
            handle,
            rotation,
        }
    }

    pub fn name(&self) -> ChannelName {
        self.name
    }

    /// `<base_dir>/<name>.log`
    pub fn file_path(&self) -> &Path {
        &self.policy.file_path
    }

    /// Policy captured when the channel was built
    pub fn policy(&self) -> &RotationPolicy {
        &self.policy
    }

    pub fn logger(&self) -> &Arc<Logger> {
        &self.handle
    }

    pub fn rotation_stats(&self) -> &RotationStats {
        &self.rotation
    }
}

impl fmt::Debug for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Channel")
            .field("name", &self.name)
            .field("file_path", &self.policy.file_path)
            .field("level", &self.policy.level)
            .finish()
    }
}

/// Every parameter of a channel built outside the default policy
///
/// # Examples
///
/// ```
/// use rivet_log::{CustomChannel, LogLevel};
///
/// let custom = CustomChannel {
///     file_path: "./logs/audit.log".into(),
///     level: LogLevel::Info,
///     max_size_mb: 16,
///     max_backups: 90,
///     max_age_days: 365,
///     compress: true,
///     service_name: "audit".to_string(),
/// };
/// assert!(custom.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomChannel {
    pub file_path: PathBuf,
    pub level: LogLevel,
    pub max_size_mb: u64,
    pub max_backups: usize,
    pub max_age_days: u64,
    pub compress: bool,
    pub service_name: String,
}

impl CustomChannel {
    /// Start from `policy` and label records with `service_name`
    pub fn from_policy(policy: &RotationPolicy, service_name: impl Into<String>) -> Self {
        Self {
            file_path: policy.file_path.clone(),
            level: policy.level,
            max_size_mb: policy.max_size_mb,
            max_backups: policy.max_backups,
            max_age_days: policy.max_age_days,
            compress: policy.compress,
            service_name: service_name.into(),
        }
    }

    pub fn policy(&self) -> RotationPolicy {
        RotationPolicy {
            file_path: self.file_path.clone(),
            level: self.level,
            max_size_mb: self.max_size_mb,
            max_backups: self.max_backups,
            max_age_days: self.max_age_days,
            compress: self.compress,
        }
    }

    /// # Errors
    ///
    /// Returns `InvalidConfiguration` for an invalid policy or an empty service name
    pub fn validate(&self) -> Result<()> {
        validate_service_name(&self.service_name)?;
        self.policy().validate()
    }
}

pub(crate) fn validate_service_name(service_name: &str) -> Result<()> {
    if service_name.trim().is_empty() {
        return Err(LoggerError::config(
            "CustomChannel",
            "service_name must not be empty",
        ));
    }
    Ok(())
}

/// Build a logger writing to the policy's file and, optionally, stdout
///
/// The policy must already be validated.
pub(crate) fn assemble(
    policy: &RotationPolicy,
    service_name: &str,
    console: bool,
    fallback: &SharedFallback,
) -> (Arc<Logger>, Arc<RotationStats>) {
    let file = RotatingFileAppender::from_validated_policy(policy).with_fallback(Arc::clone(fallback));
    let rotation = file.stats();

    let mut builder = Logger::builder()
        .name(service_name)
        .min_level(policy.level)
        .field(SERVICE_NAME_FIELD, service_name)
        .fallback(Arc::clone(fallback));
    if console {
        builder = builder.appender(ConsoleAppender::new());
    }
    let logger = builder.appender(file).build();

    (Arc::new(logger), rotation)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::fallback;
    use tempfile::tempdir;

    #[test]
    fn test_channel_name_round_trip() {
        for name in ChannelName::ALL {
            assert_eq!(name.as_str().parse::<ChannelName>().unwrap(), name);
            assert_eq!(ChannelName::ALL[name.index()], name);
        }
        assert!("gateway".parse::<ChannelName>().unwrap_err().is_configuration());
    }

    #[test]
    fn test_custom_channel_requires_service_name() {
        let custom = CustomChannel::from_policy(&RotationPolicy::default(), " ");
        assert!(custom.validate().unwrap_err().is_configuration());
    }

    #[test]
    fn test_assembled_logger_writes_file_only_without_console() {
        let dir = tempdir().unwrap();
        let policy = RotationPolicy::new()
            .with_file_path(dir.path().join("server.log"))
            .with_level(LogLevel::Info)
            .with_compression(false);

        let (logger, rotation) = assemble(&policy, "server", false, &fallback::stderr());
        assert_eq!(logger.appender_names(), vec!["rotating_file".to_string()]);
        assert_eq!(logger.min_level(), LogLevel::Info);

        logger.info("listening on 8083");
        logger.debug("filtered");

        let content = std::fs::read_to_string(dir.path().join("server.log")).unwrap();
        assert_eq!(content.lines().count(), 1);
        let record: serde_json::Value = serde_json::from_str(content.trim()).unwrap();
        assert_eq!(record["logger"], "server");
        assert_eq!(record["serviceName"], "server");
        assert_eq!(rotation.rotations(), 0);
    }

    #[test]
    fn test_assembled_logger_mirrors_to_console() {
        let dir = tempdir().unwrap();
        let policy = RotationPolicy::new().with_file_path(dir.path().join("bow.log"));

        let (logger, _) = assemble(&policy, "bow", true, &fallback::stderr());
        assert_eq!(
            logger.appender_names(),
            vec!["console".to_string(), "rotating_file".to_string()]
        );
    }
}
