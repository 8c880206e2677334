//! Registry configuration sourced from the environment

use crate::appenders::RotationPolicy;
use crate::core::error::Result;
use std::path::{Path, PathBuf};

/// Base log directory
pub const LOG_PATH_VAR: &str = "LOG_PATH";

/// Service label for the host application
pub const SERVICE_NAME_VAR: &str = "SERVICE_NAME";

pub const DEFAULT_LOG_DIR: &str = "./logs";
pub const DEFAULT_SERVICE_NAME: &str = "rivet";

/// File name of the default policy inside the base directory
const DEFAULT_POLICY_FILE: &str = "rivet.log";

/// Settings the registry is built from
///
/// The default policy is always valid: it can only be replaced through
/// [`RegistryConfig::with_policy`], which validates it.
///
/// # Examples
///
/// ```
/// use rivet_log::{LogLevel, RegistryConfig, RotationPolicy};
///
/// let config = RegistryConfig::from_lookup(|key| match key {
///     "LOG_PATH" => Some("/var/log/rivet".to_string()),
///     _ => None,
/// });
/// assert_eq!(config.channel_path("shunt").to_str(), Some("/var/log/rivet/shunt.log"));
/// assert_eq!(config.service_name(), "rivet");
///
/// let config = config
///     .with_policy(RotationPolicy::new().with_level(LogLevel::Info))
///     .unwrap();
/// assert_eq!(config.default_policy().level, LogLevel::Info);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryConfig {
    base_dir: PathBuf,
    service_name: String,
    default_policy: RotationPolicy,
    console: bool,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        let base_dir = PathBuf::from(DEFAULT_LOG_DIR);
        Self {
            default_policy: RotationPolicy::default()
                .with_file_path(base_dir.join(DEFAULT_POLICY_FILE)),
            base_dir,
            service_name: DEFAULT_SERVICE_NAME.to_string(),
            console: true,
        }
    }
}

impl RegistryConfig {
    /// Read `LOG_PATH` and `SERVICE_NAME`, loading a `.env` file first if one exists
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable source
    ///
    /// Unset or blank variables fall back to the defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let mut config = Self::default();
        if let Some(dir) = read(LOG_PATH_VAR) {
            config = config.with_base_dir(dir);
        }
        if let Some(name) = read(SERVICE_NAME_VAR) {
            config = config.with_service_name(name);
        }
        config
    }

    /// Move the base directory; the default policy file moves with it
    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_base_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.base_dir = dir.into();
        let file_name = self
            .default_policy
            .file_path
            .file_name()
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_POLICY_FILE));
        self.default_policy.file_path = self.base_dir.join(file_name);
        self
    }

    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_service_name(mut self, name: impl Into<String>) -> Self {
        self.service_name = name.into();
        self
    }

    /// Replace the default policy
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfiguration` if the policy does not validate
    pub fn with_policy(mut self, policy: RotationPolicy) -> Result<Self> {
        policy.validate()?;
        self.default_policy = policy;
        Ok(self)
    }

    /// Enable or disable the stdout mirror for every channel
    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_console(mut self, enabled: bool) -> Self {
        self.console = enabled;
        self
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Used by the host application only; channels label themselves by name
    pub fn service_name(&self) -> &str {
        &self.service_name
    }

    pub fn default_policy(&self) -> &RotationPolicy {
        &self.default_policy
    }

    pub fn console(&self) -> bool {
        self.console
    }

    /// `<base_dir>/<name>.log`
    pub fn channel_path(&self, name: &str) -> PathBuf {
        self.base_dir.join(format!("{}.log", name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::log_level::LogLevel;
    use std::collections::HashMap;

    fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_unset() {
        let config = RegistryConfig::from_lookup(|_| None);

        assert_eq!(config.base_dir(), Path::new("./logs"));
        assert_eq!(config.service_name(), "rivet");
        assert!(config.console());
        assert_eq!(
            config.default_policy().file_path,
            Path::new("./logs").join("rivet.log")
        );
        assert_eq!(config.default_policy().max_size_mb, 128);
    }

    #[test]
    fn test_reads_variables() {
        let config = RegistryConfig::from_lookup(lookup_from(&[
            ("LOG_PATH", "/srv/logs"),
            ("SERVICE_NAME", "shunt1"),
        ]));

        assert_eq!(config.base_dir(), Path::new("/srv/logs"));
        assert_eq!(config.service_name(), "shunt1");
        assert_eq!(config.channel_path("bow"), Path::new("/srv/logs/bow.log"));
        assert_eq!(
            config.default_policy().file_path,
            Path::new("/srv/logs/rivet.log")
        );
    }

    #[test]
    fn test_blank_variables_use_defaults() {
        let config =
            RegistryConfig::from_lookup(lookup_from(&[("LOG_PATH", "  "), ("SERVICE_NAME", "")]));

        assert_eq!(config.base_dir(), Path::new("./logs"));
        assert_eq!(config.service_name(), "rivet");
    }

    #[test]
    fn test_with_policy_validates() {
        let result = RegistryConfig::default().with_policy(RotationPolicy::new().with_max_size_mb(0));
        assert!(result.unwrap_err().is_configuration());

        let config = RegistryConfig::default()
            .with_policy(RotationPolicy::new().with_level(LogLevel::Warn).with_max_backups(3))
            .unwrap();
        assert_eq!(config.default_policy().level, LogLevel::Warn);
        assert_eq!(config.default_policy().max_backups, 3);
    }
}
