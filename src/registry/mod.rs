//! Process-wide set of named channels
//!
//! A [`Registry`] owns one [`Channel`] per [`ChannelName`], each writing to
//! `<base_dir>/<name>.log` under a shared default [`RotationPolicy`].
//! Subsystems either get the registry passed to them explicitly or reach the
//! process-wide instance through [`Registry::instance`].
//!
//! ```no_run
//! use rivet_log::Registry;
//!
//! let registry = Registry::instance();
//! registry.shunt().info("registered round-robin strategy for 'test'");
//!
//! if let Some(logger) = registry.logger("discovery") {
//!     logger.warn("consul agent unreachable");
//! }
//! ```

mod channel;
mod config;
mod lazy;

pub use channel::{Channel, ChannelName, CustomChannel, SERVICE_NAME_FIELD};
pub use config::{
    RegistryConfig, DEFAULT_LOG_DIR, DEFAULT_SERVICE_NAME, LOG_PATH_VAR, SERVICE_NAME_VAR,
};
pub use lazy::LazyRegistry;

use crate::appenders::RotationPolicy;
use crate::core::error::{LoggerError, Result};
use crate::core::fallback::{self, SharedFallback};
use crate::core::logger::Logger;
use parking_lot::{Mutex, RwLock};
use std::fmt;
use std::fs;
use std::path::{Component, Path, PathBuf};
use std::sync::{Arc, Weak};

fn init_from_env() -> Registry {
    Registry::new(RegistryConfig::from_env())
}

static GLOBAL: LazyRegistry = LazyRegistry::new(init_from_env as fn() -> Registry);

macro_rules! channel_accessors {
    ($($(#[$meta:meta])* $fn_name:ident => $variant:ident),+ $(,)?) => {
        $(
            $(#[$meta])*
            pub fn $fn_name(&self) -> &Arc<Logger> {
                self.get(ChannelName::$variant).logger()
            }
        )+
    };
}

pub struct Registry {
    config: RegistryConfig,
    /// Applies to channels created after the change
    default_policy: RwLock<RotationPolicy>,
    channels: [Channel; ChannelName::ALL.len()],
    /// Files of custom loggers still alive somewhere
    claimed: Mutex<Vec<(PathBuf, Weak<Logger>)>>,
    fallback: SharedFallback,
}

/// Whether two log paths name the same file
///
/// Parents are resolved when they exist; paths whose directory has not been
/// created yet are compared lexically.
fn same_log_file(a: &Path, b: &Path) -> bool {
    let resolve = |path: &Path| -> Option<PathBuf> {
        let name = path.file_name()?;
        let parent = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        Some(fs::canonicalize(parent).ok()?.join(name))
    };
    let lexical = |path: &Path| -> PathBuf {
        path.components()
            .filter(|c| !matches!(c, Component::CurDir))
            .collect()
    };

    match (resolve(a), resolve(b)) {
        (Some(a), Some(b)) => a == b,
        _ => lexical(a) == lexical(b),
    }
}

impl Registry {
    /// The process-wide registry, built from the environment on first use
    ///
    /// Reads `LOG_PATH` (default `./logs`) and `SERVICE_NAME`.
    pub fn instance() -> &'static Registry {
        GLOBAL.get()
    }

    /// Build every well-known channel, reporting faults to stderr
    pub fn new(config: RegistryConfig) -> Self {
        Self::with_fallback(config, fallback::stderr())
    }

    /// Build every well-known channel, reporting faults to `fallback`
    pub fn with_fallback(config: RegistryConfig, fallback: SharedFallback) -> Self {
        let policy = config.default_policy().clone();
        let channels = ChannelName::ALL.map(|name| {
            let channel_policy = policy
                .clone()
                .with_file_path(config.channel_path(name.as_str()));
            Channel::build(name, channel_policy, config.console(), &fallback)
        });

        Self {
            config,
            default_policy: RwLock::new(policy),
            channels,
            claimed: Mutex::new(Vec::new()),
            fallback,
        }
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Policy used by [`Registry::new_channel`]
    pub fn default_policy(&self) -> RotationPolicy {
        self.default_policy.read().clone()
    }

    /// Replace the default policy for channels created from now on
    ///
    /// Channels that already exist keep the policy they were built with.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfiguration` if the policy does not validate; the
    /// current default is left unchanged
    pub fn configure(&self, policy: RotationPolicy) -> Result<()> {
        policy.validate()?;
        *self.default_policy.write() = policy;
        Ok(())
    }

    pub fn get(&self, name: ChannelName) -> &Channel {
        &self.channels[name.index()]
    }

    pub fn channel(&self, name: &str) -> Option<&Channel> {
        name.parse::<ChannelName>().ok().map(|name| self.get(name))
    }

    pub fn logger(&self, name: &str) -> Option<Arc<Logger>> {
        self.channel(name).map(|channel| Arc::clone(channel.logger()))
    }

    pub fn channels(&self) -> impl Iterator<Item = &Channel> {
        self.channels.iter()
    }

    channel_accessors! {
        common => Common,
        discovery => Discovery,
        examples => Examples,
        rivet => Rivet,
        server => Server,
        /// Gateway
        bow => Bow,
        /// Load balancing
        shunt => Shunt,
        /// Request handling
        trans => Trans,
        scheduled => Scheduled,
    }

    /// Build a logger on the current default policy
    ///
    /// The returned logger is not registered; the caller owns it.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfiguration` for an empty path or service name, or a
    /// path already written by another channel
    pub fn new_channel(
        &self,
        file_path: impl Into<PathBuf>,
        service_name: &str,
    ) -> Result<Arc<Logger>> {
        let custom = CustomChannel::from_policy(
            &self.default_policy().with_file_path(file_path),
            service_name,
        );
        self.new_custom_channel(custom)
    }

    /// Build a logger with caller-supplied rotation and level settings
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfiguration` if `max_size_mb` is zero, the path or
    /// service name is empty, or the file belongs to a registered channel or
    /// to a custom logger that is still alive
    pub fn new_custom_channel(&self, custom: CustomChannel) -> Result<Arc<Logger>> {
        custom.validate()?;

        // Held until the new logger is recorded
        let mut claimed = self.claimed.lock();
        claimed.retain(|(_, logger)| logger.strong_count() > 0);

        if let Some(owner) = self
            .channels
            .iter()
            .find(|channel| same_log_file(channel.file_path(), &custom.file_path))
        {
            return Err(LoggerError::config(
                "CustomChannel",
                format!(
                    "'{}' is the file of channel '{}'",
                    custom.file_path.display(),
                    owner.name()
                ),
            ));
        }
        if claimed
            .iter()
            .any(|(path, _)| same_log_file(path, &custom.file_path))
        {
            return Err(LoggerError::config(
                "CustomChannel",
                format!(
                    "'{}' is already written by another custom channel",
                    custom.file_path.display()
                ),
            ));
        }

        let (logger, _) = channel::assemble(
            &custom.policy(),
            &custom.service_name,
            self.config.console(),
            &self.fallback,
        );
        claimed.push((custom.file_path.clone(), Arc::downgrade(&logger)));
        Ok(logger)
    }

    /// Flush every registered channel
    ///
    /// # Errors
    ///
    /// Returns the first flush failure; the remaining channels are still flushed
    pub fn flush(&self) -> Result<()> {
        let mut first_error = None;
        for channel in &self.channels {
            if let Err(e) = channel.logger().flush() {
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("base_dir", &self.config.base_dir())
            .field("channels", &self.channels)
            .finish()
    }
}
