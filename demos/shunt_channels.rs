//! Logging from a load balancer and its service discovery
//!
//! Run with `LOG_PATH=/tmp/rivet-logs cargo run --example shunt_channels`

use rivet_log::prelude::*;
use rivet_log::{error, info};
use std::time::Duration;

fn main() -> Result<()> {
    let registry = Registry::instance();

    // Audit records are kept much longer than the process default
    let audit = registry.new_custom_channel(CustomChannel {
        file_path: registry.config().base_dir().join("audit.log"),
        level: LogLevel::Info,
        max_size_mb: 16,
        max_backups: 90,
        max_age_days: 365,
        compress: true,
        service_name: "audit".to_string(),
    })?;

    registry
        .discovery()
        .info_with("consul agent registered", LogContext::new().with_field("addr", "127.0.0.1:8500"));

    for (service, strategy) in [("test", "round"), ("test1", "random"), ("test2", "hash")] {
        info!(registry.shunt(), "registered {} with {} strategy", service, strategy);
    }

    registry.bow().warn_with(
        "slow upstream",
        LogContext::new()
            .with_field("route", "rivet/shunt")
            .with_field("elapsed", Duration::from_millis(1250)),
    );
    error!(registry.trans(), "fallback invoked for {}", "rivet/shunt");
    audit.info("configuration loaded");

    registry.flush()?;
    audit.flush()?;

    println!("logs written to {}", registry.config().base_dir().display());
    Ok(())
}
