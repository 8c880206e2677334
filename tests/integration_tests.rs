//! Integration tests for registry channels writing through rotating files

use parking_lot::Mutex;
use rivet_log::prelude::*;
use rivet_log::{SharedFallback, SERVICE_NAME_FIELD};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

#[derive(Default)]
struct CapturingFallback {
    faults: Mutex<Vec<String>>,
}

impl FallbackSink for CapturingFallback {
    fn report(&self, fault: &LoggerError) {
        self.faults.lock().push(fault.to_string());
    }
}

fn quiet_config(dir: &Path) -> RegistryConfig {
    RegistryConfig::default().with_base_dir(dir).with_console(false)
}

fn read_records(path: &Path) -> Vec<serde_json::Value> {
    fs::read_to_string(path)
        .expect("Failed to read log file")
        .lines()
        .map(|line| serde_json::from_str(line).expect("Every line is a JSON object"))
        .collect()
}

fn backups_of(dir: &Path, stem: &str) -> Vec<PathBuf> {
    let prefix = format!("{}-", stem);
    let mut backups: Vec<PathBuf> = fs::read_dir(dir)
        .expect("Failed to list log dir")
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| {
            p.file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.starts_with(&prefix))
        })
        .collect();
    backups.sort();
    backups
}

#[test]
fn test_shunt_and_discovery_write_distinct_files() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let registry = Registry::new(quiet_config(temp_dir.path()));

    registry.shunt().info("registered round-robin strategy");
    registry.discovery().warn("consul agent unreachable");
    registry.shunt().info("registered hash strategy");

    let shunt = read_records(&temp_dir.path().join("shunt.log"));
    let discovery = read_records(&temp_dir.path().join("discovery.log"));

    assert_eq!(shunt.len(), 2);
    assert_eq!(discovery.len(), 1);
    assert!(shunt.iter().all(|r| r[SERVICE_NAME_FIELD] == "shunt"));
    assert_eq!(discovery[0][SERVICE_NAME_FIELD], "discovery");
    assert_eq!(discovery[0]["msg"], "consul agent unreachable");

    assert!(!Arc::ptr_eq(registry.shunt(), registry.discovery()));
    assert_ne!(
        registry.get(ChannelName::Shunt).file_path(),
        registry.get(ChannelName::Discovery).file_path()
    );

    // Untouched channels never create files
    assert!(!temp_dir.path().join("bow.log").exists());
}

#[test]
fn test_record_shape() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let registry = Registry::new(quiet_config(temp_dir.path()));

    registry.trans().info_with(
        "fallback invoked",
        LogContext::new()
            .with_field("route", "rivet/shunt")
            .with_field("elapsed", std::time::Duration::from_millis(1500)),
    );
    registry.trans().error("request failed");

    let records = read_records(&temp_dir.path().join("trans.log"));
    let info = records[0].as_object().unwrap();
    let keys: Vec<&str> = info.keys().map(String::as_str).collect();
    assert_eq!(
        keys,
        vec!["time", "level", "logger", "caller", "msg", "serviceName", "route", "elapsed"]
    );
    assert_eq!(info["level"], "info");
    assert_eq!(info["logger"], "trans");
    assert_eq!(info["elapsed"], serde_json::json!(1.5));
    assert!(info["time"].as_str().unwrap().ends_with('Z'));
    assert!(info["caller"]
        .as_str()
        .unwrap()
        .contains("integration_tests.rs:"));

    assert_eq!(records[1]["level"], "error");
    assert!(records[1]["stacktrace"].is_string());
}

#[test]
fn test_rotation_scenario_keeps_two_backups() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let registry = Registry::new(quiet_config(temp_dir.path()));
    registry
        .configure(
            RotationPolicy::new()
                .with_max_size_mb(1)
                .with_max_backups(2)
                .with_max_age_days(0)
                .with_compression(false),
        )
        .unwrap();

    let log_path = temp_dir.path().join("scenario.log");
    let logger = registry.new_channel(&log_path, "scenario").unwrap();
    let payload = "p".repeat(1000);

    let write_until_backups = |target: usize| {
        for _ in 0..10_000 {
            logger.info(payload.as_str());
            if backups_of(temp_dir.path(), "scenario").len() >= target {
                return;
            }
        }
        panic!("no rotation after 10000 records");
    };

    write_until_backups(1);
    let oldest = backups_of(temp_dir.path(), "scenario")[0].clone();

    write_until_backups(2);
    let backups = backups_of(temp_dir.path(), "scenario");
    assert_eq!(backups.len(), 2);
    assert!(oldest.exists(), "nothing is deleted within the backup limit");
    assert!(log_path.exists());

    // Third rotation: the oldest backup goes, two remain
    let second = backups[1].clone();
    for _ in 0..10_000 {
        logger.info(payload.as_str());
        if !oldest.exists() {
            break;
        }
    }
    let backups = backups_of(temp_dir.path(), "scenario");
    assert!(!oldest.exists());
    assert_eq!(backups.len(), 2);
    assert!(backups.contains(&second));

    // Every backup stays within the configured size
    for backup in &backups {
        assert!(fs::metadata(backup).unwrap().len() <= 1024 * 1024);
    }
    assert_eq!(logger.metrics().sink_failures(), 0);
}

#[test]
fn test_custom_channel_uses_its_own_settings() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let registry = Registry::new(quiet_config(temp_dir.path()));

    let logger = registry
        .new_custom_channel(CustomChannel {
            file_path: temp_dir.path().join("audit").join("audit.log"),
            level: LogLevel::Warn,
            max_size_mb: 2,
            max_backups: 5,
            max_age_days: 90,
            compress: false,
            service_name: "audit".to_string(),
        })
        .unwrap();

    logger.info("filtered");
    logger.warn("kept");

    let records = read_records(&temp_dir.path().join("audit").join("audit.log"));
    assert_eq!(records.len(), 1);
    assert_eq!(records[0][SERVICE_NAME_FIELD], "audit");
}

#[test]
fn test_invalid_custom_channel_is_rejected_at_build() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let registry = Registry::new(quiet_config(temp_dir.path()));

    let mut custom = CustomChannel::from_policy(&registry.default_policy(), "bad");
    custom.file_path = temp_dir.path().join("bad.log");
    custom.max_size_mb = 0;

    let err = registry.new_custom_channel(custom).unwrap_err();
    assert!(matches!(err, LoggerError::InvalidConfiguration { .. }));
    assert!(!temp_dir.path().join("bad.log").exists());
}

#[test]
fn test_unwritable_directory_reports_to_fallback() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    // A regular file where the log directory should be
    let blocked = temp_dir.path().join("blocked");
    fs::write(&blocked, "not a directory").unwrap();

    let fallback = Arc::new(CapturingFallback::default());
    let shared: SharedFallback = fallback.clone();
    let registry = Registry::with_fallback(quiet_config(&blocked), shared);

    // Logging calls never surface the failure
    for i in 0..10 {
        registry.scheduled().info(format!("tick {}", i));
    }

    let metrics = registry.scheduled().metrics();
    assert_eq!(metrics.sink_failures(), 10);
    assert_eq!(metrics.total_written(), 0);

    // First failure reported, the rest throttled
    let faults = fallback.faults.lock();
    assert_eq!(faults.len(), 1);
    assert!(faults[0].contains("Sink write failed"), "{}", faults[0]);
    assert!(faults[0].contains("scheduled.log"), "{}", faults[0]);
}

#[test]
fn test_flush_all_channels() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let registry = Registry::new(quiet_config(temp_dir.path()));

    registry.common().debug("startup");
    registry.rivet().info("router ready");
    registry.flush().unwrap();

    assert_eq!(read_records(&temp_dir.path().join("common.log")).len(), 1);
    assert_eq!(read_records(&temp_dir.path().join("rivet.log")).len(), 1);
}
