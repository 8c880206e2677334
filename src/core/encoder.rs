//! JSON line encoder
//!
//! Produces one JSON object per record with a fixed key order:
//! `time, level, logger, caller, msg`, then logger-level fields such as
//! `serviceName`, then record fields, then `stacktrace`.

use super::log_context::LogContext;
use super::log_entry::LogEntry;
use super::timestamp;
use serde_json::{Map, Value};

/// Key names and formatting for encoded records
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncoderConfig {
    pub time_key: String,
    pub level_key: String,
    pub name_key: String,
    pub caller_key: String,
    pub message_key: String,
    pub stacktrace_key: String,
    pub line_ending: String,
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            time_key: "time".to_string(),
            level_key: "level".to_string(),
            name_key: "logger".to_string(),
            caller_key: "caller".to_string(),
            message_key: "msg".to_string(),
            stacktrace_key: "stacktrace".to_string(),
            line_ending: "\n".to_string(),
        }
    }
}

impl EncoderConfig {
    /// Keys owned by the encoder rather than by fields
    pub fn is_reserved(&self, key: &str) -> bool {
        [
            &self.time_key,
            &self.level_key,
            &self.name_key,
            &self.caller_key,
            &self.message_key,
            &self.stacktrace_key,
        ]
        .iter()
        .any(|reserved| reserved.as_str() == key)
    }
}

#[derive(Debug, Clone, Default)]
pub struct JsonEncoder {
    config: EncoderConfig,
}

impl JsonEncoder {
    pub fn new(config: EncoderConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EncoderConfig {
        &self.config
    }

    /// Encode a record into a single line, including the line ending
    ///
    /// Fields never take a fixed key, even one absent from this record, and
    /// record fields never override logger fields.
    pub fn encode(&self, name: Option<&str>, logger_fields: &LogContext, entry: &LogEntry) -> String {
        let cfg = &self.config;
        let mut obj = Map::new();

        obj.insert(
            cfg.time_key.clone(),
            Value::String(timestamp::iso8601(&entry.timestamp)),
        );
        obj.insert(
            cfg.level_key.clone(),
            Value::String(entry.level.to_str().to_string()),
        );
        if let Some(name) = name {
            obj.insert(cfg.name_key.clone(), Value::String(name.to_string()));
        }
        if let Some(ref caller) = entry.caller {
            obj.insert(cfg.caller_key.clone(), Value::String(caller.clone()));
        }
        obj.insert(cfg.message_key.clone(), Value::String(entry.message.clone()));

        for (key, value) in logger_fields.iter().chain(entry.fields.iter()) {
            if !cfg.is_reserved(key) && !obj.contains_key(key) {
                obj.insert(key.to_string(), value.to_json_value());
            }
        }

        if let Some(ref stacktrace) = entry.stacktrace {
            obj.insert(cfg.stacktrace_key.clone(), Value::String(stacktrace.clone()));
        }

        // A Map of plain values always serializes
        let mut line = Value::Object(obj).to_string();
        line.push_str(&cfg.line_ending);
        line
    }
}
