use serde::{Deserialize, Serialize};

use crate::config::util::is_false;

/// Log configuration
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct Log {
    /// Disable logging entirely
    #[serde(default, skip_serializing_if = "is_false")]
    pub disabled: bool,

    /// Log level
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<LogLevel>,

    /// Output file path (stderr if unset)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,

    /// Include timestamps in log output
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<bool>,
}

/// Log levels supported by sing-box
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
    Fatal,
    Panic,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_default_serializes_empty() {
        let log = Log::default();
        let json = serde_json::to_string(&log).unwrap();
        assert_eq!(json, "{}");
    }

    #[test]
    fn test_log_level_lowercase() {
        let log = Log {
            level: Some(LogLevel::Warn),
            ..Default::default()
        };
        let json = serde_json::to_string(&log).unwrap();
        assert!(json.contains(r#""level":"warn""#));
    }
}
