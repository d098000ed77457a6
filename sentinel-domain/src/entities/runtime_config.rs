// Runtime configuration handed to the inner layers

use serde::{Deserialize, Serialize};

/// Detection ceilings. Validated (> 0) at startup, never re-read mid-pass.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SentinelThresholds {
    pub max_gain_per_minute: f64,
    pub max_balance: i64,
}

impl Default for SentinelThresholds {
    fn default() -> Self {
        Self {
            max_gain_per_minute: 10_000.0,
            max_balance: 1_000_000_000,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub bind_addr: String,
    pub api_token: Option<String>,
    pub thresholds: SentinelThresholds,
    pub scan_interval_seconds: u64,
    pub alert_webhook_url: Option<String>,
    pub alert_webhook_template: Option<String>,
    pub max_body_bytes: u64,
    pub request_timeout_seconds: u64,
}

#[derive(Debug, Clone)]
pub struct DbConfig {
    pub database_path: String,
}
