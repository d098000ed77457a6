use std::env;
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use tokio::fs;
use tracing::warn;

use sentinel_domain::{DbConfig, RuntimeConfig, SentinelThresholds};

use super::validation::validate_thresholds;

pub const CONFIG_ENV: &str = "ASTERBOOK_CONFIG";
const IN_MEMORY_DATABASE: &str = ":memory:";

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct AppConfig {
    pub bind_addr: String,
    pub api_token: Option<String>,
    pub database_path: String,
    pub max_gain_per_minute: f64,
    pub max_balance: i64,
    pub scan_interval_seconds: u64,
    pub alert_webhook_url: Option<String>,
    pub alert_webhook_template: Option<String>,
    pub max_body_bytes: u64,
    pub request_timeout_seconds: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        let thresholds = SentinelThresholds::default();
        Self {
            bind_addr: "127.0.0.1:3240".to_string(),
            api_token: None,
            database_path: "./asterbook.db".to_string(),
            max_gain_per_minute: thresholds.max_gain_per_minute,
            max_balance: thresholds.max_balance,
            scan_interval_seconds: 300,
            alert_webhook_url: None,
            alert_webhook_template: None,
            max_body_bytes: 64 * 1024,
            request_timeout_seconds: 15,
        }
    }
}

impl AppConfig {
    pub async fn load() -> Result<Self> {
        let path = env::var(CONFIG_ENV).unwrap_or_else(|_| "./config.toml".to_string());
        Self::load_from(&path).await
    }

    pub async fn load_from(path: &str) -> Result<Self> {
        let file_path = Path::new(path);
        let base_dir = file_path.parent();
        let mut config = if file_path.exists() {
            let content = fs::read_to_string(file_path)
                .await
                .with_context(|| format!("read config {}", file_path.display()))?;
            toml::from_str(&content)
                .with_context(|| format!("parse config {}", file_path.display()))?
        } else {
            warn!("{} not found, using defaults", file_path.display());
            AppConfig::default()
        };
        config.apply_env_overrides();
        config.resolve_paths(base_dir);
        config.normalize();
        config.validate()?;
        Ok(config)
    }

    pub fn normalize(&mut self) {
        if let Some(api_token) = &self.api_token {
            if api_token.trim().is_empty() {
                self.api_token = None;
            }
        }
        if let Some(alert_url) = &self.alert_webhook_url {
            if alert_url.trim().is_empty() {
                self.alert_webhook_url = None;
            }
        }
        if let Some(template) = &self.alert_webhook_template {
            if template.trim().is_empty() {
                self.alert_webhook_template = None;
            }
        }
        self.database_path = self.database_path.trim().to_string();
    }

    fn resolve_paths(&mut self, base_dir: Option<&Path>) {
        let Some(base) = base_dir else {
            return;
        };
        if self.database_path != IN_MEMORY_DATABASE {
            self.database_path = resolve_path(base, &self.database_path);
        }
    }

    pub fn validate(&self) -> Result<()> {
        self.bind_addr
            .parse::<std::net::SocketAddr>()
            .map_err(|err| anyhow!("invalid bind_addr: {}", err))?;
        if self.database_path.is_empty() {
            return Err(anyhow!("database_path must not be empty"));
        }
        if self.max_body_bytes == 0 {
            return Err(anyhow!("max_body_bytes must be greater than 0"));
        }
        if self.request_timeout_seconds == 0 {
            return Err(anyhow!("request_timeout_seconds must be greater than 0"));
        }
        validate_thresholds(&self.thresholds())
    }

    pub fn thresholds(&self) -> SentinelThresholds {
        SentinelThresholds {
            max_gain_per_minute: self.max_gain_per_minute,
            max_balance: self.max_balance,
        }
    }

    pub fn to_runtime_config(&self) -> RuntimeConfig {
        RuntimeConfig {
            bind_addr: self.bind_addr.clone(),
            api_token: self.api_token.clone(),
            thresholds: self.thresholds(),
            scan_interval_seconds: self.scan_interval_seconds,
            alert_webhook_url: self.alert_webhook_url.clone(),
            alert_webhook_template: self.alert_webhook_template.clone(),
            max_body_bytes: self.max_body_bytes,
            request_timeout_seconds: self.request_timeout_seconds,
        }
    }

    pub fn to_db_config(&self) -> DbConfig {
        DbConfig {
            database_path: self.database_path.clone(),
        }
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(value) = env::var("ASTERBOOK_BIND_ADDR") {
            self.bind_addr = value;
        }
        if let Ok(value) = env::var("ASTERBOOK_API_TOKEN") {
            self.api_token = Some(value);
        }
        if let Ok(value) = env::var("ASTERBOOK_DATABASE_PATH") {
            self.database_path = value;
        }
        if let Ok(value) = env::var("ASTERBOOK_MAX_GAIN_PER_MINUTE") {
            self.max_gain_per_minute = value.parse().unwrap_or(self.max_gain_per_minute);
        }
        if let Ok(value) = env::var("ASTERBOOK_MAX_BALANCE") {
            self.max_balance = value.parse().unwrap_or(self.max_balance);
        }
        if let Ok(value) = env::var("ASTERBOOK_SCAN_INTERVAL_SECONDS") {
            self.scan_interval_seconds = value.parse().unwrap_or(self.scan_interval_seconds);
        }
        if let Ok(value) = env::var("ASTERBOOK_ALERT_WEBHOOK_URL") {
            self.alert_webhook_url = Some(value);
        }
        if let Ok(value) = env::var("ASTERBOOK_ALERT_WEBHOOK_TEMPLATE") {
            self.alert_webhook_template = Some(value);
        }
        if let Ok(value) = env::var("ASTERBOOK_MAX_BODY_BYTES") {
            self.max_body_bytes = value.parse().unwrap_or(self.max_body_bytes);
        }
        if let Ok(value) = env::var("ASTERBOOK_REQUEST_TIMEOUT_SECONDS") {
            self.request_timeout_seconds = value.parse().unwrap_or(self.request_timeout_seconds);
        }
    }
}

fn resolve_path(base: &Path, value: &str) -> String {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return trimmed.to_string();
    }
    let path = Path::new(trimmed);
    if path.is_absolute() {
        trimmed.to_string()
    } else {
        base.join(path).to_string_lossy().to_string()
    }
}
