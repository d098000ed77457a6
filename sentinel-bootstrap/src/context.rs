use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;

use sentinel_application::AppState;
use sentinel_infrastructure::{AppConfig, SqliteBalanceStore, WebhookAlertNotifier};

pub struct AppContext {
    pub state: AppState,
}

impl AppContext {
    pub async fn new() -> Result<Self> {
        let config = AppConfig::load().await?;
        Self::from_config(&config).await
    }

    pub async fn from_config(config: &AppConfig) -> Result<Self> {
        let runtime_config = config.to_runtime_config();
        let db_config = config.to_db_config();

        let store = Arc::new(
            SqliteBalanceStore::open(&db_config.database_path)
                .with_context(|| format!("open database {}", db_config.database_path))?,
        );
        store.ensure_schema().await?;
        info!(
            database = %db_config.database_path,
            max_gain_per_minute = runtime_config.thresholds.max_gain_per_minute,
            max_balance = runtime_config.thresholds.max_balance,
            "sentinel store ready"
        );

        let notifier = Arc::new(WebhookAlertNotifier::new(&runtime_config));
        let state = AppState::new(runtime_config, store, notifier);

        Ok(Self { state })
    }
}
