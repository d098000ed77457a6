use std::sync::Arc;

use sentinel_domain::ports::{AlertNotifier, BalanceStore};
use sentinel_domain::services::BalanceMonitor;
use sentinel_domain::{RuntimeConfig, SentinelStatus};
use tokio::sync::{Mutex, RwLock};

use crate::Metrics;

#[derive(Clone)]
pub struct AppState {
    pub config: RuntimeConfig,
    pub store: Arc<dyn BalanceStore>,
    pub notifier: Arc<dyn AlertNotifier>,
    pub monitor: Arc<Mutex<BalanceMonitor>>,
    pub metrics: Arc<Metrics>,
    pub sentinel_status: Arc<RwLock<SentinelStatus>>,
}

impl AppState {
    pub fn new(
        config: RuntimeConfig,
        store: Arc<dyn BalanceStore>,
        notifier: Arc<dyn AlertNotifier>,
    ) -> Self {
        let monitor = BalanceMonitor::new(store.clone(), config.thresholds);
        Self {
            config,
            store,
            notifier,
            monitor: Arc::new(Mutex::new(monitor)),
            metrics: Arc::new(Metrics::default()),
            sentinel_status: Arc::new(RwLock::new(SentinelStatus::default())),
        }
    }
}
