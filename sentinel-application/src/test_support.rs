use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::anyhow;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sentinel_domain::ports::{AlertNotifier, BalanceStore};
use sentinel_domain::{
    AlertFilter, AlertRecord, AlertRule, BalanceSnapshot, NewAlert, RuntimeConfig,
    SentinelThresholds, UserBalance, UserId,
};

use crate::AppState;

#[derive(Default)]
pub struct MemoryStore {
    pub users: Mutex<Vec<UserBalance>>,
    pub snapshots: Mutex<HashMap<UserId, BalanceSnapshot>>,
    pub alerts: Mutex<Vec<AlertRecord>>,
    pub fail_listing: bool,
    pub slow_snapshot: Option<(String, Duration)>,
}

impl MemoryStore {
    pub fn with_users(users: &[(&str, i64)]) -> Self {
        let store = Self::default();
        *store.users.lock().unwrap() = users
            .iter()
            .map(|(id, balance)| UserBalance {
                id: UserId::from(*id),
                current_balance: *balance,
                frozen: false,
            })
            .collect();
        store
    }

    pub fn push_alert(&self, user: &str, rule: AlertRule) {
        let mut alerts = self.alerts.lock().unwrap();
        let id = alerts.len() as i64 + 1;
        alerts.push(AlertRecord {
            id,
            user_id: UserId::from(user),
            rule,
            details: format!("alert {id}"),
            created_at: Utc::now(),
        });
    }
}

#[async_trait]
impl BalanceStore for MemoryStore {
    async fn list_users(&self) -> anyhow::Result<Vec<UserBalance>> {
        if self.fail_listing {
            return Err(anyhow!("database is locked"));
        }
        Ok(self.users.lock().unwrap().clone())
    }

    async fn get_snapshot(&self, user_id: &UserId) -> anyhow::Result<Option<BalanceSnapshot>> {
        if let Some((slow_user, delay)) = &self.slow_snapshot {
            if user_id.as_str() == slow_user {
                tokio::time::sleep(*delay).await;
            }
        }
        Ok(self.snapshots.lock().unwrap().get(user_id).cloned())
    }

    async fn upsert_snapshot(
        &self,
        user_id: &UserId,
        balance: i64,
        at: DateTime<Utc>,
    ) -> anyhow::Result<()> {
        self.snapshots.lock().unwrap().insert(
            user_id.clone(),
            BalanceSnapshot {
                user_id: user_id.clone(),
                last_balance: balance,
                last_check_time: at,
            },
        );
        Ok(())
    }

    async fn append_alert(&self, alert: &NewAlert) -> anyhow::Result<()> {
        let mut alerts = self.alerts.lock().unwrap();
        let id = alerts.len() as i64 + 1;
        alerts.push(AlertRecord {
            id,
            user_id: alert.user_id.clone(),
            rule: alert.rule,
            details: alert.details.clone(),
            created_at: alert.created_at,
        });
        Ok(())
    }

    async fn set_frozen(&self, user_id: &UserId) -> anyhow::Result<bool> {
        let mut users = self.users.lock().unwrap();
        let user = users
            .iter_mut()
            .find(|user| &user.id == user_id)
            .ok_or_else(|| anyhow!("user not found"))?;
        let changed = !user.frozen;
        user.frozen = true;
        Ok(changed)
    }

    async fn list_alerts(&self, filter: &AlertFilter) -> anyhow::Result<Vec<AlertRecord>> {
        Ok(self
            .alerts
            .lock()
            .unwrap()
            .iter()
            .rev()
            .filter(|alert| filter.user_id.as_ref().map_or(true, |id| &alert.user_id == id))
            .filter(|alert| filter.rule.map_or(true, |rule| alert.rule == rule))
            .take(filter.limit)
            .cloned()
            .collect())
    }

    async fn ping(&self) -> anyhow::Result<()> {
        Ok(())
    }
}

#[derive(Default)]
pub struct RecordingNotifier {
    pub sent: Mutex<Vec<Vec<String>>>,
}

#[async_trait]
impl AlertNotifier for RecordingNotifier {
    fn spawn_notify(&self, reports: Vec<String>) {
        self.sent.lock().unwrap().push(reports);
    }

    async fn check_target(&self) -> anyhow::Result<()> {
        Ok(())
    }

    fn mode(&self) -> &'static str {
        "unset"
    }
}

pub fn runtime_config() -> RuntimeConfig {
    RuntimeConfig {
        bind_addr: "127.0.0.1:3240".to_string(),
        api_token: None,
        thresholds: SentinelThresholds::default(),
        scan_interval_seconds: 0,
        alert_webhook_url: None,
        alert_webhook_template: None,
        max_body_bytes: 64 * 1024,
        request_timeout_seconds: 15,
    }
}

pub fn app_state(store: Arc<MemoryStore>, notifier: Arc<RecordingNotifier>) -> AppState {
    AppState::new(runtime_config(), store, notifier)
}
