use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::entities::{AlertFilter, AlertRecord, BalanceSnapshot, NewAlert, UserBalance};
use crate::value_objects::UserId;

/// Persistence collaborator for the balance monitor.
#[async_trait]
pub trait BalanceStore: Send + Sync {
    async fn list_users(&self) -> anyhow::Result<Vec<UserBalance>>;
    async fn get_snapshot(&self, user_id: &UserId) -> anyhow::Result<Option<BalanceSnapshot>>;
    /// Create-or-replace. An older `at` than the stored one is ignored.
    async fn upsert_snapshot(
        &self,
        user_id: &UserId,
        balance: i64,
        at: DateTime<Utc>,
    ) -> anyhow::Result<()>;
    async fn append_alert(&self, alert: &NewAlert) -> anyhow::Result<()>;
    /// Returns `true` only when the flag actually changed.
    async fn set_frozen(&self, user_id: &UserId) -> anyhow::Result<bool>;
    async fn list_alerts(&self, filter: &AlertFilter) -> anyhow::Result<Vec<AlertRecord>>;
    async fn ping(&self) -> anyhow::Result<()>;
}
