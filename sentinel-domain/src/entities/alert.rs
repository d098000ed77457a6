// Alert entity
// Append-only audit record of a detected balance anomaly

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::value_objects::{AlertRule, UserId};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertRecord {
    pub id: i64,
    pub user_id: UserId,
    pub rule: AlertRule,
    pub details: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAlert {
    pub user_id: UserId,
    pub rule: AlertRule,
    pub details: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default)]
pub struct AlertFilter {
    pub user_id: Option<UserId>,
    pub rule: Option<AlertRule>,
    pub limit: usize,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AlertQuery {
    pub user: Option<String>,
    pub rule: Option<String>,
    pub limit: Option<usize>,
}
