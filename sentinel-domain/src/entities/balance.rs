// Balance entities
// The account balance fact and the per-user snapshot the monitor compares against

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::value_objects::UserId;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserBalance {
    pub id: UserId,
    pub current_balance: i64,
    pub frozen: bool,
}

/// Last observed balance for a user. At most one per user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceSnapshot {
    pub user_id: UserId,
    pub last_balance: i64,
    pub last_check_time: DateTime<Utc>,
}
