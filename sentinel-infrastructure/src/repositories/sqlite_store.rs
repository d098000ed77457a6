use std::path::Path;
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use tracing::{debug, info};

use sentinel_domain::{
    millis_to_utc, AlertFilter, AlertRecord, AlertRule, BalanceSnapshot, BalanceStore, NewAlert,
    UserBalance, UserId,
};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    id TEXT PRIMARY KEY,
    stardust_coins INTEGER NOT NULL DEFAULT 0,
    frozen INTEGER NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS balance_snapshots (
    user_id TEXT PRIMARY KEY REFERENCES users(id) ON DELETE CASCADE,
    last_balance INTEGER NOT NULL,
    last_check_time INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS alerts (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id TEXT NOT NULL,
    rule TEXT NOT NULL,
    details TEXT NOT NULL,
    created_at INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_alerts_user ON alerts (user_id, id);
"#;

/// SQLite-backed store for users, snapshots and alerts.
#[derive(Clone)]
pub struct SqliteBalanceStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteBalanceStore {
    /// Opens (or creates) the database. `":memory:"` opens a private in-memory database.
    pub fn open(database_path: &str) -> Result<Self> {
        let conn = if database_path == ":memory:" {
            debug!("opening in-memory sqlite database");
            Connection::open_in_memory().context("open in-memory sqlite")?
        } else {
            let path = Path::new(database_path);
            if let Some(parent) = path.parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent)
                        .with_context(|| format!("create {}", parent.display()))?;
                }
            }
            let conn = Connection::open(path)
                .with_context(|| format!("open sqlite database at {}", path.display()))?;
            conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")
                .context("set sqlite pragmas")?;
            info!(path = %path.display(), "sqlite database opened");
            conn
        };
        conn.execute_batch("PRAGMA foreign_keys=ON;")
            .context("enable foreign keys")?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::open(":memory:")
    }

    pub async fn ensure_schema(&self) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute_batch(SCHEMA).context("init sentinel schema")?;
            Ok(())
        })
        .await
    }

    /// Creates the user or replaces its balance. The frozen flag is left untouched.
    pub async fn upsert_user(&self, user_id: &UserId, balance: i64) -> Result<()> {
        let id = user_id.0.clone();
        self.with_conn(move |conn| {
            conn.execute(
                "INSERT INTO users (id, stardust_coins) VALUES (?1, ?2)
                 ON CONFLICT(id) DO UPDATE SET stardust_coins = excluded.stardust_coins",
                params![id, balance],
            )?;
            Ok(())
        })
        .await
    }

    async fn with_conn<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = self.conn.clone();
        tokio::task::spawn_blocking(move || {
            let conn = conn
                .lock()
                .map_err(|err| anyhow!("sqlite lock poisoned: {}", err))?;
            f(&conn)
        })
        .await
        .context("sqlite task failed")?
    }
}

#[async_trait]
impl BalanceStore for SqliteBalanceStore {
    async fn list_users(&self) -> Result<Vec<UserBalance>> {
        self.with_conn(|conn| {
            let mut stmt =
                conn.prepare_cached("SELECT id, stardust_coins, frozen FROM users ORDER BY id")?;
            let rows = stmt.query_map([], |row| {
                Ok(UserBalance {
                    id: UserId(row.get(0)?),
                    current_balance: row.get(1)?,
                    frozen: row.get(2)?,
                })
            })?;
            let mut users = Vec::new();
            for row in rows {
                users.push(row?);
            }
            Ok(users)
        })
        .await
    }

    async fn get_snapshot(&self, user_id: &UserId) -> Result<Option<BalanceSnapshot>> {
        let id = user_id.clone();
        self.with_conn(move |conn| {
            let row = conn
                .prepare_cached(
                    "SELECT last_balance, last_check_time FROM balance_snapshots
                     WHERE user_id = ?1",
                )?
                .query_row([&id.0], |row| Ok((row.get::<_, i64>(0)?, row.get::<_, i64>(1)?)))
                .optional()?;
            let Some((last_balance, last_check_ms)) = row else {
                return Ok(None);
            };
            let last_check_time = millis_to_utc(last_check_ms)
                .with_context(|| format!("snapshot for {}", id))?;
            Ok(Some(BalanceSnapshot {
                user_id: id,
                last_balance,
                last_check_time,
            }))
        })
        .await
    }

    async fn upsert_snapshot(
        &self,
        user_id: &UserId,
        balance: i64,
        at: DateTime<Utc>,
    ) -> Result<()> {
        let id = user_id.0.clone();
        let at_ms = at.timestamp_millis();
        self.with_conn(move |conn| {
            conn.execute(
                "INSERT INTO balance_snapshots (user_id, last_balance, last_check_time)
                 VALUES (?1, ?2, ?3)
                 ON CONFLICT(user_id) DO UPDATE SET
                     last_balance = excluded.last_balance,
                     last_check_time = excluded.last_check_time
                 WHERE excluded.last_check_time >= balance_snapshots.last_check_time",
                params![id, balance, at_ms],
            )?;
            Ok(())
        })
        .await
    }

    async fn append_alert(&self, alert: &NewAlert) -> Result<()> {
        let id = alert.user_id.0.clone();
        let rule = alert.rule.as_str();
        let details = alert.details.clone();
        let created_at = alert.created_at.timestamp_millis();
        self.with_conn(move |conn| {
            conn.execute(
                "INSERT INTO alerts (user_id, rule, details, created_at) VALUES (?1, ?2, ?3, ?4)",
                params![id, rule, details, created_at],
            )?;
            Ok(())
        })
        .await
    }

    async fn set_frozen(&self, user_id: &UserId) -> Result<bool> {
        let id = user_id.0.clone();
        self.with_conn(move |conn| {
            let changed = conn.execute(
                "UPDATE users SET frozen = 1 WHERE id = ?1 AND frozen = 0",
                [&id],
            )?;
            if changed > 0 {
                return Ok(true);
            }
            let exists: bool = conn.query_row(
                "SELECT EXISTS(SELECT 1 FROM users WHERE id = ?1)",
                [&id],
                |row| row.get(0),
            )?;
            if !exists {
                bail!("user {} not found", id);
            }
            Ok(false)
        })
        .await
    }

    async fn list_alerts(&self, filter: &AlertFilter) -> Result<Vec<AlertRecord>> {
        let user = filter.user_id.as_ref().map(|id| id.0.clone());
        let rule = filter.rule.map(|rule| rule.as_str());
        let limit = i64::try_from(filter.limit).unwrap_or(i64::MAX);
        self.with_conn(move |conn| {
            let mut stmt = conn.prepare_cached(
                "SELECT id, user_id, rule, details, created_at FROM alerts
                 WHERE (?1 IS NULL OR user_id = ?1) AND (?2 IS NULL OR rule = ?2)
                 ORDER BY id DESC
                 LIMIT ?3",
            )?;
            let rows = stmt.query_map(params![user, rule, limit], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, i64>(4)?,
                ))
            })?;
            let mut alerts = Vec::new();
            for row in rows {
                let (id, user_id, rule, details, created_at) = row?;
                alerts.push(AlertRecord {
                    id,
                    user_id: UserId(user_id),
                    rule: rule.parse::<AlertRule>()?,
                    details,
                    created_at: millis_to_utc(created_at)
                        .with_context(|| format!("alert {}", id))?,
                });
            }
            Ok(alerts)
        })
        .await
    }

    async fn ping(&self) -> Result<()> {
        self.with_conn(|conn| {
            let _: i64 = conn.query_row("SELECT 1", [], |row| row.get(0))?;
            Ok(())
        })
        .await
    }
}
