use std::sync::Arc;

use anyhow::Context;
use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::entities::{NewAlert, SentinelPass, SentinelThresholds, UserBalance};
use crate::ports::BalanceStore;
use crate::utils::elapsed_seconds;
use crate::value_objects::{AlertRule, UserId};

/// Scans every balance against its last snapshot and freezes accounts that
/// grew too fast or past the absolute ceiling.
pub struct BalanceMonitor {
    store: Arc<dyn BalanceStore>,
    thresholds: SentinelThresholds,
}

impl BalanceMonitor {
    pub fn new(store: Arc<dyn BalanceStore>, thresholds: SentinelThresholds) -> Self {
        Self { store, thresholds }
    }

    pub fn thresholds(&self) -> SentinelThresholds {
        self.thresholds
    }

    /// One full pass using the host clock. Returns a line per freeze action.
    pub async fn analyze(&self) -> anyhow::Result<Vec<String>> {
        let pass = self.analyze_at(Utc::now()).await?;
        Ok(pass.reports)
    }

    pub async fn analyze_at(&self, now: DateTime<Utc>) -> anyhow::Result<SentinelPass> {
        let users = self.store.list_users().await.context("list users")?;
        let mut pass = SentinelPass::default();

        for user in &users {
            match self.inspect_user(user, now, &mut pass).await {
                Ok(()) => pass.users_scanned += 1,
                Err(err) => {
                    pass.users_failed += 1;
                    warn!(
                        user_id = %user.id,
                        error = %format!("{:#}", err),
                        "sentinel skipped user"
                    );
                }
            }
        }

        info!(
            users_scanned = pass.users_scanned,
            users_failed = pass.users_failed,
            alerts_raised = pass.alerts_raised,
            "sentinel pass finished"
        );
        Ok(pass)
    }

    async fn inspect_user(
        &self,
        user: &UserBalance,
        now: DateTime<Utc>,
        pass: &mut SentinelPass,
    ) -> anyhow::Result<()> {
        let balance = user.current_balance;
        let snapshot = self
            .store
            .get_snapshot(&user.id)
            .await
            .context("read snapshot")?;

        match &snapshot {
            Some(snapshot) => {
                let elapsed = elapsed_seconds(snapshot.last_check_time, now);
                if let Some(velocity) = gain_velocity(snapshot.last_balance, balance, elapsed) {
                    if velocity > self.thresholds.max_gain_per_minute {
                        let gain = balance.saturating_sub(snapshot.last_balance);
                        let details = format!(
                            "gained {} stardust in {:.0}s ({} per minute)",
                            gain,
                            elapsed,
                            velocity.round() as i64
                        );
                        let report = format!(
                            "froze user {}: high velocity {} stardust/min",
                            user.id,
                            velocity.round() as i64
                        );
                        self.raise(&user.id, AlertRule::HighVelocity, details, report, now, pass)
                            .await?;
                    }
                }
            }
            None => debug!(user_id = %user.id, "first observation, velocity check skipped"),
        }

        if balance > self.thresholds.max_balance {
            let details = format!(
                "balance {} exceeds ceiling {}",
                balance, self.thresholds.max_balance
            );
            let report = format!(
                "froze user {}: balance {} exceeds ceiling {}",
                user.id, balance, self.thresholds.max_balance
            );
            self.raise(&user.id, AlertRule::BalanceCeilingExceeded, details, report, now, pass)
                .await?;
        }

        self.store
            .upsert_snapshot(&user.id, balance, now)
            .await
            .context("write snapshot")?;
        Ok(())
    }

    async fn raise(
        &self,
        user_id: &UserId,
        rule: AlertRule,
        details: String,
        report: String,
        now: DateTime<Utc>,
        pass: &mut SentinelPass,
    ) -> anyhow::Result<()> {
        let alert = NewAlert {
            user_id: user_id.clone(),
            rule,
            details,
            created_at: now,
        };
        self.store
            .append_alert(&alert)
            .await
            .with_context(|| format!("append {} alert", rule))?;
        pass.alerts_raised += 1;

        if self.store.set_frozen(user_id).await.context("freeze user")? {
            warn!(user_id = %user_id, rule = %rule, details = %alert.details, "user frozen");
        }
        pass.reports.push(report);
        Ok(())
    }
}

/// Stardust gained per minute since the snapshot, or `None` when the
/// balance did not grow or no time has elapsed. The denominator is floored
/// at one minute.
pub fn gain_velocity(previous: i64, current: i64, elapsed_secs: f64) -> Option<f64> {
    if current <= previous || elapsed_secs <= 0.0 {
        return None;
    }
    let gain = current.saturating_sub(previous) as f64;
    let minutes = (elapsed_secs / 60.0).max(1.0);
    Some(gain / minutes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::{HashMap, HashSet};
    use std::sync::Mutex;

    use anyhow::anyhow;
    use async_trait::async_trait;
    use chrono::Duration;

    use crate::entities::{AlertFilter, AlertRecord, BalanceSnapshot};
    use crate::utils::millis_to_utc;

    #[derive(Default)]
    struct FakeStore {
        users: Mutex<Vec<UserBalance>>,
        snapshots: Mutex<HashMap<UserId, BalanceSnapshot>>,
        alerts: Mutex<Vec<NewAlert>>,
        frozen: Mutex<HashSet<UserId>>,
        broken: HashSet<UserId>,
    }

    impl FakeStore {
        fn with_users(users: &[(&str, i64)]) -> Self {
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

        fn seed_snapshot(&self, id: &str, balance: i64, at: DateTime<Utc>) {
            self.snapshots.lock().unwrap().insert(
                UserId::from(id),
                BalanceSnapshot {
                    user_id: UserId::from(id),
                    last_balance: balance,
                    last_check_time: at,
                },
            );
        }

        fn snapshot(&self, id: &str) -> Option<BalanceSnapshot> {
            self.snapshots.lock().unwrap().get(&UserId::from(id)).cloned()
        }

        fn alerts_for(&self, id: &str) -> Vec<NewAlert> {
            self.alerts
                .lock()
                .unwrap()
                .iter()
                .filter(|alert| alert.user_id.as_str() == id)
                .cloned()
                .collect()
        }

        fn is_frozen(&self, id: &str) -> bool {
            self.frozen.lock().unwrap().contains(&UserId::from(id))
        }
    }

    #[async_trait]
    impl BalanceStore for FakeStore {
        async fn list_users(&self) -> anyhow::Result<Vec<UserBalance>> {
            Ok(self.users.lock().unwrap().clone())
        }

        async fn get_snapshot(&self, user_id: &UserId) -> anyhow::Result<Option<BalanceSnapshot>> {
            if self.broken.contains(user_id) {
                return Err(anyhow!("connection reset"));
            }
            Ok(self.snapshots.lock().unwrap().get(user_id).cloned())
        }

        async fn upsert_snapshot(
            &self,
            user_id: &UserId,
            balance: i64,
            at: DateTime<Utc>,
        ) -> anyhow::Result<()> {
            let mut snapshots = self.snapshots.lock().unwrap();
            let entry = snapshots.entry(user_id.clone()).or_insert(BalanceSnapshot {
                user_id: user_id.clone(),
                last_balance: balance,
                last_check_time: at,
            });
            if at >= entry.last_check_time {
                entry.last_balance = balance;
                entry.last_check_time = at;
            }
            Ok(())
        }

        async fn append_alert(&self, alert: &NewAlert) -> anyhow::Result<()> {
            self.alerts.lock().unwrap().push(alert.clone());
            Ok(())
        }

        async fn set_frozen(&self, user_id: &UserId) -> anyhow::Result<bool> {
            Ok(self.frozen.lock().unwrap().insert(user_id.clone()))
        }

        async fn list_alerts(&self, _filter: &AlertFilter) -> anyhow::Result<Vec<AlertRecord>> {
            Ok(Vec::new())
        }

        async fn ping(&self) -> anyhow::Result<()> {
            Ok(())
        }
    }

    fn now() -> DateTime<Utc> {
        millis_to_utc(1_760_000_000_000).expect("in range")
    }

    fn monitor(store: &Arc<FakeStore>) -> BalanceMonitor {
        BalanceMonitor::new(store.clone(), SentinelThresholds::default())
    }

    #[tokio::test]
    async fn first_observation_never_flags_velocity_and_creates_snapshot() {
        let store = Arc::new(FakeStore::with_users(&[("nova", 900_000_000)]));
        let pass = monitor(&store).analyze_at(now()).await.expect("pass");

        assert!(pass.reports.is_empty());
        assert!(store.alerts_for("nova").is_empty());
        let snapshot = store.snapshot("nova").expect("snapshot created");
        assert_eq!(snapshot.last_balance, 900_000_000);
        assert_eq!(snapshot.last_check_time, now());
    }

    #[tokio::test]
    async fn zero_balance_snapshot_is_still_history() {
        let store = Arc::new(FakeStore::with_users(&[("nova", 50_000)]));
        store.seed_snapshot("nova", 0, now() - Duration::seconds(30));
        let pass = monitor(&store).analyze_at(now()).await.expect("pass");

        assert_eq!(pass.reports.len(), 1);
        assert_eq!(store.alerts_for("nova")[0].rule, AlertRule::HighVelocity);
    }

    #[tokio::test]
    async fn decrease_is_not_flagged_but_snapshot_moves_down() {
        let store = Arc::new(FakeStore::with_users(&[("orion", 10)]));
        store.seed_snapshot("orion", 5_000_000, now() - Duration::seconds(5));
        let pass = monitor(&store).analyze_at(now()).await.expect("pass");

        assert!(pass.reports.is_empty());
        assert_eq!(store.snapshot("orion").expect("snapshot").last_balance, 10);
        assert!(!store.is_frozen("orion"));
    }

    #[tokio::test]
    async fn gain_below_ceiling_within_first_minute_is_allowed() {
        let store = Arc::new(FakeStore::with_users(&[("vega", 6_000)]));
        store.seed_snapshot("vega", 1_000, now() - Duration::seconds(30));
        let pass = monitor(&store).analyze_at(now()).await.expect("pass");

        assert!(pass.reports.is_empty());
        assert!(store.alerts_for("vega").is_empty());
        let snapshot = store.snapshot("vega").expect("snapshot");
        assert_eq!(snapshot.last_balance, 6_000);
        assert_eq!(snapshot.last_check_time, now());
    }

    #[tokio::test]
    async fn fast_gain_raises_velocity_alert_and_freezes() {
        let store = Arc::new(FakeStore::with_users(&[("vega", 200_000)]));
        store.seed_snapshot("vega", 1_000, now() - Duration::seconds(30));
        let pass = monitor(&store).analyze_at(now()).await.expect("pass");

        assert_eq!(pass.reports.len(), 1);
        assert!(pass.reports[0].contains("vega"));
        assert!(pass.reports[0].contains("199000"));
        let alerts = store.alerts_for("vega");
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].rule, AlertRule::HighVelocity);
        assert!(alerts[0].details.contains("199000"));
        assert!(alerts[0].details.contains("30s"));
        assert!(store.is_frozen("vega"));
        assert_eq!(store.snapshot("vega").expect("snapshot").last_balance, 200_000);
    }

    #[tokio::test]
    async fn extreme_balances_saturate_instead_of_overflowing() {
        let store = Arc::new(FakeStore::with_users(&[("mira", i64::MAX)]));
        store.seed_snapshot("mira", i64::MIN, now() - Duration::seconds(60));
        let pass = monitor(&store).analyze_at(now()).await.expect("pass");

        assert_eq!(pass.users_scanned, 1);
        let rules: Vec<AlertRule> = store.alerts_for("mira").iter().map(|a| a.rule).collect();
        assert_eq!(rules, vec![AlertRule::HighVelocity, AlertRule::BalanceCeilingExceeded]);
        assert!(store.alerts_for("mira")[0]
            .details
            .contains(&i64::MAX.to_string()));
    }

    #[tokio::test]
    async fn same_tick_pass_never_flags_velocity() {
        let store = Arc::new(FakeStore::with_users(&[("sirius", 900_000)]));
        store.seed_snapshot("sirius", 0, now());
        let pass = monitor(&store).analyze_at(now()).await.expect("pass");

        assert!(pass.reports.is_empty());
        assert!(!store.is_frozen("sirius"));
    }

    #[tokio::test]
    async fn ceiling_fires_without_snapshot() {
        let store = Arc::new(FakeStore::with_users(&[("rigel", 2_000_000_000)]));
        let pass = monitor(&store).analyze_at(now()).await.expect("pass");

        let alerts = store.alerts_for("rigel");
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].rule, AlertRule::BalanceCeilingExceeded);
        assert!(alerts[0].details.contains("2000000000"));
        assert!(alerts[0].details.contains("1000000000"));
        assert!(store.is_frozen("rigel"));
        assert_eq!(pass.reports.len(), 1);
    }

    #[tokio::test]
    async fn one_above_ceiling_is_flagged() {
        let store = Arc::new(FakeStore::with_users(&[
            ("deneb", 1_000_000_001),
            ("altair", 1_000_000_000),
        ]));
        monitor(&store).analyze_at(now()).await.expect("pass");

        assert!(store.is_frozen("deneb"));
        assert!(!store.is_frozen("altair"));
    }

    #[tokio::test]
    async fn both_rules_yield_two_alerts_and_one_freeze() {
        let store = Arc::new(FakeStore::with_users(&[("polaris", 1_500_000_000)]));
        store.seed_snapshot("polaris", 100, now() - Duration::seconds(120));
        let pass = monitor(&store).analyze_at(now()).await.expect("pass");

        let rules: Vec<AlertRule> = store.alerts_for("polaris").iter().map(|a| a.rule).collect();
        assert_eq!(rules, vec![AlertRule::HighVelocity, AlertRule::BalanceCeilingExceeded]);
        assert_eq!(pass.reports.len(), 2);
        assert_eq!(pass.alerts_raised, 2);
        assert!(store.is_frozen("polaris"));
    }

    #[tokio::test]
    async fn frozen_user_above_ceiling_is_alerted_every_pass() {
        let store = Arc::new(FakeStore::with_users(&[("rigel", 2_000_000_000)]));
        let monitor = monitor(&store);
        monitor.analyze_at(now()).await.expect("first pass");
        monitor
            .analyze_at(now() + Duration::minutes(5))
            .await
            .expect("second pass");

        assert_eq!(store.alerts_for("rigel").len(), 2);
        assert!(store.is_frozen("rigel"));
    }

    #[tokio::test]
    async fn failing_user_is_skipped_without_aborting_pass() {
        let mut store = FakeStore::with_users(&[("broken", 5), ("rigel", 2_000_000_000)]);
        store.broken.insert(UserId::from("broken"));
        let store = Arc::new(store);
        let pass = monitor(&store).analyze_at(now()).await.expect("pass");

        assert_eq!(pass.users_failed, 1);
        assert_eq!(pass.users_scanned, 1);
        assert!(store.snapshot("broken").is_none());
        assert!(store.is_frozen("rigel"));
    }

    #[tokio::test]
    async fn analyze_returns_report_lines() {
        let store = Arc::new(FakeStore::with_users(&[("rigel", 2_000_000_000), ("vega", 3)]));
        let reports = monitor(&store).analyze().await.expect("pass");
        assert_eq!(reports.len(), 1);
        assert!(reports[0].starts_with("froze user rigel"));
    }

    #[test]
    fn velocity_matches_threshold_formula() {
        let ceiling = 10_000.0;
        let cases: [(i64, f64, bool); 6] = [
            (5_000, 30.0, false),
            (10_000, 30.0, false),
            (10_001, 30.0, true),
            (20_000, 120.0, false),
            (20_002, 120.0, true),
            (600_000, 3_600.0, false),
        ];
        for (gain, elapsed, expected) in cases {
            let velocity = gain_velocity(100, 100 + gain, elapsed).expect("growth");
            assert_eq!(velocity > ceiling, expected, "gain={gain} elapsed={elapsed}");
        }
        assert_eq!(gain_velocity(100, 100, 30.0), None);
        assert_eq!(gain_velocity(100, 200, 0.0), None);
        assert_eq!(gain_velocity(i64::MIN, i64::MAX, 60.0), Some(i64::MAX as f64));
    }
}
