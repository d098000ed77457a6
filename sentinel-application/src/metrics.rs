use std::sync::atomic::{AtomicU64, Ordering};

use sentinel_domain::SentinelPass;

#[derive(Debug, Default)]
pub struct Metrics {
    passes: AtomicU64,
    pass_failures: AtomicU64,
    users_scanned: AtomicU64,
    user_failures: AtomicU64,
    alerts: AtomicU64,
}

impl Metrics {
    pub fn record_pass(&self, pass: &SentinelPass) {
        self.passes.fetch_add(1, Ordering::Relaxed);
        self.users_scanned
            .fetch_add(u64::from(pass.users_scanned), Ordering::Relaxed);
        self.user_failures
            .fetch_add(u64::from(pass.users_failed), Ordering::Relaxed);
        self.alerts
            .fetch_add(u64::from(pass.alerts_raised), Ordering::Relaxed);
    }

    pub fn record_pass_failure(&self) {
        self.pass_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn render_prometheus(&self) -> String {
        let passes = self.passes.load(Ordering::Relaxed);
        let pass_failures = self.pass_failures.load(Ordering::Relaxed);
        let users_scanned = self.users_scanned.load(Ordering::Relaxed);
        let user_failures = self.user_failures.load(Ordering::Relaxed);
        let alerts = self.alerts.load(Ordering::Relaxed);

        format!(
            "# TYPE sentinel_passes_total counter\n\
sentinel_passes_total {}\n\
# TYPE sentinel_pass_failures_total counter\n\
sentinel_pass_failures_total {}\n\
# TYPE sentinel_users_scanned_total counter\n\
sentinel_users_scanned_total {}\n\
# TYPE sentinel_user_failures_total counter\n\
sentinel_user_failures_total {}\n\
# TYPE sentinel_alerts_total counter\n\
sentinel_alerts_total {}\n",
            passes, pass_failures, users_scanned, user_failures, alerts
        )
    }
}
