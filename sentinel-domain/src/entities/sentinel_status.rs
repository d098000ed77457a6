// Sentinel pass outcome and status entities

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Result of one full monitor pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SentinelPass {
    pub reports: Vec<String>,
    pub users_scanned: u32,
    pub users_failed: u32,
    pub alerts_raised: u32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SentinelStatus {
    pub running: bool,
    pub last_started_at: Option<DateTime<Utc>>,
    pub last_finished_at: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
    pub users_scanned: u32,
    pub users_failed: u32,
    pub alerts_raised: u32,
    pub reports: Vec<String>,
}

impl SentinelStatus {
    pub fn start(&mut self, now: DateTime<Utc>) {
        self.running = true;
        self.last_started_at = Some(now);
    }

    pub fn finish(&mut self, now: DateTime<Utc>, pass: &SentinelPass) {
        self.running = false;
        self.last_finished_at = Some(now);
        self.last_error = None;
        self.users_scanned = pass.users_scanned;
        self.users_failed = pass.users_failed;
        self.alerts_raised = pass.alerts_raised;
        self.reports = pass.reports.clone();
    }

    pub fn fail(&mut self, now: DateTime<Utc>, error: String) {
        self.running = false;
        self.last_finished_at = Some(now);
        self.last_error = Some(error);
    }
}
