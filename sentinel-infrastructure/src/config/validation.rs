use anyhow::{anyhow, Result};

use sentinel_domain::SentinelThresholds;

pub fn validate_thresholds(thresholds: &SentinelThresholds) -> Result<()> {
    if !thresholds.max_gain_per_minute.is_finite() || thresholds.max_gain_per_minute <= 0.0 {
        return Err(anyhow!("max_gain_per_minute must be greater than 0"));
    }
    if thresholds.max_balance <= 0 {
        return Err(anyhow!("max_balance must be greater than 0"));
    }
    Ok(())
}
