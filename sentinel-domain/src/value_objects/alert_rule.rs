// Alert rule value object

use std::fmt;
use std::str::FromStr;

use anyhow::anyhow;
use serde::{Deserialize, Serialize};

/// Rule tag attached to every alert row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlertRule {
    HighVelocity,
    BalanceCeilingExceeded,
}

impl AlertRule {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertRule::HighVelocity => "HIGH_VELOCITY",
            AlertRule::BalanceCeilingExceeded => "BALANCE_CEILING_EXCEEDED",
        }
    }
}

impl fmt::Display for AlertRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AlertRule {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "HIGH_VELOCITY" => Ok(AlertRule::HighVelocity),
            "BALANCE_CEILING_EXCEEDED" => Ok(AlertRule::BalanceCeilingExceeded),
            other => Err(anyhow!("unknown alert rule '{}'", other)),
        }
    }
}
