use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

/// Core tunables. Everything has a default so the library works without a
/// config file; embedders can load a TOML to override.
#[derive(Debug, Deserialize, Clone)]
pub struct CoreConfig {
    /// Minimum stake in minor units ($5.00).
    #[serde(default = "default_min_stake")]
    pub min_stake_cents: i64,
    /// Fresh bankroll baseline applied at each weekly reset ($1,000.00).
    #[serde(default = "default_weekly_deposit")]
    pub weekly_deposit_cents: i64,
    /// Bonus credited per successful referral, folded into the next reset.
    #[serde(default = "default_referral_bonus")]
    pub referral_bonus_cents: i64,
    /// How many transaction-log entries each bankroll retains.
    #[serde(default = "default_ledger_capacity")]
    pub ledger_log_capacity: usize,
}

fn default_min_stake() -> i64 {
    500
}
fn default_weekly_deposit() -> i64 {
    100_000
}
fn default_referral_bonus() -> i64 {
    10_000
}
fn default_ledger_capacity() -> usize {
    50
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            min_stake_cents: default_min_stake(),
            weekly_deposit_cents: default_weekly_deposit(),
            referral_bonus_cents: default_referral_bonus(),
            ledger_log_capacity: default_ledger_capacity(),
        }
    }
}

impl CoreConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: CoreConfig =
            toml::from_str(&content).with_context(|| "Failed to parse config TOML")?;
        Ok(config)
    }
}
