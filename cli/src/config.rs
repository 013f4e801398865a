//! TOML configuration for the command line.

use anyhow::Context;
use pledge_staking::{default_programs, FineDestination, StakeProgram, StakingError};
use pledge_types::{Address, SECS_PER_DAY};
use pledge_utils::LogFormat;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// One program entry in the config file. Periods are given in days.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgramConfig {
    pub period_days: u64,
    pub apy: u32,
    #[serde(default = "default_active")]
    pub active: bool,
    #[serde(default)]
    pub fine_days: Vec<u64>,
    #[serde(default)]
    pub fine_percents: Vec<u8>,
}

fn default_active() -> bool {
    true
}

/// Command-line configuration. Every field has a default, so an empty file
/// is valid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    pub owner: Address,
    pub pool: Address,
    /// Where early-exit fines go; they stay in the pool when unset.
    pub fine_wallet: Option<Address>,
    pub log_format: LogFormat,
    pub log_level: String,
    /// Custom catalog; the stock programs are used when empty.
    pub programs: Vec<ProgramConfig>,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            owner: Address::new("owner"),
            pool: Address::new("pool"),
            fine_wallet: None,
            log_format: LogFormat::Human,
            log_level: "info".to_string(),
            programs: Vec::new(),
        }
    }
}

impl CliConfig {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        let config: Self = toml::from_str(&contents)
            .with_context(|| format!("failed to parse config file {}", path.display()))?;
        tracing::debug!(path = %path.display(), programs = config.programs.len(), "config loaded");
        Ok(config)
    }

    /// The catalog this config describes, with ids assigned by position.
    pub fn catalog(&self) -> Result<Vec<StakeProgram>, StakingError> {
        if self.programs.is_empty() {
            return Ok(default_programs());
        }
        self.programs
            .iter()
            .enumerate()
            .map(|(i, p)| {
                let id = u32::try_from(i).map_err(|_| StakingError::Overflow)?;
                let thresholds: Vec<u64> = p
                    .fine_days
                    .iter()
                    .map(|d| d.saturating_mul(SECS_PER_DAY))
                    .collect();
                let mut program = StakeProgram::with_fines(
                    id,
                    p.period_days.saturating_mul(SECS_PER_DAY),
                    p.apy,
                    &thresholds,
                    &p.fine_percents,
                )?;
                program.active = p.active;
                Ok(program)
            })
            .collect()
    }

    pub fn fine_destination(&self) -> FineDestination {
        FineDestination::from(self.fine_wallet.clone())
    }
}
