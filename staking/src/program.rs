//! Stake programs and their early-exit fine schedules.

use crate::error::StakingError;
use pledge_types::SECS_PER_DAY;
use serde::{Deserialize, Serialize};

/// Identifier of a program: its position in the catalog.
pub type ProgramId = u32;

/// One step of an early-exit fine schedule.
///
/// A withdrawal whose elapsed time is below `threshold_secs` may be charged
/// `fine_percent` of the deposit; see [`crate::payout::select_fine_tier`] for
/// which tier applies.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FineTier {
    pub threshold_secs: u64,
    pub fine_percent: u8,
}

/// A configured staking program.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StakeProgram {
    pub id: ProgramId,
    /// Inactive programs reject new deposits; open positions still withdraw.
    pub active: bool,
    /// Lock period. Withdrawals strictly after it earn the reward.
    pub period_secs: u64,
    /// Annual yield in whole percent points, scaled by the 36500 divisor.
    pub apy: u32,
    /// Fine schedule, kept in the order it was supplied.
    pub fine_tiers: Vec<FineTier>,
}

impl StakeProgram {
    /// An active program with an empty fine schedule.
    pub fn new(id: ProgramId, period_secs: u64, apy: u32) -> Self {
        Self {
            id,
            active: true,
            period_secs,
            apy,
            fine_tiers: Vec::new(),
        }
    }

    /// An active program with the fine schedule built from parallel slices.
    pub fn with_fines(
        id: ProgramId,
        period_secs: u64,
        apy: u32,
        thresholds: &[u64],
        fine_percents: &[u8],
    ) -> Result<Self, StakingError> {
        Ok(Self {
            fine_tiers: build_fine_tiers(thresholds, fine_percents)?,
            ..Self::new(id, period_secs, apy)
        })
    }

    /// Whole days in the lock period; this is what the reward formula uses.
    pub fn period_days(&self) -> u64 {
        self.period_secs / SECS_PER_DAY
    }

    /// A stake has matured once strictly more than the period has elapsed.
    pub fn is_matured(&self, elapsed_secs: u64) -> bool {
        elapsed_secs > self.period_secs
    }

    pub fn tier_count(&self) -> usize {
        self.fine_tiers.len()
    }

    /// Look up one tier of the fine schedule.
    pub fn fine_tier(&self, index: usize) -> Result<&FineTier, StakingError> {
        self.fine_tiers
            .get(index)
            .ok_or(StakingError::IndexOutOfRange {
                program: self.id,
                index,
                count: self.fine_tiers.len(),
            })
    }
}

/// Zip parallel threshold/percent slices into a fine schedule.
///
/// Thresholds need not be increasing and percents need not be monotonic;
/// only the slice lengths and the 100% ceiling are enforced.
pub fn build_fine_tiers(
    thresholds: &[u64],
    fine_percents: &[u8],
) -> Result<Vec<FineTier>, StakingError> {
    if thresholds.len() != fine_percents.len() {
        return Err(StakingError::FineScheduleMismatch {
            thresholds: thresholds.len(),
            percents: fine_percents.len(),
        });
    }
    thresholds
        .iter()
        .zip(fine_percents)
        .map(|(&threshold_secs, &fine_percent)| {
            if fine_percent > 100 {
                return Err(StakingError::InvalidFinePercent(fine_percent));
            }
            Ok(FineTier {
                threshold_secs,
                fine_percent,
            })
        })
        .collect()
}

fn days(n: u64) -> u64 {
    n * SECS_PER_DAY
}

/// The stock catalog installed by a default configuration.
///
/// | id | period | apy | fines (day → %)             |
/// |----|--------|-----|-----------------------------|
/// | 0  | 30d    | 24  | 30 → 100                    |
/// | 1  | 90d    | 30  | 30 → 100, 60 → 50, 90 → 20  |
/// | 2  | 180d   | 36  | 60 → 70, 120 → 30, 180 → 20 |
pub fn default_programs() -> Vec<StakeProgram> {
    vec![
        StakeProgram {
            fine_tiers: vec![FineTier {
                threshold_secs: days(30),
                fine_percent: 100,
            }],
            ..StakeProgram::new(0, days(30), 24)
        },
        StakeProgram {
            fine_tiers: vec![
                FineTier {
                    threshold_secs: days(30),
                    fine_percent: 100,
                },
                FineTier {
                    threshold_secs: days(60),
                    fine_percent: 50,
                },
                FineTier {
                    threshold_secs: days(90),
                    fine_percent: 20,
                },
            ],
            ..StakeProgram::new(1, days(90), 30)
        },
        StakeProgram {
            fine_tiers: vec![
                FineTier {
                    threshold_secs: days(60),
                    fine_percent: 70,
                },
                FineTier {
                    threshold_secs: days(120),
                    fine_percent: 30,
                },
                FineTier {
                    threshold_secs: days(180),
                    fine_percent: 20,
                },
            ],
            ..StakeProgram::new(2, days(180), 36)
        },
    ]
}
