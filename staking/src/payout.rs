//! Reward and fine computation.
//!
//! Pure functions of `(amount, program, elapsed)`. All arithmetic is on raw
//! integer units with truncating division, so results match the deployed
//! ledger to the last unit.

use crate::error::StakingError;
use crate::program::{FineTier, StakeProgram};
use pledge_types::Amount;

/// Percent denominator used by both the reward and the fine formula.
pub const PERCENT_RATE: u128 = 100;

/// Days per year in the reward formula.
pub const DAYS_IN_YEAR: u128 = 365;

/// Combined divisor applied once, after all multiplications.
pub const REWARD_DIVISOR: u128 = PERCENT_RATE * DAYS_IN_YEAR;

/// How a payout was arrived at.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PayoutKind {
    /// The period elapsed; principal plus reward.
    Matured,
    /// Withdrawn before maturity. `tier` is `None` when the program has no
    /// fine schedule, in which case the principal is returned unfined.
    EarlyExit {
        tier: Option<usize>,
        fine_percent: u8,
    },
}

/// Result of the payout computation for one position.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Payout {
    /// The deposited amount.
    pub principal: Amount,
    /// What the staker receives.
    pub amount: Amount,
    pub kind: PayoutKind,
}

impl Payout {
    /// Shortfall against the principal on an early exit.
    pub fn fine(&self) -> Amount {
        self.principal.saturating_sub(self.amount)
    }

    /// Gain over the principal on a matured stake.
    pub fn reward(&self) -> Amount {
        self.amount.saturating_sub(self.principal)
    }

    pub fn is_matured(&self) -> bool {
        self.kind == PayoutKind::Matured
    }
}

/// Pick the fine tier for an early exit.
///
/// Starts from the last tier and walks down to tier 0, overwriting the
/// selection with every tier whose threshold is still ahead of `elapsed_secs`.
/// The survivor is the lowest-index tier with `elapsed < threshold`, or the
/// last tier when none qualifies. A forward walk with the same overwrite rule
/// would keep the highest qualifying index instead, so the direction matters
/// whenever thresholds are not increasing.
///
/// Returns `None` for an empty schedule.
pub fn select_fine_tier(tiers: &[FineTier], elapsed_secs: u64) -> Option<usize> {
    let mut selected = tiers.len().checked_sub(1)?;
    for i in (0..tiers.len()).rev() {
        if elapsed_secs < tiers[i].threshold_secs {
            selected = i;
        }
    }
    Some(selected)
}

/// `amount + amount × apy × period_days / 36500`.
fn matured_amount(amount: Amount, program: &StakeProgram) -> Result<Amount, StakingError> {
    let reward = amount
        .raw()
        .checked_mul(u128::from(program.apy))
        .and_then(|x| x.checked_mul(u128::from(program.period_days())))
        .ok_or(StakingError::Overflow)?
        / REWARD_DIVISOR;
    amount
        .checked_add(Amount::new(reward))
        .ok_or(StakingError::Overflow)
}

/// `amount × (100 − fine_percent) / 100`.
fn fined_amount(amount: Amount, fine_percent: u8) -> Result<Amount, StakingError> {
    let kept = PERCENT_RATE
        .checked_sub(u128::from(fine_percent))
        .ok_or(StakingError::InvalidFinePercent(fine_percent))?;
    let raw = amount
        .raw()
        .checked_mul(kept)
        .ok_or(StakingError::Overflow)?
        / PERCENT_RATE;
    Ok(Amount::new(raw))
}

/// Compute what a position of `amount` in `program` pays after `elapsed_secs`.
pub fn compute_payout(
    amount: Amount,
    program: &StakeProgram,
    elapsed_secs: u64,
) -> Result<Payout, StakingError> {
    if program.is_matured(elapsed_secs) {
        return Ok(Payout {
            principal: amount,
            amount: matured_amount(amount, program)?,
            kind: PayoutKind::Matured,
        });
    }

    let Some(tier) = select_fine_tier(&program.fine_tiers, elapsed_secs) else {
        return Ok(Payout {
            principal: amount,
            amount,
            kind: PayoutKind::EarlyExit {
                tier: None,
                fine_percent: 0,
            },
        });
    };
    let fine_percent = program.fine_tiers[tier].fine_percent;
    tracing::debug!(
        program = program.id,
        elapsed_secs,
        tier,
        fine_percent,
        "early exit fine tier selected"
    );
    Ok(Payout {
        principal: amount,
        amount: fined_amount(amount, fine_percent)?,
        kind: PayoutKind::EarlyExit {
            tier: Some(tier),
            fine_percent,
        },
    })
}
