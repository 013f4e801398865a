//! Stake positions and per-staker aggregates.

use crate::program::ProgramId;
use pledge_types::{Address, Amount, Timestamp};
use serde::{Deserialize, Serialize};

/// Ordinal of a position within its staker's sequence, starting at 0.
pub type PositionIndex = u32;

/// A single deposit into a stake program.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StakePosition {
    pub owner: Address,
    pub index: PositionIndex,
    /// Deposited amount.
    pub amount: Amount,
    /// What was paid out on close; zero while open.
    pub amount_after: Amount,
    pub program_id: ProgramId,
    pub start_time: Timestamp,
    /// When the position was closed; the epoch while open.
    pub finished_time: Timestamp,
    pub closed: bool,
}

impl StakePosition {
    pub fn open(
        owner: Address,
        index: PositionIndex,
        program_id: ProgramId,
        amount: Amount,
        start_time: Timestamp,
    ) -> Self {
        Self {
            owner,
            index,
            amount,
            amount_after: Amount::ZERO,
            program_id,
            start_time,
            finished_time: Timestamp::EPOCH,
            closed: false,
        }
    }

    /// Seconds this position has been staked as of `now`.
    pub fn elapsed_secs(&self, now: Timestamp) -> u64 {
        self.start_time.elapsed_since(now)
    }
}

/// Running totals for one staker.
///
/// `total_deposited` is the sum of `amount` over all positions and
/// `total_after` the sum of `amount_after` over closed ones.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StakerAccount {
    pub address: Address,
    /// Set by the first deposit.
    pub exists: bool,
    pub position_count: u32,
    pub total_deposited: Amount,
    pub total_after: Amount,
}

impl StakerAccount {
    /// The zeroed account every address has before its first deposit.
    pub fn empty(address: Address) -> Self {
        Self {
            address,
            exists: false,
            position_count: 0,
            total_deposited: Amount::ZERO,
            total_after: Amount::ZERO,
        }
    }
}
