//! Audit records emitted by successful state-changing calls.

use crate::position::PositionIndex;
use crate::program::ProgramId;
use pledge_types::{Address, Amount};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum StakingEvent {
    /// A position was opened.
    Deposit {
        staker: Address,
        amount: Amount,
        program_id: ProgramId,
        index: PositionIndex,
    },
    /// A position was closed and paid out (to the staker or an admin target).
    Withdraw {
        staker: Address,
        payout: Amount,
        program_id: ProgramId,
        index: PositionIndex,
    },
}

impl StakingEvent {
    pub fn staker(&self) -> &Address {
        match self {
            Self::Deposit { staker, .. } | Self::Withdraw { staker, .. } => staker,
        }
    }

    pub fn index(&self) -> PositionIndex {
        match self {
            Self::Deposit { index, .. } | Self::Withdraw { index, .. } => *index,
        }
    }
}
