//! Staking engine errors.

use crate::position::PositionIndex;
use crate::program::ProgramId;
use crate::store::StoreError;
use crate::transfer::TransferError;
use pledge_types::Address;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StakingError {
    #[error("caller {0} is not the owner")]
    NotOwner(Address),

    #[error("staking engine is already configured")]
    AlreadyConfigured,

    #[error("fine schedule mismatch: {thresholds} thresholds, {percents} percents")]
    FineScheduleMismatch { thresholds: usize, percents: usize },

    #[error("fine percent {0} exceeds 100")]
    InvalidFinePercent(u8),

    #[error("stake program {0} not found")]
    ProgramNotFound(ProgramId),

    #[error("stake program {0} is not active")]
    ProgramInactive(ProgramId),

    #[error("staking is paused")]
    ProgramPaused,

    #[error("position {index} of {staker} not found")]
    PositionNotFound { staker: Address, index: PositionIndex },

    #[error("position {index} of {staker} is already closed")]
    AlreadyClosed { staker: Address, index: PositionIndex },

    #[error("fine tier {index} out of range for program {program} ({count} tiers)")]
    IndexOutOfRange {
        program: ProgramId,
        index: usize,
        count: usize,
    },

    #[error("pool reserve too low: need {needed}, available {available}; owner must top up")]
    InsufficientReserve { needed: u128, available: u128 },

    #[error(transparent)]
    Transfer(#[from] TransferError),

    #[error("storage error: {0}")]
    Store(#[from] StoreError),

    #[error("amount must be non-zero")]
    ZeroAmount,

    #[error("arithmetic overflow in staking computation")]
    Overflow,

    #[error("{0}")]
    Other(String),
}
