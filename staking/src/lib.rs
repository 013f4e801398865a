//! Staking rewards ledger engine.
//!
//! Stakers deposit into time-bound programs; every deposit becomes a position.
//! On withdrawal the position pays out either
//! `amount + amount × apy × period_days / 36500` once the program period has
//! elapsed, or `amount × (100 − fine%) / 100` for the fine tier selected by
//! the elapsed time.
//!
//! This crate handles:
//! - The program catalog and its fine schedules
//! - Payout computation (reward after maturity, tiered fine before)
//! - The per-staker position ledger and its running totals
//! - Ordinary, administrative and sweeping withdrawals against the pool reserve
//! - Owner gating, pausing and the one-time configuration lock
//!
//! Token movement is delegated to a [`ValueTransfer`] implementation injected
//! into [`StakingEngine`].

pub mod catalog;
pub mod engine;
pub mod error;
pub mod events;
pub mod guard;
pub mod ledger;
pub mod payout;
pub mod position;
pub mod program;
pub mod store;
pub mod transfer;

pub use catalog::ProgramCatalog;
pub use engine::StakingEngine;
pub use error::StakingError;
pub use events::StakingEvent;
pub use guard::AdminGuard;
pub use ledger::StakerLedger;
pub use payout::{compute_payout, select_fine_tier, Payout, PayoutKind};
pub use position::{PositionIndex, StakePosition, StakerAccount};
pub use program::{default_programs, FineTier, ProgramId, StakeProgram};
pub use store::{StakingStore, StoreError};
pub use transfer::{FineDestination, TransferError, ValueTransfer};
