//! Value transfer seam.
//!
//! The engine never holds balances itself. Every token movement goes through a
//! [`ValueTransfer`] implementation that owns the pool account on the
//! underlying token ledger. Each call is all-or-nothing: on error nothing has
//! moved.

use pledge_types::{Address, Amount};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TransferError {
    #[error("transfer amount exceeds allowance: need {needed}, allowed {allowed}")]
    InsufficientAllowance { needed: u128, allowed: u128 },

    #[error("transfer amount exceeds balance: need {needed}, available {available}")]
    InsufficientFunds { needed: u128, available: u128 },

    #[error("token ledger error: {0}")]
    Backend(String),
}

/// Capability to move tokens in and out of the staking pool.
pub trait ValueTransfer {
    /// Pull `amount` from `from` into the pool, spending the allowance `from`
    /// granted to the pool.
    fn debit(&mut self, from: &Address, amount: Amount) -> Result<(), TransferError>;

    /// Pay `amount` out of the pool to `to`.
    fn credit(&mut self, to: &Address, amount: Amount) -> Result<(), TransferError>;

    /// Pay several recipients out of the pool as one operation. Either every
    /// payment is made or, on error, none is.
    fn credit_all(&mut self, payments: &[(Address, Amount)]) -> Result<(), TransferError>;

    /// Current pool balance.
    fn reserve_balance(&self) -> Amount;
}

/// Where the shortfall of an early withdrawal goes.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum FineDestination {
    /// The fine stays in the pool.
    #[default]
    Pool,
    /// The fine is forwarded to this wallet.
    Wallet(Address),
}

impl FineDestination {
    pub fn wallet(&self) -> Option<&Address> {
        match self {
            Self::Pool => None,
            Self::Wallet(address) => Some(address),
        }
    }
}

impl From<Option<Address>> for FineDestination {
    fn from(wallet: Option<Address>) -> Self {
        wallet.map_or(Self::Pool, Self::Wallet)
    }
}
