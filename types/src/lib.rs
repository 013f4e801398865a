//! Fundamental types for the Pledge staking ledger.
//!
//! This crate defines the core types shared across every other crate in the workspace:
//! account addresses, token amounts, timestamps and the clock seam.

pub mod address;
pub mod amount;
pub mod error;
pub mod time;

pub use address::Address;
pub use amount::Amount;
pub use error::TypesError;
pub use time::{Clock, SystemClock, Timestamp, SECS_PER_DAY};
