//! Nullable infrastructure for deterministic testing.
//!
//! Every external collaborator of the staking engine (clock, token ledger,
//! storage) sits behind a trait. This crate provides test-friendly
//! implementations that:
//! - Return deterministic values
//! - Can be controlled programmatically
//! - Never touch the filesystem or network
//!
//! Usage: swap real implementations for nullables in tests and simulations.

pub mod clock;
pub mod store;
pub mod token;

pub use clock::NullClock;
pub use store::NullStakingStore;
pub use token::NullTokenLedger;
