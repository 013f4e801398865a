//! Shared utilities for the pledge staking tools.

pub mod format;
pub mod logging;
pub mod time;

pub use format::format_token_amount;
pub use logging::{init_logging, LogFormat, LoggingError};
pub use time::format_duration;
