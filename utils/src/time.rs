//! Time formatting helpers.

use pledge_types::SECS_PER_DAY;

/// Format a duration in seconds to a human-readable string.
pub fn format_duration(secs: u64) -> String {
    if secs < 60 {
        format!("{}s", secs)
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else if secs < SECS_PER_DAY {
        format!("{}h {}m", secs / 3600, (secs % 3600) / 60)
    } else if secs % SECS_PER_DAY == 0 {
        format!("{}d", secs / SECS_PER_DAY)
    } else {
        format!("{}d {}h", secs / SECS_PER_DAY, (secs % SECS_PER_DAY) / 3600)
    }
}
