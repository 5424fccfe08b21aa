//! Small formatting and identity helpers shared by the desk views.

use std::fmt;

use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};

/// Stable short id: `"{prefix}_{first 8 hex chars of SHA-256(content)}"`.
///
/// Same content always yields the same id, so re-importing a sheet does not
/// renumber its rows.
pub fn generate_id(prefix: &str, content: &str) -> String {
    let digest = Sha256::digest(content.as_bytes());
    format!("{}_{}", prefix, &hex::encode(digest)[..8])
}

/// `YYYY-MM-DD HH:MM`.
pub fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.format("%Y-%m-%d %H:%M").to_string()
}

/// Coarse time left until a deadline, for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeRemaining {
    Overdue,
    Minutes(i64),
    Hours(i64),
    Days(i64),
}

impl fmt::Display for TimeRemaining {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Overdue => f.write_str("Overdue"),
            Self::Minutes(n) => write!(f, "{n} minutes"),
            Self::Hours(n) => write!(f, "{n} hours"),
            Self::Days(n) => write!(f, "{n} days"),
        }
    }
}

/// Bucket the gap between `now` and `deadline`, truncating toward zero.
pub fn time_remaining(deadline: DateTime<Utc>, now: DateTime<Utc>) -> TimeRemaining {
    let secs = (deadline - now).num_seconds();
    if secs < 0 {
        TimeRemaining::Overdue
    } else if secs < 3_600 {
        TimeRemaining::Minutes(secs / 60)
    } else if secs < 86_400 {
        TimeRemaining::Hours(secs / 3_600)
    } else {
        TimeRemaining::Days(secs / 86_400)
    }
}
