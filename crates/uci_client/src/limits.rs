//! Search limits passed along with every `go` command.

use std::time::Duration;

/// Budget the engine is given for a single move.
///
/// The move time is always sent; the depth is an additional cap that only
/// goes out when set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchLimits {
    /// Time allowed for this move
    pub move_time: Duration,
    /// Maximum search depth in plies (None = engine decides)
    pub depth: Option<u8>,
}

impl SearchLimits {
    /// Create limits with only a time constraint.
    pub fn time(move_time: Duration) -> Self {
        Self {
            move_time,
            depth: None,
        }
    }

    /// Create limits with both depth and time constraints.
    pub fn depth_and_time(depth: u8, move_time: Duration) -> Self {
        Self {
            move_time,
            depth: Some(depth),
        }
    }

    /// Move time in whole milliseconds, never zero.
    pub fn move_time_ms(&self) -> u64 {
        (self.move_time.as_millis() as u64).max(1)
    }
}

impl Default for SearchLimits {
    fn default() -> Self {
        Self::time(Duration::from_millis(100))
    }
}

#[cfg(test)]
#[path = "limits_tests.rs"]
mod limits_tests;
