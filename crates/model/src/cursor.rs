use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Incremental progress of one partition's sync.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CursorPosition {
    /// No successful slice recorded yet.
    #[default]
    None,

    /// Every window ending on or before this date has been merged and
    /// emitted.
    SyncedThrough(NaiveDate),
}

impl CursorPosition {
    pub fn synced_through(&self) -> Option<NaiveDate> {
        match self {
            CursorPosition::None => None,
            CursorPosition::SyncedThrough(date) => Some(*date),
        }
    }

    /// Moves the position forward, never backward. Slices can complete for
    /// re-read windows without losing progress.
    pub fn advance_to(&mut self, date: NaiveDate) {
        match self {
            CursorPosition::None => *self = CursorPosition::SyncedThrough(date),
            CursorPosition::SyncedThrough(current) => {
                if date > *current {
                    *self = CursorPosition::SyncedThrough(date);
                }
            }
        }
    }
}
