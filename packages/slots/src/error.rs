//! Error types.

use std::fmt::{self, Formatter, Display};


/// Failure to look up an entry by index or key.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum SlotError {
    /// Index at or beyond the live length.
    OutOfBounds {
        index: usize,
        len: usize,
    },
    /// Slot exists but has been soft-deleted.
    Inactive {
        index: usize,
    },
    /// Slot has been recycled since the key was issued.
    Stale {
        index: usize,
        expected: u32,
        found: u32,
    },
}

impl SlotError {
    /// Index the failed lookup was made with.
    pub fn index(&self) -> usize {
        match *self {
            SlotError::OutOfBounds { index, .. } => index,
            SlotError::Inactive { index } => index,
            SlotError::Stale { index, .. } => index,
        }
    }
}

impl Display for SlotError {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match *self {
            SlotError::OutOfBounds { index, len } => write!(
                f, "index {} out of bounds (len {})", index, len,
            ),
            SlotError::Inactive { index } => write!(
                f, "slot {} is inactive", index,
            ),
            SlotError::Stale { index, expected, found } => write!(
                f, "stale key for slot {} (generation {}, slot is at {})",
                index, expected, found,
            ),
        }
    }
}

impl std::error::Error for SlotError {}
