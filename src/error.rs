//! Operator input errors.
//!
//! Every error here is a user-input error: it is reported on the console and
//! control returns to the menu. None of them is fatal and none of them leaves
//! a partially applied configuration behind.

use core::fmt;

/// Why a line typed at the console was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum InputError {
    /// Malformed numeric or date input
    Parse,
    /// Well-formed value outside its allowed range
    Range,
    /// Unrecognized menu selection
    InvalidCommand,
}

impl fmt::Display for InputError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InputError::Parse => f.write_str("malformed input"),
            InputError::Range => f.write_str("value out of range"),
            InputError::InvalidCommand => f.write_str("unknown command"),
        }
    }
}
