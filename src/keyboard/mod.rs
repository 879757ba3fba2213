//! Keyboard module: Spectrum key wiring, matrix state and host keymap.
//!
//! This module contains:
//! - [`LogicalKey`]: The 40 physical Spectrum keys and their matrix cells
//! - [`KeyMatrix`]: The lock-protected, active-low key-state rows
//! - [`SymbolTable`]: Host key names mapped to [`KeySequence`] chords
//! - [`self_check`]: The start-up coverage check over both tables

mod keys;
mod matrix;
mod symbols;

pub use keys::{KeyCell, LogicalKey, KEY_TABLE};
pub use matrix::{KeyMatrix, ROWS, ROW_RELEASED};
pub use symbols::{self_check, KeySequence, SymbolTable};
