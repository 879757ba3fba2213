//! `KeyMatrix`: the 8x8 active-low key-state bitmap.
//!
//! A cleared bit means the key is held. Reads come from the core's port
//! path and vastly outnumber writes, so the rows sit behind a reader/writer
//! lock and every write is a single short hold.

use std::sync::{PoisonError, RwLock};

use super::keys::LogicalKey;

/// All keys released.
pub const ROW_RELEASED: u8 = 0xFF;

/// Number of half-rows in the matrix.
pub const ROWS: usize = 8;

/// Shared key-state matrix.
#[derive(Debug)]
pub struct KeyMatrix {
    rows: RwLock<[u8; ROWS]>,
}

impl Default for KeyMatrix {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyMatrix {
    /// Create a matrix with every key released.
    pub const fn new() -> Self {
        Self {
            rows: RwLock::new([ROW_RELEASED; ROWS]),
        }
    }

    /// Read one row. Rows outside 0-7 read as fully released.
    #[inline]
    pub fn row(&self, row: usize) -> u8 {
        let rows = self.rows.read().unwrap_or_else(PoisonError::into_inner);
        rows.get(row).copied().unwrap_or(ROW_RELEASED)
    }

    /// Overwrite one row. Rows outside 0-7 are ignored.
    pub fn set_row(&self, row: usize, state: u8) {
        let mut rows = self.rows.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(slot) = rows.get_mut(row) {
            *slot = state;
        }
    }

    /// Copy of all eight rows.
    pub fn snapshot(&self) -> [u8; ROWS] {
        *self.rows.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Release every key.
    pub fn reset(&self) {
        *self.rows.write().unwrap_or_else(PoisonError::into_inner) = [ROW_RELEASED; ROWS];
    }

    /// Clear the bit for `key`.
    pub fn key_down(&self, key: LogicalKey) {
        if let Some(cell) = key.cell() {
            let mut rows = self.rows.write().unwrap_or_else(PoisonError::into_inner);
            rows[cell.row] &= !cell.mask;
        }
    }

    /// Set the bit for `key`.
    pub fn key_up(&self, key: LogicalKey) {
        if let Some(cell) = key.cell() {
            let mut rows = self.rows.write().unwrap_or_else(PoisonError::into_inner);
            rows[cell.row] |= cell.mask;
        }
    }

    /// Whether `key` is currently held.
    pub fn is_pressed(&self, key: LogicalKey) -> bool {
        key.cell()
            .is_some_and(|cell| self.row(cell.row) & cell.mask == 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_matrix_is_released() {
        let matrix = KeyMatrix::new();
        assert_eq!(matrix.snapshot(), [ROW_RELEASED; ROWS]);
    }

    #[test]
    fn test_down_up_restores_every_key() {
        let matrix = KeyMatrix::new();
        for key in LogicalKey::all() {
            let before = matrix.snapshot();
            matrix.key_down(key);
            let during = matrix.snapshot();
            let flipped: u32 = before
                .iter()
                .zip(during.iter())
                .map(|(a, b)| (a ^ b).count_ones())
                .sum();
            assert_eq!(flipped, 1, "{key:?} must flip exactly one bit");
            assert!(matrix.is_pressed(key));

            matrix.key_up(key);
            assert_eq!(matrix.snapshot(), before, "{key:?}");
        }
    }

    #[test]
    fn test_down_up_preserves_other_held_keys() {
        let matrix = KeyMatrix::new();
        matrix.key_down(LogicalKey::CapsShift);
        let before = matrix.snapshot();

        matrix.key_down(LogicalKey::Z);
        matrix.key_up(LogicalKey::Z);

        assert_eq!(matrix.snapshot(), before);
        assert!(matrix.is_pressed(LogicalKey::CapsShift));
    }

    #[test]
    fn test_raw_row_access() {
        let matrix = KeyMatrix::new();
        matrix.set_row(3, 0xFE);
        assert_eq!(matrix.row(3), 0xFE);
        assert!(matrix.is_pressed(LogicalKey::Num1));

        matrix.set_row(9, 0x00);
        assert_eq!(matrix.row(9), ROW_RELEASED);

        matrix.reset();
        assert_eq!(matrix.row(3), ROW_RELEASED);
    }
}
