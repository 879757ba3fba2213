//! Logical keys: the 40 physical keys of the Spectrum keyboard.
//!
//! Each key sits on one half-row of the matrix and owns one bit of
//! that row. The table below is the wiring used by the ULA port read:
//!
//! ```text
//! row 0: CAPS SHIFT  Z  X  C  V      row 4: 0  9  8  7  6
//! row 1: A           S  D  F  G      row 5: P  O  I  U  Y
//! row 2: Q           W  E  R  T      row 6: ENTER L K J H
//! row 3: 1           2  3  4  5      row 7: SPACE SYM M N B
//! ```

/// A physical Spectrum key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[allow(missing_docs)]
pub enum LogicalKey {
    Num1,
    Num2,
    Num3,
    Num4,
    Num5,
    Num6,
    Num7,
    Num8,
    Num9,
    Num0,

    Q,
    W,
    E,
    R,
    T,
    Y,
    U,
    I,
    O,
    P,

    A,
    S,
    D,
    F,
    G,
    H,
    J,
    K,
    L,
    Enter,

    CapsShift,
    Z,
    X,
    C,
    V,
    B,
    N,
    M,
    SymbolShift,
    Space,
}

/// Position of a key in the matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyCell {
    /// Matrix row (0-7).
    pub row: usize,
    /// Single-bit mask within the row.
    pub mask: u8,
}

impl KeyCell {
    const fn new(row: usize, mask: u8) -> Self {
        Self { row, mask }
    }
}

/// Wiring of every logical key.
pub const KEY_TABLE: [(LogicalKey, KeyCell); 40] = {
    use LogicalKey as L;
    [
        (L::Num1, KeyCell::new(3, 0x01)),
        (L::Num2, KeyCell::new(3, 0x02)),
        (L::Num3, KeyCell::new(3, 0x04)),
        (L::Num4, KeyCell::new(3, 0x08)),
        (L::Num5, KeyCell::new(3, 0x10)),
        (L::Num6, KeyCell::new(4, 0x10)),
        (L::Num7, KeyCell::new(4, 0x08)),
        (L::Num8, KeyCell::new(4, 0x04)),
        (L::Num9, KeyCell::new(4, 0x02)),
        (L::Num0, KeyCell::new(4, 0x01)),
        (L::Q, KeyCell::new(2, 0x01)),
        (L::W, KeyCell::new(2, 0x02)),
        (L::E, KeyCell::new(2, 0x04)),
        (L::R, KeyCell::new(2, 0x08)),
        (L::T, KeyCell::new(2, 0x10)),
        (L::Y, KeyCell::new(5, 0x10)),
        (L::U, KeyCell::new(5, 0x08)),
        (L::I, KeyCell::new(5, 0x04)),
        (L::O, KeyCell::new(5, 0x02)),
        (L::P, KeyCell::new(5, 0x01)),
        (L::A, KeyCell::new(1, 0x01)),
        (L::S, KeyCell::new(1, 0x02)),
        (L::D, KeyCell::new(1, 0x04)),
        (L::F, KeyCell::new(1, 0x08)),
        (L::G, KeyCell::new(1, 0x10)),
        (L::H, KeyCell::new(6, 0x10)),
        (L::J, KeyCell::new(6, 0x08)),
        (L::K, KeyCell::new(6, 0x04)),
        (L::L, KeyCell::new(6, 0x02)),
        (L::Enter, KeyCell::new(6, 0x01)),
        (L::CapsShift, KeyCell::new(0, 0x01)),
        (L::Z, KeyCell::new(0, 0x02)),
        (L::X, KeyCell::new(0, 0x04)),
        (L::C, KeyCell::new(0, 0x08)),
        (L::V, KeyCell::new(0, 0x10)),
        (L::B, KeyCell::new(7, 0x10)),
        (L::N, KeyCell::new(7, 0x08)),
        (L::M, KeyCell::new(7, 0x04)),
        (L::SymbolShift, KeyCell::new(7, 0x02)),
        (L::Space, KeyCell::new(7, 0x01)),
    ]
};

impl LogicalKey {
    /// All keys in table order.
    pub fn all() -> impl Iterator<Item = Self> {
        KEY_TABLE.iter().map(|(key, _)| *key)
    }

    /// Matrix position of this key, if it is wired.
    pub fn cell(self) -> Option<KeyCell> {
        KEY_TABLE
            .iter()
            .find(|(key, _)| *key == self)
            .map(|(_, cell)| *cell)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_every_cell_is_a_single_bit() {
        for (key, cell) in KEY_TABLE {
            assert_eq!(cell.mask.count_ones(), 1, "{key:?}");
            assert!(cell.row < 8, "{key:?}");
        }
    }

    #[test]
    fn test_cells_are_distinct() {
        let cells: HashSet<(usize, u8)> = KEY_TABLE.iter().map(|(_, c)| (c.row, c.mask)).collect();
        assert_eq!(cells.len(), 40);
    }

    #[test]
    fn test_cell_lookup() {
        assert_eq!(LogicalKey::J.cell(), Some(KeyCell { row: 6, mask: 0x08 }));
        assert_eq!(LogicalKey::CapsShift.cell(), Some(KeyCell { row: 0, mask: 0x01 }));
    }
}
