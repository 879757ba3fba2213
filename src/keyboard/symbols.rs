//! Device symbol table: host key names to Spectrum key chords.
//!
//! Host keyboards have keys the Spectrum lacks (arrows, punctuation,
//! the numeric keypad). Those map to chords such as CAPS SHIFT + 5.

use std::collections::{HashMap, HashSet};

use super::keys::{KeyCell, LogicalKey};
use crate::error::StartupError;

/// An ordered chord of logical keys producing one symbol.
///
/// Pressing applies the keys in listed order; releasing applies them in
/// reverse, so a leading shift is held for the whole chord.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeySequence(Vec<LogicalKey>);

impl KeySequence {
    /// Create a sequence from keys in press order.
    pub fn new(keys: impl Into<Vec<LogicalKey>>) -> Self {
        Self(keys.into())
    }

    /// Keys in press order.
    pub fn press_order(&self) -> impl Iterator<Item = LogicalKey> + '_ {
        self.0.iter().copied()
    }

    /// Keys in release order.
    pub fn release_order(&self) -> impl Iterator<Item = LogicalKey> + '_ {
        self.0.iter().rev().copied()
    }

    /// The only key, if this is not a chord.
    pub fn single(&self) -> Option<LogicalKey> {
        match self.0.as_slice() {
            [key] => Some(*key),
            _ => None,
        }
    }

    /// Number of keys in the chord.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the chord is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

const DEFAULT_SYMBOLS: &[(&str, &[LogicalKey])] = {
    use LogicalKey as L;
    &[
        ("0", &[L::Num0]),
        ("1", &[L::Num1]),
        ("2", &[L::Num2]),
        ("3", &[L::Num3]),
        ("4", &[L::Num4]),
        ("5", &[L::Num5]),
        ("6", &[L::Num6]),
        ("7", &[L::Num7]),
        ("8", &[L::Num8]),
        ("9", &[L::Num9]),
        ("a", &[L::A]),
        ("b", &[L::B]),
        ("c", &[L::C]),
        ("d", &[L::D]),
        ("e", &[L::E]),
        ("f", &[L::F]),
        ("g", &[L::G]),
        ("h", &[L::H]),
        ("i", &[L::I]),
        ("j", &[L::J]),
        ("k", &[L::K]),
        ("l", &[L::L]),
        ("m", &[L::M]),
        ("n", &[L::N]),
        ("o", &[L::O]),
        ("p", &[L::P]),
        ("q", &[L::Q]),
        ("r", &[L::R]),
        ("s", &[L::S]),
        ("t", &[L::T]),
        ("u", &[L::U]),
        ("v", &[L::V]),
        ("w", &[L::W]),
        ("x", &[L::X]),
        ("y", &[L::Y]),
        ("z", &[L::Z]),
        ("return", &[L::Enter]),
        ("space", &[L::Space]),
        ("left shift", &[L::CapsShift]),
        ("right shift", &[L::CapsShift]),
        ("left ctrl", &[L::SymbolShift]),
        ("right ctrl", &[L::SymbolShift]),
        ("left", &[L::CapsShift, L::Num5]),
        ("down", &[L::CapsShift, L::Num6]),
        ("up", &[L::CapsShift, L::Num7]),
        ("right", &[L::CapsShift, L::Num8]),
        ("backspace", &[L::CapsShift, L::Num0]),
        ("-", &[L::SymbolShift, L::J]),
        ("=", &[L::SymbolShift, L::L]),
        // ( and )
        ("[", &[L::SymbolShift, L::Num8]),
        ("]", &[L::SymbolShift, L::Num9]),
        (";", &[L::SymbolShift, L::O]),
        ("'", &[L::SymbolShift, L::Num7]),
        (",", &[L::SymbolShift, L::N]),
        (".", &[L::SymbolShift, L::M]),
        ("/", &[L::SymbolShift, L::V]),
        // Keypad
        ("[0]", &[L::Num0]),
        ("[1]", &[L::Num1]),
        ("[2]", &[L::Num2]),
        ("[3]", &[L::Num3]),
        ("[4]", &[L::Num4]),
        ("[5]", &[L::Num5]),
        ("[6]", &[L::Num6]),
        ("[7]", &[L::Num7]),
        ("[8]", &[L::Num8]),
        ("[9]", &[L::Num9]),
        ("[*]", &[L::SymbolShift, L::B]),
        ("[-]", &[L::SymbolShift, L::J]),
        ("[+]", &[L::SymbolShift, L::K]),
        ("[/]", &[L::SymbolShift, L::V]),
    ]
};

/// Map from device key name to chord.
#[derive(Debug, Clone)]
pub struct SymbolTable {
    entries: HashMap<String, KeySequence>,
}

impl Default for SymbolTable {
    fn default() -> Self {
        let entries = DEFAULT_SYMBOLS
            .iter()
            .map(|(name, keys)| ((*name).to_string(), KeySequence::new(*keys)))
            .collect();
        Self { entries }
    }
}

impl SymbolTable {
    /// An empty table.
    pub fn empty() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Look up a device key name.
    pub fn get(&self, name: &str) -> Option<&KeySequence> {
        self.entries.get(name)
    }

    /// Add or replace a mapping.
    pub fn insert(&mut self, name: impl Into<String>, sequence: KeySequence) {
        self.entries.insert(name.into(), sequence);
    }

    /// Remove a mapping, returning it.
    pub fn remove(&mut self, name: &str) -> Option<KeySequence> {
        self.entries.remove(name)
    }

    /// Number of mapped names.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Verify the key wiring and that every key can be typed on its own.
///
/// The table must hold exactly 40 distinct keys, and for each of them some
/// device name must map to that key alone. Chords do not count: a key only
/// reachable under a shift cannot be typed by itself.
pub fn self_check(table: &[(LogicalKey, KeyCell)], symbols: &SymbolTable) -> Result<(), StartupError> {
    if table.len() != 40 {
        return Err(StartupError::KeyTableSize { found: table.len() });
    }

    let mut seen = HashSet::with_capacity(table.len());
    for (key, _) in table {
        if !seen.insert(*key) {
            return Err(StartupError::DuplicateKey(*key));
        }
    }

    let reachable: HashSet<LogicalKey> = symbols
        .entries
        .values()
        .filter_map(KeySequence::single)
        .collect();

    match table.iter().find(|(key, _)| !reachable.contains(key)) {
        Some((key, _)) => Err(StartupError::UnreachableKey(*key)),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keyboard::keys::KEY_TABLE;

    #[test]
    fn test_default_tables_pass() {
        assert_eq!(self_check(&KEY_TABLE, &SymbolTable::default()), Ok(()));
    }

    #[test]
    fn test_removed_symbol_fails() {
        let mut symbols = SymbolTable::default();
        symbols.remove("b");
        assert_eq!(
            self_check(&KEY_TABLE, &symbols),
            Err(StartupError::UnreachableKey(LogicalKey::B))
        );
    }

    #[test]
    fn test_redundant_alias_removal_still_passes() {
        let mut symbols = SymbolTable::default();
        symbols.remove("right shift");
        symbols.remove("[5]");
        assert_eq!(self_check(&KEY_TABLE, &symbols), Ok(()));
    }

    #[test]
    fn test_wrong_table_size_fails() {
        let short = &KEY_TABLE[..39];
        assert_eq!(
            self_check(short, &SymbolTable::default()),
            Err(StartupError::KeyTableSize { found: 39 })
        );
    }

    #[test]
    fn test_duplicate_key_fails() {
        let mut table = KEY_TABLE;
        table[1] = table[0];
        assert_eq!(
            self_check(&table, &SymbolTable::default()),
            Err(StartupError::DuplicateKey(LogicalKey::Num1))
        );
    }

    #[test]
    fn test_sequence_orders() {
        let seq = SymbolTable::default().get("left").cloned().unwrap();
        let press: Vec<_> = seq.press_order().collect();
        let release: Vec<_> = seq.release_order().collect();
        assert_eq!(press, vec![LogicalKey::CapsShift, LogicalKey::Num5]);
        assert_eq!(release, vec![LogicalKey::Num5, LogicalKey::CapsShift]);
        assert_eq!(seq.single(), None);
    }
}
