//! Kempston joystick: one two-axis digital stick and a fire button.
//!
//! Unlike the key matrix the Kempston port is active-high: a set bit
//! means the direction is held.

use bitflags::bitflags;
use std::sync::atomic::{AtomicU8, Ordering};

bitflags! {
    /// Kempston port lines.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct KempstonLines: u8 {
        /// Stick pushed right.
        const RIGHT = 0x01;
        /// Stick pushed left.
        const LEFT = 0x02;
        /// Stick pushed down.
        const DOWN = 0x04;
        /// Stick pushed up.
        const UP = 0x08;
        /// Fire button.
        const FIRE = 0x10;
    }
}

/// Shared joystick state read by the core's port path.
#[derive(Debug, Default)]
pub struct Joystick {
    state: AtomicU8,
}

impl Joystick {
    /// Create a joystick with nothing held.
    pub const fn new() -> Self {
        Self {
            state: AtomicU8::new(0),
        }
    }

    /// Assert the given lines.
    pub fn press(&self, lines: KempstonLines) {
        self.state.fetch_or(lines.bits(), Ordering::AcqRel);
    }

    /// Release the given lines.
    pub fn release(&self, lines: KempstonLines) {
        self.state.fetch_and(!lines.bits(), Ordering::AcqRel);
    }

    /// Current line state.
    pub fn lines(&self) -> KempstonLines {
        KempstonLines::from_bits_truncate(self.state.load(Ordering::Acquire))
    }

    /// Raw port value.
    #[inline]
    pub fn port_value(&self) -> u8 {
        self.state.load(Ordering::Acquire)
    }
}
