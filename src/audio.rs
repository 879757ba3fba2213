//! Audio: receiver configuration and the backend seam.

use std::fmt;

use crate::error::AudioError;

/// Default playback frequency in Hz.
pub const PLAYBACK_FREQUENCY: u32 = 44_100;

/// Audio output settings.
///
/// Any change to any field rebuilds the receiver from scratch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AudioConfig {
    /// Whether a receiver should exist at all.
    pub enabled: bool,
    /// Higher-quality resampling.
    pub high_quality: bool,
    /// Playback frequency in Hz.
    pub frequency: u32,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            high_quality: true,
            frequency: PLAYBACK_FREQUENCY,
        }
    }
}

/// A sink the emulation core pushes beeper samples into.
pub trait AudioReceiver: Send + fmt::Debug {
    /// Playback frequency this receiver was opened with.
    fn frequency(&self) -> u32;

    /// Whether the receiver resamples at high quality.
    fn high_quality(&self) -> bool;
}

/// Opens audio receivers.
pub trait AudioBackend: Send + Sync {
    /// Open a receiver for the given settings.
    fn open(&self, frequency: u32, high_quality: bool) -> Result<Box<dyn AudioReceiver>, AudioError>;
}
