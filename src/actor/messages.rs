//! Message types for actor communication.
//!
//! Every actor consumes exactly one of these enums from its inbox and
//! matches it exhaustively.

use crossbeam_channel::Sender;

use crate::core::RomKind;
use crate::keyboard::LogicalKey;
use crate::video::Surface;

/// Commands queued on the keyboard actor.
#[derive(Debug)]
pub enum KeyboardCommand {
    /// Tap a key: down, hold one frame, up, hold ten frames, then report.
    KeyPress {
        /// Key to tap.
        key: LogicalKey,
        /// Completion, carrying the key that finished.
        done: Sender<LogicalKey>,
    },
    /// Type the tape-loading invocation for the given ROM.
    SendLoad(RomKind),
}

/// Commands handled inside the renderer's loop.
#[derive(Debug)]
pub enum RendererCommand {
    /// Install a new emulated-display surface, freeing the old one.
    SwapDisplay {
        /// The new surface.
        surface: Surface,
        /// Acknowledgment.
        done: Sender<()>,
    },
    /// Install a new output surface, freeing the old one.
    SwapOutput {
        /// The new surface.
        surface: Surface,
        /// Acknowledgment.
        done: Sender<()>,
    },
}

/// Pressed or released.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyState {
    /// Key went down.
    Down,
    /// Key came up.
    Up,
}

/// Raw events from the host input devices.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceEvent {
    /// The window was closed or the process was told to quit.
    Quit,
    /// A host key changed state.
    Key {
        /// Device key name (e.g. `"a"`, `"return"`, `"left shift"`, `"[4]"`).
        name: String,
        /// New state.
        state: KeyState,
    },
    /// A joystick axis moved.
    JoyAxis {
        /// Axis index (0 horizontal, 1 vertical).
        axis: u8,
        /// Position; only the sign matters.
        value: i16,
    },
    /// A joystick button changed state.
    JoyButton {
        /// Button index.
        button: u8,
        /// Whether it is now held.
        pressed: bool,
    },
}

impl DeviceEvent {
    /// Convenience constructor for a key event.
    pub fn key(name: impl Into<String>, state: KeyState) -> Self {
        Self::Key {
            name: name.into(),
            state,
        }
    }
}
