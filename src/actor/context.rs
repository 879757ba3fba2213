//! Shared collaborators, built once at start-up.
//!
//! Every actor receives the pieces it needs from one [`Context`] at
//! construction time instead of looking them up globally.

use std::fmt;
use std::sync::Arc;

use super::ShutdownCoordinator;
use crate::audio::AudioBackend;
use crate::core::{CoreHandle, FrameRate};
use crate::joystick::Joystick;
use crate::keyboard::SymbolTable;
use crate::video::{Compositor, VideoBackend};

/// Handles shared by every actor.
#[derive(Clone)]
pub struct Context {
    /// Join barrier every actor registers with.
    pub coordinator: Arc<ShutdownCoordinator>,
    /// The emulation core.
    pub core: CoreHandle,
    /// Surface compositor.
    pub compositor: Arc<dyn Compositor>,
    /// Surface allocator.
    pub video: Arc<dyn VideoBackend>,
    /// Audio receiver factory.
    pub audio: Arc<dyn AudioBackend>,
    /// Kempston joystick state.
    pub joystick: Arc<Joystick>,
    /// Device key names.
    pub symbols: Arc<SymbolTable>,
}

impl Context {
    /// The shared frame rate.
    pub const fn frame_rate(&self) -> &FrameRate {
        self.core.frame_rate()
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("coordinator", &self.coordinator)
            .field("core", &self.core)
            .field("joystick", &self.joystick)
            .field("symbols", &self.symbols.len())
            .finish_non_exhaustive()
    }
}
