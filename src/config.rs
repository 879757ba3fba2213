//! Front-end configuration.

use std::time::Duration;

use crate::audio::AudioConfig;
use crate::core::DEFAULT_FPS;
use crate::video::{DisplayMode, ScaleTier};

/// Configuration for [`crate::Frontend`].
#[derive(Debug, Clone, PartialEq)]
pub struct FrontendConfig {
    /// Emulation speed in frames per second.
    pub fps: f32,
    /// Requested scale tier.
    pub scale: ScaleTier,
    /// Start in fullscreen (forces 2x).
    pub fullscreen: bool,
    /// Initial audio settings.
    pub audio: AudioConfig,
    /// Highlight painted regions in the compositor.
    pub show_painted_regions: bool,
    /// Read keys from the controlling terminal.
    pub terminal_input: bool,
    /// Turn SIGINT and SIGTERM into an exit request (unix only).
    pub handle_signals: bool,
    /// Terminal event poll timeout.
    pub input_poll_timeout: Duration,
    /// Log at debug level.
    pub verbose: bool,
    /// Trace every device event.
    pub verbose_input: bool,
}

impl Default for FrontendConfig {
    fn default() -> Self {
        Self {
            fps: DEFAULT_FPS,
            scale: ScaleTier::X1,
            fullscreen: false,
            audio: AudioConfig::default(),
            show_painted_regions: false,
            terminal_input: false,
            handle_signals: false,
            input_poll_timeout: Duration::from_millis(10),
            verbose: false,
            verbose_input: false,
        }
    }
}

impl FrontendConfig {
    /// Initial display mode.
    pub const fn display_mode(&self) -> DisplayMode {
        DisplayMode::new(self.scale, self.fullscreen)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = FrontendConfig::default();
        assert_eq!(config.display_mode().dimensions(), (320, 256));
        assert!(config.audio.enabled);
        assert_eq!(config.audio.frequency, 44_100);
        assert!(!config.terminal_input);
        assert!(!config.handle_signals);
    }
}
