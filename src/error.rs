//! Error types for the front-end.
//!
//! Startup and video errors are fatal; audio errors are reported and
//! swallowed by the renderer because audio is optional.

use std::fmt;
use std::io;

use crate::keyboard::LogicalKey;

/// Structural problems detected by the start-up self-check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StartupError {
    /// The logical key table does not have exactly 40 entries.
    KeyTableSize {
        /// Number of entries found.
        found: usize,
    },
    /// A logical key appears more than once in the key table.
    DuplicateKey(LogicalKey),
    /// No device symbol presses this logical key on its own.
    UnreachableKey(LogicalKey),
}

impl fmt::Display for StartupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::KeyTableSize { found } => {
                write!(f, "invalid keyboard specification: {found} keys, expected 40")
            }
            Self::DuplicateKey(key) => write!(f, "invalid keyboard specification: {key:?} listed twice"),
            Self::UnreachableKey(key) => write!(f, "key {key:?} is missing in the device keymap"),
        }
    }
}

impl std::error::Error for StartupError {}

/// Failure to acquire a video surface from the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoError(pub String);

impl fmt::Display for VideoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "video backend error: {}", self.0)
    }
}

impl std::error::Error for VideoError {}

/// Failure to open an audio receiver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioError(pub String);

impl fmt::Display for AudioError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "audio backend error: {}", self.0)
    }
}

impl std::error::Error for AudioError {}

/// Failure reported by the emulation core while loading a program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadError(pub String);

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "load failed: {}", self.0)
    }
}

impl std::error::Error for LoadError {}

/// Umbrella error for front-end operations.
#[derive(Debug)]
pub enum FrontendError {
    /// The start-up self-check failed.
    Startup(StartupError),
    /// The display could not be created or replaced.
    Video(VideoError),
    /// The emulation core rejected a program.
    Load(LoadError),
    /// The named collaborator's channel is closed.
    Disconnected(&'static str),
    /// An actor thread could not be spawned.
    Spawn(io::Error),
    /// The controlling terminal could not be set up for key input.
    Terminal(io::Error),
    /// Termination signal handlers could not be installed.
    Signal(io::Error),
}

impl fmt::Display for FrontendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Startup(e) => write!(f, "startup self-check failed: {e}"),
            Self::Video(e) => e.fmt(f),
            Self::Load(e) => e.fmt(f),
            Self::Disconnected(name) => write!(f, "{name} channel disconnected"),
            Self::Spawn(e) => write!(f, "failed to spawn actor thread: {e}"),
            Self::Terminal(e) => write!(f, "terminal input unavailable: {e}"),
            Self::Signal(e) => write!(f, "cannot install signal handlers: {e}"),
        }
    }
}

impl std::error::Error for FrontendError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Startup(e) => Some(e),
            Self::Video(e) => Some(e),
            Self::Load(e) => Some(e),
            Self::Spawn(e) | Self::Terminal(e) | Self::Signal(e) => Some(e),
            Self::Disconnected(_) => None,
        }
    }
}

impl From<StartupError> for FrontendError {
    fn from(e: StartupError) -> Self {
        Self::Startup(e)
    }
}

impl From<VideoError> for FrontendError {
    fn from(e: VideoError) -> Self {
        Self::Video(e)
    }
}

impl From<LoadError> for FrontendError {
    fn from(e: LoadError) -> Self {
        Self::Load(e)
    }
}

impl From<io::Error> for FrontendError {
    fn from(e: io::Error) -> Self {
        Self::Spawn(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_startup_error_message() {
        let err = StartupError::KeyTableSize { found: 39 };
        assert_eq!(
            err.to_string(),
            "invalid keyboard specification: 39 keys, expected 40"
        );
    }

    #[test]
    fn test_frontend_error_source() {
        use std::error::Error;

        let err = FrontendError::from(VideoError("no mode".into()));
        assert!(err.source().is_some());
        assert!(FrontendError::Disconnected("core").source().is_none());
    }
}
