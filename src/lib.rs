//! # Speccy Frontend
//!
//! An actor-based peripheral front-end for a ZX Spectrum emulation core.
//!
//! The front-end feeds host keyboard and joystick input into an emulated
//! key matrix, owns the video surfaces and the audio receiver, and can
//! reconfigure them while the core keeps running.
//!
//! ## Core Concepts
//!
//! - **Actors**: keyboard, renderer and input dispatcher each run on their
//!   own thread and take typed commands over channels
//! - **Blocking handshakes**: surface swaps, audio teardown and shutdown
//!   return only after the other side has acknowledged
//! - **Join barrier**: one exit request stops every actor, and the shared
//!   teardown runs after the last one has left
//!
//! ## Example
//!
//! ```rust,ignore
//! use speccy_frontend::{Collaborators, Frontend, FrontendConfig};
//!
//! let frontend = Frontend::start(&FrontendConfig::default(), collaborators)?;
//! frontend.keyboard().key_press(LogicalKey::Enter).recv()?;
//! frontend.request_exit();
//! frontend.wait();
//! ```

#![warn(missing_docs)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

pub mod actor;
pub mod audio;
pub mod config;
pub mod core;
pub mod error;
pub mod harness;
pub mod joystick;
pub mod keyboard;
pub mod logging;
pub mod terminal;
pub mod video;

// Re-exports for convenience
pub use actor::{Collaborators, DeviceEvent, Frontend, KeyState, Keyboard, Renderer, ShutdownCoordinator};
pub use audio::{AudioBackend, AudioConfig, AudioReceiver};
pub use config::FrontendConfig;
pub use crate::core::{CoreCommand, CoreHandle, FrameRate, Program, ProgramKind, RomKind};
pub use error::{FrontendError, StartupError};
pub use joystick::{Joystick, KempstonLines};
pub use keyboard::{KeyMatrix, LogicalKey, SymbolTable};
pub use video::{Compositor, DisplayMode, ScaleTier, Surface, VideoBackend};
