//! Actor Model: message-passing concurrency for the front-end.
//!
//! Every subsystem runs on its own thread and owns its state outright;
//! other threads talk to it through crossbeam channels:
//! - **Keyboard**: owns the key matrix, replays scripted key taps
//! - **Renderer**: owns the output and display surfaces, runs mode changes
//! - **Input**: turns device events into matrix and joystick changes
//! - **Shutdown Coordinator**: broadcasts terminate and joins everyone
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐   DeviceEvent   ┌──────────────┐  key_down/up  ┌──────────────┐
//! │   Terminal   │ ──────────────▶ │    Input     │ ────────────▶ │   Keyboard   │
//! └──────────────┘                 └──────────────┘               └──────────────┘
//!                                         │ request_exit
//!                                         ▼
//! ┌──────────────┐  Swap{Output,   ┌──────────────┐   terminate   ┌──────────────┐
//! │   Renderer   │ ◀──── Display}  │   Shutdown   │ ────────────▶ │  every actor │
//! └──────────────┘                 │ Coordinator  │ ◀──── ack ─── └──────────────┘
//!        │ CoreCommand             └──────────────┘
//!        ▼
//! ┌──────────────┐
//! │ Emulation    │
//! │ Core         │
//! └──────────────┘
//! ```

mod context;
mod frontend;
mod input;
mod keyboard;
mod messages;
mod renderer;
mod shutdown;
mod supervisor;

pub use context::Context;
pub use frontend::{Collaborators, Frontend};
pub use input::{translate, InputAction, InputDispatcher};
pub use keyboard::Keyboard;
pub use messages::{DeviceEvent, KeyState, KeyboardCommand, RendererCommand};
pub use renderer::Renderer;
pub use shutdown::ShutdownCoordinator;
pub use supervisor::{ActorHandle, ActorState, EventLoop};
