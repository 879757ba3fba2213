//! Front-end wiring: builds the shared context and starts every actor.

use std::sync::Arc;
use std::thread::JoinHandle;

use crossbeam_channel::Sender;
use tracing::{debug, info};

use super::context::Context;
use super::input::InputDispatcher;
use super::keyboard::Keyboard;
use super::messages::DeviceEvent;
use super::renderer::Renderer;
use super::ShutdownCoordinator;
use crate::audio::AudioBackend;
use crate::config::FrontendConfig;
use crate::core::{CoreCommand, CoreHandle, FrameRate, Program, ProgramKind};
use crate::error::FrontendError;
use crate::joystick::Joystick;
use crate::keyboard::{self_check, SymbolTable, KEY_TABLE};
use crate::terminal::TerminalEvents;
#[cfg(unix)]
use crate::terminal::TerminationSignals;
use crate::video::{Compositor, VideoBackend};

/// The external collaborators the front-end drives.
pub struct Collaborators {
    /// Command channel of the emulation core.
    pub core: Sender<CoreCommand>,
    /// Surface compositor.
    pub compositor: Arc<dyn Compositor>,
    /// Video backend.
    pub video: Arc<dyn VideoBackend>,
    /// Audio backend.
    pub audio: Arc<dyn AudioBackend>,
}

/// A running front-end.
#[derive(Debug)]
pub struct Frontend {
    ctx: Context,
    keyboard: Keyboard,
    renderer: Renderer,
    input: InputDispatcher,
    threads: Vec<JoinHandle<()>>,
}

/// Handles to the actors started by [`Frontend::start`].
struct Actors {
    keyboard: Keyboard,
    renderer: Renderer,
    input: InputDispatcher,
}

impl Frontend {
    /// Check the keyboard tables, then start every actor.
    ///
    /// # Errors
    ///
    /// Returns an error if the self-check fails (nothing has been started
    /// then), if the video backend cannot open the initial surfaces, if a
    /// thread cannot be spawned, or if the core is gone. Actors already
    /// running are stopped before the error is returned.
    pub fn start(config: &FrontendConfig, collaborators: Collaborators) -> Result<Self, FrontendError> {
        let symbols = SymbolTable::default();
        self_check(&KEY_TABLE, &symbols)?;

        let ctx = Context {
            coordinator: Arc::new(ShutdownCoordinator::new()),
            core: CoreHandle::new(collaborators.core, FrameRate::new(config.fps)),
            compositor: collaborators.compositor,
            video: collaborators.video,
            audio: collaborators.audio,
            joystick: Arc::new(Joystick::new()),
            symbols: Arc::new(symbols),
        };
        {
            let video = Arc::clone(&ctx.video);
            ctx.coordinator.on_teardown(move || video.shutdown());
        }

        let mut threads = Vec::new();
        match Self::spawn_actors(&ctx, config, &mut threads) {
            Ok(actors) => {
                info!(actors = threads.len(), "front-end started");
                Ok(Self {
                    ctx,
                    keyboard: actors.keyboard,
                    renderer: actors.renderer,
                    input: actors.input,
                    threads,
                })
            }
            Err(e) => {
                debug!(error = %e, "start-up failed, stopping actors");
                ctx.coordinator.request_exit();
                ctx.coordinator.wait();
                for thread in threads {
                    let _ = thread.join();
                }
                Err(e)
            }
        }
    }

    fn spawn_actors(
        ctx: &Context,
        config: &FrontendConfig,
        threads: &mut Vec<JoinHandle<()>>,
    ) -> Result<Actors, FrontendError> {
        ctx.core.set_fps(config.fps)?;
        ctx.compositor.show_painted_regions(config.show_painted_regions);

        let (keyboard, thread) = Keyboard::spawn(&ctx.coordinator, ctx.frame_rate().clone())?;
        threads.push(thread);

        let (renderer, thread) = Renderer::spawn(ctx, config)?;
        threads.push(thread);
        renderer.set_audio_parameters(config.audio)?;

        let (input, thread) = InputDispatcher::spawn(
            &ctx.coordinator,
            keyboard.clone(),
            Arc::clone(&ctx.joystick),
            Arc::clone(&ctx.symbols),
        )?;
        threads.push(thread);

        if config.terminal_input {
            threads.push(TerminalEvents::spawn(
                &ctx.coordinator,
                input.sender(),
                config.input_poll_timeout,
            )?);
        }

        #[cfg(unix)]
        if config.handle_signals {
            threads.push(TerminationSignals::spawn(&ctx.coordinator)?);
        }

        Ok(Actors {
            keyboard,
            renderer,
            input,
        })
    }

    /// The shared context.
    pub const fn context(&self) -> &Context {
        &self.ctx
    }

    /// The keyboard actor.
    pub const fn keyboard(&self) -> &Keyboard {
        &self.keyboard
    }

    /// The renderer actor.
    pub const fn renderer(&self) -> &Renderer {
        &self.renderer
    }

    /// The input dispatcher.
    pub const fn input(&self) -> &InputDispatcher {
        &self.input
    }

    /// The Kempston joystick.
    pub fn joystick(&self) -> &Joystick {
        &self.ctx.joystick
    }

    /// The emulation core.
    pub const fn core(&self) -> &CoreHandle {
        &self.ctx.core
    }

    /// Feed a device event to the input dispatcher.
    pub fn dispatch(&self, event: DeviceEvent) -> bool {
        self.input.dispatch(event)
    }

    /// Bring a program into the machine. Tape images are loaded after a
    /// reset so the ROM is ready to read them.
    ///
    /// # Errors
    ///
    /// [`FrontendError::Load`] if the core rejects the image.
    pub fn load_program(&self, name: &str, program: Program) -> Result<(), FrontendError> {
        if program.kind == ProgramKind::Tape {
            self.ctx.core.reset()?;
        }
        self.ctx.core.load(name, program)
    }

    /// Raise the global exit flag and tell every actor to stop.
    ///
    /// Does not wait; call [`Frontend::wait`] to join the actors.
    pub fn request_exit(&self) {
        self.ctx.coordinator.request_exit();
    }

    /// Whether exit has been requested.
    pub fn exit_requested(&self) -> bool {
        self.ctx.coordinator.exit_requested()
    }

    /// Block until exit is requested and every actor has stopped, then
    /// join their threads.
    pub fn wait(self) {
        self.ctx.coordinator.wait();
        for thread in self.threads {
            let _ = thread.join();
        }
    }
}
