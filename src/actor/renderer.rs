//! Renderer Actor: output reconfiguration.
//!
//! The actor thread owns the output surface and the emulated-display
//! surface. Every change to either goes through its inbox, so the
//! compositor never holds a reference to a freed surface.
//!
//! ```text
//!  resize_video()                      renderer thread
//!  ──────────────                      ───────────────
//!  core: CloseAllDisplays ◀─▶ ack
//!  rescale console offset
//!  backend: open output + display
//!  SwapOutput  ─────────────────────▶  detach output, free old, attach new
//!              ◀─────────────── ack
//!  SwapDisplay ─────────────────────▶  remove inputs, free old, add new
//!              ◀─────────────── ack
//!  core: AddDisplay(sink)
//! ```
//!
//! Audio changes are a full teardown: the core closes every receiver
//! before a new one is opened.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};

use crossbeam_channel::{bounded, Receiver, Sender};
use tracing::{debug, error, info, warn};

use super::context::Context;
use super::messages::RendererCommand;
use super::supervisor::EventLoop;
use crate::audio::AudioConfig;
use crate::config::FrontendConfig;
use crate::error::FrontendError;
use crate::video::{
    rescale_console_offset, Compositor, DisplayMode, DisplaySink, ScaleTier, Surface, VideoBackend,
};

/// Settings guarded by the reconfiguration lock.
#[derive(Debug, Clone, Copy)]
struct RenderSettings {
    mode: DisplayMode,
    console_y: i32,
    audio: AudioConfig,
}

/// Handle to the renderer actor.
///
/// Reconfiguration calls are serialised: a second `resize_video` waits
/// until the first has installed both surfaces.
#[derive(Debug, Clone)]
pub struct Renderer {
    ctx: Context,
    settings: Arc<Mutex<RenderSettings>>,
    commands: Sender<RendererCommand>,
}

impl Renderer {
    const NAME: &'static str = "renderer";

    /// Open the initial surfaces, spawn the actor and install them.
    ///
    /// # Errors
    ///
    /// A video backend failure is fatal: it is logged, the global exit is
    /// requested and [`FrontendError::Video`] is returned.
    pub fn spawn(ctx: &Context, config: &FrontendConfig) -> Result<(Self, JoinHandle<()>), FrontendError> {
        let mode = config.display_mode();
        let (output, display, sink) = Self::open_surfaces(ctx, mode)?;

        let (commands, inbox) = bounded(1);
        let event_loop = EventLoop::register(Self::NAME, &ctx.coordinator);
        let surfaces = Surfaces {
            output: None,
            display: None,
            compositor: Arc::clone(&ctx.compositor),
            video: Arc::clone(&ctx.video),
        };
        let handle = thread::Builder::new()
            .name("speccy-renderer".to_string())
            .spawn(move || surfaces.run_loop(event_loop, &inbox))?;

        let renderer = Self {
            ctx: ctx.clone(),
            settings: Arc::new(Mutex::new(RenderSettings {
                mode,
                console_y: 0,
                audio: config.audio,
            })),
            commands,
        };
        renderer.install(output, display, sink)?;

        let (width, height) = mode.dimensions();
        info!(width, height, fullscreen = mode.fullscreen, "video surface resolution");
        Ok((renderer, handle))
    }

    fn lock(&self) -> MutexGuard<'_, RenderSettings> {
        self.settings.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Current display mode.
    pub fn mode(&self) -> DisplayMode {
        self.lock().mode
    }

    /// Output width in pixels.
    pub fn width(&self) -> u32 {
        self.mode().dimensions().0
    }

    /// Output height in pixels.
    pub fn height(&self) -> u32 {
        self.mode().dimensions().1
    }

    /// Vertical offset of the console overlay.
    pub fn console_y(&self) -> i32 {
        self.lock().console_y
    }

    /// Move the console overlay.
    pub fn set_console_y(&self, y: i32) {
        self.lock().console_y = y;
    }

    /// Current audio settings.
    pub fn audio(&self) -> AudioConfig {
        self.lock().audio
    }

    /// Toggle painted-region highlighting.
    pub fn show_painted_regions(&self, enable: bool) {
        self.ctx.compositor.show_painted_regions(enable);
    }

    /// Switch to a new display mode.
    ///
    /// Returns once the core draws into the new display surface.
    ///
    /// # Errors
    ///
    /// [`FrontendError::Video`] if the backend cannot open the new
    /// surfaces (the global exit has then been requested), or
    /// [`FrontendError::Disconnected`] if the core or the actor is gone.
    pub fn resize_video(&self, scale: ScaleTier, fullscreen: bool) -> Result<(), FrontendError> {
        let mut settings = self.lock();
        let mode = DisplayMode::new(scale, fullscreen);
        debug!(?mode, "resize video");

        self.ctx.core.close_all_displays()?;

        let (output, display, sink) = Self::open_surfaces(&self.ctx, mode)?;

        let tier = mode.effective_scale();
        if tier != settings.mode.effective_scale() {
            let (_, old_height) = settings.mode.dimensions();
            settings.console_y = rescale_console_offset(settings.console_y, old_height, tier);
        }
        settings.mode = mode;

        self.install(output, display, sink)
    }

    /// Turn audio on or off. Always rebuilds the receiver.
    ///
    /// # Errors
    ///
    /// [`FrontendError::Disconnected`] if the core is gone.
    pub fn enable_audio(&self, enable: bool) -> Result<(), FrontendError> {
        let mut settings = self.lock();
        let audio = AudioConfig {
            enabled: enable,
            ..settings.audio
        };
        self.apply_audio(&mut settings, audio)
    }

    /// Change the playback frequency. No-op if unchanged.
    ///
    /// # Errors
    ///
    /// [`FrontendError::Disconnected`] if the core is gone.
    pub fn set_audio_freq(&self, frequency: u32) -> Result<(), FrontendError> {
        let mut settings = self.lock();
        if settings.audio.frequency == frequency {
            return Ok(());
        }
        let audio = AudioConfig {
            frequency,
            ..settings.audio
        };
        self.apply_audio(&mut settings, audio)
    }

    /// Change the resampling quality. No-op if unchanged.
    ///
    /// # Errors
    ///
    /// [`FrontendError::Disconnected`] if the core is gone.
    pub fn set_audio_quality(&self, high_quality: bool) -> Result<(), FrontendError> {
        let mut settings = self.lock();
        if settings.audio.high_quality == high_quality {
            return Ok(());
        }
        let audio = AudioConfig {
            high_quality,
            ..settings.audio
        };
        self.apply_audio(&mut settings, audio)
    }

    /// Replace every audio setting at once.
    ///
    /// # Errors
    ///
    /// [`FrontendError::Disconnected`] if the core is gone.
    pub fn set_audio_parameters(&self, audio: AudioConfig) -> Result<(), FrontendError> {
        let mut settings = self.lock();
        self.apply_audio(&mut settings, audio)
    }

    fn apply_audio(&self, settings: &mut RenderSettings, audio: AudioConfig) -> Result<(), FrontendError> {
        settings.audio = audio;
        self.ctx.core.close_all_audio_receivers()?;
        if !audio.enabled {
            debug!("audio disabled");
            return Ok(());
        }

        match self.ctx.audio.open(audio.frequency, audio.high_quality) {
            Ok(receiver) => {
                debug!(frequency = audio.frequency, high_quality = audio.high_quality, "audio receiver opened");
                self.ctx.core.add_audio_receiver(receiver)
            }
            Err(e) => {
                warn!(error = %e, "audio left disabled");
                settings.audio.enabled = false;
                Ok(())
            }
        }
    }

    fn open_surfaces(ctx: &Context, mode: DisplayMode) -> Result<(Surface, Surface, DisplaySink), FrontendError> {
        let opened = ctx.video.open_output(mode).and_then(|output| {
            match ctx.video.open_display(mode) {
                Ok((display, sink)) => Ok((output, display, sink)),
                Err(e) => {
                    ctx.video.release(output);
                    Err(e)
                }
            }
        });

        opened.map_err(|e| {
            error!(error = %e, "cannot open video surfaces");
            ctx.coordinator.request_exit();
            FrontendError::Video(e)
        })
    }

    /// Hand both surfaces to the actor, output first, then start the core
    /// drawing into the new display.
    fn install(&self, output: Surface, display: Surface, sink: DisplaySink) -> Result<(), FrontendError> {
        self.swap(|done| RendererCommand::SwapOutput { surface: output, done })?;
        self.swap(|done| RendererCommand::SwapDisplay { surface: display, done })?;
        self.ctx.core.add_display(sink)
    }

    fn swap(&self, build: impl FnOnce(Sender<()>) -> RendererCommand) -> Result<(), FrontendError> {
        let (done, ack) = bounded(1);
        self.commands
            .send(build(done))
            .map_err(|_| FrontendError::Disconnected(Self::NAME))?;
        ack.recv().map_err(|_| FrontendError::Disconnected(Self::NAME))
    }
}

/// The actor-side state: the installed surfaces.
///
/// Surfaces still held at exit are reclaimed by the backend's shutdown.
struct Surfaces {
    output: Option<Surface>,
    display: Option<Surface>,
    compositor: Arc<dyn Compositor>,
    video: Arc<dyn VideoBackend>,
}

impl Surfaces {
    fn run_loop(mut self, mut event_loop: EventLoop, inbox: &Receiver<RendererCommand>) {
        while let Some(command) = event_loop.recv(inbox) {
            match command {
                RendererCommand::SwapOutput { surface, done } => {
                    self.swap_output(surface);
                    let _ = done.send(());
                }
                RendererCommand::SwapDisplay { surface, done } => {
                    self.swap_display(surface);
                    let _ = done.send(());
                }
            }
        }
    }

    fn swap_output(&mut self, surface: Surface) {
        self.compositor.replace_output_surface(None);
        if let Some(old) = self.output.take() {
            self.video.release(old);
        }
        self.compositor.replace_output_surface(Some(&surface));
        self.output = Some(surface);
    }

    fn swap_display(&mut self, surface: Surface) {
        self.compositor.remove_all_input_surfaces();
        if let Some(old) = self.display.take() {
            self.video.release(old);
        }
        self.compositor.add_input_surface(&surface, 0, 0);
        self.display = Some(surface);
    }
}
