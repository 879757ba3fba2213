//! The emulation core as seen from the front-end.
//!
//! The core is an external actor that consumes [`CoreCommand`]s from a
//! single channel, one at a time. Commands carrying a `Sender` are
//! blocking: [`CoreHandle`] waits for the core to answer before returning.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crossbeam_channel::{bounded, Sender};
use tracing::debug;

use crate::audio::AudioReceiver;
use crate::error::{FrontendError, LoadError};
use crate::video::DisplaySink;

/// Default emulation speed in frames per second.
pub const DEFAULT_FPS: f32 = 50.0;

/// ROM a machine boots into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RomKind {
    /// The 48K BASIC ROM.
    Rom48,
    /// The 128K menu ROM.
    Rom128,
}

/// How a program image is brought into the machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProgramKind {
    /// A memory snapshot, restored directly.
    Snapshot,
    /// A tape image, loaded by the ROM after a reset.
    Tape,
}

/// A program image read by the caller. Parsing is the core's business.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Program {
    /// Image kind.
    pub kind: ProgramKind,
    /// Raw file contents.
    pub data: Vec<u8>,
}

/// Commands accepted by the emulation core.
#[derive(Debug)]
pub enum CoreCommand {
    /// Start drawing frames into a display sink.
    AddDisplay(DisplaySink),
    /// Stop drawing into every sink, then ack.
    CloseAllDisplays(Sender<()>),
    /// Start pushing samples into a receiver.
    AddAudioReceiver(Box<dyn AudioReceiver>),
    /// Close every receiver, then ack.
    CloseAllAudioReceivers(Sender<()>),
    /// Change emulation speed.
    SetFps(f32),
    /// Reset the machine, ack once the ROM is running.
    Reset(Sender<()>),
    /// Load a program and report the outcome.
    Load {
        /// Name shown in messages.
        name: String,
        /// The image.
        program: Program,
        /// Outcome.
        done: Sender<Result<(), LoadError>>,
    },
}

/// The current frames-per-second setting, shared with the keyboard.
#[derive(Debug, Clone)]
pub struct FrameRate(Arc<AtomicU32>);

impl Default for FrameRate {
    fn default() -> Self {
        Self::new(DEFAULT_FPS)
    }
}

impl FrameRate {
    /// Create a frame rate. Non-positive values fall back to the default.
    pub fn new(fps: f32) -> Self {
        Self(Arc::new(AtomicU32::new(Self::sanitize(fps).to_bits())))
    }

    fn sanitize(fps: f32) -> f32 {
        if fps.is_finite() && fps > 0.0 {
            fps
        } else {
            DEFAULT_FPS
        }
    }

    /// Frames per second.
    pub fn fps(&self) -> f32 {
        f32::from_bits(self.0.load(Ordering::Acquire))
    }

    /// Update frames per second.
    pub fn set(&self, fps: f32) {
        self.0.store(Self::sanitize(fps).to_bits(), Ordering::Release);
    }

    /// Duration of `frames` emulated frames at the current rate.
    ///
    /// Saturates at [`Duration::MAX`] for vanishingly small rates.
    pub fn frames(&self, frames: u32) -> Duration {
        Duration::try_from_secs_f64(f64::from(frames) / f64::from(self.fps())).unwrap_or(Duration::MAX)
    }
}

/// Sending half of the core's command channel.
#[derive(Debug, Clone)]
pub struct CoreHandle {
    sender: Sender<CoreCommand>,
    frame_rate: FrameRate,
}

impl CoreHandle {
    const NAME: &'static str = "emulation core";

    /// Wrap the core's command sender.
    pub const fn new(sender: Sender<CoreCommand>, frame_rate: FrameRate) -> Self {
        Self { sender, frame_rate }
    }

    /// The shared frame rate.
    pub const fn frame_rate(&self) -> &FrameRate {
        &self.frame_rate
    }

    fn send(&self, command: CoreCommand) -> Result<(), FrontendError> {
        self.sender
            .send(command)
            .map_err(|_| FrontendError::Disconnected(Self::NAME))
    }

    fn round_trip(&self, build: impl FnOnce(Sender<()>) -> CoreCommand) -> Result<(), FrontendError> {
        let (done, ack) = bounded(1);
        self.send(build(done))?;
        ack.recv().map_err(|_| FrontendError::Disconnected(Self::NAME))
    }

    /// Hand a display sink to the core.
    pub fn add_display(&self, sink: DisplaySink) -> Result<(), FrontendError> {
        self.send(CoreCommand::AddDisplay(sink))
    }

    /// Detach every display sink. Blocks until the core stops drawing.
    pub fn close_all_displays(&self) -> Result<(), FrontendError> {
        self.round_trip(CoreCommand::CloseAllDisplays)
    }

    /// Hand an audio receiver to the core.
    pub fn add_audio_receiver(&self, receiver: Box<dyn AudioReceiver>) -> Result<(), FrontendError> {
        self.send(CoreCommand::AddAudioReceiver(receiver))
    }

    /// Close every audio receiver. Blocks until the core has let go.
    pub fn close_all_audio_receivers(&self) -> Result<(), FrontendError> {
        self.round_trip(CoreCommand::CloseAllAudioReceivers)
    }

    /// Change emulation speed.
    pub fn set_fps(&self, fps: f32) -> Result<(), FrontendError> {
        self.frame_rate.set(fps);
        debug!(fps = self.frame_rate.fps(), "set emulation speed");
        self.send(CoreCommand::SetFps(self.frame_rate.fps()))
    }

    /// Reset the machine. Blocks until the ROM is running.
    pub fn reset(&self) -> Result<(), FrontendError> {
        self.round_trip(CoreCommand::Reset)
    }

    /// Load a program. Blocks until the core reports the outcome.
    pub fn load(&self, name: &str, program: Program) -> Result<(), FrontendError> {
        let (done, result) = bounded(1);
        self.send(CoreCommand::Load {
            name: name.to_string(),
            program,
            done,
        })?;
        result
            .recv()
            .map_err(|_| FrontendError::Disconnected(Self::NAME))??;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_frame_durations() {
        let rate = FrameRate::new(50.0);
        assert_eq!(rate.frames(1), Duration::from_millis(20));
        assert_eq!(rate.frames(10), Duration::from_millis(200));

        rate.set(0.0);
        assert!((rate.fps() - DEFAULT_FPS).abs() < f32::EPSILON);
    }

    #[test]
    fn test_tiny_frame_rate_saturates() {
        let rate = FrameRate::new(1e-30);
        assert_eq!(rate.frames(10), Duration::MAX);
        assert_eq!(rate.frames(0), Duration::ZERO);
    }

    #[test]
    fn test_round_trip_waits_for_core() {
        let (tx, rx) = bounded(1);
        let core = CoreHandle::new(tx, FrameRate::default());

        let worker = thread::spawn(move || {
            let mut acked = 0;
            while let Ok(cmd) = rx.recv() {
                match cmd {
                    CoreCommand::CloseAllDisplays(done) | CoreCommand::Reset(done) => {
                        acked += 1;
                        done.send(()).unwrap();
                    }
                    CoreCommand::Load { done, .. } => {
                        done.send(Err(LoadError("bad image".into()))).unwrap();
                    }
                    _ => {}
                }
            }
            acked
        });

        core.close_all_displays().unwrap();
        core.reset().unwrap();
        let program = Program {
            kind: ProgramKind::Snapshot,
            data: vec![],
        };
        assert!(matches!(
            core.load("x.sna", program),
            Err(FrontendError::Load(_))
        ));
        drop(core);
        assert_eq!(worker.join().unwrap(), 2);
    }

    #[test]
    fn test_disconnected_core() {
        let (tx, rx) = bounded(1);
        drop(rx);
        let core = CoreHandle::new(tx, FrameRate::default());
        assert!(matches!(
            core.close_all_displays(),
            Err(FrontendError::Disconnected("emulation core"))
        ));
    }
}
