//! Keyboard Actor: owns the key matrix and replays scripted key taps.
//!
//! Direct [`Keyboard::key_down`]/[`Keyboard::key_up`] calls write the matrix
//! immediately. Scripted taps are queued and executed one at a time by the
//! actor thread, holding each key long enough for the ROM's keyboard scan
//! to see it. Both paths share the matrix lock, and the actor never holds
//! it across a sleep.

use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam_channel::{bounded, unbounded, Receiver, Sender};
use tracing::{debug, trace};

use super::messages::KeyboardCommand;
use super::supervisor::EventLoop;
use super::ShutdownCoordinator;
use crate::core::{FrameRate, RomKind};
use crate::error::FrontendError;
use crate::keyboard::{KeyMatrix, LogicalKey};

/// Frames a tapped key is held down.
const FRAMES_DOWN: u32 = 1;
/// Frames waited after releasing a tapped key.
const FRAMES_UP: u32 = 10;

/// Handle to the keyboard actor.
///
/// Cheap to clone; every clone talks to the same matrix and queue.
#[derive(Debug, Clone)]
pub struct Keyboard {
    matrix: Arc<KeyMatrix>,
    commands: Sender<KeyboardCommand>,
}

impl Keyboard {
    /// Spawn the keyboard actor.
    ///
    /// The command queue is unbounded: enqueueing never waits for the
    /// actor to catch up.
    pub fn spawn(
        coordinator: &Arc<ShutdownCoordinator>,
        frame_rate: FrameRate,
    ) -> Result<(Self, JoinHandle<()>), FrontendError> {
        let matrix = Arc::new(KeyMatrix::new());
        let (commands, inbox) = unbounded();
        let event_loop = EventLoop::register("keyboard", coordinator);

        let typist = Typist {
            matrix: Arc::clone(&matrix),
            frame_rate,
        };
        let handle = thread::Builder::new()
            .name("speccy-keyboard".to_string())
            .spawn(move || typist.run_loop(event_loop, &inbox))?;

        Ok((Self { matrix, commands }, handle))
    }

    /// The shared matrix.
    pub const fn matrix(&self) -> &Arc<KeyMatrix> {
        &self.matrix
    }

    /// Press a key now.
    #[inline]
    pub fn key_down(&self, key: LogicalKey) {
        self.matrix.key_down(key);
    }

    /// Release a key now.
    #[inline]
    pub fn key_up(&self, key: LogicalKey) {
        self.matrix.key_up(key);
    }

    /// Read a matrix row (port-read path).
    #[inline]
    pub fn key_state(&self, row: usize) -> u8 {
        self.matrix.row(row)
    }

    /// Overwrite a matrix row.
    pub fn set_key_state(&self, row: usize, state: u8) {
        self.matrix.set_row(row, state);
    }

    /// Queue a scripted tap of `key`.
    ///
    /// The returned channel yields `key` once the tap (including the
    /// trailing pause) has finished.
    pub fn key_press(&self, key: LogicalKey) -> Receiver<LogicalKey> {
        self.key_press_sequence(&[key])
    }

    /// Queue one scripted tap per key.
    ///
    /// The returned channel has room for every completion, so the actor
    /// never waits on the caller; completions arrive in submission order.
    pub fn key_press_sequence(&self, keys: &[LogicalKey]) -> Receiver<LogicalKey> {
        let (done, completions) = bounded(keys.len());
        for &key in keys {
            let command = KeyboardCommand::KeyPress {
                key,
                done: done.clone(),
            };
            if self.commands.send(command).is_err() {
                debug!(?key, "keyboard actor gone, dropping key press");
                break;
            }
        }
        completions
    }

    /// Queue the macro that types the tape-loading command.
    ///
    /// Only the 48K ROM has a macro; other ROMs are ignored.
    pub fn send_load(&self, rom: RomKind) {
        let _ = self.commands.send(KeyboardCommand::SendLoad(rom));
    }
}

/// The actor-side state: the matrix and the clock it types against.
struct Typist {
    matrix: Arc<KeyMatrix>,
    frame_rate: FrameRate,
}

impl Typist {
    fn run_loop(&self, mut event_loop: EventLoop, inbox: &Receiver<KeyboardCommand>) {
        while let Some(command) = event_loop.recv(inbox) {
            match command {
                KeyboardCommand::KeyPress { key, done } => {
                    self.tap(key);
                    let _ = done.send(key);
                }
                KeyboardCommand::SendLoad(RomKind::Rom48) => self.type_load(),
                KeyboardCommand::SendLoad(rom) => {
                    debug!(?rom, "no load macro for this ROM");
                }
            }
        }
    }

    fn hold(&self, frames: u32) {
        thread::sleep(self.frame_rate.frames(frames));
    }

    fn tap(&self, key: LogicalKey) {
        trace!(?key, "scripted key press");
        self.matrix.key_down(key);
        self.hold(FRAMES_DOWN);
        self.matrix.key_up(key);
        self.hold(FRAMES_UP);
    }

    /// `LOAD ""` followed by ENTER.
    fn type_load(&self) {
        debug!("typing LOAD \"\"");
        // J is LOAD in keyword mode.
        self.tap(LogicalKey::J);

        self.matrix.key_down(LogicalKey::SymbolShift);
        self.tap(LogicalKey::P);
        self.tap(LogicalKey::P);
        self.matrix.key_up(LogicalKey::SymbolShift);

        self.matrix.key_down(LogicalKey::Enter);
        self.hold(FRAMES_DOWN);
        self.matrix.key_up(LogicalKey::Enter);
    }
}
