//! Input Dispatcher: turns raw device events into matrix and joystick
//! changes.
//!
//! Translation is stateless. A device key name is looked up in the
//! [`SymbolTable`] and its chord is pressed in listed order or released in
//! reverse order. Names with no mapping are ignored so that extra backend
//! events never cause trouble.

use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam_channel::{unbounded, Receiver, Sender};
use tracing::{debug, trace};

use super::keyboard::Keyboard;
use super::messages::{DeviceEvent, KeyState};
use super::supervisor::EventLoop;
use super::ShutdownCoordinator;
use crate::error::FrontendError;
use crate::joystick::{Joystick, KempstonLines};
use crate::keyboard::{LogicalKey, SymbolTable};
use crate::logging::INPUT_TARGET;

/// One effect of a device event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputAction {
    /// Request application exit.
    Exit,
    /// Press a key in the matrix.
    KeyDown(LogicalKey),
    /// Release a key in the matrix.
    KeyUp(LogicalKey),
    /// Assert joystick lines.
    JoystickPress(KempstonLines),
    /// Release joystick lines.
    JoystickRelease(KempstonLines),
}

/// Translate one device event into the actions it causes, in order.
pub fn translate(symbols: &SymbolTable, event: &DeviceEvent) -> Vec<InputAction> {
    match event {
        DeviceEvent::Quit => vec![InputAction::Exit],

        DeviceEvent::Key { name, state } => {
            if name == "escape" && *state == KeyState::Down {
                return vec![InputAction::Exit];
            }
            symbols.get(name).map_or_else(Vec::new, |sequence| match state {
                KeyState::Down => sequence.press_order().map(InputAction::KeyDown).collect(),
                KeyState::Up => sequence.release_order().map(InputAction::KeyUp).collect(),
            })
        }

        DeviceEvent::JoyAxis { axis, value } => {
            let (positive, negative) = match axis {
                0 => (KempstonLines::RIGHT, KempstonLines::LEFT),
                1 => (KempstonLines::UP, KempstonLines::DOWN),
                _ => return Vec::new(),
            };
            match value.signum() {
                1 => vec![InputAction::JoystickPress(positive)],
                -1 => vec![InputAction::JoystickPress(negative)],
                _ => vec![InputAction::JoystickRelease(positive | negative)],
            }
        }

        DeviceEvent::JoyButton { button: 0, pressed } => {
            if *pressed {
                vec![InputAction::JoystickPress(KempstonLines::FIRE)]
            } else {
                vec![InputAction::JoystickRelease(KempstonLines::FIRE)]
            }
        }

        DeviceEvent::JoyButton { .. } => Vec::new(),
    }
}

/// Handle to the input dispatcher actor.
#[derive(Debug, Clone)]
pub struct InputDispatcher {
    events: Sender<DeviceEvent>,
}

impl InputDispatcher {
    /// Spawn the dispatcher.
    pub fn spawn(
        coordinator: &Arc<ShutdownCoordinator>,
        keyboard: Keyboard,
        joystick: Arc<Joystick>,
        symbols: Arc<SymbolTable>,
    ) -> Result<(Self, JoinHandle<()>), FrontendError> {
        let (events, inbox) = unbounded();
        let event_loop = EventLoop::register("input", coordinator);

        let dispatch = Dispatch {
            keyboard,
            joystick,
            symbols,
            coordinator: Arc::clone(coordinator),
        };
        let handle = thread::Builder::new()
            .name("speccy-input".to_string())
            .spawn(move || dispatch.run_loop(event_loop, &inbox))?;

        Ok((Self { events }, handle))
    }

    /// A sender device backends can feed events into.
    pub fn sender(&self) -> Sender<DeviceEvent> {
        self.events.clone()
    }

    /// Queue one event. Returns `false` once the dispatcher has stopped.
    pub fn dispatch(&self, event: DeviceEvent) -> bool {
        self.events.send(event).is_ok()
    }
}

struct Dispatch {
    keyboard: Keyboard,
    joystick: Arc<Joystick>,
    symbols: Arc<SymbolTable>,
    coordinator: Arc<ShutdownCoordinator>,
}

impl Dispatch {
    fn run_loop(&self, mut event_loop: EventLoop, inbox: &Receiver<DeviceEvent>) {
        while let Some(event) = event_loop.recv(inbox) {
            trace!(target: INPUT_TARGET, ?event, "device event");
            for action in translate(&self.symbols, &event) {
                self.apply(action);
            }
        }
    }

    fn apply(&self, action: InputAction) {
        match action {
            InputAction::Exit => {
                debug!("input -> request[exit the application]");
                self.coordinator.request_exit();
            }
            InputAction::KeyDown(key) => self.keyboard.key_down(key),
            InputAction::KeyUp(key) => self.keyboard.key_up(key),
            InputAction::JoystickPress(lines) => self.joystick.press(lines),
            InputAction::JoystickRelease(lines) => self.joystick.release(lines),
        }
    }
}
