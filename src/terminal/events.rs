//! Terminal event source: host keys read from the controlling terminal.
//!
//! Polls crossterm on its own thread and forwards named device keys to the
//! input dispatcher. Most terminals only report presses; for those a
//! release is synthesised right after each press.

use std::io;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::Sender;
use crossterm::event::{
    self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, KeyboardEnhancementFlags,
    PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
};
use crossterm::{execute, terminal};
use tracing::{debug, warn};

use crate::actor::{ActorState, DeviceEvent, EventLoop, KeyState, ShutdownCoordinator};
use crate::error::FrontendError;

/// Raw mode (and release reporting, when available) for the lifetime of
/// the source.
struct TerminalMode {
    enhanced: bool,
}

impl TerminalMode {
    fn enter() -> io::Result<Self> {
        terminal::enable_raw_mode()?;
        let enhanced = terminal::supports_keyboard_enhancement().unwrap_or(false)
            && execute!(
                io::stdout(),
                PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::REPORT_EVENT_TYPES)
            )
            .is_ok();
        Ok(Self { enhanced })
    }
}

impl Drop for TerminalMode {
    fn drop(&mut self) {
        if self.enhanced {
            let _ = execute!(io::stdout(), PopKeyboardEnhancementFlags);
        }
        let _ = terminal::disable_raw_mode();
    }
}

/// Converts crossterm events into device events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TerminalEvents {
    reports_release: bool,
}

impl TerminalEvents {
    /// Create a converter. Without release reporting every press is
    /// followed by a synthetic release.
    pub const fn new(reports_release: bool) -> Self {
        Self { reports_release }
    }

    /// Put the terminal in raw mode and spawn the polling actor.
    ///
    /// # Errors
    ///
    /// [`FrontendError::Terminal`] if raw mode cannot be entered, or
    /// [`FrontendError::Spawn`] if the thread cannot be started.
    pub fn spawn(
        coordinator: &Arc<ShutdownCoordinator>,
        sink: Sender<DeviceEvent>,
        poll_timeout: Duration,
    ) -> Result<JoinHandle<()>, FrontendError> {
        let mode = TerminalMode::enter().map_err(FrontendError::Terminal)?;
        let events = Self::new(mode.enhanced);
        debug!(reports_release = mode.enhanced, "terminal input enabled");

        let event_loop = EventLoop::register("terminal", coordinator);
        let handle = thread::Builder::new()
            .name("speccy-terminal".to_string())
            .spawn(move || {
                let _mode = mode;
                events.run_loop(event_loop, &sink, poll_timeout);
            })?;
        Ok(handle)
    }

    fn run_loop(self, mut event_loop: EventLoop, sink: &Sender<DeviceEvent>, poll_timeout: Duration) {
        while event_loop.poll() == ActorState::Running {
            match event::poll(poll_timeout) {
                Ok(true) => match event::read() {
                    Ok(event) => {
                        for device_event in self.convert(&event) {
                            let _ = sink.send(device_event);
                        }
                    }
                    Err(e) => warn!(error = %e, "terminal read failed"),
                },
                Ok(false) => {}
                Err(e) => {
                    warn!(error = %e, "terminal poll failed");
                    thread::sleep(poll_timeout);
                }
            }
        }
    }

    /// Convert one crossterm event. Ctrl-C becomes a quit request.
    pub fn convert(&self, event: &Event) -> Vec<DeviceEvent> {
        let Event::Key(key) = event else {
            return Vec::new();
        };
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            return match key.kind {
                KeyEventKind::Press => vec![DeviceEvent::Quit],
                _ => Vec::new(),
            };
        }

        let chord = Self::chord(key);
        if chord.is_empty() {
            return Vec::new();
        }
        let press = || chord.iter().map(|name| DeviceEvent::key(name.clone(), KeyState::Down));
        let release = || chord.iter().rev().map(|name| DeviceEvent::key(name.clone(), KeyState::Up));

        match key.kind {
            KeyEventKind::Press if self.reports_release => press().collect(),
            KeyEventKind::Press => press().chain(release()).collect(),
            KeyEventKind::Release => release().collect(),
            KeyEventKind::Repeat => Vec::new(),
        }
    }

    /// Device key names for a key, modifiers first.
    fn chord(key: &KeyEvent) -> Vec<String> {
        let (name, shifted) = match key.code {
            KeyCode::Char(' ') => ("space".to_string(), false),
            KeyCode::Char(c) if c.is_ascii_uppercase() => (c.to_ascii_lowercase().to_string(), true),
            KeyCode::Char(c) => (c.to_string(), false),
            KeyCode::Enter => ("return".to_string(), false),
            KeyCode::Backspace => ("backspace".to_string(), false),
            KeyCode::Esc => ("escape".to_string(), false),
            KeyCode::Left => ("left".to_string(), false),
            KeyCode::Right => ("right".to_string(), false),
            KeyCode::Up => ("up".to_string(), false),
            KeyCode::Down => ("down".to_string(), false),
            _ => return Vec::new(),
        };

        let mut chord = Vec::with_capacity(3);
        if key.modifiers.contains(KeyModifiers::CONTROL) {
            chord.push("left ctrl".to_string());
        }
        if shifted {
            chord.push("left shift".to_string());
        }
        chord.push(name);
        chord
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn press(code: KeyCode, modifiers: KeyModifiers) -> Event {
        Event::Key(KeyEvent::new(code, modifiers))
    }

    fn names(events: &[DeviceEvent]) -> Vec<(String, KeyState)> {
        events
            .iter()
            .map(|e| match e {
                DeviceEvent::Key { name, state } => (name.clone(), *state),
                other => panic!("unexpected {other:?}"),
            })
            .collect()
    }

    #[test]
    fn test_press_only_terminal_synthesises_release() {
        let events = TerminalEvents::new(false).convert(&press(KeyCode::Char('a'), KeyModifiers::NONE));
        assert_eq!(
            names(&events),
            vec![("a".to_string(), KeyState::Down), ("a".to_string(), KeyState::Up)]
        );
    }

    #[test]
    fn test_uppercase_adds_shift() {
        let events = TerminalEvents::new(true).convert(&press(KeyCode::Char('Q'), KeyModifiers::SHIFT));
        assert_eq!(
            names(&events),
            vec![
                ("left shift".to_string(), KeyState::Down),
                ("q".to_string(), KeyState::Down)
            ]
        );

        let release = Event::Key(KeyEvent::new_with_kind(
            KeyCode::Char('Q'),
            KeyModifiers::SHIFT,
            KeyEventKind::Release,
        ));
        assert_eq!(
            names(&TerminalEvents::new(true).convert(&release)),
            vec![
                ("q".to_string(), KeyState::Up),
                ("left shift".to_string(), KeyState::Up)
            ]
        );
    }

    #[test]
    fn test_named_keys() {
        let events = TerminalEvents::new(true);
        let first = |code| names(&events.convert(&press(code, KeyModifiers::NONE)))[0].0.clone();
        assert_eq!(first(KeyCode::Enter), "return");
        assert_eq!(first(KeyCode::Char(' ')), "space");
        assert_eq!(first(KeyCode::Esc), "escape");
        assert_eq!(first(KeyCode::Left), "left");
        assert!(events.convert(&press(KeyCode::F(5), KeyModifiers::NONE)).is_empty());
        assert!(events.convert(&Event::FocusGained).is_empty());
    }

    #[test]
    fn test_ctrl_c_quits() {
        let events = TerminalEvents::new(false).convert(&press(KeyCode::Char('c'), KeyModifiers::CONTROL));
        assert_eq!(events, vec![DeviceEvent::Quit]);
    }
}
