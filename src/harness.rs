//! Recording stand-ins for the external collaborators.
//!
//! Every stub appends to one shared [`EventLog`], so a test can assert
//! the exact interleaving of core, compositor and backend calls.

use std::collections::BTreeSet;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam_channel::{unbounded, Receiver, Sender};

use crate::audio::{AudioBackend, AudioReceiver};
use crate::core::CoreCommand;
use crate::error::{AudioError, LoadError, VideoError};
use crate::video::{Compositor, DisplayMode, DisplaySink, Rect, Surface, SurfaceId, SurfaceRole, VideoBackend};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Something a collaborator was asked to do.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// Core: a display sink was added.
    AddDisplay(SurfaceId),
    /// Core: every display sink was detached.
    CloseAllDisplays,
    /// Core: an audio receiver was registered.
    AddAudioReceiver {
        /// Receiver frequency.
        frequency: u32,
        /// Receiver quality.
        high_quality: bool,
    },
    /// Core: every audio receiver was closed.
    CloseAllAudioReceivers,
    /// Core: emulation speed changed.
    SetFps(f32),
    /// Core: machine reset.
    Reset,
    /// Core: program loaded.
    Load(String),
    /// Compositor: input surface registered.
    InputAdded(SurfaceId),
    /// Compositor: every input surface dropped.
    InputsRemoved,
    /// Compositor: output surface set or cleared.
    OutputReplaced(Option<SurfaceId>),
    /// Compositor: painted-region highlighting toggled.
    PaintedRegions(bool),
    /// Video: output surface opened.
    OutputOpened(SurfaceId),
    /// Video: display surface opened.
    DisplayOpened(SurfaceId),
    /// Video: surface freed.
    Released(SurfaceId),
    /// Video: backend shut down.
    Shutdown,
    /// Audio: receiver opened by the backend.
    AudioOpened {
        /// Requested frequency.
        frequency: u32,
        /// Requested quality.
        high_quality: bool,
    },
}

/// Shared, ordered event recorder.
#[derive(Debug, Clone, Default)]
pub struct EventLog(Arc<Mutex<Vec<Event>>>);

impl EventLog {
    /// Create an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an event.
    pub fn push(&self, event: Event) {
        lock(&self.0).push(event);
    }

    /// Everything recorded so far.
    pub fn events(&self) -> Vec<Event> {
        lock(&self.0).clone()
    }

    /// Forget everything recorded so far.
    pub fn clear(&self) {
        lock(&self.0).clear();
    }

    /// Whether `event` was recorded.
    pub fn contains(&self, event: &Event) -> bool {
        lock(&self.0).contains(event)
    }

    /// Poll until `event` is recorded. Returns `false` on timeout.
    ///
    /// Fire-and-forget commands reach the stub core asynchronously.
    pub fn wait_for(&self, event: &Event, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        while !self.contains(event) {
            if Instant::now() >= deadline {
                return false;
            }
            thread::sleep(Duration::from_millis(1));
        }
        true
    }

    /// Only the core's audio receiver events, in order.
    pub fn audio_events(&self) -> Vec<Event> {
        lock(&self.0)
            .iter()
            .filter(|e| matches!(e, Event::CloseAllAudioReceivers | Event::AddAudioReceiver { .. }))
            .cloned()
            .collect()
    }
}

#[derive(Debug, Default)]
struct Registrations {
    inputs: Vec<SurfaceId>,
    output: Option<SurfaceId>,
    painted_regions: bool,
    violations: Vec<String>,
}

/// Compositor double that tracks live registrations.
///
/// Registering a second surface of a role that is already filled is
/// recorded as a violation.
#[derive(Debug)]
pub struct RecordingCompositor {
    log: EventLog,
    state: Mutex<Registrations>,
}

impl RecordingCompositor {
    /// Create a compositor recording into `log`.
    pub fn new(log: &EventLog) -> Self {
        Self {
            log: log.clone(),
            state: Mutex::new(Registrations::default()),
        }
    }

    /// Registered input surfaces.
    pub fn inputs(&self) -> Vec<SurfaceId> {
        lock(&self.state).inputs.clone()
    }

    /// Registered output surface.
    pub fn output(&self) -> Option<SurfaceId> {
        lock(&self.state).output
    }

    /// Whether painted regions are highlighted.
    pub fn painted_regions(&self) -> bool {
        lock(&self.state).painted_regions
    }

    /// Every double registration seen so far.
    pub fn violations(&self) -> Vec<String> {
        lock(&self.state).violations.clone()
    }
}

impl Compositor for RecordingCompositor {
    fn add_input_surface(&self, surface: &Surface, _x: i32, _y: i32) {
        let mut state = lock(&self.state);
        if !state.inputs.is_empty() {
            let message = format!("{:?} added while {:?} registered", surface.id(), state.inputs);
            state.violations.push(message);
        }
        state.inputs.push(surface.id());
        self.log.push(Event::InputAdded(surface.id()));
    }

    fn remove_all_input_surfaces(&self) {
        lock(&self.state).inputs.clear();
        self.log.push(Event::InputsRemoved);
    }

    fn replace_output_surface(&self, surface: Option<&Surface>) {
        let mut state = lock(&self.state);
        let id = surface.map(Surface::id);
        if let (Some(new), Some(old)) = (id, state.output) {
            state.violations.push(format!("output {new:?} set over {old:?}"));
        }
        state.output = id;
        self.log.push(Event::OutputReplaced(id));
    }

    fn show_painted_regions(&self, enable: bool) {
        lock(&self.state).painted_regions = enable;
        self.log.push(Event::PaintedRegions(enable));
    }
}

/// Video backend double handing out numbered surfaces.
#[derive(Debug)]
pub struct StubVideo {
    log: EventLog,
    next_id: AtomicU64,
    failing: AtomicBool,
    live: Mutex<BTreeSet<SurfaceId>>,
}

impl StubVideo {
    /// Create a backend recording into `log`. Ids start at 1.
    pub fn new(log: &EventLog) -> Self {
        Self {
            log: log.clone(),
            next_id: AtomicU64::new(1),
            failing: AtomicBool::new(false),
            live: Mutex::new(BTreeSet::new()),
        }
    }

    /// Make every following open fail (or succeed again).
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::Release);
    }

    /// Surfaces opened and not yet released, in id order.
    pub fn live(&self) -> Vec<SurfaceId> {
        lock(&self.live).iter().copied().collect()
    }

    fn allocate(&self) -> Result<SurfaceId, VideoError> {
        if self.failing.load(Ordering::Acquire) {
            return Err(VideoError("cannot set video mode".to_string()));
        }
        let id = SurfaceId(self.next_id.fetch_add(1, Ordering::AcqRel));
        lock(&self.live).insert(id);
        Ok(id)
    }
}

impl VideoBackend for StubVideo {
    fn open_output(&self, mode: DisplayMode) -> Result<Surface, VideoError> {
        let id = self.allocate()?;
        let (width, height) = mode.dimensions();
        self.log.push(Event::OutputOpened(id));
        Ok(Surface::new(id, SurfaceRole::Output, width, height))
    }

    fn open_display(&self, mode: DisplayMode) -> Result<(Surface, DisplaySink), VideoError> {
        let id = self.allocate()?;
        let (width, height) = mode.dimensions();
        self.log.push(Event::DisplayOpened(id));
        Ok(DisplaySink::pair(id, width, height))
    }

    fn release(&self, surface: Surface) {
        lock(&self.live).remove(&surface.id());
        self.log.push(Event::Released(surface.id()));
    }

    fn shutdown(&self) {
        self.log.push(Event::Shutdown);
    }
}

/// Receiver handed out by [`StubAudio`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StubReceiver {
    frequency: u32,
    high_quality: bool,
}

impl AudioReceiver for StubReceiver {
    fn frequency(&self) -> u32 {
        self.frequency
    }

    fn high_quality(&self) -> bool {
        self.high_quality
    }
}

/// Audio backend double. Can be told to fail.
#[derive(Debug)]
pub struct StubAudio {
    log: EventLog,
    failing: AtomicBool,
}

impl StubAudio {
    /// Create a backend recording into `log`.
    pub fn new(log: &EventLog) -> Self {
        Self {
            log: log.clone(),
            failing: AtomicBool::new(false),
        }
    }

    /// Make every following open fail (or succeed again).
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::Release);
    }
}

impl AudioBackend for StubAudio {
    fn open(&self, frequency: u32, high_quality: bool) -> Result<Box<dyn AudioReceiver>, AudioError> {
        if self.failing.load(Ordering::Acquire) {
            return Err(AudioError("no audio device".to_string()));
        }
        self.log.push(Event::AudioOpened {
            frequency,
            high_quality,
        });
        Ok(Box::new(StubReceiver {
            frequency,
            high_quality,
        }))
    }
}

/// Spawn a core that consumes commands serially and acks every
/// blocking one. It exits once every sender is dropped.
///
/// Loading an empty image fails.
pub fn spawn_stub_core(log: &EventLog) -> (Sender<CoreCommand>, JoinHandle<()>) {
    let (commands, inbox) = unbounded();
    let log = log.clone();
    let handle = thread::spawn(move || run_stub_core(&log, &inbox));
    (commands, handle)
}

fn run_stub_core(log: &EventLog, inbox: &Receiver<CoreCommand>) {
    let mut displays: Vec<DisplaySink> = Vec::new();
    let mut receivers: Vec<Box<dyn AudioReceiver>> = Vec::new();

    for command in inbox {
        match command {
            CoreCommand::AddDisplay(sink) => {
                log.push(Event::AddDisplay(sink.surface()));
                let (width, height) = sink.size();
                let full = Rect::new(
                    0,
                    0,
                    u16::try_from(width).unwrap_or(u16::MAX),
                    u16::try_from(height).unwrap_or(u16::MAX),
                );
                sink.notify(vec![full]);
                displays.push(sink);
            }
            CoreCommand::CloseAllDisplays(done) => {
                displays.clear();
                log.push(Event::CloseAllDisplays);
                let _ = done.send(());
            }
            CoreCommand::AddAudioReceiver(receiver) => {
                log.push(Event::AddAudioReceiver {
                    frequency: receiver.frequency(),
                    high_quality: receiver.high_quality(),
                });
                receivers.push(receiver);
            }
            CoreCommand::CloseAllAudioReceivers(done) => {
                receivers.clear();
                log.push(Event::CloseAllAudioReceivers);
                let _ = done.send(());
            }
            CoreCommand::SetFps(fps) => log.push(Event::SetFps(fps)),
            CoreCommand::Reset(done) => {
                log.push(Event::Reset);
                let _ = done.send(());
            }
            CoreCommand::Load { name, program, done } => {
                log.push(Event::Load(name.clone()));
                let result = if program.data.is_empty() {
                    Err(LoadError(format!("{name}: empty image")))
                } else {
                    Ok(())
                };
                let _ = done.send(result);
            }
        }
    }
}
