//! End-to-end tests: the whole front-end against recording collaborators.

use std::sync::Arc;
use std::time::Duration;

use speccy_frontend::harness::{spawn_stub_core, Event, EventLog, RecordingCompositor, StubAudio, StubVideo};
use speccy_frontend::{
    Collaborators, DeviceEvent, Frontend, FrontendConfig, FrontendError, KeyState, LogicalKey, Program,
    ProgramKind, ScaleTier,
};

const SETTLE: Duration = Duration::from_secs(2);

struct Rig {
    log: EventLog,
    compositor: Arc<RecordingCompositor>,
    video: Arc<StubVideo>,
    audio: Arc<StubAudio>,
}

impl Rig {
    fn new() -> Self {
        let log = EventLog::new();
        Self {
            compositor: Arc::new(RecordingCompositor::new(&log)),
            video: Arc::new(StubVideo::new(&log)),
            audio: Arc::new(StubAudio::new(&log)),
            log,
        }
    }

    fn start(&self, config: &FrontendConfig) -> Result<Frontend, FrontendError> {
        let (core, _core_thread) = spawn_stub_core(&self.log);
        Frontend::start(
            config,
            Collaborators {
                core,
                compositor: self.compositor.clone(),
                video: self.video.clone(),
                audio: self.audio.clone(),
            },
        )
    }
}

fn fast_config() -> FrontendConfig {
    FrontendConfig {
        fps: 1000.0,
        ..FrontendConfig::default()
    }
}

#[test]
fn test_start_and_quit() {
    let rig = Rig::new();
    let frontend = rig.start(&fast_config()).unwrap();

    assert!(rig.log.wait_for(&Event::SetFps(1000.0), SETTLE));
    assert!(rig.log.contains(&Event::PaintedRegions(false)));
    assert!(rig.log.wait_for(
        &Event::AddAudioReceiver {
            frequency: 44_100,
            high_quality: true
        },
        SETTLE
    ));
    assert_eq!(rig.compositor.output(), Some(speccy_frontend::video::SurfaceId(1)));
    assert_eq!(rig.compositor.inputs().len(), 1);

    assert!(frontend.dispatch(DeviceEvent::Quit));
    frontend.wait();

    let shutdowns = rig.log.events().iter().filter(|e| **e == Event::Shutdown).count();
    assert_eq!(shutdowns, 1);
}

#[test]
fn test_escape_exits_after_earlier_events() {
    let rig = Rig::new();
    let frontend = rig.start(&fast_config()).unwrap();
    let keyboard = frontend.keyboard().clone();
    let joystick = Arc::clone(&frontend.context().joystick);

    let done = keyboard.key_press(LogicalKey::Q);
    assert_eq!(done.recv().unwrap(), LogicalKey::Q);

    frontend.dispatch(DeviceEvent::key("up", KeyState::Down));
    frontend.dispatch(DeviceEvent::JoyAxis { axis: 1, value: -300 });
    frontend.dispatch(DeviceEvent::key("escape", KeyState::Down));
    frontend.wait();

    // The dispatcher handles events in order, so everything before the
    // escape was applied.
    assert_eq!(joystick.port_value(), 0x04);
    assert!(keyboard.matrix().is_pressed(LogicalKey::CapsShift));
    assert!(keyboard.matrix().is_pressed(LogicalKey::Num7));
    assert!(!keyboard.matrix().is_pressed(LogicalKey::Q));
}

#[test]
fn test_resize_never_double_registers() {
    let rig = Rig::new();
    let frontend = rig.start(&fast_config()).unwrap();
    let renderer = frontend.renderer();

    for (scale, fullscreen) in [
        (ScaleTier::X2, false),
        (ScaleTier::X1, true),
        (ScaleTier::X1, false),
        (ScaleTier::X2, true),
    ] {
        renderer.resize_video(scale, fullscreen).unwrap();
        assert_eq!(rig.compositor.inputs().len(), 1);
        assert!(rig.compositor.output().is_some());
        assert_eq!(rig.video.live().len(), 2, "superseded surfaces are freed");
    }
    assert!(rig.compositor.violations().is_empty(), "{:?}", rig.compositor.violations());
    assert_eq!((renderer.width(), renderer.height()), (640, 512));

    frontend.request_exit();
    frontend.wait();
}

#[test]
fn test_audio_frequency_change_closes_first() {
    let rig = Rig::new();
    let frontend = rig.start(&fast_config()).unwrap();
    let initial = Event::AddAudioReceiver {
        frequency: 44_100,
        high_quality: true,
    };
    assert!(rig.log.wait_for(&initial, SETTLE));
    rig.log.clear();

    frontend.renderer().set_audio_freq(22_050).unwrap();
    let changed = Event::AddAudioReceiver {
        frequency: 22_050,
        high_quality: true,
    };
    assert!(rig.log.wait_for(&changed, SETTLE));
    assert_eq!(rig.log.audio_events(), vec![Event::CloseAllAudioReceivers, changed]);

    frontend.request_exit();
    frontend.wait();
}

#[test]
fn test_audio_failure_is_not_fatal() {
    let rig = Rig::new();
    rig.audio.set_failing(true);
    let frontend = rig.start(&fast_config()).unwrap();

    assert!(!frontend.renderer().audio().enabled);
    assert!(!frontend.exit_requested());

    frontend.request_exit();
    frontend.wait();
}

#[test]
fn test_video_failure_at_start_stops_everything() {
    let rig = Rig::new();
    rig.video.set_failing(true);

    let result = rig.start(&fast_config());
    assert!(matches!(result, Err(FrontendError::Video(_))));
    assert!(rig.log.contains(&Event::Shutdown));
}

#[test]
fn test_tape_is_loaded_after_reset() {
    let rig = Rig::new();
    let frontend = rig.start(&fast_config()).unwrap();
    let initial = Event::AddAudioReceiver {
        frequency: 44_100,
        high_quality: true,
    };
    assert!(rig.log.wait_for(&initial, SETTLE));
    rig.log.clear();

    let tape = Program {
        kind: ProgramKind::Tape,
        data: vec![1, 2, 3],
    };
    frontend.load_program("game.tap", tape).unwrap();
    assert_eq!(rig.log.events(), vec![Event::Reset, Event::Load("game.tap".to_string())]);

    rig.log.clear();
    let snapshot = Program {
        kind: ProgramKind::Snapshot,
        data: vec![],
    };
    let result = frontend.load_program("empty.sna", snapshot);
    assert!(matches!(result, Err(FrontendError::Load(_))));
    assert_eq!(rig.log.events(), vec![Event::Load("empty.sna".to_string())]);

    frontend.request_exit();
    frontend.wait();
}
