//! Headless demo: drive the whole front-end against recording stubs.
//!
//! Run with `--terminal` to type into the emulated keyboard from the
//! controlling terminal; press Escape or Ctrl-C to quit. SIGTERM also
//! shuts the front-end down cleanly.

use std::sync::Arc;
use std::time::Duration;

use speccy_frontend::harness::{spawn_stub_core, EventLog, RecordingCompositor, StubAudio, StubVideo};
use speccy_frontend::{
    logging, Collaborators, DeviceEvent, Frontend, FrontendConfig, FrontendError, KeyState, LogicalKey,
    Program, ProgramKind, RomKind, ScaleTier,
};

fn main() -> Result<(), FrontendError> {
    let terminal_input = std::env::args().any(|arg| arg == "--terminal");
    let config = FrontendConfig {
        fps: 200.0,
        terminal_input,
        handle_signals: true,
        verbose: true,
        ..FrontendConfig::default()
    };
    logging::init(&config);

    let log = EventLog::new();
    let (core, _core_thread) = spawn_stub_core(&log);
    let collaborators = Collaborators {
        core,
        compositor: Arc::new(RecordingCompositor::new(&log)),
        video: Arc::new(StubVideo::new(&log)),
        audio: Arc::new(StubAudio::new(&log)),
    };

    let frontend = Frontend::start(&config, collaborators)?;
    println!("Speccy Frontend Headless Demo");
    println!("=============================");

    frontend.load_program(
        "demo.tap",
        Program {
            kind: ProgramKind::Tape,
            data: vec![0x13, 0x00],
        },
    )?;
    frontend.keyboard().send_load(RomKind::Rom48);

    let typed: Vec<_> = frontend
        .keyboard()
        .key_press_sequence(&[LogicalKey::H, LogicalKey::I, LogicalKey::Enter])
        .iter()
        .take(3)
        .collect();
    println!("Typed: {typed:?}");

    frontend.dispatch(DeviceEvent::JoyAxis { axis: 0, value: 1 });
    frontend.dispatch(DeviceEvent::key("left shift", KeyState::Down));
    std::thread::sleep(Duration::from_millis(20));
    println!("Kempston port: {:#04x}", frontend.joystick().port_value());
    println!("Row 0: {:#04x}", frontend.keyboard().key_state(0));

    frontend.renderer().resize_video(ScaleTier::X2, false)?;
    println!("Resized to {}x{}", frontend.renderer().width(), frontend.renderer().height());
    frontend.renderer().set_audio_freq(22_050)?;
    println!("Audio: {:?}", frontend.renderer().audio());

    if terminal_input {
        println!("Type away; Escape quits.\r");
    } else {
        frontend.dispatch(DeviceEvent::Quit);
    }
    frontend.wait();

    println!("Collaborator events:");
    for event in log.events() {
        println!("  {event:?}");
    }
    Ok(())
}
