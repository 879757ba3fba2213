//! Termination signals: SIGINT and SIGTERM become a global exit request.
//!
//! signal-hook delivers signals on a blocking iterator, which cannot also
//! watch the terminate channel. A small forwarder thread drains the
//! iterator into a channel and the actor loop reads that channel; when the
//! actor terminates it closes the iterator so the forwarder ends too.

use std::io;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam_channel::{unbounded, Receiver};
use signal_hook::consts::signal::{SIGINT, SIGTERM};
use signal_hook::iterator::{Handle, Signals};
use tracing::{debug, info};

use crate::actor::{EventLoop, ShutdownCoordinator};
use crate::error::FrontendError;

/// Turns SIGINT and SIGTERM into [`ShutdownCoordinator::request_exit`].
#[derive(Debug)]
pub struct TerminationSignals {
    handle: Handle,
    forwarder: JoinHandle<()>,
    coordinator: Arc<ShutdownCoordinator>,
}

impl TerminationSignals {
    /// Install the handlers and spawn the signal actor.
    ///
    /// Once installed, the default action of these signals is not
    /// restored, even after the actor has stopped.
    ///
    /// # Errors
    ///
    /// [`FrontendError::Signal`] if the handlers cannot be installed, or
    /// [`FrontendError::Spawn`] if a thread cannot be started.
    pub fn spawn(coordinator: &Arc<ShutdownCoordinator>) -> Result<JoinHandle<()>, FrontendError> {
        let mut signals =
            Signals::new([SIGINT, SIGTERM]).map_err(|e| FrontendError::Signal(io::Error::other(e)))?;
        let handle = signals.handle();

        let (tx, rx) = unbounded();
        let forwarder = thread::Builder::new()
            .name("speccy-signal-hook".to_string())
            .spawn(move || {
                for signal in signals.forever() {
                    if tx.send(signal).is_err() {
                        break;
                    }
                }
            });
        let forwarder = match forwarder {
            Ok(forwarder) => forwarder,
            Err(e) => {
                handle.close();
                return Err(e.into());
            }
        };

        let event_loop = EventLoop::register("signals", coordinator);
        let actor = Self {
            handle: handle.clone(),
            forwarder,
            coordinator: Arc::clone(coordinator),
        };
        let spawned = thread::Builder::new()
            .name("speccy-signals".to_string())
            .spawn(move || actor.run_loop(event_loop, &rx));
        spawned.map_err(|e| {
            handle.close();
            e.into()
        })
    }

    fn run_loop(self, mut event_loop: EventLoop, signals: &Receiver<i32>) {
        while let Some(signal) = event_loop.recv(signals) {
            info!(signal, "termination signal received");
            self.coordinator.request_exit();
        }

        self.handle.close();
        let _ = self.forwarder.join();
        debug!("signal handlers closed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, Instant};

    #[test]
    fn test_sigterm_requests_exit() {
        let coordinator = Arc::new(ShutdownCoordinator::new());
        let handle = TerminationSignals::spawn(&coordinator).unwrap();

        signal_hook::low_level::raise(SIGTERM).unwrap();
        let deadline = Instant::now() + Duration::from_secs(2);
        while !coordinator.exit_requested() && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(1));
        }
        assert!(coordinator.exit_requested());

        coordinator.wait();
        handle.join().unwrap();
        assert!(coordinator.has_terminated());
    }
}
