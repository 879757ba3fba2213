//! Supervisor: the checkpoint/terminate protocol shared by every actor.
//!
//! Each actor owns one typed command inbox plus two control channels. The
//! control channels are serviced between commands only, so a command in
//! progress always runs to completion.
//!
//! ```text
//!  caller                         actor thread
//!  ──────                         ────────────
//!  checkpoint() ── Sender<()> ──▶ [between commands] ── () ──▶ caller resumes
//!  terminate()  ── Sender<()> ──▶ [between commands] ── () ──▶ caller resumes
//!                                  └─ report to coordinator, leave loop
//! ```

use std::sync::Arc;

use crossbeam_channel::{bounded, select, Receiver, Sender, TryRecvError};
use tracing::debug;

use super::shutdown::ShutdownCoordinator;
use crate::error::FrontendError;

/// What woke a blocked actor.
enum Wake<T> {
    Terminate(Option<Sender<()>>),
    Checkpoint(Option<Sender<()>>),
    Command(Option<T>),
}

/// Lifecycle of an actor loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActorState {
    /// Accepting commands.
    Running,
    /// Left its loop for good.
    Terminated,
}

/// Caller-side half of an actor's control channels.
#[derive(Debug, Clone)]
pub struct ActorHandle {
    name: &'static str,
    checkpoint: Sender<Sender<()>>,
    terminate: Sender<Sender<()>>,
}

impl ActorHandle {
    /// The actor's name.
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Block until the actor is idle between commands.
    ///
    /// The actor answers and carries on; nothing is suspended.
    pub fn checkpoint(&self) -> Result<(), FrontendError> {
        Self::round_trip(self.name, &self.checkpoint)
    }

    /// Stop the actor and block until it has left its loop.
    pub fn terminate(&self) -> Result<(), FrontendError> {
        Self::round_trip(self.name, &self.terminate)
    }

    /// Ask the actor to stop without waiting.
    ///
    /// Returns the acknowledgment channel, or `None` if the actor is gone.
    pub fn request_terminate(&self) -> Option<Receiver<()>> {
        let (done, ack) = bounded(1);
        self.terminate.send(done).ok().map(|()| ack)
    }

    fn round_trip(name: &'static str, channel: &Sender<Sender<()>>) -> Result<(), FrontendError> {
        let (done, ack) = bounded(1);
        channel
            .send(done)
            .map_err(|_| FrontendError::Disconnected(name))?;
        ack.recv().map_err(|_| FrontendError::Disconnected(name))
    }
}

/// Actor-side half of the control protocol.
///
/// Created on the spawning thread (which registers the actor with the
/// coordinator) and then moved into the actor's thread.
#[derive(Debug)]
pub struct EventLoop {
    name: &'static str,
    checkpoint: Receiver<Sender<()>>,
    terminate: Receiver<Sender<()>>,
    coordinator: Arc<ShutdownCoordinator>,
    state: ActorState,
}

impl EventLoop {
    /// Create the control channels for `name` and register the actor.
    pub fn register(name: &'static str, coordinator: &Arc<ShutdownCoordinator>) -> Self {
        let (checkpoint_tx, checkpoint) = bounded(1);
        let (terminate_tx, terminate) = bounded(1);

        coordinator.register(ActorHandle {
            name,
            checkpoint: checkpoint_tx,
            terminate: terminate_tx,
        });

        Self {
            name,
            checkpoint,
            terminate,
            coordinator: Arc::clone(coordinator),
            state: ActorState::Running,
        }
    }

    /// The actor's name.
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Current lifecycle state.
    pub const fn state(&self) -> ActorState {
        self.state
    }

    /// Service any pending control requests without blocking.
    ///
    /// Terminate takes priority over checkpoint.
    pub fn poll(&mut self) -> ActorState {
        if self.state == ActorState::Running {
            match self.terminate.try_recv() {
                Ok(ack) => self.terminate(Some(ack)),
                Err(TryRecvError::Disconnected) => self.terminate(None),
                Err(TryRecvError::Empty) => {}
            }
        }
        if self.state == ActorState::Running {
            while let Ok(ack) = self.checkpoint.try_recv() {
                Self::echo(&ack);
            }
        }
        self.state
    }

    /// Wait for the next command.
    ///
    /// Control requests arriving meanwhile are served in place. Returns
    /// `None` once the actor has terminated; the caller must then leave
    /// its loop. If every command sender is dropped the actor keeps
    /// serving control until it is told to terminate.
    pub fn recv<T>(&mut self, inbox: &Receiver<T>) -> Option<T> {
        loop {
            if self.poll() == ActorState::Terminated {
                return None;
            }

            let wake = select! {
                recv(self.terminate) -> msg => Wake::Terminate(msg.ok()),
                recv(self.checkpoint) -> msg => Wake::Checkpoint(msg.ok()),
                recv(inbox) -> msg => Wake::Command(msg.ok()),
            };

            match wake {
                Wake::Terminate(ack) => {
                    self.terminate(ack);
                    return None;
                }
                Wake::Checkpoint(Some(ack)) => Self::echo(&ack),
                Wake::Checkpoint(None) => {
                    self.terminate(None);
                    return None;
                }
                Wake::Command(Some(command)) => return Some(command),
                Wake::Command(None) => {
                    self.idle_until_terminated();
                    return None;
                }
            }
        }
    }

    fn idle_until_terminated(&mut self) {
        debug!(actor = self.name, "inbox closed, waiting for terminate");
        while self.state == ActorState::Running {
            let wake = select! {
                recv(self.terminate) -> msg => Wake::<()>::Terminate(msg.ok()),
                recv(self.checkpoint) -> msg => Wake::Checkpoint(msg.ok()),
            };

            match wake {
                Wake::Checkpoint(Some(ack)) => Self::echo(&ack),
                Wake::Terminate(ack) => self.terminate(ack),
                Wake::Checkpoint(None) | Wake::Command(_) => self.terminate(None),
            }
        }
    }

    fn echo(ack: &Sender<()>) {
        let _ = ack.send(());
    }

    fn terminate(&mut self, ack: Option<Sender<()>>) {
        debug!("{} event loop: exit", self.name);
        if let Some(ack) = ack {
            Self::echo(&ack);
        }
        self.state = ActorState::Terminated;
        self.coordinator.actor_terminated(self.name);
    }
}

impl Drop for EventLoop {
    fn drop(&mut self) {
        // An actor that bails out early still counts as finished.
        if self.state == ActorState::Running {
            self.state = ActorState::Terminated;
            self.coordinator.actor_terminated(self.name);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use std::time::Duration;

    fn spawn_echo(
        coordinator: &Arc<ShutdownCoordinator>,
    ) -> (Sender<u32>, Receiver<u32>, thread::JoinHandle<ActorState>) {
        let mut event_loop = EventLoop::register("echo", coordinator);
        let (cmd_tx, cmd_rx) = bounded::<u32>(8);
        let (out_tx, out_rx) = bounded::<u32>(8);
        let handle = thread::spawn(move || {
            while let Some(n) = event_loop.recv(&cmd_rx) {
                out_tx.send(n * 2).unwrap();
            }
            event_loop.state()
        });
        (cmd_tx, out_rx, handle)
    }

    #[test]
    fn test_checkpoint_does_not_stop_actor() {
        let coordinator = Arc::new(ShutdownCoordinator::new());
        let (cmd_tx, out_rx, handle) = spawn_echo(&coordinator);
        let actor = coordinator.handles().pop().unwrap();

        cmd_tx.send(1).unwrap();
        actor.checkpoint().unwrap();
        actor.checkpoint().unwrap();
        cmd_tx.send(2).unwrap();

        assert_eq!(out_rx.recv().unwrap(), 2);
        assert_eq!(out_rx.recv().unwrap(), 4);

        actor.terminate().unwrap();
        assert_eq!(handle.join().unwrap(), ActorState::Terminated);
        assert_eq!(coordinator.completed(), 1);
    }

    #[test]
    fn test_checkpoint_waits_for_command_in_progress() {
        let coordinator = Arc::new(ShutdownCoordinator::new());
        let mut event_loop = EventLoop::register("gated", &coordinator);
        let (cmd_tx, cmd_rx) = bounded::<(Sender<()>, Receiver<()>)>(1);
        let handle = thread::spawn(move || {
            while let Some((entered, gate)) = event_loop.recv(&cmd_rx) {
                let _ = entered.send(());
                let _ = gate.recv();
            }
        });
        let actor = coordinator.handles().pop().unwrap();

        let (open, gate) = bounded::<()>(1);
        let (entered_tx, entered) = bounded::<()>(1);
        cmd_tx.send((entered_tx, gate)).unwrap();
        entered.recv().unwrap();

        let checkpoint = {
            let actor = actor.clone();
            thread::spawn(move || actor.checkpoint())
        };
        thread::sleep(Duration::from_millis(30));
        assert!(!checkpoint.is_finished(), "checkpoint answered mid-command");

        open.send(()).unwrap();
        checkpoint.join().unwrap().unwrap();

        actor.terminate().unwrap();
        handle.join().unwrap();
    }

    #[test]
    fn test_terminate_is_final() {
        let coordinator = Arc::new(ShutdownCoordinator::new());
        let (cmd_tx, out_rx, handle) = spawn_echo(&coordinator);
        let actor = coordinator.handles().pop().unwrap();

        actor.terminate().unwrap();
        handle.join().unwrap();

        // Commands after terminate are never processed.
        let _ = cmd_tx.send(5);
        assert!(out_rx.recv_timeout(Duration::from_millis(20)).is_err());
        assert!(actor.checkpoint().is_err());
    }

    #[test]
    fn test_closed_inbox_waits_for_terminate() {
        let coordinator = Arc::new(ShutdownCoordinator::new());
        let (cmd_tx, _out_rx, handle) = spawn_echo(&coordinator);
        let actor = coordinator.handles().pop().unwrap();

        drop(cmd_tx);
        actor.checkpoint().unwrap();
        assert!(!handle.is_finished());

        actor.terminate().unwrap();
        handle.join().unwrap();
        assert_eq!(coordinator.completed(), 1);
    }

    #[test]
    fn test_dropped_loop_reports_completion() {
        let coordinator = Arc::new(ShutdownCoordinator::new());
        let event_loop = EventLoop::register("early", &coordinator);
        drop(event_loop);
        assert_eq!(coordinator.registered(), 1);
        assert_eq!(coordinator.completed(), 1);
    }
}
