//! Shutdown coordinator: the process-wide join barrier.
//!
//! Every actor registers here when it is created. A global exit request
//! is a one-way flag; raising it broadcasts terminate to every actor.
//! [`ShutdownCoordinator::wait`] blocks until each one has reported back,
//! and the first waiter through then runs the shared teardown exactly
//! once while later waiters block until it has finished.

use std::fmt;
use std::mem;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};

use tracing::{debug, info};

use super::supervisor::ActorHandle;

type Teardown = Box<dyn FnOnce() + Send>;

#[derive(Default)]
struct Barrier {
    handles: Vec<ActorHandle>,
    registered: usize,
    completed: usize,
    broadcast: bool,
    teardown: Option<Teardown>,
    tearing_down: bool,
    terminated: bool,
}

/// Join barrier over every registered actor.
pub struct ShutdownCoordinator {
    exit_requested: AtomicBool,
    barrier: Mutex<Barrier>,
    changed: Condvar,
}

impl fmt::Debug for ShutdownCoordinator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let barrier = self.lock();
        f.debug_struct("ShutdownCoordinator")
            .field("exit_requested", &self.exit_requested())
            .field("registered", &barrier.registered)
            .field("completed", &barrier.completed)
            .field("terminated", &barrier.terminated)
            .finish()
    }
}

impl Default for ShutdownCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

impl ShutdownCoordinator {
    /// Create an empty coordinator.
    pub fn new() -> Self {
        Self {
            exit_requested: AtomicBool::new(false),
            barrier: Mutex::new(Barrier::default()),
            changed: Condvar::new(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Barrier> {
        self.barrier.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register an actor's control handle.
    ///
    /// An actor registered after the terminate broadcast is told to stop
    /// straight away.
    pub fn register(&self, handle: ActorHandle) {
        let mut barrier = self.lock();
        barrier.registered += 1;
        debug!(actor = handle.name(), registered = barrier.registered, "actor registered");
        if barrier.broadcast {
            let _ = handle.request_terminate();
        } else {
            barrier.handles.push(handle);
        }
    }

    /// Set the shared-subsystem teardown run after the barrier opens.
    pub fn on_teardown(&self, teardown: impl FnOnce() + Send + 'static) {
        self.lock().teardown = Some(Box::new(teardown));
    }

    /// Raise the global exit flag and tell every actor to stop.
    ///
    /// Returns without waiting; each actor leaves at its next command
    /// boundary. Repeated calls are harmless.
    pub fn request_exit(&self) {
        if self.exit_requested.swap(true, Ordering::AcqRel) {
            return;
        }
        info!("request[exit the application]");

        let handles = {
            let mut barrier = self.lock();
            barrier.broadcast = true;
            self.changed.notify_all();
            mem::take(&mut barrier.handles)
        };
        debug!(actors = handles.len(), "broadcasting terminate");
        for handle in &handles {
            let _ = handle.request_terminate();
        }
    }

    /// Whether exit has been requested.
    pub fn exit_requested(&self) -> bool {
        self.exit_requested.load(Ordering::Acquire)
    }

    /// Whether the barrier has opened and teardown has run.
    pub fn has_terminated(&self) -> bool {
        self.lock().terminated
    }

    /// Number of registered actors.
    pub fn registered(&self) -> usize {
        self.lock().registered
    }

    /// Number of actors that have completed their terminate handshake.
    pub fn completed(&self) -> usize {
        self.lock().completed
    }

    /// Control handles of actors that have not yet been told to stop.
    pub fn handles(&self) -> Vec<ActorHandle> {
        self.lock().handles.clone()
    }

    /// Called by an actor's loop once it has left for good.
    pub fn actor_terminated(&self, name: &'static str) {
        let mut barrier = self.lock();
        barrier.completed += 1;
        debug!(
            actor = name,
            completed = barrier.completed,
            registered = barrier.registered,
            "actor terminated"
        );
        self.changed.notify_all();
    }

    /// Block until exit is requested and every actor has stopped, then
    /// run the teardown.
    ///
    /// Any number of threads may wait; all of them return only after the
    /// teardown has finished.
    pub fn wait(&self) {
        let mut barrier = self.lock();
        while !barrier.broadcast || barrier.completed < barrier.registered || barrier.tearing_down {
            barrier = self
                .changed
                .wait(barrier)
                .unwrap_or_else(PoisonError::into_inner);
        }
        if barrier.terminated {
            return;
        }

        barrier.tearing_down = true;
        let teardown = barrier.teardown.take();
        drop(barrier);

        if let Some(teardown) = teardown {
            debug!("running shared teardown");
            teardown();
        }

        let mut barrier = self.lock();
        barrier.tearing_down = false;
        barrier.terminated = true;
        info!("all event loops terminated");
        self.changed.notify_all();
    }
}
