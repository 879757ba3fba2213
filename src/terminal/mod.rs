//! Host terminal integration.

mod events;
#[cfg(unix)]
mod signals;

pub use events::TerminalEvents;
#[cfg(unix)]
pub use signals::TerminationSignals;
