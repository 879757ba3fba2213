//! Logging setup.
//!
//! Library code only emits `tracing` events. Binaries and demos call
//! [`init`] once to print them.

use tracing_subscriber::EnvFilter;

use crate::config::FrontendConfig;

/// Target of the per-event device input traces.
pub const INPUT_TARGET: &str = "speccy_frontend::input";

/// Filter directives for `config`, used when `RUST_LOG` is unset.
pub fn default_directives(config: &FrontendConfig) -> String {
    let level = if config.verbose { "debug" } else { "info" };
    if config.verbose_input {
        format!("{level},{INPUT_TARGET}=trace")
    } else {
        level.to_string()
    }
}

/// Install a formatting subscriber on stderr.
///
/// `RUST_LOG` takes precedence over the configured verbosity. Calling this
/// again once a subscriber is installed does nothing.
pub fn init(config: &FrontendConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(config)));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_thread_names(true)
        .try_init();
}
