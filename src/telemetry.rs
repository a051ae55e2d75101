//! `tracing` subscriber bootstrap for hosts that do not install their own.

#[cfg(test)]
#[path = "telemetry_test.rs"]
mod telemetry_test;

use std::panic;
use std::sync::Once;

use tracing::{Level, debug, error};

use crate::config::EngineConfig;

static PANIC_HOOK: Once = Once::new();

/// Install a fmt subscriber at the configured level, plus [`install_panic_hook`].
///
/// Returns `false` when a global subscriber was already installed, in which
/// case the existing one stays and no hook is installed. An invalid level
/// falls back to `info`.
pub fn init(config: &EngineConfig) -> bool {
    let level = config.level().unwrap_or(Level::INFO);
    let installed = tracing_subscriber::fmt().with_max_level(level).with_target(false).try_init().is_ok();
    if installed {
        install_panic_hook();
        debug!(%level, "telemetry: subscriber installed");
    }
    installed
}

/// Report panics through `tracing` instead of the default stderr hook.
///
/// Fog clipping catches panics raised inside the geometry library and turns
/// them into warnings, but the default hook still prints each one. Hosts
/// that bring their own subscriber should call this once after installing it.
pub fn install_panic_hook() {
    PANIC_HOOK.call_once(|| {
        panic::set_hook(Box::new(|info| {
            error!(panic = %info, "telemetry: panic");
        }));
        debug!("telemetry: panic hook installed");
    });
}
