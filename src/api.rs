// Public API surface: the functions an embedding host calls.
//
// Mirrors the shape of a typical FFI-facing module — a process-wide handle
// behind a set of free functions — generalized to the engine facade's own
// start/stop/update contract.

use once_cell::sync::Lazy;
use tokio::sync::broadcast;

use crate::engine::EngineHandle;
use crate::error::EngineError;
use crate::managers::{BarChangeEvent, StateEvent};
use crate::model::{AccentGains, PartialConfig, State, TickEvent};

// Re-export error code constants for host-side matching.
pub use crate::error::EngineErrorCodes;

static ENGINE: Lazy<EngineHandle> = Lazy::new(EngineHandle::new);

/// Starts the engine. `patch` is normalized against the built-in default
/// configuration; if the engine is already running, this behaves like
/// [`update`].
pub fn start(patch: PartialConfig) -> Result<(), EngineError> {
    ENGINE.start(patch)
}

/// Stops the engine. A no-op if already idle.
pub fn stop() {
    ENGINE.stop();
}

/// Publishes a configuration patch, taking effect at the boundary the patch
/// requests (default: the next downbeat).
pub fn update(patch: PartialConfig) {
    ENGINE.update(patch);
}

/// Overrides the accent gain table, effective immediately.
pub fn set_accent_gains(overrides: AccentGains) {
    ENGINE.set_accent_gains(overrides);
}

/// Current lifecycle state.
pub fn get_status() -> State {
    ENGINE.get_status()
}

/// Schedules a single immediate `BarStrong` click. Returns whether the
/// engine accepted it.
pub fn play_test_tick() -> bool {
    ENGINE.play_test_tick()
}

/// Subscribes to the per-tick event stream.
pub fn on_tick() -> broadcast::Receiver<TickEvent> {
    ENGINE.on_tick()
}

/// Subscribes to lifecycle state transitions.
pub fn on_state() -> broadcast::Receiver<StateEvent> {
    ENGINE.on_state()
}

/// Subscribes to bar-change notifications.
pub fn on_bar_change() -> broadcast::Receiver<BarChangeEvent> {
    ENGINE.on_bar_change()
}
