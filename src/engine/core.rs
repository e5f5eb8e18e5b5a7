//! EngineHandle: the Engine Facade (spec §4.F).
//!
//! Presents `start`/`stop`/`update`/`set_accent_gains`/`get_status`/
//! `play_test_tick` to callers, owns the active backend (push synthesizer or
//! pull scheduler, chosen at compile time per target), and routes tick/
//! state/bar-change events to subscribers over the same broadcast-channel
//! shape the teacher used for its classification/calibration/telemetry
//! streams.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, Mutex};

use tokio::sync::broadcast;

use crate::adapter::RhythmAdapter;
use crate::config::EngineSettings;
use crate::engine::backend::{AtomicAccentGains, AudioBackend, EngineStartContext, PendingSlot};
use crate::error::{log_engine_error, EngineError, ErrorCode};
use crate::managers::{BarChangeEvent, BroadcastChannelManager, StateEvent};
use crate::model::{AccentGains, ApplyBoundary, EngineConfig, PartialConfig, State};
use crate::normalize::{default_config, normalize};

/// EngineHandle orchestrates the active backend and the shared subscription
/// channels, and tracks the public lifecycle state (spec §4.F's
/// `Idle -> Starting -> Running -> Stopping -> Idle`, with `Error` reachable
/// from any state).
pub struct EngineHandle {
    backend: Arc<dyn AudioBackend>,
    broadcasts: BroadcastChannelManager,
    adapter: RhythmAdapter,
    base_config: Mutex<EngineConfig>,
    pending: Arc<PendingSlot>,
    gains: Arc<AtomicAccentGains>,
    settings: EngineSettings,
    state: AtomicU8,
}

impl EngineHandle {
    /// Creates a new, idle `EngineHandle` with platform defaults: the `cpal`
    /// push synthesizer on desktop targets, the Web Audio pull scheduler on
    /// `wasm32` builds compiled with the `web` feature, and a deterministic
    /// stub otherwise (non-desktop builds, CLI tooling without a sound card).
    pub fn new() -> Self {
        Self {
            backend: Self::create_backend(),
            broadcasts: BroadcastChannelManager::new(),
            adapter: RhythmAdapter::new(),
            base_config: Mutex::new(default_config()),
            pending: Arc::new(PendingSlot::new()),
            gains: Arc::new(AtomicAccentGains::default()),
            settings: EngineSettings::load(),
            state: AtomicU8::new(State::Idle as u8),
        }
    }

    #[cfg(all(target_arch = "wasm32", feature = "web"))]
    fn create_backend() -> Arc<dyn AudioBackend> {
        Arc::new(crate::engine::backend::web::WebBackend::new())
    }

    #[cfg(all(not(target_arch = "wasm32"), feature = "desktop"))]
    fn create_backend() -> Arc<dyn AudioBackend> {
        Arc::new(crate::engine::backend::cpal::CpalBackend::new())
    }

    #[cfg(not(any(
        all(target_arch = "wasm32", feature = "web"),
        all(not(target_arch = "wasm32"), feature = "desktop")
    )))]
    fn create_backend() -> Arc<dyn AudioBackend> {
        Arc::new(crate::engine::backend::stub::StubBackend::new())
    }

    fn state(&self) -> State {
        match self.state.load(Ordering::SeqCst) {
            0 => State::Idle,
            1 => State::Starting,
            2 => State::Running,
            3 => State::Stopping,
            _ => State::Error,
        }
    }

    fn set_state(&self, state: State, detail: Option<String>) {
        self.state.store(state as u8, Ordering::SeqCst);
        let _ = self.broadcasts.state_sender().send(StateEvent { state, detail });
    }

    // ========================================================================
    // PUBLIC API (spec §6)
    // ========================================================================

    /// Starts the engine with `patch` normalized against the built-in
    /// default configuration. If the engine is already running, this is
    /// equivalent to `update(patch)` — the caller's preferred apply boundary
    /// (default `NextBar`) is honored rather than restarting the backend.
    pub fn start(&self, patch: PartialConfig) -> Result<(), EngineError> {
        if matches!(self.state(), State::Running | State::Starting) {
            self.update(patch);
            return Ok(());
        }

        self.set_state(State::Starting, None);

        let base = { self.base_config.lock().unwrap().clone() };
        let normalized = normalize(&base, &patch);

        let ctx = EngineStartContext {
            initial_config: normalized.clone(),
            pending: Arc::clone(&self.pending),
            gains: Arc::clone(&self.gains),
            tick_tx: self.broadcasts.tick_sender(),
            state_tx: self.broadcasts.state_sender(),
            bar_change_tx: self.broadcasts.bar_change_sender(),
            synth: self.settings.synth.clone(),
            scheduler: self.settings.scheduler.clone(),
        };

        match self.backend.start(ctx) {
            Ok(()) => {
                *self.base_config.lock().unwrap() = normalized;
                self.set_state(State::Running, None);
                Ok(())
            }
            Err(err) => {
                log_engine_error(&err, "EngineHandle::start");
                self.set_state(State::Error, Some(err.message()));
                Err(err)
            }
        }
    }

    /// Requests termination, joins the backend's worker within a bounded
    /// timeout, and drains pending events. Safe to call when already idle.
    pub fn stop(&self) {
        if self.state() == State::Idle {
            return;
        }
        self.set_state(State::Stopping, None);

        match self.backend.stop() {
            Ok(()) => self.set_state(State::Idle, None),
            Err(err) => {
                log_engine_error(&err, "EngineHandle::stop");
                // A stop timeout is a diagnostic, not a fatal run state: the
                // worker is abandoned (spec §5, "resources leaked rather
                // than deadlocking the caller") but the facade still settles
                // to Idle so a subsequent `start` is not blocked forever.
                self.set_state(State::Idle, Some(err.message()));
            }
        }
    }

    /// Normalizes `patch` against the current base configuration and
    /// publishes it to the pending slot if, and only if, its content
    /// fingerprint differs from the last published one (spec §4.B/§4.G).
    /// The patch's own `apply_boundary` selects when the commit lands,
    /// defaulting to `NextBar`.
    pub fn update(&self, patch: PartialConfig) {
        let boundary = patch.apply_boundary.unwrap_or(ApplyBoundary::NextBar);
        let base = { self.base_config.lock().unwrap().clone() };

        let Some(normalized) = self.adapter.stabilize(&base, &patch) else {
            return;
        };

        *self.base_config.lock().unwrap() = normalized.clone();
        self.pending.publish(normalized, boundary);
    }

    /// Overrides the accent gain table, effective immediately and
    /// independent of the active snapshot (spec §4.F).
    pub fn set_accent_gains(&self, overrides: AccentGains) {
        self.gains.store(overrides);
    }

    /// Current lifecycle state.
    pub fn get_status(&self) -> State {
        self.state()
    }

    /// Schedules a single immediate `BarStrong` click. Returns whether the
    /// backend accepted it (it will not while idle).
    pub fn play_test_tick(&self) -> bool {
        self.backend.play_test_tick()
    }

    // ========================================================================
    // SUBSCRIPTIONS (spec §6)
    // ========================================================================

    pub fn on_tick(&self) -> broadcast::Receiver<crate::model::TickEvent> {
        self.broadcasts.subscribe_tick()
    }

    pub fn on_state(&self) -> broadcast::Receiver<StateEvent> {
        self.broadcasts.subscribe_state()
    }

    pub fn on_bar_change(&self) -> broadcast::Receiver<BarChangeEvent> {
        self.broadcasts.subscribe_bar_change()
    }

    /// Snapshot of the currently-published base configuration (desktop
    /// tooling / test helper).
    pub fn config_snapshot(&self) -> EngineConfig {
        self.base_config.lock().unwrap().clone()
    }
}

impl Default for EngineHandle {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_idle_and_transitions_to_running() {
        let engine = EngineHandle::new();
        assert_eq!(engine.get_status(), State::Idle);
        engine.start(PartialConfig::default()).unwrap();
        assert_eq!(engine.get_status(), State::Running);
        engine.stop();
        assert_eq!(engine.get_status(), State::Idle);
    }

    #[test]
    fn stop_on_idle_engine_is_a_no_op() {
        let engine = EngineHandle::new();
        engine.stop();
        assert_eq!(engine.get_status(), State::Idle);
    }

    #[test]
    fn starting_twice_behaves_like_update() {
        let engine = EngineHandle::new();
        engine.start(PartialConfig::default()).unwrap();
        let patch = PartialConfig {
            bpm: Some(140),
            ..Default::default()
        };
        engine.start(patch).unwrap();
        assert_eq!(engine.get_status(), State::Running);
        engine.stop();
    }

    #[test]
    fn update_before_start_is_reflected_in_next_start() {
        let engine = EngineHandle::new();
        engine.update(PartialConfig {
            bpm: Some(90),
            ..Default::default()
        });
        assert_eq!(engine.config_snapshot().bpm, 90);
    }

    #[test]
    fn play_test_tick_requires_a_running_engine() {
        let engine = EngineHandle::new();
        assert!(!engine.play_test_tick());
        engine.start(PartialConfig::default()).unwrap();
        assert!(engine.play_test_tick());
        engine.stop();
    }

    #[test]
    fn set_accent_gains_does_not_require_the_engine_to_be_running() {
        let engine = EngineHandle::new();
        engine.set_accent_gains(AccentGains {
            bar_strong: 0.2,
            group_medium: 0.2,
            subdiv_weak: 0.2,
        });
    }

    #[test]
    fn tick_subscription_receives_events_once_running() {
        let engine = EngineHandle::new();
        let mut ticks = engine.on_tick();
        engine.start(PartialConfig::default()).unwrap();
        std::thread::sleep(std::time::Duration::from_millis(50));
        assert!(ticks.try_recv().is_ok());
        engine.stop();
    }
}
