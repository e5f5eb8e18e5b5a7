//! Backend abstractions for the two supported audio hosts (spec §4.D/§4.E):
//! the pull scheduler (callback-timeline) and the push synthesizer
//! (PCM-buffer). Both share the same start/stop/test-tick contract and the
//! same pending-snapshot handoff so the facade never needs to know which one
//! is active.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Instant;

use tokio::sync::broadcast;

use crate::config::{SchedulerConfig, SynthConfig};
use crate::error::EngineError;
use crate::managers::{BarChangeEvent, StateEvent};
use crate::model::{AccentGains, AccentLevel, ApplyBoundary, EngineConfig, TickEvent};
use crate::timeline::TimelineState;

/// Single-writer (facade), single-reader (backend worker) handoff for a
/// normalized snapshot awaiting its apply boundary. The worker only takes the
/// lock at a beat-scheduling decision, never per-sample.
pub struct PendingSlot {
    slot: Mutex<Option<(EngineConfig, ApplyBoundary)>>,
}

impl PendingSlot {
    pub fn new() -> Self {
        Self {
            slot: Mutex::new(None),
        }
    }

    /// Publishes a snapshot, overwriting whatever was previously pending and
    /// not yet committed.
    pub fn publish(&self, config: EngineConfig, boundary: ApplyBoundary) {
        if let Ok(mut guard) = self.slot.lock() {
            *guard = Some((config, boundary));
        }
    }

    /// Takes the pending snapshot if `timeline` is at a point where its
    /// boundary says to commit. Non-blocking: a contended lock is treated as
    /// "nothing ready this beat" rather than stalling the caller.
    pub fn try_commit(&self, timeline: &TimelineState) -> Option<EngineConfig> {
        let mut guard = self.slot.try_lock().ok()?;
        let ready = matches!(guard.as_ref(), Some((_, boundary)) if timeline.should_commit(*boundary));
        if ready {
            guard.take().map(|(config, _)| config)
        } else {
            None
        }
    }
}

impl Default for PendingSlot {
    fn default() -> Self {
        Self::new()
    }
}

/// Accent-gain overrides stored as raw bit patterns in atomics, so the audio
/// thread can read them every tick without a lock (spec §4.F, "atomic,
/// effective immediately; lives outside the snapshot").
pub struct AtomicAccentGains {
    bar_strong: AtomicU32,
    group_medium: AtomicU32,
    subdiv_weak: AtomicU32,
}

impl AtomicAccentGains {
    pub fn new(initial: AccentGains) -> Self {
        Self {
            bar_strong: AtomicU32::new(initial.bar_strong.to_bits()),
            group_medium: AtomicU32::new(initial.group_medium.to_bits()),
            subdiv_weak: AtomicU32::new(initial.subdiv_weak.to_bits()),
        }
    }

    pub fn store(&self, gains: AccentGains) {
        self.bar_strong.store(gains.bar_strong.to_bits(), Ordering::Relaxed);
        self.group_medium.store(gains.group_medium.to_bits(), Ordering::Relaxed);
        self.subdiv_weak.store(gains.subdiv_weak.to_bits(), Ordering::Relaxed);
    }

    pub fn load(&self) -> AccentGains {
        AccentGains {
            bar_strong: f32::from_bits(self.bar_strong.load(Ordering::Relaxed)),
            group_medium: f32::from_bits(self.group_medium.load(Ordering::Relaxed)),
            subdiv_weak: f32::from_bits(self.subdiv_weak.load(Ordering::Relaxed)),
        }
    }

    pub fn gain_for(&self, level: AccentLevel) -> f32 {
        self.load().gain_for(level)
    }
}

impl Default for AtomicAccentGains {
    fn default() -> Self {
        Self::new(AccentGains::default())
    }
}

/// Everything a backend needs to run, handed over once at `start`.
pub struct EngineStartContext {
    pub initial_config: EngineConfig,
    pub pending: Arc<PendingSlot>,
    pub gains: Arc<AtomicAccentGains>,
    pub tick_tx: broadcast::Sender<TickEvent>,
    pub state_tx: broadcast::Sender<StateEvent>,
    pub bar_change_tx: broadcast::Sender<BarChangeEvent>,
    pub synth: SynthConfig,
    pub scheduler: SchedulerConfig,
}

/// Implemented by the push synthesizer, the pull scheduler, and the
/// deterministic test stub.
pub trait AudioBackend: Send + Sync {
    fn start(&self, ctx: EngineStartContext) -> Result<(), EngineError>;
    fn stop(&self) -> Result<(), EngineError>;
    /// Schedules a single immediate `BarStrong` click (spec §6,
    /// `play_test_tick`). Returns whether the host accepted it.
    fn play_test_tick(&self) -> bool;
}

/// Monotonic time source, used only where a backend needs a non-audio-timeline
/// clock (the deterministic stub's fixed-step playhead).
pub trait TimeSource: Send + Sync {
    fn now(&self) -> Instant;
}

#[derive(Default)]
pub struct SystemTimeSource;

impl TimeSource for SystemTimeSource {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Deterministic clock that advances by a fixed step every call, so tests
/// that drive the stub backend get reproducible tick timing.
pub struct StubTimeSource {
    start: Instant,
    step_ms: Mutex<u64>,
}

impl StubTimeSource {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
            step_ms: Mutex::new(0),
        }
    }

    /// Advances the stub clock by 10ms and returns the new elapsed offset.
    pub fn advance(&self) -> u64 {
        let mut step = self.step_ms.lock().unwrap();
        *step += 10;
        *step
    }
}

impl Default for StubTimeSource {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeSource for StubTimeSource {
    fn now(&self) -> Instant {
        self.start
    }
}

#[cfg(feature = "desktop")]
pub mod cpal;
#[cfg(feature = "web")]
pub mod web;
pub mod stub;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::default_config;

    #[test]
    fn pending_slot_commits_only_when_boundary_matches() {
        let slot = PendingSlot::new();
        let config = default_config();
        slot.publish(config.clone(), ApplyBoundary::NextBar);

        let mut timeline = TimelineState::new(0);
        timeline.advance(4, 1, false);
        assert!(slot.try_commit(&timeline).is_none());

        let downbeat = TimelineState::new(0);
        slot.publish(config, ApplyBoundary::NextBar);
        assert!(slot.try_commit(&downbeat).is_some());
    }

    #[test]
    fn pending_slot_now_boundary_commits_immediately() {
        let slot = PendingSlot::new();
        slot.publish(default_config(), ApplyBoundary::Now);
        let mut timeline = TimelineState::new(0);
        timeline.advance(4, 1, false);
        assert!(slot.try_commit(&timeline).is_some());
    }

    #[test]
    fn atomic_gains_round_trip() {
        let gains = AtomicAccentGains::new(AccentGains::default());
        gains.store(AccentGains {
            bar_strong: 0.5,
            group_medium: 0.3,
            subdiv_weak: 0.1,
        });
        assert_eq!(gains.gain_for(AccentLevel::BarStrong), 0.5);
        assert_eq!(gains.gain_for(AccentLevel::SubdivWeak), 0.1);
    }
}
