//! Real-time-safe core of the push synthesizer (spec §4.E): the per-frame
//! inner loop, independent of any particular host. `cpal.rs` drives this from
//! a live output stream; `stub.rs` and `testing::fixtures` drive it
//! synchronously for deterministic tests and WAV bounces. Mirrors the
//! teacher's `audio/callback.rs` split between "what runs on the audio
//! thread" and "how the host feeds it frames".

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::broadcast;

use crate::engine::backend::{AtomicAccentGains, PendingSlot};
use crate::engine::click::{duration_samples, quantize_i16, ClickBurst};
use crate::managers::BarChangeEvent;
use crate::model::{AccentLevel, EngineConfig, TickEvent};
use crate::rhythm::plan_beat;
use crate::timeline::TimelineState;

/// Per-frame synthesis state. Owned exclusively by whichever thread calls
/// `next_sample`; every other thread only reaches it through `pending` and
/// `gains`, both lock-free or try-lock from this side.
pub struct SynthState {
    active: EngineConfig,
    pending: Arc<PendingSlot>,
    gains: Arc<AtomicAccentGains>,
    test_tick: Arc<AtomicBool>,

    timeline: TimelineState,
    current_bar_index: usize,
    current_beat_in_bar: usize,

    sample_rate: u32,
    samples_per_beat: f64,
    samples_until_beat: f64,
    samples_until_sub: f64,
    slot_index: usize,
    slot_count: usize,
    slot_mask: Vec<bool>,
    slot_accents: Vec<AccentLevel>,

    burst: ClickBurst,
    click_duration_samples: u32,

    tick_index: u64,
    total_frames: u64,

    tick_tx: broadcast::Sender<TickEvent>,
    bar_change_tx: broadcast::Sender<BarChangeEvent>,
}

impl SynthState {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        initial_config: EngineConfig,
        pending: Arc<PendingSlot>,
        gains: Arc<AtomicAccentGains>,
        test_tick: Arc<AtomicBool>,
        sample_rate: u32,
        click_duration_ms: f32,
        tick_tx: broadcast::Sender<TickEvent>,
        bar_change_tx: broadcast::Sender<BarChangeEvent>,
    ) -> Self {
        let start_bar_index = initial_config.start_bar_index;
        Self {
            active: initial_config,
            pending,
            gains,
            test_tick,
            timeline: TimelineState::new(start_bar_index),
            current_bar_index: start_bar_index,
            current_beat_in_bar: 0,
            sample_rate,
            samples_per_beat: 0.0,
            samples_until_beat: 0.0,
            samples_until_sub: 0.0,
            slot_index: 0,
            slot_count: 0,
            slot_mask: Vec::new(),
            slot_accents: Vec::new(),
            burst: ClickBurst::silent(),
            click_duration_samples: duration_samples(click_duration_ms, sample_rate),
            tick_index: 0,
            total_frames: 0,
            tick_tx,
            bar_change_tx,
        }
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn total_frames(&self) -> u64 {
        self.total_frames
    }

    /// Produces the next output sample, advancing all internal state by one
    /// frame (spec §4.E steps 1-4).
    pub fn next_sample(&mut self) -> i16 {
        self.apply_test_tick_if_requested();

        if self.samples_until_beat <= 0.0 {
            if let Some(committed) = self.pending.try_commit(&self.timeline) {
                self.active = committed;
            }
            self.begin_beat();
        }

        if self.samples_until_sub <= 0.0 && self.slot_index < self.slot_count {
            self.fire_slot();
        }

        let sample = if self.burst.is_active() {
            self.burst.next_sample(self.sample_rate)
        } else {
            0.0
        };

        self.samples_until_beat -= 1.0;
        self.samples_until_sub -= 1.0;
        self.total_frames += 1;

        quantize_i16(sample)
    }

    fn apply_test_tick_if_requested(&mut self) {
        if self.test_tick.swap(false, Ordering::Relaxed) {
            let gain = self.gains.gain_for(AccentLevel::BarStrong);
            self.burst = ClickBurst::trigger(
                self.click_duration_samples,
                AccentLevel::BarStrong.default_frequency(),
                gain,
            );
        }
    }

    fn begin_beat(&mut self) {
        let bar_index = self.timeline.bar_index;
        let beat_in_bar = self.timeline.beat_in_bar;
        self.current_bar_index = bar_index;
        self.current_beat_in_bar = beat_in_bar;

        let bar = self.active.bars[bar_index].clone();
        let plan = plan_beat(&bar, beat_in_bar, self.active.beat_guide);

        self.slot_count = plan.slot_count;
        self.slot_mask = plan.mask;
        self.slot_accents = plan.accents;
        self.slot_index = 0;
        self.samples_until_sub = 0.0;

        let seconds_per_beat = bar.meter.seconds_per_beat(self.active.bpm);
        self.samples_per_beat = seconds_per_beat * self.sample_rate as f64;

        let bar_count = self.active.bars.len();
        let entered_new_bar =
            self.timeline
                .advance(bar.meter.n as usize, bar_count, self.active.loop_enabled);
        if entered_new_bar {
            let _ = self.bar_change_tx.send(self.timeline.bar_index);
        }

        self.samples_until_beat += self.samples_per_beat;
    }

    fn fire_slot(&mut self) {
        let i = self.slot_index;
        let audible = self.slot_mask.get(i).copied().unwrap_or(true);
        let accent = self.slot_accents.get(i).copied().unwrap_or(AccentLevel::SubdivWeak);
        let gain = self.gains.gain_for(accent);

        if audible {
            self.burst = ClickBurst::trigger(self.click_duration_samples, accent.default_frequency(), gain);
        }

        let at_ms = (self.total_frames as f64 / self.sample_rate as f64) * 1000.0;
        let tick = TickEvent {
            tick_index: self.tick_index,
            bar_index: self.current_bar_index,
            beat_in_bar: self.current_beat_in_bar,
            sub_index: i,
            slot_count: self.slot_count,
            audible,
            accent,
            gain,
            at_ms,
        };
        self.tick_index += 1;
        let _ = self.tick_tx.send(tick);

        self.slot_index += 1;
        self.samples_until_sub += self.samples_per_beat / self.slot_count as f64;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::default_config;

    fn harness(sample_rate: u32) -> (SynthState, broadcast::Receiver<TickEvent>, broadcast::Receiver<BarChangeEvent>) {
        let (tick_tx, tick_rx) = broadcast::channel(256);
        let (bar_tx, bar_rx) = broadcast::channel(32);
        let state = SynthState::new(
            default_config(),
            Arc::new(PendingSlot::new()),
            Arc::new(AtomicAccentGains::default()),
            Arc::new(AtomicBool::new(false)),
            sample_rate,
            10.0,
            tick_tx,
            bar_tx,
        );
        (state, tick_rx, bar_rx)
    }

    #[test]
    fn steady_4_4_ticks_land_on_the_beat_grid() {
        // 120 BPM, 4/4: 0.5s per beat. At a low sample rate the whole bar
        // fits in a small number of frames, so we can render it directly.
        let (mut state, mut tick_rx, _bar_rx) = harness(1000);
        for _ in 0..2000 {
            state.next_sample();
        }

        let mut ticks = Vec::new();
        while let Ok(tick) = tick_rx.try_recv() {
            ticks.push(tick);
        }

        assert!(ticks.len() >= 4);
        assert_eq!(ticks[0].accent, AccentLevel::BarStrong);
        assert!((ticks[0].at_ms - 0.0).abs() < 1.0);
        assert!((ticks[1].at_ms - 500.0).abs() < 1.0);
        assert_eq!(ticks[1].accent, AccentLevel::SubdivWeak);
    }

    #[test]
    fn tick_index_is_strictly_monotonic() {
        let (mut state, mut tick_rx, _bar_rx) = harness(800);
        for _ in 0..1600 {
            state.next_sample();
        }
        let mut last = None;
        while let Ok(tick) = tick_rx.try_recv() {
            if let Some(prev) = last {
                assert!(tick.tick_index > prev);
            }
            last = Some(tick.tick_index);
        }
        assert!(last.is_some());
    }

    #[test]
    fn test_tick_flag_triggers_an_immediate_burst() {
        let (mut state, _tick_rx, _bar_rx) = harness(48_000);
        state.test_tick.store(true, Ordering::Relaxed);
        let sample = state.next_sample();
        // The very first frame of a fresh burst at full amplitude should be
        // non-silent once the sine has advanced past phase 0.
        let _ = sample;
        assert!(state.burst.is_active());
    }
}
