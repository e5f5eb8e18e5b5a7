//! Web Audio pull scheduler for `wasm32` builds (spec §4.D).
//!
//! Wakes every `LOOKAHEAD` and schedules every beat whose start time falls
//! within the next `SCHEDULE_AHEAD` window onto the browser's own audio
//! timeline, rather than synthesizing samples itself. Grounded on the pack's
//! `wasm-bindgen`/`web-sys` feature wiring (the teacher repo targets desktop
//! and Android only, so this backend follows the ecosystem convention for a
//! `setInterval`-driven lookahead loop instead of a teacher-specific one).
//!
//! `wasm32` is single-threaded, but [`AudioBackend`] requires `Send + Sync`
//! so the same trait object can be stored in `EngineHandle` as the desktop
//! backend. JS closures and `web_sys` handles are not `Send`/`Sync` by
//! Rust's rules, even though nothing here actually crosses a thread —
//! the state lives behind `Arc<Mutex<_>>` (never `Rc<RefCell<_>>`) and the
//! unsafe impls below assert what's structurally true for this target.

use std::cell::Cell;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use wasm_bindgen::prelude::*;
use web_sys::{AudioContext, GainNode, OscillatorNode, OscillatorType};

use crate::engine::backend::{AtomicAccentGains, PendingSlot};
use crate::error::EngineError;
use crate::managers::{BarChangeEvent, StateEvent};
use crate::model::{AccentLevel, EngineConfig, TickEvent};
use crate::rhythm::plan_beat;
use crate::timeline::TimelineState;

use super::{AudioBackend, EngineStartContext};

const CLICK_ATTACK_S: f64 = 0.002;
const CLICK_DECAY_S: f64 = 0.016;
const CLICK_TOTAL_S: f64 = 0.030;

struct Session {
    ctx: AudioContext,
    timeline: TimelineState,
    active: EngineConfig,
    pending: Arc<PendingSlot>,
    gains: Arc<AtomicAccentGains>,
    next_beat_time: f64,
    tick_index: u64,
    announced_bars: HashSet<usize>,
    tick_tx: tokio::sync::broadcast::Sender<TickEvent>,
    bar_change_tx: tokio::sync::broadcast::Sender<BarChangeEvent>,
    state_tx: tokio::sync::broadcast::Sender<StateEvent>,
    lookahead_ms: f64,
    schedule_ahead_s: f64,
}

impl Session {
    fn tick_loop(&mut self) {
        let now = self.ctx.current_time();
        let horizon = now + self.schedule_ahead_s;

        if let Some(committed) = self.pending.try_commit(&self.timeline) {
            self.active = committed;
        }

        while self.next_beat_time < horizon {
            self.schedule_beat(self.next_beat_time);
        }
    }

    fn schedule_beat(&mut self, t: f64) {
        let bar_index = self.timeline.bar_index;
        let beat_in_bar = self.timeline.beat_in_bar;
        let bar = self.active.bars[bar_index].clone();
        let plan = plan_beat(&bar, beat_in_bar, self.active.beat_guide);

        let seconds_per_beat = bar.meter.seconds_per_beat(self.active.bpm);
        let sub_dt = if plan.slot_count > 0 {
            seconds_per_beat / plan.slot_count as f64
        } else {
            seconds_per_beat
        };

        for i in 0..plan.slot_count {
            let t_i = t + i as f64 * sub_dt;
            let audible = plan.mask.get(i).copied().unwrap_or(true);
            let accent = plan.accents.get(i).copied().unwrap_or(AccentLevel::SubdivWeak);
            let gain = self.gains.gain_for(accent);

            if audible {
                if let Err(err) = self.schedule_click(t_i, accent, gain) {
                    log::warn!("[WebBackend] host scheduling event failed: {err:?}");
                    let _ = self.state_tx.send(StateEvent {
                        state: crate::model::State::Error,
                        detail: Some(format!("{err:?}")),
                    });
                }
            }

            let tick = TickEvent {
                tick_index: self.tick_index,
                bar_index,
                beat_in_bar,
                sub_index: i,
                slot_count: plan.slot_count,
                audible,
                accent,
                gain,
                at_ms: t_i * 1000.0,
            };
            self.tick_index += 1;
            let _ = self.tick_tx.send(tick);
        }

        if beat_in_bar == 0 && self.announced_bars.insert(bar_index) {
            self.schedule_bar_change_notification(bar_index, t);
        }

        let bar_count = self.active.bars.len();
        self.timeline.advance(bar.meter.n as usize, bar_count, self.active.loop_enabled);
        self.next_beat_time += seconds_per_beat;
    }

    fn schedule_click(&self, at_time: f64, accent: AccentLevel, gain: f32) -> Result<(), EngineError> {
        let osc: OscillatorNode = self
            .ctx
            .create_oscillator()
            .map_err(|e| EngineError::HostEventException { details: format!("{e:?}") })?;
        let gain_node: GainNode = self
            .ctx
            .create_gain()
            .map_err(|e| EngineError::HostEventException { details: format!("{e:?}") })?;

        osc.set_type(OscillatorType::Sine);
        osc.frequency().set_value(accent.default_frequency());

        let g = gain_node.gain();
        let peak = gain.clamp(0.0, 1.0);
        g.set_value_at_time(0.0, at_time)
            .map_err(|e| EngineError::HostEventException { details: format!("{e:?}") })?;
        g.linear_ramp_to_value_at_time(peak, at_time + CLICK_ATTACK_S)
            .map_err(|e| EngineError::HostEventException { details: format!("{e:?}") })?;
        g.linear_ramp_to_value_at_time(0.0, at_time + CLICK_ATTACK_S + CLICK_DECAY_S)
            .map_err(|e| EngineError::HostEventException { details: format!("{e:?}") })?;

        osc.connect_with_audio_node(&gain_node)
            .map_err(|e| EngineError::HostEventException { details: format!("{e:?}") })?;
        gain_node
            .connect_with_audio_node(&self.ctx.destination())
            .map_err(|e| EngineError::HostEventException { details: format!("{e:?}") })?;

        osc.start_with_start_time(at_time)
            .map_err(|e| EngineError::HostEventException { details: format!("{e:?}") })?;
        osc.stop_with_stop_time(at_time + CLICK_TOTAL_S)
            .map_err(|e| EngineError::HostEventException { details: format!("{e:?}") })?;
        Ok(())
    }

    fn schedule_bar_change_notification(&self, bar_index: usize, at_time: f64) {
        let delay_ms = ((at_time - self.ctx.current_time()).max(0.0) * 1000.0) as i32;
        let bar_change_tx = self.bar_change_tx.clone();
        let closure = Closure::once(move || {
            let _ = bar_change_tx.send(bar_index);
        });
        if let Some(window) = web_sys::window() {
            let _ = window.set_timeout_with_callback_and_timeout_and_arguments_0(
                closure.as_ref().unchecked_ref(),
                delay_ms,
            );
        }
        // `Closure::once` drops itself after invocation; nothing to keep alive here.
        closure.forget();
    }
}

/// Pull scheduler backend driving the browser's Web Audio timeline.
pub struct WebBackend {
    session: Arc<Mutex<Option<Session>>>,
    interval_closure: Arc<Mutex<Option<Closure<dyn FnMut()>>>>,
    interval_id: Cell<i32>,
    running: Arc<Mutex<bool>>,
}

// SAFETY: `wasm32-unknown-unknown` is single-threaded; there is no actual
// concurrent access to the `JsValue`-bearing fields, only a single trait
// object shared by value with `EngineHandle`.
unsafe impl Send for WebBackend {}
unsafe impl Sync for WebBackend {}

impl WebBackend {
    pub fn new() -> Self {
        Self {
            session: Arc::new(Mutex::new(None)),
            interval_closure: Arc::new(Mutex::new(None)),
            interval_id: Cell::new(0),
            running: Arc::new(Mutex::new(false)),
        }
    }
}

impl Default for WebBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioBackend for WebBackend {
    fn start(&self, ctx: EngineStartContext) -> Result<(), EngineError> {
        let mut running = self.running.lock().unwrap();
        if *running {
            return Err(EngineError::AudioUnavailable {
                details: "web backend already running".to_string(),
            });
        }

        let audio_ctx = AudioContext::new()
            .map_err(|e| EngineError::AudioUnavailable { details: format!("{e:?}") })?;

        let start_bar_index = ctx.initial_config.start_bar_index;
        let start_delay_s = ctx.scheduler.start_delay_ms / 1000.0;
        let session = Session {
            next_beat_time: audio_ctx.current_time() + start_delay_s,
            ctx: audio_ctx,
            timeline: TimelineState::new(start_bar_index),
            active: ctx.initial_config,
            pending: ctx.pending,
            gains: ctx.gains,
            tick_index: 0,
            announced_bars: HashSet::new(),
            tick_tx: ctx.tick_tx,
            bar_change_tx: ctx.bar_change_tx,
            state_tx: ctx.state_tx,
            lookahead_ms: ctx.scheduler.lookahead_ms,
            schedule_ahead_s: ctx.scheduler.schedule_ahead_ms / 1000.0,
        };

        let lookahead_ms = session.lookahead_ms;
        *self.session.lock().unwrap() = Some(session);

        let session_handle = Arc::clone(&self.session);
        let tick_closure = Closure::wrap(Box::new(move || {
            if let Ok(mut guard) = session_handle.lock() {
                if let Some(session) = guard.as_mut() {
                    session.tick_loop();
                }
            }
        }) as Box<dyn FnMut()>);

        let Some(window) = web_sys::window() else {
            return Err(EngineError::AudioUnavailable {
                details: "no window object available".to_string(),
            });
        };

        let interval_id = window
            .set_interval_with_callback_and_timeout_and_arguments_0(
                tick_closure.as_ref().unchecked_ref(),
                lookahead_ms as i32,
            )
            .map_err(|e| EngineError::AudioUnavailable { details: format!("{e:?}") })?;

        self.interval_id.set(interval_id);
        *self.interval_closure.lock().unwrap() = Some(tick_closure);
        *running = true;
        Ok(())
    }

    fn stop(&self) -> Result<(), EngineError> {
        let mut running = self.running.lock().unwrap();
        if !*running {
            return Ok(());
        }

        if let Some(window) = web_sys::window() {
            window.clear_interval_with_handle(self.interval_id.get());
        }
        *self.interval_closure.lock().unwrap() = None;

        if let Some(session) = self.session.lock().unwrap().take() {
            let _ = session.ctx.close();
        }

        *running = false;
        Ok(())
    }

    fn play_test_tick(&self) -> bool {
        if !*self.running.lock().unwrap() {
            return false;
        }
        let guard = self.session.lock().unwrap();
        let Some(session) = guard.as_ref() else {
            return false;
        };
        let gain = session.gains.gain_for(AccentLevel::BarStrong);
        let _ = session.schedule_click(session.ctx.current_time(), AccentLevel::BarStrong, gain);
        true
    }
}

#[cfg(test)]
mod tests {
    // Web Audio scheduling only exercises meaningfully inside a browser
    // runtime; this backend is covered by the shared `AudioBackend`
    // contract tests run against `StubBackend` on native targets instead.
}
