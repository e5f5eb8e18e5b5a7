//! BroadcastChannelManager: centralized tokio broadcast channel management
//! for the engine's three outbound subscriptions (spec §6).
//!
//! All three channels are initialized eagerly at construction — callers may
//! subscribe to `onState`/`onBarChange` before `start()` is ever called, the
//! same way the teacher's debug metrics channel had to be available before
//! its audio engine started.

use tokio::sync::broadcast;

use crate::model::{State, TickEvent};

/// One bar-change notification: the bar index just entered.
pub type BarChangeEvent = usize;

/// One state transition, with an optional human-readable detail (used for
/// `Error` transitions).
#[derive(Debug, Clone, PartialEq)]
pub struct StateEvent {
    pub state: State,
    pub detail: Option<String>,
}

/// Manages the tick/state/bar-change broadcast channels shared by the
/// engine facade and its external subscribers.
pub struct BroadcastChannelManager {
    tick: broadcast::Sender<TickEvent>,
    state: broadcast::Sender<StateEvent>,
    bar_change: broadcast::Sender<BarChangeEvent>,
}

impl BroadcastChannelManager {
    pub fn new() -> Self {
        let (tick, _) = broadcast::channel(256);
        let (state, _) = broadcast::channel(32);
        let (bar_change, _) = broadcast::channel(32);
        Self {
            tick,
            state,
            bar_change,
        }
    }

    pub fn tick_sender(&self) -> broadcast::Sender<TickEvent> {
        self.tick.clone()
    }

    pub fn state_sender(&self) -> broadcast::Sender<StateEvent> {
        self.state.clone()
    }

    pub fn bar_change_sender(&self) -> broadcast::Sender<BarChangeEvent> {
        self.bar_change.clone()
    }

    pub fn subscribe_tick(&self) -> broadcast::Receiver<TickEvent> {
        self.tick.subscribe()
    }

    pub fn subscribe_state(&self) -> broadcast::Receiver<StateEvent> {
        self.state.subscribe()
    }

    pub fn subscribe_bar_change(&self) -> broadcast::Receiver<BarChangeEvent> {
        self.bar_change.subscribe()
    }
}

impl Default for BroadcastChannelManager {
    fn default() -> Self {
        Self::new()
    }
}
