//! TickEvent: the lazy playhead-animation sequence emitted by both schedulers.

use serde::{Deserialize, Serialize};

use super::meter::AccentLevel;

/// One scheduled audio atom, emitted regardless of whether the slot is
/// audible, so a UI playhead can animate silent beats too.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickEvent {
    /// Monotonic index since the engine started running.
    pub tick_index: u64,
    pub bar_index: usize,
    pub beat_in_bar: usize,
    pub sub_index: usize,
    pub slot_count: usize,
    pub audible: bool,
    pub accent: AccentLevel,
    pub gain: f32,
    /// Audio-timeline timestamp in milliseconds, never wall-clock.
    pub at_ms: f64,
}
