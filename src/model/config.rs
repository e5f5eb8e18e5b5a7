//! EngineConfig: the canonical, immutable snapshot the schedulers run against.

use serde::{Deserialize, Serialize};

use super::bar::Bar;

/// When a published update should take effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ApplyBoundary {
    /// At the next beat scheduling decision.
    Now,
    /// At the next downbeat (`beat_in_bar == 0`).
    NextBar,
}

impl Default for ApplyBoundary {
    fn default() -> Self {
        ApplyBoundary::NextBar
    }
}

/// Engine lifecycle state, reported via `onState`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum State {
    Idle,
    Starting,
    Running,
    Stopping,
    Error,
}

impl std::fmt::Display for State {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            State::Idle => "Idle",
            State::Starting => "Starting",
            State::Running => "Running",
            State::Stopping => "Stopping",
            State::Error => "Error",
        };
        write!(f, "{label}")
    }
}

/// A complete, normalized, immutable snapshot. Only the normalizer
/// (`crate::normalize`) constructs one of these from caller input; the
/// engine treats it as opaque and swaps it at a beat/bar boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    pub bpm: u32,
    pub bars: Vec<Bar>,
    pub start_bar_index: usize,
    pub loop_enabled: bool,
    pub beat_guide: bool,
    pub apply_boundary: ApplyBoundary,
    /// Content fingerprint over every materially-observable field; equal
    /// fingerprints imply logically identical snapshots.
    pub fingerprint: u64,
}

/// A partial bar update: any subset of meter/groups/subdivisions/mask.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PartialBar {
    pub meter: Option<(u8, u8)>,
    pub groups: Option<Vec<u8>>,
    pub subdivisions: Option<Vec<u8>>,
    pub mask: Option<Vec<Vec<bool>>>,
}

/// A partial configuration update, as produced by the rhythm adapter from
/// caller-facing `update()` calls. Any field left `None` keeps its current
/// normalized value.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PartialConfig {
    pub bpm: Option<u32>,
    pub bars: Option<Vec<PartialBar>>,
    pub start_bar_index: Option<usize>,
    pub loop_enabled: Option<bool>,
    pub beat_guide: Option<bool>,
    pub apply_boundary: Option<ApplyBoundary>,
}
