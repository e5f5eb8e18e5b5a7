//! Meter and accent types shared across the rhythm model and the schedulers.

use serde::{Deserialize, Serialize};

/// A time signature `(n, d)`: `n` beats per bar, `d` the beat unit.
///
/// `n` is clamped to `[1, 64]`; `d` is clamped to the nearest legal power of
/// two in `[1, 64]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Meter {
    pub n: u8,
    pub d: u8,
}

impl Meter {
    pub fn new(n: u8, d: u8) -> Self {
        Self {
            n: n.clamp(1, 64),
            d: Self::clamp_denominator(d),
        }
    }

    fn clamp_denominator(d: u8) -> u8 {
        const LEGAL: [u8; 7] = [1, 2, 4, 8, 16, 32, 64];
        LEGAL
            .iter()
            .copied()
            .min_by_key(|candidate| (*candidate as i16 - d as i16).abs())
            .unwrap_or(4)
    }

    /// Seconds per beat at the given tempo: `(60/bpm) * (4/d)`.
    pub fn seconds_per_beat(&self, bpm: u32) -> f64 {
        (60.0 / bpm as f64) * (4.0 / self.d as f64)
    }
}

impl Default for Meter {
    fn default() -> Self {
        Self { n: 4, d: 4 }
    }
}

/// Three-valued accent tag carried by every tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AccentLevel {
    BarStrong,
    GroupMedium,
    SubdivWeak,
}

impl AccentLevel {
    /// Default gain, overridable via `set_accent_gains`.
    pub fn default_gain(&self) -> f32 {
        match self {
            AccentLevel::BarStrong => 1.0,
            AccentLevel::GroupMedium => 0.7,
            AccentLevel::SubdivWeak => 0.4,
        }
    }

    /// Default click tone frequency in Hz.
    pub fn default_frequency(&self) -> f32 {
        match self {
            AccentLevel::BarStrong => 1200.0,
            AccentLevel::GroupMedium => 900.0,
            AccentLevel::SubdivWeak => 700.0,
        }
    }
}

/// Caller-overridable gain table, keyed by accent level, applied atomically
/// and independently of the active config snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AccentGains {
    pub bar_strong: f32,
    pub group_medium: f32,
    pub subdiv_weak: f32,
}

impl AccentGains {
    pub fn gain_for(&self, level: AccentLevel) -> f32 {
        match level {
            AccentLevel::BarStrong => self.bar_strong,
            AccentLevel::GroupMedium => self.group_medium,
            AccentLevel::SubdivWeak => self.subdiv_weak,
        }
    }
}

impl Default for AccentGains {
    fn default() -> Self {
        Self {
            bar_strong: AccentLevel::BarStrong.default_gain(),
            group_medium: AccentLevel::GroupMedium.default_gain(),
            subdiv_weak: AccentLevel::SubdivWeak.default_gain(),
        }
    }
}
