//! Rhythm Adapter (spec §4.G): stabilizes upstream input churn.
//!
//! Upstream callers routinely hand the adapter a fresh array identity on
//! every render even when the content hasn't changed. The adapter computes
//! the normalizer's content fingerprint and only republishes to the engine
//! when it differs from the last one it saw — normalizing itself performs
//! the deep clone at the boundary, so the engine always owns its own copy.

use std::sync::Mutex;

use crate::model::{EngineConfig, PartialConfig};
use crate::normalize::normalize;

/// A single small struct owning the one piece of shared mutable identity
/// state (the last-published fingerprint) behind a mutex, in the same vein
/// as the broadcast channel manager's lifecycle bookkeeping.
pub struct RhythmAdapter {
    last_fingerprint: Mutex<Option<u64>>,
}

impl RhythmAdapter {
    pub fn new() -> Self {
        Self {
            last_fingerprint: Mutex::new(None),
        }
    }

    /// Normalizes `patch` against `base`. Returns `Some(config)` only when
    /// its fingerprint differs from the last one this adapter published;
    /// otherwise `None`, signaling the facade to skip the update entirely.
    pub fn stabilize(&self, base: &EngineConfig, patch: &PartialConfig) -> Option<EngineConfig> {
        let normalized = normalize(base, patch);
        let mut last = self.last_fingerprint.lock().unwrap();
        if *last == Some(normalized.fingerprint) {
            return None;
        }
        *last = Some(normalized.fingerprint);
        Some(normalized)
    }
}

impl Default for RhythmAdapter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::default_config;

    #[test]
    fn first_update_always_publishes() {
        let adapter = RhythmAdapter::new();
        let base = default_config();
        assert!(adapter.stabilize(&base, &PartialConfig::default()).is_some());
    }

    #[test]
    fn repeated_identical_patch_is_deduplicated() {
        let adapter = RhythmAdapter::new();
        let base = default_config();
        let patch = PartialConfig {
            bpm: Some(140),
            ..Default::default()
        };

        let first = adapter.stabilize(&base, &patch);
        assert!(first.is_some());

        // A second, freshly-allocated but content-identical patch must not
        // republish, mirroring upstream array identity churn.
        let patch_again = PartialConfig {
            bpm: Some(140),
            ..Default::default()
        };
        assert!(adapter.stabilize(&base, &patch_again).is_none());
    }

    #[test]
    fn changed_content_republishes() {
        let adapter = RhythmAdapter::new();
        let base = default_config();
        assert!(adapter
            .stabilize(&base, &PartialConfig { bpm: Some(100), ..Default::default() })
            .is_some());
        assert!(adapter
            .stabilize(&base, &PartialConfig { bpm: Some(101), ..Default::default() })
            .is_some());
    }
}
