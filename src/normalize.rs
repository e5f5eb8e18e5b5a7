//! Configuration Normalizer (spec §4.B).
//!
//! Clamps and validates a partial update against a base snapshot into a
//! complete canonical `EngineConfig`, and computes the content fingerprint
//! used to deduplicate logically-equal updates.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use crate::model::{ApplyBoundary, Bar, EngineConfig, Meter, PartialBar, PartialConfig};
use crate::rhythm::classify_groups;

const MIN_BPM: u32 = 30;
const MAX_BPM: u32 = 300;
const MIN_SUBDIVISION: u8 = 1;
const MAX_SUBDIVISION: u8 = 16;

/// The engine's built-in starting point before any caller update arrives:
/// one 4/4 bar at 120 BPM, all slots audible, looping.
pub fn default_config() -> EngineConfig {
    let bar = Bar::simple(Meter::new(4, 4));
    let fingerprint = fingerprint_of(120, std::slice::from_ref(&bar), false, true);
    EngineConfig {
        bpm: 120,
        bars: vec![bar],
        start_bar_index: 0,
        loop_enabled: true,
        beat_guide: false,
        apply_boundary: ApplyBoundary::NextBar,
        fingerprint,
    }
}

/// Normalizes `patch` against `base`, producing a complete canonical
/// snapshot. Out-of-range scalars are clamped; invalid group partitions are
/// dropped with a logged diagnostic rather than rejected outright — see
/// spec §7's `ConfigInvalid`, which is never fatal.
pub fn normalize(base: &EngineConfig, patch: &PartialConfig) -> EngineConfig {
    let bpm = patch.bpm.unwrap_or(base.bpm).clamp(MIN_BPM, MAX_BPM);

    let bars = match &patch.bars {
        Some(partials) => partials
            .iter()
            .enumerate()
            .map(|(i, partial)| normalize_bar(base.bars.get(i), partial))
            .collect(),
        None => base.bars.clone(),
    };
    let bars = if bars.is_empty() {
        vec![Bar::simple(Meter::default())]
    } else {
        bars
    };

    let start_bar_index = patch
        .start_bar_index
        .unwrap_or(base.start_bar_index)
        .min(bars.len() - 1);
    let loop_enabled = patch.loop_enabled.unwrap_or(base.loop_enabled);
    let beat_guide = patch.beat_guide.unwrap_or(base.beat_guide);
    let apply_boundary = patch.apply_boundary.unwrap_or(base.apply_boundary);

    let fingerprint = fingerprint_of(bpm, &bars, beat_guide, loop_enabled);

    EngineConfig {
        bpm,
        bars,
        start_bar_index,
        loop_enabled,
        beat_guide,
        apply_boundary,
        fingerprint,
    }
}

fn normalize_bar(base: Option<&Bar>, patch: &PartialBar) -> Bar {
    let fallback = || Bar::simple(Meter::default());
    let base_meter = base.map(|b| b.meter).unwrap_or_default();
    let meter = patch
        .meter
        .map(|(n, d)| Meter::new(n, d))
        .unwrap_or(base_meter);
    let n = meter.n as usize;

    let (subdivisions, mask) = if meter.d == 4 {
        let subdivisions = match &patch.subdivisions {
            Some(s) => resize_subdivisions(s, n),
            None => resize_subdivisions(
                base.map(|b| b.subdivisions.as_slice()).unwrap_or(&[]),
                n,
            ),
        };
        let mask = match &patch.mask {
            Some(m) => resize_mask(m, &subdivisions),
            None => resize_mask(base.map(|b| b.mask.as_slice()).unwrap_or(&[]), &subdivisions),
        };
        (subdivisions, mask)
    } else {
        // Per-beat subdivision data is only meaningful at d == 4; for other
        // denominators S and M are cleared to single-slot, audible beats.
        (vec![1u8; n], vec![vec![true]; n])
    };

    let pool = crate::rhythm::pool_ticks(meter, &subdivisions);
    let groups = match &patch.groups {
        Some(g) => validate_groups(g, n, meter.d, pool),
        None => base
            .and_then(|b| b.groups.clone())
            .and_then(|g| validate_groups(&g, n, meter.d, pool)),
    };

    if n == 0 {
        return fallback();
    }

    Bar {
        meter,
        groups,
        subdivisions,
        mask,
    }
}

fn validate_groups(groups: &[u8], n: usize, d: u8, pool: usize) -> Option<Vec<u8>> {
    match classify_groups(groups, n, d, pool) {
        Some(_) => Some(groups.to_vec()),
        None => {
            log::warn!(
                "normalize: dropping invalid group partition {:?} (n={}, d={}, pool={})",
                groups,
                n,
                d,
                pool
            );
            None
        }
    }
}

fn resize_subdivisions(source: &[u8], n: usize) -> Vec<u8> {
    let mut out: Vec<u8> = source
        .iter()
        .map(|&s| s.clamp(MIN_SUBDIVISION, MAX_SUBDIVISION))
        .collect();
    out.resize(n, 1);
    out
}

fn resize_mask(source: &[Vec<bool>], subdivisions: &[u8]) -> Vec<Vec<bool>> {
    subdivisions
        .iter()
        .enumerate()
        .map(|(i, &s)| {
            let mut row = source.get(i).cloned().unwrap_or_default();
            row.resize(s as usize, true);
            row
        })
        .collect()
}

fn fingerprint_of(bpm: u32, bars: &[Bar], beat_guide: bool, loop_enabled: bool) -> u64 {
    let mut hasher = DefaultHasher::new();
    bpm.hash(&mut hasher);
    for bar in bars {
        bar.meter.hash(&mut hasher);
        bar.groups.hash(&mut hasher);
        bar.subdivisions.hash(&mut hasher);
        bar.mask.hash(&mut hasher);
    }
    beat_guide.hash(&mut hasher);
    loop_enabled.hash(&mut hasher);
    hasher.finish()
}
