//! Mask normalization and pool-tick accounting (spec §4.A, invariant 3).

use crate::model::Meter;

/// Applies the beat-guide override: when enabled, slot 0 is forced audible
/// regardless of the caller-supplied mask.
pub fn mask_with_beat_guide(mask: &[bool], enabled: bool) -> Vec<bool> {
    let mut out = mask.to_vec();
    if enabled {
        if let Some(first) = out.first_mut() {
            *first = true;
        }
    }
    out
}

/// Number of sub-ticks in the flattened pool for a bar: `Σ S` when
/// `d == 4`, else `n` (one slot per beat).
pub fn pool_ticks(meter: Meter, subdivisions: &[u8]) -> usize {
    if meter.d == 4 {
        subdivisions.iter().map(|&s| s as usize).sum()
    } else {
        meter.n as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn beat_guide_forces_first_slot_audible() {
        let mask = mask_with_beat_guide(&[false, false, false], true);
        assert_eq!(mask, vec![true, false, false]);
    }

    #[test]
    fn beat_guide_off_leaves_mask_untouched() {
        let mask = mask_with_beat_guide(&[false, false], false);
        assert_eq!(mask, vec![false, false]);
    }

    #[test]
    fn pool_ticks_sums_subdivisions_only_for_quarter_denominator() {
        assert_eq!(pool_ticks(Meter::new(4, 4), &[1, 3, 1, 1]), 6);
        assert_eq!(pool_ticks(Meter::new(4, 8), &[1, 3, 1, 1]), 4);
    }
}
