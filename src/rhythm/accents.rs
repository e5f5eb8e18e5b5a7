//! Accent vector derivation (spec §4.A, invariants 1-2 of §8).

use crate::model::{AccentLevel, GroupMode, Meter};

use super::groups::classify_groups;

/// Derives the accent vector for a bar (or, when `ticks_per_bar` is
/// supplied, for a flattened pool of sub-ticks).
///
/// Tick 0 is always `BarStrong`. A valid group partition marks the first
/// tick of every subsequent group `GroupMedium`; everything else is
/// `SubdivWeak`. With no groups, the default compound heuristic marks every
/// third tick `GroupMedium` for `d == 8` bars of 6, 9, or 12 beats. An
/// invalid partition (bad sum, size outside `[2, 8]`) falls back to the
/// no-groups path and never panics — `n == 0` yields an empty vector.
pub fn derive_accents(meter: Meter, groups: Option<&[u8]>, ticks_per_bar: Option<usize>) -> Vec<AccentLevel> {
    let n = ticks_per_bar.unwrap_or(meter.n as usize);
    if n == 0 {
        return Vec::new();
    }

    let mut accents = vec![AccentLevel::SubdivWeak; n];
    accents[0] = AccentLevel::BarStrong;

    match groups.and_then(|g| classify_groups(g, n, meter.d, n).map(|mode| (mode, g))) {
        Some((_mode, g)) => mark_group_starts(&mut accents, g),
        None => {
            if let Some(g) = groups {
                log::warn!(
                    "derive_accents: invalid group partition {:?} for {} ticks, falling back to defaults",
                    g,
                    n
                );
            }
            apply_default_compound(&mut accents, meter, n);
        }
    }

    accents
}

fn mark_group_starts(accents: &mut [AccentLevel], groups: &[u8]) {
    let mut cursor = 0usize;
    for (k, &size) in groups.iter().enumerate() {
        if k > 0 && cursor < accents.len() {
            accents[cursor] = AccentLevel::GroupMedium;
        }
        cursor += size as usize;
    }
}

fn apply_default_compound(accents: &mut [AccentLevel], meter: Meter, n: usize) {
    if meter.d == 8 && matches!(n, 6 | 9 | 12) {
        for i in (3..n).step_by(3) {
            accents[i] = AccentLevel::GroupMedium;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_meter_yields_empty_vector() {
        assert!(derive_accents(Meter::new(0, 4), None, None).is_empty());
    }

    #[test]
    fn index_zero_is_always_bar_strong() {
        let accents = derive_accents(Meter::new(4, 4), None, None);
        assert_eq!(accents[0], AccentLevel::BarStrong);
    }

    #[test]
    fn grouped_11_8_matches_literal_scenario() {
        let accents = derive_accents(Meter::new(11, 8), Some(&[3, 3, 3, 2]), None);
        use AccentLevel::*;
        assert_eq!(
            accents,
            vec![
                BarStrong, SubdivWeak, SubdivWeak, GroupMedium, SubdivWeak, SubdivWeak,
                GroupMedium, SubdivWeak, SubdivWeak, GroupMedium, SubdivWeak,
            ]
        );
    }

    #[test]
    fn default_compound_marks_every_third_tick_for_6_9_12_in_eighths() {
        let accents = derive_accents(Meter::new(9, 8), None, None);
        assert_eq!(accents[3], AccentLevel::GroupMedium);
        assert_eq!(accents[6], AccentLevel::GroupMedium);
        assert_eq!(accents[1], AccentLevel::SubdivWeak);
    }

    #[test]
    fn invalid_groups_fall_back_without_panicking() {
        let accents = derive_accents(Meter::new(4, 4), Some(&[1, 9]), None);
        assert_eq!(accents[0], AccentLevel::BarStrong);
        assert!(accents[1..].iter().all(|a| *a == AccentLevel::SubdivWeak));
    }

    #[test]
    fn ticks_per_bar_zero_is_a_legal_noop() {
        assert!(derive_accents(Meter::new(4, 4), None, Some(0)).is_empty());
    }
}
