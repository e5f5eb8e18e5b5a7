//! Per-beat scheduling plan shared by the pull scheduler and the push
//! synthesizer, so slot-index-to-accent routing (spec §9, "Accent model
//! switchpoint") lives in exactly one place instead of being duplicated
//! across both backends.

use crate::model::{AccentLevel, Bar, GroupMode};

use super::accents::derive_accents;
use super::groups::classify_groups;
use super::mask::{mask_with_beat_guide, pool_ticks};

/// Everything a scheduler needs to emit one beat's slots: how many there
/// are, their effective (beat-guide-applied) mask, and each slot's accent.
#[derive(Debug, Clone, PartialEq)]
pub struct BeatPlan {
    pub slot_count: usize,
    pub mask: Vec<bool>,
    pub accents: Vec<AccentLevel>,
}

/// Builds the plan for `beat_in_bar` within `bar`. When the bar's groups
/// classify as pool-mode, every slot indexes the flattened length-`Σ S`
/// accent vector at its cumulative sub-tick offset; otherwise slot 0
/// inherits the beat's own accent and every other slot is `SubdivWeak`.
pub fn plan_beat(bar: &Bar, beat_in_bar: usize, beat_guide: bool) -> BeatPlan {
    let slot_count = bar
        .subdivisions
        .get(beat_in_bar)
        .copied()
        .unwrap_or(1) as usize;

    let raw_mask = bar
        .mask
        .get(beat_in_bar)
        .cloned()
        .unwrap_or_else(|| vec![true; slot_count]);
    let mask = mask_with_beat_guide(&raw_mask, beat_guide);

    let pool = pool_ticks(bar.meter, &bar.subdivisions);
    let mode = bar
        .groups
        .as_ref()
        .and_then(|g| classify_groups(g, bar.meter.n as usize, bar.meter.d, pool));

    let accents = if mode == Some(GroupMode::Pool) {
        let pool_accents = derive_accents(bar.meter, bar.groups.as_deref(), Some(pool));
        let offset: usize = bar.subdivisions[..beat_in_bar].iter().map(|&s| s as usize).sum();
        (0..slot_count)
            .map(|i| pool_accents.get(offset + i).copied().unwrap_or(AccentLevel::SubdivWeak))
            .collect()
    } else {
        let beat_accents = derive_accents(bar.meter, bar.groups.as_deref(), None);
        let beat_accent = beat_accents.get(beat_in_bar).copied().unwrap_or(AccentLevel::SubdivWeak);
        (0..slot_count)
            .map(|i| if i == 0 { beat_accent } else { AccentLevel::SubdivWeak })
            .collect()
    };

    BeatPlan {
        slot_count,
        mask,
        accents,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Meter;

    #[test]
    fn single_slot_beat_inherits_beat_accent() {
        let bar = Bar::simple(Meter::new(4, 4));
        let plan = plan_beat(&bar, 0, false);
        assert_eq!(plan.slot_count, 1);
        assert_eq!(plan.accents, vec![AccentLevel::BarStrong]);
    }

    #[test]
    fn per_beat_subdivision_matches_literal_scenario_3() {
        let mut bar = Bar::simple(Meter::new(4, 4));
        bar.subdivisions = vec![1, 3, 1, 1];
        bar.mask = vec![vec![true], vec![true, false, true], vec![true], vec![true]];

        let plan = plan_beat(&bar, 1, false);
        assert_eq!(plan.slot_count, 3);
        assert_eq!(plan.mask, vec![true, false, true]);
        assert_eq!(plan.accents[0], AccentLevel::SubdivWeak);
        assert_eq!(plan.accents[1], AccentLevel::SubdivWeak);
        assert_eq!(plan.accents[2], AccentLevel::SubdivWeak);
    }

    #[test]
    fn beat_guide_forces_first_slot_even_when_fully_muted() {
        let mut bar = Bar::simple(Meter::new(4, 4));
        bar.subdivisions[0] = 3;
        bar.mask[0] = vec![false, false, false];

        let plan = plan_beat(&bar, 0, true);
        assert_eq!(plan.mask, vec![true, false, false]);
    }

    #[test]
    fn pool_mode_group_routes_by_cumulative_subtick_offset() {
        let mut bar = Bar::simple(Meter::new(4, 4));
        bar.subdivisions = vec![1, 3, 1, 1];
        bar.mask = vec![vec![true], vec![true, true, true], vec![true], vec![true]];
        bar.groups = Some(vec![3, 3]);

        let plan = plan_beat(&bar, 1, false);
        // pool has 6 ticks; group boundaries at offsets 0 and 3.
        // beat 1 occupies pool offsets 1..4, so offset 3 (plan index 2) is GroupMedium.
        assert_eq!(plan.accents[2], AccentLevel::GroupMedium);
    }
}
