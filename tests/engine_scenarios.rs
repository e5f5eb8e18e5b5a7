//! End-to-end scenarios driven through the push synthesizer at a low sample
//! rate, so exact beat timing is reachable without rendering seconds of real
//! audio. Each test name matches the literal scenario it covers.

use metronome_engine::model::{AccentGains, AccentLevel, Bar, EngineConfig, GroupMode, Meter, PartialBar, PartialConfig};
use metronome_engine::normalize::{default_config, normalize};
use metronome_engine::rhythm::{classify_groups, derive_accents};
use metronome_engine::testing::fixtures::render;
use metronome_engine::timeline::TimelineState;

const SAMPLE_RATE: u32 = 8_000;

fn config_with_bars(bars: Vec<Bar>, bpm: u32, loop_enabled: bool) -> EngineConfig {
    EngineConfig {
        bpm,
        bars,
        start_bar_index: 0,
        loop_enabled,
        beat_guide: false,
        apply_boundary: metronome_engine::model::ApplyBoundary::NextBar,
        fingerprint: 0,
    }
}

#[test]
fn steady_4_4_at_120_bpm() {
    let config = default_config();
    let fixture = render(&config, SAMPLE_RATE, 10.0, 2.1, AccentGains::default());

    let downbeats: Vec<_> = fixture
        .ticks
        .iter()
        .filter(|t| t.sub_index == 0)
        .collect();

    assert!(downbeats.len() >= 4);
    for (i, tick) in downbeats.iter().enumerate().take(4) {
        let expected_ms = i as f64 * 500.0;
        assert!((tick.at_ms - expected_ms).abs() < 5.0, "tick {i}: {}", tick.at_ms);
        if tick.beat_in_bar == 0 {
            assert_eq!(tick.accent, AccentLevel::BarStrong);
        } else {
            assert_eq!(tick.accent, AccentLevel::SubdivWeak);
        }
    }
}

#[test]
fn grouped_11_8_accent_vector_matches_literal_scenario() {
    let meter = Meter::new(11, 8);
    let groups = [3u8, 3, 3, 2];
    assert_eq!(classify_groups(&groups, 11, 8, 11), Some(GroupMode::Beat));

    let accents = derive_accents(meter, Some(&groups), None);
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
fn per_beat_subdivision_mutes_the_middle_slot_of_the_second_beat() {
    let base = default_config();
    let patch = PartialConfig {
        bars: Some(vec![PartialBar {
            meter: Some((4, 4)),
            subdivisions: Some(vec![1, 3, 1, 1]),
            mask: Some(vec![
                vec![true],
                vec![true, false, true],
                vec![true],
                vec![true],
            ]),
            ..Default::default()
        }]),
        ..Default::default()
    };
    let config = normalize(&base, &patch);
    let fixture = render(&config, SAMPLE_RATE, 10.0, 1.1, AccentGains::default());

    let second_beat: Vec<_> = fixture
        .ticks
        .iter()
        .filter(|t| t.bar_index == 0 && t.beat_in_bar == 1)
        .take(3)
        .collect();

    assert_eq!(second_beat.len(), 3);
    assert!((second_beat[0].at_ms - 500.0).abs() < 5.0);
    assert!((second_beat[1].at_ms - 666.7).abs() < 5.0);
    assert!((second_beat[2].at_ms - 833.3).abs() < 5.0);
    assert!(!second_beat[1].audible);
    assert!(second_beat[0].audible);
    assert!(second_beat[2].audible);
    assert_eq!(second_beat[0].accent, AccentLevel::SubdivWeak);

    let downbeat = fixture
        .ticks
        .iter()
        .find(|t| t.bar_index == 0 && t.beat_in_bar == 0 && t.sub_index == 0)
        .unwrap();
    assert_eq!(downbeat.accent, AccentLevel::BarStrong);
}

#[test]
fn bar_swap_at_boundary_wraps_beat_cursor_per_new_meter() {
    let bars = vec![Bar::simple(Meter::new(4, 4)), Bar::simple(Meter::new(3, 4))];
    let config = config_with_bars(bars, 120, true);
    let fixture = render(&config, SAMPLE_RATE, 10.0, 2.5, AccentGains::default());

    let bar_one_downbeat = fixture
        .ticks
        .iter()
        .find(|t| t.bar_index == 1 && t.beat_in_bar == 0 && t.sub_index == 0);
    assert!(bar_one_downbeat.is_some(), "expected to enter bar index 1");

    let bar_one_beats: Vec<_> = fixture.ticks.iter().filter(|t| t.bar_index == 1).map(|t| t.beat_in_bar).collect();
    assert!(bar_one_beats.iter().all(|&b| b < 3), "bar 1 is 3/4, beat_in_bar must stay below 3");
}

#[test]
fn live_update_with_next_bar_boundary_defers_to_the_following_bar() {
    // Scenario 5: publishing a patch is covered at the unit level by
    // `PendingSlot`/`TimelineState`; this exercises the same commit rule
    // the schedulers rely on directly.
    let mut timeline = TimelineState::new(0);
    assert!(timeline.should_commit(metronome_engine::model::ApplyBoundary::NextBar));
    timeline.advance(4, 1, false);
    assert!(!timeline.should_commit(metronome_engine::model::ApplyBoundary::NextBar));
    timeline.advance(4, 1, false);
    timeline.advance(4, 1, false);
    timeline.advance(4, 1, false);
    assert!(timeline.should_commit(metronome_engine::model::ApplyBoundary::NextBar));
}

#[test]
fn beat_guide_forces_first_slot_audible_over_a_fully_muted_mask() {
    let base = default_config();
    let patch = PartialConfig {
        beat_guide: Some(true),
        bars: Some(vec![PartialBar {
            meter: Some((4, 4)),
            subdivisions: Some(vec![3, 1, 1, 1]),
            mask: Some(vec![vec![false, false, false], vec![true], vec![true], vec![true]]),
            ..Default::default()
        }]),
        ..Default::default()
    };
    let config = normalize(&base, &patch);
    assert!(config.beat_guide);

    let fixture = render(&config, SAMPLE_RATE, 10.0, 0.6, AccentGains::default());
    let beat_zero: Vec<_> = fixture
        .ticks
        .iter()
        .filter(|t| t.bar_index == 0 && t.beat_in_bar == 0)
        .take(3)
        .collect();

    assert_eq!(beat_zero.len(), 3);
    assert!(beat_zero[0].audible, "beat-guide must force slot 0 audible");
    assert!(!beat_zero[1].audible);
    assert!(!beat_zero[2].audible);
}
