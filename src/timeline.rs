//! Timeline State Machine (spec §4.C): the active-bar cursor and
//! apply-boundary commit rule shared by both schedulers.

use crate::model::ApplyBoundary;

/// Tracks which bar is active and where the beat cursor sits within it.
/// Both the pull scheduler and the push synthesizer drive one of these;
/// neither owns a second copy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimelineState {
    pub bar_index: usize,
    pub beat_in_bar: usize,
}

impl TimelineState {
    pub fn new(start_bar_index: usize) -> Self {
        Self {
            bar_index: start_bar_index,
            beat_in_bar: 0,
        }
    }

    /// True when the cursor is about to schedule a bar's first beat.
    pub fn is_downbeat(&self) -> bool {
        self.beat_in_bar == 0
    }

    /// Whether a pending snapshot should commit at this scheduling
    /// decision. `Now` commits at every beat; `NextBar` only at downbeats —
    /// the same rule serves both the pull and push disciplines (spec §9,
    /// "keep the apply_at semantics identical").
    pub fn should_commit(&self, boundary: ApplyBoundary) -> bool {
        match boundary {
            ApplyBoundary::Now => true,
            ApplyBoundary::NextBar => self.is_downbeat(),
        }
    }

    /// Advances the cursor by one beat, wrapping into the next bar once
    /// `beat_in_bar` reaches `beats_in_current_bar`. Returns `true` when a
    /// new bar was entered, so the caller can fire a bar-change
    /// notification exactly once per entry.
    pub fn advance(&mut self, beats_in_current_bar: usize, total_bars: usize, loop_enabled: bool) -> bool {
        self.beat_in_bar += 1;
        if self.beat_in_bar >= beats_in_current_bar {
            self.beat_in_bar = 0;
            self.bar_index = next_bar_index(self.bar_index, total_bars, loop_enabled);
            true
        } else {
            false
        }
    }
}

/// `(b + 1)` if another bar follows; `0` if looping past the last bar;
/// otherwise stays at the last bar.
pub fn next_bar_index(bar_index: usize, total_bars: usize, loop_enabled: bool) -> usize {
    if bar_index + 1 < total_bars {
        bar_index + 1
    } else if loop_enabled {
        0
    } else {
        bar_index
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn next_bar_index_advances_within_bounds() {
        assert_eq!(next_bar_index(0, 3, false), 1);
        assert_eq!(next_bar_index(1, 3, false), 2);
    }

    #[test]
    fn next_bar_index_wraps_only_when_looping() {
        assert_eq!(next_bar_index(2, 3, true), 0);
        assert_eq!(next_bar_index(2, 3, false), 2);
    }

    #[test]
    fn advance_wraps_beat_cursor_and_reports_bar_entry() {
        let mut state = TimelineState::new(0);
        assert!(!state.advance(4, 2, true));
        assert!(!state.advance(4, 2, true));
        assert!(!state.advance(4, 2, true));
        assert!(state.advance(4, 2, true));
        assert_eq!(state.bar_index, 1);
        assert_eq!(state.beat_in_bar, 0);
    }

    #[test]
    fn bar_swap_at_boundary_respects_new_bars_beat_count() {
        // Two-bar timeline: (4,4) then (3,4), loop on — scenario 4.
        let mut state = TimelineState::new(0);
        for _ in 0..3 {
            assert!(!state.advance(4, 2, true));
        }
        assert!(state.advance(4, 2, true));
        assert_eq!(state.bar_index, 1);

        for _ in 0..2 {
            assert!(!state.advance(3, 2, true));
        }
        assert!(state.advance(3, 2, true));
        assert_eq!(state.bar_index, 0);
    }

    #[test]
    fn should_commit_now_always_true() {
        let state = TimelineState::new(0);
        assert!(state.should_commit(ApplyBoundary::Now));
    }

    #[test]
    fn should_commit_next_bar_only_on_downbeat() {
        let mut state = TimelineState::new(0);
        assert!(state.should_commit(ApplyBoundary::NextBar));
        state.advance(4, 1, false);
        assert!(!state.should_commit(ApplyBoundary::NextBar));
    }
}
