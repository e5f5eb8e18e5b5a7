//! Bar: one measure's meter, accent grouping, and subdivision/mask data.

use serde::{Deserialize, Serialize};

use super::meter::Meter;

/// One measure: a meter, an optional accent grouping, a pulse-subdivision
/// vector `S` of length `n`, and a pulse-mask matrix `M` with `M[i].len() ==
/// S[i]`.
///
/// `groups`, `subdivisions`, and `mask` are validated and normalized by
/// `normalize::normalize`, not by this constructor — a `Bar` built directly
/// may carry out-of-range data until it passes through the normalizer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub meter: Meter,
    pub groups: Option<Vec<u8>>,
    pub subdivisions: Vec<u8>,
    pub mask: Vec<Vec<bool>>,
}

impl Bar {
    /// A bar with every beat a single, audible, unaccented slot.
    pub fn simple(meter: Meter) -> Self {
        let n = meter.n as usize;
        Self {
            meter,
            groups: None,
            subdivisions: vec![1; n],
            mask: vec![vec![true]; n],
        }
    }
}

/// Reachability mode for a group partition, decided by which sum it matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GroupMode {
    /// Group sizes sum to `meter.n`; accents index by beat.
    Beat,
    /// Group sizes sum to `Σ S`; accents index by flattened sub-tick
    /// (`meter.d == 4` only).
    Pool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simple_bar_has_one_audible_slot_per_beat() {
        let bar = Bar::simple(Meter::new(4, 4));
        assert_eq!(bar.subdivisions, vec![1, 1, 1, 1]);
        assert_eq!(bar.mask, vec![vec![true]; 4]);
    }
}
