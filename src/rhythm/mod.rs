//! Rhythm Model (spec §4.A): pure functions over meter/groups/subdivisions.
//!
//! No I/O, no allocation beyond the returned vectors, no panics on
//! out-of-range input — invalid data degrades to a documented fallback.

pub mod accents;
pub mod groups;
pub mod mask;
pub mod plan;

pub use accents::derive_accents;
pub use groups::{can_fill, classify_groups};
pub use mask::{mask_with_beat_guide, pool_ticks};
pub use plan::{plan_beat, BeatPlan};
