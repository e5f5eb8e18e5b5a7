//! Core data model: meters, bars, ticks, and the canonical engine config.
//!
//! Mirrors spec §3 exactly; all types here are plain data, serde-enabled so
//! an external preset layer (out of scope for this crate) can persist and
//! restore an `EngineConfig` round-trip.

pub mod bar;
pub mod config;
pub mod meter;
pub mod tick;

pub use bar::{Bar, GroupMode};
pub use config::{ApplyBoundary, EngineConfig, PartialBar, PartialConfig, State};
pub use meter::{AccentGains, AccentLevel, Meter};
pub use tick::TickEvent;
