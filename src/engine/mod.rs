//! Engine module housing the reusable audio core.
//!
//! This module exposes trait-based backends (`backend`, spec §4.D/§4.E) and
//! the `EngineHandle` orchestration layer (`core`, spec §4.F) that presents
//! the facade's public start/stop/update contract over whichever backend is
//! active.

pub mod backend;
pub mod callback;
pub mod click;
pub mod core;

pub use backend::{AudioBackend, StubTimeSource, SystemTimeSource, TimeSource};
pub use core::EngineHandle;
