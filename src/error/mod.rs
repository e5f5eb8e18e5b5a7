//! Error types for the metronome engine.
//!
//! Structured error handling with stable numeric codes, following the same
//! shape as the rest of the engine's diagnostics: an `ErrorCode` trait, a
//! `Display`/`std::error::Error` impl, and a `log_*_error` helper.

mod engine;

pub use engine::{log_engine_error, EngineError, EngineErrorCodes};

/// Standard way to get an error code and message from an engine error type.
pub trait ErrorCode {
    /// The numeric error code.
    fn code(&self) -> i32;

    /// The human-readable error message.
    fn message(&self) -> String;
}
