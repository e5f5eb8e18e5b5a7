//! Engine error taxonomy (spec §7).

use log::error;
use std::fmt;

use super::ErrorCode;

/// Numeric error codes, stable across releases so external layers can
/// switch on an integer rather than match a Rust enum across an FFI
/// boundary.
///
/// Error code range: 3001-3006.
pub struct EngineErrorCodes;

impl EngineErrorCodes {
    /// Normalization dropped or clamped fields; never fatal.
    pub const CONFIG_INVALID: i32 = 3001;
    /// Host could not provide an output device or timeline at `start`.
    pub const AUDIO_UNAVAILABLE: i32 = 3002;
    /// Host rejected a buffer write mid-stream (push mode).
    pub const AUDIO_WRITE_FAILED: i32 = 3003;
    /// A single scheduled event failed to enqueue (pull mode).
    pub const HOST_EVENT_EXCEPTION: i32 = 3004;
    /// Worker did not exit within the grace window on `stop`.
    pub const STOP_TIMEOUT: i32 = 3005;
    /// A mutex/lock guarding shared engine state was poisoned.
    pub const LOCK_POISONED: i32 = 3006;
}

/// Errors surfaced by the engine facade and its backends.
///
/// `ConfigInvalid` is recovered locally and never fatal; the rest surface
/// via `onState(Error, detail)` per spec §7's propagation policy.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineError {
    ConfigInvalid { detail: String },
    AudioUnavailable { details: String },
    AudioWriteFailed { details: String },
    HostEventException { details: String },
    StopTimeout,
    LockPoisoned { component: String },
}

impl ErrorCode for EngineError {
    fn code(&self) -> i32 {
        match self {
            EngineError::ConfigInvalid { .. } => EngineErrorCodes::CONFIG_INVALID,
            EngineError::AudioUnavailable { .. } => EngineErrorCodes::AUDIO_UNAVAILABLE,
            EngineError::AudioWriteFailed { .. } => EngineErrorCodes::AUDIO_WRITE_FAILED,
            EngineError::HostEventException { .. } => EngineErrorCodes::HOST_EVENT_EXCEPTION,
            EngineError::StopTimeout => EngineErrorCodes::STOP_TIMEOUT,
            EngineError::LockPoisoned { .. } => EngineErrorCodes::LOCK_POISONED,
        }
    }

    fn message(&self) -> String {
        match self {
            EngineError::ConfigInvalid { detail } => format!("Configuration adjusted: {detail}"),
            EngineError::AudioUnavailable { details } => {
                format!("Audio output unavailable: {details}")
            }
            EngineError::AudioWriteFailed { details } => {
                format!("Audio buffer write failed: {details}")
            }
            EngineError::HostEventException { details } => {
                format!("Host scheduling event failed: {details}")
            }
            EngineError::StopTimeout => "Engine worker did not stop within the grace window".to_string(),
            EngineError::LockPoisoned { component } => format!("Lock poisoned for component: {component}"),
        }
    }
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EngineError::{:?} (code {}): {}", self, self.code(), self.message())
    }
}

impl std::error::Error for EngineError {}

/// Logs an engine error with structured context, mirroring the facade's
/// other diagnostics.
pub fn log_engine_error(err: &EngineError, context: &str) {
    error!(
        "Engine error in {}: code={}, message={}",
        context,
        err.code(),
        err.message()
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_match_taxonomy() {
        assert_eq!(
            EngineError::ConfigInvalid { detail: "x".into() }.code(),
            EngineErrorCodes::CONFIG_INVALID
        );
        assert_eq!(EngineError::StopTimeout.code(), EngineErrorCodes::STOP_TIMEOUT);
    }

    #[test]
    fn messages_surface_detail() {
        let err = EngineError::AudioUnavailable {
            details: "no output device".into(),
        };
        assert!(err.message().contains("no output device"));
    }

    #[test]
    fn display_includes_code() {
        let display = format!("{}", EngineError::HostEventException { details: "oops".into() });
        assert!(display.contains("3004"));
    }

    #[test]
    fn logging_does_not_panic() {
        log_engine_error(&EngineError::StopTimeout, "test_ctx");
    }
}
