//! Testability harness utilities.
//!
//! Bounces a configuration through the push synthesizer to a WAV file and
//! collects its tick-event sequence, for use by integration tests and the
//! CLI's `render` subcommand.

pub mod fixtures;
