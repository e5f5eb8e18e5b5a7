//! Runtime configuration for the scheduler's timing constants.
//!
//! These are host/ambient knobs (lookahead windows, default sample rate and
//! buffer size), not musical data — musical data lives in `model::EngineConfig`
//! and is produced by the normalizer. Loadable from a JSON file for fast
//! iteration without recompilation, falling back to defaults on any failure.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Complete engine settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineSettings {
    pub scheduler: SchedulerConfig,
    pub synth: SynthConfig,
}

/// Pull scheduler lookahead timing (spec §4.D).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Wake interval, in milliseconds.
    pub lookahead_ms: f64,
    /// Scheduling window size, in milliseconds.
    pub schedule_ahead_ms: f64,
    /// Initial offset before the first scheduled beat, in milliseconds.
    pub start_delay_ms: f64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            lookahead_ms: 25.0,
            schedule_ahead_ms: 180.0,
            start_delay_ms: 60.0,
        }
    }
}

/// Push synthesizer output parameters (spec §4.E).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SynthConfig {
    /// Default output sample rate, in Hz, when the host doesn't dictate one.
    pub default_sample_rate: u32,
    /// Internal processing buffer size, in frames.
    pub buffer_frames: usize,
    /// Click burst duration, in milliseconds.
    pub click_duration_ms: f32,
    /// Grace period the engine waits for the stream thread to exit on stop.
    pub stop_timeout_ms: u64,
}

impl Default for SynthConfig {
    fn default() -> Self {
        Self {
            default_sample_rate: 48_000,
            buffer_frames: 256,
            click_duration_ms: 10.0,
            stop_timeout_ms: 1200,
        }
    }
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            scheduler: SchedulerConfig::default(),
            synth: SynthConfig::default(),
        }
    }
}

impl EngineSettings {
    /// Loads settings from a JSON file, falling back to defaults on a
    /// missing file or parse failure.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Self {
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(settings) => {
                    log::info!("[Config] Loaded engine settings from {:?}", path.as_ref());
                    settings
                }
                Err(err) => {
                    log::warn!(
                        "[Config] Failed to parse JSON from {:?}: {}. Using defaults.",
                        path.as_ref(),
                        err
                    );
                    Self::default()
                }
            },
            Err(err) => {
                log::warn!(
                    "[Config] Failed to read settings file {:?}: {}. Using defaults.",
                    path.as_ref(),
                    err
                );
                Self::default()
            }
        }
    }

    /// Loads settings from the conventional `assets/engine_settings.json`
    /// path, falling back to defaults if absent.
    pub fn load() -> Self {
        Self::load_from_file("assets/engine_settings.json")
    }
}
