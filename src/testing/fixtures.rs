//! WAV-bounce and tick-capture harness.
//!
//! Drives the push synthesizer's real-time-safe core (`engine::callback`)
//! synchronously, off the audio thread, so integration tests and the CLI's
//! `render` subcommand can assert on exact tick timing and inspect the
//! rendered audio without a sound card.

use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use anyhow::Result;
use tokio::sync::broadcast;

use crate::engine::backend::{AtomicAccentGains, PendingSlot};
use crate::engine::callback::SynthState;
use crate::model::{AccentGains, EngineConfig, TickEvent};

/// One rendered fixture: the quantized PCM samples and the tick sequence
/// that produced them.
pub struct RenderedFixture {
    pub sample_rate: u32,
    pub samples: Vec<i16>,
    pub ticks: Vec<TickEvent>,
}

/// Renders `config` through the push synthesizer for `duration_secs` of
/// audio at `sample_rate`, with `gains` applied throughout.
pub fn render(
    config: &EngineConfig,
    sample_rate: u32,
    click_duration_ms: f32,
    duration_secs: f64,
    gains: AccentGains,
) -> RenderedFixture {
    let (tick_tx, mut tick_rx) = broadcast::channel(4096);
    let (bar_tx, _bar_rx) = broadcast::channel(256);

    let atomic_gains = Arc::new(AtomicAccentGains::new(gains));
    let mut state = SynthState::new(
        config.clone(),
        Arc::new(PendingSlot::new()),
        atomic_gains,
        Arc::new(AtomicBool::new(false)),
        sample_rate,
        click_duration_ms,
        tick_tx,
        bar_tx,
    );

    let total_frames = (duration_secs * sample_rate as f64).round() as u64;
    let mut samples = Vec::with_capacity(total_frames as usize);
    for _ in 0..total_frames {
        samples.push(state.next_sample());
    }

    let mut ticks = Vec::new();
    while let Ok(tick) = tick_rx.try_recv() {
        ticks.push(tick);
    }

    RenderedFixture {
        sample_rate,
        samples,
        ticks,
    }
}

/// Bounces `fixture` to a mono 16-bit PCM WAV file.
pub fn write_wav(fixture: &RenderedFixture, path: &Path) -> Result<()> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: fixture.sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut writer = hound::WavWriter::create(path, spec)?;
    for &sample in &fixture.samples {
        writer.write_sample(sample)?;
    }
    writer.finalize()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::default_config;

    #[test]
    fn renders_the_expected_frame_count() {
        let config = default_config();
        let fixture = render(&config, 8_000, 10.0, 1.0, AccentGains::default());
        assert_eq!(fixture.samples.len(), 8_000);
    }

    #[test]
    fn steady_4_4_render_yields_four_downbeat_ticks_per_bar() {
        let config = default_config();
        let fixture = render(&config, 8_000, 10.0, 2.0, AccentGains::default());
        let downbeats = fixture
            .ticks
            .iter()
            .filter(|t| t.bar_index == 0 && t.beat_in_bar == 0 && t.sub_index == 0)
            .count();
        assert_eq!(downbeats, 1);
    }

    #[test]
    fn write_wav_round_trips_through_hound() {
        let config = default_config();
        let fixture = render(&config, 8_000, 10.0, 0.25, AccentGains::default());
        let dir = std::env::temp_dir();
        let path = dir.join("metronome_engine_fixture_test.wav");
        write_wav(&fixture, &path).unwrap();

        let reader = hound::WavReader::open(&path).unwrap();
        assert_eq!(reader.spec().sample_rate, 8_000);
        let _ = std::fs::remove_file(&path);
    }
}
