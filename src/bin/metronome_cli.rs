use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use metronome_engine::model::{AccentGains, PartialConfig};
use metronome_engine::normalize::{default_config, normalize};
use metronome_engine::testing::fixtures;
use serde::Serialize;

#[derive(Parser, Debug)]
#[command(name = "metronome_cli", about = "Deterministic render/validate harness for the metronome engine")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Bounce a configuration to a WAV file, and optionally its tick sequence to JSON.
    Render {
        /// Partial configuration JSON file; omit for the built-in default.
        #[arg(long)]
        config: Option<PathBuf>,
        #[arg(long, default_value_t = 48_000)]
        sample_rate: u32,
        #[arg(long, default_value_t = 2.0)]
        duration_secs: f64,
        #[arg(long, default_value = "out.wav")]
        output: PathBuf,
        #[arg(long)]
        ticks_output: Option<PathBuf>,
    },
    /// Stream the tick-event sequence for a fixed duration to stdout, without writing audio.
    Ticks {
        #[arg(long)]
        config: Option<PathBuf>,
        #[arg(long, default_value_t = 48_000)]
        sample_rate: u32,
        #[arg(long, default_value_t = 2.0)]
        duration_secs: f64,
    },
    /// Run a configuration patch through the normalizer and print the clamped result.
    Validate {
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

fn main() -> ExitCode {
    metronome_engine::init_logging();
    match run() {
        Ok(code) => code,
        Err(err) => {
            eprintln!("Error: {err:?}");
            ExitCode::from(1)
        }
    }
}

fn run() -> Result<ExitCode> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Render {
            config,
            sample_rate,
            duration_secs,
            output,
            ticks_output,
        } => run_render(config, sample_rate, duration_secs, output, ticks_output),
        Commands::Ticks {
            config,
            sample_rate,
            duration_secs,
        } => run_ticks(config, sample_rate, duration_secs),
        Commands::Validate { config } => run_validate(config),
    }
}

fn load_patch(path: Option<PathBuf>) -> Result<PartialConfig> {
    match path {
        None => Ok(PartialConfig::default()),
        Some(path) => {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("reading {}", path.display()))?;
            serde_json::from_str(&contents)
                .with_context(|| format!("parsing {} as a configuration patch", path.display()))
        }
    }
}

fn run_render(
    config: Option<PathBuf>,
    sample_rate: u32,
    duration_secs: f64,
    output: PathBuf,
    ticks_output: Option<PathBuf>,
) -> Result<ExitCode> {
    let patch = load_patch(config)?;
    let normalized = normalize(&default_config(), &patch);

    let fixture = fixtures::render(&normalized, sample_rate, 10.0, duration_secs, AccentGains::default());
    fixtures::write_wav(&fixture, &output).with_context(|| format!("writing {}", output.display()))?;
    println!(
        "Rendered {} frames ({} ticks) to {}",
        fixture.samples.len(),
        fixture.ticks.len(),
        output.display()
    );

    if let Some(path) = ticks_output {
        let json = serde_json::to_string_pretty(&fixture.ticks)?;
        fs::write(&path, json).with_context(|| format!("writing {}", path.display()))?;
    }

    Ok(ExitCode::from(0))
}

fn run_ticks(config: Option<PathBuf>, sample_rate: u32, duration_secs: f64) -> Result<ExitCode> {
    let patch = load_patch(config)?;
    let normalized = normalize(&default_config(), &patch);
    let fixture = fixtures::render(&normalized, sample_rate, 10.0, duration_secs, AccentGains::default());

    for tick in &fixture.ticks {
        println!("{}", serde_json::to_string(tick)?);
    }
    Ok(ExitCode::from(0))
}

fn run_validate(config: Option<PathBuf>) -> Result<ExitCode> {
    let patch = load_patch(config)?;
    let base = default_config();
    let normalized = normalize(&base, &patch);

    let report = ValidationReport {
        bpm: normalized.bpm,
        bar_count: normalized.bars.len(),
        loop_enabled: normalized.loop_enabled,
        beat_guide: normalized.beat_guide,
        fingerprint: normalized.fingerprint,
    };
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(ExitCode::from(0))
}

#[derive(Serialize)]
struct ValidationReport {
    bpm: u32,
    bar_count: usize,
    loop_enabled: bool,
    beat_guide: bool,
    fingerprint: u64,
}
