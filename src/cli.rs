//! `tts-workbench` command surface.
//!
//! ```bash
//! tts-workbench synthesize lines.txt --voice narrator --split -o out/
//! tts-workbench merge a.wav b.wav c.wav -o merged.wav
//! tts-workbench cut take.wav --start 1.0 --end 2.0 -o trimmed.wav
//! tts-workbench gain take.wav --gain 1.5 -o louder.wav
//! tts-workbench info take.wav --json
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};

use crate::audio::{wav, PcmBuffer};
use crate::config::{self, AppConfig};
use crate::editor::{EditOutcome, EditorSession};
use crate::export::{export_workspace, DirectorySink};
use crate::input;
use crate::orchestrator::BatchSynthesizer;
use crate::session::{BatchProgress, SegmentStatus, Stitcher};
use crate::tts::HttpSynthesizer;

#[derive(Parser)]
#[command(
    name = "tts-workbench",
    about = "Batch speech synthesis and WAV editing",
    version
)]
pub struct Cli {
    /// Enable verbose (debug-level) logging.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Config file, created with defaults if missing.
    #[arg(long, global = true, default_value = config::CONFIG_FILE)]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Synthesize every line of a text file and export one WAV per item.
    Synthesize {
        /// Text file: one item per line, or `label<TAB>text` with --labeled.
        input: PathBuf,

        /// Lines are `label<TAB>text`; labels may join several names with `&`.
        #[arg(long)]
        labeled: bool,

        /// Split each item into sentences before synthesis.
        #[arg(long)]
        split: bool,

        /// Speaker name sent to the backend.
        #[arg(long)]
        voice: Option<String>,

        #[arg(long)]
        speed: Option<f32>,

        #[arg(long)]
        volume: Option<f32>,

        #[arg(long)]
        pitch: Option<f32>,

        /// Maximum requests in flight.
        #[arg(long)]
        concurrency: Option<usize>,

        /// Backend base URL (the request goes to `<endpoint>/synthesize`).
        #[arg(long)]
        endpoint: Option<String>,

        /// Output directory; defaults to the configured one.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Concatenate WAV files end to end. Unreadable inputs are skipped.
    Merge {
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        #[arg(short, long)]
        output: PathBuf,
    },

    /// Remove the region [start, end) (in seconds) from a WAV file.
    Cut {
        input: PathBuf,

        #[arg(long)]
        start: f64,

        #[arg(long)]
        end: f64,

        #[arg(short, long)]
        output: PathBuf,
    },

    /// Scale loudness by a gain in 0.1..=3.0, optionally within a region.
    Gain {
        input: PathBuf,

        #[arg(long)]
        gain: f32,

        #[arg(long, requires = "end")]
        start: Option<f64>,

        #[arg(long, requires = "start")]
        end: Option<f64>,

        #[arg(short, long)]
        output: PathBuf,
    },

    /// Display format details of a WAV file.
    Info {
        input: PathBuf,

        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },
}

pub fn execute(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Synthesize {
            input,
            labeled,
            split,
            voice,
            speed,
            volume,
            pitch,
            concurrency,
            endpoint,
            output,
        } => {
            let mut config = config::load_or_create(&cli.config)
                .with_context(|| format!("Failed to load config: {}", cli.config.display()))?;
            config.apply_env_overrides();

            if let Some(voice) = voice {
                config.voice.spk_name = voice;
            }
            if let Some(speed) = speed {
                config.voice.speed = speed;
            }
            if let Some(volume) = volume {
                config.voice.volume = volume;
            }
            if let Some(pitch) = pitch {
                config.voice.pitch = pitch;
            }
            if let Some(concurrency) = concurrency {
                config.concurrency = concurrency;
            }
            if let Some(endpoint) = endpoint {
                config.endpoint = endpoint;
            }
            if let Some(output) = output {
                config.output_dir = output;
            }
            config.split_sentences |= split;
            config::normalize_config(&mut config);

            cmd_synthesize(&config, &input, labeled)
        }
        Commands::Merge { inputs, output } => cmd_merge(&inputs, &output),
        Commands::Cut {
            input,
            start,
            end,
            output,
        } => cmd_cut(&input, start, end, &output),
        Commands::Gain {
            input,
            gain,
            start,
            end,
            output,
        } => cmd_gain(&input, gain, start.zip(end), &output),
        Commands::Info { input, json } => cmd_info(&input, json),
    }
}

fn cmd_synthesize(config: &AppConfig, input: &Path, labeled: bool) -> Result<()> {
    if config.voice.spk_name.is_empty() {
        bail!("No voice selected: pass --voice or set TTS_VOICE");
    }

    let items = input::read_items(input, labeled)
        .with_context(|| format!("Failed to read input: {}", input.display()))?;

    let adapter = HttpSynthesizer::new(&config.endpoint, config.request_timeout())
        .context("Failed to create synthesis client")?;
    let synthesizer = BatchSynthesizer::new(Arc::new(adapter), config.batch_options());

    let runtime = tokio::runtime::Runtime::new().context("Failed to start async runtime")?;
    let mut report = runtime.block_on(synthesizer.run(&items, report_progress));

    let mut sink = DirectorySink::new(&config.output_dir);
    let manifest = export_workspace(&mut report.workspace, &mut sink)
        .with_context(|| format!("Failed to export to {}", config.output_dir.display()))?;

    let failed: usize = report
        .workspace
        .groups()
        .iter()
        .flat_map(|g| g.segments())
        .filter(|s| !s.is_playable())
        .count();

    println!(
        "Wrote {} files to {} ({} segments failed)",
        manifest.files.len(),
        config.output_dir.display(),
        failed
    );
    Ok(())
}

fn report_progress(progress: &BatchProgress) {
    match &progress.status {
        SegmentStatus::Completed => tracing::info!(
            "[{}/{}] {:.0}% item {} segment {} done",
            progress.processed,
            progress.total,
            progress.percent(),
            progress.group_index + 1,
            progress.segment_index + 1
        ),
        SegmentStatus::Failed { error } => tracing::warn!(
            "[{}/{}] {:.0}% item {} segment {} failed: {}",
            progress.processed,
            progress.total,
            progress.percent(),
            progress.group_index + 1,
            progress.segment_index + 1,
            error
        ),
    }
}

fn cmd_merge(inputs: &[PathBuf], output: &Path) -> Result<()> {
    let buffers: Vec<Option<PcmBuffer>> = inputs
        .iter()
        .map(|path| match wav::read_file(path) {
            Ok(buffer) => Some(buffer),
            Err(e) => {
                tracing::warn!("Skipping {}: {}", path.display(), e);
                None
            }
        })
        .collect();

    let merged = Stitcher::merge_buffers(buffers.iter().map(Option::as_ref));
    wav::write_file(output, &merged)
        .with_context(|| format!("Failed to write {}", output.display()))?;

    println!(
        "Merged {} of {} inputs into {} ({:.2}s)",
        buffers.iter().flatten().count(),
        inputs.len(),
        output.display(),
        merged.duration_secs()
    );
    Ok(())
}

fn open_session(input: &Path) -> Result<EditorSession> {
    let bytes =
        std::fs::read(input).with_context(|| format!("Failed to read {}", input.display()))?;
    EditorSession::open(&bytes).with_context(|| format!("Failed to decode {}", input.display()))
}

fn save_session(session: &EditorSession, output: &Path) -> Result<()> {
    std::fs::write(output, session.save())
        .with_context(|| format!("Failed to write {}", output.display()))
}

fn cmd_cut(input: &Path, start: f64, end: f64, output: &Path) -> Result<()> {
    let mut session = open_session(input)?;

    if let EditOutcome::NoOp(reason) = session.select_secs(start, end) {
        bail!("Invalid region {:.3}s..{:.3}s: {:?}", start, end, reason);
    }
    if let EditOutcome::NoOp(reason) = session.cut() {
        bail!("Nothing cut: {:?}", reason);
    }
    save_session(&session, output)?;

    println!(
        "Cut {:.3}s..{:.3}s, {:.2}s remaining -> {}",
        start,
        end,
        session.current().duration_secs(),
        output.display()
    );
    Ok(())
}

fn cmd_gain(input: &Path, gain: f32, region: Option<(f64, f64)>, output: &Path) -> Result<()> {
    let mut session = open_session(input)?;

    if let Some((start, end)) = region {
        if let EditOutcome::NoOp(reason) = session.select_secs(start, end) {
            bail!("Invalid region {:.3}s..{:.3}s: {:?}", start, end, reason);
        }
    }
    if let EditOutcome::NoOp(reason) = session.scale(gain) {
        bail!("Gain {} not applied: {:?}", gain, reason);
    }
    save_session(&session, output)?;

    println!(
        "Applied gain {:.2}, peak {:.3} -> {}",
        gain,
        session.current().peak(),
        output.display()
    );
    Ok(())
}

fn cmd_info(input: &Path, json: bool) -> Result<()> {
    let bytes =
        std::fs::read(input).with_context(|| format!("Failed to read {}", input.display()))?;
    let (format, data_len) =
        wav::probe(&bytes).with_context(|| format!("Failed to parse {}", input.display()))?;
    let buffer =
        wav::decode(&bytes).with_context(|| format!("Failed to decode {}", input.display()))?;

    if json {
        let info = serde_json::json!({
            "file": input.display().to_string(),
            "encoding": format!("{:?}", format.encoding),
            "channels": format.channels,
            "sample_rate": format.sample_rate,
            "bits_per_sample": format.bits_per_sample,
            "data_bytes": data_len,
            "samples": buffer.len(),
            "duration_secs": buffer.duration_secs(),
            "peak": buffer.peak(),
        });
        println!("{}", serde_json::to_string_pretty(&info)?);
        return Ok(());
    }

    println!("File:        {}", input.display());
    println!("Encoding:    {:?} {}-bit", format.encoding, format.bits_per_sample);
    println!("Channels:    {}", format.channels);
    println!("Sample rate: {} Hz", format.sample_rate);
    println!("Samples:     {}", buffer.len());
    println!("Duration:    {:.3}s", buffer.duration_secs());
    println!("Peak:        {:.3}", buffer.peak());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_gain_region_requires_both_bounds() {
        let parsed = Cli::try_parse_from([
            "tts-workbench", "gain", "in.wav", "--gain", "2", "--start", "1", "-o", "out.wav",
        ]);
        assert!(parsed.is_err());
    }

    #[test]
    fn test_synthesize_args() {
        let cli = Cli::try_parse_from([
            "tts-workbench", "-v", "synthesize", "lines.txt", "--split", "--voice", "narrator",
        ])
        .unwrap();
        assert!(cli.verbose);
        assert_eq!(cli.config, PathBuf::from(config::CONFIG_FILE));
        match cli.command {
            Commands::Synthesize { split, voice, .. } => {
                assert!(split);
                assert_eq!(voice.as_deref(), Some("narrator"));
            }
            _ => panic!("expected synthesize"),
        }
    }
}
