//! Headless CLI: validate layer configs and run frame batches against the
//! recording backend, optionally driven by a WAV file.

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use wavescene::{
    Config, FontFetcher, FontLibrary, NullRenderer, PcmAnalyser, PlaceholderFontFetcher,
    SilentAnalyser, TypefaceFontFetcher, Visualizer,
};

#[derive(Parser)]
#[command(name = "wavescene", version, about = "Audio-reactive layer renderer")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Parse and validate a layer config file.
    Validate {
        /// Path to the config JSON.
        config: PathBuf,
    },
    /// Render a batch of frames headlessly and print scene statistics.
    Render {
        /// Path to the config JSON.
        config: PathBuf,
        /// WAV file feeding the analyser; silence when omitted.
        #[arg(long)]
        wav: Option<PathBuf>,
        /// Number of frames to render.
        #[arg(long, default_value_t = 300)]
        frames: u64,
        /// Analyser buffer length.
        #[arg(long, default_value_t = 128)]
        buffer_len: usize,
        /// Directory of typeface JSON files; a synthetic face when omitted.
        #[arg(long)]
        fonts: Option<PathBuf>,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    match Cli::parse().command {
        Command::Validate { config } => validate(&config),
        Command::Render {
            config,
            wav,
            frames,
            buffer_len,
            fonts,
        } => render(&config, wav.as_deref(), frames, buffer_len, fonts),
    }
}

fn load_config(path: &std::path::Path) -> anyhow::Result<Config> {
    let bytes = fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    let config: Config =
        serde_json::from_slice(&bytes).with_context(|| format!("parsing {}", path.display()))?;
    config.validate()?;
    Ok(config)
}

fn validate(path: &std::path::Path) -> anyhow::Result<()> {
    let config = load_config(path)?;
    println!(
        "ok: {} layer(s), background {}",
        config.layers.len(),
        config.background
    );
    Ok(())
}

fn render(
    config_path: &std::path::Path,
    wav: Option<&std::path::Path>,
    frames: u64,
    buffer_len: usize,
    fonts: Option<PathBuf>,
) -> anyhow::Result<()> {
    let config = load_config(config_path)?;

    let fetcher: Arc<dyn FontFetcher> = match fonts {
        Some(root) => Arc::new(TypefaceFontFetcher::new(root)),
        None => Arc::new(PlaceholderFontFetcher),
    };

    let mut visualizer = match wav {
        Some(path) => {
            let mut analyser = PcmAnalyser::new(buffer_len)?;
            let samples = read_wav_mono(path)?;
            tracing::info!(samples = samples.len(), path = %path.display(), "loaded audio");
            analyser.push_samples(&samples);
            Visualizer::new(
                config,
                Box::new(NullRenderer::default()),
                Box::new(analyser),
                FontLibrary::new(fetcher),
            )?
        }
        None => Visualizer::new(
            config,
            Box::new(NullRenderer::default()),
            Box::new(SilentAnalyser(buffer_len)),
            FontLibrary::new(fetcher),
        )?,
    };

    visualizer.run_frames(frames)?;
    // Text layers settle asynchronously; give them one extra frame.
    visualizer.tick()?;

    println!(
        "rendered {} frame(s): {} scene node(s), {} time / {} frequency extraction(s)",
        visualizer.frames_rendered(),
        visualizer.scene().len(),
        visualizer.time_extractions(),
        visualizer.frequency_extractions(),
    );
    visualizer.shutdown();
    Ok(())
}

/// Decode a WAV file to mono f32 in [-1, 1], averaging channels.
fn read_wav_mono(path: &std::path::Path) -> anyhow::Result<Vec<f32>> {
    let mut reader =
        hound::WavReader::open(path).with_context(|| format!("opening {}", path.display()))?;
    let spec = reader.spec();
    let channels = usize::from(spec.channels.max(1));

    let interleaved: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Float => reader
            .samples::<f32>()
            .collect::<Result<_, _>>()
            .context("decoding float samples")?,
        hound::SampleFormat::Int => {
            let scale = 1.0 / (1i64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f32 * scale))
                .collect::<Result<_, _>>()
                .context("decoding integer samples")?
        }
    };

    Ok(interleaved
        .chunks(channels)
        .map(|frame| frame.iter().sum::<f32>() / frame.len() as f32)
        .collect())
}
