use anyhow::{Context, Result};
use clap::Parser;
use otogame_charter::audio::AudioData;
use otogame_charter::exporter::{ChartExport, ChartFormat};
use otogame_charter::worker::analyze_bpm_with_fallback;
use otogame_charter::{Charter, CharterConfig, Difficulty};
use std::path::{Path, PathBuf};
use std::sync::Arc;

const DEFAULT_CONFIG_FILE: &str = "otogame.toml";

#[derive(Parser, Debug)]
#[command(author, version, about = "Chart generator for Otogame", long_about = None)]
struct Args {
    /// Path to audio file (WAV)
    #[arg(short, long)]
    audio: PathBuf,

    /// Difficulty to generate (easy, normal, hard, all)
    #[arg(short, long, default_value = "all")]
    difficulty: String,

    /// Skip onset analysis and lay notes on the beat grid
    #[arg(long)]
    bgm: bool,

    /// Random seed; drawn at random when omitted
    #[arg(long)]
    seed: Option<u64>,

    /// Number of lanes (overrides the config file)
    #[arg(long)]
    lanes: Option<usize>,

    /// Chart format (json or chart)
    #[arg(long, default_value = "json")]
    format: String,

    /// Output directory for charts
    #[arg(short, long, default_value = ".")]
    output: PathBuf,

    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Only estimate the BPM and print it
    #[arg(long)]
    analyze_only: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let level = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_default_env()
        .filter_level(level.parse()?)
        .init();

    let audio = AudioData::load(&args.audio)
        .with_context(|| format!("failed to load {}", args.audio.display()))?;
    log::info!(
        "Loaded {} ({:.1}s, {} Hz, {} ch)",
        args.audio.display(),
        audio.duration(),
        audio.sample_rate,
        audio.channels
    );
    let mono = audio.to_mono();

    if args.analyze_only {
        let samples: Arc<[f32]> = mono.into();
        match analyze_bpm_with_fallback(samples, audio.sample_rate) {
            Some(bpm) => println!("BPM: {}", bpm),
            None => println!("BPM: unknown"),
        }
        return Ok(());
    }

    let format = ChartFormat::parse(&args.format)
        .ok_or_else(|| anyhow::anyhow!("Invalid format: {}", args.format))?;

    let mut config = load_config(args.config.as_deref())?;
    if let Some(lanes) = args.lanes {
        anyhow::ensure!(lanes > 0, "lane count must be at least 1");
        config.lanes = lanes;
    }
    let lanes = config.lanes;

    let seed = args.seed.unwrap_or_else(rand::random);
    log::info!("Seed: {} (pass --seed {} to reproduce)", seed, seed);

    let charter = Charter::new(config);
    let charts = if args.difficulty.eq_ignore_ascii_case("all") {
        charter.generate_all_difficulties(&mono, audio.sample_rate, args.bgm, seed)
    } else {
        let difficulty: Difficulty = args.difficulty.parse()?;
        vec![(
            difficulty,
            charter.synthesize(&mono, audio.sample_rate, difficulty, args.bgm, seed),
        )]
    };

    let title = args
        .audio
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "untitled".to_string());

    std::fs::create_dir_all(&args.output)?;
    let mut exports = Vec::with_capacity(charts.len());
    for (difficulty, chart) in &charts {
        let export = ChartExport::new(title.clone(), *difficulty, lanes, seed, chart);
        let filename = format!(
            "{}_{}.{}",
            title,
            difficulty.name().to_lowercase(),
            format.extension()
        );
        let output_path = args.output.join(&filename);

        export.save(&output_path, format)?;
        log::info!("Saved {} chart to: {}", difficulty, output_path.display());
        exports.push(export);
    }

    log::info!("Chart generation complete");
    print_summary(&exports);

    Ok(())
}

fn load_config(explicit: Option<&Path>) -> Result<CharterConfig> {
    if let Some(path) = explicit {
        return CharterConfig::load(path)
            .with_context(|| format!("failed to read config {}", path.display()));
    }

    let fallback = Path::new(DEFAULT_CONFIG_FILE);
    if fallback.exists() {
        log::info!("Using {}", DEFAULT_CONFIG_FILE);
        return Ok(CharterConfig::load(fallback)?);
    }

    Ok(CharterConfig::default())
}

fn print_summary(charts: &[ChartExport]) {
    println!("\n=== Chart Summary ===");
    for chart in charts {
        let bpm = chart
            .bpm
            .map(|b| b.to_string())
            .unwrap_or_else(|| "?".to_string());
        println!(
            "{:<8} | {:>4} notes | {:>3} holds | {} BPM | {:?}",
            chart.difficulty,
            chart.notes.len(),
            chart.hold_count(),
            bpm,
            chart.source
        );
    }
    println!("=== End Summary ===\n");
}
