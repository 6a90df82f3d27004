use anyhow::{Context, Result};
use clap::Parser;
use otogame_charter::exporter::ChartExport;
use otogame_player::result::{offset_hint, PlayResult};
use otogame_player::{InputEvent, InputHandler, JudgeWindow, KeyBindings, PlayRuntime, Tightness};
use std::path::PathBuf;

/// Extra time past the last note so every hold tail settles
const END_PADDING: f32 = 1.0;

#[derive(Parser, Debug)]
#[command(author, version, about = "Headless replay for Otogame charts", long_about = None)]
struct Args {
    /// Exported chart (JSON)
    #[arg(short, long)]
    chart: PathBuf,

    /// Recorded input log (JSON array of lane events)
    #[arg(short, long)]
    inputs: Option<PathBuf>,

    /// Play every note perfectly instead of replaying inputs
    #[arg(long)]
    autoplay: bool,

    /// Judge window (narrow, normal, wide)
    #[arg(long, default_value = "normal")]
    tightness: String,

    /// Timing offset added to every input, in ms
    #[arg(long, default_value = "0", allow_hyphen_values = true)]
    offset_ms: f32,

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

    let chart = ChartExport::load(&args.chart)
        .with_context(|| format!("failed to load chart {}", args.chart.display()))?;
    let tightness: Tightness = args.tightness.parse()?;
    let window = JudgeWindow::from_tightness(tightness);

    log::info!(
        "Chart: {} [{}] {} notes, {} lanes",
        chart.title,
        chart.difficulty,
        chart.notes.len(),
        chart.lanes
    );

    let end = chart
        .notes
        .iter()
        .map(|n| n.end_time())
        .fold(0.0f32, f32::max)
        + window.good
        + END_PADDING;
    let mut runtime = PlayRuntime::new(chart.notes.clone(), window, chart.lanes);

    if args.autoplay {
        runtime.autoplay(end);
    } else {
        let path = args
            .inputs
            .as_ref()
            .ok_or_else(|| anyhow::anyhow!("either --inputs or --autoplay is required"))?;
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read inputs {}", path.display()))?;
        let mut events: Vec<InputEvent> = serde_json::from_str(&content)?;
        events.sort_by(|a, b| a.timestamp.total_cmp(&b.timestamp));
        log::info!("Replaying {} input events", events.len());

        let mut handler = InputHandler::new(KeyBindings::default(), args.offset_ms);
        for event in events {
            if let Some(event) = handler.handle_lane_event(event) {
                runtime.sweep(event.timestamp);
                runtime.apply(&event);
            }
        }
    }

    runtime.sweep(end);
    if !runtime.is_finished() {
        log::warn!("Some notes were left unresolved");
    }

    print_summary(&runtime.snapshot());
    Ok(())
}

fn print_summary(result: &PlayResult) {
    let stats = result.error_stats();
    println!("\n=== Result ===");
    println!("Score     {} / {}", result.score, result.max_score);
    println!("Rank      {}", result.rank());
    println!("Accuracy  {:.2}%", result.accuracy());
    println!("Max combo {}", result.max_combo);
    println!(
        "PERFECT {} | GREAT {} | GOOD {} | MISS {}",
        result.counts.perfect, result.counts.great, result.counts.good, result.counts.miss
    );
    println!(
        "Avg error {:.1} ms | Avg deviation {:+.1} ms",
        stats.avg_abs_ms, stats.avg_signed_ms
    );
    println!("{}", offset_hint(stats.avg_signed_ms));
    println!("=== End Result ===\n");
}
