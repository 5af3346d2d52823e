use std::path::PathBuf;
use std::process;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;

use motionguard_core::blurring::domain::blur_intensity::BlurIntensity;
use motionguard_core::display::domain::display_sink::DisplaySink;
use motionguard_core::display::infrastructure::headless_display::HeadlessDisplay;
use motionguard_core::display::infrastructure::snapshot_display::SnapshotDisplay;
use motionguard_core::display::infrastructure::stdin_keys::spawn_stdin_keys;
use motionguard_core::pipeline::orchestrator::Pipeline;
use motionguard_core::pipeline::pipeline_config::{PipelineConfig, PresenterSettings};
use motionguard_core::pipeline::pipeline_state::{PipelineReport, RunOutcome};
use motionguard_core::video::infrastructure::ffmpeg_reader::FfmpegReader;

/// Live motion detection with adaptive blurring of moving regions.
///
/// Type `q` (or `esc`) followed by Enter to stop early.
#[derive(Parser)]
#[command(name = "motionguard")]
struct Cli {
    /// Input video file.
    video: PathBuf,

    /// Show motion boxes without blurring them.
    #[arg(long)]
    no_blur: bool,

    /// Blur strength: light, medium or heavy.
    #[arg(long, default_value = "medium")]
    blur_intensity: BlurIntensity,

    /// Write every presented frame as a PNG into this directory.
    #[arg(long)]
    snapshot_dir: Option<PathBuf>,

    /// Seconds the last frame stays up after the video ends.
    #[arg(long, value_parser = parse_seconds)]
    hold_seconds: Option<Duration>,
}

fn main() {
    env_logger::init();

    match run() {
        Ok(report) => process::exit(report.outcome.exit_code()),
        Err(e) => {
            eprintln!("Error: {e}");
            process::exit(1);
        }
    }
}

fn run() -> Result<PipelineReport, Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let interrupt = Arc::new(AtomicBool::new(false));
    let flag = interrupt.clone();
    ctrlc::set_handler(move || flag.store(true, Ordering::SeqCst))?;

    let config = PipelineConfig::new(cli.video)
        .with_blur(!cli.no_blur)
        .with_intensity(cli.blur_intensity);

    let mut presenter_settings = PresenterSettings::default();
    if let Some(hold) = cli.hold_seconds {
        presenter_settings.hold_duration = hold;
    }

    let display = build_display(cli.snapshot_dir);
    let mut pipeline = Pipeline::new(config, Box::new(FfmpegReader::new()), display)
        .with_presenter_settings(presenter_settings)
        .with_interrupt(interrupt);

    let report = pipeline.run()?;
    log::info!(
        "Run {}: {} messages discarded, {} workers force-killed",
        report.outcome,
        report.discarded_messages,
        report.force_killed.len()
    );
    if let RunOutcome::Failed { .. } = report.outcome {
        eprintln!("Error: {}", report.outcome);
    }
    Ok(report)
}

fn build_display(snapshot_dir: Option<PathBuf>) -> Box<dyn DisplaySink> {
    let keys = match spawn_stdin_keys() {
        Ok(keys) => Some(keys),
        Err(e) => {
            log::warn!("Keyboard input unavailable: {e}");
            None
        }
    };
    match (snapshot_dir, keys) {
        (Some(dir), Some(keys)) => Box::new(SnapshotDisplay::new(dir).with_keys(keys)),
        (Some(dir), None) => Box::new(SnapshotDisplay::new(dir)),
        (None, Some(keys)) => Box::new(HeadlessDisplay::new().with_keys(keys)),
        (None, None) => Box::new(HeadlessDisplay::new()),
    }
}

fn parse_seconds(value: &str) -> Result<Duration, String> {
    let secs: f64 = value
        .parse()
        .map_err(|_| format!("'{value}' is not a number of seconds"))?;
    if !secs.is_finite() || secs < 0.0 {
        return Err(format!("'{value}' must be a non-negative number of seconds"));
    }
    Ok(Duration::from_secs_f64(secs))
}
