//! sentineld - PPE detection daemon
//!
//! This daemon:
//! 1. Loads configuration (JSON file + SENTINEL_* env + CLI flags)
//! 2. Resolves the model artifact (missing weights abort startup)
//! 3. Opens the configured video source
//! 4. Runs the detection loop on a background worker
//! 5. Consumes annotated frames as a headless presenter
//! 6. Stops the loop cleanly on Ctrl-C

use anyhow::Result;
use clap::Parser;

use ppe_sentinel::{
    AnnotationRenderer, ChannelSink, DetectionController, DetectionMode, InferenceEngine,
    SentineldConfig, SharedMode, SourceSpec, VideoSource,
};

/// Frames buffered between the worker and the presenter.
const DISPLAY_QUEUE_DEPTH: usize = 4;

#[derive(Debug, Parser)]
#[command(name = "sentineld", about = "PPE compliance detection daemon")]
struct Args {
    /// Video source: device index, video file path, or stub:// URI.
    #[arg(long)]
    source: Option<String>,

    /// Detection mode: all, helmets, masks or vests.
    #[arg(long)]
    mode: Option<DetectionMode>,

    /// Model weights path, or stub:// for the built-in stub backend.
    #[arg(long)]
    model: Option<String>,

    /// Exit after presenting this many frames.
    #[arg(long)]
    max_frames: Option<u64>,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let mut cfg = SentineldConfig::load()?;
    if let Some(source) = args.source {
        cfg.source = source;
    }
    if let Some(mode) = args.mode {
        cfg.mode = mode;
    }
    if let Some(model) = args.model {
        cfg.model_path = model;
    }

    // Model resolution is fatal before anything else starts.
    let mut engine = InferenceEngine::from_model_path(&cfg.model_path, &cfg.model)?;
    engine.warm_up()?;
    log::info!(
        "sentineld {} backend={} mode={}",
        env!("CARGO_PKG_VERSION"),
        engine.backend_name(),
        cfg.mode
    );

    let renderer = AnnotationRenderer::with_discovered_font(cfg.font_path.as_deref());
    let spec: SourceSpec = cfg.source.parse()?;
    let source = VideoSource::open(&spec, &cfg.capture)?;

    let mut controller = DetectionController::new(SharedMode::new(cfg.mode));
    let stop = controller.stop_handle();
    ctrlc::set_handler(move || {
        log::info!("interrupt received, stopping detection loop");
        stop.stop();
    })?;

    let (sink, frames) = ChannelSink::bounded(DISPLAY_QUEUE_DEPTH);
    controller.start(source, engine, renderer, Box::new(sink))?;
    log::info!("detection loop running on {}", spec);

    // Headless presenter: drain annotated frames until the loop ends (or the
    // frame budget is spent, which reads to the worker as a closed display).
    let mut presented = 0u64;
    for frame in &frames {
        presented += 1;
        if presented % 30 == 1 {
            log::info!(
                "frame #{}: {}x{}",
                presented,
                frame.width(),
                frame.height()
            );
        }
        if args.max_frames.is_some_and(|max| presented >= max) {
            log::info!("frame budget reached, closing display");
            break;
        }
    }
    drop(frames);

    let summary = controller.join()?;
    log::info!(
        "sentineld exiting: {} frames, {} detections, {} rendered, {} presented",
        summary.frames,
        summary.detections,
        summary.rendered,
        presented
    );
    Ok(())
}
