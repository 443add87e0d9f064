//! Lifecycle and end-to-end scenarios for the detection loop.
//!
//! Sources are finite synthetic clips (`stub://...?frames=N`) and backends
//! are scripted, so every scenario is deterministic: known detections on
//! known frames, then end-of-stream.

use anyhow::Result;

use ppe_sentinel::{
    AnnotationRenderer, BoundingBox, ChannelSink, DetectionController, DetectionMode,
    InferenceEngine, NullSink, RawDetection, RunState, RunSummary, SentinelError, SharedMode,
    SourceSpec, StubBackend, VideoSource, VideoSourceConfig,
};

const RED: [u8; 3] = [255, 0, 0];

fn open_stub(uri: &str) -> Result<VideoSource> {
    let spec: SourceSpec = uri.parse()?;
    // target_fps 0: no capture pacing, scenarios run at full speed.
    let config = VideoSourceConfig {
        target_fps: 0,
        ..VideoSourceConfig::default()
    };
    Ok(VideoSource::open(&spec, &config)?)
}

fn scripted_engine(frames: Vec<Vec<RawDetection>>) -> InferenceEngine {
    InferenceEngine::new(Box::new(StubBackend::scripted(frames)))
}

fn silent_engine() -> InferenceEngine {
    InferenceEngine::new(Box::new(StubBackend::silent()))
}

fn controller(mode: DetectionMode) -> DetectionController {
    DetectionController::new(SharedMode::new(mode))
}

#[test]
fn one_violation_frame_renders_one_red_box_then_idle() -> Result<()> {
    // Frame 1 carries one NO-Hardhat detection; the second pull is
    // end-of-stream.
    let source = open_stub("stub://clip?frames=1")?;
    let raw = RawDetection::new(5, 0.91, BoundingBox::new(10.0, 10.0, 50.0, 50.0));
    let engine = scripted_engine(vec![vec![raw]]);
    let (sink, frames) = ChannelSink::bounded(4);

    let mut controller = controller(DetectionMode::AllItems);
    controller.start(source, engine, AnnotationRenderer::new(None), Box::new(sink))?;
    let summary = controller.join()?;

    assert_eq!(
        summary,
        RunSummary {
            frames: 1,
            detections: 1,
            rendered: 1,
        }
    );
    assert_eq!(controller.run_state(), RunState::Idle);

    let frame = frames.try_recv().expect("exactly one annotated frame");
    assert!(frames.try_recv().is_err(), "no further frames");

    // Red 3-pixel outline along the clamped box edges.
    assert_eq!(frame.pixel(10, 45), RED);
    assert_eq!(frame.pixel(12, 45), RED);
    assert_eq!(frame.pixel(30, 49), RED);
    Ok(())
}

#[test]
fn vests_only_mode_excludes_hardhat_violations() -> Result<()> {
    let source = open_stub("stub://clip?frames=1")?;
    let raw = RawDetection::new(5, 0.91, BoundingBox::new(10.0, 10.0, 50.0, 50.0));
    let engine = scripted_engine(vec![vec![raw]]);
    let (sink, frames) = ChannelSink::bounded(4);

    let mut controller = controller(DetectionMode::VestsOnly);
    controller.start(source, engine, AnnotationRenderer::new(None), Box::new(sink))?;
    let summary = controller.join()?;

    assert_eq!(summary.frames, 1);
    assert_eq!(summary.detections, 1);
    assert_eq!(summary.rendered, 0, "hardhat detection must be filtered out");

    // The emitted frame is pixel-identical to what the source produced.
    let emitted = frames.try_recv().expect("frame still emitted");
    let mut pristine_source = open_stub("stub://clip?frames=1")?;
    let pristine = pristine_source.next_frame()?.expect("same first frame");
    assert_eq!(emitted, pristine);
    Ok(())
}

#[test]
fn second_start_is_rejected_while_running() -> Result<()> {
    let mut controller = controller(DetectionMode::AllItems);
    controller.start(
        open_stub("stub://site")?, // unbounded: runs until stopped
        silent_engine(),
        AnnotationRenderer::new(None),
        Box::new(NullSink),
    )?;

    let err = controller
        .start(
            open_stub("stub://other")?,
            silent_engine(),
            AnnotationRenderer::new(None),
            Box::new(NullSink),
        )
        .unwrap_err();
    assert_eq!(
        err.downcast_ref::<SentinelError>(),
        Some(&SentinelError::AlreadyRunning)
    );
    // The original run is untouched by the rejected start.
    assert_eq!(controller.run_state(), RunState::Running);

    controller.stop();
    controller.join()?;
    assert_eq!(controller.run_state(), RunState::Idle);
    Ok(())
}

#[test]
fn stop_then_join_terminates_and_controller_is_reusable() -> Result<()> {
    let mut controller = controller(DetectionMode::AllItems);
    controller.start(
        open_stub("stub://site")?,
        silent_engine(),
        AnnotationRenderer::new(None),
        Box::new(NullSink),
    )?;

    controller.stop();
    let summary = controller.join()?;
    assert!(summary.frames >= 1, "at least the in-flight frame completes");
    assert_eq!(controller.run_state(), RunState::Idle);

    // Re-entrant start after a clean stop.
    controller.start(
        open_stub("stub://clip?frames=2")?,
        silent_engine(),
        AnnotationRenderer::new(None),
        Box::new(NullSink),
    )?;
    let summary = controller.join()?;
    assert_eq!(summary.frames, 2);
    Ok(())
}

#[test]
fn join_is_idempotent_without_a_worker() -> Result<()> {
    let mut controller = controller(DetectionMode::AllItems);
    assert_eq!(controller.join()?, RunSummary::default());

    controller.start(
        open_stub("stub://clip?frames=1")?,
        silent_engine(),
        AnnotationRenderer::new(None),
        Box::new(NullSink),
    )?;
    controller.join()?;
    assert_eq!(controller.join()?, RunSummary::default());
    Ok(())
}

#[test]
fn closed_display_stops_the_loop_like_a_cancel() -> Result<()> {
    let (sink, frames) = ChannelSink::bounded(1);
    drop(frames); // the "window" is already gone

    let mut controller = controller(DetectionMode::AllItems);
    controller.start(
        open_stub("stub://site")?,
        silent_engine(),
        AnnotationRenderer::new(None),
        Box::new(sink),
    )?;
    let summary = controller.join()?;

    // The first emit observes the quit and the loop winds down cleanly.
    assert_eq!(summary.frames, 1);
    assert_eq!(controller.run_state(), RunState::Idle);
    Ok(())
}

#[test]
fn contract_violation_aborts_the_run_and_returns_to_idle() -> Result<()> {
    let raw = RawDetection::new(99, 0.88, BoundingBox::new(0.0, 0.0, 10.0, 10.0));
    let (sink, frames) = ChannelSink::bounded(4);

    let mut controller = controller(DetectionMode::AllItems);
    controller.start(
        open_stub("stub://clip?frames=3")?,
        scripted_engine(vec![vec![raw]]),
        AnnotationRenderer::new(None),
        Box::new(sink),
    )?;

    let err = controller.join().unwrap_err();
    assert_eq!(
        err.downcast_ref::<SentinelError>(),
        Some(&SentinelError::ModelContractViolation { class_id: 99 })
    );
    assert_eq!(controller.run_state(), RunState::Idle);
    // The offending frame never reached the display.
    assert!(frames.try_recv().is_err());
    Ok(())
}

#[test]
fn mode_changes_apply_to_the_running_loop() -> Result<()> {
    // The demo backend emits a NO-Hardhat detection on a frame cadence.
    // Under the initial VestsOnly mode nothing would ever render; anything
    // rendered proves the worker observed the mode flip without a restart.
    let spec: SourceSpec = "stub://site".parse()?;
    let small = VideoSourceConfig {
        target_fps: 0,
        width: 64,
        height: 48,
    };
    let source = VideoSource::open(&spec, &small)?;

    let mode = SharedMode::new(DetectionMode::VestsOnly);
    let mut controller = DetectionController::new(mode.clone());
    controller.start(
        source,
        InferenceEngine::new(Box::new(StubBackend::demo())),
        AnnotationRenderer::new(None),
        Box::new(NullSink),
    )?;

    mode.set(DetectionMode::HelmetsOnly);
    // Let the loop run across several demo emissions, then stop.
    std::thread::sleep(std::time::Duration::from_millis(200));
    controller.stop();
    let summary = controller.join()?;

    assert!(
        summary.rendered >= 1,
        "hardhat detections render once the mode includes them"
    );
    assert!(summary.rendered <= summary.detections);
    Ok(())
}
