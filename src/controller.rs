//! Detection loop lifecycle.
//!
//! The controller owns the background worker that runs the detection loop
//! and exposes `start`/`stop`/`join` to the UI layer. State is an explicit
//! machine (Idle, Running, Stopping) shared with the worker
//! through one atomic, and cancellation is a second atomic that is set once
//! per run and polled by the worker after each emitted frame.
//!
//! The worker releases the frame source on every exit path: end-of-stream,
//! stop, sink quit, and any error inside the loop.

use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use anyhow::{anyhow, Result};

use crate::annotate::AnnotationRenderer;
use crate::detect::InferenceEngine;
use crate::mode::SharedMode;
use crate::sink::{DisplaySink, SinkFlow};
use crate::source::VideoSource;
use crate::SentinelError;

/// Seconds between periodic source-health log lines.
const HEALTH_LOG_INTERVAL: Duration = Duration::from_secs(5);

/// Lifecycle state of the detection loop.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum RunState {
    Idle = 0,
    Running = 1,
    Stopping = 2,
}

impl RunState {
    fn from_u8(value: u8) -> Self {
        match value {
            1 => RunState::Running,
            2 => RunState::Stopping,
            _ => RunState::Idle,
        }
    }
}

/// Counters reported by a finished run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub frames: u64,
    pub detections: u64,
    pub rendered: u64,
}

/// Clonable handle that can only request a stop; handed to signal handlers.
#[derive(Clone)]
pub struct StopHandle {
    state: Arc<AtomicU8>,
    cancel: Arc<AtomicBool>,
}

impl StopHandle {
    /// Request cancellation of the active run. No-op outside Running.
    pub fn stop(&self) {
        if RunState::from_u8(self.state.load(Ordering::SeqCst)) == RunState::Running {
            self.cancel.store(true, Ordering::SeqCst);
        }
    }
}

/// Owns the worker and the shared run state.
pub struct DetectionController {
    state: Arc<AtomicU8>,
    cancel: Arc<AtomicBool>,
    mode: SharedMode,
    worker: Option<JoinHandle<Result<RunSummary>>>,
}

impl DetectionController {
    pub fn new(mode: SharedMode) -> Self {
        Self {
            state: Arc::new(AtomicU8::new(RunState::Idle as u8)),
            cancel: Arc::new(AtomicBool::new(false)),
            mode,
            worker: None,
        }
    }

    /// Current loop state as the worker last reported it.
    pub fn run_state(&self) -> RunState {
        RunState::from_u8(self.state.load(Ordering::SeqCst))
    }

    /// The mode handle polled by the worker; clone it into the UI layer.
    pub fn mode(&self) -> SharedMode {
        self.mode.clone()
    }

    pub fn stop_handle(&self) -> StopHandle {
        StopHandle {
            state: self.state.clone(),
            cancel: self.cancel.clone(),
        }
    }

    /// Launch the detection loop over an opened source.
    ///
    /// Fails with `AlreadyRunning` while a worker is active; the existing
    /// run is left untouched. After a clean stop the controller is
    /// reusable; a finished worker is reaped here.
    pub fn start(
        &mut self,
        source: VideoSource,
        engine: InferenceEngine,
        renderer: AnnotationRenderer,
        sink: Box<dyn DisplaySink>,
    ) -> Result<()> {
        if let Some(handle) = self.worker.take() {
            if !handle.is_finished() {
                self.worker = Some(handle);
                return Err(SentinelError::AlreadyRunning.into());
            }
            // A finished but never-joined run: surface its outcome in the
            // log before the slot is reused.
            match handle.join() {
                Ok(Ok(summary)) => log::debug!("previous run: {:?}", summary),
                Ok(Err(e)) => log::warn!("previous run failed: {e:#}"),
                Err(_) => log::error!("previous detection worker panicked"),
            }
        }

        self.cancel.store(false, Ordering::SeqCst);
        self.state.store(RunState::Running as u8, Ordering::SeqCst);

        let worker = Worker {
            source,
            engine,
            renderer,
            sink,
            mode: self.mode.clone(),
            state: self.state.clone(),
            cancel: self.cancel.clone(),
        };

        let handle = std::thread::Builder::new()
            .name("detection-loop".into())
            .spawn(move || worker.run());
        match handle {
            Ok(handle) => {
                self.worker = Some(handle);
                Ok(())
            }
            Err(e) => {
                self.state.store(RunState::Idle as u8, Ordering::SeqCst);
                Err(anyhow!("failed to spawn detection worker: {e}"))
            }
        }
    }

    /// Request cancellation and return immediately. No-op outside Running.
    pub fn stop(&self) {
        self.stop_handle().stop();
    }

    /// Wait for the worker to exit and return its result. Idempotent: with
    /// no active worker this returns an empty summary.
    pub fn join(&mut self) -> Result<RunSummary> {
        let Some(handle) = self.worker.take() else {
            return Ok(RunSummary::default());
        };
        match handle.join() {
            Ok(result) => result,
            Err(_) => Err(anyhow!("detection worker panicked")),
        }
    }
}

/// Everything the loop owns while it runs.
struct Worker {
    source: VideoSource,
    engine: InferenceEngine,
    renderer: AnnotationRenderer,
    sink: Box<dyn DisplaySink>,
    mode: SharedMode,
    state: Arc<AtomicU8>,
    cancel: Arc<AtomicBool>,
}

impl Worker {
    fn run(mut self) -> Result<RunSummary> {
        let result = self.run_loop();
        // Teardown happens on every exit path, including errors.
        self.source.release();
        self.state.store(RunState::Idle as u8, Ordering::SeqCst);
        match &result {
            Ok(summary) => log::info!(
                "detection loop finished: {} frames, {} detections, {} rendered",
                summary.frames,
                summary.detections,
                summary.rendered
            ),
            Err(e) => log::error!("detection loop aborted: {e:#}"),
        }
        result
    }

    fn run_loop(&mut self) -> Result<RunSummary> {
        let mut summary = RunSummary::default();
        let mut last_health_log = Instant::now();

        loop {
            let Some(mut frame) = self.source.next_frame()? else {
                log::info!("source exhausted");
                break;
            };
            summary.frames += 1;

            let detections = self.engine.detect(&frame)?;
            summary.detections += detections.len() as u64;

            for detection in &detections {
                // The mode is read once per detection, not per frame, so an
                // operator change lands mid-frame.
                if !self.mode.get().includes(detection.label) {
                    continue;
                }
                self.renderer.render(&mut frame, detection);
                summary.rendered += 1;
            }

            match self.sink.present(frame)? {
                SinkFlow::Continue => {}
                SinkFlow::QuitRequested => {
                    log::info!("display sink requested quit");
                    self.state
                        .store(RunState::Stopping as u8, Ordering::SeqCst);
                    break;
                }
            }

            if self.cancel.load(Ordering::SeqCst) {
                log::info!("stop requested");
                self.state
                    .store(RunState::Stopping as u8, Ordering::SeqCst);
                break;
            }

            if last_health_log.elapsed() >= HEALTH_LOG_INTERVAL {
                let stats = self.source.stats();
                log::info!(
                    "source {} frames={} detections={}",
                    stats.source,
                    stats.frames_captured,
                    summary.detections
                );
                last_health_log = Instant::now();
            }
        }

        Ok(summary)
    }
}
