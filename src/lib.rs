//! PPE compliance sentinel.
//!
//! This crate implements the detection loop behind `sentineld`: frames are
//! pulled from a video source, run through a pre-trained PPE object-detection
//! model, filtered by the operator-selected mode, annotated with colored
//! bounding boxes and labels, and handed to a display sink.
//!
//! # Architecture
//!
//! One iteration of the loop, executed serially on a dedicated worker:
//!
//! 1. `source` pulls the next frame (blocking on device/file I/O)
//! 2. `detect` runs inference and applies the fixed class table
//! 3. `mode` decides, per detection, whether it is rendered
//! 4. `annotate` clamps the box and draws outline + label in place
//! 5. `sink` receives the annotated frame for presentation
//!
//! The controller owns the worker's lifecycle (`start`/`stop`/`join`) and the
//! cancel flag; at most one source is open at a time, and exactly one frame
//! is in flight.
//!
//! # Module Structure
//!
//! - `label`: the 10-entry class table and the total class→color policy
//! - `mode`: detection modes and the shared handle polled by the worker
//! - `frame`: owned RGB frame buffer, the unit of work per iteration
//! - `source`: frame sources (files, V4L2 devices, synthetic stubs)
//! - `detect`: detector backends and the inference engine
//! - `annotate`: bounding-box and label rendering
//! - `sink`: display sink trait and channel-backed implementation
//! - `controller`: run-state machine and worker lifecycle

use std::path::PathBuf;

pub mod annotate;
pub mod config;
pub mod controller;
pub mod detect;
pub mod frame;
pub mod label;
pub mod mode;
pub mod sink;
pub mod source;

pub use annotate::{AnnotationRenderer, LabelFont};
pub use config::SentineldConfig;
pub use controller::{DetectionController, RunState, RunSummary, StopHandle};
pub use detect::{
    BoundingBox, Detection, DetectorBackend, InferenceEngine, ModelConfig, RawDetection,
    StubBackend,
};
pub use frame::Frame;
pub use label::{ClassLabel, CLASS_COUNT};
pub use mode::{DetectionMode, SharedMode};
pub use sink::{ChannelSink, DisplaySink, NullSink, SinkFlow};
pub use source::{SourceSpec, SourceStats, VideoSource, VideoSourceConfig};

// -------------------- Error Taxonomy --------------------

/// Failures with a defined caller-facing meaning.
///
/// Everything else travels as a plain `anyhow::Error`; these variants are the
/// conditions callers are expected to match on (via `downcast_ref`) because
/// they change control flow: a rejected start, a startup abort, a run abort.
/// End-of-stream is deliberately absent: a finite source signals exhaustion
/// by returning no frame, not by failing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SentinelError {
    /// The device or file backing a source could not be opened. Reported to
    /// the caller; the loop never starts and nothing needs releasing.
    SourceUnavailable { source: String, reason: String },
    /// The pretrained weights file is missing at process start.
    ModelFileNotFound { path: PathBuf },
    /// The model emitted a class id outside the known label table. The model
    /// and the table are mismatched; the run aborts rather than skipping.
    ModelContractViolation { class_id: usize },
    /// `start()` was called while a worker is active. The existing run
    /// continues unaffected.
    AlreadyRunning,
}

impl std::fmt::Display for SentinelError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SentinelError::SourceUnavailable { source, reason } => {
                write!(f, "source '{}' unavailable: {}", source, reason)
            }
            SentinelError::ModelFileNotFound { path } => {
                write!(f, "model file not found: {}", path.display())
            }
            SentinelError::ModelContractViolation { class_id } => {
                write!(
                    f,
                    "model emitted class id {} outside the {}-entry label table",
                    class_id, CLASS_COUNT
                )
            }
            SentinelError::AlreadyRunning => {
                write!(f, "a detection run is already active")
            }
        }
    }
}

impl std::error::Error for SentinelError {}
