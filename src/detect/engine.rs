//! Inference engine.
//!
//! Wraps a detector backend and converts its raw output into `Detection`
//! values: class ids resolved against the fixed label table, confidences
//! rounded for display.

use std::path::Path;

use anyhow::Result;

use crate::detect::backend::DetectorBackend;
use crate::detect::backends::StubBackend;
use crate::detect::result::Detection;
use crate::frame::Frame;
use crate::label::ClassLabel;
use crate::SentinelError;

/// Model parameters the engine needs to construct a real backend.
#[derive(Clone, Debug)]
pub struct ModelConfig {
    pub input_width: u32,
    pub input_height: u32,
    pub confidence_threshold: f32,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            input_width: 640,
            input_height: 640,
            confidence_threshold: 0.5,
        }
    }
}

/// Round a confidence up to two decimals for display.
///
/// Matches the annotation text the model's tooling shows (ceiling, not
/// nearest), so `0.905` renders as `0.91`. The epsilon keeps scores that are
/// already an exact hundredth from being pushed to the next one by their
/// binary representation (0.91 stays 0.91).
pub fn round_display_confidence(confidence: f32) -> f32 {
    let scaled = confidence as f64 * 100.0;
    ((scaled - 1e-6).ceil() / 100.0) as f32
}

/// Runs the model on frames and yields labelled detections.
pub struct InferenceEngine {
    backend: Box<dyn DetectorBackend>,
}

impl std::fmt::Debug for InferenceEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InferenceEngine").finish_non_exhaustive()
    }
}

impl InferenceEngine {
    pub fn new(backend: Box<dyn DetectorBackend>) -> Self {
        Self { backend }
    }

    /// Resolve the model artifact at process start.
    ///
    /// `stub://` models select the demo stub backend. A real path must exist
    /// (`ModelFileNotFound` otherwise, before any loop runs) and requires
    /// the backend-tract feature.
    pub fn from_model_path(model: &str, config: &ModelConfig) -> Result<Self> {
        if model.starts_with("stub://") {
            log::info!("InferenceEngine: using stub backend ({})", model);
            return Ok(Self::new(Box::new(StubBackend::demo())));
        }

        let path = Path::new(model);
        if !path.is_file() {
            return Err(SentinelError::ModelFileNotFound {
                path: path.to_path_buf(),
            }
            .into());
        }

        #[cfg(feature = "backend-tract")]
        {
            let backend = crate::detect::backends::TractBackend::new(
                path,
                config.input_width,
                config.input_height,
            )?
            .with_threshold(config.confidence_threshold);
            log::info!("InferenceEngine: loaded model {}", path.display());
            Ok(Self::new(Box::new(backend)))
        }
        #[cfg(not(feature = "backend-tract"))]
        {
            let _ = config;
            Err(anyhow::anyhow!(
                "model inference requires the backend-tract feature"
            ))
        }
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    pub fn warm_up(&mut self) -> Result<()> {
        self.backend.warm_up()
    }

    /// Run inference on one frame.
    ///
    /// An out-of-range class id aborts with `ModelContractViolation`: it
    /// means the weights and the label table are mismatched, which no amount
    /// of skipping individual detections can repair.
    pub fn detect(&mut self, frame: &Frame) -> Result<Vec<Detection>> {
        let raw = self
            .backend
            .detect(frame.pixels(), frame.width(), frame.height())?;

        raw.into_iter()
            .map(|det| {
                let label = ClassLabel::from_class_id(det.class_id)?;
                Ok(Detection {
                    label,
                    confidence: round_display_confidence(det.confidence),
                    bbox: det.bbox,
                })
            })
            .collect()
    }
}
