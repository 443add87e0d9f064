mod backend;
mod backends;
mod engine;
mod result;

pub use backend::DetectorBackend;
pub use backends::StubBackend;
#[cfg(feature = "backend-tract")]
pub use backends::TractBackend;
pub use engine::{round_display_confidence, InferenceEngine, ModelConfig};
pub use result::{BoundingBox, Detection, RawDetection};
