use anyhow::Result;

use crate::detect::result::RawDetection;

/// Detector backend trait.
///
/// Implementations run the pretrained model on one frame and report raw
/// detections. `detect` must be pure with respect to loop state: no side
/// effects beyond allocation, no retained pixel data, and the slice is
/// read-only and valid only for the duration of the call.
pub trait DetectorBackend: Send {
    /// Backend identifier.
    fn name(&self) -> &'static str;

    /// Run detection on an RGB24 frame.
    fn detect(&mut self, pixels: &[u8], width: u32, height: u32) -> Result<Vec<RawDetection>>;

    /// Optional warm-up hook.
    fn warm_up(&mut self) -> Result<()> {
        Ok(())
    }
}
