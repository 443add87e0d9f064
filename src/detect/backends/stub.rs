use std::collections::VecDeque;

use anyhow::Result;

use crate::detect::backend::DetectorBackend;
use crate::detect::result::{BoundingBox, RawDetection};

/// Stub backend for builds without a real model.
///
/// Tests script it with exact per-frame outputs; the default daemon build
/// uses the demo pattern so the whole loop runs end-to-end without weights.
pub struct StubBackend {
    script: Script,
    frame_count: u64,
}

enum Script {
    /// Pop one entry per frame; empty afterwards.
    Scripted(VecDeque<Vec<RawDetection>>),
    /// A person walks through without a hardhat every few frames.
    Demo,
    /// Never detects anything.
    Silent,
}

impl StubBackend {
    /// Exact outputs for consecutive frames. Frames beyond the script see
    /// no detections.
    pub fn scripted(frames: Vec<Vec<RawDetection>>) -> Self {
        Self {
            script: Script::Scripted(frames.into()),
            frame_count: 0,
        }
    }

    pub fn demo() -> Self {
        Self {
            script: Script::Demo,
            frame_count: 0,
        }
    }

    pub fn silent() -> Self {
        Self {
            script: Script::Silent,
            frame_count: 0,
        }
    }

    fn demo_detections(frame_count: u64, width: u32, height: u32) -> Vec<RawDetection> {
        if frame_count % 30 != 1 {
            return Vec::new();
        }
        let w = width as f32;
        let h = height as f32;
        vec![
            // class 2 = Person
            RawDetection::new(2, 0.87, BoundingBox::new(w * 0.3, h * 0.2, w * 0.6, h * 0.9)),
            // class 5 = NO-Hardhat
            RawDetection::new(
                5,
                0.74,
                BoundingBox::new(w * 0.38, h * 0.2, w * 0.52, h * 0.35),
            ),
        ]
    }
}

impl DetectorBackend for StubBackend {
    fn name(&self) -> &'static str {
        "stub"
    }

    fn detect(&mut self, _pixels: &[u8], width: u32, height: u32) -> Result<Vec<RawDetection>> {
        self.frame_count += 1;
        let detections = match &mut self.script {
            Script::Scripted(frames) => frames.pop_front().unwrap_or_default(),
            Script::Demo => Self::demo_detections(self.frame_count, width, height),
            Script::Silent => Vec::new(),
        };
        Ok(detections)
    }
}
