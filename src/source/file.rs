//! Synthetic frame source.
//!
//! `stub://` sources generate deterministic frames in-memory. They stand in
//! for real capture in tests and in default builds without the ffmpeg/v4l2
//! features, and they are the only backend that can simulate a finite clip
//! (`stub://name?frames=N`) so end-of-stream paths stay testable.

use std::time::Duration;

use anyhow::Result;

use super::VideoSourceConfig;
use crate::frame::Frame;

pub(super) struct SyntheticSource {
    width: u32,
    height: u32,
    /// Simulated capture interval; real sources block on I/O here.
    pace: Option<Duration>,
    /// Frames left to produce; `None` means unbounded.
    remaining: Option<u64>,
    frame_count: u64,
    scene_state: u8,
}

impl SyntheticSource {
    /// Parse the part after `stub://`. The only recognized parameter is
    /// `frames=N`; anything else is treated as a name and ignored.
    pub(super) fn parse(rest: &str, config: &VideoSourceConfig) -> Self {
        let remaining = rest
            .split_once('?')
            .and_then(|(_, query)| {
                query
                    .split('&')
                    .find_map(|pair| pair.strip_prefix("frames="))
            })
            .and_then(|value| value.parse::<u64>().ok());

        let pace = if config.target_fps > 0 {
            Some(Duration::from_millis(1000 / config.target_fps as u64))
        } else {
            None
        };

        Self {
            width: config.width,
            height: config.height,
            pace,
            remaining,
            frame_count: 0,
            scene_state: 0,
        }
    }

    pub(super) fn next_frame(&mut self) -> Result<Option<Frame>> {
        if let Some(remaining) = self.remaining.as_mut() {
            if *remaining == 0 {
                return Ok(None);
            }
            *remaining -= 1;
        }
        if let Some(pace) = self.pace {
            std::thread::sleep(pace);
        }
        self.frame_count += 1;

        let pixels = self.generate_synthetic_pixels();
        Frame::from_rgb24(self.width, self.height, pixels).map(Some)
    }

    /// Deterministic pattern with occasional "scene changes" so consumers
    /// that compare frames see variation.
    fn generate_synthetic_pixels(&mut self) -> Vec<u8> {
        let pixel_count = (self.width * self.height * 3) as usize;
        if self.frame_count % 50 == 0 {
            self.scene_state = self.scene_state.wrapping_add(1);
        }
        let mut pixels = vec![0u8; pixel_count];
        for (i, pixel) in pixels.iter_mut().enumerate() {
            *pixel = ((i as u64 + self.frame_count + self.scene_state as u64) % 256) as u8;
        }
        pixels
    }
}
