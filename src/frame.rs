//! Frame buffer type.
//!
//! A `Frame` is one RGB24 image pulled from a video source, the unit of work
//! per loop iteration. Ownership moves source → worker → sink; no frame is
//! retained across iterations, so the pipeline holds exactly one frame in
//! flight.

use anyhow::{anyhow, Result};
use image::RgbImage;

/// Owned RGB24 pixel buffer with dimensions.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Frame {
    width: u32,
    height: u32,
    /// Row-major RGB24, `width * height * 3` bytes.
    data: Vec<u8>,
}

impl Frame {
    /// Build a frame from raw RGB24 bytes, rejecting mismatched lengths.
    pub fn from_rgb24(width: u32, height: u32, data: Vec<u8>) -> Result<Self> {
        let expected = (width as usize)
            .checked_mul(height as usize)
            .and_then(|v| v.checked_mul(3))
            .ok_or_else(|| anyhow!("frame dimensions overflow"))?;
        if data.len() != expected {
            return Err(anyhow!(
                "expected {} RGB bytes for {}x{}, received {}",
                expected,
                width,
                height,
                data.len()
            ));
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// An all-black frame.
    pub fn blank(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![0u8; width as usize * height as usize * 3],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixels(&self) -> &[u8] {
        &self.data
    }

    /// RGB value at a pixel. Panics outside the frame; test helper mostly.
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 3] {
        assert!(x < self.width && y < self.height, "pixel out of bounds");
        let idx = ((y * self.width + x) * 3) as usize;
        [self.data[idx], self.data[idx + 1], self.data[idx + 2]]
    }

    /// Reinterpret the buffer as an `RgbImage` for drawing, in place.
    ///
    /// The closure gets a view backed by this frame's own allocation; the
    /// buffer is moved out and back rather than copied.
    pub fn with_image_mut<R>(&mut self, f: impl FnOnce(&mut RgbImage) -> R) -> R {
        let mut img: RgbImage =
            RgbImage::from_raw(self.width, self.height, std::mem::take(&mut self.data))
                .expect("frame buffer length is validated at construction");
        let out = f(&mut img);
        self.data = img.into_raw();
        out
    }
}
