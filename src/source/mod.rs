//! Frame sources.
//!
//! This module turns a device index or a file path into a sequential frame
//! producer:
//! - Local video files (feature: ingest-file-ffmpeg)
//! - V4L2 devices (feature: ingest-v4l2)
//! - Synthetic `stub://` sources (always available, used by tests and the
//!   default daemon build)
//!
//! A source holds exclusive access to its capture handle while open.
//! `next_frame()` returns `Ok(None)` once a finite source is exhausted;
//! `release()` drops the capture handle and is safe to call repeatedly, after
//! exhaustion, or never having produced a frame.

mod file;

#[cfg(feature = "ingest-v4l2")]
mod device;
#[cfg(feature = "ingest-file-ffmpeg")]
mod file_ffmpeg;

use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{anyhow, Result};

use crate::frame::Frame;
use crate::SentinelError;

use file::SyntheticSource;

#[cfg(feature = "ingest-v4l2")]
use device::V4l2Device;
#[cfg(feature = "ingest-file-ffmpeg")]
use file_ffmpeg::FfmpegFileSource;

/// Video container extensions the file picker offers.
const VIDEO_EXTENSIONS: [&str; 4] = ["mp4", "avi", "mov", "mkv"];

/// What to open: a capture device by index or a local video file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SourceSpec {
    Device(u32),
    File(PathBuf),
}

impl SourceSpec {
    pub fn describe(&self) -> String {
        match self {
            SourceSpec::Device(index) => format!("device:{}", index),
            SourceSpec::File(path) => path.display().to_string(),
        }
    }
}

impl FromStr for SourceSpec {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(anyhow!("source must not be empty"));
        }
        if let Ok(index) = trimmed.parse::<u32>() {
            return Ok(SourceSpec::Device(index));
        }
        if trimmed.starts_with("stub://") {
            return Ok(SourceSpec::File(PathBuf::from(trimmed)));
        }
        let path = Path::new(trimmed);
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase);
        match ext {
            Some(ext) if VIDEO_EXTENSIONS.contains(&ext.as_str()) => {
                Ok(SourceSpec::File(path.to_path_buf()))
            }
            _ => Err(anyhow!(
                "'{}' is not a supported video file (expected one of {})",
                trimmed,
                VIDEO_EXTENSIONS.join(", ")
            )),
        }
    }
}

impl std::fmt::Display for SourceSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.describe())
    }
}

/// Capture parameters shared by all backends.
#[derive(Clone, Debug)]
pub struct VideoSourceConfig {
    /// Target frame rate. Device backends negotiate it; synthetic sources
    /// pace to it. 0 disables pacing.
    pub target_fps: u32,
    /// Preferred frame width.
    pub width: u32,
    /// Preferred frame height.
    pub height: u32,
}

impl Default for VideoSourceConfig {
    fn default() -> Self {
        Self {
            target_fps: 10,
            width: 640,
            height: 480,
        }
    }
}

/// Statistics for a video source.
#[derive(Clone, Debug)]
pub struct SourceStats {
    pub frames_captured: u64,
    pub source: String,
}

enum SourceBackend {
    Synthetic(SyntheticSource),
    #[cfg(feature = "ingest-file-ffmpeg")]
    File(FfmpegFileSource),
    #[cfg(feature = "ingest-v4l2")]
    Device(V4l2Device),
}

/// A sequential frame producer over one capture handle.
pub struct VideoSource {
    /// `None` once released.
    backend: Option<SourceBackend>,
    description: String,
    frames_captured: u64,
}

impl std::fmt::Debug for VideoSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VideoSource")
            .field("description", &self.description)
            .field("frames_captured", &self.frames_captured)
            .finish_non_exhaustive()
    }
}

impl VideoSource {
    /// Open a source. Fails with `SourceUnavailable` when the device or file
    /// cannot be opened (including when the required ingestion feature is
    /// not compiled in).
    pub fn open(spec: &SourceSpec, config: &VideoSourceConfig) -> Result<Self> {
        let description = spec.describe();
        let backend = match spec {
            SourceSpec::File(path) => {
                let raw = path.to_string_lossy();
                if let Some(stub) = raw.strip_prefix("stub://") {
                    SourceBackend::Synthetic(SyntheticSource::parse(stub, config))
                } else if !path.is_file() {
                    return Err(unavailable(&description, "no such file"));
                } else {
                    open_file_backend(path, config, &description)?
                }
            }
            SourceSpec::Device(index) => open_device_backend(*index, config, &description)?,
        };

        log::info!("VideoSource: opened {}", description);
        Ok(Self {
            backend: Some(backend),
            description,
            frames_captured: 0,
        })
    }

    /// Pull the next frame. `Ok(None)` means the source is exhausted: the
    /// normal end of a finite file, not an error. After `release()` the
    /// source reads as exhausted.
    pub fn next_frame(&mut self) -> Result<Option<Frame>> {
        let Some(backend) = self.backend.as_mut() else {
            return Ok(None);
        };
        let frame = match backend {
            SourceBackend::Synthetic(source) => source.next_frame()?,
            #[cfg(feature = "ingest-file-ffmpeg")]
            SourceBackend::File(source) => source.next_frame()?,
            #[cfg(feature = "ingest-v4l2")]
            SourceBackend::Device(source) => source.next_frame()?,
        };
        if frame.is_some() {
            self.frames_captured += 1;
        }
        Ok(frame)
    }

    /// Drop the capture handle. Idempotent.
    pub fn release(&mut self) {
        if self.backend.take().is_some() {
            log::info!(
                "VideoSource: released {} after {} frames",
                self.description,
                self.frames_captured
            );
        }
    }

    pub fn is_released(&self) -> bool {
        self.backend.is_none()
    }

    pub fn stats(&self) -> SourceStats {
        SourceStats {
            frames_captured: self.frames_captured,
            source: self.description.clone(),
        }
    }
}

impl Drop for VideoSource {
    fn drop(&mut self) {
        self.release();
    }
}

#[cfg(feature = "ingest-file-ffmpeg")]
fn open_file_backend(
    path: &Path,
    _config: &VideoSourceConfig,
    description: &str,
) -> Result<SourceBackend> {
    FfmpegFileSource::open(path)
        .map(SourceBackend::File)
        .map_err(|e| unavailable(description, &format!("{e:#}")))
}

#[cfg(not(feature = "ingest-file-ffmpeg"))]
fn open_file_backend(
    _path: &Path,
    _config: &VideoSourceConfig,
    description: &str,
) -> Result<SourceBackend> {
    Err(unavailable(
        description,
        "file ingestion requires the ingest-file-ffmpeg feature",
    ))
}

#[cfg(feature = "ingest-v4l2")]
fn open_device_backend(
    index: u32,
    config: &VideoSourceConfig,
    description: &str,
) -> Result<SourceBackend> {
    V4l2Device::open(index, config)
        .map(SourceBackend::Device)
        .map_err(|e| unavailable(description, &format!("{e:#}")))
}

#[cfg(not(feature = "ingest-v4l2"))]
fn open_device_backend(
    _index: u32,
    _config: &VideoSourceConfig,
    description: &str,
) -> Result<SourceBackend> {
    Err(unavailable(
        description,
        "device capture requires the ingest-v4l2 feature",
    ))
}

fn unavailable(source: &str, reason: &str) -> anyhow::Error {
    SentinelError::SourceUnavailable {
        source: source.to_string(),
        reason: reason.to_string(),
    }
    .into()
}
