//! V4L2 device source.
//!
//! Captures RGB24 frames from a local device node. The device and its
//! memory-mapped buffer stream are a self-referencing pair (the stream
//! borrows the device), held together with `ouroboros`; releasing the source
//! drops both and returns the device node to the system.

use anyhow::{Context, Result};
use ouroboros::self_referencing;

use super::VideoSourceConfig;
use crate::frame::Frame;

pub(super) struct V4l2Device {
    state: DeviceState,
    active_width: u32,
    active_height: u32,
}

#[self_referencing]
struct DeviceState {
    device: v4l::Device,
    #[borrows(mut device)]
    #[covariant]
    stream: v4l::prelude::MmapStream<'this, v4l::Device>,
}

impl V4l2Device {
    pub(super) fn open(index: u32, config: &VideoSourceConfig) -> Result<Self> {
        use v4l::buffer::Type;
        use v4l::video::Capture;

        let path = format!("/dev/video{}", index);
        let mut device =
            v4l::Device::with_path(&path).with_context(|| format!("open v4l2 device {}", path))?;

        let mut format = device.format().context("read v4l2 format")?;
        format.width = config.width;
        format.height = config.height;
        format.fourcc = v4l::FourCC::new(b"RGB3");

        let format = match device.set_format(&format) {
            Ok(format) => format,
            Err(err) => {
                log::warn!("V4l2Device: failed to set format on {}: {}", path, err);
                device
                    .format()
                    .context("read v4l2 format after set failure")?
            }
        };

        if config.target_fps > 0 {
            let params = v4l::video::capture::Parameters::with_fps(config.target_fps);
            if let Err(err) = device.set_params(&params) {
                log::warn!("V4l2Device: failed to set fps on {}: {}", path, err);
            }
        }

        let active_width = format.width;
        let active_height = format.height;

        let state = DeviceStateBuilder {
            device,
            stream_builder: |device| {
                v4l::prelude::MmapStream::with_buffers(device, Type::VideoCapture, 4)
                    .map_err(|err| anyhow::Error::new(err).context("create v4l2 buffer stream"))
            },
        }
        .try_build()?;

        log::info!(
            "V4l2Device: capturing {} at {}x{}",
            path,
            active_width,
            active_height
        );

        Ok(Self {
            state,
            active_width,
            active_height,
        })
    }

    /// Blocks until the device delivers a buffer. Devices never signal
    /// end-of-stream; the loop ends via stop instead.
    pub(super) fn next_frame(&mut self) -> Result<Option<Frame>> {
        use v4l::io::traits::CaptureStream;

        let (width, height) = (self.active_width, self.active_height);
        let pixels = self.state.with_mut(|fields| -> Result<Vec<u8>> {
            let (buf, _meta) = fields
                .stream
                .next()
                .map_err(|err| anyhow::Error::new(err).context("capture v4l2 frame"))?;
            Ok(buf.to_vec())
        })?;

        Frame::from_rgb24(width, height, pixels).map(Some)
    }
}
