//! Display sinks.
//!
//! The worker emits each annotated frame to a sink for presentation. The
//! sink is also where "the user closed the window" comes back from: a sink
//! may answer `QuitRequested`, which the worker treats exactly like the
//! cancel flag.

use std::sync::mpsc::{sync_channel, Receiver, SyncSender, TrySendError};

use anyhow::Result;

use crate::frame::Frame;

/// What the sink wants the loop to do next.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SinkFlow {
    Continue,
    /// The presentation side is gone or the user asked to quit.
    QuitRequested,
}

/// Receives annotated frames for on-screen presentation.
pub trait DisplaySink: Send {
    fn present(&mut self, frame: Frame) -> Result<SinkFlow>;
}

/// Discards frames. Useful for headless runs and tests that only exercise
/// lifecycle.
#[derive(Default)]
pub struct NullSink;

impl DisplaySink for NullSink {
    fn present(&mut self, _frame: Frame) -> Result<SinkFlow> {
        Ok(SinkFlow::Continue)
    }
}

/// Bridges the worker to a presenter thread over a bounded channel.
///
/// Backpressure: when the presenter falls behind, the newest frame replaces
/// the wait; the frame is dropped rather than stalling the detection loop.
/// A dropped receiver reads as the user quitting.
pub struct ChannelSink {
    tx: SyncSender<Frame>,
    dropped: u64,
}

impl ChannelSink {
    /// Create the sink and the receiving end for the presenter.
    pub fn bounded(capacity: usize) -> (Self, Receiver<Frame>) {
        let (tx, rx) = sync_channel(capacity);
        (Self { tx, dropped: 0 }, rx)
    }

    pub fn frames_dropped(&self) -> u64 {
        self.dropped
    }
}

impl DisplaySink for ChannelSink {
    fn present(&mut self, frame: Frame) -> Result<SinkFlow> {
        match self.tx.try_send(frame) {
            Ok(()) => Ok(SinkFlow::Continue),
            Err(TrySendError::Full(_)) => {
                self.dropped += 1;
                if self.dropped % 100 == 1 {
                    log::debug!("display lagging, {} frames dropped so far", self.dropped);
                }
                Ok(SinkFlow::Continue)
            }
            Err(TrySendError::Disconnected(_)) => Ok(SinkFlow::QuitRequested),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channel_sink_delivers_frames() -> Result<()> {
        let (mut sink, rx) = ChannelSink::bounded(2);
        assert_eq!(sink.present(Frame::blank(8, 8))?, SinkFlow::Continue);
        assert_eq!(rx.recv().unwrap().width(), 8);
        Ok(())
    }

    #[test]
    fn full_channel_drops_instead_of_blocking() -> Result<()> {
        let (mut sink, rx) = ChannelSink::bounded(1);
        assert_eq!(sink.present(Frame::blank(8, 8))?, SinkFlow::Continue);
        assert_eq!(sink.present(Frame::blank(8, 8))?, SinkFlow::Continue);
        assert_eq!(sink.frames_dropped(), 1);
        drop(rx);
        Ok(())
    }

    #[test]
    fn disconnected_receiver_requests_quit() -> Result<()> {
        let (mut sink, rx) = ChannelSink::bounded(1);
        drop(rx);
        assert_eq!(sink.present(Frame::blank(8, 8))?, SinkFlow::QuitRequested);
        Ok(())
    }
}
