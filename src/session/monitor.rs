use crate::quality::FrameQuality;
use crate::types::Frame;
use std::sync::{Arc, Mutex};
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Supplies the most recent preview frame to the quality monitor.
pub trait FrameSource: Send + Sync {
    fn latest_frame(&self) -> Option<Frame>;
}

/// A frame slot the capture side overwrites and the monitor reads.
#[derive(Debug, Default)]
pub struct LatestFrame {
    frame: Mutex<Option<Frame>>,
}

impl LatestFrame {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn publish(&self, frame: Frame) {
        *self.frame.lock().unwrap_or_else(|e| e.into_inner()) = Some(frame);
    }

    pub fn clear(&self) {
        *self.frame.lock().unwrap_or_else(|e| e.into_inner()) = None;
    }
}

impl FrameSource for LatestFrame {
    fn latest_frame(&self) -> Option<Frame> {
        self.frame.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

/// Handle to the periodic quality assessment of an armed session.
///
/// The latest report is published on a `watch` channel. Cancelling stops the
/// task before its next tick; the session cancels it too when disarmed or
/// closed.
#[derive(Debug)]
pub struct QualityMonitor {
    quality: watch::Receiver<Option<FrameQuality>>,
    cancel: Arc<watch::Sender<bool>>,
    task: JoinHandle<()>,
}

impl QualityMonitor {
    pub(crate) fn new(
        quality: watch::Receiver<Option<FrameQuality>>,
        cancel: Arc<watch::Sender<bool>>,
        task: JoinHandle<()>,
    ) -> Self {
        Self {
            quality,
            cancel,
            task,
        }
    }

    /// Most recent assessment, `None` until the first tick with a frame.
    pub fn latest(&self) -> Option<FrameQuality> {
        self.quality.borrow().clone()
    }

    /// A receiver that is notified on every new assessment.
    pub fn subscribe(&self) -> watch::Receiver<Option<FrameQuality>> {
        self.quality.clone()
    }

    pub fn cancel(&self) {
        self.cancel.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.cancel.borrow()
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Wait for the task to exit. Call after [`cancel`](Self::cancel).
    pub async fn stopped(self) {
        if let Err(e) = self.task.await {
            log::warn!("Quality monitor task ended abnormally: {}", e);
        }
    }
}
