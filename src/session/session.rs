use super::errors::SessionError;
use super::monitor::{FrameSource, QualityMonitor};
use super::pipeline::{CaptureReport, ScanPipeline};
use crate::config::ScanConfig;
use crate::errors::ScanError;
use crate::identity::MarkerDecoder;
use crate::quality::{FrameQuality, FrameQualityAssessor};
use crate::store::{ResultStore, StudentDirectory};
use crate::timing::CaptureThrottle;
use crate::types::{Frame, Quiz};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SessionState {
    Open,
    Armed,
    Closed,
}

/// Result of a capture request that did not fail
#[derive(Debug, Clone)]
pub enum CaptureOutcome {
    /// Scored and handed to the result store
    Committed(Box<CaptureReport>),
    /// Ignored: the previous capture was accepted less than the minimum interval ago
    Throttled { retry_in: Duration },
    /// Ignored: another capture is still being processed
    Busy,
}

impl CaptureOutcome {
    pub fn report(&self) -> Option<&CaptureReport> {
        match self {
            CaptureOutcome::Committed(report) => Some(report.as_ref()),
            _ => None,
        }
    }
}

struct Inner {
    pipeline: ScanPipeline,
    assessor: FrameQualityAssessor,
    store: Arc<dyn ResultStore>,
    throttle: CaptureThrottle,
    tick_interval: Duration,
    /// Set while a capture is in flight; quality ticks are skipped meanwhile.
    in_flight: AtomicBool,
    /// Held by whichever of a capture or a quality tick is running.
    work: Mutex<()>,
    state: Mutex<SessionState>,
    monitor_cancel: Mutex<Option<Arc<watch::Sender<bool>>>>,
}

impl Inner {
    fn state(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn cancel_monitor(&self) {
        let cancel = self
            .monitor_cancel
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take();
        if let Some(cancel) = cancel {
            cancel.send_replace(true);
        }
    }

    /// Assess `frame` unless a capture is running. Returns `None` when skipped.
    fn assess_if_idle(&self, frame: &Frame) -> Option<FrameQuality> {
        if self.in_flight.load(Ordering::Acquire) {
            log::debug!("Quality tick skipped: capture in flight");
            return None;
        }
        let _work = match self.work.try_lock() {
            Ok(guard) => guard,
            Err(std::sync::TryLockError::Poisoned(e)) => e.into_inner(),
            Err(std::sync::TryLockError::WouldBlock) => {
                log::debug!("Quality tick skipped: pipeline busy");
                return None;
            }
        };
        Some(self.assessor.assess(frame))
    }
}

/// Clears the in-flight flag when a capture ends, however it ends.
struct InFlight<'a>(&'a AtomicBool);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// One scanning session: a quiz, its roster and result store, and at most
/// one capture pipeline active at a time.
#[derive(Clone)]
pub struct ScanSession {
    inner: Arc<Inner>,
}

impl ScanSession {
    pub fn new(
        config: ScanConfig,
        quiz: Quiz,
        directory: Arc<dyn StudentDirectory>,
        store: Arc<dyn ResultStore>,
    ) -> Result<Self, ScanError> {
        let pipeline = ScanPipeline::new(&config, quiz, directory)?;
        Ok(Self::from_pipeline(&config, pipeline, store))
    }

    /// Like [`new`](Self::new) with a custom marker decoder.
    pub fn with_marker_decoder(
        config: ScanConfig,
        quiz: Quiz,
        directory: Arc<dyn StudentDirectory>,
        store: Arc<dyn ResultStore>,
        marker: Box<dyn MarkerDecoder>,
    ) -> Result<Self, ScanError> {
        let pipeline = ScanPipeline::with_marker_decoder(&config, quiz, directory, marker)?;
        Ok(Self::from_pipeline(&config, pipeline, store))
    }

    fn from_pipeline(config: &ScanConfig, pipeline: ScanPipeline, store: Arc<dyn ResultStore>) -> Self {
        log::info!(
            "Scan session opened for quiz '{}' ({} questions, {} strategy)",
            pipeline.quiz().id,
            pipeline.quiz().total_questions,
            pipeline.strategy().kind()
        );
        Self {
            inner: Arc::new(Inner {
                pipeline,
                assessor: FrameQualityAssessor::new(&config.quality),
                store,
                throttle: CaptureThrottle::new(Duration::from_millis(
                    config.session.min_capture_interval_ms,
                )),
                tick_interval: Duration::from_millis(config.quality.tick_interval_ms),
                in_flight: AtomicBool::new(false),
                work: Mutex::new(()),
                state: Mutex::new(SessionState::Open),
                monitor_cancel: Mutex::new(None),
            }),
        }
    }

    pub fn pipeline(&self) -> &ScanPipeline {
        &self.inner.pipeline
    }

    pub fn is_armed(&self) -> bool {
        *self.inner.state() == SessionState::Armed
    }

    pub fn is_closed(&self) -> bool {
        *self.inner.state() == SessionState::Closed
    }

    /// Run identity, extraction and scoring on `frame` and commit the result.
    ///
    /// Requests arriving while another capture runs, or sooner than the
    /// minimum capture interval after the last accepted one, are ignored.
    /// Any stage failure aborts the capture without committing anything.
    pub fn capture_and_score(&self, frame: &Frame) -> Result<CaptureOutcome, ScanError> {
        let inner = &self.inner;
        if *inner.state() == SessionState::Closed {
            return Err(SessionError::closed().into());
        }

        if inner
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            log::warn!("Capture rejected: another capture is in flight");
            return Ok(CaptureOutcome::Busy);
        }
        let _in_flight = InFlight(&inner.in_flight);

        if let Err(retry_in) = inner.throttle.try_acquire() {
            log::warn!("Capture rejected: retry in {} ms", retry_in.as_millis());
            return Ok(CaptureOutcome::Throttled { retry_in });
        }

        let _work = inner.work.lock().unwrap_or_else(|e| e.into_inner());
        log::info!(
            "Capture started ({}x{} frame)",
            frame.width(),
            frame.height()
        );

        let report = match inner.pipeline.run(frame) {
            Ok(report) => report,
            Err(e) => {
                log::error!("Capture failed: {}", e);
                return Err(e);
            }
        };

        if let Err(e) = inner.store.commit(&report.record) {
            log::error!("Committing result for {} failed: {}", report.record.external_id, e);
            return Err(e);
        }

        log::info!(
            "Committed {} for {}: {} correct, {} wrong, score {} ({}%){}",
            report.record.record_id,
            report.record.external_id,
            report.record.correct_answers,
            report.record.wrong_answers,
            report.record.score,
            report.record.percentage,
            if report.record.verified { "" } else { " [unverified]" }
        );
        Ok(CaptureOutcome::Committed(Box::new(report)))
    }

    /// One quality assessment, skipped (`None`) while a capture is in flight.
    pub fn assess(&self, frame: &Frame) -> Option<FrameQuality> {
        self.inner.assess_if_idle(frame)
    }

    /// Start assessing the source's latest frame on the configured cadence.
    ///
    /// Must be called from within a tokio runtime.
    pub fn arm(&self, source: Arc<dyn FrameSource>) -> Result<QualityMonitor, SessionError> {
        let runtime = tokio::runtime::Handle::try_current().map_err(|_| SessionError::no_runtime())?;

        let mut state = self.inner.state();
        match *state {
            SessionState::Closed => return Err(SessionError::closed()),
            SessionState::Armed => return Err(SessionError::already_armed()),
            SessionState::Open => {}
        }

        let (cancel_tx, cancel_rx) = watch::channel(false);
        let cancel_tx = Arc::new(cancel_tx);
        let (quality_tx, quality_rx) = watch::channel(None);
        let period = self.inner.tick_interval;
        let weak = Arc::downgrade(&self.inner);

        let task = runtime.spawn(monitor_loop(weak, source, period, cancel_rx, quality_tx));

        *self
            .inner
            .monitor_cancel
            .lock()
            .unwrap_or_else(|e| e.into_inner()) = Some(cancel_tx.clone());
        *state = SessionState::Armed;
        log::info!("Session armed, assessing every {} ms", period.as_millis());

        Ok(QualityMonitor::new(quality_rx, cancel_tx, task))
    }

    /// Stop the quality monitor. The session stays open for captures.
    pub fn disarm(&self) -> Result<(), SessionError> {
        let mut state = self.inner.state();
        match *state {
            SessionState::Closed => return Err(SessionError::closed()),
            SessionState::Open => return Err(SessionError::not_armed()),
            SessionState::Armed => {}
        }
        self.inner.cancel_monitor();
        *state = SessionState::Open;
        log::info!("Session disarmed");
        Ok(())
    }

    /// Stop the monitor and refuse further captures.
    pub fn close(&self) -> Result<(), SessionError> {
        let mut state = self.inner.state();
        if *state == SessionState::Closed {
            return Err(SessionError::already_closed());
        }
        self.inner.cancel_monitor();
        *state = SessionState::Closed;
        log::info!("Session closed");
        Ok(())
    }
}

async fn monitor_loop(
    session: Weak<Inner>,
    source: Arc<dyn FrameSource>,
    period: Duration,
    mut cancel: watch::Receiver<bool>,
    quality: watch::Sender<Option<FrameQuality>>,
) {
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            biased;
            changed = cancel.changed() => {
                if changed.is_err() || *cancel.borrow() {
                    break;
                }
            }
            _ = ticker.tick() => {
                if *cancel.borrow() {
                    break;
                }
                let Some(inner) = session.upgrade() else {
                    break;
                };
                if let Some(frame) = source.latest_frame() {
                    if let Some(report) = inner.assess_if_idle(&frame) {
                        quality.send_replace(Some(report));
                    }
                }
            }
        }
    }
    log::debug!("Quality monitor stopped");
}
