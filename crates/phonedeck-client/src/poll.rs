//! Periodic screenshot refresh.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant};
use tracing::warn;

use phonedeck_core::ScreenshotFrame;

use crate::error::ClientError;
use crate::http::RequestClient;

/// Fixed refresh cadence while polling is enabled.
pub const SCREENSHOT_INTERVAL: Duration = Duration::from_millis(3000);

/// Source of screenshot frames.
///
/// The scheduler only needs this seam; [`RequestClient`] is the production
/// implementation.
#[async_trait]
pub trait FrameSource: Send + Sync + 'static {
    /// Fetch one frame.
    async fn fetch_frame(&self) -> Result<ScreenshotFrame, ClientError>;
}

#[async_trait]
impl FrameSource for RequestClient {
    async fn fetch_frame(&self) -> Result<ScreenshotFrame, ClientError> {
        self.screenshot().await
    }
}

/// Owns the single screenshot refresh timer.
///
/// The timer task handle is present iff polling is enabled. Disabling keeps
/// the last fetched frame available; a failed fetch is logged and skipped
/// without disturbing the schedule.
pub struct PollingScheduler<S: FrameSource> {
    source: Arc<S>,
    frame: Arc<Mutex<Option<ScreenshotFrame>>>,
    timer: Option<JoinHandle<()>>,
}

impl<S: FrameSource> PollingScheduler<S> {
    /// Create a disabled scheduler over the given frame source.
    pub fn new(source: S) -> Self {
        Self {
            source: Arc::new(source),
            frame: Arc::new(Mutex::new(None)),
            timer: None,
        }
    }

    /// Toggle polling.
    ///
    /// Enabling fetches one frame immediately and then once per
    /// [`SCREENSHOT_INTERVAL`]. Enabling while already enabled only adds an
    /// extra immediate fetch. Disabling stops the timer; the last frame
    /// stays available through [`PollingScheduler::latest_frame`].
    pub fn set_enabled(&mut self, enabled: bool) {
        if enabled {
            // Immediate fetch, out of band with the first tick.
            self.refresh_once();
            if self.timer.is_some() {
                return;
            }
            let source = Arc::clone(&self.source);
            let frame = Arc::clone(&self.frame);
            self.timer = Some(tokio::spawn(async move {
                let start = Instant::now() + SCREENSHOT_INTERVAL;
                let mut ticker = interval_at(start, SCREENSHOT_INTERVAL);
                loop {
                    ticker.tick().await;
                    fetch_into(source.as_ref(), &frame).await;
                }
            }));
        } else if let Some(timer) = self.timer.take() {
            timer.abort();
        }
    }

    /// True iff the refresh timer is armed.
    pub fn enabled(&self) -> bool {
        self.timer.is_some()
    }

    /// Fetch one frame now, independent of the schedule. Does not touch the
    /// timer's phase or any pending tick.
    pub fn refresh_once(&self) {
        let source = Arc::clone(&self.source);
        let frame = Arc::clone(&self.frame);
        tokio::spawn(async move {
            fetch_into(source.as_ref(), &frame).await;
        });
    }

    /// The last successfully fetched frame, if any.
    pub fn latest_frame(&self) -> Option<ScreenshotFrame> {
        self.frame
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl<S: FrameSource> Drop for PollingScheduler<S> {
    fn drop(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
    }
}

async fn fetch_into<S: FrameSource>(source: &S, frame: &Mutex<Option<ScreenshotFrame>>) {
    match source.fetch_frame().await {
        Ok(fetched) => {
            *frame.lock().unwrap_or_else(PoisonError::into_inner) = Some(fetched);
        }
        // Skip and keep the schedule; the next tick tries again.
        Err(err) => warn!(error = %err, "screenshot fetch failed"),
    }
}
