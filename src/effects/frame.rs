//! Animation-frame scheduling for tick effects.
//!
//! A [`FrameScheduler`] calls a callback once, at the next frame, with the frame
//! timestamp in milliseconds. [`IntervalFrames`] is the default: it divides time
//! into fixed periods from its creation instant. A process-wide scheduler is
//! used by [`Effect::send`](super::Effect::send); tests and embedders can swap
//! it with [`set_scheduler`] or bypass it with
//! [`Effect::send_with`](super::Effect::send_with).

use std::fmt;
use std::sync::{Arc, OnceLock, PoisonError, RwLock};
use std::time::{Duration, Instant};

use tracing::{trace, warn};

use crate::config::FxConfig;

/// Frame timestamp in milliseconds since the scheduler's origin.
pub type Time = f64;

/// Callback run once when a frame fires.
pub type FrameCallback = Box<dyn FnOnce(Time) + Send>;

/// Shared handle to a scheduler.
pub type Frames = Arc<dyn FrameScheduler>;

/// Source of animation frames.
pub trait FrameScheduler: Send + Sync {
    /// Run `callback` exactly once, at the next frame.
    fn request_frame(&self, callback: FrameCallback);
}

// ---------------------------------------------------------------------------
// IntervalFrames
// ---------------------------------------------------------------------------

/// Fixed-rate frames measured from the instant the scheduler was created.
///
/// Frames are timed on the current tokio runtime. Requests made outside a
/// runtime are dropped with a warning.
#[derive(Clone)]
pub struct IntervalFrames {
    period: Duration,
    origin: Instant,
}

impl IntervalFrames {
    /// Frames at `fps` per second.
    pub fn new(fps: u32) -> Self {
        Self::from_config(&FxConfig::new().with_fps(fps))
    }

    /// Frames at the configured rate.
    pub fn from_config(config: &FxConfig) -> Self {
        Self {
            period: config.frame_period(),
            origin: Instant::now(),
        }
    }

    /// Length of one frame.
    pub fn period(&self) -> Duration {
        self.period
    }

    /// Milliseconds elapsed since the origin.
    pub fn now(&self) -> Time {
        self.origin.elapsed().as_secs_f64() * 1000.0
    }

    /// Offset from the origin of the first frame boundary after now.
    fn next_frame(&self) -> Duration {
        let period = self.period.as_nanos().max(1);
        let frames = self.origin.elapsed().as_nanos() / period + 1;
        Duration::from_nanos(u64::try_from(frames * period).unwrap_or(u64::MAX))
    }
}

impl fmt::Debug for IntervalFrames {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IntervalFrames")
            .field("period", &self.period)
            .finish()
    }
}

impl FrameScheduler for IntervalFrames {
    fn request_frame(&self, callback: FrameCallback) {
        let at = self.origin + self.next_frame();
        let frames = self.clone();
        trace!(at_ms = at.duration_since(self.origin).as_secs_f64() * 1000.0, "frame requested");
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    tokio::time::sleep_until(tokio::time::Instant::from_std(at)).await;
                    callback(frames.now());
                });
            }
            Err(_) => warn!("frame requested outside a tokio runtime, dropped"),
        }
    }
}

// ---------------------------------------------------------------------------
// Process-wide scheduler
// ---------------------------------------------------------------------------

static SCHEDULER: OnceLock<RwLock<Frames>> = OnceLock::new();

fn slot() -> &'static RwLock<Frames> {
    SCHEDULER.get_or_init(|| {
        let frames: Frames = Arc::new(IntervalFrames::from_config(&FxConfig::default()));
        RwLock::new(frames)
    })
}

/// The scheduler used by [`Effect::send`](super::Effect::send).
pub fn scheduler() -> Frames {
    Arc::clone(&slot().read().unwrap_or_else(PoisonError::into_inner))
}

/// Replace the process-wide scheduler. Effects already sent keep the old one.
pub fn set_scheduler(frames: Frames) {
    *slot().write().unwrap_or_else(PoisonError::into_inner) = frames;
}

/// Request one frame from the process-wide scheduler.
pub fn request_animation_frame(callback: impl FnOnce(Time) + Send + 'static) {
    scheduler().request_frame(Box::new(callback));
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ManualFrames;
    use std::sync::mpsc;

    #[test]
    fn next_frame_is_in_the_future() {
        let frames = IntervalFrames::new(1);
        assert_eq!(frames.period(), Duration::from_secs(1));
        let next = frames.next_frame();
        assert!(next > frames.origin.elapsed());
        assert_eq!(next.as_nanos() % frames.period().as_nanos(), 0);
    }

    #[tokio::test]
    async fn interval_frames_fire_on_tokio() {
        let frames = IntervalFrames::new(60);
        let (tx, rx) = tokio::sync::oneshot::channel();
        frames.request_frame(Box::new(move |time| {
            let _ = tx.send(time);
        }));
        let time = tokio::time::timeout(Duration::from_secs(1), rx)
            .await
            .unwrap()
            .unwrap();
        assert!(time > 0.0);
    }

    #[test]
    fn interval_frames_drop_requests_without_runtime() {
        let frames = IntervalFrames::new(60);
        let (tx, rx) = mpsc::channel::<Time>();
        frames.request_frame(Box::new(move |time| {
            let _ = tx.send(time);
        }));
        assert_eq!(rx.recv_timeout(Duration::from_millis(50)), Err(mpsc::RecvTimeoutError::Disconnected));
    }

    #[test]
    fn set_scheduler_swaps_global() {
        let manual = Arc::new(ManualFrames::new());
        set_scheduler(manual.clone());
        let (tx, rx) = mpsc::channel();
        request_animation_frame(move |time| {
            let _ = tx.send(time);
        });
        assert_eq!(manual.pending(), 1);
        manual.advance(16.0);
        assert_eq!(rx.try_recv().unwrap(), 16.0);

        set_scheduler(Arc::new(IntervalFrames::new(60)));
    }

    #[test]
    fn debug_format() {
        let dbg = format!("{:?}", IntervalFrames::new(4));
        assert!(dbg.contains("IntervalFrames"));
        assert!(dbg.contains("250ms"));
    }
}
