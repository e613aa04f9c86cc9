//! Manually driven animation frames.
//!
//! [`ManualFrames`] is a [`FrameScheduler`] whose frames only fire when a test
//! calls [`advance`](ManualFrames::advance), so tick effects can be stepped
//! deterministically without a clock.

use std::fmt;
use std::sync::{Mutex, PoisonError};

use crate::effects::frame::{FrameCallback, FrameScheduler, Time};

// ---------------------------------------------------------------------------
// ManualFrames
// ---------------------------------------------------------------------------

/// A headless frame source for tests.
///
/// # Examples
///
/// ```ignore
/// use reactor_fx::testing::ManualFrames;
///
/// let frames = Arc::new(ManualFrames::new());
/// let work = tick(|t| t).send_with(&address, &(frames.clone() as Frames));
/// // ... poll `work` once so it requests a frame ...
/// frames.advance(16.0);
/// ```
#[derive(Default)]
pub struct ManualFrames {
    state: Mutex<FrameState>,
}

#[derive(Default)]
struct FrameState {
    now: Time,
    queue: Vec<FrameCallback>,
}

impl ManualFrames {
    /// Create a frame source at time zero with nothing queued.
    pub fn new() -> Self {
        Self::default()
    }

    /// Timestamp of the last fired frame.
    pub fn now(&self) -> Time {
        self.lock().now
    }

    /// Number of callbacks waiting for the next frame.
    pub fn pending(&self) -> usize {
        self.lock().queue.len()
    }

    /// Move time forward by `dt` milliseconds and fire one frame.
    ///
    /// Every callback queued before the call runs once with the new time.
    /// Callbacks requested while the frame fires wait for the next one.
    /// Returns how many callbacks ran.
    pub fn advance(&self, dt: Time) -> usize {
        let (now, due) = {
            let mut state = self.lock();
            state.now += dt;
            (state.now, std::mem::take(&mut state.queue))
        };
        let fired = due.len();
        for callback in due {
            callback(now);
        }
        fired
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, FrameState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl FrameScheduler for ManualFrames {
    fn request_frame(&self, callback: FrameCallback) {
        self.lock().queue.push(callback);
    }
}

impl fmt::Debug for ManualFrames {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.lock();
        f.debug_struct("ManualFrames")
            .field("now", &state.now)
            .field("pending", &state.queue.len())
            .finish()
    }
}

// ===========================================================================
// Tests
// ===========================================================================
