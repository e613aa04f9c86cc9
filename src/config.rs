//! Runtime configuration for frame scheduling.
//!
//! [`FxConfig`] is a plain builder-style struct. It derives `Deserialize` so a
//! host application can embed it in its own settings; missing fields fall back
//! to their defaults.

use std::time::Duration;

use serde::Deserialize;

use crate::error::{Error, Result};

// ---------------------------------------------------------------------------
// FxConfig
// ---------------------------------------------------------------------------

/// Configuration for the frame scheduler.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct FxConfig {
    /// Target frames per second for tick effects.
    pub fps: u32,
}

impl Default for FxConfig {
    fn default() -> Self {
        Self { fps: 60 }
    }
}

impl FxConfig {
    /// Create a new default config.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the target FPS (builder).
    pub fn with_fps(mut self, fps: u32) -> Self {
        self.fps = fps;
        self
    }

    /// Reject values the runtime cannot work with.
    pub fn validate(&self) -> Result<()> {
        if self.fps == 0 {
            return Err(Error::InvalidConfig {
                field: "fps",
                message: "must be greater than zero".into(),
            });
        }
        Ok(())
    }

    /// Duration of one frame. A zero fps is treated as one frame per second.
    pub fn frame_period(&self) -> Duration {
        Duration::from_secs_f64(1.0 / f64::from(self.fps.max(1)))
    }
}

// ===========================================================================
// Tests
// ===========================================================================
