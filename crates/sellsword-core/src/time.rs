//! Battle timing
//!
//! The turn engine advances on a fixed wall-clock cadence. `TickCadence` is the
//! configurable interval the runner's timer is built from.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default interval between battle ticks in milliseconds
pub const DEFAULT_TICK_INTERVAL_MS: u64 = 800;

/// Smallest accepted tick interval in milliseconds
pub const MIN_TICK_INTERVAL_MS: u64 = 1;

/// Errors that can occur when building a cadence
#[derive(Debug, Clone, thiserror::Error)]
pub enum CadenceError {
    #[error("Tick interval must be at least {MIN_TICK_INTERVAL_MS}ms, got {0}ms")]
    TooShort(u64),
}

/// Fixed interval between battle ticks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickCadence {
    /// Milliseconds between ticks
    pub interval_ms: u64,
}

impl Default for TickCadence {
    fn default() -> Self {
        Self {
            interval_ms: DEFAULT_TICK_INTERVAL_MS,
        }
    }
}

impl TickCadence {
    /// Create a cadence with the given interval
    pub fn from_millis(interval_ms: u64) -> Result<Self, CadenceError> {
        if interval_ms < MIN_TICK_INTERVAL_MS {
            return Err(CadenceError::TooShort(interval_ms));
        }
        Ok(Self { interval_ms })
    }

    /// The interval as a `Duration`
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms.max(MIN_TICK_INTERVAL_MS))
    }
}
