//! Driver configuration parameters
//!
//! All tunable parameters of one TCS3200 instance.  The application builds
//! a [`SensorConfig`] (or deserialises one) and hands it to the driver,
//! which validates it before touching any line.

use serde::{Deserialize, Serialize};

use crate::drivers::lines::FrequencyDivider;
use crate::error::{Error, Result};

/// Core sensor configuration
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SensorConfig {
    // --- Measurement window ---
    /// OUT cycles timed per measurement (the window spans `target_cycles + 1` edges)
    pub target_cycles: u32,
    /// Abort a measurement when the window has not closed after this many ms
    pub timeout_ms: u32,
    /// Sleep between completion checks on the polling path (ms)
    pub poll_interval_ms: u32,

    // --- Calibration ---
    /// Value a component reads when it matches the white reference
    pub max_component: u16,

    // --- Sensor ---
    /// Output frequency scaling applied at construction
    pub divider: FrequencyDivider,
    /// Promote per-measurement diagnostics to `info` level
    pub debug: bool,
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self {
            target_cycles: 100,
            timeout_ms: 5000,
            poll_interval_ms: 10,

            max_component: 255,

            divider: FrequencyDivider::TwoPercent,
            debug: false,
        }
    }
}

impl SensorConfig {
    /// Reject values the measurement core cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.target_cycles == 0 {
            return Err(Error::InvalidConfiguration("target_cycles must be at least 1"));
        }
        if self.timeout_ms == 0 {
            return Err(Error::InvalidConfiguration("timeout_ms must be at least 1"));
        }
        if self.poll_interval_ms == 0 {
            return Err(Error::InvalidConfiguration("poll_interval_ms must be at least 1"));
        }
        if self.poll_interval_ms > self.timeout_ms {
            return Err(Error::InvalidConfiguration(
                "poll_interval_ms must not exceed timeout_ms",
            ));
        }
        if self.max_component == 0 {
            return Err(Error::InvalidConfiguration("max_component must be at least 1"));
        }
        Ok(())
    }
}
