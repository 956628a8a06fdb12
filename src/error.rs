//! Unified error types for the TCS3200 driver.
//!
//! A single `Error` enum that every layer of the measurement core returns,
//! so the application sees one error type whether a failure came from the
//! edge counter, the calibration arithmetic or a GPIO adapter.
//! All variants are `Copy` so they can be handed out of interrupt-adjacent
//! code paths without allocation.

use core::fmt;

use crate::ports::PromptError;
use crate::sensors::colour::Component;

// ---------------------------------------------------------------------------
// Top-level driver error
// ---------------------------------------------------------------------------

/// Every fallible operation in the driver funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// Fewer than `target_cycles + 1` rising edges arrived before the
    /// timeout fired (disconnected sensor, no light, divider powered off).
    MeasurementTimeout,
    /// The captured window has zero duration (start tick == end tick).
    DegenerateMeasurement,
    /// Black and white references are equal for this component.
    DegenerateCalibration(Component),
    /// Black and white clear-channel references are equal.
    DegenerateIntensityCalibration,
    /// A parameter was rejected before anything was applied.
    InvalidConfiguration(&'static str),
    /// `rgb()` or `intensity()` was requested before both references were
    /// captured.
    NotCalibrated,
    /// The operator prompt closed before a calibration step was confirmed.
    CalibrationAborted,
    /// A hardware adapter reported a failure.
    Hal(HalError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MeasurementTimeout => write!(f, "measurement timeout"),
            Self::DegenerateMeasurement => write!(f, "zero-duration measurement window"),
            Self::DegenerateCalibration(c) => {
                write!(f, "degenerate calibration: black == white for {c}")
            }
            Self::DegenerateIntensityCalibration => {
                write!(f, "degenerate calibration: black == white for clear")
            }
            Self::InvalidConfiguration(msg) => write!(f, "invalid configuration: {msg}"),
            Self::NotCalibrated => write!(f, "missing black/white calibration"),
            Self::CalibrationAborted => write!(f, "calibration aborted by operator"),
            Self::Hal(e) => write!(f, "hal: {e}"),
        }
    }
}

impl core::error::Error for Error {}

// ---------------------------------------------------------------------------
// Hardware adapter errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HalError {
    /// An output line could not be driven.
    GpioWriteFailed,
    /// The OUT line level could not be read.
    GpioReadFailed,
    /// The rising-edge interrupt could not be registered.
    InterruptSubscribeFailed,
    /// The rising-edge interrupt could not be removed.
    InterruptUnsubscribeFailed,
    /// The one-shot timeout timer could not be armed.
    TimerScheduleFailed,
}

impl fmt::Display for HalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::GpioWriteFailed => write!(f, "GPIO write failed"),
            Self::GpioReadFailed => write!(f, "GPIO read failed"),
            Self::InterruptSubscribeFailed => write!(f, "edge interrupt subscribe failed"),
            Self::InterruptUnsubscribeFailed => write!(f, "edge interrupt unsubscribe failed"),
            Self::TimerScheduleFailed => write!(f, "timeout timer schedule failed"),
        }
    }
}

impl From<PromptError> for Error {
    fn from(_: PromptError) -> Self {
        Self::CalibrationAborted
    }
}

impl From<HalError> for Error {
    fn from(e: HalError) -> Self {
        Self::Hal(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Driver-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
