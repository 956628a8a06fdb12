//! TCS3200 colour sensor driver.
//!
//! Measures the sensor's OUT frequency through each photodiode filter by
//! timing a window of rising edges, and normalises the readings against
//! black and white references into RGB components.
//!
//! Hardware access goes through the traits in [`ports`]; ESP-IDF
//! implementations live in [`adapters`] and are guarded by
//! `#[cfg(feature = "espidf")]`.

#![deny(unused_must_use)]

pub mod adapters;
pub mod config;
pub mod drivers;
pub mod error;
pub mod events;
pub mod pins;
pub mod ports;
pub mod sensors;

pub use config::SensorConfig;
pub use drivers::lines::{FilterSelection, FrequencyDivider, SensorLines};
pub use error::{Error, HalError, Result};
pub use events::SensorEvent;
pub use sensors::calibration::{
    CalibrationReferences, Calibrator, ClearReferences, Reference, Rgb,
};
pub use sensors::colour::{ColourTriple, Component};
pub use sensors::{Tcs3200, Tcs3200Parts};
