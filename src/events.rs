//! Outbound driver events.
//!
//! The measurement core never prints.  Everything worth a log line is
//! emitted as a [`SensorEvent`] through the
//! [`EventSink`](crate::ports::EventSink) port; adapters decide whether it
//! goes to the serial log, a test recorder or nowhere.

use crate::drivers::lines::{FilterSelection, FrequencyDivider};
use crate::sensors::calibration::Reference;
use crate::sensors::colour::{ColourTriple, Component};

/// Structured events emitted by the driver.
#[derive(Debug, Clone, PartialEq)]
pub enum SensorEvent {
    /// S2/S3 were driven to a new filter.
    FilterSelected(FilterSelection),

    /// S0/S1 were driven to a new output scaling.
    DividerSet(FrequencyDivider),

    /// An edge window was armed.
    MeasurementArmed {
        filter: FilterSelection,
        target_cycles: u32,
    },

    /// A window closed and produced a frequency.
    MeasurementComplete {
        filter: FilterSelection,
        frequency_hz: f32,
        duration_us: u64,
    },

    /// The timeout fired before the window closed.
    MeasurementTimedOut {
        filter: FilterSelection,
        cycles_seen: u32,
    },

    /// A black or white reference triple was stored.
    ReferenceCaptured {
        reference: Reference,
        triple: ColourTriple,
    },

    /// A black or white clear-channel reference was stored.
    ClearReferenceCaptured { reference: Reference, clear_hz: f32 },

    /// A reading fell outside the calibrated range and was clamped.
    OutOfRange {
        component: Component,
        raw_hz: f32,
        clamped: u16,
    },

    /// A clear-channel reading fell outside its calibrated range.
    IntensityOutOfRange { raw_hz: f32, clamped: u16 },
}
