//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing driver events to the `log` facade
//! (the ESP-IDF logger in firmware, any `log` backend on the host).
//! Per-measurement chatter is `debug!` unless the `debug` switch is on;
//! timeouts and clamped readings are always `warn!`.

use log::{Level, info, log, warn};

use crate::events::SensorEvent;
use crate::ports::EventSink;

/// Adapter that logs every [`SensorEvent`].
pub struct LogEventSink {
    debug: bool,
}

impl LogEventSink {
    pub fn new(debug: bool) -> Self {
        Self { debug }
    }

    pub fn set_debug(&mut self, on: bool) {
        if on {
            info!("TCS3200 | debugging switched on");
        } else {
            info!("TCS3200 | debugging switched off");
        }
        self.debug = on;
    }

    pub fn debug(&self) -> bool {
        self.debug
    }

    fn chatter_level(&self) -> Level {
        if self.debug { Level::Info } else { Level::Debug }
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &SensorEvent) {
        let level = self.chatter_level();
        match event {
            SensorEvent::FilterSelected(filter) => {
                log!(level, "FILTER | {:?} (S2/S3={:?})", filter, filter.lines());
            }
            SensorEvent::DividerSet(divider) => {
                info!("DIVIDER | {:?} (S0/S1={:?})", divider, divider.lines());
            }
            SensorEvent::MeasurementArmed {
                filter,
                target_cycles,
            } => {
                log!(level, "MEAS | armed {:?} for {} cycles", filter, target_cycles);
            }
            SensorEvent::MeasurementComplete {
                filter,
                frequency_hz,
                duration_us,
            } => {
                log!(
                    level,
                    "MEAS | {:?} {:.1} Hz ({} us window)",
                    filter,
                    frequency_hz,
                    duration_us
                );
            }
            SensorEvent::MeasurementTimedOut {
                filter,
                cycles_seen,
            } => {
                warn!(
                    "MEAS | {:?} timed out after {} cycles",
                    filter, cycles_seen
                );
            }
            SensorEvent::ReferenceCaptured { reference, triple } => {
                info!(
                    "CALIB | {:?} r={:.1} g={:.1} b={:.1} Hz",
                    reference, triple.red, triple.green, triple.blue
                );
            }
            SensorEvent::ClearReferenceCaptured {
                reference,
                clear_hz,
            } => {
                info!("CALIB | {:?} clear={:.1} Hz", reference, clear_hz);
            }
            SensorEvent::OutOfRange {
                component,
                raw_hz,
                clamped,
            } => {
                warn!(
                    "RGB | {} {:.1} Hz outside calibrated range, clamped to {}",
                    component, raw_hz, clamped
                );
            }
            SensorEvent::IntensityOutOfRange { raw_hz, clamped } => {
                warn!(
                    "RGB | clear {:.1} Hz outside calibrated range, clamped to {}",
                    raw_hz, clamped
                );
            }
        }
    }
}
