//! Port traits: the boundary between the measurement core and the board.
//!
//! ```text
//!   GPIO / timer adapter ──▶ Port trait ──▶ EdgeCounter · FrequencyMeter
//! ```
//!
//! Output lines, the OUT level and blocking delays use the `embedded-hal`
//! 1.0 traits directly.  What `embedded-hal` does not cover (edge interrupt
//! registration, one-shot timers, a microsecond clock) is defined here.
//! ESP-IDF adapters live in [`crate::adapters`]; integration tests provide
//! a simulated bench.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{InputPin, OutputPin};

use crate::error::HalError;
use crate::events::SensorEvent;

/// Closure run once per rising edge, in interrupt context.
///
/// Returns `false` once it wants no further edges; the adapter must then
/// leave the interrupt disabled instead of re-enabling it.
pub type EdgeHandler = Box<dyn FnMut() -> bool + Send + 'static>;

/// Closure run once when a one-shot timer expires.
pub type TimerCallback = Box<dyn FnOnce() + Send + 'static>;

// ───────────────────────────────────────────────────────────────
// Clock
// ───────────────────────────────────────────────────────────────

/// Monotonic microsecond clock.
///
/// Must be cheap and callable from interrupt context.  The value may wrap;
/// consumers compute durations with `wrapping_sub`.
pub trait MicrosClock {
    fn now_us(&self) -> u64;
}

// ───────────────────────────────────────────────────────────────
// Edge interrupt input (sensor OUT line)
// ───────────────────────────────────────────────────────────────

/// The sensor OUT line: readable level plus rising-edge interrupt.
pub trait EdgeInput: InputPin {
    /// Install `handler` and enable rising-edge interrupt delivery.
    fn subscribe_rising(&mut self, handler: EdgeHandler) -> Result<(), HalError>;

    /// Disable delivery and drop the handler.  After this returns the
    /// handler is never invoked again.
    fn unsubscribe(&mut self) -> Result<(), HalError>;
}

// ───────────────────────────────────────────────────────────────
// One-shot timer
// ───────────────────────────────────────────────────────────────

pub trait OneShotTimer {
    /// Run `callback` once after `delay_ms`.  Replaces any pending callback.
    fn schedule(&mut self, delay_ms: u32, callback: TimerCallback) -> Result<(), HalError>;

    /// Drop the pending callback, if any.  No-op when nothing is pending.
    fn cancel(&mut self);
}

// ───────────────────────────────────────────────────────────────
// Platform bundle
// ───────────────────────────────────────────────────────────────

/// Associated types of one board, so driver structs carry a single
/// generic parameter instead of five.
pub trait SensorHal {
    /// S0–S3, LED and OE lines.
    type Line: OutputPin;
    /// The OUT line.
    type Input: EdgeInput;
    type Timer: OneShotTimer;
    /// Shared with the interrupt handler, hence `Clone + Send + 'static`.
    type Clock: MicrosClock + Clone + Send + 'static;
    type Delay: DelayNs;
}

// ───────────────────────────────────────────────────────────────
// Event sink (core → logging / telemetry)
// ───────────────────────────────────────────────────────────────

/// The driver emits structured [`SensorEvent`]s through this port instead
/// of printing.  Adapters decide where they go.
pub trait EventSink {
    fn emit(&mut self, event: &SensorEvent);
}

/// Sink that drops every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl EventSink for NullSink {
    fn emit(&mut self, _event: &SensorEvent) {}
}

// ───────────────────────────────────────────────────────────────
// Operator prompt (calibration pacing)
// ───────────────────────────────────────────────────────────────

/// Blocks until the operator confirms the reference target is in place.
pub trait OperatorPrompt {
    fn confirm(&mut self, message: &str) -> Result<(), PromptError>;
}

/// The operator channel closed or failed before confirmation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PromptError;

impl core::fmt::Display for PromptError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "operator prompt aborted")
    }
}
