//! Monotonic clock and blocking delay adapters.
//!
//! - **`feature = "espidf"`** (ESP32 firmware): wraps `esp_timer_get_time()` from the
//!   ESP-IDF high-resolution timer (microsecond precision, monotonic, safe
//!   to call from an ISR).
//! - **`not(feature = "espidf")`**: uses `std::time::Instant` for
//!   host-side runs.

use embedded_hal::delay::DelayNs;

use crate::ports::MicrosClock;

/// Microsecond clock for the ESP32 platform (or the host).
#[derive(Clone, Copy)]
pub struct Esp32Clock {
    #[cfg(not(feature = "espidf"))]
    start: std::time::Instant,
}

impl Default for Esp32Clock {
    fn default() -> Self {
        Self::new()
    }
}

impl Esp32Clock {
    pub fn new() -> Self {
        Self {
            #[cfg(not(feature = "espidf"))]
            start: std::time::Instant::now(),
        }
    }
}

impl MicrosClock for Esp32Clock {
    /// Microseconds since boot (monotonic, wraps at `u64::MAX`).
    #[cfg(feature = "espidf")]
    fn now_us(&self) -> u64 {
        // SAFETY: esp_timer_get_time has no preconditions and is ISR safe.
        (unsafe { esp_idf_svc::sys::esp_timer_get_time() }) as u64
    }

    /// Microseconds since construction (monotonic).
    #[cfg(not(feature = "espidf"))]
    fn now_us(&self) -> u64 {
        self.start.elapsed().as_micros() as u64
    }
}

/// Blocking delay that yields to the scheduler between polls.
///
/// On ESP-IDF, millisecond delays go through FreeRTOS so the polling loop
/// does not starve other tasks; sub-millisecond delays busy-wait.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadDelay;

impl DelayNs for ThreadDelay {
    #[cfg(feature = "espidf")]
    fn delay_ns(&mut self, ns: u32) {
        esp_idf_hal::delay::Ets::delay_us(ns.div_ceil(1_000));
    }

    #[cfg(feature = "espidf")]
    fn delay_ms(&mut self, ms: u32) {
        esp_idf_hal::delay::FreeRtos::delay_ms(ms);
    }

    #[cfg(not(feature = "espidf"))]
    fn delay_ns(&mut self, ns: u32) {
        std::thread::sleep(std::time::Duration::from_nanos(u64::from(ns)));
    }

    #[cfg(not(feature = "espidf"))]
    fn delay_ms(&mut self, ms: u32) {
        std::thread::sleep(std::time::Duration::from_millis(u64::from(ms)));
    }
}
