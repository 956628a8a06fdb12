//! ESP-IDF GPIO and timer adapters for the sensor ports.
//!
//! - OUT line: `PinDriver` input with pull-up, rising-edge interrupt via
//!   `subscribe`.  esp-idf-hal disables a pin interrupt each time it fires,
//!   so the registered closure re-enables it after running the handler.
//! - Timeout: `EspTaskTimerService` one-shot timer.  Callbacks run in the
//!   esp_timer task, not in ISR context.

use core::convert::Infallible;
use core::time::Duration;

use esp_idf_hal::gpio::{AnyIOPin, AnyOutputPin, Input, InterruptType, Output, PinDriver, Pull};
use esp_idf_svc::sys::EspError;
use esp_idf_svc::timer::{EspTaskTimerService, EspTimer};

use crate::adapters::time::{Esp32Clock, ThreadDelay};
use crate::error::HalError;
use crate::ports::{EdgeHandler, EdgeInput, OneShotTimer, SensorHal, TimerCallback};

/// Board bundle for an ESP32 wired to one TCS3200.
pub struct EspHal;

impl SensorHal for EspHal {
    type Line = PinDriver<'static, AnyOutputPin, Output>;
    type Input = EspEdgeInput;
    type Timer = EspOneShotTimer;
    type Clock = Esp32Clock;
    type Delay = ThreadDelay;
}

// ── OUT line ──────────────────────────────────────────────────

pub struct EspEdgeInput {
    pin: PinDriver<'static, AnyIOPin, Input>,
}

impl EspEdgeInput {
    pub fn new(pin: AnyIOPin) -> Result<Self, EspError> {
        let mut pin = PinDriver::input(pin)?;
        pin.set_pull(Pull::Up)?;
        pin.set_interrupt_type(InterruptType::PosEdge)?;
        Ok(Self { pin })
    }
}

impl embedded_hal::digital::ErrorType for EspEdgeInput {
    type Error = Infallible;
}

impl embedded_hal::digital::InputPin for EspEdgeInput {
    fn is_high(&mut self) -> Result<bool, Infallible> {
        Ok(self.pin.is_high())
    }

    fn is_low(&mut self) -> Result<bool, Infallible> {
        Ok(self.pin.is_low())
    }
}

impl EdgeInput for EspEdgeInput {
    fn subscribe_rising(&mut self, mut handler: EdgeHandler) -> Result<(), HalError> {
        let gpio = self.pin.pin();
        // SAFETY: the closure only touches the critical-section protected
        // edge window and re-enables this pin's interrupt; both are ISR
        // safe.  It is removed in `unsubscribe` before the driver drops.
        // Once the handler declines further edges the interrupt stays off.
        unsafe {
            self.pin
                .subscribe(move || {
                    if handler() {
                        esp_idf_svc::sys::gpio_intr_enable(gpio);
                    }
                })
                .map_err(|_| HalError::InterruptSubscribeFailed)?;
        }
        self.pin
            .enable_interrupt()
            .map_err(|_| HalError::InterruptSubscribeFailed)
    }

    fn unsubscribe(&mut self) -> Result<(), HalError> {
        self.pin
            .disable_interrupt()
            .map_err(|_| HalError::InterruptUnsubscribeFailed)?;
        self.pin
            .unsubscribe()
            .map_err(|_| HalError::InterruptUnsubscribeFailed)
    }
}

// ── Timeout timer ─────────────────────────────────────────────

pub struct EspOneShotTimer {
    service: EspTaskTimerService,
    pending: Option<EspTimer<'static>>,
}

impl EspOneShotTimer {
    pub fn new() -> Result<Self, EspError> {
        Ok(Self {
            service: EspTaskTimerService::new()?,
            pending: None,
        })
    }
}

impl OneShotTimer for EspOneShotTimer {
    fn schedule(&mut self, delay_ms: u32, callback: TimerCallback) -> Result<(), HalError> {
        self.cancel();
        let mut callback = Some(callback);
        let timer = self
            .service
            .timer(move || {
                if let Some(cb) = callback.take() {
                    cb();
                }
            })
            .map_err(|_| HalError::TimerScheduleFailed)?;
        timer
            .after(Duration::from_millis(u64::from(delay_ms)))
            .map_err(|_| HalError::TimerScheduleFailed)?;
        self.pending = Some(timer);
        Ok(())
    }

    fn cancel(&mut self) {
        if let Some(timer) = self.pending.take() {
            if let Err(e) = timer.cancel() {
                log::warn!("esp timer: cancel failed: {}", e);
            }
        }
    }
}
