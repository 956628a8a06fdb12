//! Filter, frequency-divider, LED and output-enable lines.
//!
//! ## Line mapping
//!
//! | Setting           | S2 | S3 |      | Setting          | S0 | S1 |
//! |-------------------|----|----|------|------------------|----|----|
//! | Red               | L  | L  |      | Off (power down) | L  | L  |
//! | Blue              | L  | H  |      | 2 %              | L  | H  |
//! | Clear (no filter) | H  | L  |      | 20 %             | H  | L  |
//! | Green             | H  | H  |      | 100 %            | H  | H  |
//!
//! S0/S1, LED and OE are optional: some breakout boards hard-wire them.
//! OE is active low.

use embedded_hal::digital::{OutputPin, PinState};
use serde::{Deserialize, Serialize};

use crate::error::{Error, HalError, Result};

/// Photodiode filter selected by S2/S3.  Exactly one is active at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FilterSelection {
    Red,
    Green,
    Blue,
    Clear,
}

impl FilterSelection {
    /// `(S2, S3)` line states.
    pub const fn lines(self) -> (bool, bool) {
        match self {
            Self::Red => (false, false),
            Self::Blue => (false, true),
            Self::Green => (true, true),
            Self::Clear => (true, false),
        }
    }

    pub const fn from_lines(s2: bool, s3: bool) -> Self {
        match (s2, s3) {
            (false, false) => Self::Red,
            (false, true) => Self::Blue,
            (true, true) => Self::Green,
            (true, false) => Self::Clear,
        }
    }
}

/// Output frequency scaling selected by S0/S1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FrequencyDivider {
    /// Power down; OUT stops toggling.
    Off,
    TwoPercent,
    TwentyPercent,
    HundredPercent,
}

impl FrequencyDivider {
    /// `(S0, S1)` line states.
    pub const fn lines(self) -> (bool, bool) {
        match self {
            Self::Off => (false, false),
            Self::TwoPercent => (false, true),
            Self::TwentyPercent => (true, false),
            Self::HundredPercent => (true, true),
        }
    }

    pub const fn from_lines(s0: bool, s1: bool) -> Self {
        match (s0, s1) {
            (false, false) => Self::Off,
            (false, true) => Self::TwoPercent,
            (true, false) => Self::TwentyPercent,
            (true, true) => Self::HundredPercent,
        }
    }

    /// Fraction of the full-scale output frequency.
    pub const fn scale(self) -> f32 {
        match self {
            Self::Off => 0.0,
            Self::TwoPercent => 0.02,
            Self::TwentyPercent => 0.2,
            Self::HundredPercent => 1.0,
        }
    }
}

/// Output lines of one sensor, exclusively owned by the driver.
pub struct SensorLines<P: OutputPin> {
    s2: P,
    s3: P,
    divider_pins: Option<(P, P)>,
    led: Option<P>,
    output_enable: Option<P>,
    filter: FilterSelection,
    divider: Option<FrequencyDivider>,
    led_on: bool,
}

impl<P: OutputPin> SensorLines<P> {
    /// Filter lines only; divider, LED and OE are added with the `with_*`
    /// builders before the driver takes ownership.
    pub fn new(s2: P, s3: P) -> Self {
        Self {
            s2,
            s3,
            divider_pins: None,
            led: None,
            output_enable: None,
            filter: FilterSelection::Red,
            divider: None,
            led_on: false,
        }
    }

    pub fn with_divider(mut self, s0: P, s1: P) -> Self {
        self.divider_pins = Some((s0, s1));
        self
    }

    pub fn with_led(mut self, led: P) -> Self {
        self.led = Some(led);
        self
    }

    pub fn with_output_enable(mut self, oe: P) -> Self {
        self.output_enable = Some(oe);
        self
    }

    /// Drive every line to a known state: red filter, LED on, output enabled.
    pub fn init(&mut self) -> Result<()> {
        self.select_filter(FilterSelection::Red)?;
        if self.led.is_some() {
            self.set_led(true)?;
        }
        if self.output_enable.is_some() {
            self.set_output_enabled(true)?;
        }
        Ok(())
    }

    pub fn select_filter(&mut self, filter: FilterSelection) -> Result<()> {
        let (s2, s3) = filter.lines();
        drive(&mut self.s2, s2)?;
        drive(&mut self.s3, s3)?;
        self.filter = filter;
        Ok(())
    }

    /// Last filter written to S2/S3.
    pub fn filter(&self) -> FilterSelection {
        self.filter
    }

    pub fn has_divider(&self) -> bool {
        self.divider_pins.is_some()
    }

    pub fn set_divider(&mut self, divider: FrequencyDivider) -> Result<()> {
        let Some((s0_pin, s1_pin)) = self.divider_pins.as_mut() else {
            return Err(Error::InvalidConfiguration(
                "S0/S1 not connected, frequency divider is fixed",
            ));
        };
        let (s0, s1) = divider.lines();
        drive(s0_pin, s0)?;
        drive(s1_pin, s1)?;
        self.divider = Some(divider);
        Ok(())
    }

    /// Last divider written, `None` when S0/S1 are not connected or were
    /// never driven.
    pub fn divider(&self) -> Option<FrequencyDivider> {
        self.divider
    }

    pub fn power_off(&mut self) -> Result<()> {
        self.set_divider(FrequencyDivider::Off)
    }

    pub fn set_led(&mut self, on: bool) -> Result<()> {
        let Some(led) = self.led.as_mut() else {
            return Err(Error::InvalidConfiguration("LED line not connected"));
        };
        drive(led, on)?;
        self.led_on = on;
        Ok(())
    }

    pub fn led(&self) -> bool {
        self.led_on
    }

    /// OE is active low: enabling drives the line low.
    pub fn set_output_enabled(&mut self, enabled: bool) -> Result<()> {
        let Some(oe) = self.output_enable.as_mut() else {
            return Err(Error::InvalidConfiguration("OE line not connected"));
        };
        drive(oe, !enabled)
    }
}

fn drive<P: OutputPin>(pin: &mut P, high: bool) -> Result<()> {
    pin.set_state(PinState::from(high))
        .map_err(|_| Error::Hal(HalError::GpioWriteFailed))
}
