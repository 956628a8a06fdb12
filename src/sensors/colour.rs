//! RGB colour reading: three filtered frequency measurements per triple.

use core::fmt;
use core::ops::Index;

use serde::{Deserialize, Serialize};

use crate::drivers::lines::FilterSelection;
use crate::error::{Error, Result};
use crate::ports::{EventSink, SensorHal};
use crate::sensors::frequency::FrequencyMeter;

/// One colour channel of a [`ColourTriple`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Component {
    Red,
    Green,
    Blue,
}

impl Component {
    /// Measurement order used by [`ColourReader::read`].
    pub const ALL: [Self; 3] = [Self::Red, Self::Green, Self::Blue];

    pub const fn filter(self) -> FilterSelection {
        match self {
            Self::Red => FilterSelection::Red,
            Self::Green => FilterSelection::Green,
            Self::Blue => FilterSelection::Blue,
        }
    }
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Red => write!(f, "red"),
            Self::Green => write!(f, "green"),
            Self::Blue => write!(f, "blue"),
        }
    }
}

/// Red, green and blue filter frequencies in Hz.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ColourTriple {
    pub red: f32,
    pub green: f32,
    pub blue: f32,
}

impl ColourTriple {
    pub const ZERO: Self = Self {
        red: 0.0,
        green: 0.0,
        blue: 0.0,
    };

    pub const fn new(red: f32, green: f32, blue: f32) -> Self {
        Self { red, green, blue }
    }

    pub const fn get(&self, component: Component) -> f32 {
        match component {
            Component::Red => self.red,
            Component::Green => self.green,
            Component::Blue => self.blue,
        }
    }
}

impl Index<Component> for ColourTriple {
    type Output = f32;

    fn index(&self, component: Component) -> &f32 {
        match component {
            Component::Red => &self.red,
            Component::Green => &self.green,
            Component::Blue => &self.blue,
        }
    }
}

/// Runs the frequency meter once per colour filter.
pub struct ColourReader<H: SensorHal> {
    meter: FrequencyMeter<H>,
    target_cycles: u32,
    timeout_ms: u32,
}

impl<H: SensorHal> ColourReader<H> {
    pub fn new(meter: FrequencyMeter<H>, target_cycles: u32, timeout_ms: u32) -> Self {
        Self {
            meter,
            target_cycles,
            timeout_ms,
        }
    }

    /// Measure red, then green, then blue.
    ///
    /// The first failing colour aborts the read; no partial triple is
    /// ever returned.
    pub fn read(&mut self, sink: &mut impl EventSink) -> Result<ColourTriple> {
        let red = self.measure(Component::Red.filter(), sink)?;
        let green = self.measure(Component::Green.filter(), sink)?;
        let blue = self.measure(Component::Blue.filter(), sink)?;
        Ok(ColourTriple { red, green, blue })
    }

    /// Async counterpart of [`read`](Self::read).
    pub async fn read_async(&mut self, sink: &mut impl EventSink) -> Result<ColourTriple> {
        let (target, timeout) = (self.target_cycles, self.timeout_ms);
        let red = self
            .meter
            .measure_async(FilterSelection::Red, target, timeout, sink)
            .await?;
        let green = self
            .meter
            .measure_async(FilterSelection::Green, target, timeout, sink)
            .await?;
        let blue = self
            .meter
            .measure_async(FilterSelection::Blue, target, timeout, sink)
            .await?;
        Ok(ColourTriple { red, green, blue })
    }

    /// Unfiltered (clear photodiode) frequency, i.e. overall intensity.
    pub fn read_clear(&mut self, sink: &mut impl EventSink) -> Result<f32> {
        self.measure(FilterSelection::Clear, sink)
    }

    fn measure(&mut self, filter: FilterSelection, sink: &mut impl EventSink) -> Result<f32> {
        self.meter
            .measure(filter, self.target_cycles, self.timeout_ms, sink)
    }

    pub fn target_cycles(&self) -> u32 {
        self.target_cycles
    }

    pub fn set_target_cycles(&mut self, target_cycles: u32) -> Result<()> {
        if target_cycles == 0 {
            return Err(Error::InvalidConfiguration(
                "target_cycles must be at least 1",
            ));
        }
        self.target_cycles = target_cycles;
        Ok(())
    }

    pub fn timeout_ms(&self) -> u32 {
        self.timeout_ms
    }

    pub fn set_timeout_ms(&mut self, timeout_ms: u32) -> Result<()> {
        if timeout_ms == 0 {
            return Err(Error::InvalidConfiguration(
                "timeout_ms must be at least 1",
            ));
        }
        self.timeout_ms = timeout_ms;
        Ok(())
    }

    pub fn meter(&self) -> &FrequencyMeter<H> {
        &self.meter
    }

    pub fn meter_mut(&mut self) -> &mut FrequencyMeter<H> {
        &mut self.meter
    }
}
