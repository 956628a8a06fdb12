//! Sensor subsystem: the measurement chain and the [`Tcs3200`] facade.
//!
//! ```text
//!  EdgeCounter ──▶ FrequencyMeter ──▶ ColourReader ──▶ Calibrator
//! ```
//!
//! [`Tcs3200`] owns the whole chain plus the validated configuration and
//! is the only type most applications need.  It is built explicitly by
//! application or test code; nothing runs at load time.

pub mod calibration;
pub mod colour;
pub mod frequency;

use crate::config::SensorConfig;
use crate::drivers::edge_counter::EdgeCounter;
use crate::drivers::lines::{FilterSelection, FrequencyDivider, SensorLines};
use crate::error::{Error, Result};
use crate::events::SensorEvent;
use crate::ports::{EventSink, OperatorPrompt, SensorHal};
use calibration::{CalibrationReferences, Calibrator, ClearReferences, Rgb};
use colour::{ColourReader, ColourTriple};
use frequency::FrequencyMeter;

/// Hardware parts a [`Tcs3200`] takes ownership of.
pub struct Tcs3200Parts<H: SensorHal> {
    pub lines: SensorLines<H::Line>,
    pub input: H::Input,
    pub timer: H::Timer,
    pub clock: H::Clock,
    pub delay: H::Delay,
}

/// One TCS3200 sensor instance.
pub struct Tcs3200<H: SensorHal> {
    reader: ColourReader<H>,
    calibrator: Calibrator,
    config: SensorConfig,
}

impl<H: SensorHal> Tcs3200<H> {
    /// Validate `config`, take ownership of the hardware and drive every
    /// line to its initial state (red filter, LED on, output enabled,
    /// configured divider when S0/S1 are wired).
    pub fn new(
        parts: Tcs3200Parts<H>,
        config: SensorConfig,
        sink: &mut impl EventSink,
    ) -> Result<Self> {
        config.validate()?;

        let Tcs3200Parts {
            mut lines,
            input,
            timer,
            clock,
            delay,
        } = parts;
        lines.init()?;
        if lines.has_divider() {
            lines.set_divider(config.divider)?;
            sink.emit(&SensorEvent::DividerSet(config.divider));
        }

        let counter = EdgeCounter::new(input, timer, clock);
        let meter = FrequencyMeter::new(lines, counter, delay)
            .with_poll_interval_ms(config.poll_interval_ms);
        let reader = ColourReader::new(meter, config.target_cycles, config.timeout_ms);

        Ok(Self {
            reader,
            calibrator: Calibrator::new(config.max_component),
            config,
        })
    }

    // ── Measurement ───────────────────────────────────────────

    pub fn read(&mut self, sink: &mut impl EventSink) -> Result<ColourTriple> {
        self.reader.read(sink)
    }

    pub async fn read_async(&mut self, sink: &mut impl EventSink) -> Result<ColourTriple> {
        self.reader.read_async(sink).await
    }

    pub fn read_clear(&mut self, sink: &mut impl EventSink) -> Result<f32> {
        self.reader.read_clear(sink)
    }

    /// Single measurement through an arbitrary filter.
    pub fn measure(
        &mut self,
        filter: FilterSelection,
        sink: &mut impl EventSink,
    ) -> Result<f32> {
        let (target, timeout) = (self.config.target_cycles, self.config.timeout_ms);
        self.reader.meter_mut().measure(filter, target, timeout, sink)
    }

    /// Measure and normalise against the stored references.
    pub fn rgb(&mut self, sink: &mut impl EventSink) -> Result<Rgb> {
        if !self.calibrator.is_calibrated() {
            return Err(Error::NotCalibrated);
        }
        let triple = self.reader.read(sink)?;
        self.calibrator.normalize_triple(&triple, sink)
    }

    /// Measure the clear channel and normalise it against the clear
    /// references.
    pub fn intensity(&mut self, sink: &mut impl EventSink) -> Result<u16> {
        if !self.calibrator.is_intensity_calibrated() {
            return Err(Error::NotCalibrated);
        }
        let raw_hz = self.reader.read_clear(sink)?;
        self.calibrator.normalize_intensity_reporting(raw_hz, sink)
    }

    /// Raw OUT level samples, see [`FrequencyMeter::sample_output`].
    pub fn sample_output<const N: usize>(
        &mut self,
        interval_us: u32,
    ) -> Result<heapless::Vec<bool, N>> {
        self.reader.meter_mut().sample_output(interval_us)
    }

    // ── Calibration ───────────────────────────────────────────

    pub fn calibrate_black(&mut self, sink: &mut impl EventSink) -> Result<ColourTriple> {
        self.calibrator.calibrate_black(&mut self.reader, sink)
    }

    pub fn calibrate_white(&mut self, sink: &mut impl EventSink) -> Result<ColourTriple> {
        self.calibrator.calibrate_white(&mut self.reader, sink)
    }

    pub fn calibrate(
        &mut self,
        prompt: &mut impl OperatorPrompt,
        sink: &mut impl EventSink,
    ) -> Result<CalibrationReferences> {
        self.calibrator.calibrate(&mut self.reader, prompt, sink)
    }

    pub fn references(&self) -> CalibrationReferences {
        self.calibrator.references()
    }

    pub fn clear_references(&self) -> ClearReferences {
        self.calibrator.clear_references()
    }

    pub fn is_calibrated(&self) -> bool {
        self.calibrator.is_calibrated()
    }

    pub fn is_intensity_calibrated(&self) -> bool {
        self.calibrator.is_intensity_calibrated()
    }

    /// Install previously captured RGB references.
    pub fn restore_references(&mut self, refs: CalibrationReferences) {
        self.calibrator.restore(refs);
    }

    /// Install previously captured clear-channel references.
    pub fn restore_clear_references(&mut self, clear: ClearReferences) {
        self.calibrator.restore_clear(clear);
    }

    /// Change the top of the output scale.  References are kept.
    pub fn set_max_component(&mut self, top: u16) -> Result<()> {
        self.calibrator.set_top(top)?;
        self.config.max_component = top;
        Ok(())
    }

    pub fn calibrator(&self) -> &Calibrator {
        &self.calibrator
    }

    // ── Lines ─────────────────────────────────────────────────

    pub fn set_led(&mut self, on: bool) -> Result<()> {
        self.reader.meter_mut().lines_mut().set_led(on)
    }

    pub fn led(&self) -> bool {
        self.reader.meter().lines().led()
    }

    pub fn set_divider(
        &mut self,
        divider: FrequencyDivider,
        sink: &mut impl EventSink,
    ) -> Result<()> {
        self.reader.meter_mut().lines_mut().set_divider(divider)?;
        self.config.divider = divider;
        sink.emit(&SensorEvent::DividerSet(divider));
        Ok(())
    }

    pub fn divider(&self) -> Option<FrequencyDivider> {
        self.reader.meter().lines().divider()
    }

    pub fn power_off(&mut self, sink: &mut impl EventSink) -> Result<()> {
        self.set_divider(FrequencyDivider::Off, sink)
    }

    pub fn set_output_enabled(&mut self, enabled: bool) -> Result<()> {
        self.reader
            .meter_mut()
            .lines_mut()
            .set_output_enabled(enabled)
    }

    // ── Configuration ─────────────────────────────────────────

    pub fn set_target_cycles(&mut self, target_cycles: u32) -> Result<()> {
        self.reader.set_target_cycles(target_cycles)?;
        self.config.target_cycles = target_cycles;
        Ok(())
    }

    pub fn set_timeout_ms(&mut self, timeout_ms: u32) -> Result<()> {
        if timeout_ms < self.config.poll_interval_ms {
            return Err(Error::InvalidConfiguration(
                "poll_interval_ms must not exceed timeout_ms",
            ));
        }
        self.reader.set_timeout_ms(timeout_ms)?;
        self.config.timeout_ms = timeout_ms;
        Ok(())
    }

    pub fn config(&self) -> &SensorConfig {
        &self.config
    }

    pub fn reader_mut(&mut self) -> &mut ColourReader<H> {
        &mut self.reader
    }
}
