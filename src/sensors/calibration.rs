//! Black/white reference calibration and RGB normalisation.
//!
//! A component value is
//!
//! ```text
//! value = top * (F - F_black) / (F_white - F_black)
//! ```
//!
//! clamped into `[0, top]` and truncated.  `F_black` and `F_white` are the
//! frequencies measured on a black and a white target through the same
//! filter; `top` is usually 255.
//!
//! The clear photodiode gets its own pair of references so overall
//! intensity can be reported on the same `[0, top]` scale.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::events::SensorEvent;
use crate::ports::{EventSink, OperatorPrompt, SensorHal};
use crate::sensors::colour::{ColourReader, ColourTriple, Component};

pub const DEFAULT_TOP: u16 = 255;

/// Which reference target a triple was captured from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Reference {
    Black,
    White,
}

/// Stored reference triples.  All zero until captured.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CalibrationReferences {
    pub black: ColourTriple,
    pub white: ColourTriple,
}

/// Clear-channel (unfiltered) reference frequencies.  Zero until captured.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ClearReferences {
    pub black: f32,
    pub white: f32,
}

impl ClearReferences {
    pub fn get(&self, reference: Reference) -> f32 {
        match reference {
            Reference::Black => self.black,
            Reference::White => self.white,
        }
    }
}

/// Normalised colour, each component in `[0, top]`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgb {
    pub red: u16,
    pub green: u16,
    pub blue: u16,
}

pub struct Calibrator {
    refs: CalibrationReferences,
    clear: ClearReferences,
    top: u16,
    black_captured: bool,
    white_captured: bool,
    clear_black_captured: bool,
    clear_white_captured: bool,
}

impl Default for Calibrator {
    fn default() -> Self {
        Self::new(DEFAULT_TOP)
    }
}

impl Calibrator {
    pub fn new(top: u16) -> Self {
        Self {
            refs: CalibrationReferences::default(),
            clear: ClearReferences::default(),
            top: top.max(1),
            black_captured: false,
            white_captured: false,
            clear_black_captured: false,
            clear_white_captured: false,
        }
    }

    /// Restore references captured earlier by the application.
    pub fn with_references(refs: CalibrationReferences, top: u16) -> Self {
        let mut calibrator = Self::new(top);
        calibrator.restore(refs);
        calibrator
    }

    /// Replace the RGB references.  Clear references are kept.
    pub fn restore(&mut self, refs: CalibrationReferences) {
        self.refs = refs;
        self.black_captured = true;
        self.white_captured = true;
    }

    /// Replace the clear-channel references.
    pub fn restore_clear(&mut self, clear: ClearReferences) {
        self.clear = clear;
        self.clear_black_captured = true;
        self.clear_white_captured = true;
    }

    // ── Capture ───────────────────────────────────────────────

    pub fn calibrate_black<H: SensorHal>(
        &mut self,
        reader: &mut ColourReader<H>,
        sink: &mut impl EventSink,
    ) -> Result<ColourTriple> {
        self.capture(Reference::Black, reader, sink)
    }

    pub fn calibrate_white<H: SensorHal>(
        &mut self,
        reader: &mut ColourReader<H>,
        sink: &mut impl EventSink,
    ) -> Result<ColourTriple> {
        self.capture(Reference::White, reader, sink)
    }

    /// Operator-paced two step run: confirm, read black, confirm, read
    /// white.  Each step reads red, green, blue and then the clear channel.
    /// References are replaced only if every reading succeeds.
    pub fn calibrate<H: SensorHal>(
        &mut self,
        reader: &mut ColourReader<H>,
        prompt: &mut impl OperatorPrompt,
        sink: &mut impl EventSink,
    ) -> Result<CalibrationReferences> {
        prompt.confirm("Place the black reference target, then confirm")?;
        let black = reader.read(sink)?;
        let black_clear = reader.read_clear(sink)?;
        prompt.confirm("Place the white reference target, then confirm")?;
        let white = reader.read(sink)?;
        let white_clear = reader.read_clear(sink)?;

        self.store(Reference::Black, black, black_clear, sink);
        self.store(Reference::White, white, white_clear, sink);
        Ok(self.refs)
    }

    fn capture<H: SensorHal>(
        &mut self,
        reference: Reference,
        reader: &mut ColourReader<H>,
        sink: &mut impl EventSink,
    ) -> Result<ColourTriple> {
        let triple = reader.read(sink)?;
        let clear_hz = reader.read_clear(sink)?;
        self.store(reference, triple, clear_hz, sink);
        Ok(triple)
    }

    fn store(
        &mut self,
        reference: Reference,
        triple: ColourTriple,
        clear_hz: f32,
        sink: &mut impl EventSink,
    ) {
        match reference {
            Reference::Black => {
                self.refs.black = triple;
                self.clear.black = clear_hz;
                self.black_captured = true;
                self.clear_black_captured = true;
            }
            Reference::White => {
                self.refs.white = triple;
                self.clear.white = clear_hz;
                self.white_captured = true;
                self.clear_white_captured = true;
            }
        }
        sink.emit(&SensorEvent::ReferenceCaptured { reference, triple });
        sink.emit(&SensorEvent::ClearReferenceCaptured {
            reference,
            clear_hz,
        });
    }

    // ── Accessors ─────────────────────────────────────────────

    pub fn references(&self) -> CalibrationReferences {
        self.refs
    }

    pub fn reference(&self, reference: Reference) -> ColourTriple {
        match reference {
            Reference::Black => self.refs.black,
            Reference::White => self.refs.white,
        }
    }

    pub fn clear_references(&self) -> ClearReferences {
        self.clear
    }

    /// Both references captured (or restored).
    pub fn is_calibrated(&self) -> bool {
        self.black_captured && self.white_captured
    }

    /// Both clear-channel references captured (or restored).
    pub fn is_intensity_calibrated(&self) -> bool {
        self.clear_black_captured && self.clear_white_captured
    }

    pub fn top(&self) -> u16 {
        self.top
    }

    pub fn set_top(&mut self, top: u16) -> Result<()> {
        if top == 0 {
            return Err(Error::InvalidConfiguration("max_component must be at least 1"));
        }
        self.top = top;
        Ok(())
    }

    // ── Normalisation ─────────────────────────────────────────

    /// Map `raw_hz` onto `[0, top]` using the stored references.
    pub fn normalize(&self, component: Component, raw_hz: f32) -> Result<u16> {
        self.scale(component, raw_hz).map(|(value, _)| value)
    }

    /// Normalise a whole triple, reporting clamped components.
    pub fn normalize_triple(
        &self,
        triple: &ColourTriple,
        sink: &mut impl EventSink,
    ) -> Result<Rgb> {
        let mut out = [0u16; 3];
        for (slot, component) in out.iter_mut().zip(Component::ALL) {
            let raw_hz = triple[component];
            let (value, clamped) = self.scale(component, raw_hz)?;
            if clamped {
                sink.emit(&SensorEvent::OutOfRange {
                    component,
                    raw_hz,
                    clamped: value,
                });
            }
            *slot = value;
        }
        Ok(Rgb {
            red: out[0],
            green: out[1],
            blue: out[2],
        })
    }

    /// Map a clear-channel frequency onto `[0, top]`.
    pub fn normalize_intensity(&self, raw_hz: f32) -> Result<u16> {
        self.scale_intensity(raw_hz).map(|(value, _)| value)
    }

    /// As [`normalize_intensity`](Self::normalize_intensity), reporting a
    /// clamped reading.
    pub fn normalize_intensity_reporting(
        &self,
        raw_hz: f32,
        sink: &mut impl EventSink,
    ) -> Result<u16> {
        let (value, clamped) = self.scale_intensity(raw_hz)?;
        if clamped {
            sink.emit(&SensorEvent::IntensityOutOfRange {
                raw_hz,
                clamped: value,
            });
        }
        Ok(value)
    }

    fn scale_intensity(&self, raw_hz: f32) -> Result<(u16, bool)> {
        let (black, white) = (self.clear.black, self.clear.white);
        if white == black {
            return Err(Error::DegenerateIntensityCalibration);
        }
        Ok(self.scale_between(black, white, raw_hz))
    }

    /// Returns the clamped value and whether clamping was needed.
    fn scale(&self, component: Component, raw_hz: f32) -> Result<(u16, bool)> {
        let (black, white) = (self.refs.black[component], self.refs.white[component]);
        if white == black {
            return Err(Error::DegenerateCalibration(component));
        }
        Ok(self.scale_between(black, white, raw_hz))
    }

    fn scale_between(&self, black: f32, white: f32, raw_hz: f32) -> (u16, bool) {
        let span = white - black;
        let top = f32::from(self.top);
        // Ratio first: (white - black) / span is exactly 1.0.
        let scaled = (raw_hz - black) / span * top;
        if scaled.is_nan() {
            return (0, true);
        }
        let clamped = scaled.clamp(0.0, top);
        (clamped as u16, clamped != scaled)
    }
}
