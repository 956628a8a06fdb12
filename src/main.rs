//! TCS3200 firmware: calibrate against black and white targets over the
//! console, then log an RGB reading every second.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                    Adapters (outer ring)                     │
//! │                                                              │
//! │  EspEdgeInput     EspOneShotTimer   Esp32Clock   ThreadDelay │
//! │  (OUT ISR)        (timeout)         (µs clock)   (polling)   │
//! │  LogEventSink     StdinPrompt                                │
//! │                                                              │
//! │  ──────────────── Port Trait Boundary ─────────────────      │
//! │                                                              │
//! │  ┌────────────────────────────────────────────────────┐      │
//! │  │ Tcs3200: EdgeCounter → FrequencyMeter →            │      │
//! │  │          ColourReader → Calibrator                 │      │
//! │  └────────────────────────────────────────────────────┘      │
//! └──────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use anyhow::Result;
use embedded_hal::delay::DelayNs;
use esp_idf_hal::gpio::{AnyIOPin, AnyOutputPin, Output, PinDriver};
use log::{error, info, warn};

use tcs3200::adapters::esp::{EspEdgeInput, EspHal, EspOneShotTimer};
use tcs3200::adapters::log_sink::LogEventSink;
use tcs3200::adapters::prompt::StdinPrompt;
use tcs3200::adapters::time::{Esp32Clock, ThreadDelay};
use tcs3200::{Error, SensorConfig, SensorLines, Tcs3200, Tcs3200Parts, pins};

/// Pause between RGB readings in the main loop.
const READ_INTERVAL_MS: u32 = 1_000;

fn output_pin(gpio: i32) -> Result<PinDriver<'static, AnyOutputPin, Output>> {
    // SAFETY: every GPIO number in `pins` is claimed exactly once, in main.
    let pin = unsafe { AnyOutputPin::new(gpio) };
    Ok(PinDriver::output(pin)?)
}

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  TCS3200 v{}                        ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    // ── 2. Lines and ports ────────────────────────────────────
    let config = SensorConfig::default();
    let mut sink = LogEventSink::new(config.debug);

    let mut lines = SensorLines::new(output_pin(pins::S2_GPIO)?, output_pin(pins::S3_GPIO)?)
        .with_divider(output_pin(pins::S0_GPIO)?, output_pin(pins::S1_GPIO)?)
        .with_led(output_pin(pins::LED_GPIO)?);
    if let Some(oe) = pins::OE_GPIO {
        lines = lines.with_output_enable(output_pin(oe)?);
    }

    // SAFETY: as above; OUT is not used as an output anywhere.
    let out = unsafe { AnyIOPin::new(pins::OUT_GPIO) };
    let parts = Tcs3200Parts::<EspHal> {
        lines,
        input: EspEdgeInput::new(out)?,
        timer: EspOneShotTimer::new()?,
        clock: Esp32Clock::new(),
        delay: ThreadDelay,
    };
    let mut sensor = Tcs3200::new(parts, config, &mut sink)?;
    info!(
        "Sensor ready: {} cycles/window, timeout {} ms, divider {:?}",
        config.target_cycles,
        config.timeout_ms,
        sensor.divider()
    );

    // ── 3. Calibration ────────────────────────────────────────
    let mut prompt = StdinPrompt::stdio();
    let refs = sensor.calibrate(&mut prompt, &mut sink)?;
    info!("Calibration: {}", serde_json::to_string(&refs)?);
    info!(
        "Calibration (clear): {}",
        serde_json::to_string(&sensor.clear_references())?
    );

    // ── 4. Read loop ──────────────────────────────────────────
    let mut delay = ThreadDelay;
    loop {
        let reading = sensor
            .rgb(&mut sink)
            .and_then(|rgb| Ok((rgb, sensor.intensity(&mut sink)?)));
        match reading {
            Ok((rgb, intensity)) => info!(
                "RGB | r={} g={} b={} i={}",
                rgb.red, rgb.green, rgb.blue, intensity
            ),
            // Nothing in front of the sensor or OUT disconnected; keep trying.
            Err(e @ Error::MeasurementTimeout) => warn!("RGB | {}", e),
            Err(e) => {
                error!("RGB | {}, halting", e);
                return Err(e.into());
            }
        }
        delay.delay_ms(READ_INTERVAL_MS);
    }
}
