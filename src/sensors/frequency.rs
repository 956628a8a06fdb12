//! One blocking (or awaited) frequency measurement through a colour filter.
//!
//! The meter owns the select lines and the edge counter, so nothing else
//! can change the filter while a window is open: both `measure` and
//! `measure_async` hold `&mut self` until the window is released.

use embedded_hal::delay::DelayNs;

use crate::drivers::edge_counter::{EdgeCounter, WindowOutcome};
use crate::drivers::lines::{FilterSelection, SensorLines};
use crate::error::{Error, Result};
use crate::events::SensorEvent;
use crate::ports::{EventSink, SensorHal};

/// Default sleep between completion checks.
pub const DEFAULT_POLL_INTERVAL_MS: u32 = 10;

pub struct FrequencyMeter<H: SensorHal> {
    lines: SensorLines<H::Line>,
    counter: EdgeCounter<H>,
    delay: H::Delay,
    poll_interval_ms: u32,
}

impl<H: SensorHal> FrequencyMeter<H> {
    pub fn new(lines: SensorLines<H::Line>, counter: EdgeCounter<H>, delay: H::Delay) -> Self {
        Self {
            lines,
            counter,
            delay,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
        }
    }

    pub fn with_poll_interval_ms(mut self, poll_interval_ms: u32) -> Self {
        self.poll_interval_ms = poll_interval_ms.max(1);
        self
    }

    /// Select `filter`, time `target_cycles` periods of OUT and return the
    /// frequency in Hz.  Polls for completion every `poll_interval_ms`.
    pub fn measure(
        &mut self,
        filter: FilterSelection,
        target_cycles: u32,
        timeout_ms: u32,
        sink: &mut impl EventSink,
    ) -> Result<f32> {
        self.start(filter, target_cycles, timeout_ms, sink)?;

        // Backstop in case the timer adapter never fires.
        let deadline_us =
            (u64::from(timeout_ms) + 2 * u64::from(self.poll_interval_ms)) * 1_000;
        let outcome = loop {
            if let Some(outcome) = self.counter.try_outcome() {
                break outcome;
            }
            if self.counter.elapsed_since_arm_us() > deadline_us {
                break WindowOutcome::TimedOut;
            }
            self.delay.delay_ms(self.poll_interval_ms);
        };

        self.finish(filter, outcome, sink)
    }

    /// Same as [`measure`](Self::measure) but suspends on the completion
    /// signal instead of polling.  Dropping the future disarms the counter.
    ///
    /// The timeout comes from the [`OneShotTimer`](crate::ports::OneShotTimer)
    /// alone; there is no clock backstop as in the polling path.  A timer
    /// adapter that never fires leaves the future pending until the caller
    /// drops it, so wrap the call in the executor's own timeout if the
    /// adapter is not trusted.
    pub async fn measure_async(
        &mut self,
        filter: FilterSelection,
        target_cycles: u32,
        timeout_ms: u32,
        sink: &mut impl EventSink,
    ) -> Result<f32> {
        self.start(filter, target_cycles, timeout_ms, sink)?;
        let guard = DisarmOnDrop(&mut self.counter);
        let outcome = guard.0.wait_outcome().await;
        drop(guard);
        self.finish(filter, outcome, sink)
    }

    fn start(
        &mut self,
        filter: FilterSelection,
        target_cycles: u32,
        timeout_ms: u32,
        sink: &mut impl EventSink,
    ) -> Result<()> {
        if target_cycles == 0 {
            return Err(Error::InvalidConfiguration("target_cycles must be at least 1"));
        }
        if self.counter.is_active() {
            return Err(Error::InvalidConfiguration("measurement already armed"));
        }
        self.lines.select_filter(filter)?;
        sink.emit(&SensorEvent::FilterSelected(filter));

        self.counter.arm(target_cycles, timeout_ms)?;
        sink.emit(&SensorEvent::MeasurementArmed {
            filter,
            target_cycles,
        });
        Ok(())
    }

    fn finish(
        &mut self,
        filter: FilterSelection,
        outcome: WindowOutcome,
        sink: &mut impl EventSink,
    ) -> Result<f32> {
        let cycles_seen = self.counter.state().cycle_count;
        self.counter.disarm()?;

        match outcome {
            WindowOutcome::Complete(window) => {
                let frequency_hz = window.frequency_hz()?;
                sink.emit(&SensorEvent::MeasurementComplete {
                    filter,
                    frequency_hz,
                    duration_us: window.duration_us(),
                });
                Ok(frequency_hz)
            }
            WindowOutcome::TimedOut => {
                sink.emit(&SensorEvent::MeasurementTimedOut {
                    filter,
                    cycles_seen,
                });
                Err(Error::MeasurementTimeout)
            }
        }
    }

    /// Sample the raw OUT level `N` times, `interval_us` apart, for
    /// plotting the square wave.
    pub fn sample_output<const N: usize>(
        &mut self,
        interval_us: u32,
    ) -> Result<heapless::Vec<bool, N>> {
        if self.counter.is_active() {
            return Err(Error::InvalidConfiguration("measurement already armed"));
        }
        let mut samples = heapless::Vec::new();
        while !samples.is_full() {
            let level = self.counter.level()?;
            if samples.push(level).is_err() {
                break;
            }
            self.delay.delay_us(interval_us);
        }
        Ok(samples)
    }

    pub fn lines(&self) -> &SensorLines<H::Line> {
        &self.lines
    }

    pub fn lines_mut(&mut self) -> &mut SensorLines<H::Line> {
        &mut self.lines
    }

    pub fn counter(&self) -> &EdgeCounter<H> {
        &self.counter
    }

    pub fn poll_interval_ms(&self) -> u32 {
        self.poll_interval_ms
    }
}

/// Releases the edge interrupt if an awaited measurement is abandoned.
struct DisarmOnDrop<'a, H: SensorHal>(&'a mut EdgeCounter<H>);

impl<H: SensorHal> Drop for DisarmOnDrop<'_, H> {
    fn drop(&mut self) {
        if let Err(e) = self.0.disarm() {
            log::warn!("frequency meter: disarm after await failed: {}", e);
        }
    }
}
