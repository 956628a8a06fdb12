//! Interrupt-driven edge counter for the sensor OUT line.
//!
//! ## Windowing
//!
//! The first rising edge only stamps `start_tick`.  Each following edge
//! counts one cycle; the edge that finds `cycle_count >= target_cycles`
//! stamps `end_tick` and closes the window.  A window therefore observes
//! `target_cycles + 1` edges and spans exactly `target_cycles` periods.
//!
//! ## Concurrency
//!
//! ```text
//!  GPIO ISR ──▶ on_rising_edge ─┐
//!                               ├─▶ EdgeWindow (critical_section::Mutex) ──▶ Signal ──▶ waiter
//!  timer cb ──▶ on_timeout ─────┘
//! ```
//!
//! The handler runs in interrupt context: it reads the clock, updates a
//! `Copy` state inside a critical section and publishes at most one
//! [`WindowOutcome`] through an `embassy_sync` [`Signal`].  It never blocks
//! or allocates.  Every arm bumps an epoch; handlers and timer callbacks
//! carry the epoch they were created for, so a late callback from an
//! earlier window can never touch the current one.

use core::cell::Cell;
use std::sync::Arc;

use critical_section::Mutex;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;
use embedded_hal::digital::InputPin;

use crate::error::{Error, HalError, Result};
use crate::ports::{EdgeInput, MicrosClock, OneShotTimer, SensorHal};

/// Lifecycle of one measurement window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Never armed.
    Idle,
    /// Counting edges.
    Armed,
    /// `end_tick` captured.
    Complete,
    /// The timeout fired first.
    TimedOut,
    /// Disarmed by the application before completion.
    Cancelled,
}

/// Snapshot of the interrupt-shared measurement state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MeasurementState {
    pub cycle_count: u32,
    pub target_cycles: u32,
    pub start_tick: Option<u64>,
    pub end_tick: Option<u64>,
    pub phase: Phase,
    epoch: u32,
}

impl MeasurementState {
    const IDLE: Self = Self {
        cycle_count: 0,
        target_cycles: 1,
        start_tick: None,
        end_tick: None,
        phase: Phase::Idle,
        epoch: 0,
    };

    /// True strictly between arming and completion, timeout or cancellation.
    pub fn is_active(&self) -> bool {
        self.phase == Phase::Armed
    }
}

/// A closed window: `cycles` periods between `start_tick` and `end_tick`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompletedWindow {
    pub start_tick: u64,
    pub end_tick: u64,
    pub cycles: u32,
}

impl CompletedWindow {
    /// Window length in microseconds, tolerant of clock wraparound.
    pub fn duration_us(&self) -> u64 {
        self.end_tick.wrapping_sub(self.start_tick)
    }

    /// `1_000_000 * cycles / duration_us`.
    pub fn frequency_hz(&self) -> Result<f32> {
        let duration = self.duration_us();
        if duration == 0 {
            return Err(Error::DegenerateMeasurement);
        }
        Ok((1_000_000.0 * f64::from(self.cycles) / duration as f64) as f32)
    }
}

/// What the interrupt or timer context publishes when a window ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowOutcome {
    Complete(CompletedWindow),
    TimedOut,
}

// ───────────────────────────────────────────────────────────────
// EdgeWindow: state shared with interrupt context
// ───────────────────────────────────────────────────────────────

pub struct EdgeWindow {
    state: Mutex<Cell<MeasurementState>>,
    outcome: Signal<CriticalSectionRawMutex, (u32, WindowOutcome)>,
}

impl Default for EdgeWindow {
    fn default() -> Self {
        Self::new()
    }
}

impl EdgeWindow {
    pub const fn new() -> Self {
        Self {
            state: Mutex::new(Cell::new(MeasurementState::IDLE)),
            outcome: Signal::new(),
        }
    }

    pub fn state(&self) -> MeasurementState {
        critical_section::with(|cs| self.state.borrow(cs).get())
    }

    /// Open a new window counting `target_cycles`.  Returns its epoch.
    pub fn begin(&self, target_cycles: u32) -> Result<u32> {
        if target_cycles == 0 {
            return Err(Error::InvalidConfiguration("target_cycles must be at least 1"));
        }
        let epoch = critical_section::with(|cs| {
            let cell = self.state.borrow(cs);
            let s = cell.get();
            if s.is_active() {
                return Err(Error::InvalidConfiguration("measurement already armed"));
            }
            let epoch = s.epoch.wrapping_add(1);
            cell.set(MeasurementState {
                cycle_count: 0,
                target_cycles,
                start_tick: None,
                end_tick: None,
                phase: Phase::Armed,
                epoch,
            });
            Ok(epoch)
        })?;
        self.outcome.reset();
        Ok(epoch)
    }

    /// Rising-edge handler body.  Interrupt safe.
    ///
    /// Returns `true` while the window still wants edges.  The closing edge,
    /// and any edge for a stale or idle window, returns `false`.
    pub fn on_rising_edge(&self, epoch: u32, now_us: u64) -> bool {
        let (closed, wanted) = critical_section::with(|cs| {
            let cell = self.state.borrow(cs);
            let mut s = cell.get();
            if s.phase != Phase::Armed || s.epoch != epoch {
                return (None, false);
            }
            if s.cycle_count == 0 {
                s.start_tick = Some(now_us);
            }
            if s.cycle_count >= s.target_cycles {
                s.end_tick = Some(now_us);
                s.phase = Phase::Complete;
                cell.set(s);
                let window = CompletedWindow {
                    start_tick: s.start_tick.unwrap_or(now_us),
                    end_tick: now_us,
                    cycles: s.target_cycles,
                };
                return (Some(window), false);
            }
            s.cycle_count += 1;
            cell.set(s);
            (None, true)
        });
        if let Some(window) = closed {
            self.outcome.signal((epoch, WindowOutcome::Complete(window)));
        }
        wanted
    }

    /// Timeout callback body.  No-op unless the window is still armed.
    pub fn on_timeout(&self, epoch: u32) {
        let expired = critical_section::with(|cs| {
            let cell = self.state.borrow(cs);
            let mut s = cell.get();
            if s.phase != Phase::Armed || s.epoch != epoch {
                return false;
            }
            s.phase = Phase::TimedOut;
            cell.set(s);
            true
        });
        if expired {
            self.outcome.signal((epoch, WindowOutcome::TimedOut));
        }
    }

    /// Stop counting.  Returns `true` if the window was still armed.
    pub fn cancel(&self) -> bool {
        critical_section::with(|cs| {
            let cell = self.state.borrow(cs);
            let mut s = cell.get();
            if s.phase != Phase::Armed {
                return false;
            }
            s.phase = Phase::Cancelled;
            cell.set(s);
            true
        })
    }

    /// Take the outcome of the current window, if it has been published.
    pub fn try_outcome(&self) -> Option<WindowOutcome> {
        let (epoch, outcome) = self.outcome.try_take()?;
        (epoch == self.state().epoch).then_some(outcome)
    }

    /// Wait for the outcome of the current window.
    pub async fn wait(&self) -> WindowOutcome {
        loop {
            let (epoch, outcome) = self.outcome.wait().await;
            if epoch == self.state().epoch {
                return outcome;
            }
        }
    }
}

// ───────────────────────────────────────────────────────────────
// EdgeCounter: owns the OUT interrupt and the timeout timer
// ───────────────────────────────────────────────────────────────

pub struct EdgeCounter<H: SensorHal> {
    input: H::Input,
    timer: H::Timer,
    clock: H::Clock,
    window: Arc<EdgeWindow>,
    subscribed: bool,
    timer_pending: bool,
    armed_at_us: u64,
}

impl<H: SensorHal> EdgeCounter<H> {
    pub fn new(input: H::Input, timer: H::Timer, clock: H::Clock) -> Self {
        Self {
            input,
            timer,
            clock,
            window: Arc::new(EdgeWindow::new()),
            subscribed: false,
            timer_pending: false,
            armed_at_us: 0,
        }
    }

    /// Reset the window, register the edge handler and start the timeout.
    ///
    /// Invalid arguments and arming an active window are rejected before
    /// any interrupt is registered.
    pub fn arm(&mut self, target_cycles: u32, timeout_ms: u32) -> Result<()> {
        if target_cycles == 0 {
            return Err(Error::InvalidConfiguration("target_cycles must be at least 1"));
        }
        if timeout_ms == 0 {
            return Err(Error::InvalidConfiguration("timeout_ms must be at least 1"));
        }
        if self.is_active() {
            return Err(Error::InvalidConfiguration("measurement already armed"));
        }
        // A finished window whose owner never disarmed still holds the IRQ.
        self.disarm()?;

        let epoch = self.window.begin(target_cycles)?;

        let window = Arc::clone(&self.window);
        let clock = self.clock.clone();
        let handler = Box::new(move || window.on_rising_edge(epoch, clock.now_us()));
        if let Err(e) = self.input.subscribe_rising(handler) {
            self.window.cancel();
            return Err(e.into());
        }
        self.subscribed = true;

        let window = Arc::clone(&self.window);
        if let Err(e) = self
            .timer
            .schedule(timeout_ms, Box::new(move || window.on_timeout(epoch)))
        {
            self.disarm()?;
            return Err(e.into());
        }
        self.timer_pending = true;
        self.armed_at_us = self.clock.now_us();
        Ok(())
    }

    /// Cancel the window, the timeout and the edge interrupt.
    ///
    /// Idempotent: a second call finds nothing to release and returns `Ok`.
    pub fn disarm(&mut self) -> Result<()> {
        self.window.cancel();
        if self.timer_pending {
            self.timer.cancel();
            self.timer_pending = false;
        }
        if self.subscribed {
            self.input.unsubscribe()?;
            self.subscribed = false;
        }
        Ok(())
    }

    pub fn is_active(&self) -> bool {
        self.window.state().is_active()
    }

    /// True while the edge handler is registered with the input.
    pub fn is_subscribed(&self) -> bool {
        self.subscribed
    }

    pub fn state(&self) -> MeasurementState {
        self.window.state()
    }

    pub fn try_outcome(&self) -> Option<WindowOutcome> {
        self.window.try_outcome()
    }

    pub async fn wait_outcome(&self) -> WindowOutcome {
        self.window.wait().await
    }

    /// Microseconds since the last successful `arm`.
    pub fn elapsed_since_arm_us(&self) -> u64 {
        self.clock.now_us().wrapping_sub(self.armed_at_us)
    }

    /// Current OUT level.
    pub fn level(&mut self) -> Result<bool> {
        self.input
            .is_high()
            .map_err(|_| Error::Hal(HalError::GpioReadFailed))
    }
}

impl<H: SensorHal> Drop for EdgeCounter<H> {
    fn drop(&mut self) {
        if let Err(e) = self.disarm() {
            log::warn!("edge counter: disarm on drop failed: {}", e);
        }
    }
}
