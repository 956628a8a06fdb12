//! Edge counting and frequency measurement against the simulated bench.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

use futures_lite::future::{block_on, poll_once};

use tcs3200::drivers::edge_counter::{EdgeCounter, Phase, WindowOutcome};
use tcs3200::ports::NullSink;
use tcs3200::{Error, FilterSelection, HalError, SensorConfig, SensorEvent};

use crate::sim_hw::{Bench, Recorder, SimHal};

fn assert_close(actual: f32, expected: f32, tolerance: f32) {
    let err = ((actual - expected) / expected).abs();
    assert!(
        err <= tolerance,
        "expected {expected} ±{:.2}%, got {actual}",
        tolerance * 100.0
    );
}

fn counter(bench: &Bench) -> EdgeCounter<SimHal> {
    EdgeCounter::new(bench.input(), bench.timer(), bench.clock())
}

// ── FrequencyMeter via the facade ─────────────────────────────

#[test]
fn measured_frequency_matches_out_period() {
    let bench = Bench::new();
    bench.show(1_000.0, 2_000.0, 1_500.0);
    let mut sensor = bench.sensor(SensorConfig::default());

    let hz = sensor.measure(FilterSelection::Red, &mut NullSink).unwrap();
    assert_close(hz, 1_000.0, 0.001);
    assert_eq!(bench.selected_filter(), FilterSelection::Red);
}

#[test]
fn window_spans_exactly_target_periods() {
    let bench = Bench::new();
    bench.show(1_000.0, 2_000.0, 1_500.0);
    let mut sensor = bench.sensor(SensorConfig::default());
    sensor.set_target_cycles(10).unwrap();

    let mut rec = Recorder::default();
    sensor.measure(FilterSelection::Green, &mut rec).unwrap();

    // 2 kHz: 500 us period, 11 edges bound 10 periods.
    let duration = rec.events.iter().find_map(|e| match e {
        SensorEvent::MeasurementComplete { duration_us, .. } => Some(*duration_us),
        _ => None,
    });
    assert_eq!(duration, Some(5_000));

    let state = sensor.reader_mut().meter().counter().state();
    assert_eq!(state.phase, Phase::Complete);
    assert_eq!(state.cycle_count, 10);
}

#[test]
fn read_returns_each_filter_within_one_percent() {
    let bench = Bench::new();
    bench.show(1_000.0, 2_000.0, 1_500.0);
    let mut sensor = bench.sensor(SensorConfig::default());

    let triple = sensor.read(&mut NullSink).unwrap();
    assert_close(triple.red, 1_000.0, 0.01);
    assert_close(triple.green, 2_000.0, 0.01);
    assert_close(triple.blue, 1_500.0, 0.01);
}

#[test]
fn read_clear_uses_unfiltered_photodiodes() {
    let bench = Bench::new();
    bench.show(1_000.0, 2_000.0, 1_500.0);
    let mut sensor = bench.sensor(SensorConfig::default());

    let hz = sensor.read_clear(&mut NullSink).unwrap();
    assert_close(hz, 4_500.0, 0.01);
    assert_eq!(bench.selected_filter(), FilterSelection::Clear);
}

#[test]
fn completed_measurement_releases_interrupt_and_timer() {
    let bench = Bench::new();
    bench.show(1_000.0, 2_000.0, 1_500.0);
    let mut sensor = bench.sensor(SensorConfig::default());

    sensor.measure(FilterSelection::Blue, &mut NullSink).unwrap();
    assert!(!bench.is_subscribed());
    assert!(!bench.timer_pending());
    assert_eq!(bench.subscribe_calls(), 1);
    assert_eq!(bench.unsubscribe_calls(), 1);
}

#[test]
fn dark_filter_times_out_without_partial_triple() {
    let bench = Bench::new();
    bench.show(1_000.0, 0.0, 1_500.0);
    let mut sensor = bench.sensor(SensorConfig::default());

    let mut rec = Recorder::default();
    let start = bench.now_us();
    let result = sensor.read(&mut rec);

    assert_eq!(result, Err(Error::MeasurementTimeout));
    assert!(!bench.is_subscribed());
    assert!(!bench.timer_pending());
    // Blue is never attempted once green fails.
    assert_eq!(
        rec.count(|e| matches!(
            e,
            SensorEvent::FilterSelected(FilterSelection::Blue)
        )),
        0
    );
    assert!(rec.events.contains(&SensorEvent::MeasurementTimedOut {
        filter: FilterSelection::Green,
        cycles_seen: 0,
    }));
    // Red window (~100 ms) plus the 5 s green timeout.
    let elapsed_ms = (bench.now_us() - start) / 1_000;
    assert!((5_000..5_200).contains(&elapsed_ms), "elapsed {elapsed_ms} ms");
}

#[test]
fn powered_down_sensor_times_out() {
    let bench = Bench::new();
    bench.show(1_000.0, 2_000.0, 1_500.0);
    let mut sensor = bench.sensor(SensorConfig::default());
    sensor.set_timeout_ms(100).unwrap();
    sensor.power_off(&mut NullSink).unwrap();

    assert_eq!(
        sensor.measure(FilterSelection::Red, &mut NullSink),
        Err(Error::MeasurementTimeout)
    );
}

#[test]
fn deadline_backstop_covers_a_silent_timer() {
    let bench = Bench::new();
    bench.swallow_timer(true);
    let mut sensor = bench.sensor(SensorConfig::default());
    sensor.set_timeout_ms(50).unwrap();

    assert_eq!(
        sensor.measure(FilterSelection::Red, &mut NullSink),
        Err(Error::MeasurementTimeout)
    );
    assert!(!bench.is_subscribed());
    // timeout + two poll intervals, rounded up to the next poll.
    assert!(bench.now_us() <= 90_000, "now {} us", bench.now_us());
}

#[test]
fn measurement_survives_clock_wraparound() {
    let bench = Bench::with_clock_offset_us(u64::MAX - 50_000);
    bench.show(1_000.0, 2_000.0, 1_500.0);
    let mut sensor = bench.sensor(SensorConfig::default());

    let mut rec = Recorder::default();
    let hz = sensor.measure(FilterSelection::Red, &mut rec).unwrap();
    assert_close(hz, 1_000.0, 0.001);
    assert!(rec.events.contains(&SensorEvent::MeasurementComplete {
        filter: FilterSelection::Red,
        frequency_hz: hz,
        duration_us: 100_000,
    }));
}

#[test]
fn consecutive_reads_are_independent() {
    let bench = Bench::new();
    bench.show(1_000.0, 2_000.0, 1_500.0);
    let mut sensor = bench.sensor(SensorConfig::default());

    let first = sensor.read(&mut NullSink).unwrap();
    bench.show(500.0, 250.0, 4_000.0);
    let second = sensor.read(&mut NullSink).unwrap();

    assert_close(first.red, 1_000.0, 0.01);
    assert_close(second.red, 500.0, 0.01);
    assert_close(second.green, 250.0, 0.01);
    assert_close(second.blue, 4_000.0, 0.01);
    assert_eq!(bench.subscribe_calls(), 6);
}

#[test]
fn sample_output_traces_the_square_wave() {
    let bench = Bench::new();
    bench.show(1_000.0, 2_000.0, 1_500.0);
    let mut sensor = bench.sensor(SensorConfig::default());

    // Red at 1 kHz, four samples per period.
    let samples = sensor.sample_output::<8>(250).unwrap();
    assert_eq!(
        samples.as_slice(),
        &[true, true, false, false, true, true, false, false]
    );
}

// ── EdgeCounter directly ──────────────────────────────────────

#[test]
fn counter_ignores_edges_after_completion() {
    let bench = Bench::new();
    bench.show(1_000.0, 2_000.0, 1_500.0);
    let mut c = counter(&bench);

    c.arm(3, 1_000).unwrap();
    bench.advance_us(10_500);

    let Some(WindowOutcome::Complete(window)) = c.try_outcome() else {
        panic!("window did not close");
    };
    assert_eq!(window.cycles, 3);
    assert_eq!(window.duration_us(), 3_000);

    let state = c.state();
    assert_eq!(state.phase, Phase::Complete);
    assert_eq!(state.cycle_count, 3);
    assert_eq!(state.end_tick, Some(window.end_tick));
    c.disarm().unwrap();
}

#[test]
fn closing_edge_disables_the_interrupt() {
    let bench = Bench::new();
    bench.show(1_000.0, 2_000.0, 1_500.0);
    let mut c = counter(&bench);

    c.arm(3, 1_000).unwrap();
    bench.advance_us(100_000);

    // target + 1 edges, then nothing until the next arm.
    assert_eq!(bench.edges_delivered(), 4);
    assert!(!bench.interrupt_enabled());
    assert_eq!(c.state().phase, Phase::Complete);

    // The leftover timeout fires into a closed window and changes nothing.
    bench.advance_us(1_000_000);
    assert!(!bench.timer_pending());
    assert_eq!(c.state().phase, Phase::Complete);
    assert!(matches!(c.try_outcome(), Some(WindowOutcome::Complete(_))));

    c.disarm().unwrap();
    c.arm(2, 1_000).unwrap();
    assert!(bench.interrupt_enabled());
    bench.advance_us(50_000);
    assert_eq!(bench.edges_delivered(), 4 + 3);
    c.disarm().unwrap();
}

#[test]
fn counter_timeout_publishes_timed_out() {
    let bench = Bench::new();
    let mut c = counter(&bench);

    c.arm(5, 20).unwrap();
    bench.advance_us(19_000);
    assert!(c.try_outcome().is_none());
    bench.advance_us(2_000);

    assert_eq!(c.try_outcome(), Some(WindowOutcome::TimedOut));
    assert_eq!(c.state().phase, Phase::TimedOut);
    assert!(!c.is_active());
    c.disarm().unwrap();
    assert!(!bench.is_subscribed());
}

#[test]
fn disarm_is_idempotent() {
    let bench = Bench::new();
    let mut c = counter(&bench);

    c.arm(5, 100).unwrap();
    c.disarm().unwrap();
    c.disarm().unwrap();

    assert_eq!(bench.unsubscribe_calls(), 1);
    assert!(!bench.timer_pending());
    assert_eq!(c.state().phase, Phase::Cancelled);
}

#[test]
fn arm_rejects_invalid_arguments_before_subscribing() {
    let bench = Bench::new();
    let mut c = counter(&bench);

    assert!(matches!(c.arm(0, 100), Err(Error::InvalidConfiguration(_))));
    assert!(matches!(c.arm(10, 0), Err(Error::InvalidConfiguration(_))));
    assert_eq!(bench.subscribe_calls(), 0);
    assert_eq!(bench.timer_schedules(), 0);
}

#[test]
fn arm_while_armed_is_rejected() {
    let bench = Bench::new();
    let mut c = counter(&bench);

    c.arm(10, 100).unwrap();
    assert!(matches!(c.arm(10, 100), Err(Error::InvalidConfiguration(_))));
    assert!(c.is_active());
    assert!(bench.is_subscribed());
    assert_eq!(bench.subscribe_calls(), 1);
    c.disarm().unwrap();
}

#[test]
fn rearm_after_completion_releases_previous_subscription() {
    let bench = Bench::new();
    bench.show(1_000.0, 2_000.0, 1_500.0);
    let mut c = counter(&bench);

    c.arm(2, 100).unwrap();
    bench.advance_us(5_000);
    assert!(matches!(c.try_outcome(), Some(WindowOutcome::Complete(_))));

    c.arm(2, 100).unwrap();
    assert_eq!(bench.unsubscribe_calls(), 1);
    assert_eq!(bench.subscribe_calls(), 2);
    assert_eq!(c.state().cycle_count, 0);
    c.disarm().unwrap();
}

#[test]
fn subscribe_failure_leaves_counter_idle() {
    let bench = Bench::new();
    bench.fail_next_subscribe();
    let mut c = counter(&bench);

    assert_eq!(
        c.arm(10, 100),
        Err(Error::Hal(HalError::InterruptSubscribeFailed))
    );
    assert!(!c.is_active());
    assert!(!c.is_subscribed());
    assert_eq!(bench.timer_schedules(), 0);
}

#[test]
fn timer_failure_releases_interrupt() {
    let bench = Bench::new();
    bench.fail_next_schedule();
    let mut c = counter(&bench);

    assert_eq!(c.arm(10, 100), Err(Error::Hal(HalError::TimerScheduleFailed)));
    assert!(!c.is_active());
    assert!(!bench.is_subscribed());
}

#[test]
fn dropping_counter_releases_interrupt() {
    let bench = Bench::new();
    let mut c = counter(&bench);
    c.arm(10, 100).unwrap();
    drop(c);

    assert!(!bench.is_subscribed());
    assert!(!bench.timer_pending());
}

// ── Async path ────────────────────────────────────────────────

/// Advance simulated time from a second thread until `done` is set.
fn drive(bench: &Bench, done: &Arc<AtomicBool>) -> thread::JoinHandle<()> {
    let bench = bench.clone();
    let done = Arc::clone(done);
    thread::spawn(move || {
        while !done.load(Ordering::SeqCst) {
            bench.advance_us(250);
            thread::yield_now();
        }
    })
}

#[test]
fn async_read_matches_blocking_read() {
    let bench = Bench::new();
    bench.show(1_000.0, 2_000.0, 1_500.0);
    let mut sensor = bench.sensor(SensorConfig::default());

    let done = Arc::new(AtomicBool::new(false));
    let driver = drive(&bench, &done);
    let triple = block_on(sensor.read_async(&mut NullSink));
    done.store(true, Ordering::SeqCst);
    driver.join().unwrap();

    let triple = triple.unwrap();
    assert_close(triple.red, 1_000.0, 0.01);
    assert_close(triple.green, 2_000.0, 0.01);
    assert_close(triple.blue, 1_500.0, 0.01);
    assert!(!bench.is_subscribed());
}

#[test]
fn abandoned_async_read_disarms() {
    let bench = Bench::new();
    bench.show(1_000.0, 2_000.0, 1_500.0);
    let mut sensor = bench.sensor(SensorConfig::default());

    let polled = block_on(poll_once(sensor.read_async(&mut NullSink)));
    assert!(polled.is_none());

    assert!(!bench.is_subscribed());
    assert!(!bench.timer_pending());
    // The sensor is usable again.
    let hz = sensor.measure(FilterSelection::Red, &mut NullSink).unwrap();
    assert_close(hz, 1_000.0, 0.001);
}

#[test]
fn async_read_times_out_through_the_timer() {
    let bench = Bench::new();
    bench.show(0.0, 0.0, 0.0);
    let mut sensor = bench.sensor(SensorConfig::default());
    sensor.set_timeout_ms(50).unwrap();

    let done = Arc::new(AtomicBool::new(false));
    let driver = drive(&bench, &done);
    let result = block_on(sensor.read_async(&mut NullSink));
    done.store(true, Ordering::SeqCst);
    driver.join().unwrap();

    assert_eq!(result, Err(Error::MeasurementTimeout));
    assert!(!bench.is_subscribed());
    assert!(!bench.timer_pending());
}

#[test]
fn async_measure_waits_on_a_silent_timer_until_dropped() {
    let bench = Bench::new();
    bench.show(0.0, 0.0, 0.0);
    bench.swallow_timer(true);
    let mut sensor = bench.sensor(SensorConfig::default());
    sensor.set_timeout_ms(50).unwrap();

    let mut sink = NullSink;
    {
        let meter = sensor.reader_mut().meter_mut();
        let mut fut = std::pin::pin!(meter.measure_async(FilterSelection::Red, 10, 50, &mut sink));
        assert!(block_on(poll_once(&mut fut)).is_none());
        // Far past the polling path's backstop.
        bench.advance_us(1_000_000);
        assert!(block_on(poll_once(&mut fut)).is_none());
        assert!(bench.is_subscribed());
    }

    assert!(!bench.is_subscribed());
}
