//! Select, divider, LED and output-enable lines through the facade.

use tcs3200::ports::NullSink;
use tcs3200::{
    Error, FilterSelection, FrequencyDivider, SensorConfig, SensorEvent, Tcs3200,
};

use crate::sim_hw::{Bench, Line, Recorder};

#[test]
fn construction_drives_initial_line_states() {
    let bench = Bench::new();
    let mut rec = Recorder::default();
    let sensor = Tcs3200::new(bench.parts(), SensorConfig::default(), &mut rec).unwrap();

    assert_eq!(bench.selected_filter(), FilterSelection::Red);
    assert_eq!(bench.line(Line::Led), Some(true));
    // OE is active low.
    assert_eq!(bench.line(Line::Oe), Some(false));
    // 2 % scaling: S0 low, S1 high.
    assert_eq!(bench.line(Line::S0), Some(false));
    assert_eq!(bench.line(Line::S1), Some(true));
    assert_eq!(sensor.divider(), Some(FrequencyDivider::TwoPercent));
    assert!(sensor.led());
    assert!(!sensor.is_calibrated());
    assert_eq!(
        rec.events,
        vec![SensorEvent::DividerSet(FrequencyDivider::TwoPercent)]
    );
}

#[test]
fn invalid_config_is_rejected_before_touching_lines() {
    let bench = Bench::new();
    let config = SensorConfig {
        target_cycles: 0,
        ..SensorConfig::default()
    };

    let result = Tcs3200::new(bench.parts(), config, &mut NullSink);
    assert!(matches!(result, Err(Error::InvalidConfiguration(_))));
    assert_eq!(bench.line(Line::S0), None);
    assert_eq!(bench.line(Line::Led), None);
}

#[test]
fn divider_changes_are_written_and_reported() {
    let bench = Bench::new();
    let mut sensor = bench.sensor(SensorConfig::default());
    let mut rec = Recorder::default();

    sensor
        .set_divider(FrequencyDivider::HundredPercent, &mut rec)
        .unwrap();
    assert_eq!(bench.line(Line::S0), Some(true));
    assert_eq!(bench.line(Line::S1), Some(true));
    assert_eq!(sensor.config().divider, FrequencyDivider::HundredPercent);

    sensor.power_off(&mut rec).unwrap();
    assert_eq!(bench.line(Line::S0), Some(false));
    assert_eq!(bench.line(Line::S1), Some(false));
    assert_eq!(sensor.divider(), Some(FrequencyDivider::Off));
    assert_eq!(
        rec.events,
        vec![
            SensorEvent::DividerSet(FrequencyDivider::HundredPercent),
            SensorEvent::DividerSet(FrequencyDivider::Off),
        ]
    );
}

#[test]
fn led_follows_requests() {
    let bench = Bench::new();
    let mut sensor = bench.sensor(SensorConfig::default());

    sensor.set_led(false).unwrap();
    assert_eq!(bench.line(Line::Led), Some(false));
    assert!(!sensor.led());
    sensor.set_led(true).unwrap();
    assert_eq!(bench.line(Line::Led), Some(true));
}

#[test]
fn disabled_output_stops_measurements() {
    let bench = Bench::new();
    bench.show(1_000.0, 2_000.0, 1_500.0);
    let mut sensor = bench.sensor(SensorConfig::default());
    // 10 cycles at 1 kHz close well inside the 100 ms timeout.
    sensor.set_target_cycles(10).unwrap();
    sensor.set_timeout_ms(100).unwrap();

    sensor.set_output_enabled(false).unwrap();
    assert_eq!(bench.line(Line::Oe), Some(true));
    assert_eq!(
        sensor.measure(FilterSelection::Red, &mut NullSink),
        Err(Error::MeasurementTimeout)
    );

    sensor.set_output_enabled(true).unwrap();
    assert!(sensor.measure(FilterSelection::Red, &mut NullSink).is_ok());
}

#[test]
fn minimal_wiring_measures_but_cannot_scale() {
    let bench = Bench::new();
    bench.show(1_000.0, 2_000.0, 1_500.0);
    let mut rec = Recorder::default();
    let mut sensor =
        Tcs3200::new(bench.minimal_parts(), SensorConfig::default(), &mut rec).unwrap();

    assert!(rec.events.is_empty());
    assert_eq!(sensor.divider(), None);
    assert!(matches!(
        sensor.set_divider(FrequencyDivider::TwentyPercent, &mut NullSink),
        Err(Error::InvalidConfiguration(_))
    ));
    assert!(matches!(
        sensor.set_led(true),
        Err(Error::InvalidConfiguration(_))
    ));

    let triple = sensor.read(&mut NullSink).unwrap();
    assert!((triple.green - 2_000.0).abs() < 20.0);
}

#[test]
fn each_read_visits_red_green_blue_in_order() {
    let bench = Bench::new();
    bench.show(1_000.0, 2_000.0, 1_500.0);
    let mut sensor = bench.sensor(SensorConfig::default());
    let mut rec = Recorder::default();

    sensor.read(&mut rec).unwrap();
    let order: Vec<FilterSelection> = rec
        .events
        .iter()
        .filter_map(|e| match e {
            SensorEvent::FilterSelected(f) => Some(*f),
            _ => None,
        })
        .collect();
    assert_eq!(
        order,
        vec![
            FilterSelection::Red,
            FilterSelection::Green,
            FilterSelection::Blue
        ]
    );
    assert_eq!(bench.selected_filter(), FilterSelection::Blue);
}

#[test]
fn configuration_setters_validate() {
    let bench = Bench::new();
    let mut sensor = bench.sensor(SensorConfig::default());

    assert!(matches!(
        sensor.set_target_cycles(0),
        Err(Error::InvalidConfiguration(_))
    ));
    assert!(matches!(
        sensor.set_timeout_ms(5),
        Err(Error::InvalidConfiguration(_))
    ));
    sensor.set_target_cycles(20).unwrap();
    sensor.set_timeout_ms(250).unwrap();
    assert_eq!(sensor.config().target_cycles, 20);
    assert_eq!(sensor.config().timeout_ms, 250);
}
