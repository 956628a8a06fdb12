//! GPIO assignments for the reference ESP32 + TCS3200 wiring.
//!
//! Single source of truth for the firmware binary.  Boards that hard-wire
//! S0/S1, the LED or OE simply leave those lines out of `SensorLines`.

// ---------------------------------------------------------------------------
// Sensor output
// ---------------------------------------------------------------------------

/// OUT: square wave, frequency proportional to light on the selected filter.
pub const OUT_GPIO: i32 = 19;

// ---------------------------------------------------------------------------
// Filter select
// ---------------------------------------------------------------------------

pub const S2_GPIO: i32 = 5;
pub const S3_GPIO: i32 = 18;

// ---------------------------------------------------------------------------
// Frequency divider (optional)
// ---------------------------------------------------------------------------

pub const S0_GPIO: i32 = 17;
pub const S1_GPIO: i32 = 16;

// ---------------------------------------------------------------------------
// Illumination LED (optional)
// ---------------------------------------------------------------------------

pub const LED_GPIO: i32 = 23;

// ---------------------------------------------------------------------------
// Output enable (optional, active low)
// ---------------------------------------------------------------------------

/// Not wired on the reference board; OE is tied to GND.
pub const OE_GPIO: Option<i32> = None;
