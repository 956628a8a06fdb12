//! Adapters: concrete implementations of the port traits.
//!
//! | Adapter    | Implements                    | Connects to                 |
//! |------------|-------------------------------|-----------------------------|
//! | `esp`      | EdgeInput, OneShotTimer,      | ESP32 GPIO ISR, esp_timer   |
//! |            | SensorHal                     |                             |
//! | `log_sink` | EventSink                     | Serial log output           |
//! | `prompt`   | OperatorPrompt                | UART console / stdin        |
//! | `time`     | MicrosClock, DelayNs          | ESP32 system timer, FreeRTOS|

#[cfg(feature = "espidf")]
pub mod esp;
pub mod log_sink;
pub mod prompt;
pub mod time;
