//! Low-level sensor line and edge-counting drivers.

pub mod edge_counter;
pub mod lines;
