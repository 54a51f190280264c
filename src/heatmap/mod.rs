//! Congestion heatmap computation.
//!
//! Takes the most recent valid position of each selected device, bins those
//! positions into a square grid in display coordinates, and emits a circle
//! for every cell crowded enough to count as congested.

pub mod calculate;
pub mod grid;
pub mod latest;
pub mod transform;
pub mod types;
pub mod utility;

pub use calculate::{HeatmapConfig, calculate, calculate_with};
pub use types::{Circle, Device, DeviceData, Point};
