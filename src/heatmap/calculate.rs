use anyhow::{Result, ensure};
use serde::Serialize;
use tracing::{debug, info};

use crate::heatmap::grid::Grid;
use crate::heatmap::latest::latest_points;
use crate::heatmap::transform::CoordinateSpace;
use crate::heatmap::types::{Circle, DeviceData};
use crate::heatmap::utility::enclosing_circle;

/// Extra radius added around every congestion circle, matching the size
/// of a rendered latest-position marker.
pub const LATEST_POINT_PADDING: f64 = 0.5;

/// Grid and coordinate-space parameters for a heatmap run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HeatmapConfig {
    grid_size: f64,
    space: CoordinateSpace,
    padding: f64,
}

impl Default for HeatmapConfig {
    fn default() -> Self {
        Self {
            grid_size: 5.0,
            space: CoordinateSpace::default(),
            padding: LATEST_POINT_PADDING,
        }
    }
}

impl HeatmapConfig {
    pub fn new(grid_size: f64, min_coord: f64, max_coord: f64) -> Result<Self> {
        ensure!(
            grid_size.is_finite() && grid_size > 0.0,
            "grid size must be a positive number, got {grid_size}"
        );

        Ok(Self {
            grid_size,
            space: CoordinateSpace::checked(min_coord, max_coord)?,
            padding: LATEST_POINT_PADDING,
        })
    }

    pub fn with_padding(mut self, padding: f64) -> Result<Self> {
        ensure!(
            padding.is_finite() && padding >= 0.0,
            "padding must be a non-negative number, got {padding}"
        );
        self.padding = padding;
        Ok(self)
    }

    pub fn grid_size(&self) -> f64 {
        self.grid_size
    }

    pub fn space(&self) -> &CoordinateSpace {
        &self.space
    }

    pub fn padding(&self) -> f64 {
        self.padding
    }
}

/// Computes congestion circles with the default grid (`5`) and coordinate
/// space (`0..21`).
pub fn calculate<S: AsRef<str>>(
    data: &DeviceData,
    selected: &[S],
    congestion_threshold: usize,
) -> Vec<Circle> {
    calculate_with(data, selected, congestion_threshold, &HeatmapConfig::default())
}

/// Computes congestion circles from the latest position of each selected
/// device.
///
/// Latest positions are binned into a square grid; every cell holding at
/// least `congestion_threshold` devices yields one circle around its members.
/// Fewer than two positioned devices never form congestion, so an empty list
/// is returned. Circles come out in the order their cells were first filled.
pub fn calculate_with<S: AsRef<str>>(
    data: &DeviceData,
    selected: &[S],
    congestion_threshold: usize,
    config: &HeatmapConfig,
) -> Vec<Circle> {
    let latest = latest_points(data, selected);
    if latest.len() < 2 {
        debug!(
            positioned = latest.len(),
            "Not enough positioned devices for congestion"
        );
        return Vec::new();
    }

    let mut grid = Grid::new(config.grid_size);
    for (_, point) in &latest {
        grid.insert(config.space.transform_point(point));
    }

    debug!(
        positioned = latest.len(),
        cells = grid.len(),
        "Latest positions binned"
    );

    let mut circles = Vec::new();
    for (key, members) in grid.cells() {
        if members.len() < congestion_threshold {
            continue;
        }

        circles.push(enclosing_circle(members, config.padding));
        info!(cell = %key, device_count = members.len(), "Congested grid cell");
    }

    circles
}
