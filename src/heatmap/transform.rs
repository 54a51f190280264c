//! Mapping from geographic coordinates into the bounded display space.

use anyhow::{Result, ensure};
use serde::Serialize;

use crate::heatmap::types::{Point, TransformedPoint};

/// Where points with unusable coordinates are placed: well off the map.
pub const OFF_MAP: TransformedPoint = TransformedPoint {
    x: -1000.0,
    y: -1000.0,
};

/// The display space. Longitude maps straight to `x`; latitude is flipped
/// so that larger latitudes end up nearer the top (smaller `y`).
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CoordinateSpace {
    pub min_coord: f64,
    pub max_coord: f64,
}

impl Default for CoordinateSpace {
    fn default() -> Self {
        Self {
            min_coord: 0.0,
            max_coord: 21.0,
        }
    }
}

impl CoordinateSpace {
    pub fn new(min_coord: f64, max_coord: f64) -> Self {
        Self {
            min_coord,
            max_coord,
        }
    }

    /// Builds a space after checking that both bounds are finite.
    pub fn checked(min_coord: f64, max_coord: f64) -> Result<Self> {
        ensure!(
            min_coord.is_finite() && max_coord.is_finite(),
            "invalid coordinate bounds: min {min_coord}, max {max_coord}"
        );
        Ok(Self::new(min_coord, max_coord))
    }

    pub fn transform(&self, longitude: Option<f64>, latitude: Option<f64>) -> TransformedPoint {
        match (longitude, latitude) {
            (Some(lon), Some(lat)) if !lon.is_nan() && !lat.is_nan() => {
                TransformedPoint {
                    x: lon,
                    y: self.min_coord + (self.max_coord - lat),
                }
            }
            _ => OFF_MAP,
        }
    }

    pub fn transform_point(&self, point: &Point) -> TransformedPoint {
        self.transform(point.longitude, point.latitude)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transform_flips_latitude() {
        let space = CoordinateSpace::default();
        let p = space.transform(Some(3.5), Some(10.0));
        assert_eq!(p, TransformedPoint { x: 3.5, y: 11.0 });
    }

    #[test]
    fn test_transform_respects_custom_bounds() {
        let space = CoordinateSpace::new(2.0, 30.0);
        let p = space.transform(Some(-4.0), Some(40.0));
        assert_eq!(p.x, -4.0);
        assert_eq!(p.y, 2.0 + 30.0 - 40.0);
    }

    #[test]
    fn test_transform_missing_coordinate_goes_off_map() {
        let space = CoordinateSpace::default();
        assert_eq!(space.transform(None, Some(1.0)), OFF_MAP);
        assert_eq!(space.transform(Some(1.0), None), OFF_MAP);
        assert_eq!(space.transform(Some(f64::NAN), Some(1.0)), OFF_MAP);
    }

    #[test]
    fn test_checked_bounds() {
        assert!(CoordinateSpace::checked(0.0, 21.0).is_ok());
        assert!(CoordinateSpace::checked(5.0, 5.0).is_ok());
        assert!(CoordinateSpace::checked(21.0, 0.0).is_ok());
        assert!(CoordinateSpace::checked(f64::NEG_INFINITY, 0.0).is_err());
    }

    #[test]
    fn test_transform_point() {
        let space = CoordinateSpace::default();
        let point = Point::new(5.0, 5.0, 1.0);
        assert_eq!(space.transform_point(&point), TransformedPoint { x: 5.0, y: 16.0 });
    }
}
