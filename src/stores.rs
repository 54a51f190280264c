//! Per-store occupancy based on where devices were last seen.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::heatmap::latest::latest_points;
use crate::heatmap::transform::CoordinateSpace;
use crate::heatmap::types::{DeviceData, TransformedPoint};

/// A store footprint on the map.
///
/// Stored records reuse the `latitude`/`longitude` names for the box origin,
/// but the box lives in display coordinates: `latitude` is the left edge and
/// `longitude` the top edge.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Store {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
    pub width: f64,
    pub height: f64,
}

impl Store {
    /// Inclusive containment test in display coordinates.
    pub fn contains(&self, point: TransformedPoint) -> bool {
        let (min_x, max_x) = (self.latitude, self.latitude + self.width);
        let (min_y, max_y) = (self.longitude, self.longitude + self.height);
        point.x >= min_x && point.x <= max_x && point.y >= min_y && point.y <= max_y
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Occupancy {
    Busy,
    Idle,
}

impl Occupancy {
    /// A store is busy once it holds at least `threshold` devices.
    pub fn classify(device_count: usize, threshold: usize) -> Self {
        if device_count >= threshold {
            Occupancy::Busy
        } else {
            Occupancy::Idle
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoreStatus {
    pub store_id: String,
    pub name: Option<String>,
    pub device_count: usize,
    pub status: Occupancy,
}

/// The set of stores drawn on the map.
///
/// Stored as a JSON array on disk:
/// ```json
/// [
///   { "id": "s1", "name": "Bakery", "latitude": 2, "longitude": 3, "width": 4, "height": 2 }
/// ]
/// ```
#[derive(Debug, Clone, Default)]
pub struct StoreLayout {
    stores: Vec<Store>,
}

impl StoreLayout {
    pub fn new(stores: Vec<Store>) -> Self {
        Self { stores }
    }

    /// Loads the layout from a JSON file at `path`.
    pub fn load(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read store layout '{path}'"))?;
        let stores: Vec<Store> = serde_json::from_str(&content)
            .with_context(|| format!("store layout '{path}' is not a JSON array of stores"))?;
        debug!(path, stores = stores.len(), "Store layout loaded");
        Ok(Self { stores })
    }

    pub fn stores(&self) -> &[Store] {
        &self.stores
    }

    /// Counts the selected devices whose latest position falls inside each
    /// store and classifies the store against `threshold`.
    pub fn status<S: AsRef<str>>(
        &self,
        data: &DeviceData,
        selected: &[S],
        threshold: usize,
        space: &CoordinateSpace,
    ) -> Vec<StoreStatus> {
        let positions: Vec<TransformedPoint> = latest_points(data, selected)
            .into_iter()
            .map(|(_, p)| space.transform_point(p))
            .collect();

        self.stores
            .iter()
            .map(|store| {
                let device_count = positions.iter().filter(|p| store.contains(**p)).count();
                StoreStatus {
                    store_id: store.id.clone(),
                    name: store.name.clone(),
                    device_count,
                    status: Occupancy::classify(device_count, threshold),
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::heatmap::types::{Device, Point};
    use std::env;
    use std::fs;

    fn store(id: &str, x: f64, y: f64, w: f64, h: f64) -> Store {
        Store {
            id: id.to_string(),
            name: None,
            latitude: x,
            longitude: y,
            width: w,
            height: h,
        }
    }

    #[test]
    fn test_contains_is_inclusive() {
        let s = store("s", 1.0, 1.0, 2.0, 2.0);
        assert!(s.contains(TransformedPoint { x: 1.0, y: 3.0 }));
        assert!(s.contains(TransformedPoint { x: 2.0, y: 2.0 }));
        assert!(!s.contains(TransformedPoint { x: 3.1, y: 2.0 }));
        assert!(!s.contains(TransformedPoint { x: 2.0, y: 0.9 }));
    }

    #[test]
    fn test_classify_boundaries() {
        assert_eq!(Occupancy::classify(3, 3), Occupancy::Busy);
        assert_eq!(Occupancy::classify(4, 3), Occupancy::Busy);
        assert_eq!(Occupancy::classify(2, 3), Occupancy::Idle);
        assert_eq!(Occupancy::classify(0, 0), Occupancy::Busy);
    }

    #[test]
    fn test_status_counts_latest_positions() {
        let mut data = DeviceData::new();
        // (lat 10, lon 10) -> display (10, 11)
        data.insert(
            "d1".into(),
            Device::from_points([
                ("old", Point::new(1.0, 1.0, 1.0)),
                ("new", Point::new(10.0, 10.0, 2.0)),
            ]),
        );
        data.insert("d2".into(), Device::from_points([("p", Point::new(10.5, 10.5, 1.0))]));
        data.insert("d3".into(), Device::from_points([("p", Point::new(1.0, 1.0, 1.0))]));

        let layout = StoreLayout::new(vec![
            store("center", 9.0, 10.0, 2.0, 2.0),
            store("corner", 0.0, 0.0, 2.0, 2.0),
        ]);
        let statuses = layout.status(
            &data,
            &["d1", "d2", "d3"],
            2,
            &CoordinateSpace::default(),
        );

        assert_eq!(statuses[0].store_id, "center");
        assert_eq!(statuses[0].device_count, 2);
        assert_eq!(statuses[0].status, Occupancy::Busy);
        assert_eq!(statuses[1].device_count, 0);
        assert_eq!(statuses[1].status, Occupancy::Idle);
    }

    #[test]
    fn test_load_layout() {
        let path = format!("{}/congestion_heatmap_stores.json", env::temp_dir().display());
        fs::write(
            &path,
            r#"[{"id": "s1", "name": "Bakery", "latitude": 2, "longitude": 3, "width": 4, "height": 2}]"#,
        )
        .unwrap();

        let layout = StoreLayout::load(&path).unwrap();
        assert_eq!(layout.stores().len(), 1);
        assert_eq!(layout.stores()[0].name.as_deref(), Some("Bakery"));

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_load_missing_layout_fails() {
        assert!(StoreLayout::load("/nonexistent/stores.json").is_err());
    }
}
