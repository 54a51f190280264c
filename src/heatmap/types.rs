//! Data types shared by the heatmap pipeline.

use chrono::DateTime;
use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;

/// All known devices, keyed by device id.
pub type DeviceData = HashMap<String, Device>;

/// A single location sample of a device.
///
/// Fields are decoded leniently: anything that is not usable as a number
/// becomes `None` instead of failing the whole document.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Point {
    #[serde(default, deserialize_with = "lenient_number")]
    pub latitude: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub longitude: Option<f64>,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub timestamp: Option<f64>,
}

impl Point {
    pub fn new(latitude: f64, longitude: f64, timestamp: f64) -> Self {
        Self {
            latitude: Some(latitude),
            longitude: Some(longitude),
            timestamp: Some(timestamp),
        }
    }

    /// A point is usable only when both coordinates are real numbers.
    pub fn is_valid(&self) -> bool {
        is_numeric(self.latitude) && is_numeric(self.longitude)
    }

    /// Ordering key for recency. Points without a usable timestamp rank oldest.
    pub(crate) fn recency(&self) -> f64 {
        self.timestamp
            .filter(|t| !t.is_nan())
            .unwrap_or(f64::NEG_INFINITY)
    }
}

pub(crate) fn is_numeric(value: Option<f64>) -> bool {
    value.is_some_and(|v| !v.is_nan())
}

/// The samples of one device, kept in document order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DevicePoints(Vec<(String, Point)>);

impl DevicePoints {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Point)> {
        self.0.iter().map(|(id, p)| (id.as_str(), p))
    }

    /// Valid points only, still in document order.
    pub fn valid(&self) -> impl Iterator<Item = &Point> {
        self.0.iter().map(|(_, p)| p).filter(|p| p.is_valid())
    }
}

impl<K: Into<String>> FromIterator<(K, Point)> for DevicePoints {
    fn from_iter<I: IntoIterator<Item = (K, Point)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, p)| (k.into(), p)).collect())
    }
}

impl<'de> Deserialize<'de> for DevicePoints {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct PointsVisitor;

        impl<'de> Visitor<'de> for PointsVisitor {
            type Value = DevicePoints;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of point id to location sample")
            }

            fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut points = Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some((id, raw)) = map.next_entry::<String, Value>()? {
                    // Samples that are not objects carry no coordinates
                    let Value::Object(_) = raw else {
                        continue;
                    };
                    if let Ok(point) = serde_json::from_value::<Point>(raw) {
                        points.push((id, point));
                    }
                }
                Ok(DevicePoints(points))
            }
        }

        deserializer.deserialize_map(PointsVisitor)
    }
}

/// A tracked device and its location history.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Device {
    #[serde(default)]
    pub points: Option<DevicePoints>,
}

impl Device {
    pub fn from_points<K: Into<String>>(points: impl IntoIterator<Item = (K, Point)>) -> Self {
        Self {
            points: Some(points.into_iter().collect()),
        }
    }
}

/// A point after remapping into the display coordinate space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TransformedPoint {
    pub x: f64,
    pub y: f64,
}

/// Integer address of a grid cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CellKey {
    pub x: i64,
    pub y: i64,
}

impl fmt::Display for CellKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.x, self.y)
    }
}

/// A congested area: centroid of the cell members plus a covering radius.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Circle {
    pub cx: f64,
    pub cy: f64,
    pub r: f64,
}

fn lenient_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(value.as_f64())
}

fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => parse_timestamp(&s),
        _ => None,
    })
}

/// Parses a timestamp given as a numeric string or an RFC 3339 date.
///
/// RFC 3339 values are converted to epoch milliseconds.
pub fn parse_timestamp(raw: &str) -> Option<f64> {
    let raw = raw.trim();
    if let Ok(v) = raw.parse::<f64>() {
        return v.is_finite().then_some(v);
    }
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|dt| dt.timestamp_millis() as f64)
}
