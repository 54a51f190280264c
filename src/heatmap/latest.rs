//! Per-device history queries: most recent valid sample and full tracks.

use serde::Serialize;
use tracing::debug;

use crate::heatmap::transform::CoordinateSpace;
use crate::heatmap::types::{Device, DeviceData, Point};

/// Returns the most recent valid sample of a device.
///
/// Valid samples are stable-sorted newest first, so among samples sharing
/// the newest timestamp the one appearing first in the document wins.
pub fn latest_point(device: &Device) -> Option<&Point> {
    let points = device.points.as_ref()?;
    let mut valid: Vec<&Point> = points.valid().collect();
    valid.sort_by(|a, b| b.recency().total_cmp(&a.recency()));
    valid.into_iter().next()
}

/// Latest valid sample of every selected device, in selection order.
///
/// Unknown devices, devices without samples and devices whose samples are
/// all invalid are skipped.
pub fn latest_points<'a, S: AsRef<str>>(
    data: &'a DeviceData,
    selected: &'a [S],
) -> Vec<(&'a str, &'a Point)> {
    selected
        .iter()
        .map(AsRef::<str>::as_ref)
        .filter_map(|id| {
            let device = data.get(id)?;
            match device.points.as_ref() {
                Some(points) if !points.is_empty() => {}
                _ => {
                    debug!(device_id = id, "Device has no samples, skipping");
                    return None;
                }
            }
            latest_point(device).map(|p| (id, p))
        })
        .collect()
}

/// One sample of a device track, already in display coordinates.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PathPoint {
    pub x: f64,
    pub y: f64,
    pub timestamp: Option<f64>,
}

/// The chronological track of a single device.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DevicePath {
    pub device_id: String,
    pub points: Vec<PathPoint>,
}

impl DevicePath {
    /// The newest sample of the track.
    pub fn latest(&self) -> Option<&PathPoint> {
        self.points.last()
    }
}

/// Builds oldest-to-newest tracks for the selected devices.
///
/// With `latest_only` each track is cut down to its final sample.
pub fn device_paths<S: AsRef<str>>(
    data: &DeviceData,
    selected: &[S],
    space: &CoordinateSpace,
    latest_only: bool,
) -> Vec<DevicePath> {
    selected
        .iter()
        .map(AsRef::<str>::as_ref)
        .filter_map(|id| {
            let points = data.get(id)?.points.as_ref()?;
            let mut valid: Vec<&Point> = points.valid().collect();
            if valid.is_empty() {
                return None;
            }
            valid.sort_by(|a, b| a.recency().total_cmp(&b.recency()));
            if latest_only {
                valid.drain(..valid.len() - 1);
            }

            let points = valid
                .into_iter()
                .map(|p| {
                    let t = space.transform_point(p);
                    PathPoint {
                        x: t.x,
                        y: t.y,
                        timestamp: p.timestamp,
                    }
                })
                .collect();

            Some(DevicePath {
                device_id: id.to_string(),
                points,
            })
        })
        .collect()
}
