//! JSON loader for device location history.

use anyhow::{Context, Result, bail};
use flate2::read::GzDecoder;
use serde_json::Value;
use std::path::Path;
use tracing::{debug, warn};

use crate::heatmap::types::{Device, DeviceData};

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Decodes device data from raw bytes, inflating gzip input first.
///
/// The document must be a JSON object keyed by device id. Entries that do
/// not look like a device are skipped with a warning.
///
/// # Errors
///
/// Returns an error if the bytes are not valid JSON (or gzip-compressed
/// JSON), or if the top-level value is not an object.
pub fn parse_device_data(bytes: &[u8]) -> Result<DeviceData> {
    let value: Value = if bytes.starts_with(&GZIP_MAGIC) {
        serde_json::from_reader(GzDecoder::new(bytes))
            .context("invalid gzip-compressed device data")?
    } else {
        serde_json::from_slice(bytes).context("invalid device data JSON")?
    };

    let Value::Object(entries) = value else {
        bail!("device data must be a JSON object keyed by device id");
    };

    let mut data = DeviceData::with_capacity(entries.len());
    for (device_id, entry) in entries {
        if !entry.is_object() {
            warn!(device_id = %device_id, "Skipping device entry that is not an object");
            continue;
        }
        match serde_json::from_value::<Device>(entry) {
            Ok(device) => {
                data.insert(device_id, device);
            }
            Err(e) => {
                warn!(device_id = %device_id, error = %e, "Skipping malformed device entry")
            }
        }
    }

    debug!(devices = data.len(), "Device data parsed");
    Ok(data)
}

/// Reads and decodes a device data file.
pub fn load_device_data(path: impl AsRef<Path>) -> Result<DeviceData> {
    let path = path.as_ref();
    let bytes = std::fs::read(path)
        .with_context(|| format!("failed to read device data '{}'", path.display()))?;
    parse_device_data(&bytes)
}
