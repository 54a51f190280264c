//! Output formatting and persistence for heatmap results.
//!
//! Supports pretty-printing, JSON serialization, and CSV append.

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;

use crate::heatmap::HeatmapConfig;
use crate::heatmap::latest::DevicePath;
use crate::heatmap::types::Circle;
use crate::stores::StoreStatus;
use csv::WriterBuilder;
use std::fs::{self, OpenOptions};
use std::io::Write;

/// Everything produced by one heatmap run.
#[derive(Debug, Serialize)]
pub struct HeatmapReport {
    pub generated_at: DateTime<Utc>,
    pub congestion_threshold: usize,
    pub grid_size: f64,
    pub min_coord: f64,
    pub max_coord: f64,
    pub circles: Vec<Circle>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stores: Option<Vec<StoreStatus>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub paths: Option<Vec<DevicePath>>,
}

impl HeatmapReport {
    pub fn new(congestion_threshold: usize, config: &HeatmapConfig, circles: Vec<Circle>) -> Self {
        Self {
            generated_at: Utc::now(),
            congestion_threshold,
            grid_size: config.grid_size(),
            min_coord: config.space().min_coord,
            max_coord: config.space().max_coord,
            circles,
            stores: None,
            paths: None,
        }
    }

    pub fn with_stores(mut self, stores: Vec<StoreStatus>) -> Self {
        self.stores = Some(stores);
        self
    }

    pub fn with_paths(mut self, paths: Vec<DevicePath>) -> Self {
        self.paths = Some(paths);
        self
    }
}

/// One CSV row per emitted circle.
#[derive(Debug, Serialize)]
struct CircleRecord {
    timestamp: DateTime<Utc>,
    cx: f64,
    cy: f64,
    r: f64,
}

/// Logs a report using Rust's debug pretty-print format.
pub fn print_pretty(report: &HeatmapReport) {
    debug!("{:#?}", report);
}

/// Writes any serializable value as pretty-printed JSON followed by a newline.
pub fn write_json<W: Write>(mut writer: W, value: &impl Serialize) -> Result<()> {
    serde_json::to_writer_pretty(&mut writer, value)?;
    writeln!(writer)?;
    Ok(())
}

/// Prints any serializable value to stdout as pretty-printed JSON.
pub fn print_json(value: &impl Serialize) -> Result<()> {
    write_json(std::io::stdout().lock(), value)
}

/// Appends one row per circle to a CSV file, all stamped with the same time.
///
/// Writes headers first if the file is missing or still empty.
pub fn append_circles(path: &str, circles: &[Circle]) -> Result<()> {
    let has_rows = fs::metadata(path).map(|m| m.len() > 0).unwrap_or(false);
    debug!(path, has_rows, rows = circles.len(), "Appending CSV records");

    let file = OpenOptions::new().append(true).create(true).open(path)?;

    let mut writer = WriterBuilder::new()
        .has_headers(!has_rows) // IMPORTANT when appending
        .from_writer(file);

    let timestamp = Utc::now();
    for c in circles {
        writer.serialize(CircleRecord {
            timestamp,
            cx: c.cx,
            cy: c.cy,
            r: c.r,
        })?;
    }
    writer.flush()?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::path::Path;

    fn temp_path(name: &str) -> String {
        format!("{}/{}", env::temp_dir().display(), name)
    }

    fn sample_circles() -> Vec<Circle> {
        vec![
            Circle {
                cx: 1.0,
                cy: 2.0,
                r: 0.5,
            },
            Circle {
                cx: 3.0,
                cy: 4.0,
                r: 1.5,
            },
        ]
    }

    #[test]
    fn test_print_pretty_does_not_panic() {
        let report = HeatmapReport::new(2, &HeatmapConfig::default(), sample_circles());
        print_pretty(&report);
    }

    #[test]
    fn test_write_json_report() {
        let report = HeatmapReport::new(2, &HeatmapConfig::default(), sample_circles());
        let mut buf = Vec::new();
        write_json(&mut buf, &report).unwrap();

        let value: serde_json::Value = serde_json::from_slice(&buf).unwrap();
        assert_eq!(value["congestion_threshold"], 2);
        assert_eq!(value["grid_size"], 5.0);
        assert_eq!(value["circles"][1]["r"], 1.5);
        assert!(value.get("stores").is_none());
        assert!(value.get("paths").is_none());
    }

    #[test]
    fn test_report_includes_optional_sections() {
        let report = HeatmapReport::new(2, &HeatmapConfig::default(), vec![])
            .with_stores(vec![])
            .with_paths(vec![]);
        let value = serde_json::to_value(&report).unwrap();
        assert!(value["stores"].as_array().unwrap().is_empty());
        assert!(value["paths"].as_array().unwrap().is_empty());
    }

    #[test]
    fn test_append_circles_writes_header_once() {
        let path = temp_path("congestion_heatmap_test_header.csv");
        let _ = fs::remove_file(&path);

        append_circles(&path, &sample_circles()).unwrap();
        append_circles(&path, &sample_circles()).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let header_count = content.lines().filter(|l| l.contains("timestamp")).count();
        assert_eq!(header_count, 1);
        // 1 header + 4 data rows
        assert_eq!(content.lines().count(), 5);

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_append_after_empty_run_still_writes_header() {
        let path = temp_path("congestion_heatmap_test_empty.csv");
        let _ = fs::remove_file(&path);

        append_circles(&path, &[]).unwrap();
        assert!(Path::new(&path).exists());

        append_circles(&path, &sample_circles()).unwrap();
        let content = fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("timestamp,cx,cy,r"));

        fs::remove_file(&path).unwrap();
    }
}
