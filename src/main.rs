//! CLI entry point for the congestion heatmap tool.
//!
//! Provides subcommands for computing congestion circles, per-store
//! occupancy, and device tracks from a device location history file.

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use congestion_heatmap::heatmap::latest::device_paths;
use congestion_heatmap::heatmap::transform::CoordinateSpace;
use congestion_heatmap::heatmap::{DeviceData, HeatmapConfig, calculate_with};
use congestion_heatmap::{
    output::{HeatmapReport, append_circles, print_json, print_pretty},
    parser::load_device_data,
    stores::{Occupancy, StoreLayout},
};
use std::ffi::OsStr;
use std::path::Path;
use tracing::info;
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "congestion_heatmap")]
#[command(about = "A tool to find congested areas from device locations", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct Selection {
    /// JSON (optionally gzip-compressed) file of device location history
    #[arg(value_name = "DATA_FILE")]
    data_file: String,

    /// Comma-separated device ids to consider (default: every device)
    #[arg(short, long, value_delimiter = ',')]
    devices: Vec<String>,
}

#[derive(Args)]
struct Space {
    /// Lower bound of the display coordinate space
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    min_coord: f64,

    /// Upper bound of the display coordinate space
    #[arg(long, default_value_t = 21.0, allow_negative_numbers = true)]
    max_coord: f64,
}

impl Space {
    fn checked(&self) -> Result<CoordinateSpace> {
        CoordinateSpace::checked(self.min_coord, self.max_coord)
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Compute congestion circles from the latest device positions
    Heatmap {
        #[command(flatten)]
        selection: Selection,

        /// Minimum devices in a grid cell to count as congested
        #[arg(short, long, env = "CONGESTION_THRESHOLD", default_value_t = 2)]
        threshold: usize,

        /// Side length of a grid cell in display units
        #[arg(short, long, default_value_t = 5.0)]
        grid_size: f64,

        #[command(flatten)]
        space: Space,

        /// Optional: CSV file to append the circles to
        #[arg(long)]
        csv: Option<String>,

        /// Optional: store layout JSON; adds per-store occupancy to the report
        #[arg(short, long)]
        stores: Option<String>,

        /// Include the chronological device tracks in the report
        #[arg(long, default_value_t = false)]
        with_paths: bool,
    },
    /// Report which stores are busy based on the latest device positions
    Stores {
        #[command(flatten)]
        selection: Selection,

        /// JSON file describing the store layout
        #[arg(short, long)]
        stores: String,

        /// Minimum devices inside a store to count as busy
        #[arg(short, long, env = "CONGESTION_THRESHOLD", default_value_t = 2)]
        threshold: usize,

        #[command(flatten)]
        space: Space,
    },
    /// Print chronological device tracks in display coordinates
    Paths {
        #[command(flatten)]
        selection: Selection,

        /// Only keep the newest sample of each device
        #[arg(short, long, default_value_t = false)]
        latest_only: bool,

        #[command(flatten)]
        space: Space,
    },
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path = std::env::var("LOG_FILE_PATH")
        .unwrap_or_else(|_| "logs/congestion_heatmap.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("congestion_heatmap.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Heatmap {
            selection,
            threshold,
            grid_size,
            space,
            csv,
            stores,
            with_paths,
        } => {
            let config = HeatmapConfig::new(grid_size, space.min_coord, space.max_coord)?;
            let (data, devices) = load_selection(&selection)?;

            let circles = calculate_with(&data, &devices, threshold, &config);
            info!(circles = circles.len(), threshold, "Heatmap computed");

            if let Some(path) = csv {
                append_circles(&path, &circles)?;
            }

            let mut report = HeatmapReport::new(threshold, &config, circles);
            if let Some(stores) = stores {
                let layout = StoreLayout::load(&stores)?;
                let statuses = layout.status(&data, &devices, threshold, config.space());
                report = report.with_stores(statuses);
            }
            if with_paths {
                let paths = device_paths(&data, &devices, config.space(), false);
                report = report.with_paths(paths);
            }

            print_pretty(&report);
            print_json(&report)?;
        }
        Commands::Stores {
            selection,
            stores,
            threshold,
            space,
        } => {
            let space = space.checked()?;
            let (data, devices) = load_selection(&selection)?;
            let layout = StoreLayout::load(&stores)?;

            let statuses = layout.status(&data, &devices, threshold, &space);
            let busy = statuses
                .iter()
                .filter(|s| s.status == Occupancy::Busy)
                .count();
            info!(stores = statuses.len(), busy, threshold, "Store occupancy computed");

            print_json(&statuses)?;
        }
        Commands::Paths {
            selection,
            latest_only,
            space,
        } => {
            let space = space.checked()?;
            let (data, devices) = load_selection(&selection)?;

            let paths = device_paths(&data, &devices, &space, latest_only);
            info!(devices = paths.len(), latest_only, "Device paths built");

            print_json(&paths)?;
        }
    }

    Ok(())
}

/// Loads the device data and resolves the device selection, falling back
/// to every known device in id order.
#[tracing::instrument(skip(selection), fields(data_file = %selection.data_file))]
fn load_selection(selection: &Selection) -> Result<(DeviceData, Vec<String>)> {
    let data = load_device_data(&selection.data_file)?;

    let devices = if selection.devices.is_empty() {
        let mut ids: Vec<String> = data.keys().cloned().collect();
        ids.sort();
        ids
    } else {
        selection.devices.clone()
    };

    info!(
        known = data.len(),
        selected = devices.len(),
        "Device data loaded"
    );
    Ok((data, devices))
}
