//! CLI entry point for the Live Insights session dashboard backend.
//!
//! Loads a session snapshot, runs the filter → aggregate → forecast → merge
//! pipeline for one set of controls, and emits the chart payload.

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Args, Parser, Subcommand};
use live_insights::config::PipelineConfig;
use live_insights::dataset::{self, Dataset};
use live_insights::output::{print_pretty, print_summary, write_json, write_series_csv};
use live_insights::pipeline::types::{Metric, TimeRange};
use live_insights::pipeline::{Selection, recompute_bounded};
use live_insights::presets::{AssetPreset, DevicePreset, STATES, state_name};
use live_insights::stats::human_format;
use std::collections::BTreeSet;
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
#[command(name = "live_insights")]
#[command(about = "Session telemetry charts with a short-horizon attempts forecast", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute the full chart payload for one set of controls
    Render {
        #[command(flatten)]
        controls: Controls,

        /// File to write the JSON payload to ("-" for stdout)
        #[arg(short, long, default_value = "-")]
        output: String,

        /// Optional CSV export of the merged series
        #[arg(long)]
        csv: Option<String>,
    },
    /// Log the headline numbers for one set of controls
    Summary {
        #[command(flatten)]
        controls: Controls,
    },
    /// List the assets, devices and states present in a snapshot
    Options {
        /// Path or URL of the session CSV (optionally gzip-compressed)
        #[arg(value_name = "FILE_OR_URL")]
        source: String,
    },
}

#[derive(Args)]
struct Controls {
    /// Path or URL of the session CSV (optionally gzip-compressed)
    #[arg(value_name = "FILE_OR_URL")]
    source: String,

    /// Quick asset selection, used when no --asset is given
    #[arg(long, value_enum, default_value_t = AssetPreset::Live)]
    asset_preset: AssetPreset,

    /// Explicit asset (repeatable)
    #[arg(long = "asset")]
    assets: Vec<String>,

    /// Quick device selection, used when no --device is given
    #[arg(long, value_enum, default_value_t = DevicePreset::Other)]
    device_preset: DevicePreset,

    /// Explicit device (repeatable)
    #[arg(long = "device")]
    devices: Vec<String>,

    /// Window start, epoch nanoseconds (exclusive)
    #[arg(long, allow_hyphen_values = true)]
    start: Option<i64>,

    /// Window end, epoch nanoseconds (exclusive)
    #[arg(long, allow_hyphen_values = true)]
    end: Option<i64>,

    /// Bucket indices selected on the chart; overrides --start/--end
    #[arg(long, value_delimiter = ',')]
    select: Vec<usize>,

    /// Metric summed for the main chart
    #[arg(long, value_enum, default_value_t = Metric::JustJoined)]
    metric: Metric,

    /// Forecast horizon in buckets (overrides FORECAST_HORIZON)
    #[arg(long)]
    horizon: Option<usize>,
}

impl Controls {
    fn selection(&self, dataset: &Dataset, config: &PipelineConfig) -> Selection {
        let assets = if self.assets.is_empty() {
            self.asset_preset.resolve()
        } else {
            self.assets.iter().cloned().collect::<BTreeSet<_>>()
        };
        let devices = if self.devices.is_empty() {
            self.device_preset.resolve()
        } else {
            self.devices.iter().cloned().collect::<BTreeSet<_>>()
        };

        let range = if self.select.is_empty() {
            let full = dataset.full_range();
            TimeRange::new(
                self.start.unwrap_or(full.start),
                self.end.unwrap_or(full.end),
            )
        } else {
            TimeRange::from_selection(
                Some(self.select.as_slice()),
                dataset.min_ts(),
                dataset.max_ts(),
                config.bucket_width,
            )
        };

        Selection {
            assets,
            devices,
            range,
        }
    }

    fn config(&self) -> Result<PipelineConfig> {
        let mut config = PipelineConfig::from_env()?;
        config.metric = self.metric;
        if let Some(horizon) = self.horizon {
            config.forecast.horizon = horizon;
        }
        config.validate()?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/live_insights.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("live_insights.log"));

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
        Commands::Render {
            controls,
            output,
            csv,
        } => {
            let config = controls.config()?;
            let dataset = install_dataset(&controls.source).await?;
            let selection = controls.selection(&dataset, &config);

            info!(
                slider_min = dataset.min_ts(),
                slider_max = config.slider_max(dataset.max_ts()),
                start = selection.range.start,
                end = selection.range.end,
                "Rendering chart payload"
            );

            let payload = recompute_bounded(&dataset, &selection, &config).await;
            print_pretty(&payload);
            write_json(&output, &payload)?;

            if let Some(csv_path) = csv {
                write_series_csv(&csv_path, &payload)?;
            }
        }
        Commands::Summary { controls } => {
            let config = controls.config()?;
            let dataset = install_dataset(&controls.source).await?;
            let selection = controls.selection(&dataset, &config);

            let payload = recompute_bounded(&dataset, &selection, &config).await;
            print_summary(&payload)?;

            info!(
                max_plays = %human_format(payload.summary.max_concurrent_plays),
                session_time = %payload.summary.avg_session_time,
                rbr = %payload.summary.avg_rbr,
                live_assets = payload.summary.live_assets,
                "Summary"
            );
        }
        Commands::Options { source } => {
            let dataset = install_dataset(&source).await?;

            for asset in dataset.assets() {
                info!(asset, "Asset");
            }
            for device in dataset.devices() {
                info!(device, "Device");
            }
            for state in dataset.states() {
                info!(state, name = state_name(state).unwrap_or("unknown"), "State");
            }

            info!(
                assets = dataset.assets().len(),
                devices = dataset.devices().len(),
                states = dataset.states().len(),
                known_states = STATES.len(),
                records = dataset.records().len(),
                "Options summary"
            );
        }
    }

    Ok(())
}

/// Loads the snapshot anchored at the current instant and installs it as
/// the process-wide base dataset.
#[tracing::instrument]
async fn install_dataset(source: &str) -> Result<std::sync::Arc<Dataset>> {
    let dataset = dataset::load(source, Utc::now())
        .await
        .with_context(|| format!("failed to load dataset from {source}"))?;
    Ok(dataset::init(dataset)?)
}
