use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

use zodmap::{
    collector::{CollectOptions, Collector},
    config::Config,
    dataset::FsDataset,
    imagery::{GeoImageClient, GeoImageSearch},
    models::LogId,
    observability::init_logging,
    services::LogService,
    stats::{DEFAULT_STATS_FILE, collect_stats, write_csv},
    web::{AppState, WebServer},
};

#[derive(Parser)]
#[command(name = "zodmap")]
#[command(version)]
#[command(about = "Trajectory and street-level imagery service for recorded driving logs")]
#[command(long_about = None)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "config.toml", global = true)]
    config: String,

    /// Listening IP address
    #[arg(short = 'H', long, value_name = "IP", global = true)]
    host: Option<String>,

    /// Listening port
    #[arg(short, long, value_name = "PORT", global = true)]
    port: Option<u16>,

    /// Dataset root directory (overrides config file)
    #[arg(short = 'd', long, value_name = "DIR", global = true)]
    dataset_root: Option<PathBuf>,

    /// Log level (overrides config file)
    #[arg(short = 'v', long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP API (default)
    Serve,
    /// Download street-level imagery along log trajectories
    Collect {
        /// Log id to process; repeat for several. Defaults to every log.
        #[arg(short, long = "log", value_name = "LOG_ID")]
        logs: Vec<String>,

        /// Search radius around the trajectory in meters
        #[arg(short, long, default_value_t = 10.0)]
        radius: f64,

        /// Output directory
        #[arg(short, long, default_value = "output")]
        output: PathBuf,
    },
    /// Export start position and traffic sign coverage of every log as CSV
    Stats {
        /// Output CSV file
        #[arg(short, long, default_value = DEFAULT_STATS_FILE)]
        output: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = Config::load_from_file(&cli.config)?;
    if let Some(host) = cli.host {
        config.web.host = host;
    }
    if let Some(port) = cli.port {
        config.web.port = port;
    }
    if let Some(root) = cli.dataset_root {
        config.dataset.root = root;
    }
    if let Some(level) = cli.log_level {
        config.logging.level = level;
    }

    let log_file = init_logging(&config.logging.level, config.logging.log_dir.as_deref())?;
    info!(
        "Starting zodmap v{} (log file: {})",
        env!("CARGO_PKG_VERSION"),
        log_file
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "none".to_string())
    );

    let dataset = Arc::new(FsDataset::new(&config.dataset.root, &config.dataset.frames_dir));
    info!("Dataset directory: {}", dataset.logs_dir().display());

    let logs = LogService::new(dataset, &config.cache, config.dataset.show_trajectory)?;
    let imagery: Arc<dyn GeoImageSearch> = Arc::new(GeoImageClient::new(config.imagery.clone())?);

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => {
            let state = AppState {
                config: Arc::new(config),
                logs,
                imagery,
            };
            WebServer::new(state)?.serve().await?;
        }
        Command::Collect {
            logs: log_ids,
            radius,
            output,
        } => {
            let options = CollectOptions {
                log_ids: log_ids.into_iter().map(LogId::from).collect(),
                radius_m: radius,
                output_dir: output,
            };
            let summary = Collector::new(logs, imagery).run(&options).await?;
            if !summary.failed.is_empty() {
                anyhow::bail!("{} logs failed to process", summary.failed.len());
            }
        }
        Command::Stats { output } => {
            let report = collect_stats(&logs).await?;
            write_csv(&output, &report.rows).await?;
            for (log_id, reason) in report.failed.iter().take(10) {
                info!("Failed log {}: {}", log_id, reason);
            }
        }
    }

    Ok(())
}
