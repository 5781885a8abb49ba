//! Fleetcfg daemon CLI

use anyhow::Result;
use clap::{Parser, Subcommand};
use fleetcfgd::{catalog_table, Daemon, DaemonConfig, DEFAULT_HOME_DIR, FLEETCFGD_HOME_ENV};
use std::path::{Path, PathBuf};
use tracing::{info, Level};
use tracing_subscriber::EnvFilter;

/// Fleetcfg Daemon
#[derive(Parser)]
#[command(name = "fleetcfgd")]
#[command(author = "Fleetcfg Contributors")]
#[command(version)]
#[command(about = "Configuration distribution daemon", long_about = None)]
#[command(propagate_version = true)]
#[command(arg_required_else_help = true)]
struct Cli {
    /// Directory for config and data
    #[arg(long, global = true, default_value_os_t = default_home_dir())]
    home: PathBuf,

    /// The logging level (trace|debug|info|warn|error)
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// The logging format (json|plain)
    #[arg(long, global = true, default_value = "plain")]
    log_format: String,

    /// Disable colored logs
    #[arg(long, global = true, default_value = "false")]
    log_no_color: bool,

    /// Print out full error chain on errors
    #[arg(long, global = true, default_value = "false")]
    trace: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default configuration file
    Init {
        /// Overwrite existing configuration
        #[arg(long, default_value = "false")]
        overwrite: bool,
    },

    /// Register the metric catalog and serve it until Ctrl+C
    Start {
        /// Path to configuration file (overrides --home)
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Print every exported series
    Catalog,
}

/// Returns the default home directory for fleetcfgd.
///
/// Resolution order:
/// 1. `FLEETCFGD_HOME` environment variable (if set)
/// 2. `~/.fleetcfgd` (default)
fn default_home_dir() -> PathBuf {
    if let Ok(home) = std::env::var(FLEETCFGD_HOME_ENV) {
        return PathBuf::from(home);
    }

    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(DEFAULT_HOME_DIR)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_tracing(&cli.log_level, &cli.log_format, cli.log_no_color);

    let result = match cli.command {
        Commands::Init { overwrite } => cmd_init(&cli.home, overwrite),

        Commands::Start { config } => {
            let config_path = config.unwrap_or_else(|| DaemonConfig::config_path(&cli.home));
            cmd_start(&config_path).await
        }

        Commands::Catalog => {
            print!("{}", catalog_table(fleetcfg_metrics::SERIES));
            Ok(())
        }
    };

    if let Err(e) = &result {
        if cli.trace {
            eprintln!("Error: {:?}", e);
        } else {
            eprintln!("Error: {}", e);
        }
        std::process::exit(1);
    }

    Ok(())
}

fn init_tracing(log_level: &str, log_format: &str, no_color: bool) {
    let level = match log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.to_string()));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .with_ansi(!no_color);

    match log_format {
        "json" => subscriber.json().init(),
        _ => subscriber.init(),
    }
}

fn cmd_init(home: &Path, overwrite: bool) -> Result<()> {
    let path = DaemonConfig::config_path(home);

    if path.exists() && !overwrite {
        anyhow::bail!(
            "Configuration already exists at {}. Use --overwrite to replace.",
            path.display()
        );
    }

    DaemonConfig::default().save(&path)?;
    info!("Wrote configuration to {}", path.display());
    Ok(())
}

async fn cmd_start(config_path: &Path) -> Result<()> {
    let config = DaemonConfig::load(config_path)?;
    info!(
        config = %config_path.display(),
        metrics_addr = %config.metrics.listen_addr,
        "Starting fleetcfgd"
    );

    let daemon = Daemon::bootstrap(config)?;
    daemon
        .run(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!("Failed to listen for Ctrl+C: {}", e);
            }
        })
        .await
}
