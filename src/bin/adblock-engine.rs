//! Filter engine process.
//!
//! One instance per user serves every host process over the user-scoped
//! pipe endpoint and exits on its own once no client has been connected
//! for the idle grace period.
//!
//! Exit codes: 0 normal or idle shutdown, 2 another instance is already
//! running, 3 endpoint creation failed, 4 filter backend failed to
//! initialize, 5 the serve loop failed.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use adblock_ipc::engine::{AdblockBackend, EngineServer};
use adblock_ipc::transport::endpoint_path;
use adblock_ipc::Error;

// ============================================================================
// Exit Codes
// ============================================================================

const EXIT_ALREADY_RUNNING: u8 = 2;
const EXIT_TRANSPORT: u8 = 3;
const EXIT_BACKEND: u8 = 4;
const EXIT_SERVE: u8 = 5;

// ============================================================================
// Configuration
// ============================================================================

/// Seconds with zero connections before the engine exits.
const DEFAULT_IDLE_SHUTDOWN_SECS: u64 = 60;

struct Config {
    endpoint: PathBuf,
    data_dir: PathBuf,
    filters_dir: PathBuf,
    idle_shutdown: Option<Duration>,
}

impl Config {
    fn from_args(mut args: std::env::Args) -> Result<Self, String> {
        let data_dir = default_data_dir();
        let mut config = Self {
            endpoint: endpoint_path(),
            filters_dir: data_dir.join("filters"),
            data_dir,
            idle_shutdown: Some(Duration::from_secs(DEFAULT_IDLE_SHUTDOWN_SECS)),
        };

        args.next(); // program name
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--endpoint" => config.endpoint = required(&arg, args.next())?.into(),
                "--data-dir" => config.data_dir = required(&arg, args.next())?.into(),
                "--filters-dir" => config.filters_dir = required(&arg, args.next())?.into(),
                "--idle-shutdown-secs" => {
                    let secs: u64 = required(&arg, args.next())?
                        .parse()
                        .map_err(|e| format!("invalid --idle-shutdown-secs: {e}"))?;
                    config.idle_shutdown = (secs > 0).then(|| Duration::from_secs(secs));
                }
                "--help" | "-h" => {
                    return Err("usage: adblock-engine [--endpoint PATH] [--data-dir PATH] \
                         [--filters-dir PATH] [--idle-shutdown-secs N (0 disables)]"
                        .to_string());
                }
                other => return Err(format!("unknown argument: {other}")),
            }
        }
        Ok(config)
    }
}

fn required(flag: &str, value: Option<String>) -> Result<String, String> {
    value.ok_or_else(|| format!("{flag} requires a value"))
}

fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("adblock-engine")
}

// ============================================================================
// Entry Point
// ============================================================================

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = match Config::from_args(std::env::args()) {
        Ok(config) => config,
        Err(message) => {
            eprintln!("{message}");
            return ExitCode::FAILURE;
        }
    };

    let backend = match AdblockBackend::new(&config.data_dir, &config.filters_dir) {
        Ok(backend) => Arc::new(backend),
        Err(e) => {
            error!(error = %e, "Filter backend initialization failed");
            return ExitCode::from(EXIT_BACKEND);
        }
    };

    let server = match EngineServer::bind_at(&config.endpoint, backend, config.idle_shutdown).await
    {
        Ok(server) => server,
        Err(Error::AlreadyRunning { endpoint }) => {
            info!(endpoint = %endpoint.display(), "Engine already running");
            return ExitCode::from(EXIT_ALREADY_RUNNING);
        }
        Err(e) => {
            error!(error = %e, "Endpoint creation failed");
            return ExitCode::from(EXIT_TRANSPORT);
        }
    };

    match server.run().await {
        Ok(()) => {
            info!("Engine exited");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(error = %e, "Serve loop failed");
            ExitCode::from(EXIT_SERVE)
        }
    }
}
