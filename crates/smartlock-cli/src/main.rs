//! Smart lock service.
//!
//! Reads the JSON config, opens the reed switches and the servo (falling
//! back to dry-run behavior where hardware is missing), starts the lock
//! controller, and serves the HTTP API until SIGINT or SIGTERM.
//!
//! ## Environment Variables
//! - `SMARTLOCK_CONFIG`: config file path (default: `config.json`)
//! - `SMARTLOCK_HOST`, `SMARTLOCK_PORT`: listen address overrides
//! - `SMARTLOCK_LOG_LEVEL`: log level override
//! - `RUST_LOG`: full `tracing` filter; takes precedence over everything

mod api;
mod backend;
mod config;

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use smartlock_controller::LockController;
use tracing::level_filters::LevelFilter;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use config::{Config, DEFAULT_CONFIG_PATH, Overrides};

#[derive(Parser, Debug)]
#[command(name = "smartlock")]
#[command(version, about = "Servo door-lock controller with an HTTP API", long_about = None)]
struct Args {
    /// JSON config file
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH, env = "SMARTLOCK_CONFIG")]
    config: PathBuf,

    /// Host to bind to (overrides web.host)
    #[arg(short = 'H', long, env = "SMARTLOCK_HOST")]
    host: Option<String>,

    /// Port to listen on (overrides web.port)
    #[arg(short, long, env = "SMARTLOCK_PORT")]
    port: Option<u16>,

    /// Log level (overrides logging.level)
    #[arg(long, env = "SMARTLOCK_LOG_LEVEL")]
    log_level: Option<String>,

    /// Simulate the servo and disable sensors
    #[arg(long, default_value_t = false)]
    dry_run: bool,

    /// Servo signal pin (overrides servo.pin)
    #[arg(long)]
    pin: Option<u32>,

    /// Minimum pulse width in seconds (overrides servo.min_pulse_width)
    #[arg(long)]
    min_pulse_width: Option<f64>,

    /// Maximum pulse width in seconds (overrides servo.max_pulse_width)
    #[arg(long)]
    max_pulse_width: Option<f64>,

    /// Drive time per stroke in seconds (overrides servo.rotation_time_seconds)
    #[arg(long)]
    rotation_time: Option<f64>,

    /// Return drive time as a fraction of the rotation time
    #[arg(long)]
    return_time_ratio: Option<f32>,
}

impl Args {
    fn overrides(&self) -> Overrides {
        Overrides {
            host: self.host.clone(),
            port: self.port,
            log_level: self.log_level.clone(),
            dry_run: self.dry_run,
            pin: self.pin,
            min_pulse_width: self.min_pulse_width,
            max_pulse_width: self.max_pulse_width,
            rotation_time: self.rotation_time,
            return_time_ratio: self.return_time_ratio,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut config = Config::load(&args.config)
        .with_context(|| format!("failed to load config {}", args.config.display()))?;
    config.apply_overrides(args.overrides());

    init_tracing(config.logging.level.as_deref());
    config.validate().context("invalid configuration")?;

    info!(
        "Starting smartlock {} (config {}, dry_run={})",
        smartlock_core::VERSION,
        args.config.display(),
        config.dry_run
    );

    let lock_sensor = backend::open_sensor(config.lock_sensor_config(), config.dry_run).await;
    let door_sensor = backend::open_sensor(config.door_sensor_config(), config.dry_run).await;
    let actuator =
        backend::open_actuator(config.servo_config()?, config.pwm_config(), config.dry_run).await?;

    let controller = LockController::new(
        lock_sensor,
        door_sensor,
        actuator,
        config.controller_config()?,
    );
    let tasks = controller.start();

    let app = api::create_router(controller.clone());
    let listener = tokio::net::TcpListener::bind((config.web.host.as_str(), config.web.port))
        .await
        .with_context(|| format!("failed to bind {}:{}", config.web.host, config.web.port))?;

    info!("Listening on http://{}", listener.local_addr()?);
    info!("Endpoints:");
    info!("  GET  /api/status");
    info!("  POST /api/lock | /api/unlock | /api/toggle");
    info!("  POST /api/autolock {{\"seconds\": n}}");
    info!("  GET  /health");

    let served = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await;

    tasks.shutdown().await?;
    if let Err(e) = controller.release_actuator().await {
        warn!("Failed to release servo: {}", e);
    }

    served.context("HTTP server failed")?;
    info!("Shutdown complete");
    Ok(())
}

/// `RUST_LOG` wins; otherwise the configured level, otherwise `info`.
fn init_tracing(level: Option<&str>) {
    let mut invalid = None;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = level.unwrap_or("info");
        let parsed = level.parse::<LevelFilter>().unwrap_or_else(|_| {
            invalid = Some(level.to_string());
            LevelFilter::INFO
        });
        EnvFilter::default().add_directive(parsed.into())
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    if let Some(level) = invalid {
        warn!("Unknown log level '{}'; defaulting to info", level);
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received SIGINT; shutting down"),
        _ = terminate => info!("Received SIGTERM; shutting down"),
    }
}
