//! # Daylog Server
//!
//! The main entry point for the Actix-web HTTP server.

use actix_web::HttpServer;

use daylog_server::build_app;
use daylog_server::config::AppConfig;
use daylog_server::state::AppState;
use daylog_server::telemetry::{TelemetryConfig, init_telemetry};

#[cfg(feature = "scheduler")]
use daylog_server::background::{Housekeeping, SchedulerConfig};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    init_telemetry(&TelemetryConfig::from_env());

    let config = AppConfig::from_env()?;

    tracing::info!("Starting daylog on {}:{}", config.host, config.port);

    let state = AppState::build(&config).await?;

    #[cfg(feature = "scheduler")]
    let housekeeping = Housekeeping::start(
        &SchedulerConfig {
            enabled: config.scheduler_enabled,
        },
        &state,
    )
    .await?;

    HttpServer::new(move || build_app(state.clone()))
        .bind((config.host.as_str(), config.port))?
        .run()
        .await?;

    #[cfg(feature = "scheduler")]
    if let Some(housekeeping) = housekeeping {
        housekeeping.shutdown().await?;
    }

    Ok(())
}
