//! Travel Backend Service
//!
//! Main entry point for the travel booking backend.
//! This service provides:
//! - HTTP/JSON API for listings, bookings, reviews and payments
//! - Chapa checkout, verification and webhook handling
//! - Background worker for email notifications

use actix_web::middleware::Logger;
use actix_web::{web, App, HttpServer};
use anyhow::Context;
use std::sync::Arc;
use tracing::{error, info, warn};
use travel_backend::config::AppConfig;
use travel_backend::database::{create_pool, run_migrations};
use travel_backend::gateway::ChapaClient;
use travel_backend::services::{mailer_from_config, NotificationWorker, Notifier};
use travel_backend::{api, AppState};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables first
    dotenv::dotenv().ok();

    // Load configuration
    let config = AppConfig::from_env().map_err(|e| {
        eprintln!("Configuration error: {}", e);
        anyhow::anyhow!("Configuration error: {}", e)
    })?;

    // Initialize tracing/logging with config
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!("travel_backend={},sqlx=warn,actix_web=info", config.log_level).into()
    });

    // JSON lines in production
    if config.is_production() {
        tracing_subscriber::fmt().json().with_env_filter(env_filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }

    info!("╔══════════════════════════════════════════════════════════╗");
    info!("║           Travel Backend Service Starting                 ║");
    info!("╚══════════════════════════════════════════════════════════╝");
    info!("Environment: {}", config.environment);
    info!("Log level: {}", config.log_level);
    info!("HTTP address: {}", config.http_addr());

    // =========================================================================
    // DATABASE SETUP
    // =========================================================================
    info!("Connecting to database...");

    let pool = create_pool(&config.database)
        .await
        .context("Failed to create database pool")?;

    info!("Database connection pool created successfully");
    info!("Max connections: {}", config.database.max_connections);

    info!("Running database migrations...");
    run_migrations(&pool, None)
        .await
        .context("Database migration failed")?;

    info!("Database migrations completed successfully");

    // =========================================================================
    // CORE SERVICES INITIALIZATION
    // =========================================================================
    info!("Initializing core services...");

    let chapa_client = ChapaClient::with_config(&config.chapa).context("Failed to build Chapa client")?;
    info!("✓ Chapa client initialized ({})", chapa_client.base_url());

    let mailer = mailer_from_config(&config.mail).context("Failed to build mailer")?;
    match &config.mail.relay_url {
        Some(url) => info!("✓ Mail relay configured ({})", url),
        None => warn!("MAIL_RELAY_URL not configured - emails will only be logged"),
    }

    let (notifier, receiver) = Notifier::channel();

    let app_state = web::Data::new(AppState::new(
        pool.clone(),
        Arc::new(chapa_client),
        notifier,
        &config.chapa,
    ));
    info!("✓ Application state initialized with repositories");

    // =========================================================================
    // BACKGROUND TASKS
    // =========================================================================
    let worker = NotificationWorker::new(receiver, mailer, config.mail.from_address.clone());
    let worker_handle = tokio::spawn(async move {
        worker.start().await;
    });
    info!("✓ Notification worker started (from {})", config.mail.from_address);

    // =========================================================================
    // START SERVER
    // =========================================================================
    let http_addr = config.http_addr();
    info!("Starting HTTP server on {}...", http_addr);

    let server = HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .app_data(app_state.clone())
            .configure(api::configure)
    })
    .bind(&http_addr)
    .with_context(|| format!("Failed to bind HTTP server to {}", http_addr))?
    .run();

    // =========================================================================
    // READY
    // =========================================================================
    info!("╔══════════════════════════════════════════════════════════╗");
    info!("║           Travel Backend Service Ready!                   ║");
    info!("╠══════════════════════════════════════════════════════════╣");
    info!("║  HTTP API:     {}                              ║", http_addr);
    info!("║  Environment:  {}                                    ║", config.environment);
    info!("╚══════════════════════════════════════════════════════════╝");
    info!("Press Ctrl+C to shutdown gracefully");

    // =========================================================================
    // SHUTDOWN HANDLING
    // =========================================================================
    // actix-web installs its own signal handlers and drains connections on Ctrl+C
    tokio::select! {
        result = server => {
            if let Err(e) = result {
                error!("HTTP server error: {}", e);
            }
            info!("Shutdown signal received, shutting down gracefully...");
        }
        _ = worker_handle => {
            error!("Notification worker exited unexpectedly");
        }
    }

    pool.close().await;
    info!("Travel backend service shutdown complete");
    Ok(())
}
