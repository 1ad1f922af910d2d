use actix_web::{web, App, HttpServer};
use std::sync::Arc;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod config;
mod domain;
mod http;
mod importer;
mod metrics;
mod storage;
mod utils;

use config::Config;
use domain::access::{AccessRegistry, CredentialRepository};
use domain::guest::{GuestDirectory, GuestRepository};
use storage::{MemoryStore, PostgresStore};

/// Both storage ports served by one backend
fn storage_ports<S>(store: Arc<S>) -> (Arc<dyn GuestRepository>, Arc<dyn CredentialRepository>)
where
    S: GuestRepository + CredentialRepository + 'static,
{
    let guests: Arc<dyn GuestRepository> = store.clone();
    let credentials: Arc<dyn CredentialRepository> = store;
    (guests, credentials)
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    // Default to INFO level, can be overridden with RUST_LOG env var
    // Example: RUST_LOG=debug cargo run
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_thread_ids(true))
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,guestlist=debug"))
        )
        .init();

    tracing::info!("💍 Starting guest list service");

    // === 1. Configuration ===
    let config = Config::load()?;
    tracing::info!(
        app_env = %config.server.app_env,
        host = %config.server.host,
        port = config.server.port,
        "Configuration loaded"
    );

    // === 2. Storage ===
    let (guests, credentials) = match config.database.url.as_deref() {
        Some(url) => {
            let store = PostgresStore::connect(&config.database, url).await?;
            if config.database.run_migrations {
                store.run_migrations().await?;
            }
            storage_ports(Arc::new(store))
        }
        None => {
            tracing::warn!("⚠️  No database.url configured, using the in-memory store (data is lost on exit)");
            storage_ports(Arc::new(MemoryStore::new()))
        }
    };

    // === 3. Domain services ===
    let registry = Arc::new(AccessRegistry::new(credentials, guests.clone()));
    let directory = Arc::new(GuestDirectory::new(guests, registry.clone()));

    // === 4. Owner credentials (groom, then bride) ===
    registry
        .seed_bootstrap(&config.bootstrap.groom_code, &config.bootstrap.bride_code)
        .await;

    // === 5. Metrics ===
    let metrics = Arc::new(metrics::Metrics::new()?);
    tracing::info!("📊 Metrics registry created with {} metrics", metrics.registry().gather().len());

    // === 6. HTTP ===
    let state = web::Data::new(http::AppState {
        directory,
        registry,
        metrics: metrics.clone(),
        require_family_group: config.import.require_family_group,
    });
    let metrics_data = web::Data::new(metrics);
    let expose_roster = !config.is_production();
    let cors_origin = config.server.cors_origin.clone();

    if !expose_roster {
        tracing::info!("Production mode: access code roster route disabled");
    }

    let (host, port) = config.bind_addr();
    tracing::info!("🌐 Listening on http://{}:{}", host, port);

    // actix-web handles SIGINT/SIGTERM with a graceful shutdown
    HttpServer::new(move || {
        App::new()
            .wrap(http::cors_headers(&cors_origin))
            .app_data(state.clone())
            .app_data(metrics_data.clone())
            .configure(|cfg| http::routes(cfg, expose_roster))
            .default_service(web::to(http::not_found))
    })
    .bind((host, port))?
    .run()
    .await?;

    tracing::info!("👋 Server stopped");
    Ok(())
}
