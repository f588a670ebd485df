//! Product catalog server: builds the connection manager once, injects it into the
//! store, and serves the product routes until Ctrl-C.
//!
//! Run from repo root: `cargo run -p product-catalog-server`

use product_catalog::{
    build_app, ensure_products_table, seed_products, telemetry, AppState, ConnectionManager,
    DatabaseConfig, PgProductStore, ProductGenerator,
};
use std::sync::Arc;
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    telemetry::init("product_catalog=info,product_catalog_server=info");

    let config = DatabaseConfig::from_env()?;
    let manager = Arc::new(ConnectionManager::open(config).await?);
    let version = manager.health_check().await?;
    tracing::info!(%version, "connected to database");
    ensure_products_table(&manager).await?;

    let store = Arc::new(PgProductStore::new(manager.clone()));
    let seed_count: usize = match std::env::var("SEED_PRODUCTS") {
        Ok(v) => v.trim().parse()?,
        Err(_) => 0,
    };
    if seed_count > 0 {
        let mut generator = ProductGenerator::from_entropy();
        seed_products(store.as_ref(), &mut generator, seed_count).await?;
    }

    let app = build_app(AppState::new(store));
    let bind_addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());
    let listener = TcpListener::bind(&bind_addr).await?;
    tracing::info!("listening on {}", listener.local_addr()?);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    manager.close().await;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "failed to listen for shutdown signal");
    }
}
