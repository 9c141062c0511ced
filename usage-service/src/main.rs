use anyhow::Result;
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use usage_service::{
    catalog::Catalog,
    config::AppConfig,
    engine::Engine,
    http, metrics_server, observability,
    store::PgStore,
};

#[tokio::main]
async fn main() -> Result<()> {
    observability::init_tracing();

    // Load configuration
    let cfg = AppConfig::load()?;

    // Start metrics server if configured
    if let Some(metrics_cfg) = &cfg.metrics {
        metrics_server::init(&metrics_cfg.bind_addr)?;
    }

    let pool = PgPoolOptions::new()
        .max_connections(cfg.database.max_connections)
        .connect(&cfg.database.uri)
        .await?;

    // Catalog is loaded once here and injected; nothing else re-reads it.
    let catalog = Catalog::new(&cfg.catalog);

    let engine = Arc::new(Engine::new(
        PgStore::new(pool),
        catalog,
        &cfg.anomaly,
        cfg.forecast.clone(),
        &cfg.dashboard,
    ));

    let app = http::router(engine);

    let listener = tokio::net::TcpListener::bind(&cfg.http.bind_addr).await?;
    tracing::info!(addr = %cfg.http.bind_addr, "usage service listening");
    axum::serve(listener, app.into_make_service()).await?;

    Ok(())
}
