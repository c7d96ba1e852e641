//! Atelier Commerce - service entry point.

use anyhow::Result;
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use atelier_commerce::catalog::CatalogStore;
use atelier_commerce::ledger::PurchaseLedger;
use atelier_commerce::reviews::ReviewGate;
use atelier_commerce::routes::{self, AppState};
use atelier_commerce::stats::SalesStats;
use atelier_commerce::storage::LocalBlobStore;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let db = PgPoolOptions::new()
        .max_connections(10)
        .connect(&std::env::var("DATABASE_URL")?)
        .await?;
    sqlx::migrate!("./migrations").run(&db).await?;

    let blobs = LocalBlobStore::new(std::env::var("BLOB_ROOT").unwrap_or_else(|_| "storage".into()));
    let ledger = PurchaseLedger::new(db.clone());
    let state = AppState {
        catalog: CatalogStore::new(db.clone()),
        reviews: ReviewGate::new(db.clone(), ledger, blobs),
        stats: SalesStats::new(db),
    };

    let app = routes::router(state);
    let port = std::env::var("PORT").unwrap_or_else(|_| "8083".to_string());
    tracing::info!("atelier-commerce listening on 0.0.0.0:{}", port);
    axum::serve(tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port)).await?, app).await?;
    Ok(())
}
