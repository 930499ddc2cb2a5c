//! Migration binary - applies the content table constraints
//!
//! Usage:
//!   cargo run --bin migrate
//!
//! Required environment variables:
//! - DATABASE_URL (direct Postgres connection string of the store)
//!
//! Run `content-audit` first: the unique constraint cannot be added while
//! duplicate rows exist.

use anyhow::{Context, Result};
use sqlx::postgres::PgPoolOptions;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("migrate=info".parse()?),
        )
        .init();

    let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL not set")?;

    info!("Connecting to database...");
    let pool = PgPoolOptions::new()
        .max_connections(1)
        .connect(&database_url)
        .await
        .context("Failed to connect to database")?;

    info!("Running migrations...");
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Failed to run migrations")?;

    info!("✓ Migrations applied");
    Ok(())
}
