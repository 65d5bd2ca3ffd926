pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod security;
pub mod services;
pub mod telemetry;

pub use config::Settings;
pub use error::{ApiError, Result};

use anyhow::Context;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;

use crate::security::JwtKeys;
use crate::services::{PgSessionAuthority, PgStore, SessionAuthority};

/// Shared application state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub settings: Arc<Settings>,
    pub authority: PgSessionAuthority,
}

impl AppState {
    /// Wire up the application state. This is the only place where
    /// dependencies are constructed.
    pub async fn initialize(settings: Settings) -> anyhow::Result<Self> {
        let db = Self::init_database(&settings).await?;

        let keys = JwtKeys::from_settings(&settings.auth);
        let authority = SessionAuthority::new(keys, PgStore::new(db.clone()));

        Ok(Self {
            db,
            settings: Arc::new(settings),
            authority,
        })
    }

    async fn init_database(settings: &Settings) -> anyhow::Result<PgPool> {
        let database = &settings.database;
        let pool = PgPoolOptions::new()
            .max_connections(database.max_connections)
            .acquire_timeout(Duration::from_secs(database.acquire_timeout))
            .connect(&database.url)
            .await
            .context("Failed to connect to Postgres")?;

        tracing::info!("Running database migrations");
        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .context("Failed to run database migrations")?;

        Ok(pool)
    }
}
