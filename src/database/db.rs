use std::sync::OnceLock;

use diesel_async::pooled_connection::deadpool::{Object, Pool};
use diesel_async::pooled_connection::AsyncDieselConnectionManager;
use diesel_async::AsyncPgConnection;

use crate::meltdown::*;

pub type PgPool = Pool<AsyncPgConnection>;
pub type PgPooledConnection = Object<AsyncPgConnection>;

static DB_POOL: OnceLock<PgPool> = OnceLock::new();

/// Connections are opened lazily, so this succeeds even while the store is unreachable.
pub fn init_connection_pool(url: &str, max_size: usize) -> Result<(), MeltDown> {
    let manager = AsyncDieselConnectionManager::<AsyncPgConnection>::new(url);
    let pool = Pool::builder(manager)
        .max_size(max_size)
        .build()
        .map_err(|e| MeltDown::db_connection(format!("Failed to create connection pool: {}", e)))?;

    DB_POOL
        .set(pool)
        .map_err(|_| MeltDown::new(MeltType::ConfigurationError, "Failed to initialize database pool: already initialized"))
}

pub async fn establish_connection() -> Result<PgPooledConnection, MeltDown> {
    let pool = DB_POOL.get().ok_or_else(|| MeltDown::db_connection("Database pool not initialized"))?;

    pool.get()
        .await
        .map_err(|e| MeltDown::db_connection(format!("Failed to get connection from pool: {}", e)).with_context("max_size", pool.status().max_size.to_string()))
}
