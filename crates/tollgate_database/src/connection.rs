//! Connection pool and migrations.

use diesel::pg::PgConnection;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};
use tollgate_error::{StoreError, StoreErrorKind, StoreResult};

/// Pooled PostgreSQL connections.
pub type PgPool = Pool<ConnectionManager<PgConnection>>;

const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Read the connection string from `DATABASE_URL`.
///
/// # Errors
///
/// Returns an error if `DATABASE_URL` is not set.
pub fn database_url_from_env() -> StoreResult<String> {
    std::env::var("DATABASE_URL").map_err(|_| {
        StoreError::new(StoreErrorKind::Connection(
            "DATABASE_URL environment variable not set".to_string(),
        ))
    })
}

/// Build a connection pool.
///
/// r2d2 opens the initial connections eagerly, so an unreachable database
/// fails here rather than on first use.
///
/// # Errors
///
/// Returns an error if the pool cannot be built or no connection can be made.
pub fn establish_pool(database_url: &str, max_size: u32) -> StoreResult<PgPool> {
    let manager = ConnectionManager::<PgConnection>::new(database_url);
    let pool = Pool::builder()
        .max_size(max_size)
        .build(manager)
        .map_err(|e| {
            StoreError::new(StoreErrorKind::Connection(format!(
                "Failed to create connection pool: {}",
                e
            )))
        })?;
    tracing::debug!(max_size, "Created credit store connection pool");
    Ok(pool)
}

/// Apply any pending schema migrations.
pub fn run_migrations(conn: &mut PgConnection) -> StoreResult<()> {
    let applied = conn
        .run_pending_migrations(MIGRATIONS)
        .map_err(|e| StoreError::new(StoreErrorKind::Query(format!("Migration failed: {}", e))))?;
    if !applied.is_empty() {
        tracing::info!(count = applied.len(), "Applied credit store migrations");
    }
    Ok(())
}
