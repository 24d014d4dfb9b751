mod data_store;
mod errors;
mod schema_validation;

pub use errors::StorageError;

pub(crate) use data_store::{DB_TABLE_PREFIX, GENERIC_DATA_STORE};
pub(crate) use schema_validation::{validate_postgres_table_schema, validate_sqlite_table_schema};

/// Open the configured data store and make sure it answers queries.
pub async fn init() -> Result<(), StorageError> {
    let store = GENERIC_DATA_STORE.lock().await;

    if let Some(pool) = store.as_sqlite() {
        sqlx::query("SELECT 1").execute(pool).await?;
    } else if let Some(pool) = store.as_postgres() {
        sqlx::query("SELECT 1").execute(pool).await?;
    } else {
        return Err(StorageError::UnsupportedStore);
    }

    tracing::info!(backend = store.kind(), "Data store is reachable");
    Ok(())
}
