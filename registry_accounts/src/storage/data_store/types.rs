use sqlx::{Pool, Postgres, Sqlite};

#[derive(Clone, Debug)]
pub(crate) struct SqliteDataStore {
    pub(super) pool: sqlx::SqlitePool,
}

#[derive(Clone, Debug)]
pub(crate) struct PostgresDataStore {
    pub(super) pool: sqlx::PgPool,
}

/// Backend handle the account queries are executed against.
pub trait DataStore: Send + Sync {
    /// Backend name for logs
    fn kind(&self) -> &'static str;
    fn as_sqlite(&self) -> Option<&Pool<Sqlite>>;
    fn as_postgres(&self) -> Option<&Pool<Postgres>>;
}

impl DataStore for SqliteDataStore {
    fn kind(&self) -> &'static str {
        "sqlite"
    }

    fn as_sqlite(&self) -> Option<&Pool<Sqlite>> {
        Some(&self.pool)
    }

    fn as_postgres(&self) -> Option<&Pool<Postgres>> {
        None
    }
}

impl DataStore for PostgresDataStore {
    fn kind(&self) -> &'static str {
        "postgres"
    }

    fn as_sqlite(&self) -> Option<&Pool<Sqlite>> {
        None
    }

    fn as_postgres(&self) -> Option<&Pool<Postgres>> {
        Some(&self.pool)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_sqlite_store_exposes_only_sqlite_pool() {
        let store: Box<dyn DataStore> = Box::new(SqliteDataStore {
            pool: sqlx::sqlite::SqlitePool::connect_lazy("sqlite::memory:")
                .expect("Failed to create lazy pool"),
        });

        assert_eq!(store.kind(), "sqlite");
        assert!(store.as_sqlite().is_some());
        assert!(store.as_postgres().is_none());
    }
}
