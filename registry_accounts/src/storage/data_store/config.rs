//! Data store selection and table naming

use std::{env, str::FromStr, sync::LazyLock};
use tokio::sync::Mutex;

use super::types::{DataStore, PostgresDataStore, SqliteDataStore};

static GENERIC_DATA_STORE_TYPE: LazyLock<String> = LazyLock::new(|| {
    env::var("GENERIC_DATA_STORE_TYPE").expect("GENERIC_DATA_STORE_TYPE must be set")
});

static GENERIC_DATA_STORE_URL: LazyLock<String> = LazyLock::new(|| {
    env::var("GENERIC_DATA_STORE_URL").expect("GENERIC_DATA_STORE_URL must be set")
});

pub(crate) static GENERIC_DATA_STORE: LazyLock<Mutex<Box<dyn DataStore>>> = LazyLock::new(|| {
    let store_type = GENERIC_DATA_STORE_TYPE.as_str();
    let store_url = GENERIC_DATA_STORE_URL.as_str();

    tracing::info!(store_type, "Initializing data store");

    Mutex::new(build_store(store_type, store_url))
});

fn build_store(store_type: &str, store_url: &str) -> Box<dyn DataStore> {
    match store_type {
        "sqlite" => {
            let opts = sqlx::sqlite::SqliteConnectOptions::from_str(store_url)
                .expect("Failed to parse SQLite connection string")
                .create_if_missing(true);

            Box::new(SqliteDataStore {
                pool: sqlx::sqlite::SqlitePool::connect_lazy_with(opts),
            })
        }
        "postgres" => Box::new(PostgresDataStore {
            pool: sqlx::PgPool::connect_lazy(store_url).expect("Failed to create Postgres pool"),
        }),
        t => panic!("Unsupported store type: {t}. Supported types are 'sqlite' and 'postgres'"),
    }
}

/// Table prefix from environment variable
pub(crate) static DB_TABLE_PREFIX: LazyLock<String> = LazyLock::new(table_prefix);

fn table_prefix() -> String {
    env::var("DB_TABLE_PREFIX").unwrap_or_else(|_| "reg_".to_string())
}
