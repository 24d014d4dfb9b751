//! Shared test initialization
//!
//! Loads `.env_test` once per test binary, falling back to a SQLite file in
//! the temp directory, removes any database left by a previous run and makes
//! sure the accounts table exists.

use std::sync::Once;

/// Prepare environment and database for tests that touch the store
pub async fn init_test_environment() {
    static ENV_INIT: Once = Once::new();
    ENV_INIT.call_once(|| {
        if dotenvy::from_filename(".env_test").is_err() {
            dotenvy::dotenv().ok();
        }

        if std::env::var("GENERIC_DATA_STORE_TYPE").is_err() {
            let db_path = std::env::temp_dir().join("registry_accounts_test.db");
            unsafe {
                std::env::set_var("GENERIC_DATA_STORE_TYPE", "sqlite");
                std::env::set_var(
                    "GENERIC_DATA_STORE_URL",
                    format!("sqlite:{}", db_path.display()),
                );
            }
        }

        if let Some(db_path) = extract_sqlite_file_path() {
            // WAL mode leaves sidecar files next to the database
            for suffix in ["", "-wal", "-shm"] {
                let _ = std::fs::remove_file(format!("{db_path}{suffix}"));
            }
        }
    });

    if let Err(e) = crate::storage::init().await {
        eprintln!("Warning: Failed to reach data store: {e}");
    }
    if let Err(e) = crate::accountdb::init().await {
        eprintln!("Warning: Failed to initialize AccountStore: {e}");
    }
}

/// SQLite file path from a database URL, `None` for in-memory or non-SQLite URLs
fn extract_sqlite_file_path_from_url(url: &str) -> Option<String> {
    let path = url.strip_prefix("sqlite:")?;

    let path = match path.strip_prefix("file:") {
        Some(file_path) => file_path.split('?').next()?,
        None => path.strip_prefix("//").unwrap_or(path),
    };

    if path.is_empty() || path.contains(":memory:") {
        return None;
    }
    Some(path.to_string())
}

fn extract_sqlite_file_path() -> Option<String> {
    std::env::var("GENERIC_DATA_STORE_URL")
        .ok()
        .and_then(|url| extract_sqlite_file_path_from_url(&url))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_sqlite_file_path_from_url() {
        assert_eq!(
            extract_sqlite_file_path_from_url("sqlite:/tmp/test.db"),
            Some("/tmp/test.db".to_string())
        );
        assert_eq!(
            extract_sqlite_file_path_from_url("sqlite:./test.db"),
            Some("./test.db".to_string())
        );
        assert_eq!(
            extract_sqlite_file_path_from_url("sqlite:file:/tmp/test.db?mode=rwc"),
            Some("/tmp/test.db".to_string())
        );
        assert_eq!(
            extract_sqlite_file_path_from_url("sqlite:///tmp/test.db"),
            Some("/tmp/test.db".to_string())
        );
        assert_eq!(extract_sqlite_file_path_from_url("sqlite::memory:"), None);
        assert_eq!(
            extract_sqlite_file_path_from_url("postgresql://localhost/test"),
            None
        );
        assert_eq!(extract_sqlite_file_path_from_url(""), None);
    }
}
