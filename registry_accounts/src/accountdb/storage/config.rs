use std::{env, sync::LazyLock};

use crate::storage::DB_TABLE_PREFIX;

/// Accounts table name
pub(crate) static DB_TABLE_ACCOUNTS: LazyLock<String> = LazyLock::new(|| {
    env::var("DB_TABLE_ACCOUNTS").unwrap_or_else(|_| format!("{}{}", *DB_TABLE_PREFIX, "users"))
});
