use chrono::Utc;
use sqlx::{Pool, Sqlite};

use crate::accountdb::{
    errors::AccountError,
    types::{AccountRow, AccountSummaryRow, AccountUpdate, ExternalRef, ExternalUser, NewAccount},
};
use crate::storage::validate_sqlite_table_schema;

use super::config::DB_TABLE_ACCOUNTS;

pub(super) async fn create_tables_sqlite(pool: &Pool<Sqlite>) -> Result<(), AccountError> {
    let table_name = DB_TABLE_ACCOUNTS.as_str();

    sqlx::query(&format!(
        r#"
        CREATE TABLE IF NOT EXISTS {table_name} (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            revision TEXT NOT NULL,
            name TEXT NOT NULL UNIQUE,
            email TEXT NOT NULL,
            salt TEXT NOT NULL,
            password_digest TEXT NOT NULL,
            ip TEXT NOT NULL,
            roles TEXT NOT NULL DEFAULT '[]',
            ext_flag BOOLEAN NOT NULL DEFAULT false,
            ext_document TEXT,
            created_at TIMESTAMP NOT NULL,
            modified_at TIMESTAMP NOT NULL
        )
        "#
    ))
    .execute(pool)
    .await
    .map_err(|e| AccountError::Storage(e.to_string()))?;

    Ok(())
}

/// Validates that the accounts table schema matches what we expect
pub(super) async fn validate_account_tables_sqlite(pool: &Pool<Sqlite>) -> Result<(), AccountError> {
    let table_name = DB_TABLE_ACCOUNTS.as_str();

    let expected_columns = vec![
        ("id", "INTEGER"),
        ("revision", "TEXT"),
        ("name", "TEXT"),
        ("email", "TEXT"),
        ("salt", "TEXT"),
        ("password_digest", "TEXT"),
        ("ip", "TEXT"),
        ("roles", "TEXT"),
        ("ext_flag", "BOOLEAN"),
        ("ext_document", "TEXT"),
        ("created_at", "TIMESTAMP"),
        ("modified_at", "TIMESTAMP"),
    ];

    validate_sqlite_table_schema(pool, table_name, &expected_columns, AccountError::Storage).await
}

pub(super) async fn get_account_sqlite(
    pool: &Pool<Sqlite>,
    name: &str,
) -> Result<Option<AccountRow>, AccountError> {
    let table_name = DB_TABLE_ACCOUNTS.as_str();

    sqlx::query_as::<_, AccountRow>(&format!(
        r#"
        SELECT id, revision, name, email, salt, password_digest, ip,
               roles, ext_flag, ext_document, created_at, modified_at
        FROM {table_name}
        WHERE name = ?
        "#
    ))
    .bind(name)
    .fetch_optional(pool)
    .await
    .map_err(|e| AccountError::Storage(e.to_string()))
}

pub(super) async fn insert_account_sqlite(
    pool: &Pool<Sqlite>,
    account: &NewAccount,
    revision: &str,
    roles: &str,
) -> Result<(), AccountError> {
    let table_name = DB_TABLE_ACCOUNTS.as_str();
    let now = Utc::now();

    sqlx::query(&format!(
        r#"
        INSERT INTO {table_name}
            (revision, name, email, salt, password_digest, ip, roles, created_at, modified_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#
    ))
    .bind(revision)
    .bind(&account.name)
    .bind(&account.email)
    .bind(&account.salt)
    .bind(&account.password_digest)
    .bind(&account.ip)
    .bind(roles)
    .bind(now) // created_at
    .bind(now) // modified_at
    .execute(pool)
    .await
    .map_err(|e| AccountError::Storage(e.to_string()))?;

    Ok(())
}

/// Conditional update; returns the number of rows whose revision still matched.
pub(super) async fn update_account_sqlite(
    pool: &Pool<Sqlite>,
    account: &AccountUpdate,
    expected_revision: &str,
    new_revision: &str,
    roles: &str,
) -> Result<u64, AccountError> {
    let table_name = DB_TABLE_ACCOUNTS.as_str();

    let result = sqlx::query(&format!(
        r#"
        UPDATE {table_name}
        SET revision = ?,
            email = ?,
            salt = ?,
            password_digest = ?,
            ip = ?,
            roles = ?,
            modified_at = ?
        WHERE name = ? AND revision = ?
        "#
    ))
    .bind(new_revision)
    .bind(&account.email)
    .bind(&account.salt)
    .bind(&account.password_digest)
    .bind(&account.ip)
    .bind(roles)
    .bind(Utc::now())
    .bind(&account.name)
    .bind(expected_revision)
    .execute(pool)
    .await
    .map_err(|e| AccountError::Storage(e.to_string()))?;

    Ok(result.rows_affected())
}

pub(super) async fn get_external_ref_sqlite(
    pool: &Pool<Sqlite>,
    name: &str,
) -> Result<Option<ExternalRef>, AccountError> {
    let table_name = DB_TABLE_ACCOUNTS.as_str();

    sqlx::query_as::<_, ExternalRef>(&format!(
        r#"
        SELECT id, ext_document FROM {table_name} WHERE name = ?
        "#
    ))
    .bind(name)
    .fetch_optional(pool)
    .await
    .map_err(|e| AccountError::Storage(e.to_string()))
}

pub(super) async fn insert_external_sqlite(
    pool: &Pool<Sqlite>,
    user: &ExternalUser,
    document: &str,
) -> Result<(), AccountError> {
    let table_name = DB_TABLE_ACCOUNTS.as_str();
    let now = Utc::now();

    // Imported rows carry no local credentials
    sqlx::query(&format!(
        r#"
        INSERT INTO {table_name}
            (ext_flag, ext_document, revision, name, email, salt, password_digest, ip,
             roles, created_at, modified_at)
        VALUES (true, ?, ?, ?, ?, '0', '0', '0', '[]', ?, ?)
        "#
    ))
    .bind(document)
    .bind(&user.revision)
    .bind(&user.name)
    .bind(user.email.as_deref().unwrap_or(""))
    .bind(now) // created_at
    .bind(now) // modified_at
    .execute(pool)
    .await
    .map_err(|e| AccountError::Storage(e.to_string()))?;

    Ok(())
}

pub(super) async fn update_external_sqlite(
    pool: &Pool<Sqlite>,
    id: i64,
    user: &ExternalUser,
    document: &str,
) -> Result<(), AccountError> {
    let table_name = DB_TABLE_ACCOUNTS.as_str();

    sqlx::query(&format!(
        r#"
        UPDATE {table_name}
        SET ext_document = ?, revision = ?, modified_at = ?
        WHERE id = ?
        "#
    ))
    .bind(document)
    .bind(&user.revision)
    .bind(Utc::now())
    .bind(id)
    .execute(pool)
    .await
    .map_err(|e| AccountError::Storage(e.to_string()))?;

    Ok(())
}

pub(super) async fn list_accounts_by_names_sqlite(
    pool: &Pool<Sqlite>,
    names: &[String],
) -> Result<Vec<AccountSummaryRow>, AccountError> {
    let table_name = DB_TABLE_ACCOUNTS.as_str();
    let placeholders = vec!["?"; names.len()].join(", ");

    let sql = format!(
        r#"
        SELECT id, name, email, ext_document
        FROM {table_name}
        WHERE name IN ({placeholders})
        "#
    );

    let mut query = sqlx::query_as::<_, AccountSummaryRow>(&sql);
    for name in names {
        query = query.bind(name);
    }

    query
        .fetch_all(pool)
        .await
        .map_err(|e| AccountError::Storage(e.to_string()))
}
