use chrono::Utc;
use sqlx::{Pool, Postgres};

use crate::accountdb::{
    errors::AccountError,
    types::{AccountRow, AccountSummaryRow, AccountUpdate, ExternalRef, ExternalUser, NewAccount},
};
use crate::storage::validate_postgres_table_schema;

use super::config::DB_TABLE_ACCOUNTS;

pub(super) async fn create_tables_postgres(pool: &Pool<Postgres>) -> Result<(), AccountError> {
    let table_name = DB_TABLE_ACCOUNTS.as_str();

    sqlx::query(&format!(
        r#"
        CREATE TABLE IF NOT EXISTS {table_name} (
            id BIGSERIAL PRIMARY KEY,
            revision TEXT NOT NULL,
            name TEXT NOT NULL UNIQUE,
            email TEXT NOT NULL,
            salt TEXT NOT NULL,
            password_digest TEXT NOT NULL,
            ip TEXT NOT NULL,
            roles TEXT NOT NULL DEFAULT '[]',
            ext_flag BOOLEAN NOT NULL DEFAULT FALSE,
            ext_document TEXT,
            created_at TIMESTAMPTZ NOT NULL,
            modified_at TIMESTAMPTZ NOT NULL
        )
        "#
    ))
    .execute(pool)
    .await
    .map_err(|e| AccountError::Storage(e.to_string()))?;

    Ok(())
}

/// Validates that the accounts table schema matches what we expect
pub(super) async fn validate_account_tables_postgres(
    pool: &Pool<Postgres>,
) -> Result<(), AccountError> {
    let table_name = DB_TABLE_ACCOUNTS.as_str();

    let expected_columns = vec![
        ("id", "bigint"),
        ("revision", "text"),
        ("name", "text"),
        ("email", "text"),
        ("salt", "text"),
        ("password_digest", "text"),
        ("ip", "text"),
        ("roles", "text"),
        ("ext_flag", "boolean"),
        ("ext_document", "text"),
        ("created_at", "timestamp with time zone"),
        ("modified_at", "timestamp with time zone"),
    ];

    validate_postgres_table_schema(pool, table_name, &expected_columns, AccountError::Storage)
        .await
}

pub(super) async fn get_account_postgres(
    pool: &Pool<Postgres>,
    name: &str,
) -> Result<Option<AccountRow>, AccountError> {
    let table_name = DB_TABLE_ACCOUNTS.as_str();

    sqlx::query_as::<_, AccountRow>(&format!(
        r#"
        SELECT id, revision, name, email, salt, password_digest, ip,
               roles, ext_flag, ext_document, created_at, modified_at
        FROM {table_name}
        WHERE name = $1
        "#
    ))
    .bind(name)
    .fetch_optional(pool)
    .await
    .map_err(|e| AccountError::Storage(e.to_string()))
}

pub(super) async fn insert_account_postgres(
    pool: &Pool<Postgres>,
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
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $8)
        "#
    ))
    .bind(revision)
    .bind(&account.name)
    .bind(&account.email)
    .bind(&account.salt)
    .bind(&account.password_digest)
    .bind(&account.ip)
    .bind(roles)
    .bind(now)
    .execute(pool)
    .await
    .map_err(|e| AccountError::Storage(e.to_string()))?;

    Ok(())
}

/// Conditional update; returns the number of rows whose revision still matched.
pub(super) async fn update_account_postgres(
    pool: &Pool<Postgres>,
    account: &AccountUpdate,
    expected_revision: &str,
    new_revision: &str,
    roles: &str,
) -> Result<u64, AccountError> {
    let table_name = DB_TABLE_ACCOUNTS.as_str();

    let result = sqlx::query(&format!(
        r#"
        UPDATE {table_name}
        SET revision = $1,
            email = $2,
            salt = $3,
            password_digest = $4,
            ip = $5,
            roles = $6,
            modified_at = $7
        WHERE name = $8 AND revision = $9
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

pub(super) async fn get_external_ref_postgres(
    pool: &Pool<Postgres>,
    name: &str,
) -> Result<Option<ExternalRef>, AccountError> {
    let table_name = DB_TABLE_ACCOUNTS.as_str();

    sqlx::query_as::<_, ExternalRef>(&format!(
        r#"
        SELECT id, ext_document FROM {table_name} WHERE name = $1
        "#
    ))
    .bind(name)
    .fetch_optional(pool)
    .await
    .map_err(|e| AccountError::Storage(e.to_string()))
}

pub(super) async fn insert_external_postgres(
    pool: &Pool<Postgres>,
    user: &ExternalUser,
    document: &str,
) -> Result<(), AccountError> {
    let table_name = DB_TABLE_ACCOUNTS.as_str();

    // Imported rows carry no local credentials
    sqlx::query(&format!(
        r#"
        INSERT INTO {table_name}
            (ext_flag, ext_document, revision, name, email, salt, password_digest, ip,
             roles, created_at, modified_at)
        VALUES (TRUE, $1, $2, $3, $4, '0', '0', '0', '[]', $5, $5)
        "#
    ))
    .bind(document)
    .bind(&user.revision)
    .bind(&user.name)
    .bind(user.email.as_deref().unwrap_or(""))
    .bind(Utc::now())
    .execute(pool)
    .await
    .map_err(|e| AccountError::Storage(e.to_string()))?;

    Ok(())
}

pub(super) async fn update_external_postgres(
    pool: &Pool<Postgres>,
    id: i64,
    user: &ExternalUser,
    document: &str,
) -> Result<(), AccountError> {
    let table_name = DB_TABLE_ACCOUNTS.as_str();

    sqlx::query(&format!(
        r#"
        UPDATE {table_name}
        SET ext_document = $1, revision = $2, modified_at = $3
        WHERE id = $4
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

pub(super) async fn list_accounts_by_names_postgres(
    pool: &Pool<Postgres>,
    names: &[String],
) -> Result<Vec<AccountSummaryRow>, AccountError> {
    let table_name = DB_TABLE_ACCOUNTS.as_str();

    sqlx::query_as::<_, AccountSummaryRow>(&format!(
        r#"
        SELECT id, name, email, ext_document
        FROM {table_name}
        WHERE name = ANY($1)
        "#
    ))
    .bind(names)
    .fetch_all(pool)
    .await
    .map_err(|e| AccountError::Storage(e.to_string()))
}
