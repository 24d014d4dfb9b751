use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sqlx::FromRow;

use super::codec::{decode_document, decode_roles};

/// A registered account as returned by lookups
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Account {
    /// Storage-assigned row id
    pub id: i64,
    /// Revision token `<n>-<hash>` used for optimistic locking
    pub revision: String,
    /// Unique login name
    pub name: String,
    pub email: String,
    pub salt: String,
    /// Hex SHA-1 of password + salt
    pub password_digest: String,
    /// Last known originating address
    pub ip: String,
    pub roles: Vec<String>,
    /// Set on rows imported from the identity provider
    pub ext_flag: bool,
    /// Identity-provider profile, if any
    pub ext_document: Option<Value>,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
}

/// Raw account row; `roles` and `ext_document` are still JSON text
#[derive(Debug, Clone, FromRow)]
pub(crate) struct AccountRow {
    pub(crate) id: i64,
    pub(crate) revision: String,
    pub(crate) name: String,
    pub(crate) email: String,
    pub(crate) salt: String,
    pub(crate) password_digest: String,
    pub(crate) ip: String,
    pub(crate) roles: Option<String>,
    pub(crate) ext_flag: bool,
    pub(crate) ext_document: Option<String>,
    pub(crate) created_at: DateTime<Utc>,
    pub(crate) modified_at: DateTime<Utc>,
}

impl From<AccountRow> for Account {
    fn from(row: AccountRow) -> Self {
        Self {
            roles: decode_roles(row.roles.as_deref()),
            ext_document: decode_document(row.ext_document.as_deref()),
            id: row.id,
            revision: row.revision,
            name: row.name,
            email: row.email,
            salt: row.salt,
            password_digest: row.password_digest,
            ip: row.ip,
            ext_flag: row.ext_flag,
            created_at: row.created_at,
            modified_at: row.modified_at,
        }
    }
}

/// Credentials for a new account
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewAccount {
    pub name: String,
    pub email: String,
    pub salt: String,
    pub password_digest: String,
    pub ip: String,
    #[serde(default)]
    pub roles: Vec<String>,
}

/// Changes to an existing account, guarded by the revision the caller last saw
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AccountUpdate {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revision: Option<String>,
    /// Older clients send the revision as `_rev`
    #[serde(rename = "_rev", default, skip_serializing_if = "Option::is_none")]
    pub legacy_revision: Option<String>,
    pub email: String,
    pub salt: String,
    pub password_digest: String,
    pub ip: String,
    #[serde(default)]
    pub roles: Vec<String>,
}

impl AccountUpdate {
    /// Revision the update is conditioned on: `revision`, then `_rev`, else empty
    pub fn expected_revision(&self) -> &str {
        [&self.revision, &self.legacy_revision]
            .into_iter()
            .flatten()
            .map(String::as_str)
            .find(|rev| !rev.is_empty())
            .unwrap_or("")
    }
}

/// Outcome of a revision-checked update
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateResult {
    /// Revision written if the update matched
    pub revision: String,
    /// Zero means the stored revision no longer matched
    pub rows_affected: u64,
}

impl UpdateResult {
    pub fn is_conflict(&self) -> bool {
        self.rows_affected == 0
    }
}

/// User document published by the upstream identity provider
///
/// Fields other than `name`, `email` and `_rev` are kept verbatim.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExternalUser {
    pub name: String,
    /// Absent or null in some upstream documents
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(rename = "_rev")]
    pub revision: String,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

/// What `save_external` did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExternalSave {
    Inserted,
    Updated { id: i64 },
}

/// Minimal projection used to find an imported row
#[derive(Debug, Clone, FromRow)]
pub(crate) struct ExternalRef {
    pub(crate) id: i64,
    pub(crate) ext_document: Option<String>,
}

/// Projection returned by `list_by_names`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AccountSummary {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub ext_document: Option<Value>,
}

#[derive(Debug, Clone, FromRow)]
pub(crate) struct AccountSummaryRow {
    pub(crate) id: i64,
    pub(crate) name: String,
    pub(crate) email: String,
    pub(crate) ext_document: Option<String>,
}

impl From<AccountSummaryRow> for AccountSummary {
    fn from(row: AccountSummaryRow) -> Self {
        Self {
            ext_document: decode_document(row.ext_document.as_deref()),
            id: row.id,
            name: row.name,
            email: row.email,
        }
    }
}
