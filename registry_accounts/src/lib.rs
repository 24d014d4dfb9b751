//! registry_accounts - Account storage for a package registry
//!
//! Authenticates credentials, persists account records and imports user
//! documents from an upstream identity provider. Credential updates are
//! guarded by revision tokens (`<n>-<md5>`): an update only applies when the
//! stored revision is still the one the caller read.
//!
//! The backing store is selected with `GENERIC_DATA_STORE_TYPE` (`sqlite` or
//! `postgres`) and `GENERIC_DATA_STORE_URL`.

mod accountdb;
mod digest;
mod storage;

#[cfg(test)]
mod test_utils;

pub use accountdb::{
    Account, AccountError, AccountStore, AccountSummary, AccountUpdate, ExternalSave,
    ExternalUser, NewAccount, Revision, UpdateResult,
};
pub use digest::{content_hash, password_digest};
pub use storage::StorageError;

/// Connect to the data store and prepare the accounts table
pub async fn init() -> Result<(), Box<dyn std::error::Error>> {
    storage::init().await?;
    accountdb::init().await?;
    Ok(())
}
