use crate::accountdb::{
    codec::encode_roles,
    errors::AccountError,
    revision::Revision,
    types::{
        Account, AccountSummary, AccountUpdate, ExternalRef, ExternalSave, ExternalUser,
        NewAccount, UpdateResult,
    },
};
use crate::digest::password_digest;
use crate::storage::GENERIC_DATA_STORE;
use subtle::ConstantTimeEq;

use super::postgres::*;
use super::sqlite::*;

/// Account records backed by the configured data store
pub struct AccountStore;

impl AccountStore {
    /// Create the accounts table if needed and check its layout
    pub async fn init() -> Result<(), AccountError> {
        let store = GENERIC_DATA_STORE.lock().await;

        match (store.as_sqlite(), store.as_postgres()) {
            (Some(pool), _) => {
                create_tables_sqlite(pool).await?;
                validate_account_tables_sqlite(pool).await?;
                Ok(())
            }
            (_, Some(pool)) => {
                create_tables_postgres(pool).await?;
                validate_account_tables_postgres(pool).await?;
                Ok(())
            }
            _ => Err(AccountError::Storage("Unsupported database type".to_string())),
        }
    }

    /// Look up an account by name
    ///
    /// Malformed `roles` or identity documents in the row read back as empty
    /// roles and no document.
    #[tracing::instrument(fields(account_name = %name))]
    pub async fn get(name: &str) -> Result<Option<Account>, AccountError> {
        let store = GENERIC_DATA_STORE.lock().await;

        let result = if let Some(pool) = store.as_sqlite() {
            get_account_sqlite(pool, name).await
        } else if let Some(pool) = store.as_postgres() {
            get_account_postgres(pool, name).await
        } else {
            Err(AccountError::Storage("Unsupported database type".to_string()))
        };

        match &result {
            Ok(Some(_)) => {
                tracing::info!(found = true, "Account lookup completed");
            }
            Ok(None) => {
                tracing::info!(found = false, "Account lookup completed - not found");
            }
            Err(e) => {
                tracing::error!(error = %e, "Account lookup failed");
            }
        }

        Ok(result?.map(Account::from))
    }

    /// Return the account if `password` matches its stored digest
    ///
    /// A wrong password and an unknown name both give `Ok(None)`.
    #[tracing::instrument(skip(password), fields(account_name = %name))]
    pub async fn authenticate(name: &str, password: &str) -> Result<Option<Account>, AccountError> {
        let Some(account) = Self::get(name).await? else {
            return Ok(None);
        };

        let computed = password_digest(password, &account.salt);
        if !bool::from(computed.as_bytes().ct_eq(account.password_digest.as_bytes())) {
            tracing::info!("Password digest mismatch");
            return Ok(None);
        }

        Ok(Some(account))
    }

    /// Insert a new account and return its initial revision
    ///
    /// Name uniqueness is left to the table constraint; a duplicate fails
    /// with [`AccountError::Storage`].
    #[tracing::instrument(skip(account), fields(account_name = %account.name))]
    pub async fn add(account: &NewAccount) -> Result<String, AccountError> {
        let roles = encode_roles(&account.roles);
        let revision = Revision::initial(&serde_json::to_string(account)?).to_string();

        let store = GENERIC_DATA_STORE.lock().await;

        let result = if let Some(pool) = store.as_sqlite() {
            insert_account_sqlite(pool, account, &revision, &roles).await
        } else if let Some(pool) = store.as_postgres() {
            insert_account_postgres(pool, account, &revision, &roles).await
        } else {
            Err(AccountError::Storage("Unsupported database type".to_string()))
        };

        match &result {
            Ok(()) => tracing::info!(revision = %revision, "Account created"),
            Err(e) => tracing::error!(error = %e, "Account creation failed"),
        }

        result.map(|()| revision)
    }

    /// Update credentials if the stored revision still equals the one the caller saw
    ///
    /// A lost race is reported as `rows_affected == 0`, not as an error.
    #[tracing::instrument(skip(account), fields(account_name = %account.name))]
    pub async fn update(account: &AccountUpdate) -> Result<UpdateResult, AccountError> {
        let expected_revision = account.expected_revision();

        let Some(current) = Revision::parse(expected_revision) else {
            return Err(revision_format_error(account));
        };
        let Some(next) = current.next(&serde_json::to_string(account)?) else {
            return Err(revision_format_error(account));
        };

        let new_revision = next.to_string();
        let roles = encode_roles(&account.roles);

        let store = GENERIC_DATA_STORE.lock().await;

        let rows_affected = if let Some(pool) = store.as_sqlite() {
            update_account_sqlite(pool, account, expected_revision, &new_revision, &roles).await
        } else if let Some(pool) = store.as_postgres() {
            update_account_postgres(pool, account, expected_revision, &new_revision, &roles).await
        } else {
            Err(AccountError::Storage("Unsupported database type".to_string()))
        }
        .inspect_err(|e| tracing::error!(error = %e, "Account update failed"))?;

        if rows_affected == 0 {
            tracing::warn!(
                expected_revision,
                "Account update matched no rows; stored revision has moved on"
            );
        } else {
            tracing::info!(revision = %new_revision, "Account updated");
        }

        Ok(UpdateResult {
            revision: new_revision,
            rows_affected,
        })
    }

    /// Store an identity-provider user document, inserting or overwriting by name
    ///
    /// The document's `_rev` is stored as given. Unlike [`AccountStore::update`]
    /// there is no revision check.
    #[tracing::instrument(skip(user), fields(account_name = %user.name, revision = %user.revision))]
    pub async fn save_external(user: &ExternalUser) -> Result<ExternalSave, AccountError> {
        let document = serde_json::to_string(user)?;

        // The lookup and the write are separate round trips with nothing held
        // in between. Concurrent first imports of one name race: the loser
        // hits the UNIQUE(name) constraint. Concurrent overwrites are
        // last-writer-wins.
        let existing = Self::find_external(&user.name).await?;

        let store = GENERIC_DATA_STORE.lock().await;

        let result = match existing {
            None => {
                let inserted = if let Some(pool) = store.as_sqlite() {
                    insert_external_sqlite(pool, user, &document).await
                } else if let Some(pool) = store.as_postgres() {
                    insert_external_postgres(pool, user, &document).await
                } else {
                    Err(AccountError::Storage("Unsupported database type".to_string()))
                };
                inserted.map(|()| ExternalSave::Inserted)
            }
            Some(ExternalRef { id, .. }) => {
                let updated = if let Some(pool) = store.as_sqlite() {
                    update_external_sqlite(pool, id, user, &document).await
                } else if let Some(pool) = store.as_postgres() {
                    update_external_postgres(pool, id, user, &document).await
                } else {
                    Err(AccountError::Storage("Unsupported database type".to_string()))
                };
                updated.map(|()| ExternalSave::Updated { id })
            }
        };

        match &result {
            Ok(outcome) => tracing::info!(?outcome, "Identity document saved"),
            Err(e) => tracing::error!(error = %e, "Saving identity document failed"),
        }

        result
    }

    async fn find_external(name: &str) -> Result<Option<ExternalRef>, AccountError> {
        let store = GENERIC_DATA_STORE.lock().await;

        let existing = if let Some(pool) = store.as_sqlite() {
            get_external_ref_sqlite(pool, name).await
        } else if let Some(pool) = store.as_postgres() {
            get_external_ref_postgres(pool, name).await
        } else {
            Err(AccountError::Storage("Unsupported database type".to_string()))
        }?;

        if let Some(row) = &existing {
            tracing::debug!(
                id = row.id,
                has_document = row.ext_document.is_some(),
                "Found existing account row"
            );
        }

        Ok(existing)
    }

    /// Summaries of the accounts whose name is in `names`, in backend order
    #[tracing::instrument(skip(names), fields(requested = names.len()))]
    pub async fn list_by_names(names: &[String]) -> Result<Vec<AccountSummary>, AccountError> {
        if names.is_empty() {
            return Ok(Vec::new());
        }

        let store = GENERIC_DATA_STORE.lock().await;

        let rows = if let Some(pool) = store.as_sqlite() {
            list_accounts_by_names_sqlite(pool, names).await
        } else if let Some(pool) = store.as_postgres() {
            list_accounts_by_names_postgres(pool, names).await
        } else {
            Err(AccountError::Storage("Unsupported database type".to_string()))
        }?;

        tracing::debug!(found = rows.len(), "Listed accounts by name");

        Ok(rows.into_iter().map(AccountSummary::from).collect())
    }
}

fn revision_format_error(account: &AccountUpdate) -> AccountError {
    let revision = account.expected_revision().to_string();
    tracing::warn!(revision = %revision, "Rejecting update with malformed revision");

    AccountError::RevisionFormat {
        account: Box::new(account.clone()),
        revision,
    }
}
