use thiserror::Error;

use crate::storage::StorageError;

use super::types::AccountUpdate;

#[derive(Clone, Error, Debug)]
pub enum AccountError {
    #[error("Storage error: {0}")]
    Storage(String),

    /// The update carried a revision whose numeric prefix could not be parsed.
    /// Nothing was written.
    #[error("Revision {revision:?} format error")]
    RevisionFormat {
        account: Box<AccountUpdate>,
        revision: String,
    },

    #[error("Invalid data: {0}")]
    InvalidData(String),
}

impl From<serde_json::Error> for AccountError {
    fn from(err: serde_json::Error) -> Self {
        AccountError::InvalidData(err.to_string())
    }
}

impl From<sqlx::Error> for AccountError {
    fn from(err: sqlx::Error) -> Self {
        AccountError::Storage(err.to_string())
    }
}

impl From<StorageError> for AccountError {
    fn from(err: StorageError) -> Self {
        AccountError::Storage(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_serde_json_error() {
        let json_error = serde_json::from_str::<serde_json::Value>("invalid json").unwrap_err();

        match AccountError::from(json_error) {
            AccountError::InvalidData(msg) => {
                assert!(
                    msg.contains("expected value"),
                    "Error message should contain the original error"
                );
            }
            _ => panic!("Expected InvalidData variant"),
        }
    }

    #[test]
    fn test_from_storage_error() {
        let err = AccountError::from(StorageError::UnsupportedStore);

        match err {
            AccountError::Storage(msg) => assert_eq!(msg, "Unsupported database type"),
            _ => panic!("Expected Storage variant"),
        }
    }

    #[test]
    fn test_revision_format_display() {
        let account = AccountUpdate {
            name: "alice".to_string(),
            revision: Some("abc-xyz".to_string()),
            legacy_revision: None,
            email: "alice@example.com".to_string(),
            salt: "s".to_string(),
            password_digest: "d".to_string(),
            ip: "127.0.0.1".to_string(),
            roles: vec![],
        };

        let err = AccountError::RevisionFormat {
            account: Box::new(account),
            revision: "abc-xyz".to_string(),
        };

        assert_eq!(err.to_string(), "Revision \"abc-xyz\" format error");
    }

    #[test]
    fn test_error_is_sync_and_send() {
        fn assert_sync_send<T: Sync + Send>() {}
        assert_sync_send::<AccountError>();
    }
}
