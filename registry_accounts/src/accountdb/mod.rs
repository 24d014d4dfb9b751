mod codec;
mod errors;
mod revision;
mod storage;
mod types;

pub use errors::AccountError;
pub use revision::Revision;
pub use storage::AccountStore;
pub use types::{
    Account, AccountSummary, AccountUpdate, ExternalSave, ExternalUser, NewAccount, UpdateResult,
};

pub async fn init() -> Result<(), AccountError> {
    AccountStore::init().await
}
