use crate::auth::Identity;
use crate::record::{SessionRecord, UserDocument};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("storage unavailable: {0}")]
    Unavailable(String),
    #[error("record encode failed")]
    Encode,
    #[error("record decode failed: {0}")]
    Decode(String),
    #[error("backend error: {0}")]
    Backend(String),
}

/// Single-slot storage for the anonymous session on this device.
#[allow(async_fn_in_trait)]
pub trait LocalStore {
    async fn read(&self) -> Result<Option<SessionRecord>, StoreError>;
    async fn write(&self, record: &SessionRecord) -> Result<(), StoreError>;
    async fn clear(&self) -> Result<(), StoreError>;
}

/// Per-identity document storage. `merge_document` must follow
/// [`UserDocument::merge`]: keys absent from the patch stay untouched.
#[allow(async_fn_in_trait)]
pub trait RemoteStore {
    async fn read_document(&self, identity: &Identity) -> Result<Option<UserDocument>, StoreError>;
    async fn merge_document(
        &self,
        identity: &Identity,
        patch: UserDocument,
    ) -> Result<(), StoreError>;
}
