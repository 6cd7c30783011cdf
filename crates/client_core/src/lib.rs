use async_trait::async_trait;
use shared::{
    domain::{UserKey, UserRecord},
    protocol::RawProfile,
};
use storage::{Storage, StorageError};

pub mod directory;
pub mod error;
pub mod remote;
pub mod view;

pub use directory::{DirectoryController, DirectoryOptions, LoadPhase, LoadSource, ViewState};
pub use error::{DirectoryError, RemoteError};
pub use remote::RandomUserClient;

/// Persisted table of directory entries.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn count(&self) -> Result<u64, StorageError>;
    async fn bulk_add(&self, records: &[UserRecord]) -> Result<(), StorageError>;
    async fn to_array(&self) -> Result<Vec<UserRecord>, StorageError>;
    async fn delete(&self, id: &UserKey) -> Result<(), StorageError>;
    async fn clear(&self) -> Result<(), StorageError>;
}

/// One-shot supplier of freshly generated profiles.
#[async_trait]
pub trait ProfileSource: Send + Sync {
    async fn fetch_users(&self, count: usize) -> Result<Vec<RawProfile>, RemoteError>;
}

#[async_trait]
impl UserStore for Storage {
    async fn count(&self) -> Result<u64, StorageError> {
        Storage::count(self).await
    }

    async fn bulk_add(&self, records: &[UserRecord]) -> Result<(), StorageError> {
        Storage::bulk_add(self, records).await
    }

    async fn to_array(&self) -> Result<Vec<UserRecord>, StorageError> {
        Storage::to_array(self).await
    }

    async fn delete(&self, id: &UserKey) -> Result<(), StorageError> {
        Storage::delete(self, id).await
    }

    async fn clear(&self) -> Result<(), StorageError> {
        Storage::clear(self).await
    }
}
