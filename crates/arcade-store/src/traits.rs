use async_trait::async_trait;
use bytes::Bytes;

use crate::error::StoreResult;

/// Whole-object blob store addressed by key.
///
/// All implementations must satisfy these invariants:
/// - `fetch` of an absent key is `Ok(None)`. Any other failure is `Err`
///   and must not be reported as absence.
/// - `store` durably replaces the whole object. Readers see either the
///   previous bytes or the new bytes, never a mix.
/// - There is no versioning or conditional write: the last `store` wins.
/// - The store never interprets object contents.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Read the object at `key`.
    ///
    /// Returns `Ok(None)` if the object does not exist.
    async fn fetch(&self, key: &str) -> StoreResult<Option<Bytes>>;

    /// Replace the object at `key` with `data`, creating it if needed.
    async fn store(&self, key: &str, data: Bytes) -> StoreResult<()>;

    /// Check whether an object exists at `key`.
    ///
    /// Default implementation fetches the object. Backends should override
    /// with a metadata lookup.
    async fn exists(&self, key: &str) -> StoreResult<bool> {
        Ok(self.fetch(key).await?.is_some())
    }
}
