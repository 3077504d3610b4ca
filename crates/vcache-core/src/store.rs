//! # Content-Addressable Store Contract
//!
//! The capability set every backend provides: `get`, `head`, `put`, `close`.
//! The protocol layer holds an `Arc<dyn ArtifactStore>` and never touches
//! the backing medium directly.
//!
//! ## Concurrency
//!
//! All methods take `&self` and may be called concurrently without external
//! locking. Reads of an identity being written see [`StoreError::NotFound`]
//! until the write becomes visible in a single step.
//!
//! ## Cancellation
//!
//! Dropping a `put` future stops the copy loop at its next await point. The
//! backend must guarantee that an abandoned write never becomes visible.

use async_trait::async_trait;
use tokio::io::AsyncRead;

use crate::error::StoreError;
use crate::identity::ArtifactId;

/// Byte stream of a stored artifact. Dropping it releases the handle.
pub type ArtifactReader = Box<dyn AsyncRead + Send + Unpin>;

/// Write-once, read-many artifact storage.
#[async_trait]
pub trait ArtifactStore: Send + Sync {
    /// Open the artifact at `id` for streaming.
    ///
    /// Fails with [`StoreError::NotFound`] if nothing is stored there.
    async fn get(&self, id: &ArtifactId) -> Result<ArtifactReader, StoreError>;

    /// Exact size in bytes of the artifact at `id`, without reading it.
    ///
    /// Fails with [`StoreError::NotFound`] if nothing is stored there.
    async fn head(&self, id: &ArtifactId) -> Result<u64, StoreError>;

    /// Consume `body` completely and persist it at `id`.
    ///
    /// Fails with [`StoreError::AlreadyExists`] if an artifact is already
    /// present; the existing artifact is left untouched. A failure while
    /// reading `body` leaves no artifact visible at `id`.
    async fn put(
        &self,
        id: &ArtifactId,
        body: &mut (dyn AsyncRead + Send + Unpin),
    ) -> Result<(), StoreError>;

    /// Release scratch resources.
    ///
    /// Fails while writes are still in flight; callers retry after draining
    /// requests. Calling it again after success is a no-op.
    async fn close(&self) -> Result<(), StoreError>;
}
