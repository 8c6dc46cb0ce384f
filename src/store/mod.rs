//! The content store adapter (spec.md §4.5).
//!
//! A content store holds file bytes; it knows nothing about names,
//! directories, or permissions (that's [`crate::metadata`]'s job). Every
//! store supports sequential read and offset-addressed write. Two
//! capabilities are optional because not every backing store can offer
//! them cheaply: random-access reads ([`RandomReadable`]) and incremental,
//! multipart-style flushing ([`IncrementalWritable`]). The payload cache
//! (spec.md §4.4) probes for these at construction time and falls back to
//! buffering whole files in memory when they're absent.

pub mod handle;

pub use handle::ContentStoreHandle;

use async_trait::async_trait;

/// Failure modes a content store can report. Distinct from
/// [`crate::metadata::Error`]: a store only ever talks about bytes, never
/// about names or permissions.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Error {
    NotFound,
    NoSpace,
    IoError,
    Unsupported,
}

pub type Result<T> = std::result::Result<T, Error>;

/// An identifier for a single object (file) in the store. Opaque to the
/// payload cache and handlers; only the store interprets it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ObjectId(pub String);

/// Base capability every content store provides: sequential read of the
/// whole object, and writing a byte range.
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Reads the entire object. Stores that only support sequential access
    /// (no [`RandomReadable`]) still need to serve prefetch in full this
    /// way.
    async fn read(&self, id: &ObjectId) -> Result<Vec<u8>>;

    /// Writes `data` at `offset`, extending the object if `offset + data.len()`
    /// is past the current end. Implementations must zero-fill any gap if
    /// `offset` is past the current end (sparse-write semantics, matching
    /// POSIX write-past-EOF).
    async fn write_at(&self, id: &ObjectId, offset: u64, data: &[u8]) -> Result<()>;

    /// Returns the object's current length, or `Ok(0)` if it does not yet
    /// exist (a WRITE to a freshly created, empty file observes this before
    /// any bytes have been flushed).
    async fn len(&self, id: &ObjectId) -> Result<u64>;

    /// Removes the object. Called when the metadata service orphans a
    /// file (spec.md §6 `mark_file_as_orphaned`) once no cache entry still
    /// references it.
    async fn remove(&self, id: &ObjectId) -> Result<()>;

    /// Truncates (or zero-extends) the object to exactly `size` bytes.
    /// Used by CREATE's `Unchecked` mode when an existing file is reused
    /// (spec.md §4.6 CREATE contract).
    async fn truncate(&self, id: &ObjectId, size: u64) -> Result<()>;
}

/// Optional capability: read an arbitrary byte range without reading the
/// whole object first. The payload cache uses this for chunked prefetch
/// (spec.md §4.4); without it, prefetch degrades to one `read` per file.
#[async_trait]
pub trait RandomReadable: ContentStore {
    async fn read_at(&self, id: &ObjectId, offset: u64, len: usize) -> Result<Vec<u8>>;
}

/// Optional capability: accept a write incrementally, ahead of the final
/// byte arriving, the way a multipart upload API does. The payload cache's
/// `Uploading` state (spec.md §4.4) only exists when the underlying store
/// implements this; otherwise a file is held fully in memory until COMMIT
/// and flushed in one `write_at` call.
#[async_trait]
pub trait IncrementalWritable: ContentStore {
    /// Begins (or resumes) an incremental upload for `id`. Returns an
    /// opaque upload handle implementations can use to track in-progress
    /// part state.
    async fn begin_incremental(&self, id: &ObjectId) -> Result<UploadHandle>;

    /// Flushes `data` as the next contiguous chunk of the upload starting
    /// at `offset`. Chunks must be flushed in non-decreasing offset order;
    /// the payload cache enforces this (spec.md §4.4 `flushed_offset`).
    async fn flush_incremental(
        &self,
        upload: &UploadHandle,
        offset: u64,
        data: &[u8],
    ) -> Result<()>;

    /// Finalizes the upload, making all flushed chunks visible as a single
    /// object under `id`.
    async fn complete_incremental(&self, upload: UploadHandle) -> Result<()>;

    /// Discards an in-progress upload without completing it (used when a
    /// file is removed or truncated to zero while still `Uploading`).
    async fn abort_incremental(&self, upload: UploadHandle) -> Result<()>;
}

/// Opaque handle to an in-progress incremental upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadHandle(pub String);
