//! The metadata service contract (spec.md §6).
//!
//! This module defines the trait the handler layer calls into for every
//! namespace and attribute operation; it has no implementation of its own.
//! A concrete backing store (a database, a local filesystem shadow, ...)
//! implements [`MetadataService`] and is handed to [`crate::context`] at
//! construction time. Handlers never touch storage directly.

use async_trait::async_trait;

use crate::nfs3::types::{
    DeviceId, DirectoryCookie, DirectoryEntry, FileAttr, FileHandle, FsInfo, FsStat, PathConfig,
    SetAttr,
};

/// A file or directory as the metadata service knows it: a handle, its
/// attributes, (for symlinks) the link target, and — for regular files —
/// the payload identifier the cache and content store index its bytes
/// under.
#[derive(Debug, Clone, PartialEq)]
pub struct File {
    pub handle: FileHandle,
    pub attr: FileAttr,
    pub symlink_target: Option<String>,
    pub payload_id: Option<PayloadId>,
}

/// The closed set of failure modes a metadata service can report. Handlers
/// map each variant onto an [`crate::nfs3::NfsStat`] (spec.md §6 "Error
/// mapping"); no other status code can originate below the handler layer.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Error {
    NotFound,
    AccessDenied,
    AuthRequired,
    PermissionDenied,
    PrivilegeRequired,
    AlreadyExists,
    NotEmpty,
    IsDirectory,
    NotDirectory,
    InvalidArgument,
    NoSpace,
    QuotaExceeded,
    ReadOnly,
    NotSupported,
    InvalidHandle,
    StaleHandle,
    NameTooLong,
    IoError,
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// The 1-to-1 mapping onto wire status codes every handler applies
    /// (spec.md §6 "Error mapping"). Kept here, next to the closed set it
    /// maps, rather than scattered across every handler.
    pub fn into_status(self) -> crate::nfs3::NfsStat {
        use crate::nfs3::NfsStat;
        match self {
            Error::NotFound => NfsStat::NoEnt,
            Error::AccessDenied => NfsStat::Access,
            Error::AuthRequired => NfsStat::Perm,
            Error::PermissionDenied => NfsStat::Access,
            Error::PrivilegeRequired => NfsStat::Perm,
            Error::AlreadyExists => NfsStat::Exist,
            Error::NotEmpty => NfsStat::NotEmpty,
            Error::IsDirectory => NfsStat::IsDir,
            Error::NotDirectory => NfsStat::NotDir,
            Error::InvalidArgument => NfsStat::Inval,
            Error::NoSpace => NfsStat::NoSpc,
            Error::QuotaExceeded => NfsStat::DQuot,
            Error::ReadOnly => NfsStat::RoFs,
            Error::NotSupported => NfsStat::NotSupp,
            Error::InvalidHandle => NfsStat::BadHandle,
            Error::StaleHandle => NfsStat::Stale,
            Error::NameTooLong => NfsStat::NameTooLong,
            Error::IoError => NfsStat::Io,
        }
    }
}

/// What CREATE/MKDIR/SYMLINK/MKNOD ask the metadata service to do with a
/// name that already exists (spec.md §6, mirroring `createhow3`/MKDIR's
/// always-guarded semantics).
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ExistsPolicy {
    /// Fail with `AlreadyExists` if the name is already bound.
    Guarded,
    /// Succeed idempotently if the existing entry has the same type and
    /// (for regular files) was created with the same exclusive-create
    /// verifier; otherwise fail.
    Unchecked,
}

/// Identifies the payload-cache/content-store object backing a file's
/// bytes, as distinct from its [`FileHandle`] (spec.md §6 `prepare_write`
/// returns one alongside the pre-write WCC digest).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PayloadId(pub String);

/// What [`MetadataService::prepare_write`] hands back: the payload
/// identifier the handler should buffer bytes under, and a WCC snapshot
/// taken immediately before the write is authorized (spec.md §4.6 step 4
/// "capture WCC-before").
#[derive(Debug, Clone, PartialEq)]
pub struct PrepareWriteOutcome {
    pub payload_id: PayloadId,
    pub pre_write_attrs: crate::nfs3::types::WccAttr,
}

/// The opaque collaborator every procedure handler calls into for
/// namespace lookups, attribute changes, and filesystem-wide queries.
///
/// Implementations are expected to be cheaply cloneable handles around
/// shared backing state (an `Arc<...>` inner, a connection pool, ...); the
/// trait takes `&self` throughout.
#[async_trait]
pub trait MetadataService: Send + Sync {
    /// Resolves a handle to its current attributes. Returns
    /// [`Error::StaleHandle`] if the handle no longer names anything (the
    /// file was removed and, unlike POSIX unlink-after-open, this service
    /// does not keep orphaned content reachable by handle).
    async fn get_file(&self, handle: &FileHandle) -> Result<File>;

    /// Looks up `name` inside the directory named by `dir`. Does not
    /// validate `name` against the dot-name / length rules — that is
    /// [`crate::validate`]'s job, performed before this is ever called.
    async fn lookup(&self, dir: &FileHandle, name: &str) -> Result<File>;

    /// Resolves `dir`'s parent (used for the `..` case of LOOKUP, which a
    /// metadata service may implement without a literal `..` directory
    /// entry).
    async fn get_parent(&self, dir: &FileHandle) -> Result<File>;

    /// Looks up a child purely to obtain its handle and attributes, no
    /// existence-only distinction from `lookup`; kept as a separate method
    /// because READDIRPLUS and LOOKUP have different caching/error
    /// tolerances in some backing stores (spec.md §6 notes it as "callers
    /// differ only in whether a miss is fatal").
    async fn get_child(&self, dir: &FileHandle, name: &str) -> Result<Option<File>>;

    /// Creates a regular file named `name` in `dir` with initial attributes
    /// `attr`. `exclusive_verifier`, when set, requests EXCLUSIVE create
    /// semantics (RFC 1813 §3.3.8): a create that races with another
    /// client using the same verifier must succeed idempotently.
    async fn create_file(
        &self,
        dir: &FileHandle,
        name: &str,
        attr: &SetAttr,
        policy: ExistsPolicy,
        exclusive_verifier: Option<[u8; 8]>,
    ) -> Result<File>;

    /// Creates a directory.
    async fn create_directory(&self, dir: &FileHandle, name: &str, attr: &SetAttr) -> Result<File>;

    /// Creates a symbolic link pointing at `target`.
    async fn create_symlink(
        &self,
        dir: &FileHandle,
        name: &str,
        target: &str,
        attr: &SetAttr,
    ) -> Result<File>;

    /// Creates a device special file, FIFO, or socket.
    async fn create_special(
        &self,
        dir: &FileHandle,
        name: &str,
        device: Option<DeviceId>,
        attr: &SetAttr,
    ) -> Result<File>;

    /// Applies attribute changes. `guard_ctime`, when set, requires the
    /// file's current ctime to match before any change is applied
    /// (`sattrguard3`); a mismatch is reported via `Ok(None)` rather than
    /// the `Error` channel, since it isn't one of the closed set's
    /// variants and the handler maps it onto the NFSv3-specific
    /// `NFS3ERR_NOT_SYNC` status rather than any generic error (spec.md
    /// §6, §7).
    async fn set_file_attributes(
        &self,
        handle: &FileHandle,
        attr: &SetAttr,
        guard_ctime: Option<crate::nfs3::types::FileTime>,
    ) -> Result<Option<File>>;

    /// Removes the non-directory entry `name` from `dir`.
    async fn remove(&self, dir: &FileHandle, name: &str) -> Result<()>;

    /// Removes the empty directory entry `name` from `dir`.
    async fn remove_directory(&self, dir: &FileHandle, name: &str) -> Result<()>;

    /// Renames/moves `old_name` in `from_dir` to `new_name` in `to_dir`,
    /// atomically replacing any existing `new_name` of a compatible type.
    /// `from_dir` and `to_dir` are opaque to the handler layer (spec.md
    /// §3), so only the implementation can tell whether they belong to
    /// the same share; a cross-share move must fail with
    /// [`Error::InvalidArgument`], which the handler surfaces as
    /// `NFS3ERR_INVAL` per spec.md §4.6's RENAME contract.
    async fn rename(
        &self,
        from_dir: &FileHandle,
        old_name: &str,
        to_dir: &FileHandle,
        new_name: &str,
    ) -> Result<()>;

    /// Creates an additional hard link named `name` in `dir`, pointing at
    /// the existing file `handle`.
    async fn link(&self, handle: &FileHandle, dir: &FileHandle, name: &str) -> Result<()>;

    /// Lists up to `max_entries` directory entries starting strictly after
    /// `cookie`. `verifier` must match the cookie verifier last handed out
    /// for this directory, or [`Error::InvalidArgument`] is returned (the
    /// handler maps this onto `NFS3ERR_BAD_COOKIE`, spec.md §6).
    async fn read_directory(
        &self,
        dir: &FileHandle,
        cookie: DirectoryCookie,
        verifier: [u8; 8],
        max_entries: usize,
    ) -> Result<(Vec<DirectoryEntry>, bool, [u8; 8])>;

    /// Marks a file as orphaned: the metadata service may reclaim its
    /// backing content once all references to its handle are dropped by
    /// the caches that hold one. Used by REMOVE/RENAME when the target of
    /// the removal/replacement has an open payload-cache entry (spec.md §6,
    /// §4.4 "remove-while-cached").
    async fn mark_file_as_orphaned(&self, handle: &FileHandle) -> Result<()>;

    /// Checks whether `mask` is permitted for `handle` under the given
    /// auth context, returning the subset actually granted (RFC 1813 §3.3.4
    /// ACCESS semantics: never an error for a right that's simply absent).
    /// `mask` and the returned mask use [`crate::handlers::access`]'s
    /// type-sensitive generic permission bits (Read, Traverse, Write,
    /// Delete, Execute, ListDirectory), not the raw NFS wire bits — the
    /// ACCESS handler performs that translation before and after calling
    /// this method, since only it knows which bits are meaningful for
    /// which file type (spec.md §4.6).
    async fn check_permissions(
        &self,
        handle: &FileHandle,
        auth: &crate::auth::AuthContext,
        mask: crate::nfs3::types::AccessMask,
    ) -> Result<crate::nfs3::types::AccessMask>;

    /// Validates permission and reserves space/quota for a write extending
    /// the file to `new_size`, ahead of the content store accepting any
    /// bytes. Returning `Err` here aborts the WRITE before bytes are
    /// buffered.
    async fn prepare_write(
        &self,
        handle: &FileHandle,
        auth: &crate::auth::AuthContext,
        new_size: u64,
    ) -> Result<PrepareWriteOutcome>;

    /// Finalizes size/mtime bookkeeping after `committed_len` bytes under
    /// `payload_id` have been made durable in the content store. Called
    /// once per flush, and again (idempotently, with `committed_len` equal
    /// to the already-committed length) by COMMIT.
    async fn commit_write(
        &self,
        handle: &FileHandle,
        payload_id: &PayloadId,
        committed_len: u64,
    ) -> Result<File>;

    /// Dynamic filesystem statistics (FSSTAT).
    async fn get_filesystem_statistics(&self, handle: &FileHandle) -> Result<FsStat>;

    /// Static filesystem capabilities (FSINFO).
    async fn get_filesystem_capabilities(&self, handle: &FileHandle) -> Result<FsInfo>;

    /// POSIX pathconf values (PATHCONF).
    async fn get_path_config(&self, handle: &FileHandle) -> Result<PathConfig>;
}
