//! Wire-adjacent data model shared by the XDR codec and the procedure handlers.
//!
//! Types here mirror RFC 1813 §3.3 structures but use idiomatic Rust naming
//! instead of the C/XDR identifiers (`fattr3`, `wcc_data`, `sattr3`, ...).

use std::time::{SystemTime, UNIX_EPOCH};

/// Bounds on a file handle, per RFC 1813 §2.4 / spec invariants.
pub const MIN_HANDLE_LEN: usize = 8;
pub const MAX_HANDLE_LEN: usize = 64;

/// Bounds on a filename, per RFC 1813 §2.4.
pub const MAX_NAME_LEN: usize = 255;

/// Hard cap enforced by the XDR decoder on a WRITE payload, before any
/// validation against the metadata service's advertised `max_write_size`.
pub const MAX_WRITE_PAYLOAD: usize = 32 * 1024 * 1024;

/// An opaque file handle. Handlers only ever inspect its length and, for
/// `fileid` population, its first 8 bytes; everything else is meaningful
/// only to the metadata service that minted it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FileHandle(pub Vec<u8>);

impl FileHandle {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// `true` iff the handle length falls within [`MIN_HANDLE_LEN`],
    /// [`MAX_HANDLE_LEN`].
    pub fn is_valid_length(&self) -> bool {
        (MIN_HANDLE_LEN..=MAX_HANDLE_LEN).contains(&self.0.len())
    }

    /// The first 8 bytes interpreted as a big-endian `fileid`, per spec.md
    /// §6 ("the first 8 bytes are interpreted as a big-endian 64-bit
    /// fileid"). Handles shorter than 8 bytes are already rejected by
    /// validation before this is ever called.
    pub fn fileid(&self) -> u64 {
        let mut buf = [0u8; 8];
        let n = self.0.len().min(8);
        buf[..n].copy_from_slice(&self.0[..n]);
        u64::from_be_bytes(buf)
    }
}

/// POSIX-like file types (RFC 1813 §3.3.1 `ftype3`).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum FileType {
    Regular,
    Directory,
    BlockDevice,
    CharacterDevice,
    Symlink,
    Socket,
    Fifo,
}

/// Major/minor device pair (`specdata3`).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct DeviceId {
    pub major: u32,
    pub minor: u32,
}

/// `nfstime3`: seconds + nanoseconds since the epoch.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default)]
pub struct FileTime {
    pub seconds: u32,
    pub nanos: u32,
}

impl FileTime {
    pub fn now() -> Self {
        let d = SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default();
        FileTime { seconds: d.as_secs() as u32, nanos: d.subsec_nanos() }
    }
}

/// Full file attributes (`fattr3`).
#[derive(Debug, Clone, PartialEq)]
pub struct FileAttr {
    pub file_type: FileType,
    pub mode: u32,
    pub nlink: u32,
    pub uid: u32,
    pub gid: u32,
    pub size: u64,
    pub used: u64,
    pub device: Option<DeviceId>,
    pub fsid: u64,
    pub fileid: u64,
    pub atime: FileTime,
    pub mtime: FileTime,
    pub ctime: FileTime,
}

/// Weak cache consistency pre-op digest (`wcc_attr`): just enough of the
/// attributes to detect a concurrent modification.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct WccAttr {
    pub size: u64,
    pub mtime: FileTime,
    pub ctime: FileTime,
}

impl From<&FileAttr> for WccAttr {
    fn from(attr: &FileAttr) -> Self {
        WccAttr { size: attr.size, mtime: attr.mtime, ctime: attr.ctime }
    }
}

/// Weak cache consistency data (`wcc_data`): optional pre-op digest plus
/// optional post-op attributes. Both are `None`-able: a best-effort
/// post-op re-fetch that fails simply omits `after` (spec.md §7).
#[derive(Debug, Clone, PartialEq, Default)]
pub struct WccData {
    pub before: Option<WccAttr>,
    pub after: Option<FileAttr>,
}

impl WccData {
    pub fn none() -> Self {
        WccData::default()
    }
}

/// Strategy for updating a timestamp in [`SetAttr`] (`set_atime`/`set_mtime`).
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Hash)]
pub enum SetTime {
    #[default]
    DontChange,
    ServerCurrent,
    ClientProvided(FileTime),
}

/// Attribute modifications requested by SETATTR / embedded in CREATE
/// (`sattr3`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct SetAttr {
    pub mode: Option<u32>,
    pub uid: Option<u32>,
    pub gid: Option<u32>,
    pub size: Option<u64>,
    pub atime: SetTime,
    pub mtime: SetTime,
}

/// Guard used by SETATTR to detect a concurrent modification
/// (`sattrguard3`).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum SetAttrGuard {
    None,
    Check { ctime: FileTime },
}

/// Mask of access rights requested/granted by ACCESS (RFC 1813 §3.3.4).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default)]
pub struct AccessMask(pub u32);

impl AccessMask {
    pub const READ: u32 = 0x0001;
    pub const LOOKUP: u32 = 0x0002;
    pub const MODIFY: u32 = 0x0004;
    pub const EXTEND: u32 = 0x0008;
    pub const DELETE: u32 = 0x0010;
    pub const EXECUTE: u32 = 0x0020;

    pub fn contains(self, bit: u32) -> bool {
        self.0 & bit != 0
    }
}

/// Stability guarantee requested by WRITE / reported as `committed`
/// (`stable_how`).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum StableHow {
    Unstable = 0,
    DataSync = 1,
    FileSync = 2,
}

/// 64-bit write verifier (`writeverf3`), stable for one process lifetime.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct WriteVerifier(pub [u8; 8]);

/// Creation strategy (`createhow3`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CreateMode {
    Unchecked(SetAttr),
    Guarded(SetAttr),
    Exclusive([u8; 8]),
}

/// 64-bit directory cookie (`cookie3`).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default)]
pub struct DirectoryCookie(pub u64);

/// Directory cookie verifier (`cookieverf3`).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default)]
pub struct CookieVerifier(pub [u8; 8]);

impl CookieVerifier {
    pub fn zero() -> Self {
        CookieVerifier([0u8; 8])
    }

    pub fn is_zero(self) -> bool {
        self.0 == [0u8; 8]
    }
}

/// A directory entry as returned by READDIR.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DirectoryEntry {
    pub cookie: DirectoryCookie,
    pub name: String,
    pub fileid: u64,
}

/// A directory entry as returned by READDIRPLUS, optionally carrying the
/// child's handle and attributes.
#[derive(Debug, Clone, PartialEq)]
pub struct DirectoryPlusEntry {
    pub cookie: DirectoryCookie,
    pub name: String,
    pub fileid: u64,
    pub handle: Option<FileHandle>,
    pub attr: Option<FileAttr>,
}

/// Dynamic filesystem statistics (`FSSTAT3resok`, minus the WCC wrapper).
#[derive(Debug, Clone, PartialEq)]
pub struct FsStat {
    pub total_bytes: u64,
    pub free_bytes: u64,
    pub available_bytes: u64,
    pub total_files: u64,
    pub free_files: u64,
    pub available_files: u64,
    pub invarsec: u32,
}

/// Filesystem capability flags (`FSF3_*`).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default)]
pub struct FsProperties(pub u32);

impl FsProperties {
    pub const LINK: u32 = 0x0001;
    pub const SYMLINK: u32 = 0x0002;
    pub const HOMOGENEOUS: u32 = 0x0008;
    pub const CANSETTIME: u32 = 0x0010;
}

/// Static filesystem information (`FSINFO3resok`, minus the WCC wrapper).
#[derive(Debug, Clone, PartialEq)]
pub struct FsInfo {
    pub read_max: u32,
    pub read_pref: u32,
    pub read_multiple: u32,
    pub write_max: u32,
    pub write_pref: u32,
    pub write_multiple: u32,
    pub directory_pref: u32,
    pub max_file_size: u64,
    pub time_delta: FileTime,
    pub properties: FsProperties,
}

/// POSIX path configuration (`PATHCONF3resok`, minus the WCC wrapper).
#[derive(Debug, Clone, PartialEq)]
pub struct PathConfig {
    pub max_link: u32,
    pub max_name: u32,
    pub no_trunc: bool,
    pub chown_restricted: bool,
    pub case_insensitive: bool,
    pub case_preserving: bool,
}

/// Special node description used by MKNOD (`mknoddata3`, device variants
/// only — regular/directory/symlink go through their own procedures).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SpecialNode {
    Block { device: DeviceId, attr: SetAttr },
    Character { device: DeviceId, attr: SetAttr },
    Socket { attr: SetAttr },
    Fifo { attr: SetAttr },
}
