//! Shared fixtures for the integration tests in this directory: an
//! in-memory [`MetadataService`] and [`ContentStore`] pair, standing in
//! for the concrete backing stores spec.md §1 keeps out of scope. Grounded
//! in the teacher's `tests/shadow_fs/common.rs` fixture, minus the
//! disk-backed `ShadowFS` itself — here the "filesystem" is a plain node
//! table behind a mutex, just enough to drive the handler layer
//! end-to-end.

use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use nfs3d::auth::cache::AuthCache;
use nfs3d::auth::registry::StaticRegistry;
use nfs3d::cache::PayloadCache;
use nfs3d::context::{AuthMethod, CancellationToken, HandlerContext, RawCredential};
use nfs3d::handlers::commit::FlushLocks;
use nfs3d::handlers::HandlerDeps;
use nfs3d::metadata::{
    Error as MetaError, ExistsPolicy, File, MetadataService, PayloadId, PrepareWriteOutcome,
    Result as MetaResult,
};
use nfs3d::nfs3::types::{
    AccessMask, DeviceId, DirectoryCookie, DirectoryEntry, FileAttr, FileHandle, FileTime,
    FileType, FsInfo, FsProperties, FsStat, PathConfig, SetAttr, SetTime, WccAttr,
};
use nfs3d::share::{Permission, PrefetchConfig, Share};
use nfs3d::store::{self, ContentStore, ContentStoreHandle, ObjectId, RandomReadable};

pub const ROOT_ID: u64 = 1;

fn handle_of(id: u64) -> FileHandle {
    FileHandle(id.to_be_bytes().to_vec())
}

struct Node {
    id: u64,
    parent: u64,
    file_type: FileType,
    mode: u32,
    uid: u32,
    gid: u32,
    nlink: u32,
    size: u64,
    atime: FileTime,
    mtime: FileTime,
    ctime: FileTime,
    symlink_target: Option<String>,
    payload_id: Option<PayloadId>,
    idempotency_token: u64,
    children: Option<BTreeMap<String, u64>>,
}

impl Node {
    fn attr(&self) -> FileAttr {
        FileAttr {
            file_type: self.file_type,
            mode: self.mode,
            nlink: self.nlink,
            uid: self.uid,
            gid: self.gid,
            size: self.size,
            used: self.size,
            device: None,
            fsid: 1,
            fileid: self.id,
            atime: self.atime,
            mtime: self.mtime,
            ctime: self.ctime,
        }
    }

    fn to_file(&self) -> File {
        File {
            handle: handle_of(self.id),
            attr: self.attr(),
            symlink_target: self.symlink_target.clone(),
            payload_id: self.payload_id.clone(),
        }
    }
}

fn apply_set_attr(node: &mut Node, attr: &SetAttr, now: FileTime) {
    if let Some(mode) = attr.mode {
        node.mode = mode;
    }
    if let Some(uid) = attr.uid {
        node.uid = uid;
    }
    if let Some(gid) = attr.gid {
        node.gid = gid;
    }
    if let Some(size) = attr.size {
        node.size = size;
    }
    match attr.atime {
        SetTime::DontChange => {}
        SetTime::ServerCurrent => node.atime = now,
        SetTime::ClientProvided(t) => node.atime = t,
    }
    match attr.mtime {
        SetTime::DontChange => {}
        SetTime::ServerCurrent => node.mtime = now,
        SetTime::ClientProvided(t) => node.mtime = t,
    }
    node.ctime = now;
}

struct Inner {
    nodes: std::collections::HashMap<u64, Node>,
    next_id: u64,
}

/// An in-memory namespace: one directory tree, fileids handed out
/// sequentially, handles are just the fileid's big-endian bytes (8 bytes,
/// satisfying the handle-length invariant trivially).
pub struct FakeMetadata {
    inner: Mutex<Inner>,
}

impl FakeMetadata {
    pub fn new() -> Arc<Self> {
        let mut nodes = std::collections::HashMap::new();
        let now = FileTime { seconds: 1_700_000_000, nanos: 0 };
        nodes.insert(
            ROOT_ID,
            Node {
                id: ROOT_ID,
                parent: ROOT_ID,
                file_type: FileType::Directory,
                mode: 0o755,
                uid: 0,
                gid: 0,
                nlink: 2,
                size: 0,
                atime: now,
                mtime: now,
                ctime: now,
                symlink_target: None,
                payload_id: None,
                idempotency_token: 0,
                children: Some(BTreeMap::new()),
            },
        );
        Arc::new(FakeMetadata { inner: Mutex::new(Inner { nodes, next_id: ROOT_ID + 1 }) })
    }

    pub fn root_handle(&self) -> FileHandle {
        handle_of(ROOT_ID)
    }

    fn now() -> FileTime {
        FileTime { seconds: 1_700_000_100, nanos: 0 }
    }
}

#[async_trait]
impl MetadataService for FakeMetadata {
    async fn get_file(&self, handle: &FileHandle) -> MetaResult<File> {
        let inner = self.inner.lock().unwrap();
        let id = handle.fileid();
        inner.nodes.get(&id).map(Node::to_file).ok_or(MetaError::StaleHandle)
    }

    async fn lookup(&self, dir: &FileHandle, name: &str) -> MetaResult<File> {
        let inner = self.inner.lock().unwrap();
        let dir_node = inner.nodes.get(&dir.fileid()).ok_or(MetaError::StaleHandle)?;
        let children = dir_node.children.as_ref().ok_or(MetaError::NotDirectory)?;
        let id = *children.get(name).ok_or(MetaError::NotFound)?;
        Ok(inner.nodes[&id].to_file())
    }

    async fn get_parent(&self, dir: &FileHandle) -> MetaResult<File> {
        let inner = self.inner.lock().unwrap();
        let dir_node = inner.nodes.get(&dir.fileid()).ok_or(MetaError::StaleHandle)?;
        Ok(inner.nodes[&dir_node.parent].to_file())
    }

    async fn get_child(&self, dir: &FileHandle, name: &str) -> MetaResult<Option<File>> {
        let inner = self.inner.lock().unwrap();
        let dir_node = inner.nodes.get(&dir.fileid()).ok_or(MetaError::StaleHandle)?;
        let children = dir_node.children.as_ref().ok_or(MetaError::NotDirectory)?;
        Ok(children.get(name).map(|id| inner.nodes[id].to_file()))
    }

    async fn create_file(
        &self,
        dir: &FileHandle,
        name: &str,
        attr: &SetAttr,
        policy: ExistsPolicy,
        exclusive_verifier: Option<[u8; 8]>,
    ) -> MetaResult<File> {
        let mut inner = self.inner.lock().unwrap();
        let now = Self::now();
        let dir_id = dir.fileid();
        if !matches!(inner.nodes.get(&dir_id).map(|n| n.file_type), Some(FileType::Directory)) {
            return Err(MetaError::NotDirectory);
        }
        let existing = inner.nodes[&dir_id].children.as_ref().unwrap().get(name).copied();

        if let Some(existing_id) = existing {
            if let Some(verifier) = exclusive_verifier {
                let token = u64::from_be_bytes(verifier);
                let node = inner.nodes.get(&existing_id).unwrap();
                return if token != 0 && node.idempotency_token == token {
                    Ok(node.to_file())
                } else {
                    Err(MetaError::AlreadyExists)
                };
            }
            return match policy {
                ExistsPolicy::Guarded => Err(MetaError::AlreadyExists),
                ExistsPolicy::Unchecked => {
                    let node = inner.nodes.get_mut(&existing_id).unwrap();
                    if node.file_type != FileType::Regular {
                        return Err(MetaError::IsDirectory);
                    }
                    apply_set_attr(node, attr, now);
                    Ok(node.to_file())
                }
            };
        }

        let id = inner.next_id;
        inner.next_id += 1;
        let token = exclusive_verifier.map(u64::from_be_bytes).unwrap_or(0);
        let node = Node {
            id,
            parent: dir_id,
            file_type: FileType::Regular,
            mode: attr.mode.unwrap_or(0o644),
            uid: attr.uid.unwrap_or(0),
            gid: attr.gid.unwrap_or(0),
            nlink: 1,
            size: attr.size.unwrap_or(0),
            atime: now,
            mtime: now,
            ctime: now,
            symlink_target: None,
            payload_id: Some(PayloadId(format!("payload-{id}"))),
            idempotency_token: token,
            children: None,
        };
        let file = node.to_file();
        inner.nodes.insert(id, node);
        inner.nodes.get_mut(&dir_id).unwrap().children.as_mut().unwrap().insert(name.to_string(), id);
        Ok(file)
    }

    async fn create_directory(&self, dir: &FileHandle, name: &str, attr: &SetAttr) -> MetaResult<File> {
        let mut inner = self.inner.lock().unwrap();
        let now = Self::now();
        let dir_id = dir.fileid();
        if inner.nodes[&dir_id].children.as_ref().unwrap().contains_key(name) {
            return Err(MetaError::AlreadyExists);
        }
        let id = inner.next_id;
        inner.next_id += 1;
        let node = Node {
            id,
            parent: dir_id,
            file_type: FileType::Directory,
            mode: attr.mode.unwrap_or(0o755),
            uid: attr.uid.unwrap_or(0),
            gid: attr.gid.unwrap_or(0),
            nlink: 2,
            size: 0,
            atime: now,
            mtime: now,
            ctime: now,
            symlink_target: None,
            payload_id: None,
            idempotency_token: 0,
            children: Some(BTreeMap::new()),
        };
        let file = node.to_file();
        inner.nodes.insert(id, node);
        inner.nodes.get_mut(&dir_id).unwrap().children.as_mut().unwrap().insert(name.to_string(), id);
        Ok(file)
    }

    async fn create_symlink(
        &self,
        dir: &FileHandle,
        name: &str,
        target: &str,
        attr: &SetAttr,
    ) -> MetaResult<File> {
        let mut inner = self.inner.lock().unwrap();
        let now = Self::now();
        let dir_id = dir.fileid();
        if inner.nodes[&dir_id].children.as_ref().unwrap().contains_key(name) {
            return Err(MetaError::AlreadyExists);
        }
        let id = inner.next_id;
        inner.next_id += 1;
        let node = Node {
            id,
            parent: dir_id,
            file_type: FileType::Symlink,
            mode: attr.mode.unwrap_or(0o777),
            uid: attr.uid.unwrap_or(0),
            gid: attr.gid.unwrap_or(0),
            nlink: 1,
            size: target.len() as u64,
            atime: now,
            mtime: now,
            ctime: now,
            symlink_target: Some(target.to_string()),
            payload_id: None,
            idempotency_token: 0,
            children: None,
        };
        let file = node.to_file();
        inner.nodes.insert(id, node);
        inner.nodes.get_mut(&dir_id).unwrap().children.as_mut().unwrap().insert(name.to_string(), id);
        Ok(file)
    }

    async fn create_special(
        &self,
        _dir: &FileHandle,
        _name: &str,
        _device: Option<DeviceId>,
        _attr: &SetAttr,
    ) -> MetaResult<File> {
        Err(MetaError::NotSupported)
    }

    async fn set_file_attributes(
        &self,
        handle: &FileHandle,
        attr: &SetAttr,
        guard_ctime: Option<FileTime>,
    ) -> MetaResult<Option<File>> {
        let mut inner = self.inner.lock().unwrap();
        let now = Self::now();
        let id = handle.fileid();
        let node = inner.nodes.get_mut(&id).ok_or(MetaError::StaleHandle)?;
        if let Some(ctime) = guard_ctime {
            if node.ctime != ctime {
                return Ok(None);
            }
        }
        apply_set_attr(node, attr, now);
        Ok(Some(node.to_file()))
    }

    async fn remove(&self, dir: &FileHandle, name: &str) -> MetaResult<()> {
        let mut inner = self.inner.lock().unwrap();
        let dir_id = dir.fileid();
        let id = {
            let children = inner.nodes.get_mut(&dir_id).unwrap().children.as_mut().unwrap();
            children.remove(name).ok_or(MetaError::NotFound)?
        };
        let node = inner.nodes.get(&id).ok_or(MetaError::NotFound)?;
        if node.file_type == FileType::Directory {
            return Err(MetaError::IsDirectory);
        }
        inner.nodes.remove(&id);
        Ok(())
    }

    async fn remove_directory(&self, dir: &FileHandle, name: &str) -> MetaResult<()> {
        let mut inner = self.inner.lock().unwrap();
        let dir_id = dir.fileid();
        let id = *inner.nodes[&dir_id]
            .children
            .as_ref()
            .unwrap()
            .get(name)
            .ok_or(MetaError::NotFound)?;
        let node = inner.nodes.get(&id).ok_or(MetaError::NotFound)?;
        if node.file_type != FileType::Directory {
            return Err(MetaError::NotDirectory);
        }
        if !node.children.as_ref().unwrap().is_empty() {
            return Err(MetaError::NotEmpty);
        }
        inner.nodes.remove(&id);
        inner.nodes.get_mut(&dir_id).unwrap().children.as_mut().unwrap().remove(name);
        Ok(())
    }

    async fn rename(
        &self,
        from_dir: &FileHandle,
        old_name: &str,
        to_dir: &FileHandle,
        new_name: &str,
    ) -> MetaResult<()> {
        let mut inner = self.inner.lock().unwrap();
        let from_id = from_dir.fileid();
        let to_id = to_dir.fileid();
        let moved_id = {
            let children = inner.nodes.get_mut(&from_id).unwrap().children.as_mut().unwrap();
            children.remove(old_name).ok_or(MetaError::NotFound)?
        };
        let replaced = inner.nodes.get_mut(&to_id).unwrap().children.as_mut().unwrap().insert(
            new_name.to_string(),
            moved_id,
        );
        if let Some(replaced_id) = replaced {
            if replaced_id != moved_id {
                inner.nodes.remove(&replaced_id);
            }
        }
        inner.nodes.get_mut(&moved_id).unwrap().parent = to_id;
        Ok(())
    }

    async fn link(&self, handle: &FileHandle, dir: &FileHandle, name: &str) -> MetaResult<()> {
        let mut inner = self.inner.lock().unwrap();
        let id = handle.fileid();
        let dir_id = dir.fileid();
        if !inner.nodes.contains_key(&id) {
            return Err(MetaError::NotFound);
        }
        inner.nodes.get_mut(&dir_id).unwrap().children.as_mut().unwrap().insert(name.to_string(), id);
        inner.nodes.get_mut(&id).unwrap().nlink += 1;
        Ok(())
    }

    async fn read_directory(
        &self,
        dir: &FileHandle,
        cookie: DirectoryCookie,
        verifier: [u8; 8],
        max_entries: usize,
    ) -> MetaResult<(Vec<DirectoryEntry>, bool, [u8; 8])> {
        let inner = self.inner.lock().unwrap();
        let dir_node = inner.nodes.get(&dir.fileid()).ok_or(MetaError::StaleHandle)?;
        let current_verifier = (dir_node.mtime.seconds as u64).to_be_bytes();
        if cookie.0 != 0 && verifier != [0u8; 8] && verifier != current_verifier {
            return Err(MetaError::InvalidArgument);
        }
        let children = dir_node.children.as_ref().ok_or(MetaError::NotDirectory)?;
        let all: Vec<(u64, String, u64)> = children
            .iter()
            .enumerate()
            .map(|(idx, (name, id))| ((idx + 1) as u64, name.clone(), *id))
            .collect();
        let start = all.iter().position(|(c, _, _)| *c > cookie.0).unwrap_or(all.len());
        let mut entries = Vec::new();
        let mut eof = true;
        for (i, (c, name, id)) in all[start..].iter().enumerate() {
            if i >= max_entries {
                eof = false;
                break;
            }
            entries.push(DirectoryEntry { cookie: DirectoryCookie(*c), name: name.clone(), fileid: *id });
        }
        Ok((entries, eof, current_verifier))
    }

    async fn mark_file_as_orphaned(&self, handle: &FileHandle) -> MetaResult<()> {
        let mut inner = self.inner.lock().unwrap();
        let id = handle.fileid();
        let node = inner.nodes.get_mut(&id).ok_or(MetaError::StaleHandle)?;
        node.nlink = 0;
        Ok(())
    }

    async fn check_permissions(
        &self,
        handle: &FileHandle,
        auth: &nfs3d::auth::AuthContext,
        mask: AccessMask,
    ) -> MetaResult<AccessMask> {
        let inner = self.inner.lock().unwrap();
        inner.nodes.get(&handle.fileid()).ok_or(MetaError::StaleHandle)?;
        if auth.is_denied() {
            return Ok(AccessMask(0));
        }
        Ok(mask)
    }

    async fn prepare_write(
        &self,
        handle: &FileHandle,
        _auth: &nfs3d::auth::AuthContext,
        _new_size: u64,
    ) -> MetaResult<PrepareWriteOutcome> {
        let inner = self.inner.lock().unwrap();
        let node = inner.nodes.get(&handle.fileid()).ok_or(MetaError::StaleHandle)?;
        let payload_id = node.payload_id.clone().ok_or(MetaError::InvalidArgument)?;
        Ok(PrepareWriteOutcome { payload_id, pre_write_attrs: WccAttr::from(&node.attr()) })
    }

    async fn commit_write(
        &self,
        handle: &FileHandle,
        _payload_id: &PayloadId,
        committed_len: u64,
    ) -> MetaResult<File> {
        let mut inner = self.inner.lock().unwrap();
        let now = Self::now();
        let node = inner.nodes.get_mut(&handle.fileid()).ok_or(MetaError::StaleHandle)?;
        node.size = node.size.max(committed_len);
        node.mtime = now;
        node.ctime = now;
        Ok(node.to_file())
    }

    async fn get_filesystem_statistics(&self, _handle: &FileHandle) -> MetaResult<FsStat> {
        Ok(FsStat {
            total_bytes: 1 << 40,
            free_bytes: 1 << 39,
            available_bytes: 1 << 39,
            total_files: 1_000_000,
            free_files: 999_000,
            available_files: 999_000,
            invarsec: 0,
        })
    }

    async fn get_filesystem_capabilities(&self, _handle: &FileHandle) -> MetaResult<FsInfo> {
        Ok(FsInfo {
            read_max: 1 << 20,
            read_pref: 1 << 20,
            read_multiple: 4096,
            write_max: 1 << 20,
            write_pref: 1 << 20,
            write_multiple: 4096,
            directory_pref: 4096,
            max_file_size: u64::MAX,
            time_delta: FileTime { seconds: 1, nanos: 0 },
            properties: FsProperties(FsProperties::LINK | FsProperties::SYMLINK | FsProperties::CANSETTIME),
        })
    }

    async fn get_path_config(&self, _handle: &FileHandle) -> MetaResult<PathConfig> {
        Ok(PathConfig {
            max_link: 32000,
            max_name: 255,
            no_trunc: true,
            chown_restricted: false,
            case_insensitive: false,
            case_preserving: true,
        })
    }
}

/// An in-memory content store, with random-access reads but no
/// incremental-write capability — exercises COMMIT's ranged-`write_at`
/// fallback path (spec.md §4.5 path (b)).
pub struct FakeStore {
    objects: Mutex<std::collections::HashMap<String, Vec<u8>>>,
}

impl FakeStore {
    pub fn new() -> Arc<Self> {
        Arc::new(FakeStore { objects: Mutex::new(std::collections::HashMap::new()) })
    }
}

#[async_trait]
impl ContentStore for FakeStore {
    async fn read(&self, id: &ObjectId) -> store::Result<Vec<u8>> {
        Ok(self.objects.lock().unwrap().get(&id.0).cloned().unwrap_or_default())
    }

    async fn write_at(&self, id: &ObjectId, offset: u64, data: &[u8]) -> store::Result<()> {
        let mut objects = self.objects.lock().unwrap();
        let buf = objects.entry(id.0.clone()).or_default();
        let offset = offset as usize;
        let end = offset + data.len();
        if buf.len() < end {
            buf.resize(end, 0);
        }
        buf[offset..end].copy_from_slice(data);
        Ok(())
    }

    async fn len(&self, id: &ObjectId) -> store::Result<u64> {
        Ok(self.objects.lock().unwrap().get(&id.0).map(|b| b.len() as u64).unwrap_or(0))
    }

    async fn remove(&self, id: &ObjectId) -> store::Result<()> {
        self.objects.lock().unwrap().remove(&id.0);
        Ok(())
    }

    async fn truncate(&self, id: &ObjectId, size: u64) -> store::Result<()> {
        self.objects.lock().unwrap().entry(id.0.clone()).or_default().resize(size as usize, 0);
        Ok(())
    }
}

#[async_trait]
impl RandomReadable for FakeStore {
    async fn read_at(&self, id: &ObjectId, offset: u64, len: usize) -> store::Result<Vec<u8>> {
        let objects = self.objects.lock().unwrap();
        let buf = objects.get(&id.0).cloned().unwrap_or_default();
        let offset = (offset as usize).min(buf.len());
        let end = (offset + len).min(buf.len());
        Ok(buf[offset..end].to_vec())
    }
}

/// A fully wired [`HandlerDeps`] plus the metadata fake underneath it, for
/// tests that need to assert on metadata-service state directly in
/// addition to driving handlers.
pub struct Fixture {
    pub metadata: Arc<FakeMetadata>,
    pub deps: HandlerDeps,
    pub flush_locks: FlushLocks,
}

impl Fixture {
    pub fn new() -> Self {
        Self::with_share(Share {
            name: "export".into(),
            read_only: false,
            default_permission: Permission::Write,
            prefetch: PrefetchConfig::default(),
            squash_rule: "none".into(),
        })
    }

    pub fn with_share(share: Share) -> Self {
        let metadata = FakeMetadata::new();
        let store = ContentStoreHandle::with_random_read(FakeStore::new());
        let auth_cache = Arc::new(AuthCache::new(Arc::new(StaticRegistry::new()), 1024, Duration::from_secs(60)));
        let deps = HandlerDeps {
            metadata: metadata.clone(),
            store,
            cache: PayloadCache::new(),
            auth_cache,
            share,
        };
        Fixture { metadata, deps, flush_locks: FlushLocks::new() }
    }

    pub fn root(&self) -> FileHandle {
        self.metadata.root_handle()
    }

    pub fn ctx(&self) -> HandlerContext {
        HandlerContext {
            cancellation: CancellationToken::never(),
            client_addr: "127.0.0.1:1".parse::<SocketAddr>().unwrap(),
            share_name: self.deps.share.name.clone(),
            auth_method: AuthMethod::Unix,
            credential: RawCredential { uid: 1000, gid: 1000, groups: vec![] },
        }
    }
}

pub fn default_attr() -> SetAttr {
    SetAttr::default()
}

pub fn attr_with_mode(mode: u32) -> SetAttr {
    SetAttr { mode: Some(mode), ..SetAttr::default() }
}
