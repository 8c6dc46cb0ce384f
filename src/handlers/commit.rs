//! COMMIT (RFC 1813 §3.3.21). Flushes the payload cache for a file: if
//! there's nothing dirty, succeeds immediately (idempotent no-op); else
//! prefers the content store's incremental-write path, falling back to a
//! plain ranged `write_at` (spec.md §4.6 COMMIT contract).
//!
//! A per-file-id mutex serializes flush finalization for content stores
//! that cannot internally coordinate concurrent multipart uploads
//! (spec.md §5 "shared resources").

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::Mutex;

use crate::context::HandlerContext;
use crate::nfs3::types::{FileAttr, FileHandle, WccAttr, WriteVerifier};
use crate::nfs3::NfsStat;
use crate::validate;
use crate::verifier::write_verifier;

use super::HandlerDeps;

/// Guards against two COMMITs for the same file racing on flush
/// finalization. Keyed by `fileid` rather than by payload id since it's
/// sized to the metadata handle's identity, not the store's.
#[derive(Clone, Default)]
pub struct FlushLocks {
    locks: Arc<DashMap<u64, Arc<Mutex<()>>>>,
}

impl FlushLocks {
    pub fn new() -> Self {
        FlushLocks::default()
    }

    fn lock_for(&self, fileid: u64) -> Arc<Mutex<()>> {
        self.locks.entry(fileid).or_insert_with(|| Arc::new(Mutex::new(()))).clone()
    }
}

pub struct Args {
    pub file: FileHandle,
}

pub struct Response {
    pub status: NfsStat,
    pub wcc_before: Option<WccAttr>,
    pub attr_after: Option<FileAttr>,
    pub verifier: WriteVerifier,
}

impl Response {
    fn fail(status: NfsStat, before: Option<WccAttr>) -> Self {
        Response { status, wcc_before: before, attr_after: None, verifier: write_verifier() }
    }
}

pub async fn commit(
    deps: &HandlerDeps,
    flush_locks: &FlushLocks,
    ctx: &HandlerContext,
    args: Args,
) -> Response {
    if ctx.is_cancelled() {
        return Response::fail(NfsStat::Io, None);
    }
    if let Err(status) = validate::validate_handle(&args.file) {
        return Response::fail(status, None);
    }

    let file = match deps.metadata.get_file(&args.file).await {
        Ok(f) => f,
        Err(e) => return Response::fail(e.into_status(), None),
    };
    let before = Some(WccAttr::from(&file.attr));

    let Some(payload_id) = file.payload_id.clone() else {
        return Response { status: NfsStat::Ok, wcc_before: before, attr_after: Some(file.attr), verifier: write_verifier() };
    };

    if !deps.cache.state(&payload_id).is_flushable() {
        return Response { status: NfsStat::Ok, wcc_before: before, attr_after: Some(file.attr), verifier: write_verifier() };
    }

    let lock = flush_locks.lock_for(file.attr.fileid);
    let _guard = lock.lock().await;

    if ctx.is_cancelled() {
        return Response::fail(NfsStat::Io, before);
    }

    let committed_len = flush_payload(deps, &payload_id).await;
    let committed_len = match committed_len {
        Ok(len) => len,
        Err(()) => return Response::fail(NfsStat::Io, before),
    };

    match deps.metadata.commit_write(&args.file, &payload_id, committed_len).await {
        Ok(after) => Response {
            status: NfsStat::Ok,
            wcc_before: before,
            attr_after: Some(after.attr),
            verifier: write_verifier(),
        },
        Err(e) => Response::fail(e.into_status(), before),
    }
}

async fn flush_payload(deps: &HandlerDeps, payload_id: &crate::metadata::PayloadId) -> Result<u64, ()> {
    let cached_size = deps.cache.size(payload_id);
    let id = crate::store::ObjectId(payload_id.0.clone());

    if let Some(incremental) = &deps.store.incremental_write {
        deps.cache.set_state(payload_id, crate::cache::State::Uploading);
        let upload = incremental.begin_incremental(&id).await.map_err(|_| ())?;
        let flushed = deps.cache.flushed_offset(payload_id);
        if cached_size > flushed {
            let mut buf = vec![0u8; (cached_size - flushed) as usize];
            deps.cache.read_at(payload_id, &mut buf, flushed);
            incremental.flush_incremental(&upload, flushed, &buf).await.map_err(|_| ())?;
            deps.cache.set_flushed_offset(payload_id, cached_size);
        }
        incremental.complete_incremental(upload).await.map_err(|_| ())?;
        deps.cache.set_state(payload_id, crate::cache::State::Cached);
        return Ok(cached_size);
    }

    let flushed = deps.cache.flushed_offset(payload_id);
    if cached_size > flushed {
        let mut buf = vec![0u8; (cached_size - flushed) as usize];
        deps.cache.read_at(payload_id, &mut buf, flushed);
        deps.store.base.write_at(&id, flushed, &buf).await.map_err(|_| ())?;
        deps.cache.set_flushed_offset(payload_id, cached_size);
    }
    deps.cache.set_state(payload_id, crate::cache::State::Cached);
    Ok(cached_size)
}
