//! READ (RFC 1813 §3.3.6). Resolution order per spec.md §4.6: serve from
//! the payload cache when one exists for this file; otherwise read
//! through to the content store directly, chunking large reads so
//! cancellation can be observed mid-flight, and opportunistically kick
//! off a background prefetch for the share's benefit on the next read.

use crate::context::HandlerContext;
use crate::nfs3::types::{FileAttr, FileHandle};
use crate::nfs3::NfsStat;
use crate::validate;

use super::HandlerDeps;

/// Reads larger than this are split into chunks between cancel checks
/// (spec.md §4.6 READ step 2, §5 "every 64-256 KiB").
const CHUNK_SIZE: usize = 256 * 1024;
const LARGE_READ_THRESHOLD: usize = 1024 * 1024;

pub struct Args {
    pub file: FileHandle,
    pub offset: u64,
    pub count: u32,
}

pub struct Response {
    pub status: NfsStat,
    pub data: Vec<u8>,
    pub eof: bool,
    pub attr: Option<FileAttr>,
}

impl Response {
    fn fail(status: NfsStat, attr: Option<FileAttr>) -> Self {
        Response { status, data: Vec::new(), eof: false, attr }
    }
}

pub async fn read(deps: &HandlerDeps, ctx: &HandlerContext, args: Args) -> Response {
    if ctx.is_cancelled() {
        return Response::fail(NfsStat::Io, None);
    }
    if let Err(status) = validate::validate_handle(&args.file) {
        return Response::fail(status, None);
    }
    let end = match validate::validate_offset_count(args.offset, args.count as u64) {
        Ok(e) => e,
        Err(status) => return Response::fail(status, None),
    };
    let _ = end;

    let file = match deps.metadata.get_file(&args.file).await {
        Ok(f) => f,
        Err(e) => return Response::fail(e.into_status(), None),
    };

    let size = file.attr.size;
    if file.attr.size == 0 || args.offset >= size {
        return Response { status: NfsStat::Ok, data: Vec::new(), eof: true, attr: Some(file.attr) };
    }

    let Some(payload_id) = file.payload_id.clone() else {
        return Response::fail(NfsStat::ServerFault, Some(file.attr));
    };
    let count = (args.count as u64).min(size - args.offset) as usize;

    if ctx.is_cancelled() {
        return Response::fail(NfsStat::Io, Some(file.attr));
    }

    let data = match deps.cache.state(&payload_id) {
        crate::cache::State::None => {
            let result = read_through_store(deps, ctx, &payload_id, args.offset, count).await;
            if deps.share.prefetch.enabled && size <= deps.share.prefetch.max_file_size {
                try_start_prefetch(deps, &payload_id, size);
            }
            match result {
                Ok(bytes) => bytes,
                Err(()) => return Response::fail(NfsStat::Io, Some(file.attr)),
            }
        }
        crate::cache::State::Prefetching => {
            let required = args.offset + count as u64;
            if deps.cache.wait_for_prefetch_offset(&payload_id, required, &ctx.cancellation).await.is_err() {
                return Response::fail(NfsStat::Io, Some(file.attr));
            }
            read_from_cache(deps, &payload_id, args.offset, count)
        }
        _ => read_from_cache(deps, &payload_id, args.offset, count),
    };

    let eof = args.offset + data.len() as u64 >= size;
    Response { status: NfsStat::Ok, data, eof, attr: Some(file.attr) }
}

fn read_from_cache(deps: &HandlerDeps, payload_id: &crate::metadata::PayloadId, offset: u64, count: usize) -> Vec<u8> {
    let mut buf = vec![0u8; count];
    let n = deps.cache.read_at(payload_id, &mut buf, offset);
    buf.truncate(n);
    buf
}

async fn read_through_store(
    deps: &HandlerDeps,
    ctx: &HandlerContext,
    payload_id: &crate::metadata::PayloadId,
    offset: u64,
    count: usize,
) -> Result<Vec<u8>, ()> {
    let id = crate::store::ObjectId(payload_id.0.clone());
    if let Some(random_read) = &deps.store.random_read {
        if count <= LARGE_READ_THRESHOLD {
            return random_read.read_at(&id, offset, count).await.map_err(|_| ());
        }
        let mut out = Vec::with_capacity(count);
        let mut remaining = count;
        let mut pos = offset;
        while remaining > 0 {
            if ctx.is_cancelled() {
                return Err(());
            }
            let chunk = remaining.min(CHUNK_SIZE);
            let bytes = random_read.read_at(&id, pos, chunk).await.map_err(|_| ())?;
            let got = bytes.len();
            out.extend_from_slice(&bytes);
            pos += got as u64;
            remaining -= got;
            if got < chunk {
                break;
            }
        }
        return Ok(out);
    }

    // No random-access capability: read the whole object and slice.
    let whole = deps.store.base.read(&id).await.map_err(|_| ())?;
    let start = (offset as usize).min(whole.len());
    let end = (start + count).min(whole.len());
    Ok(whole[start..end].to_vec())
}

fn try_start_prefetch(deps: &HandlerDeps, payload_id: &crate::metadata::PayloadId, file_size: u64) {
    if !deps.cache.start_prefetch(payload_id, file_size) {
        return;
    }
    let deps = deps.clone();
    let payload_id = payload_id.clone();
    // Prefetch runs detached with its own never-cancelling context
    // (spec.md §5 "a short-lived request's cancellation cannot abort
    // cache warming").
    tokio::spawn(async move {
        let id = crate::store::ObjectId(payload_id.0.clone());
        let success = match deps.store.base.read(&id).await {
            Ok(bytes) => {
                deps.cache.write_at(&payload_id, &bytes, 0);
                deps.cache.set_prefetched_offset(&payload_id, bytes.len() as u64);
                true
            }
            Err(_) => false,
        };
        deps.cache.complete_prefetch(&payload_id, success);
    });
}
