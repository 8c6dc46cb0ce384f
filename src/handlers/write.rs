//! WRITE (RFC 1813 §3.3.7). `metadata.prepare_write` validates permission
//! and space ahead of any bytes landing; persistence then goes through the
//! payload cache when the share has one, else straight to the content
//! store; `metadata.commit_write` finalizes size/timestamp bookkeeping
//! (spec.md §4.6 WRITE contract). A write that is the first to touch a
//! payload in this process warms the cache with whatever is already
//! durable in the content store before splicing the new bytes in, so a
//! write at a nonzero offset (or one shorter than the file) can't shadow
//! real content with the cache's own zero-fill.

use crate::context::HandlerContext;
use crate::nfs3::types::{FileAttr, FileHandle, StableHow, WriteVerifier};
use crate::nfs3::NfsStat;
use crate::validate;
use crate::verifier::write_verifier;

use super::HandlerDeps;

pub struct Args {
    pub file: FileHandle,
    pub offset: u64,
    pub stable: StableHow,
    pub data: bytes::Bytes,
}

pub struct Response {
    pub status: NfsStat,
    pub wcc_before: Option<crate::nfs3::types::WccAttr>,
    pub attr_after: Option<FileAttr>,
    pub count: u32,
    pub committed: StableHow,
    pub verifier: WriteVerifier,
}

impl Response {
    fn fail(status: NfsStat, before: Option<crate::nfs3::types::WccAttr>) -> Self {
        Response {
            status,
            wcc_before: before,
            attr_after: None,
            count: 0,
            committed: StableHow::Unstable,
            verifier: write_verifier(),
        }
    }
}

pub async fn write(deps: &HandlerDeps, ctx: &HandlerContext, args: Args) -> Response {
    if ctx.is_cancelled() {
        return Response::fail(NfsStat::Io, None);
    }
    if let Err(status) = validate::validate_handle(&args.file) {
        return Response::fail(status, None);
    }
    let new_size = match validate::validate_offset_count(args.offset, args.data.len() as u64) {
        Ok(v) => v,
        Err(status) => return Response::fail(status, None),
    };

    let file = match deps.metadata.get_file(&args.file).await {
        Ok(f) => f,
        Err(e) => return Response::fail(e.into_status(), None),
    };
    if file.attr.file_type != crate::nfs3::types::FileType::Regular {
        return Response::fail(NfsStat::IsDir, None);
    }

    let auth = deps.authorize(ctx);
    if auth.is_denied() || deps.share.is_read_only_for(auth.permission) {
        return Response::fail(NfsStat::Access, None);
    }

    let outcome = match deps.metadata.prepare_write(&args.file, &auth, new_size).await {
        Ok(o) => o,
        Err(e) => return Response::fail(e.into_status(), None),
    };
    let before = Some(outcome.pre_write_attrs);

    if ctx.is_cancelled() {
        return Response::fail(NfsStat::Io, before);
    }

    let pre_write_size = outcome.pre_write_attrs.size;
    if deps.cache.state(&outcome.payload_id) == crate::cache::State::None && pre_write_size > 0 {
        if warm_new_entry(deps, &outcome.payload_id, pre_write_size).await.is_err() {
            return Response::fail(NfsStat::Io, before);
        }
    }

    deps.cache.write_at(&outcome.payload_id, &args.data, args.offset);

    let committed = StableHow::Unstable;

    match deps.metadata.commit_write(&args.file, &outcome.payload_id, new_size).await {
        Ok(after) => Response {
            status: NfsStat::Ok,
            wcc_before: before,
            attr_after: Some(after.attr),
            count: args.data.len() as u32,
            committed,
            verifier: write_verifier(),
        },
        Err(e) => Response::fail(e.into_status(), before),
    }
}

/// A WRITE that is the first thing to touch `payload_id` in this process
/// must not let the cache's lazy creation stand in for content that is
/// already durable in the content store: once `write_at` moves the entry
/// out of `None`, every subsequent READ is served from the cache alone
/// (spec.md §4.6 READ resolution order, §4.4 state table), so any
/// pre-existing byte this call doesn't copy in first would read back as
/// zero forever. Mirrors the warm-up `read.rs`'s `try_start_prefetch`
/// performs on the read path, minus the detached task — this one must
/// finish before the write it's guarding becomes visible to a reader.
async fn warm_new_entry(deps: &HandlerDeps, payload_id: &crate::metadata::PayloadId, size: u64) -> Result<(), ()> {
    let id = crate::store::ObjectId(payload_id.0.clone());
    let existing = if let Some(random_read) = &deps.store.random_read {
        random_read.read_at(&id, 0, size as usize).await
    } else {
        deps.store.base.read(&id).await
    };
    let bytes = existing.map_err(|_| ())?;
    deps.cache.write_at(payload_id, &bytes, 0);
    Ok(())
}
