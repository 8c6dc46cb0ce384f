//! Procedure handlers (spec.md §4.6): one module per RFC 1813 procedure,
//! each exposing `op(deps, ctx, args) -> Response` with status embedded in
//! the response rather than the `Result` channel — a handler only ever
//! returns `Err` to propagate context cancellation up through the stack
//! (spec.md §7, "returning an error from a handler is reserved for
//! client-disconnect propagation").
//!
//! Every handler follows the same skeleton: cancel-check, validate,
//! resolve, capture WCC-before, build the auth context, delegate to the
//! metadata/content/cache layer, capture WCC-after. The helpers in this
//! module implement the steps common to all of them; each procedure file
//! implements only its own business step.

pub mod access;
pub mod commit;
pub mod create;
pub mod fs_info;
pub mod fs_stat;
pub mod get_attr;
pub mod link;
pub mod lookup;
pub mod mk_dir;
pub mod mk_node;
pub mod null;
pub mod path_conf;
pub mod read;
pub mod read_dir;
pub mod read_dir_plus;
pub mod read_link;
pub mod remove;
pub mod rename;
pub mod rm_dir;
pub mod set_attr;
pub mod symlink;
pub mod write;

use std::sync::Arc;

use crate::auth::cache::AuthCache;
use crate::auth::{AnonymousIdentity, AuthContext, SquashRule};
use crate::cache::PayloadCache;
use crate::context::HandlerContext;
use crate::metadata::{self, MetadataService};
use crate::nfs3::types::{FileAttr, FileHandle, WccAttr, WccData};
use crate::nfs3::NfsStat;
use crate::share::Share;
use crate::store::ContentStoreHandle;

/// Cancellation is propagated as a handler-level `Err`; the only thing a
/// caller does with it is short-circuit straight to a status-`IO`
/// response (spec.md §4.6 step 1, §7).
pub struct Cancelled;

/// Collaborators every handler needs: the metadata service, the content
/// store (with probed optional capabilities), the share's payload cache,
/// the process-wide auth-context cache, and the share's own policy.
#[derive(Clone)]
pub struct HandlerDeps {
    pub metadata: Arc<dyn MetadataService>,
    pub store: ContentStoreHandle,
    pub cache: PayloadCache,
    pub auth_cache: Arc<AuthCache>,
    pub share: Share,
}

impl HandlerDeps {
    /// Step 1: cancel-check. Every handler calls this before doing
    /// anything else, and again before each suspension point named in
    /// spec.md §5.
    pub fn check_cancelled(&self, ctx: &HandlerContext) -> Result<(), Cancelled> {
        if ctx.is_cancelled() {
            Err(Cancelled)
        } else {
            Ok(())
        }
    }

    /// Step 5: builds the effective auth context for this request,
    /// through the shared memoizing cache (spec.md §4.3).
    pub fn authorize(&self, ctx: &HandlerContext) -> AuthContext {
        let squash = SquashRule::parse(&self.share.squash_rule).unwrap_or(SquashRule::RootSquash);
        self.auth_cache.get_or_build(
            &self.share,
            ctx.credential.uid,
            ctx.credential.gid,
            &ctx.credential.groups,
            squash,
            AnonymousIdentity::default(),
        )
    }

    /// Step 7 (post-op half): best-effort re-fetch of a handle's
    /// attributes for the `after` half of a WCC response. A failure here
    /// (e.g. the file vanished between the business step and this call)
    /// degrades to `None` rather than failing the whole response — the
    /// WCC data's `after` field is optional for exactly this reason
    /// (spec.md §3).
    pub async fn post_op_attr(&self, handle: &FileHandle) -> Option<FileAttr> {
        self.metadata.get_file(handle).await.ok().map(|f| f.attr)
    }
}

/// Builds a `wcc_attr` pre-op digest from a resolved file, for handlers
/// that capture WCC-before (spec.md §4.6 step 4).
pub fn wcc_before(file: &metadata::File) -> WccAttr {
    WccAttr::from(&file.attr)
}

/// The response every mutating handler falls back to when cancellation
/// fires before the business step runs: `IO` status with whatever
/// WCC-before was already captured (spec.md §4.6 step 1 / §5).
pub fn cancelled_wcc_response(before: Option<WccAttr>) -> (NfsStat, WccData) {
    (NfsStat::Io, WccData { before, after: None })
}

/// Maps a validation/resolution failure that occurs before a WCC-before
/// snapshot exists.
pub fn cancelled_response() -> NfsStat {
    NfsStat::Io
}
