//! CREATE (RFC 1813 §3.3.8). Three creation modes (spec.md §4.6 CREATE
//! contract): `Unchecked` truncates/reuses an existing file, `Guarded`
//! fails if the name exists, `Exclusive` compares a client verifier
//! against a stored idempotency token to detect a retried request.

use crate::context::HandlerContext;
use crate::nfs3::types::{CreateMode, FileAttr, FileHandle, WccData};
use crate::nfs3::NfsStat;
use crate::validate;

use super::{wcc_before, HandlerDeps};

pub struct Args {
    pub dir: FileHandle,
    pub name: String,
    pub mode: CreateMode,
}

pub struct Response {
    pub status: NfsStat,
    pub file: Option<FileHandle>,
    pub attr: Option<FileAttr>,
    pub dir_wcc: WccData,
}

impl Response {
    fn fail(status: NfsStat, dir_wcc: WccData) -> Self {
        Response { status, file: None, attr: None, dir_wcc }
    }
}

pub async fn create(deps: &HandlerDeps, ctx: &HandlerContext, args: Args) -> Response {
    if ctx.is_cancelled() {
        return Response::fail(NfsStat::Io, WccData::none());
    }
    if let Err(status) = validate::validate_handle(&args.dir) {
        return Response::fail(status, WccData::none());
    }
    if let Err(status) = validate::validate_name(&args.name, false) {
        return Response::fail(status, WccData::none());
    }

    let dir_before = match deps.metadata.get_file(&args.dir).await {
        Ok(f) => f,
        Err(e) => return Response::fail(e.into_status(), WccData::none()),
    };
    let before = wcc_before(&dir_before);

    let auth = deps.authorize(ctx);
    if auth.is_denied() || deps.share.is_read_only_for(auth.permission) {
        return Response::fail(NfsStat::Access, WccData { before: Some(before), after: None });
    }

    let (attr, policy, exclusive_verifier) = match &args.mode {
        // Unchecked must truncate an existing name to `attrs.size` or 0
        // (spec.md §4.6 CREATE contract) even when the caller's `SetAttr`
        // left `size` unspecified — unlike SETATTR, where an absent field
        // means "leave unchanged", a missing size here has a defined
        // default that the metadata service must apply unconditionally.
        CreateMode::Unchecked(attr) => {
            let mut attr = attr.clone();
            attr.size = Some(attr.size.unwrap_or(0));
            (attr, crate::metadata::ExistsPolicy::Unchecked, None)
        }
        CreateMode::Guarded(attr) => (attr.clone(), crate::metadata::ExistsPolicy::Guarded, None),
        CreateMode::Exclusive(verifier) => {
            (crate::nfs3::types::SetAttr::default(), crate::metadata::ExistsPolicy::Unchecked, Some(*verifier))
        }
    };

    let result = deps
        .metadata
        .create_file(&args.dir, &args.name, &attr, policy, exclusive_verifier)
        .await;

    match result {
        Ok(file) => {
            let dir_after = deps.post_op_attr(&args.dir).await;
            Response {
                status: NfsStat::Ok,
                file: Some(file.handle),
                attr: Some(file.attr),
                dir_wcc: WccData { before: Some(before), after: dir_after },
            }
        }
        Err(e) => {
            let dir_after = deps.post_op_attr(&args.dir).await;
            Response::fail(e.into_status(), WccData { before: Some(before), after: dir_after })
        }
    }
}
