//! LINK (RFC 1813 §3.3.15): create an additional hard link.

use crate::context::HandlerContext;
use crate::nfs3::types::{FileAttr, FileHandle, WccData};
use crate::nfs3::NfsStat;
use crate::validate;

use super::HandlerDeps;

pub struct Args {
    pub file: FileHandle,
    pub link_dir: FileHandle,
    pub link_name: String,
}

pub struct Response {
    pub status: NfsStat,
    pub attr: Option<FileAttr>,
    pub dir_wcc: WccData,
}

impl Response {
    fn fail(status: NfsStat, dir_wcc: WccData) -> Self {
        Response { status, attr: None, dir_wcc }
    }
}

pub async fn link(deps: &HandlerDeps, ctx: &HandlerContext, args: Args) -> Response {
    if ctx.is_cancelled() {
        return Response::fail(NfsStat::Io, WccData::none());
    }
    if let Err(status) = validate::validate_handle(&args.file) {
        return Response::fail(status, WccData::none());
    }
    if let Err(status) = validate::validate_handle(&args.link_dir) {
        return Response::fail(status, WccData::none());
    }
    if let Err(status) = validate::validate_name(&args.link_name, false) {
        return Response::fail(status, WccData::none());
    }

    let dir_before_file = match deps.metadata.get_file(&args.link_dir).await {
        Ok(f) => f,
        Err(e) => return Response::fail(e.into_status(), WccData::none()),
    };
    let before = super::wcc_before(&dir_before_file);

    let auth = deps.authorize(ctx);
    if auth.is_denied() || deps.share.is_read_only_for(auth.permission) {
        return Response::fail(NfsStat::Access, WccData { before: Some(before), after: None });
    }

    let status = match deps.metadata.link(&args.file, &args.link_dir, &args.link_name).await {
        Ok(()) => NfsStat::Ok,
        Err(e) => e.into_status(),
    };
    let attr = deps.post_op_attr(&args.file).await;
    let dir_after = deps.post_op_attr(&args.link_dir).await;
    Response { status, attr, dir_wcc: WccData { before: Some(before), after: dir_after } }
}
