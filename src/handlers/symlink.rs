//! SYMLINK (RFC 1813 §3.3.10).

use crate::context::HandlerContext;
use crate::nfs3::types::{FileAttr, FileHandle, SetAttr, WccData};
use crate::nfs3::NfsStat;
use crate::validate;

use super::{wcc_before, HandlerDeps};

pub struct Args {
    pub dir: FileHandle,
    pub name: String,
    pub target: String,
    pub attr: SetAttr,
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

pub async fn symlink(deps: &HandlerDeps, ctx: &HandlerContext, args: Args) -> Response {
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

    match deps.metadata.create_symlink(&args.dir, &args.name, &args.target, &args.attr).await {
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
