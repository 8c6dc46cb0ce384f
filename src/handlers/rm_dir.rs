//! RMDIR (RFC 1813 §3.3.13). Fails `NotEmpty` if the directory still
//! contains any entry besides `.`/`..` — enforced by the metadata service,
//! not here (spec.md §4.6 REMOVE/RMDIR contract).

use crate::context::HandlerContext;
use crate::nfs3::types::{FileHandle, WccData};
use crate::nfs3::NfsStat;
use crate::validate;

use super::{wcc_before, HandlerDeps};

pub struct Args {
    pub dir: FileHandle,
    pub name: String,
}

pub struct Response {
    pub status: NfsStat,
    pub dir_wcc: WccData,
}

pub async fn rm_dir(deps: &HandlerDeps, ctx: &HandlerContext, args: Args) -> Response {
    if ctx.is_cancelled() {
        return Response { status: NfsStat::Io, dir_wcc: WccData::none() };
    }
    if let Err(status) = validate::validate_handle(&args.dir) {
        return Response { status, dir_wcc: WccData::none() };
    }
    if let Err(status) = validate::validate_name(&args.name, false) {
        return Response { status, dir_wcc: WccData::none() };
    }

    let dir_before = match deps.metadata.get_file(&args.dir).await {
        Ok(f) => f,
        Err(e) => return Response { status: e.into_status(), dir_wcc: WccData::none() },
    };
    let before = wcc_before(&dir_before);

    let auth = deps.authorize(ctx);
    if auth.is_denied() || deps.share.is_read_only_for(auth.permission) {
        return Response { status: NfsStat::Access, dir_wcc: WccData { before: Some(before), after: None } };
    }

    let status = match deps.metadata.remove_directory(&args.dir, &args.name).await {
        Ok(()) => NfsStat::Ok,
        Err(e) => e.into_status(),
    };
    let dir_after = deps.post_op_attr(&args.dir).await;
    Response { status, dir_wcc: WccData { before: Some(before), after: dir_after } }
}
