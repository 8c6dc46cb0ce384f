//! RENAME (RFC 1813 §3.3.14). Special rule (spec.md §4.6): a destination
//! name starting with `.nfs` is the client's silly-rename convention for
//! deleting a file that remains open elsewhere, so the moved object is
//! marked orphaned (nlink=0) immediately after the move.

use crate::context::HandlerContext;
use crate::nfs3::types::{FileHandle, WccData};
use crate::nfs3::NfsStat;
use crate::validate;

use super::HandlerDeps;

pub struct Args {
    pub from_dir: FileHandle,
    pub from_name: String,
    pub to_dir: FileHandle,
    pub to_name: String,
}

pub struct Response {
    pub status: NfsStat,
    pub from_dir_wcc: WccData,
    pub to_dir_wcc: WccData,
}

impl Response {
    fn fail(status: NfsStat, from: WccData, to: WccData) -> Self {
        Response { status, from_dir_wcc: from, to_dir_wcc: to }
    }
}

pub async fn rename(deps: &HandlerDeps, ctx: &HandlerContext, args: Args) -> Response {
    if ctx.is_cancelled() {
        return Response::fail(NfsStat::Io, WccData::none(), WccData::none());
    }
    if let Err(status) = validate::validate_handle(&args.from_dir) {
        return Response::fail(status, WccData::none(), WccData::none());
    }
    if let Err(status) = validate::validate_handle(&args.to_dir) {
        return Response::fail(status, WccData::none(), WccData::none());
    }
    if let Err(status) = validate::validate_name(&args.from_name, false) {
        return Response::fail(status, WccData::none(), WccData::none());
    }
    if let Err(status) = validate::validate_name(&args.to_name, false) {
        return Response::fail(status, WccData::none(), WccData::none());
    }

    let from_before_file = match deps.metadata.get_file(&args.from_dir).await {
        Ok(f) => f,
        Err(e) => return Response::fail(e.into_status(), WccData::none(), WccData::none()),
    };
    let to_before_file = match deps.metadata.get_file(&args.to_dir).await {
        Ok(f) => f,
        Err(e) => {
            let from_before = Some(super::wcc_before(&from_before_file));
            return Response::fail(e.into_status(), WccData { before: from_before, after: None }, WccData::none());
        }
    };
    let from_before = Some(super::wcc_before(&from_before_file));
    let to_before = Some(super::wcc_before(&to_before_file));

    if from_before_file.attr.file_type != crate::nfs3::types::FileType::Directory
        || to_before_file.attr.file_type != crate::nfs3::types::FileType::Directory
    {
        return Response::fail(
            NfsStat::NotDir,
            WccData { before: from_before, after: None },
            WccData { before: to_before, after: None },
        );
    }

    let auth = deps.authorize(ctx);
    if auth.is_denied() || deps.share.is_read_only_for(auth.permission) {
        return Response::fail(
            NfsStat::Access,
            WccData { before: from_before, after: None },
            WccData { before: to_before, after: None },
        );
    }

    let result = deps
        .metadata
        .rename(&args.from_dir, &args.from_name, &args.to_dir, &args.to_name)
        .await;

    let status = match result {
        Ok(()) => {
            if args.to_name.starts_with(".nfs") {
                if let Ok(Some(moved)) = deps.metadata.get_child(&args.to_dir, &args.to_name).await {
                    let _ = deps.metadata.mark_file_as_orphaned(&moved.handle).await;
                }
            }
            NfsStat::Ok
        }
        Err(e) => e.into_status(),
    };

    let from_after = deps.post_op_attr(&args.from_dir).await;
    let to_after = deps.post_op_attr(&args.to_dir).await;
    Response {
        status,
        from_dir_wcc: WccData { before: from_before, after: from_after },
        to_dir_wcc: WccData { before: to_before, after: to_after },
    }
}
