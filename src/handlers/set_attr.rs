//! SETATTR (RFC 1813 §3.3.2): change an object's attributes, optionally
//! guarded against a concurrent modification via `sattrguard3`.

use crate::context::HandlerContext;
use crate::nfs3::types::{FileHandle, FileTime, SetAttr, WccData};
use crate::nfs3::NfsStat;
use crate::validate;

use super::{wcc_before, HandlerDeps};

pub struct Args {
    pub file: FileHandle,
    pub attr: SetAttr,
    pub guard_ctime: Option<FileTime>,
}

pub struct Response {
    pub status: NfsStat,
    pub wcc: WccData,
}

pub async fn set_attr(deps: &HandlerDeps, ctx: &HandlerContext, args: Args) -> Response {
    if ctx.is_cancelled() {
        return Response { status: NfsStat::Io, wcc: WccData::none() };
    }
    if let Err(status) = validate::validate_handle(&args.file) {
        return Response { status, wcc: WccData::none() };
    }

    let before_file = match deps.metadata.get_file(&args.file).await {
        Ok(f) => f,
        Err(e) => return Response { status: e.into_status(), wcc: WccData::none() },
    };
    let before = wcc_before(&before_file);

    if ctx.is_cancelled() {
        return Response { status: NfsStat::Io, wcc: WccData { before: Some(before), after: None } };
    }

    let auth = deps.authorize(ctx);
    if auth.is_denied() {
        return Response { status: NfsStat::Io, wcc: WccData { before: Some(before), after: None } };
    }

    match deps.metadata.set_file_attributes(&args.file, &args.attr, args.guard_ctime).await {
        Ok(Some(file)) => Response {
            status: NfsStat::Ok,
            wcc: WccData { before: Some(before), after: Some(file.attr) },
        },
        Ok(None) => Response {
            status: NfsStat::NotSync,
            wcc: WccData { before: Some(before), after: None },
        },
        Err(e) => Response {
            status: e.into_status(),
            wcc: WccData { before: Some(before), after: None },
        },
    }
}
