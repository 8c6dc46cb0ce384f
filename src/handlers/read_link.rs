//! READLINK (RFC 1813 §3.3.5): return a symbolic link's target.

use crate::context::HandlerContext;
use crate::nfs3::types::{FileAttr, FileHandle};
use crate::nfs3::NfsStat;
use crate::validate;

use super::HandlerDeps;

pub struct Args {
    pub file: FileHandle,
}

pub struct Response {
    pub status: NfsStat,
    pub target: Option<String>,
    pub attr: Option<FileAttr>,
}

pub async fn read_link(deps: &HandlerDeps, ctx: &HandlerContext, args: Args) -> Response {
    if ctx.is_cancelled() {
        return Response { status: NfsStat::Io, target: None, attr: None };
    }
    if let Err(status) = validate::validate_handle(&args.file) {
        return Response { status, target: None, attr: None };
    }

    match deps.metadata.get_file(&args.file).await {
        Ok(file) => match file.symlink_target {
            Some(target) => Response { status: NfsStat::Ok, target: Some(target), attr: Some(file.attr) },
            None => Response { status: NfsStat::Inval, target: None, attr: Some(file.attr) },
        },
        Err(e) => Response { status: e.into_status(), target: None, attr: None },
    }
}
