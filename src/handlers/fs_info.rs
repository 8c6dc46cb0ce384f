//! FSINFO (RFC 1813 §3.3.19): static filesystem capabilities, including
//! the `max_write_size` the WRITE path validates client-declared counts
//! against.

use crate::context::HandlerContext;
use crate::nfs3::types::{FileAttr, FileHandle, FsInfo};
use crate::nfs3::NfsStat;
use crate::validate;

use super::HandlerDeps;

pub struct Args {
    pub file: FileHandle,
}

pub struct Response {
    pub status: NfsStat,
    pub attr: Option<FileAttr>,
    pub info: Option<FsInfo>,
}

pub async fn fs_info(deps: &HandlerDeps, ctx: &HandlerContext, args: Args) -> Response {
    if ctx.is_cancelled() {
        return Response { status: NfsStat::Io, attr: None, info: None };
    }
    if let Err(status) = validate::validate_handle(&args.file) {
        return Response { status, attr: None, info: None };
    }

    let file = match deps.metadata.get_file(&args.file).await {
        Ok(f) => f,
        Err(e) => return Response { status: e.into_status(), attr: None, info: None },
    };

    match deps.metadata.get_filesystem_capabilities(&args.file).await {
        Ok(info) => Response { status: NfsStat::Ok, attr: Some(file.attr), info: Some(info) },
        Err(e) => Response { status: e.into_status(), attr: Some(file.attr), info: None },
    }
}
