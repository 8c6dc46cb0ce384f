//! FSSTAT (RFC 1813 §3.3.18): dynamic filesystem statistics.

use crate::context::HandlerContext;
use crate::nfs3::types::{FileAttr, FileHandle, FsStat};
use crate::nfs3::NfsStat;
use crate::validate;

use super::HandlerDeps;

pub struct Args {
    pub file: FileHandle,
}

pub struct Response {
    pub status: NfsStat,
    pub attr: Option<FileAttr>,
    pub stat: Option<FsStat>,
}

pub async fn fs_stat(deps: &HandlerDeps, ctx: &HandlerContext, args: Args) -> Response {
    if ctx.is_cancelled() {
        return Response { status: NfsStat::Io, attr: None, stat: None };
    }
    if let Err(status) = validate::validate_handle(&args.file) {
        return Response { status, attr: None, stat: None };
    }

    let file = match deps.metadata.get_file(&args.file).await {
        Ok(f) => f,
        Err(e) => return Response { status: e.into_status(), attr: None, stat: None },
    };

    match deps.metadata.get_filesystem_statistics(&args.file).await {
        Ok(stat) => Response { status: NfsStat::Ok, attr: Some(file.attr), stat: Some(stat) },
        Err(e) => Response { status: e.into_status(), attr: Some(file.attr), stat: None },
    }
}
