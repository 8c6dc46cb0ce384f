//! GETATTR (RFC 1813 §3.3.1): fetch an object's attributes.

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
    pub attr: Option<FileAttr>,
}

pub async fn get_attr(deps: &HandlerDeps, ctx: &HandlerContext, args: Args) -> Response {
    if ctx.is_cancelled() {
        return Response { status: NfsStat::Io, attr: None };
    }
    if let Err(status) = validate::validate_handle(&args.file) {
        return Response { status, attr: None };
    }
    match deps.metadata.get_file(&args.file).await {
        Ok(file) => Response { status: NfsStat::Ok, attr: Some(file.attr) },
        Err(e) => Response { status: e.into_status(), attr: None },
    }
}
