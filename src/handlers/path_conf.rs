//! PATHCONF (RFC 1813 §3.3.20): POSIX pathconf values for a given object.

use crate::context::HandlerContext;
use crate::nfs3::types::{FileAttr, FileHandle, PathConfig};
use crate::nfs3::NfsStat;
use crate::validate;

use super::HandlerDeps;

pub struct Args {
    pub file: FileHandle,
}

pub struct Response {
    pub status: NfsStat,
    pub attr: Option<FileAttr>,
    pub config: Option<PathConfig>,
}

pub async fn path_conf(deps: &HandlerDeps, ctx: &HandlerContext, args: Args) -> Response {
    if ctx.is_cancelled() {
        return Response { status: NfsStat::Io, attr: None, config: None };
    }
    if let Err(status) = validate::validate_handle(&args.file) {
        return Response { status, attr: None, config: None };
    }

    let file = match deps.metadata.get_file(&args.file).await {
        Ok(f) => f,
        Err(e) => return Response { status: e.into_status(), attr: None, config: None },
    };

    match deps.metadata.get_path_config(&args.file).await {
        Ok(config) => Response { status: NfsStat::Ok, attr: Some(file.attr), config: Some(config) },
        Err(e) => Response { status: e.into_status(), attr: Some(file.attr), config: None },
    }
}
