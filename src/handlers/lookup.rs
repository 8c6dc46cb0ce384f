//! LOOKUP (RFC 1813 §3.3.3): resolve a name inside a directory. `.` and
//! `..` are meaningful here (spec.md §4.6 LOOKUP contract) even though
//! every other procedure rejects them as filenames.

use crate::context::HandlerContext;
use crate::nfs3::types::{FileAttr, FileHandle};
use crate::nfs3::NfsStat;
use crate::validate;

use super::HandlerDeps;

pub struct Args {
    pub dir: FileHandle,
    pub name: String,
}

pub struct Response {
    pub status: NfsStat,
    pub file: Option<FileHandle>,
    pub file_attr: Option<FileAttr>,
    pub dir_attr: Option<FileAttr>,
}

impl Response {
    fn fail(status: NfsStat, dir_attr: Option<FileAttr>) -> Self {
        Response { status, file: None, file_attr: None, dir_attr }
    }
}

pub async fn lookup(deps: &HandlerDeps, ctx: &HandlerContext, args: Args) -> Response {
    if ctx.is_cancelled() {
        return Response::fail(NfsStat::Io, None);
    }
    if let Err(status) = validate::validate_handle(&args.dir) {
        return Response::fail(status, None);
    }
    if let Err(status) = validate::validate_name(&args.name, true) {
        return Response::fail(status, None);
    }

    let dir_file = match deps.metadata.get_file(&args.dir).await {
        Ok(f) => f,
        Err(e) => return Response::fail(e.into_status(), None),
    };

    if args.name == "." {
        return Response {
            status: NfsStat::Ok,
            file: Some(args.dir.clone()),
            file_attr: Some(dir_file.attr.clone()),
            dir_attr: Some(dir_file.attr),
        };
    }
    if args.name == ".." {
        return match deps.metadata.get_parent(&args.dir).await {
            Ok(parent) => Response {
                status: NfsStat::Ok,
                file: Some(parent.handle.clone()),
                file_attr: Some(parent.attr.clone()),
                dir_attr: Some(dir_file.attr),
            },
            Err(e) => Response::fail(e.into_status(), Some(dir_file.attr)),
        };
    }

    match deps.metadata.lookup(&args.dir, &args.name).await {
        Ok(child) => Response {
            status: NfsStat::Ok,
            file: Some(child.handle),
            file_attr: Some(child.attr),
            dir_attr: Some(dir_file.attr),
        },
        Err(e) => Response::fail(e.into_status(), Some(dir_file.attr)),
    }
}
