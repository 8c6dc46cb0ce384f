//! READDIR (RFC 1813 §3.3.16). Cookie `0` starts enumeration; a nonzero
//! cookie must be paired with a verifier previously returned by the
//! server, or the request is rejected with `BadCookie` — unless the
//! client opts out by sending verifier `0` (spec.md §4.6 READDIR/READDIRPLUS
//! contract).

use crate::context::HandlerContext;
use crate::nfs3::types::{CookieVerifier, DirectoryCookie, DirectoryEntry, FileAttr, FileHandle};
use crate::nfs3::NfsStat;
use crate::validate;

use super::HandlerDeps;

pub struct Args {
    pub dir: FileHandle,
    pub cookie: DirectoryCookie,
    pub cookie_verifier: CookieVerifier,
    pub max_entries: usize,
}

pub struct Response {
    pub status: NfsStat,
    pub dir_attr: Option<FileAttr>,
    pub cookie_verifier: CookieVerifier,
    pub entries: Vec<DirectoryEntry>,
    pub eof: bool,
}

impl Response {
    fn fail(status: NfsStat, dir_attr: Option<FileAttr>) -> Self {
        Response { status, dir_attr, cookie_verifier: CookieVerifier::zero(), entries: Vec::new(), eof: true }
    }
}

pub async fn read_dir(deps: &HandlerDeps, ctx: &HandlerContext, args: Args) -> Response {
    if ctx.is_cancelled() {
        return Response::fail(NfsStat::Io, None);
    }
    if let Err(status) = validate::validate_handle(&args.dir) {
        return Response::fail(status, None);
    }

    let dir_file = match deps.metadata.get_file(&args.dir).await {
        Ok(f) => f,
        Err(e) => return Response::fail(e.into_status(), None),
    };
    if dir_file.attr.file_type != crate::nfs3::types::FileType::Directory {
        return Response::fail(NfsStat::NotDir, Some(dir_file.attr));
    }

    match deps
        .metadata
        .read_directory(&args.dir, args.cookie, args.cookie_verifier.0, args.max_entries)
        .await
    {
        Ok((entries, eof, verifier)) => Response {
            status: NfsStat::Ok,
            dir_attr: Some(dir_file.attr),
            cookie_verifier: CookieVerifier(verifier),
            entries,
            eof,
        },
        Err(crate::metadata::Error::InvalidArgument) if !args.cookie_verifier.is_zero() => {
            Response::fail(NfsStat::BadCookie, Some(dir_file.attr))
        }
        Err(e) => Response::fail(e.into_status(), Some(dir_file.attr)),
    }
}
