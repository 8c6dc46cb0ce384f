//! READDIRPLUS (RFC 1813 §3.3.17). Same cookie/verifier rules as READDIR,
//! but also resolves each entry's handle and attributes — so it pays one
//! `get_child` per entry that READDIR avoids (spec.md §4.6).

use crate::context::HandlerContext;
use crate::nfs3::types::{
    CookieVerifier, DirectoryCookie, DirectoryPlusEntry, FileAttr, FileHandle,
};
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
    pub entries: Vec<DirectoryPlusEntry>,
    pub eof: bool,
}

impl Response {
    fn fail(status: NfsStat, dir_attr: Option<FileAttr>) -> Self {
        Response { status, dir_attr, cookie_verifier: CookieVerifier::zero(), entries: Vec::new(), eof: true }
    }
}

pub async fn read_dir_plus(deps: &HandlerDeps, ctx: &HandlerContext, args: Args) -> Response {
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

    let (raw_entries, eof, verifier) = match deps
        .metadata
        .read_directory(&args.dir, args.cookie, args.cookie_verifier.0, args.max_entries)
        .await
    {
        Ok(v) => v,
        Err(crate::metadata::Error::InvalidArgument) if !args.cookie_verifier.is_zero() => {
            return Response::fail(NfsStat::BadCookie, Some(dir_file.attr));
        }
        Err(e) => return Response::fail(e.into_status(), Some(dir_file.attr)),
    };

    let mut entries = Vec::with_capacity(raw_entries.len());
    for entry in raw_entries {
        if ctx.is_cancelled() {
            return Response::fail(NfsStat::Io, Some(dir_file.attr));
        }
        let child = deps.metadata.get_child(&args.dir, &entry.name).await.ok().flatten();
        entries.push(DirectoryPlusEntry {
            cookie: entry.cookie,
            name: entry.name,
            fileid: entry.fileid,
            handle: child.as_ref().map(|c| c.handle.clone()),
            attr: child.map(|c| c.attr),
        });
    }

    Response {
        status: NfsStat::Ok,
        dir_attr: Some(dir_file.attr),
        cookie_verifier: CookieVerifier(verifier),
        entries,
        eof,
    }
}
