//! ACCESS (RFC 1813 §3.3.4): check which of a requested set of access
//! rights the caller actually holds. Unknown bits are accepted silently
//! and never granted (spec.md §4.6 ACCESS contract).
//!
//! The wire bitmap is not itself a permission model: the same bit means
//! different things for a file and a directory (e.g. `EXECUTE` is "run
//! this program" on a file but "traverse into this directory" on a
//! directory), and `LOOKUP` is meaningless for a plain file. This module
//! translates the wire bits to a small type-sensitive generic permission
//! set per spec.md §4.6's table, asks the metadata service which generic
//! rights are actually held, then translates the answer back to wire
//! bits — so the metadata service never has to know the wire format, and
//! a bit outside the table can never come back granted.

use crate::context::HandlerContext;
use crate::nfs3::types::{AccessMask, FileAttr, FileHandle, FileType};
use crate::nfs3::NfsStat;
use crate::validate;

use super::HandlerDeps;

/// Generic rights `check_permissions` understands, independent of the NFS
/// wire bitmap. Deliberately distinct bit positions from [`AccessMask`]'s
/// wire constants so the two can never be confused.
const GENERIC_READ: u32 = 0x01;
const GENERIC_TRAVERSE: u32 = 0x02;
const GENERIC_WRITE: u32 = 0x04;
const GENERIC_DELETE: u32 = 0x08;
const GENERIC_EXECUTE: u32 = 0x10;
const GENERIC_LIST_DIRECTORY: u32 = 0x20;

/// Maps one NFS wire bit to its generic right for `file_type`, per
/// spec.md §4.6's File/Directory translation table. `None` means the bit
/// has no meaning for this file type and must never be granted (the
/// table's "—" entry: `LOOKUP` on a non-directory).
fn generic_for(wire_bit: u32, file_type: FileType) -> Option<u32> {
    let is_dir = file_type == FileType::Directory;
    match wire_bit {
        AccessMask::READ => Some(if is_dir { GENERIC_LIST_DIRECTORY } else { GENERIC_READ }),
        AccessMask::LOOKUP => is_dir.then_some(GENERIC_TRAVERSE),
        AccessMask::MODIFY | AccessMask::EXTEND => Some(GENERIC_WRITE),
        AccessMask::DELETE => Some(GENERIC_DELETE),
        AccessMask::EXECUTE => Some(if is_dir { GENERIC_TRAVERSE } else { GENERIC_EXECUTE }),
        _ => None,
    }
}

/// All wire bits this module recognizes, in the order spec.md §4.6 lists
/// them.
const KNOWN_WIRE_BITS: [u32; 6] = [
    AccessMask::READ,
    AccessMask::LOOKUP,
    AccessMask::MODIFY,
    AccessMask::EXTEND,
    AccessMask::DELETE,
    AccessMask::EXECUTE,
];

pub struct Args {
    pub file: FileHandle,
    pub requested: AccessMask,
}

pub struct Response {
    pub status: NfsStat,
    pub granted: AccessMask,
    pub attr: Option<FileAttr>,
}

pub async fn access(deps: &HandlerDeps, ctx: &HandlerContext, args: Args) -> Response {
    if ctx.is_cancelled() {
        return Response { status: NfsStat::Io, granted: AccessMask::default(), attr: None };
    }
    if let Err(status) = validate::validate_handle(&args.file) {
        return Response { status, granted: AccessMask::default(), attr: None };
    }

    let file = match deps.metadata.get_file(&args.file).await {
        Ok(f) => f,
        Err(e) => return Response { status: e.into_status(), granted: AccessMask::default(), attr: None },
    };

    // Only known bits ever reach the generic mask; an unrecognized bit
    // (or LOOKUP on a non-directory) is silently dropped here and so can
    // never come back granted (spec.md §4.6 "unknown bits ... never
    // granted").
    let wanted: Vec<(u32, u32)> = KNOWN_WIRE_BITS
        .into_iter()
        .filter(|&bit| args.requested.contains(bit))
        .filter_map(|bit| generic_for(bit, file.attr.file_type).map(|generic| (bit, generic)))
        .collect();
    let generic_mask = wanted.iter().fold(0u32, |acc, &(_, generic)| acc | generic);

    let auth = deps.authorize(ctx);
    match deps.metadata.check_permissions(&args.file, &auth, AccessMask(generic_mask)).await {
        Ok(granted_generic) => {
            let granted_wire = wanted.iter().fold(0u32, |acc, &(wire, generic)| {
                if granted_generic.contains(generic) {
                    acc | wire
                } else {
                    acc
                }
            });
            Response { status: NfsStat::Ok, granted: AccessMask(granted_wire), attr: Some(file.attr) }
        }
        Err(e) => Response { status: e.into_status(), granted: AccessMask::default(), attr: Some(file.attr) },
    }
}
