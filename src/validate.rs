//! Validation helpers shared by every procedure handler (spec.md §4.2).
//!
//! These are pure functions: no I/O, no state. Each returns [`NfsStat`]
//! directly since validation failures map 1-to-1 onto wire status codes.

use crate::nfs3::types::{FileHandle, MAX_HANDLE_LEN, MAX_NAME_LEN, MIN_HANDLE_LEN};
use crate::nfs3::NfsStat;

/// Validates a file handle's length (spec.md §3 invariant: 8–64 bytes).
pub fn validate_handle(handle: &FileHandle) -> Result<(), NfsStat> {
    if (MIN_HANDLE_LEN..=MAX_HANDLE_LEN).contains(&handle.len()) {
        Ok(())
    } else {
        Err(NfsStat::BadHandle)
    }
}

/// Whether `name` is the special `.`/`..` entries, which are only
/// meaningful to LOOKUP.
pub fn is_dot_or_dotdot(name: &str) -> bool {
    name == "." || name == ".."
}

/// Validates a filename per spec.md §3/§4.2: 1–255 bytes, no NUL, no `/`,
/// and (outside LOOKUP) not `.` or `..`.
///
/// `allow_dot_names` should be `true` only for LOOKUP, where `.` and `..`
/// are semantically meaningful.
pub fn validate_name(name: &str, allow_dot_names: bool) -> Result<(), NfsStat> {
    if name.is_empty() {
        return Err(NfsStat::Inval);
    }
    if name.len() > MAX_NAME_LEN {
        return Err(NfsStat::NameTooLong);
    }
    if name.as_bytes().contains(&0) {
        return Err(NfsStat::Inval);
    }
    if name.contains('/') {
        return Err(NfsStat::Inval);
    }
    if !allow_dot_names && is_dot_or_dotdot(name) {
        return Err(NfsStat::Inval);
    }
    Ok(())
}

/// The protocol-defined clamp applied to offsets before use (spec.md
/// §4.2). NFSv3 offsets are unsigned 64-bit, so in practice every decoded
/// value already satisfies this; the clamp exists to document and enforce
/// the upper bound explicitly rather than relying on the wire type.
pub const OFFSET_MAX: u64 = u64::MAX;

pub fn clamp_offset(offset: u64) -> u64 {
    offset.min(OFFSET_MAX)
}

/// Validates that `offset + count` does not overflow 64 bits (spec.md §4.2
/// / §8 "Overflow" property). Returns the sum on success.
pub fn validate_offset_count(offset: u64, count: u64) -> Result<u64, NfsStat> {
    offset.checked_add(count).ok_or(NfsStat::Inval)
}

/// Creation mode discriminants (`createhow3` tag values), exposed so
/// decoders can validate an out-of-range tag before constructing
/// [`crate::nfs3::CreateMode`].
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum CreateModeTag {
    Unchecked = 0,
    Guarded = 1,
    Exclusive = 2,
}

pub fn create_mode_tag(raw: u32) -> Result<CreateModeTag, NfsStat> {
    match raw {
        0 => Ok(CreateModeTag::Unchecked),
        1 => Ok(CreateModeTag::Guarded),
        2 => Ok(CreateModeTag::Exclusive),
        _ => Err(NfsStat::Inval),
    }
}
