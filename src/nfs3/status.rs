//! NFSv3 status codes (RFC 1813 §2.6).
//!
//! The numeric discriminants are the wire values; callers that need to
//! encode a response consult [`NfsStat::code`] rather than relying on enum
//! representation, since the relative order of these variants is not load
//! bearing.

use num_derive::{FromPrimitive, ToPrimitive};

/// Status codes returned by every NFSv3 procedure response.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, FromPrimitive, ToPrimitive)]
#[repr(u32)]
pub enum NfsStat {
    Ok = 0,
    Perm = 1,
    NoEnt = 2,
    Io = 5,
    NxIo = 6,
    Access = 13,
    Exist = 17,
    XDev = 18,
    NoDev = 19,
    NotDir = 20,
    IsDir = 21,
    Inval = 22,
    FBig = 27,
    NoSpc = 28,
    RoFs = 30,
    MLink = 31,
    NameTooLong = 63,
    NotEmpty = 66,
    DQuot = 69,
    Stale = 70,
    Remote = 71,
    BadHandle = 10001,
    NotSync = 10002,
    BadCookie = 10003,
    NotSupp = 10004,
    TooSmall = 10005,
    ServerFault = 10006,
    BadType = 10007,
    Jukebox = 10008,
}

impl NfsStat {
    /// The wire discriminant for this status.
    pub fn code(self) -> u32 {
        self as u32
    }

    pub fn is_ok(self) -> bool {
        matches!(self, NfsStat::Ok)
    }
}

impl Default for NfsStat {
    fn default() -> Self {
        NfsStat::Ok
    }
}
