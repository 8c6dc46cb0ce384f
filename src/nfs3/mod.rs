//! NFSv3 (RFC 1813) wire-adjacent data model and status codes.

pub mod status;
pub mod types;

pub use status::NfsStat;
pub use types::*;
