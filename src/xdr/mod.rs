//! XDR (External Data Representation, RFC 4506) primitives used to decode
//! NFSv3 procedure arguments and encode their responses.
//!
//! Framing (the ONC-RPC record marking, auth body, and program/procedure
//! dispatch) is an external collaborator's concern — see spec.md §1. This
//! module only knows how to turn a procedure's argument bytes into Rust
//! values and back, in the 4-byte-aligned, big-endian encoding XDR
//! mandates.

pub mod nfs3;

use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use std::io::{self, Read, Write};
use num_traits::{FromPrimitive, ToPrimitive};

pub const ALIGNMENT: usize = 4;

/// Decoding failures collapse to a single category, per spec.md §4.1:
/// handlers map this to `BadHandle` or `Invalid` as the calling context
/// dictates.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct MalformedRequest;

pub type DecodeResult<T> = Result<T, MalformedRequest>;

/// Reads and discards the padding bytes needed to round `n` up to a
/// 4-byte boundary.
pub fn read_padding(src: &mut impl Read, n: usize, strict: bool) -> DecodeResult<()> {
    let pad = (ALIGNMENT - n % ALIGNMENT) % ALIGNMENT;
    if pad == 0 {
        return Ok(());
    }
    let mut buf = [0u8; ALIGNMENT];
    match src.read_exact(&mut buf[..pad]) {
        Ok(()) => Ok(()),
        // spec.md §9 open question: WRITE/COMMIT decoders tolerate a
        // missing trailing pad (some clients omit it); LOOKUP and others
        // enforce it strictly. `strict` lets each call site opt in.
        Err(e) if !strict && e.kind() == io::ErrorKind::UnexpectedEof => Ok(()),
        Err(_) => Err(MalformedRequest),
    }
}

pub fn write_padding(dest: &mut impl Write, n: usize) -> io::Result<()> {
    let pad = (ALIGNMENT - n % ALIGNMENT) % ALIGNMENT;
    let zeros = [0u8; ALIGNMENT];
    dest.write_all(&zeros[..pad])
}

pub fn decode_u32(src: &mut impl Read) -> DecodeResult<u32> {
    src.read_u32::<BigEndian>().map_err(|_| MalformedRequest)
}

pub fn decode_u64(src: &mut impl Read) -> DecodeResult<u64> {
    src.read_u64::<BigEndian>().map_err(|_| MalformedRequest)
}

pub fn decode_bool(src: &mut impl Read) -> DecodeResult<bool> {
    match decode_u32(src)? {
        0 => Ok(false),
        1 => Ok(true),
        _ => Err(MalformedRequest),
    }
}

pub fn decode_option<T>(
    src: &mut impl Read,
    cont: impl FnOnce(&mut dyn Read) -> DecodeResult<T>,
) -> DecodeResult<Option<T>> {
    if decode_bool(src)? {
        Ok(Some(cont(src)?))
    } else {
        Ok(None)
    }
}

pub fn decode_fixed<const N: usize>(src: &mut impl Read, strict: bool) -> DecodeResult<[u8; N]> {
    let mut buf = [0u8; N];
    src.read_exact(&mut buf).map_err(|_| MalformedRequest)?;
    read_padding(src, N, strict)?;
    Ok(buf)
}

/// Decodes a counted, padded opaque byte vector (`opaque<max>`), copying
/// into a fresh `Vec`. Used for everything except the WRITE data payload,
/// which goes through [`nfs3::decode_write_args`] for zero-copy handling.
pub fn decode_opaque(src: &mut impl Read, max: usize, strict: bool) -> DecodeResult<Vec<u8>> {
    let len = decode_u32(src)? as usize;
    if len > max {
        return Err(MalformedRequest);
    }
    let mut buf = vec![0u8; len];
    src.read_exact(&mut buf).map_err(|_| MalformedRequest)?;
    read_padding(src, len, strict)?;
    Ok(buf)
}

pub fn decode_string(src: &mut impl Read, max: usize, strict: bool) -> DecodeResult<String> {
    String::from_utf8(decode_opaque(src, max, strict)?).map_err(|_| MalformedRequest)
}

pub fn decode_variant<T: FromPrimitive>(src: &mut impl Read) -> DecodeResult<T> {
    FromPrimitive::from_u32(decode_u32(src)?).ok_or(MalformedRequest)
}

pub fn encode_u32(dest: &mut impl Write, n: u32) -> io::Result<()> {
    dest.write_u32::<BigEndian>(n)
}

pub fn encode_u64(dest: &mut impl Write, n: u64) -> io::Result<()> {
    dest.write_u64::<BigEndian>(n)
}

pub fn encode_bool(dest: &mut impl Write, b: bool) -> io::Result<()> {
    dest.write_u32::<BigEndian>(if b { 1 } else { 0 })
}

pub fn encode_option<T>(
    dest: &mut impl Write,
    opt: &Option<T>,
    cont: impl FnOnce(&T, &mut dyn Write) -> io::Result<()>,
) -> io::Result<()> {
    match opt {
        Some(v) => {
            encode_bool(dest, true)?;
            cont(v, dest)
        }
        None => encode_bool(dest, false),
    }
}

pub fn encode_fixed<const N: usize>(dest: &mut impl Write, buf: &[u8; N]) -> io::Result<()> {
    dest.write_all(buf)?;
    write_padding(dest, N)
}

pub fn encode_opaque(dest: &mut impl Write, bytes: &[u8]) -> io::Result<()> {
    encode_u32(dest, bytes.len() as u32)?;
    dest.write_all(bytes)?;
    write_padding(dest, bytes.len())
}

pub fn encode_string(dest: &mut impl Write, s: &str) -> io::Result<()> {
    encode_opaque(dest, s.as_bytes())
}

pub fn encode_variant<T: ToPrimitive>(dest: &mut impl Write, val: T) -> io::Result<()> {
    let n = ToPrimitive::to_u32(&val)
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "enum value out of range"))?;
    encode_u32(dest, n)
}
