//! Composite XDR shapes defined by RFC 1813 §3.3: `fattr3`, `wcc_data`,
//! `sattr3`, and the WRITE argument zero-copy decoder.

use std::io::{self, Read, Write};

use bytes::Bytes;

use super::{
    decode_bool, decode_fixed, decode_option, decode_string, decode_u32, decode_u64,
    decode_variant, encode_bool, encode_fixed, encode_option, encode_u32, encode_u64,
    encode_variant, DecodeResult,
};
use crate::nfs3::types::*;
use crate::nfs3::MAX_NAME_LEN;

fn decode_file_type(src: &mut impl Read) -> DecodeResult<FileType> {
    match decode_u32(src)? {
        1 => Ok(FileType::Regular),
        2 => Ok(FileType::Directory),
        3 => Ok(FileType::BlockDevice),
        4 => Ok(FileType::CharacterDevice),
        5 => Ok(FileType::Symlink),
        6 => Ok(FileType::Socket),
        7 => Ok(FileType::Fifo),
        _ => Err(super::MalformedRequest),
    }
}

fn encode_file_type(dest: &mut impl Write, ft: FileType) -> io::Result<()> {
    let n: u32 = match ft {
        FileType::Regular => 1,
        FileType::Directory => 2,
        FileType::BlockDevice => 3,
        FileType::CharacterDevice => 4,
        FileType::Symlink => 5,
        FileType::Socket => 6,
        FileType::Fifo => 7,
    };
    encode_u32(dest, n)
}

fn decode_time(src: &mut impl Read) -> DecodeResult<FileTime> {
    Ok(FileTime { seconds: decode_u32(src)?, nanos: decode_u32(src)? })
}

fn encode_time(dest: &mut impl Write, t: FileTime) -> io::Result<()> {
    encode_u32(dest, t.seconds)?;
    encode_u32(dest, t.nanos)
}

/// Decodes `fattr3`.
pub fn decode_fattr3(src: &mut impl Read) -> DecodeResult<FileAttr> {
    let file_type = decode_file_type(src)?;
    let mode = decode_u32(src)?;
    let nlink = decode_u32(src)?;
    let uid = decode_u32(src)?;
    let gid = decode_u32(src)?;
    let size = decode_u64(src)?;
    let used = decode_u64(src)?;
    let major = decode_u32(src)?;
    let minor = decode_u32(src)?;
    let fsid = decode_u64(src)?;
    let fileid = decode_u64(src)?;
    let atime = decode_time(src)?;
    let mtime = decode_time(src)?;
    let ctime = decode_time(src)?;
    let device = if major == 0 && minor == 0 { None } else { Some(DeviceId { major, minor }) };
    Ok(FileAttr {
        file_type,
        mode,
        nlink,
        uid,
        gid,
        size,
        used,
        device,
        fsid,
        fileid,
        atime,
        mtime,
        ctime,
    })
}

/// Encodes `fattr3`. This encoder never fails given a well-formed
/// `FileAttr`, per spec.md §4.1.
pub fn encode_fattr3(dest: &mut impl Write, attr: &FileAttr) -> io::Result<()> {
    encode_file_type(dest, attr.file_type)?;
    encode_u32(dest, attr.mode)?;
    encode_u32(dest, attr.nlink)?;
    encode_u32(dest, attr.uid)?;
    encode_u32(dest, attr.gid)?;
    encode_u64(dest, attr.size)?;
    encode_u64(dest, attr.used)?;
    let dev = attr.device.unwrap_or(DeviceId { major: 0, minor: 0 });
    encode_u32(dest, dev.major)?;
    encode_u32(dest, dev.minor)?;
    encode_u64(dest, attr.fsid)?;
    encode_u64(dest, attr.fileid)?;
    encode_time(dest, attr.atime)?;
    encode_time(dest, attr.mtime)?;
    encode_time(dest, attr.ctime)
}

/// Encodes `post_op_attr` (`fattr3` optional).
pub fn encode_post_op_attr(dest: &mut impl Write, attr: &Option<FileAttr>) -> io::Result<()> {
    encode_option(dest, attr, |a, d| encode_fattr3(d, a))
}

fn decode_wcc_attr(src: &mut impl Read) -> DecodeResult<WccAttr> {
    Ok(WccAttr { size: decode_u64(src)?, mtime: decode_time(src)?, ctime: decode_time(src)? })
}

fn encode_wcc_attr(dest: &mut impl Write, a: WccAttr) -> io::Result<()> {
    encode_u64(dest, a.size)?;
    encode_time(dest, a.mtime)?;
    encode_time(dest, a.ctime)
}

/// Decodes `wcc_data`.
pub fn decode_wcc_data(src: &mut impl Read) -> DecodeResult<WccData> {
    let before = decode_option(src, |s| decode_wcc_attr(s))?;
    let after = decode_option(src, |s| decode_fattr3(s))?;
    Ok(WccData { before, after })
}

/// Encodes `wcc_data`. Never fails given well-formed input (spec.md §4.1).
pub fn encode_wcc_data(dest: &mut impl Write, wcc: &WccData) -> io::Result<()> {
    encode_option(dest, &wcc.before, |a, d| encode_wcc_attr(d, *a))?;
    encode_post_op_attr(dest, &wcc.after)
}

/// Decodes `sattr3`.
pub fn decode_sattr3(src: &mut impl Read) -> DecodeResult<SetAttr> {
    let mode = decode_option(src, |s| decode_u32(s))?;
    let uid = decode_option(src, |s| decode_u32(s))?;
    let gid = decode_option(src, |s| decode_u32(s))?;
    let size = decode_option(src, |s| decode_u64(s))?;
    let atime = match decode_u32(src)? {
        0 => SetTime::DontChange,
        1 => SetTime::ServerCurrent,
        2 => SetTime::ClientProvided(decode_time(src)?),
        _ => return Err(super::MalformedRequest),
    };
    let mtime = match decode_u32(src)? {
        0 => SetTime::DontChange,
        1 => SetTime::ServerCurrent,
        2 => SetTime::ClientProvided(decode_time(src)?),
        _ => return Err(super::MalformedRequest),
    };
    Ok(SetAttr { mode, uid, gid, size, atime, mtime })
}

/// Encodes `sattr3`.
pub fn encode_sattr3(dest: &mut impl Write, a: &SetAttr) -> io::Result<()> {
    encode_option(dest, &a.mode, |v, d| encode_u32(d, *v))?;
    encode_option(dest, &a.uid, |v, d| encode_u32(d, *v))?;
    encode_option(dest, &a.gid, |v, d| encode_u32(d, *v))?;
    encode_option(dest, &a.size, |v, d| encode_u64(d, *v))?;
    match a.atime {
        SetTime::DontChange => encode_u32(dest, 0)?,
        SetTime::ServerCurrent => encode_u32(dest, 1)?,
        SetTime::ClientProvided(t) => {
            encode_u32(dest, 2)?;
            encode_time(dest, t)?;
        }
    }
    match a.mtime {
        SetTime::DontChange => encode_u32(dest, 0)?,
        SetTime::ServerCurrent => encode_u32(dest, 1)?,
        SetTime::ClientProvided(t) => {
            encode_u32(dest, 2)?;
            encode_time(dest, t)?;
        }
    }
    Ok(())
}

/// Decodes a `nfs_fh3` handle, enforcing only the wire-format `opaque<64>`
/// bound; length-range validation (8–64 bytes) happens in
/// [`crate::validate`], not here (spec.md §4.1 only enforces the
/// `MalformedRequest` category at decode time).
pub fn decode_handle(src: &mut impl Read, strict: bool) -> DecodeResult<FileHandle> {
    let len = decode_u32(src)? as usize;
    if len > MAX_HANDLE_LEN {
        return Err(super::MalformedRequest);
    }
    let mut buf = vec![0u8; len];
    src.read_exact(&mut buf).map_err(|_| super::MalformedRequest)?;
    super::read_padding(src, len, strict)?;
    Ok(FileHandle(buf))
}

pub fn encode_handle(dest: &mut impl Write, h: &FileHandle) -> io::Result<()> {
    super::encode_opaque(dest, &h.0)
}

/// Decodes a `filename3`/`nfspath3` string.
pub fn decode_name(src: &mut impl Read, strict: bool) -> DecodeResult<String> {
    decode_string(src, MAX_NAME_LEN, strict)
}

fn decode_stable_how(src: &mut impl Read) -> DecodeResult<StableHow> {
    match decode_u32(src)? {
        0 => Ok(StableHow::Unstable),
        1 => Ok(StableHow::DataSync),
        2 => Ok(StableHow::FileSync),
        _ => Err(super::MalformedRequest),
    }
}

pub fn encode_stable_how(dest: &mut impl Write, s: StableHow) -> io::Result<()> {
    encode_u32(dest, s as u32)
}

/// Arguments of WRITE3, decoded zero-copy: `data` is a [`Bytes`] slice of
/// the original request buffer rather than a fresh allocation, per spec.md
/// §4.1 / §9 ("Zero-copy WRITE"). The decoder enforces the hard 32 MiB cap
/// up front, before any handler-level validation against the metadata
/// service's advertised write-size limit.
#[derive(Debug, Clone)]
pub struct WriteArgs {
    pub file: FileHandle,
    pub offset: u64,
    pub count: u32,
    pub stable: StableHow,
    pub data: Bytes,
}

/// Decodes WRITE3args out of a reference-counted request buffer. `buf` must
/// contain exactly the procedure argument bytes starting at offset 0;
/// `data` is sliced out of `buf` rather than copied.
pub fn decode_write_args(buf: &Bytes) -> DecodeResult<WriteArgs> {
    let mut cur = io::Cursor::new(buf.as_ref());
    // WRITE's decoder is one of the relaxed ones: missing trailing padding
    // is tolerated (spec.md §9 open question).
    let file = decode_handle(&mut cur, false)?;
    let offset = decode_u64(&mut cur)?;
    let count = decode_u32(&mut cur)?;
    let stable = decode_stable_how(&mut cur)?;
    let declared_len = decode_u32(&mut cur)? as usize;
    if declared_len > MAX_WRITE_PAYLOAD {
        return Err(super::MalformedRequest);
    }
    let start = cur.position() as usize;
    let end = start.checked_add(declared_len).ok_or(super::MalformedRequest)?;
    if end > buf.len() {
        return Err(super::MalformedRequest);
    }
    let data = buf.slice(start..end);
    Ok(WriteArgs { file, offset, count, stable, data })
}

/// Arguments of COMMIT3 — uses the same relaxed padding decoder as WRITE
/// (spec.md §9 open question).
pub fn decode_commit_args(
    src: &mut impl Read,
) -> DecodeResult<(FileHandle, u64, u32)> {
    let handle = decode_handle(src, false)?;
    let offset = decode_u64(src)?;
    let count = decode_u32(src)?;
    Ok((handle, offset, count))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn sample_attr() -> FileAttr {
        FileAttr {
            file_type: FileType::Regular,
            mode: 0o644,
            nlink: 1,
            uid: 1000,
            gid: 1000,
            size: 42,
            used: 4096,
            device: None,
            fsid: 7,
            fileid: 99,
            atime: FileTime { seconds: 1, nanos: 2 },
            mtime: FileTime { seconds: 3, nanos: 4 },
            ctime: FileTime { seconds: 5, nanos: 6 },
        }
    }

    #[test]
    fn fattr3_round_trips() {
        let attr = sample_attr();
        let mut buf = Vec::new();
        encode_fattr3(&mut buf, &attr).unwrap();
        let decoded = decode_fattr3(&mut Cursor::new(buf)).unwrap();
        assert_eq!(decoded, attr);
    }

    #[test]
    fn wcc_data_round_trips_with_none() {
        let wcc = WccData { before: None, after: Some(sample_attr()) };
        let mut buf = Vec::new();
        encode_wcc_data(&mut buf, &wcc).unwrap();
        let decoded = decode_wcc_data(&mut Cursor::new(buf)).unwrap();
        assert_eq!(decoded, wcc);
    }

    #[test]
    fn write_args_slices_without_copy() {
        let mut buf = Vec::new();
        encode_handle(&mut buf, &FileHandle(vec![1; 8])).unwrap();
        encode_u64(&mut buf, 16).unwrap();
        encode_u32(&mut buf, 4).unwrap();
        encode_stable_how(&mut buf, StableHow::FileSync).unwrap();
        super::super::encode_opaque(&mut buf, b"data").unwrap();

        let bytes = Bytes::from(buf);
        let args = decode_write_args(&bytes).unwrap();
        assert_eq!(args.offset, 16);
        assert_eq!(&args.data[..], b"data");
        // the slice shares the same backing allocation
        assert_eq!(args.data.as_ptr() as usize >= bytes.as_ptr() as usize, true);
    }

    #[test]
    fn write_args_rejects_oversize_declared_length() {
        let mut buf = Vec::new();
        encode_handle(&mut buf, &FileHandle(vec![1; 8])).unwrap();
        encode_u64(&mut buf, 0).unwrap();
        encode_u32(&mut buf, 0).unwrap();
        encode_stable_how(&mut buf, StableHow::Unstable).unwrap();
        encode_u32(&mut buf, (MAX_WRITE_PAYLOAD + 1) as u32).unwrap();

        let bytes = Bytes::from(buf);
        assert_eq!(decode_write_args(&bytes), Err(super::super::MalformedRequest));
    }
}
