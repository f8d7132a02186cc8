//! newc header encoding.
//!
//! See `man 5 cpio` and
//! <https://www.kernel.org/doc/html/latest/driver-api/early-userspace/buffer-format.html>.
//! Every numeric field is 8 lowercase hex digits. The `check` field is only
//! meaningful for the `070702` variant and is always written as 0 here.

use std::io::Write;

use crate::entry::EntryDescriptor;
use crate::{CpioError, Result};

/// Magic of the newc format
pub const NEWC_MAGIC: &[u8; 6] = b"070701";

/// Name of the end-of-archive record
pub const TRAILER_NAME: &[u8] = b"TRAILER!!!";

/// Magic plus 13 fields, without the name
pub const HEADER_LEN: usize = 6 + 8 * 13;

const MAX_FIELD: i128 = 0xffff_ffff;

const FIELD_NAMES: [&str; 13] = [
    "ino",
    "mode",
    "uid",
    "gid",
    "nlink",
    "mtime",
    "filesize",
    "devmajor",
    "devminor",
    "rdevmajor",
    "rdevminor",
    "namesize",
    "check",
];

/// Encode the header and NUL-terminated name of one entry.
///
/// Padding is not included. The result depends only on the arguments.
pub fn encode(desc: &EntryDescriptor, name: &[u8]) -> Result<Vec<u8>> {
    if name == TRAILER_NAME {
        return Err(CpioError::ReservedName {
            name: String::from_utf8_lossy(name).into_owned(),
        });
    }
    if name.contains(&0) {
        return Err(CpioError::InvalidEncoding {
            path: String::from_utf8_lossy(name).into_owned().into(),
        });
    }

    let fields = [
        i128::from(desc.ino),
        i128::from(desc.mode),
        i128::from(desc.uid),
        i128::from(desc.gid),
        i128::from(desc.nlink),
        i128::from(desc.mtime),
        i128::from(desc.size),
        i128::from(desc.dev_major),
        i128::from(desc.dev_minor),
        i128::from(desc.rdev_major),
        i128::from(desc.rdev_minor),
        // length including the terminating NUL
        name.len() as i128 + 1,
        0,
    ];
    encode_fields(&fields, name)
}

/// Encode the `TRAILER!!!` record header.
pub fn encode_trailer() -> Result<Vec<u8>> {
    let mut fields = [0i128; 13];
    fields[11] = TRAILER_NAME.len() as i128 + 1;
    encode_fields(&fields, TRAILER_NAME)
}

fn encode_fields(fields: &[i128; 13], name: &[u8]) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(HEADER_LEN + name.len() + 1);
    out.extend_from_slice(NEWC_MAGIC);
    for (index, (&value, field)) in fields.iter().zip(FIELD_NAMES).enumerate() {
        // UNIX epoch overflow, negative timestamps and so on
        if !(0..=MAX_FIELD).contains(&value) {
            return Err(CpioError::FieldOverflow {
                index,
                field,
                value,
            });
        }
        write!(out, "{:08x}", value)?;
    }
    out.extend_from_slice(name);
    out.push(0);
    Ok(out)
}
