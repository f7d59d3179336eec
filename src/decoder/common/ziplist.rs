use std::io::Cursor;

use crate::types::{RdbError, RdbResult, RdbString};

use super::utils::{read_exact, read_u16le, read_u32le, read_u8, skip};
use super::utils::{read_i16le, read_i32le, read_i64le, read_i8};

/// Parses a fully materialized ziplist buffer into its entries, in file
/// order. The buffer is self-delimiting: header, `num_entries` entries,
/// one `0xFF` sentinel. Running out of bytes here can never be cured by
/// more input, so it is malformed rather than incomplete.
pub fn parse_ziplist(buf: &[u8]) -> RdbResult<Vec<RdbString>> {
    parse_entries(buf).map_err(|err| match err {
        RdbError::Incomplete => RdbError::ParsingError {
            context: "parse_ziplist",
            message: format!("truncated ziplist ({} bytes)", buf.len()),
        },
        other => other,
    })
}

fn parse_entries(buf: &[u8]) -> RdbResult<Vec<RdbString>> {
    let mut reader = Cursor::new(buf);
    let (zlbytes, _zltail, zllen) = read_ziplist_metadata(&mut reader)?;

    if zlbytes as usize != buf.len() {
        return Err(RdbError::ParsingError {
            context: "parse_ziplist",
            message: format!("declared {} bytes, buffer has {}", zlbytes, buf.len()),
        });
    }

    let mut entries = Vec::with_capacity(zllen as usize);
    for _ in 0..zllen {
        entries.push(read_ziplist_entry(&mut reader)?);
    }

    let last_byte = read_u8(&mut reader)?;
    if last_byte != 0xFF {
        return Err(RdbError::ParsingError {
            context: "parse_ziplist",
            message: format!("expected 0xFF sentinel, found {:#04x}", last_byte),
        });
    }

    Ok(entries)
}

fn read_ziplist_metadata(input: &mut Cursor<&[u8]>) -> RdbResult<(u32, u32, u16)> {
    let zlbytes = read_u32le(input)?;
    let zltail = read_u32le(input)?;
    let zllen = read_u16le(input)?;

    Ok((zlbytes, zltail, zllen))
}

fn read_ziplist_entry(input: &mut Cursor<&[u8]>) -> RdbResult<RdbString> {
    // 1 or 5 bytes of previous-entry length, only ever skipped
    if read_u8(input)? == 254 {
        skip(input, 4)?;
    }

    let flag = read_u8(input)?;

    let length = match (flag & 0xC0) >> 6 {
        0 => (flag & 0x3F) as usize,
        1 => {
            let next_byte = read_u8(input)?;
            (((flag & 0x3F) as usize) << 8) | next_byte as usize
        }
        2 => read_u32le(input)? as usize,
        _ => {
            let number = match flag {
                0xFE => read_i8(input)? as i64,
                0xC0 => read_i16le(input)? as i64,
                0xD0 => read_i32le(input)? as i64,
                0xE0 => read_i64le(input)?,
                0xF0 => read_i24le(input)?,
                0xF1..=0xFD => (flag & 0x0F) as i64 - 1,
                _ => {
                    return Err(RdbError::ParsingError {
                        context: "read_ziplist_entry",
                        message: format!("unknown entry flag: {:#04x}", flag),
                    })
                }
            };
            return Ok(RdbString::Integer(number));
        }
    };

    Ok(RdbString::Bytes(read_exact(input, length)?))
}

fn read_i24le(input: &mut Cursor<&[u8]>) -> RdbResult<i64> {
    let bytes = read_exact(input, 3)?;
    let number = (((bytes[2] as i32) << 24) | ((bytes[1] as i32) << 16) | ((bytes[0] as i32) << 8))
        >> 8;
    Ok(number as i64)
}
