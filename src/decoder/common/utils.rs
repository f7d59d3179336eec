use std::io::Cursor;

use byteorder::{LittleEndian, ReadBytesExt};

use crate::constants::{constant, encoding};
use crate::types::{RdbError, RdbOk, RdbResult, RdbString};

// All primitives read from a cursor over the scanner's buffer. A short
// read maps to `RdbError::Incomplete`; the caller only commits the cursor
// position on success, so the unconsumed bytes survive to the next chunk.

pub fn read_u8(input: &mut Cursor<&[u8]>) -> RdbResult<u8> {
    input.read_u8().map_err(|_| RdbError::Incomplete)
}

pub fn read_u16le(input: &mut Cursor<&[u8]>) -> RdbResult<u16> {
    input.read_u16::<LittleEndian>().map_err(|_| RdbError::Incomplete)
}

pub fn read_u32le(input: &mut Cursor<&[u8]>) -> RdbResult<u32> {
    input.read_u32::<LittleEndian>().map_err(|_| RdbError::Incomplete)
}

pub fn read_u64le(input: &mut Cursor<&[u8]>) -> RdbResult<u64> {
    input.read_u64::<LittleEndian>().map_err(|_| RdbError::Incomplete)
}

pub fn read_i8(input: &mut Cursor<&[u8]>) -> RdbResult<i8> {
    input.read_i8().map_err(|_| RdbError::Incomplete)
}

pub fn read_i16le(input: &mut Cursor<&[u8]>) -> RdbResult<i16> {
    input.read_i16::<LittleEndian>().map_err(|_| RdbError::Incomplete)
}

pub fn read_i32le(input: &mut Cursor<&[u8]>) -> RdbResult<i32> {
    input.read_i32::<LittleEndian>().map_err(|_| RdbError::Incomplete)
}

pub fn read_i64le(input: &mut Cursor<&[u8]>) -> RdbResult<i64> {
    input.read_i64::<LittleEndian>().map_err(|_| RdbError::Incomplete)
}

pub fn read_exact(input: &mut Cursor<&[u8]>, len: usize) -> RdbResult<Vec<u8>> {
    let pos = input.position() as usize;
    let src = *input.get_ref();
    // subtraction form: `pos + len` could wrap on hostile declared lengths
    if src.len() - pos < len {
        return Err(RdbError::Incomplete);
    }
    let buf = src[pos..pos + len].to_vec();
    input.set_position((pos + len) as u64);
    Ok(buf)
}

/// Advance past `len` bytes without copying them out.
pub fn skip(input: &mut Cursor<&[u8]>, len: usize) -> RdbOk {
    let pos = input.position() as usize;
    if input.get_ref().len() - pos < len {
        return Err(RdbError::Incomplete);
    }
    input.set_position((pos + len) as u64);
    Ok(())
}

/// Decodes one length prefix. `is_encoded` is true when the prefix is the
/// `11` marker: the returned value is then a string sub-encoding tag, not
/// a length.
pub fn read_length_with_encoding(input: &mut Cursor<&[u8]>) -> RdbResult<(u64, bool)> {
    let enc_type = read_u8(input)?;

    match (enc_type & 0xC0) >> 6 {
        constant::RDB_ENCVAL => Ok(((enc_type & 0x3F) as u64, true)),
        constant::RDB_6BITLEN => Ok(((enc_type & 0x3F) as u64, false)),
        constant::RDB_14BITLEN => {
            let next_byte = read_u8(input)?;
            Ok(((((enc_type & 0x3F) as u64) << 8) | next_byte as u64, false))
        }
        _ => match enc_type & 0x3F {
            constant::RDB_32BITLEN_EXT => Ok((read_u32le(input)? as u64, false)),
            constant::RDB_64BITLEN_EXT => Ok((read_u64le(input)?, false)),
            _ => Err(RdbError::ParsingError {
                context: "read_length",
                message: format!("reserved length prefix: {:#04x}", enc_type),
            }),
        },
    }
}

pub fn read_length(input: &mut Cursor<&[u8]>) -> RdbResult<u64> {
    let (length, _) = read_length_with_encoding(input)?;
    Ok(length)
}

/// Decodes one Redis string: raw bytes of declared length, a packed
/// signed integer, or an LZF-compressed payload.
pub fn read_blob(input: &mut Cursor<&[u8]>) -> RdbResult<RdbString> {
    let (length, is_encoded) = read_length_with_encoding(input)?;

    if is_encoded {
        let result = match length {
            encoding::INT8 => RdbString::Integer(read_i8(input)? as i64),
            encoding::INT16 => RdbString::Integer(read_i16le(input)? as i64),
            encoding::INT32 => RdbString::Integer(read_i32le(input)? as i64),
            encoding::LZF => RdbString::Bytes(read_lzf_blob(input)?),
            _ => return Err(RdbError::UnknownEncodingValue(length)),
        };

        Ok(result)
    } else {
        Ok(RdbString::Bytes(read_exact(input, length as usize)?))
    }
}

/// `read_blob` for callers that need a raw buffer (ziplists, intsets). An
/// integer-packed blob in such a position is malformed.
pub fn read_blob_bytes(input: &mut Cursor<&[u8]>, context: &'static str) -> RdbResult<Vec<u8>> {
    match read_blob(input)? {
        RdbString::Bytes(buf) => Ok(buf),
        RdbString::Integer(n) => Err(RdbError::ParsingError {
            context,
            message: format!("expected a raw buffer, found packed integer {}", n),
        }),
    }
}

fn read_lzf_blob(input: &mut Cursor<&[u8]>) -> RdbResult<Vec<u8>> {
    let compressed_length = read_length(input)?;
    let real_length = read_length(input)?;
    let data = read_exact(input, compressed_length as usize)?;

    let decompressed = lzf::decompress(&data, real_length as usize)?;
    if decompressed.len() != real_length as usize {
        return Err(RdbError::ParsingError {
            context: "read_lzf_blob",
            message: format!(
                "declared {} decompressed bytes, got {}",
                real_length,
                decompressed.len()
            ),
        });
    }

    Ok(decompressed)
}

/// Reads a length prefix and applies `transform` that many times.
pub fn read_sequence<T, F>(input: &mut Cursor<&[u8]>, mut transform: F) -> RdbResult<Vec<T>>
where
    F: FnMut(&mut Cursor<&[u8]>) -> RdbResult<T>,
{
    let mut len = read_length(input)?;
    let mut values = Vec::with_capacity(len.min(4096) as usize);

    while len > 0 {
        values.push(transform(input)?);
        len -= 1;
    }

    Ok(values)
}
