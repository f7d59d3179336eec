use std::io::Cursor;

use log::warn;

use super::common::utils::{
    read_blob, read_exact, read_length, read_length_with_encoding, read_u32le, read_u64le,
    read_u8, skip,
};
use super::{hash, list, set};
use crate::constants::{constant, encoding, encoding_type, op_code, version};
use crate::types::{Expiry, RdbError, RdbOk, RdbResult, RdbValue};

/// Reads the 9-byte file prefix: the `REDIS` magic followed by four ASCII
/// digits, emitted as the `Version` record.
pub(crate) fn read_header(input: &mut Cursor<&[u8]>) -> RdbResult<RdbValue> {
    let magic = read_exact(input, 5)?;
    if magic != constant::RDB_MAGIC.as_bytes() {
        return Err(RdbError::ParsingError {
            context: "read_header",
            message: "missing REDIS magic string".to_string(),
        });
    }

    let raw_version = read_exact(input, 4)?;
    if !raw_version.iter().all(|byte| byte.is_ascii_digit()) {
        return Err(RdbError::ParsingError {
            context: "read_header",
            message: "version is not four ASCII digits".to_string(),
        });
    }

    // safe after the digit check
    let parsed = std::str::from_utf8(&raw_version).unwrap().parse::<u32>().unwrap();

    if !(version::SUPPORTED_MINIMUM..=version::SUPPORTED_MAXIMUM).contains(&parsed) {
        return Err(RdbError::ParsingError {
            context: "read_header",
            message: format!("unsupported version: {}", parsed),
        });
    }

    Ok(RdbValue::Version(parsed))
}

/// Reads one opcode and everything belonging to it. `None` means the unit
/// was consumed but produces no record (an unsupported value type that was
/// skipped). The caller commits the cursor only on `Ok`, so an
/// `Incomplete` anywhere inside restarts at the opcode byte.
pub(crate) fn read_record(input: &mut Cursor<&[u8]>) -> RdbResult<Option<RdbValue>> {
    let next_op = read_u8(input)?;

    match next_op {
        op_code::AUX => {
            let key = read_blob(input)?;
            let value = read_blob(input)?;
            Ok(Some(RdbValue::AuxField { key, value }))
        }
        op_code::RESIZEDB => {
            let db_size = read_length(input)?;
            let expires_size = read_length(input)?;
            Ok(Some(RdbValue::ResizeDb {
                db_size,
                expires_size,
            }))
        }
        op_code::EXPIRETIME_MS => {
            let millis = read_u64le(input)?;
            let value_type = read_u8(input)?;
            read_entry(input, value_type, Some(Expiry::Millis(millis)))
        }
        op_code::EXPIRETIME => {
            let seconds = read_u32le(input)?;
            let value_type = read_u8(input)?;
            read_entry(input, value_type, Some(Expiry::Seconds(seconds)))
        }
        op_code::SELECTDB => {
            let db = read_u8(input)?;
            Ok(Some(RdbValue::SelectDb(db)))
        }
        op_code::EOF => {
            let checksum = read_exact(input, constant::CHECKSUM_LENGTH)?;
            Ok(Some(RdbValue::Checksum(checksum)))
        }
        value_type => read_entry(input, value_type, None),
    }
}

fn read_entry(
    input: &mut Cursor<&[u8]>,
    value_type: u8,
    expiry: Option<Expiry>,
) -> RdbResult<Option<RdbValue>> {
    if value_type > encoding_type::MAX {
        return Err(RdbError::UnknownOpcode(value_type));
    }

    let key = read_blob(input)?;

    let record = match value_type {
        encoding_type::STRING => {
            let value = read_blob(input)?;
            RdbValue::String { key, value, expiry }
        }
        encoding_type::LIST => list::read_linked_list(input, key, expiry)?,
        encoding_type::SET => set::read_set(input, key, expiry)?,
        encoding_type::HASH => hash::read_hash(input, key, expiry)?,
        encoding_type::LIST_ZIPLIST => list::read_list_ziplist(input, key, expiry)?,
        encoding_type::SET_INTSET => set::read_set_intset(input, key, expiry)?,
        encoding_type::HASH_ZIPLIST => hash::read_hash_ziplist(input, key, expiry)?,
        encoding_type::LIST_QUICKLIST => list::read_quicklist(input, key, expiry)?,
        encoding_type::ZSET => {
            skip_sorted_set(input, false)?;
            warn!("skipping sorted set entry (type {})", value_type);
            return Ok(None);
        }
        encoding_type::ZSET_2 => {
            skip_sorted_set(input, true)?;
            warn!("skipping sorted set entry (type {})", value_type);
            return Ok(None);
        }
        encoding_type::ZSET_ZIPLIST => {
            skip_blob(input)?;
            warn!("skipping sorted set ziplist entry (type {})", value_type);
            return Ok(None);
        }
        unsupported => return Err(RdbError::UnknownEncoding(unsupported)),
    };

    Ok(Some(record))
}

/// Advances past one encoded string without materializing it.
fn skip_blob(input: &mut Cursor<&[u8]>) -> RdbOk {
    let (len, is_encoded) = read_length_with_encoding(input)?;

    let skip_bytes = if is_encoded {
        match len {
            encoding::INT8 => 1,
            encoding::INT16 => 2,
            encoding::INT32 => 4,
            encoding::LZF => {
                let compressed_length = read_length(input)?;
                let _real_length = read_length(input)?;
                compressed_length
            }
            _ => return Err(RdbError::UnknownEncodingValue(len)),
        }
    } else {
        len
    };

    skip(input, skip_bytes as usize)
}

fn skip_sorted_set(input: &mut Cursor<&[u8]>, binary_scores: bool) -> RdbOk {
    let mut set_items = read_length(input)?;

    while set_items > 0 {
        skip_blob(input)?;
        if binary_scores {
            skip(input, 8)?;
        } else {
            // ascii score: length byte, then that many digits; 253..255
            // are nan/inf markers with no payload
            let score_length = read_u8(input)?;
            match score_length {
                253..=255 => {}
                len => skip(input, len as usize)?,
            }
        }
        set_items -= 1;
    }

    Ok(())
}
