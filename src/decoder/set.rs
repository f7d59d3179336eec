use std::collections::HashSet;
use std::io::Cursor;

use super::common::utils::{read_blob, read_blob_bytes, read_sequence};
use super::common::utils::{read_i16le, read_i32le, read_i64le, read_u32le};
use crate::types::{Expiry, RdbError, RdbResult, RdbString, RdbValue};

pub fn read_set(
    input: &mut Cursor<&[u8]>,
    key: RdbString,
    expiry: Option<Expiry>,
) -> RdbResult<RdbValue> {
    let values = read_sequence(input, read_blob)?;
    let members = values.into_iter().collect();

    Ok(RdbValue::Set {
        key,
        members,
        expiry,
    })
}

/// An intset blob: `encoding:u32le` (bytes per integer), `count:u32le`,
/// then exactly `count` little-endian signed integers of that width.
pub fn read_set_intset(
    input: &mut Cursor<&[u8]>,
    key: RdbString,
    expiry: Option<Expiry>,
) -> RdbResult<RdbValue> {
    let intset = read_blob_bytes(input, "read_set_intset")?;
    let members = parse_intset(&intset).map_err(|err| match err {
        RdbError::Incomplete => RdbError::ParsingError {
            context: "read_set_intset",
            message: format!("truncated intset ({} bytes)", intset.len()),
        },
        other => other,
    })?;

    Ok(RdbValue::Set {
        key,
        members,
        expiry,
    })
}

fn parse_intset(buf: &[u8]) -> RdbResult<HashSet<RdbString>> {
    let mut reader = Cursor::new(buf);
    let byte_size = read_u32le(&mut reader)?;
    let intset_length = read_u32le(&mut reader)?;

    let expected = 8 + intset_length as usize * byte_size as usize;
    if buf.len() != expected {
        return Err(RdbError::ParsingError {
            context: "parse_intset",
            message: format!(
                "{} integers of {} bytes need {} bytes, buffer has {}",
                intset_length,
                byte_size,
                expected,
                buf.len()
            ),
        });
    }

    let mut members = HashSet::with_capacity(intset_length as usize);

    for _ in 0..intset_length {
        let val = match byte_size {
            2 => read_i16le(&mut reader)? as i64,
            4 => read_i32le(&mut reader)? as i64,
            8 => read_i64le(&mut reader)?,
            _ => {
                return Err(RdbError::ParsingError {
                    context: "parse_intset",
                    message: format!("unhandled integer width: {}", byte_size),
                })
            }
        };

        members.insert(RdbString::Integer(val));
    }

    Ok(members)
}
