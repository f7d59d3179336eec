use std::io::Cursor;

use super::common::parse_ziplist;
use super::common::utils::{read_blob, read_blob_bytes, read_length, read_sequence};
use crate::types::{Expiry, RdbResult, RdbString, RdbValue};

pub fn read_linked_list(
    input: &mut Cursor<&[u8]>,
    key: RdbString,
    expiry: Option<Expiry>,
) -> RdbResult<RdbValue> {
    let values = read_sequence(input, read_blob)?;

    Ok(RdbValue::List {
        key,
        values,
        expiry,
    })
}

pub fn read_list_ziplist(
    input: &mut Cursor<&[u8]>,
    key: RdbString,
    expiry: Option<Expiry>,
) -> RdbResult<RdbValue> {
    let ziplist = read_blob_bytes(input, "read_list_ziplist")?;
    let values = parse_ziplist(&ziplist)?;

    Ok(RdbValue::List {
        key,
        values,
        expiry,
    })
}

/// A quicklist is a length-prefixed run of ziplist buffers; their entries
/// concatenate into one list in file order.
pub fn read_quicklist(
    input: &mut Cursor<&[u8]>,
    key: RdbString,
    expiry: Option<Expiry>,
) -> RdbResult<RdbValue> {
    let len = read_length(input)?;
    let mut values = Vec::new();

    for _ in 0..len {
        let ziplist = read_blob_bytes(input, "read_quicklist")?;
        let mut ziplist_values = parse_ziplist(&ziplist)?;
        values.append(&mut ziplist_values);
    }

    Ok(RdbValue::List {
        key,
        values,
        expiry,
    })
}
