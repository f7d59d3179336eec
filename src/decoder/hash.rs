use std::io::Cursor;

use indexmap::IndexMap;

use super::common::parse_ziplist;
use super::common::utils::{read_blob, read_blob_bytes, read_length};
use crate::types::{Expiry, RdbError, RdbResult, RdbString, RdbValue};

pub fn read_hash(
    input: &mut Cursor<&[u8]>,
    key: RdbString,
    expiry: Option<Expiry>,
) -> RdbResult<RdbValue> {
    let mut hash_items = read_length(input)?;
    let mut values = IndexMap::new();

    while hash_items > 0 {
        let field = read_blob(input)?;
        let val = read_blob(input)?;
        values.insert(field, val);
        hash_items -= 1;
    }

    Ok(RdbValue::Hash {
        key,
        values,
        expiry,
    })
}

/// A ziplist-backed hash: consecutive entries pair up as field/value.
pub fn read_hash_ziplist(
    input: &mut Cursor<&[u8]>,
    key: RdbString,
    expiry: Option<Expiry>,
) -> RdbResult<RdbValue> {
    let ziplist = read_blob_bytes(input, "read_hash_ziplist")?;
    let entries = parse_ziplist(&ziplist)?;

    if entries.len() % 2 != 0 {
        return Err(RdbError::ParsingError {
            context: "read_hash_ziplist",
            message: format!("odd entry count: {}", entries.len()),
        });
    }

    let mut values = IndexMap::with_capacity(entries.len() / 2);
    let mut entries = entries.into_iter();
    while let (Some(field), Some(val)) = (entries.next(), entries.next()) {
        values.insert(field, val);
    }

    Ok(RdbValue::Hash {
        key,
        values,
        expiry,
    })
}
