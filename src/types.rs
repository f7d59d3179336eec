use std::collections::HashSet;

use indexmap::IndexMap;
use thiserror::Error;

/// A Redis-encoded string: either raw bytes or one of the packed integer
/// forms. Integers keep their signedness and magnitude; `into_bytes`
/// renders them as ASCII decimal for consumers that only want bytes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RdbString {
    Bytes(Vec<u8>),
    Integer(i64),
}

impl RdbString {
    pub fn into_bytes(self) -> Vec<u8> {
        match self {
            RdbString::Bytes(buf) => buf,
            RdbString::Integer(n) => n.to_string().into_bytes(),
        }
    }
}

impl From<&[u8]> for RdbString {
    fn from(buf: &[u8]) -> Self {
        RdbString::Bytes(buf.to_vec())
    }
}

impl From<i64> for RdbString {
    fn from(n: i64) -> Self {
        RdbString::Integer(n)
    }
}

/// Key expiration carried by the expiretime opcodes. At most one per entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expiry {
    Seconds(u32),
    Millis(u64),
}

/// One record of an RDB file, emitted in file order. `Version` is always
/// first; `Checksum` is emitted at most once and terminates the stream.
#[derive(Debug, Clone, PartialEq)]
pub enum RdbValue {
    Version(u32),
    SelectDb(u8),
    ResizeDb {
        db_size: u64,
        expires_size: u64,
    },
    AuxField {
        key: RdbString,
        value: RdbString,
    },
    String {
        key: RdbString,
        value: RdbString,
        expiry: Option<Expiry>,
    },
    List {
        key: RdbString,
        values: Vec<RdbString>,
        expiry: Option<Expiry>,
    },
    Set {
        key: RdbString,
        members: HashSet<RdbString>,
        expiry: Option<Expiry>,
    },
    Hash {
        key: RdbString,
        values: IndexMap<RdbString, RdbString>,
        expiry: Option<Expiry>,
    },
    Checksum(Vec<u8>),
}

#[derive(Debug, Error)]
pub enum RdbError {
    /// Not enough buffered bytes to finish the current record. Internal to
    /// the chunk protocol: the scanner holds the bytes back and retries
    /// once more input arrives. Never surfaced to callers.
    #[error("not enough data is available to parse an entire record")]
    Incomplete,

    #[error("{context}: {message}")]
    ParsingError {
        context: &'static str,
        message: String,
    },

    #[error("unknown opcode: {0}")]
    UnknownOpcode(u8),

    #[error("unsupported encoding type: {0}")]
    UnknownEncoding(u8),

    #[error("unknown string encoding value: {0}")]
    UnknownEncodingValue(u64),

    #[error("lzf decompression failed: {0:?}")]
    Lzf(lzf::LzfError),

    /// The byte source ended before the EOF opcode. Carries the leftover
    /// buffered bytes for diagnostics.
    #[error("byte stream ended before the eof opcode ({} bytes left over)", .0.len())]
    Truncated(Vec<u8>),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<lzf::LzfError> for RdbError {
    fn from(err: lzf::LzfError) -> Self {
        RdbError::Lzf(err)
    }
}

pub type RdbResult<T> = Result<T, RdbError>;

pub type RdbOk = RdbResult<()>;
