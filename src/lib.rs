//! Incremental decoder for Redis RDB dump files.
//!
//! The dump is consumed as a stream of byte chunks and decoded into a
//! sequence of typed records (version header, database selection, aux
//! metadata, key/value entries, checksum) without ever holding the whole
//! file in memory. Chunk boundaries are invisible in the output: a record
//! that straddles one is simply emitted once its bytes have arrived.
//!
//! Push bytes with [`RdbDecoder::feed`], or wrap any [`std::io::Read`]
//! source in [`RdbParser`] and iterate.

pub mod constants;
pub mod decoder;
pub mod types;

use std::io::Read;

pub use decoder::{RdbDecoder, RdbParser, DEFAULT_CHUNK_SIZE};
pub use types::{Expiry, RdbError, RdbOk, RdbResult, RdbString, RdbValue};

/// Decodes a whole dump into its records. Streaming callers should use
/// [`RdbParser`] or [`RdbDecoder`] directly.
pub fn parse<R: Read>(input: R) -> RdbResult<Vec<RdbValue>> {
    RdbParser::new(input).collect()
}
