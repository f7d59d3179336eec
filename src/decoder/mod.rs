mod common;
mod hash;
mod list;
mod rdb;
mod set;

use std::collections::VecDeque;
use std::io::{Cursor, ErrorKind, Read};

use bytes::{Buf, BytesMut};

use crate::types::{RdbError, RdbOk, RdbResult, RdbValue};

/// Upstream read granularity used by [`RdbParser`] unless overridden.
pub const DEFAULT_CHUNK_SIZE: usize = 64 * 1024;

/// The incremental decoder: byte chunks in, records out.
///
/// Chunks may be split at arbitrary positions, including inside a single
/// encoded unit; the unit is emitted once enough bytes have arrived and
/// boundaries never change the produced record sequence. The internal
/// buffer holds only the unconsumed tail, so steady-state memory is one
/// chunk plus the largest in-flight unit.
#[derive(Default)]
pub struct RdbDecoder {
    buffer: BytesMut,
    header_seen: bool,
    reached_eof: bool,
    failure: Option<RdbError>,
}

impl RdbDecoder {
    pub fn new() -> RdbDecoder {
        RdbDecoder::default()
    }

    /// Appends one chunk and returns every record that completes with it.
    /// Zero-length chunks are fine.
    ///
    /// A terminal error never swallows records completed in the same call:
    /// if any were, they are returned and the error is raised by the next
    /// `feed` or `finish`.
    pub fn feed(&mut self, chunk: &[u8]) -> RdbResult<Vec<RdbValue>> {
        if let Some(err) = self.failure.take() {
            return Err(err);
        }

        self.buffer.extend_from_slice(chunk);

        let mut records = Vec::new();
        while !self.reached_eof {
            let mut cursor = Cursor::new(&self.buffer[..]);
            let parsed = if self.header_seen {
                rdb::read_record(&mut cursor)
            } else {
                rdb::read_header(&mut cursor).map(Some)
            };

            match parsed {
                Ok(record) => {
                    let consumed = cursor.position() as usize;
                    self.buffer.advance(consumed);
                    self.header_seen = true;

                    if let Some(record) = record {
                        if matches!(record, RdbValue::Checksum(_)) {
                            self.reached_eof = true;
                        }
                        records.push(record);
                    }
                }
                // the unit straddles the chunk boundary; keep the bytes
                // and retry when more arrive
                Err(RdbError::Incomplete) => break,
                Err(err) => {
                    if records.is_empty() {
                        return Err(err);
                    }
                    self.failure = Some(err);
                    break;
                }
            }
        }

        Ok(records)
    }

    /// Signals the end of the upstream byte source. Leftover bytes without
    /// a preceding EOF record mean the dump was cut short.
    pub fn finish(&mut self) -> RdbOk {
        if let Some(err) = self.failure.take() {
            return Err(err);
        }
        if !self.reached_eof && !self.buffer.is_empty() {
            return Err(RdbError::Truncated(self.buffer.to_vec()));
        }
        Ok(())
    }

    /// True once the EOF record has been emitted.
    pub fn is_finished(&self) -> bool {
        self.reached_eof
    }

    /// Bytes currently held back waiting for more input.
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }
}

/// Pull-based driver: reads `chunk_size` slices from any [`Read`] source
/// and yields records lazily.
pub struct RdbParser<R: Read> {
    input: R,
    decoder: RdbDecoder,
    pending: VecDeque<RdbValue>,
    chunk: Vec<u8>,
    done: bool,
}

impl<R: Read> RdbParser<R> {
    pub fn new(input: R) -> RdbParser<R> {
        RdbParser::with_chunk_size(input, DEFAULT_CHUNK_SIZE)
    }

    pub fn with_chunk_size(input: R, chunk_size: usize) -> RdbParser<R> {
        assert!(chunk_size > 0, "chunk_size must be positive");
        RdbParser {
            input,
            decoder: RdbDecoder::new(),
            pending: VecDeque::new(),
            chunk: vec![0; chunk_size],
            done: false,
        }
    }
}

impl<R: Read> Iterator for RdbParser<R> {
    type Item = RdbResult<RdbValue>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(record) = self.pending.pop_front() {
                return Some(Ok(record));
            }
            if self.done {
                return None;
            }

            match self.input.read(&mut self.chunk) {
                Ok(0) => {
                    self.done = true;
                    if let Err(err) = self.decoder.finish() {
                        return Some(Err(err));
                    }
                }
                Ok(n) => match self.decoder.feed(&self.chunk[..n]) {
                    Ok(records) => {
                        self.pending.extend(records);
                        if self.decoder.is_finished() {
                            self.done = true;
                        }
                    }
                    Err(err) => {
                        self.done = true;
                        return Some(Err(err));
                    }
                },
                Err(ref err) if err.kind() == ErrorKind::Interrupted => {}
                Err(err) => {
                    self.done = true;
                    return Some(Err(RdbError::Io(err)));
                }
            }
        }
    }
}
