use std::collections::HashSet;

use indexmap::IndexMap;
use pretty_assertions::assert_eq;
use rstest::rstest;

use rdbstream::{Expiry, RdbDecoder, RdbError, RdbParser, RdbString, RdbValue};

// ---------------------------------------------------------------- fixtures

fn enc_len(n: u64) -> Vec<u8> {
    if n < 64 {
        vec![n as u8]
    } else if n < 16384 {
        vec![0x40 | (n >> 8) as u8, n as u8]
    } else {
        let mut buf = vec![0x80];
        buf.extend_from_slice(&(n as u32).to_le_bytes());
        buf
    }
}

fn enc_str(payload: &[u8]) -> Vec<u8> {
    let mut buf = enc_len(payload.len() as u64);
    buf.extend_from_slice(payload);
    buf
}

fn enc_lzf(payload: &[u8]) -> Vec<u8> {
    let compressed = lzf::compress(payload).unwrap();
    let mut buf = vec![0xC3];
    buf.extend(enc_len(compressed.len() as u64));
    buf.extend(enc_len(payload.len() as u64));
    buf.extend_from_slice(&compressed);
    buf
}

// A ziplist of plain string entries, each with a one-byte prev-length.
fn ziplist(items: &[&[u8]]) -> Vec<u8> {
    let mut body = Vec::new();
    for item in items {
        body.push(0x00);
        body.extend(enc_str(item));
    }

    let total = 10 + body.len() + 1;
    let mut buf = Vec::with_capacity(total);
    buf.extend_from_slice(&(total as u32).to_le_bytes());
    buf.extend_from_slice(&0u32.to_le_bytes());
    buf.extend_from_slice(&(items.len() as u16).to_le_bytes());
    buf.extend_from_slice(&body);
    buf.push(0xFF);
    buf
}

fn intset_u32(values: &[i32]) -> Vec<u8> {
    let mut buf = Vec::new();
    buf.extend_from_slice(&4u32.to_le_bytes());
    buf.extend_from_slice(&(values.len() as u32).to_le_bytes());
    for value in values {
        buf.extend_from_slice(&value.to_le_bytes());
    }
    buf
}

fn bytes(payload: &str) -> RdbString {
    RdbString::Bytes(payload.as_bytes().to_vec())
}

const CHECKSUM: [u8; 8] = [0xDE, 0xAD, 0xBE, 0xEF, 0x00, 0x11, 0x22, 0x33];

/// One dump exercising every supported record shape, including a sorted
/// set entry that must be skipped without a trace.
fn full_fixture() -> Vec<u8> {
    let mut f = Vec::new();
    f.extend_from_slice(b"REDIS0006");

    f.push(0xFA);
    f.extend(enc_str(b"redis-ver"));
    f.extend(enc_str(b"3.2.1"));
    f.push(0xFA);
    f.extend(enc_str(b"redis-bits"));
    f.extend([0xC0, 64]);

    f.push(0xFE);
    f.push(0x00);
    f.push(0xFB);
    f.extend(enc_len(8));
    f.extend(enc_len(2));

    f.push(0x00);
    f.extend(enc_str(b"mykey"));
    f.extend(enc_str(b"myvalue"));

    f.push(0x00);
    f.extend(enc_str(b"counter"));
    f.extend([0xC1, 0x39, 0x30]);

    f.push(0xFC);
    f.extend(0u64.to_le_bytes());
    f.push(0x00);
    f.extend(enc_str(b"gone"));
    f.extend(enc_str(b"soon"));

    f.push(0xFD);
    f.extend(1_600_000_000u32.to_le_bytes());
    f.push(0x00);
    f.extend(enc_str(b"later"));
    f.extend(enc_str(b"maybe"));

    f.push(0x01);
    f.extend(enc_str(b"letters"));
    f.extend(enc_len(3));
    f.extend(enc_str(b"a"));
    f.extend(enc_str(b"b"));
    f.extend(enc_str(b"c"));

    f.push(0x02);
    f.extend(enc_str(b"planets"));
    f.extend(enc_len(2));
    f.extend(enc_str(b"earth"));
    f.extend(enc_str(b"mars"));

    f.push(0x04);
    f.extend(enc_str(b"user"));
    f.extend(enc_len(2));
    f.extend(enc_str(b"name"));
    f.extend(enc_str(b"john"));
    f.extend(enc_str(b"age"));
    f.extend([0xC0, 25]);

    f.push(0x0A);
    f.extend(enc_str(b"zl"));
    f.extend(enc_str(&ziplist(&[b"x", b"y"])));

    f.push(0x0B);
    f.extend(enc_str(b"s"));
    f.extend(enc_str(&intset_u32(&[1, 2, 3])));

    f.push(0x0D);
    f.extend(enc_str(b"zh"));
    f.extend(enc_str(&ziplist(&[b"field", b"value"])));

    f.push(0x0E);
    f.extend(enc_str(b"q"));
    f.extend(enc_len(2));
    f.extend(enc_str(&ziplist(&[b"q1", b"q2"])));
    f.extend(enc_str(&ziplist(&[b"q3"])));

    f.push(0x00);
    f.extend(enc_str(b"big"));
    f.extend(enc_lzf(&b"ab".repeat(100)));

    // sorted set: skipped, no record
    f.push(0x03);
    f.extend(enc_str(b"ranks"));
    f.extend(enc_len(1));
    f.extend(enc_str(b"member"));
    f.push(0x03);
    f.extend_from_slice(b"1.5");

    f.push(0xFF);
    f.extend_from_slice(&CHECKSUM);
    f
}

fn full_fixture_records() -> Vec<RdbValue> {
    vec![
        RdbValue::Version(6),
        RdbValue::AuxField {
            key: bytes("redis-ver"),
            value: bytes("3.2.1"),
        },
        RdbValue::AuxField {
            key: bytes("redis-bits"),
            value: RdbString::Integer(64),
        },
        RdbValue::SelectDb(0),
        RdbValue::ResizeDb {
            db_size: 8,
            expires_size: 2,
        },
        RdbValue::String {
            key: bytes("mykey"),
            value: bytes("myvalue"),
            expiry: None,
        },
        RdbValue::String {
            key: bytes("counter"),
            value: RdbString::Integer(12345),
            expiry: None,
        },
        RdbValue::String {
            key: bytes("gone"),
            value: bytes("soon"),
            expiry: Some(Expiry::Millis(0)),
        },
        RdbValue::String {
            key: bytes("later"),
            value: bytes("maybe"),
            expiry: Some(Expiry::Seconds(1_600_000_000)),
        },
        RdbValue::List {
            key: bytes("letters"),
            values: vec![bytes("a"), bytes("b"), bytes("c")],
            expiry: None,
        },
        RdbValue::Set {
            key: bytes("planets"),
            members: [bytes("earth"), bytes("mars")].into_iter().collect(),
            expiry: None,
        },
        RdbValue::Hash {
            key: bytes("user"),
            values: IndexMap::from([
                (bytes("name"), bytes("john")),
                (bytes("age"), RdbString::Integer(25)),
            ]),
            expiry: None,
        },
        RdbValue::List {
            key: bytes("zl"),
            values: vec![bytes("x"), bytes("y")],
            expiry: None,
        },
        RdbValue::Set {
            key: bytes("s"),
            members: [1, 2, 3].into_iter().map(RdbString::Integer).collect(),
            expiry: None,
        },
        RdbValue::Hash {
            key: bytes("zh"),
            values: IndexMap::from([(bytes("field"), bytes("value"))]),
            expiry: None,
        },
        RdbValue::List {
            key: bytes("q"),
            values: vec![bytes("q1"), bytes("q2"), bytes("q3")],
            expiry: None,
        },
        RdbValue::String {
            key: bytes("big"),
            value: RdbString::Bytes(b"ab".repeat(100)),
            expiry: None,
        },
        RdbValue::Checksum(CHECKSUM.to_vec()),
    ]
}

fn decode_chunked(input: &[u8], chunk_size: usize) -> Vec<RdbValue> {
    let mut decoder = RdbDecoder::new();
    let mut records = Vec::new();
    for chunk in input.chunks(chunk_size) {
        records.extend(decoder.feed(chunk).unwrap());
    }
    decoder.finish().unwrap();
    records
}

// ---------------------------------------------------------------- scenarios

#[test]
fn empty_database_with_aux() {
    let mut f = Vec::new();
    f.extend_from_slice(b"REDIS0006");
    f.push(0xFA);
    f.extend(enc_str(b"redis-ver"));
    f.extend(enc_str(b"3.2.1"));
    f.push(0xFF);
    f.extend_from_slice(&CHECKSUM);

    assert_eq!(
        vec![
            RdbValue::Version(6),
            RdbValue::AuxField {
                key: bytes("redis-ver"),
                value: bytes("3.2.1"),
            },
            RdbValue::Checksum(CHECKSUM.to_vec()),
        ],
        decode_chunked(&f, f.len())
    );
}

#[test]
fn single_string_in_selected_db() {
    let mut f = Vec::new();
    f.extend_from_slice(b"REDIS0006");
    f.extend([0xFE, 0x00]);
    f.push(0x00);
    f.extend(enc_str(b"mykey"));
    f.extend(enc_str(b"myvalue"));
    f.push(0xFF);
    f.extend_from_slice(&CHECKSUM);

    assert_eq!(
        vec![
            RdbValue::Version(6),
            RdbValue::SelectDb(0),
            RdbValue::String {
                key: bytes("mykey"),
                value: bytes("myvalue"),
                expiry: None,
            },
            RdbValue::Checksum(CHECKSUM.to_vec()),
        ],
        decode_chunked(&f, f.len())
    );
}

#[test]
fn millisecond_expiry_of_zero() {
    let mut f = Vec::new();
    f.extend_from_slice(b"REDIS0006");
    f.push(0xFC);
    f.extend(0u64.to_le_bytes());
    f.push(0x00);
    f.extend(enc_str(b"mykey"));
    f.extend(enc_str(b"myvalue"));
    f.push(0xFF);
    f.extend_from_slice(&CHECKSUM);

    let records = decode_chunked(&f, f.len());
    assert_eq!(
        RdbValue::String {
            key: bytes("mykey"),
            value: bytes("myvalue"),
            expiry: Some(Expiry::Millis(0)),
        },
        records[1]
    );
}

#[test]
fn intset_of_three() {
    let mut f = Vec::new();
    f.extend_from_slice(b"REDIS0006");
    f.push(0x0B);
    f.extend(enc_str(b"s"));
    f.extend(enc_str(&intset_u32(&[1, 2, 3])));
    f.push(0xFF);
    f.extend_from_slice(&CHECKSUM);

    let expected: HashSet<RdbString> = [1, 2, 3].into_iter().map(RdbString::Integer).collect();
    let records = decode_chunked(&f, f.len());
    assert_eq!(
        RdbValue::Set {
            key: bytes("s"),
            members: expected,
            expiry: None,
        },
        records[1]
    );
}

#[test]
fn lzf_string_round_trips() {
    let original = b"ab".repeat(100);

    let mut f = Vec::new();
    f.extend_from_slice(b"REDIS0006");
    f.push(0x00);
    f.extend(enc_str(b"big"));
    f.extend(enc_lzf(&original));
    f.push(0xFF);
    f.extend_from_slice(&CHECKSUM);

    let records = decode_chunked(&f, f.len());
    assert_eq!(
        RdbValue::String {
            key: bytes("big"),
            value: RdbString::Bytes(original),
            expiry: None,
        },
        records[1]
    );
}

#[test]
fn quicklist_spanning_many_ziplists() {
    let elements: Vec<String> = (1..=1200).map(|i| format!("elem{}", i)).collect();

    let mut f = Vec::new();
    f.extend_from_slice(b"REDIS0006");
    f.push(0x0E);
    f.extend(enc_str(b"q"));
    f.extend(enc_len(3));
    for part in elements.chunks(400) {
        let items: Vec<&[u8]> = part.iter().map(String::as_bytes).collect();
        f.extend(enc_str(&ziplist(&items)));
    }
    f.push(0xFF);
    f.extend_from_slice(&CHECKSUM);

    let records = decode_chunked(&f, f.len());
    match &records[1] {
        RdbValue::List { key, values, .. } => {
            assert_eq!(&bytes("q"), key);
            assert_eq!(1200, values.len());
            for (i, value) in values.iter().enumerate() {
                assert_eq!(&bytes(&format!("elem{}", i + 1)), value);
            }
        }
        other => panic!("expected a list, got {:?}", other),
    }
}

// ------------------------------------------------------- chunk boundaries

#[rstest]
#[case(1)]
#[case(2)]
#[case(3)]
#[case(5)]
#[case(8)]
#[case(13)]
#[case(64)]
#[case(1024)]
fn chunk_boundaries_are_invisible(#[case] chunk_size: usize) {
    let fixture = full_fixture();
    let whole = decode_chunked(&fixture, fixture.len());

    assert_eq!(full_fixture_records(), whole);
    assert_eq!(whole, decode_chunked(&fixture, chunk_size));
}

#[test]
fn string_larger_than_chunk() {
    let payload = vec![b'x'; 1000];

    let mut f = Vec::new();
    f.extend_from_slice(b"REDIS0006");
    f.push(0x00);
    f.extend(enc_str(b"big"));
    f.extend(enc_str(&payload));
    f.push(0xFF);
    f.extend_from_slice(&CHECKSUM);

    let records: Vec<_> = RdbParser::with_chunk_size(&f[..], 16)
        .map(Result::unwrap)
        .collect();

    assert_eq!(
        vec![
            RdbValue::Version(6),
            RdbValue::String {
                key: bytes("big"),
                value: RdbString::Bytes(payload),
                expiry: None,
            },
            RdbValue::Checksum(CHECKSUM.to_vec()),
        ],
        records
    );
}

#[test]
fn incomplete_unit_is_deferred_not_split() {
    let mut f = Vec::new();
    f.extend_from_slice(b"REDIS0006");
    f.push(0x00);
    f.extend(enc_str(b"mykey"));
    f.extend(enc_str(b"myvalue"));

    let mut decoder = RdbDecoder::new();
    // cut inside the value payload: only the header may come out
    let records = decoder.feed(&f[..f.len() - 3]).unwrap();
    assert_eq!(vec![RdbValue::Version(6)], records);

    let records = decoder.feed(&f[f.len() - 3..]).unwrap();
    assert_eq!(
        vec![RdbValue::String {
            key: bytes("mykey"),
            value: bytes("myvalue"),
            expiry: None,
        }],
        records
    );
}

// ----------------------------------------------------------------- errors

#[test]
fn truncated_stream_surfaces_leftover() {
    let fixture = full_fixture();
    let cut = fixture.len() - 12;

    let mut parser = RdbParser::with_chunk_size(&fixture[..cut], 64);
    let mut saw_truncated = false;
    for item in &mut parser {
        match item {
            Ok(_) => {}
            Err(RdbError::Truncated(leftover)) => {
                assert!(!leftover.is_empty());
                saw_truncated = true;
            }
            Err(other) => panic!("unexpected error: {}", other),
        }
    }
    assert!(saw_truncated);
}

#[test]
fn unknown_opcode_is_terminal() {
    let mut f = Vec::new();
    f.extend_from_slice(b"REDIS0006");
    f.push(0x42);

    let mut decoder = RdbDecoder::new();
    assert_eq!(vec![RdbValue::Version(6)], decoder.feed(&f).unwrap());
    assert!(matches!(
        decoder.feed(&[]),
        Err(RdbError::UnknownOpcode(0x42))
    ));
}

#[test]
fn zipmap_is_unsupported() {
    let mut f = Vec::new();
    f.extend_from_slice(b"REDIS0006");
    f.push(0x09);
    f.extend(enc_str(b"zm"));
    f.extend(enc_str(&[0xFF]));

    let mut decoder = RdbDecoder::new();
    assert_eq!(vec![RdbValue::Version(6)], decoder.feed(&f).unwrap());
    assert!(matches!(
        decoder.finish(),
        Err(RdbError::UnknownEncoding(9))
    ));
}

#[test]
fn missing_magic_is_terminal() {
    let mut decoder = RdbDecoder::new();
    assert!(matches!(
        decoder.feed(b"SQLITE100"),
        Err(RdbError::ParsingError { .. })
    ));
}

#[test]
fn records_before_error_are_preserved() {
    let mut f = Vec::new();
    f.extend_from_slice(b"REDIS0006");
    f.extend([0xFE, 0x02]);
    f.push(0x42);

    let mut parser = RdbParser::with_chunk_size(&f[..], 4);
    assert_eq!(RdbValue::Version(6), parser.next().unwrap().unwrap());
    assert_eq!(RdbValue::SelectDb(2), parser.next().unwrap().unwrap());
    assert!(matches!(
        parser.next(),
        Some(Err(RdbError::UnknownOpcode(0x42)))
    ));
    assert!(parser.next().is_none());
}

#[test]
fn collect_via_parse() {
    let fixture = full_fixture();
    let records = rdbstream::parse(&fixture[..]).unwrap();
    assert_eq!(full_fixture_records(), records);
}
