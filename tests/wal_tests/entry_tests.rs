//! Tests for LogRecord encoding
//!
//! These tests verify:
//! - Exact byte layout of Set and Delete records
//! - Decoding of well-formed records
//! - Short reads and unknown actions

use std::io::Cursor;

use segkv::wal::{Action, LogRecord, MIN_RECORD_SIZE};
use segkv::SegError;

#[test]
fn test_set_record_layout() {
    let record = LogRecord::set(b"key".to_vec(), b"value".to_vec());
    let bytes = record.encode().unwrap();

    let mut expected = vec![b'S'];
    expected.extend_from_slice(&3u32.to_be_bytes());
    expected.extend_from_slice(b"key");
    expected.extend_from_slice(&5u32.to_be_bytes());
    expected.extend_from_slice(b"value");

    assert_eq!(&bytes[..], &expected[..]);
    assert_eq!(record.encoded_len(), expected.len());
}

#[test]
fn test_delete_record_has_zero_length_value() {
    let record = LogRecord::delete(b"gone".to_vec());
    let bytes = record.encode().unwrap();

    assert_eq!(bytes[0], b'D');
    assert_eq!(&bytes[bytes.len() - 4..], &0u32.to_be_bytes());
    assert_eq!(bytes.len(), MIN_RECORD_SIZE + 4);
    assert_eq!(record.action, Action::Delete);
    assert!(record.value.is_empty());
}

#[test]
fn test_decode_sequence_in_order() {
    let mut data = Vec::new();
    data.extend_from_slice(&LogRecord::set(b"a".to_vec(), b"1".to_vec()).encode().unwrap());
    data.extend_from_slice(&LogRecord::delete(b"a".to_vec()).encode().unwrap());

    let mut cursor = Cursor::new(data);
    let first = LogRecord::decode(&mut cursor).unwrap();
    let second = LogRecord::decode(&mut cursor).unwrap();

    assert_eq!(first, LogRecord::set(b"a".to_vec(), b"1".to_vec()));
    assert_eq!(second, LogRecord::delete(b"a".to_vec()));
}

#[test]
fn test_decode_truncated_record_is_eof() {
    let bytes = LogRecord::set(b"key".to_vec(), b"value".to_vec())
        .encode()
        .unwrap();
    let partial = &bytes[..bytes.len() - 2];

    let err = LogRecord::decode(&mut Cursor::new(partial)).unwrap_err();
    assert!(err.is_unexpected_eof(), "got {:?}", err);
}

#[test]
fn test_decode_unknown_action_is_format_error() {
    let mut bytes = LogRecord::set(b"k".to_vec(), b"v".to_vec())
        .encode()
        .unwrap()
        .to_vec();
    bytes[0] = b'X';

    let err = LogRecord::decode(&mut Cursor::new(bytes)).unwrap_err();
    assert!(matches!(err, SegError::Format(_)));
}

#[test]
fn test_empty_key_and_value() {
    let record = LogRecord::set(Vec::new(), Vec::new());
    let bytes = record.encode().unwrap();
    assert_eq!(bytes.len(), MIN_RECORD_SIZE);

    let decoded = LogRecord::decode(&mut Cursor::new(bytes.to_vec())).unwrap();
    assert_eq!(decoded, record);
}
