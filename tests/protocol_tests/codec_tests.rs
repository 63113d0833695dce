//! Codec Tests
//!
//! Tests for request encoding and reply decoding.

use std::io::{BufReader, Cursor};

use respline::protocol::{
    decode_reply, decode_reply_with_limits, encode_command, encode_reply, encoded_len, read_reply,
    write_reply, DecodeLimits, RawReply,
};
use respline::ResplineError;

fn decode_all(bytes: &[u8]) -> RawReply {
    let (reply, used) = decode_reply(bytes).unwrap();
    assert_eq!(used, bytes.len(), "decoder left bytes behind");
    reply
}

fn is_protocol_error<T: std::fmt::Debug>(result: respline::Result<T>) -> bool {
    matches!(result, Err(ResplineError::Protocol(_)))
}

// =============================================================================
// Request Encoding Tests
// =============================================================================

#[test]
fn test_encode_set() {
    let encoded = encode_command(&["SET", "k", "v"]);
    assert_eq!(encoded, b"*3\r\n$3\r\nSET\r\n$1\r\nk\r\n$1\r\nv\r\n".to_vec());
}

#[test]
fn test_encode_single_word() {
    assert_eq!(encode_command(&["PING"]), b"*1\r\n$4\r\nPING\r\n".to_vec());
}

#[test]
fn test_encode_empty_argument() {
    let encoded = encode_command(&["SET", "k", ""]);
    assert_eq!(encoded, b"*3\r\n$3\r\nSET\r\n$1\r\nk\r\n$0\r\n\r\n".to_vec());
}

#[test]
fn test_encode_binary_argument_unescaped() {
    let value: &[u8] = b"a\r\nb\x00\xff";
    let args: [&[u8]; 3] = [b"SET", b"k", value];
    let encoded = encode_command(&args);

    let mut expected = b"*3\r\n$3\r\nSET\r\n$1\r\nk\r\n$6\r\n".to_vec();
    expected.extend_from_slice(value);
    expected.extend_from_slice(b"\r\n");
    assert_eq!(encoded, expected);
}

#[test]
fn test_encoded_len_matches_output() {
    let args = ["MSET", "alpha", "1", "beta", "22222222222"];
    assert_eq!(encoded_len(&args), encode_command(&args).len());
}

// =============================================================================
// Reply Decoding Tests
// =============================================================================

#[test]
fn test_decode_status() {
    assert_eq!(decode_all(b"+OK\r\n"), RawReply::status("OK"));
}

#[test]
fn test_decode_server_error() {
    assert_eq!(
        decode_all(b"-ERR unknown command\r\n"),
        RawReply::error("ERR unknown command")
    );
}

#[test]
fn test_decode_integers() {
    assert_eq!(decode_all(b":1000\r\n"), RawReply::Integer(1000));
    assert_eq!(decode_all(b":-42\r\n"), RawReply::Integer(-42));
    assert_eq!(decode_all(b":0\r\n"), RawReply::Integer(0));
}

#[test]
fn test_decode_null_distinct_from_empty() {
    let null = decode_all(b"$-1\r\n");
    let empty = decode_all(b"$0\r\n\r\n");

    assert_eq!(null, RawReply::null_bulk());
    assert_eq!(empty, RawReply::bulk(""));
    assert_ne!(null, empty);
    assert!(null.is_null());
    assert!(!empty.is_null());

    assert_eq!(decode_all(b"*-1\r\n"), RawReply::null_array());
    assert_eq!(decode_all(b"*0\r\n"), RawReply::array(vec![]));
}

#[test]
fn test_decode_bulk_with_crlf_inside() {
    assert_eq!(decode_all(b"$4\r\na\r\nb\r\n"), RawReply::bulk("a\r\nb"));
}

#[test]
fn test_decode_nested_array() {
    let reply = decode_all(b"*3\r\n$1\r\na\r\n*2\r\n:1\r\n$-1\r\n+OK\r\n");
    assert_eq!(
        reply,
        RawReply::array(vec![
            RawReply::bulk("a"),
            RawReply::array(vec![RawReply::Integer(1), RawReply::null_bulk()]),
            RawReply::status("OK"),
        ])
    );
}

#[test]
fn test_decode_reports_consumed_bytes() {
    let bytes = b":1\r\n:2\r\n";
    let (first, used) = decode_reply(bytes).unwrap();
    assert_eq!(first, RawReply::Integer(1));
    assert_eq!(used, 4);

    let (second, _) = decode_reply(&bytes[used..]).unwrap();
    assert_eq!(second, RawReply::Integer(2));
}

#[test]
fn test_reply_round_trip() {
    let replies = vec![
        RawReply::status("QUEUED"),
        RawReply::error("WRONGTYPE Operation against a key"),
        RawReply::Integer(i64::MIN),
        RawReply::bulk(vec![0u8, 13, 10, 255]),
        RawReply::bulk(""),
        RawReply::null_bulk(),
        RawReply::null_array(),
        RawReply::array(vec![
            RawReply::array(vec![]),
            RawReply::array(vec![RawReply::bulk("x"), RawReply::Integer(7)]),
        ]),
    ];

    for reply in replies {
        assert_eq!(decode_all(&encode_reply(&reply)), reply);
    }
}

#[test]
fn test_bulk_round_trip_every_byte() {
    for byte in 0..=255u8 {
        let reply = RawReply::bulk(vec![byte]);
        assert_eq!(decode_all(&encode_reply(&reply)), reply, "byte 0x{:02x}", byte);
    }
}

#[test]
fn test_bulk_round_trip_lengths() {
    for len in [0usize, 1, 2, 3, 15, 16, 255, 256, 1023, 4096, 65_537] {
        // Cycle through every byte value so CR, LF and NUL land everywhere
        let data: Vec<u8> = (0..len).map(|i| (i % 256) as u8).collect();
        let reply = RawReply::bulk(data.clone());
        match decode_all(&encode_reply(&reply)) {
            RawReply::Bulk(Some(decoded)) => assert_eq!(decoded.as_ref(), &data[..], "len {}", len),
            other => panic!("Expected bulk of {} bytes, got {}", len, other.kind()),
        }
    }
}

// =============================================================================
// Malformed Input Tests
// =============================================================================

#[test]
fn test_unknown_tag_is_protocol_error() {
    assert!(is_protocol_error(decode_reply(b"!oops\r\n")));
}

#[test]
fn test_empty_input_is_protocol_error() {
    assert!(is_protocol_error(decode_reply(b"")));
}

#[test]
fn test_truncated_replies_are_protocol_errors() {
    let cases: &[&[u8]] = &[
        b"+OK",
        b":12",
        b"$5\r\nhel",
        b"$5\r\nhello",
        b"*2\r\n:1\r\n",
        b"*",
    ];
    for case in cases {
        assert!(
            is_protocol_error(decode_reply(case)),
            "expected protocol error for {:?}",
            String::from_utf8_lossy(case)
        );
    }
}

#[test]
fn test_bad_lengths_are_protocol_errors() {
    assert!(is_protocol_error(decode_reply(b"$-2\r\n")));
    assert!(is_protocol_error(decode_reply(b"*-5\r\n")));
    assert!(is_protocol_error(decode_reply(b"$abc\r\n")));
    assert!(is_protocol_error(decode_reply(b":12x\r\n")));
}

#[test]
fn test_bulk_missing_terminator() {
    assert!(is_protocol_error(decode_reply(b"$3\r\nabcXY")));
}

#[test]
fn test_bare_lf_rejected() {
    assert!(is_protocol_error(decode_reply(b"+OK\n")));
}

#[test]
fn test_limits_enforced() {
    let limits = DecodeLimits {
        max_bulk_len: 4,
        max_array_len: 2,
        max_depth: 1,
    };
    assert!(decode_reply_with_limits(b"$4\r\nabcd\r\n", &limits).is_ok());
    assert!(is_protocol_error(decode_reply_with_limits(b"$5\r\nabcde\r\n", &limits)));
    assert!(is_protocol_error(decode_reply_with_limits(b"*3\r\n:1\r\n:2\r\n:3\r\n", &limits)));
    assert!(is_protocol_error(decode_reply_with_limits(b"*1\r\n*1\r\n:1\r\n", &limits)));
}

// =============================================================================
// Stream Tests
// =============================================================================

#[test]
fn test_read_reply_from_stream_in_order() {
    let mut buf = Vec::new();
    write_reply(&mut buf, &RawReply::status("OK")).unwrap();
    write_reply(&mut buf, &RawReply::bulk("v")).unwrap();

    let mut reader = BufReader::new(Cursor::new(buf));
    let limits = DecodeLimits::default();
    assert_eq!(read_reply(&mut reader, &limits).unwrap(), RawReply::status("OK"));
    assert_eq!(read_reply(&mut reader, &limits).unwrap(), RawReply::bulk("v"));
}

#[test]
fn test_eof_before_reply_is_network_error() {
    let mut reader = BufReader::new(Cursor::new(Vec::<u8>::new()));
    let err = read_reply(&mut reader, &DecodeLimits::default()).unwrap_err();
    assert!(matches!(err, ResplineError::Network(_)));
    assert!(err.is_fatal());
}

#[test]
fn test_eof_mid_reply_is_protocol_error() {
    let mut reader = BufReader::new(Cursor::new(b"*2\r\n$1\r\na\r\n".to_vec()));
    let err = read_reply(&mut reader, &DecodeLimits::default()).unwrap_err();
    assert!(matches!(err, ResplineError::Protocol(_)));
}
