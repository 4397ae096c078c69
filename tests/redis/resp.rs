use kvrepl::resp::{RespError, RespKind, RespMessage, RespValue};

#[test]
fn test_decode_messages() {
    let test_cases: Vec<(&[u8], RespKind, &[u8], usize)> = vec![
        (b"+PONG\r\n", RespKind::SimpleString, b"PONG", 0),
        (b"-ERR unknown\r\n", RespKind::Error, b"ERR unknown", 0),
        (b":-42\r\n", RespKind::Integer, b"-42", 0),
        (b"$5\r\nmango\r\n", RespKind::BulkString, b"mango", 0),
        (b"$0\r\n\r\n", RespKind::BulkString, b"", 0),
        (b"*2\r\n$4\r\npear\r\n:7\r\n", RespKind::Array, b"pear7", 2),
        (b"*0\r\n", RespKind::Array, b"", 0),
    ];

    for (input, kind, payload, number_of_elements) in test_cases {
        let (consumed, message) = RespMessage::decode(input).unwrap();

        assert_eq!(consumed, input.len());
        assert_eq!(message.kind(), kind);
        assert_eq!(message.payload().as_ref(), payload);
        assert_eq!(message.raw().as_ref(), input);
        assert_eq!(message.elements().len(), number_of_elements);
        assert!(!message.is_null());
    }
}

#[test]
fn test_decode_null_bulk_string() {
    let (consumed, message) = RespMessage::decode(b"$-1\r\n").unwrap();

    assert_eq!(consumed, 5);
    assert_eq!(message.kind(), RespKind::BulkString);
    assert!(message.is_null());
    assert!(message.payload().is_empty());
}

#[test]
fn test_decode_nested_array() {
    let input = b"*3\r\n*2\r\n$4\r\npear\r\n$10\r\nstrawberry\r\n$5\r\napple\r\n$6\r\nbanana\r\n";
    let (consumed, message) = RespMessage::decode(input).unwrap();

    assert_eq!(consumed, input.len());
    assert_eq!(message.elements().len(), 3);
    assert_eq!(message.elements()[0].kind(), RespKind::Array);
    assert_eq!(message.elements()[0].elements()[1].as_str(), Some("strawberry"));
    assert_eq!(message.elements()[2].as_str(), Some("banana"));
    assert_eq!(message.payload().as_ref(), b"pearstrawberryapplebanana");
}

#[test]
fn test_decode_only_consumes_first_message() {
    let input = b"+OK\r\n*1\r\n$4\r\nPING\r\n";
    let (consumed, message) = RespMessage::decode(input).unwrap();

    assert_eq!(consumed, 5);
    assert!(message.is_simple_string("OK"));

    let (consumed, message) = RespMessage::decode(&input[consumed..]).unwrap();
    assert_eq!(consumed, 14);
    assert_eq!(message.elements()[0].as_str(), Some("PING"));
}

#[test]
fn test_decode_incomplete() {
    let test_cases: Vec<&[u8]> = vec![
        b"",
        b"+PON",
        b"$5\r\nman",
        b"$5\r\nmango",
        b"*2\r\n$4\r\npear\r\n",
    ];

    for input in test_cases {
        assert_eq!(RespMessage::decode(input), Err(RespError::Incomplete));
    }
}

#[test]
fn test_encode_values() {
    let test_cases = vec![
        (RespValue::SimpleString("OK".to_string()), "+OK\r\n"),
        (RespValue::Error("ERR unknown".to_string()), "-ERR unknown\r\n"),
        (RespValue::Integer(-3), ":-3\r\n"),
        (RespValue::BulkString("mango".to_string()), "$5\r\nmango\r\n"),
        (RespValue::Null, "$-1\r\n"),
        (RespValue::Array(vec![]), "*0\r\n"),
        (
            RespValue::command(&["REPLCONF", "GETACK", "*"]),
            "*3\r\n$8\r\nREPLCONF\r\n$6\r\nGETACK\r\n$1\r\n*\r\n",
        ),
    ];

    for (value, expected) in test_cases {
        assert_eq!(value.encode().as_ref(), expected.as_bytes());
    }
}
