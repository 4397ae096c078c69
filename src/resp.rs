//! Redis Serialization Protocol (RESP) codec.
//!
//! Decoding works on a streaming byte buffer: [`RespMessage::decode`] either
//! yields one complete message together with the number of bytes it used, or
//! reports that more input is needed, or that the bytes can never form a valid
//! message. Every decoded message keeps the exact bytes it was parsed from so
//! write commands can be forwarded to replicas verbatim.
//!
//! Encoding goes through the [`RespValue`] builder.

use bytes::{BufMut, Bytes, BytesMut};
use thiserror::Error;

const CRLF: &[u8] = b"\r\n";

/// Deepest array nesting accepted from a peer. The top-level message is at
/// depth 0.
pub const MAX_NESTING_DEPTH: usize = 128;

/// Errors produced while decoding a RESP frame.
///
/// [`RespError::Incomplete`] is not a protocol violation: the caller must keep
/// its read cursor where it is and retry once more bytes have arrived.
#[derive(Error, Debug, PartialEq)]
pub enum RespError {
    #[error("incomplete frame")]
    Incomplete,
    #[error("unknown RESP type byte {0:#04x}")]
    UnknownType(u8),
    #[error("line is not terminated by CRLF")]
    MissingTerminator,
    #[error("invalid integer {0:?}")]
    InvalidInteger(String),
    #[error("invalid length header {0:?}")]
    InvalidLength(String),
    #[error("arrays nested too deeply")]
    NestingTooDeep,
}

impl RespError {
    pub fn is_incomplete(&self) -> bool {
        matches!(self, RespError::Incomplete)
    }
}

/// The five wire kinds, identified by their leading type byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RespKind {
    Integer,
    SimpleString,
    BulkString,
    Array,
    Error,
}

impl RespKind {
    fn from_type_byte(byte: u8) -> Option<Self> {
        match byte {
            b':' => Some(RespKind::Integer),
            b'+' => Some(RespKind::SimpleString),
            b'$' => Some(RespKind::BulkString),
            b'*' => Some(RespKind::Array),
            b'-' => Some(RespKind::Error),
            _ => None,
        }
    }
}

/// A decoded RESP message.
///
/// `raw` always holds the full wire encoding of the message. For arrays,
/// `payload` is the concatenation of the children's payloads and `elements`
/// holds the children themselves.
#[derive(Debug, Clone, PartialEq)]
pub struct RespMessage {
    kind: RespKind,
    raw: Bytes,
    payload: Bytes,
    elements: Vec<RespMessage>,
    null: bool,
}

impl RespMessage {
    /// Decodes the first message in `buffer`.
    ///
    /// The frame is first measured without allocating, so an array whose
    /// tail has not arrived yet is rejected as incomplete before any of its
    /// elements are copied.
    ///
    /// # Returns
    ///
    /// * `Ok((consumed, message))` - A complete message spanning `buffer[..consumed]`
    /// * `Err(RespError::Incomplete)` - The buffer holds a valid but unfinished prefix
    /// * `Err(_)` - Any other variant means the bytes are malformed
    pub fn decode(buffer: &[u8]) -> Result<(usize, RespMessage), RespError> {
        let frame_end = frame_length(buffer, 0)?;
        let frame = Bytes::copy_from_slice(&buffer[..frame_end]);

        Self::parse(&frame, 0)
    }

    /// Builds the message at the front of `buffer`, a frame already measured
    /// by [`frame_length`]. Children share `buffer`'s allocation.
    fn parse(buffer: &Bytes, depth: usize) -> Result<(usize, RespMessage), RespError> {
        let (kind, line, header_end) = read_header(buffer, depth)?;

        match kind {
            RespKind::SimpleString | RespKind::Error | RespKind::Integer => {
                Ok(Self::scalar(kind, buffer, header_end))
            }
            RespKind::BulkString => Self::decode_bulk_string(buffer, line, header_end),
            RespKind::Array => Self::decode_array(buffer, line, header_end, depth),
        }
    }

    fn scalar(kind: RespKind, buffer: &Bytes, end: usize) -> (usize, RespMessage) {
        (
            end,
            RespMessage {
                kind,
                raw: buffer.slice(..end),
                payload: buffer.slice(1..end - CRLF.len()),
                elements: Vec::new(),
                null: false,
            },
        )
    }

    fn decode_bulk_string(
        buffer: &Bytes,
        header: &[u8],
        header_end: usize,
    ) -> Result<(usize, RespMessage), RespError> {
        let length = parse_length(header)?;

        let Some(length) = length else {
            return Ok((
                header_end,
                RespMessage {
                    kind: RespKind::BulkString,
                    raw: buffer.slice(..header_end),
                    payload: Bytes::new(),
                    elements: Vec::new(),
                    null: true,
                },
            ));
        };

        let data_end = header_end + length;
        let frame_end = data_end + CRLF.len();

        if buffer.len() < frame_end {
            return Err(RespError::Incomplete);
        }

        if &buffer[data_end..frame_end] != CRLF {
            return Err(RespError::MissingTerminator);
        }

        Ok((
            frame_end,
            RespMessage {
                kind: RespKind::BulkString,
                raw: buffer.slice(..frame_end),
                payload: buffer.slice(header_end..data_end),
                elements: Vec::new(),
                null: false,
            },
        ))
    }

    fn decode_array(
        buffer: &Bytes,
        header: &[u8],
        header_end: usize,
        depth: usize,
    ) -> Result<(usize, RespMessage), RespError> {
        let count = parse_length(header)?;

        let mut cursor = header_end;
        let mut elements = Vec::with_capacity(count.unwrap_or(0).min(64));
        let mut payload = BytesMut::new();

        for _ in 0..count.unwrap_or(0) {
            let (consumed, element) = RespMessage::parse(&buffer.slice(cursor..), depth + 1)?;
            cursor += consumed;
            payload.extend_from_slice(&element.payload);
            elements.push(element);
        }

        Ok((
            cursor,
            RespMessage {
                kind: RespKind::Array,
                raw: buffer.slice(..cursor),
                payload: payload.freeze(),
                elements,
                null: count.is_none(),
            },
        ))
    }

    pub fn kind(&self) -> RespKind {
        self.kind
    }

    /// The exact bytes this message was decoded from.
    pub fn raw(&self) -> &Bytes {
        &self.raw
    }

    pub fn payload(&self) -> &Bytes {
        &self.payload
    }

    pub fn elements(&self) -> &[RespMessage] {
        &self.elements
    }

    /// True for `$-1\r\n` and `*-1\r\n`.
    pub fn is_null(&self) -> bool {
        self.null
    }

    /// The payload as UTF-8, if it is valid UTF-8.
    pub fn as_str(&self) -> Option<&str> {
        std::str::from_utf8(&self.payload).ok()
    }

    /// The value of an Integer message. `None` for other kinds and for
    /// integers outside the `i64` range, which still decode.
    pub fn as_integer(&self) -> Option<i64> {
        match self.kind {
            RespKind::Integer => parse_signed(&self.payload),
            _ => None,
        }
    }

    /// True if this is a simple string whose text equals `expected`.
    pub fn is_simple_string(&self, expected: &str) -> bool {
        self.kind == RespKind::SimpleString && self.payload.as_ref() == expected.as_bytes()
    }
}

/// Reads the type byte and header line of the frame starting at `buffer[0]`.
///
/// Returns the kind, the bytes between the type byte and the CRLF, and the
/// index right after the CRLF. Integer headers are validated here.
fn read_header(buffer: &[u8], depth: usize) -> Result<(RespKind, &[u8], usize), RespError> {
    if depth > MAX_NESTING_DEPTH {
        return Err(RespError::NestingTooDeep);
    }

    let Some(&type_byte) = buffer.first() else {
        return Err(RespError::Incomplete);
    };

    let kind = RespKind::from_type_byte(type_byte).ok_or(RespError::UnknownType(type_byte))?;

    let Some(newline) = buffer.iter().position(|&byte| byte == b'\n') else {
        return Err(RespError::Incomplete);
    };

    if newline < 2 || buffer[newline - 1] != b'\r' {
        return Err(RespError::MissingTerminator);
    }

    let line = &buffer[1..newline - 1];

    if kind == RespKind::Integer && !is_signed_digits(line) {
        return Err(RespError::InvalidInteger(
            String::from_utf8_lossy(line).into_owned(),
        ));
    }

    Ok((kind, line, newline + 1))
}

/// Measures the frame starting at `buffer[0]` without copying anything.
fn frame_length(buffer: &[u8], depth: usize) -> Result<usize, RespError> {
    let (kind, line, header_end) = read_header(buffer, depth)?;

    match kind {
        RespKind::SimpleString | RespKind::Error | RespKind::Integer => Ok(header_end),
        RespKind::BulkString => {
            let Some(length) = parse_length(line)? else {
                return Ok(header_end);
            };

            let data_end = header_end + length;
            let frame_end = data_end + CRLF.len();

            if buffer.len() < frame_end {
                return Err(RespError::Incomplete);
            }

            if &buffer[data_end..frame_end] != CRLF {
                return Err(RespError::MissingTerminator);
            }

            Ok(frame_end)
        }
        RespKind::Array => {
            let mut cursor = header_end;

            for _ in 0..parse_length(line)?.unwrap_or(0) {
                cursor += frame_length(&buffer[cursor..], depth + 1)?;
            }

            Ok(cursor)
        }
    }
}

/// An optional leading `-` followed by one or more decimal digits.
fn is_signed_digits(digits: &[u8]) -> bool {
    let unsigned = digits.strip_prefix(b"-").unwrap_or(digits);

    !unsigned.is_empty() && unsigned.iter().all(u8::is_ascii_digit)
}

/// Parses a bulk string length or array count. `-1` means null.
fn parse_length(header: &[u8]) -> Result<Option<usize>, RespError> {
    let invalid = || RespError::InvalidLength(String::from_utf8_lossy(header).into_owned());
    let length = parse_signed(header).ok_or_else(invalid)?;

    match length {
        -1 => Ok(None),
        n if n < 0 => Err(invalid()),
        n => usize::try_from(n).map(Some).map_err(|_| invalid()),
    }
}

/// Builder for RESP replies and requests.
#[derive(Debug, PartialEq, Clone)]
pub enum RespValue {
    SimpleString(String),
    Error(String),
    Integer(i64),
    BulkString(String),
    Array(Vec<RespValue>),
    Null,
}

impl RespValue {
    /// An array of bulk strings, the shape every client request has.
    pub fn command(parts: &[&str]) -> Self {
        RespValue::Array(
            parts
                .iter()
                .map(|part| RespValue::BulkString(part.to_string()))
                .collect(),
        )
    }

    pub fn encode(&self) -> Bytes {
        let mut buffer = BytesMut::new();
        self.encode_into(&mut buffer);
        buffer.freeze()
    }

    fn encode_into(&self, buffer: &mut BytesMut) {
        match self {
            RespValue::SimpleString(s) => {
                buffer.put_u8(b'+');
                buffer.put_slice(s.as_bytes());
                buffer.put_slice(CRLF);
            }
            RespValue::Error(e) => {
                buffer.put_u8(b'-');
                buffer.put_slice(e.as_bytes());
                buffer.put_slice(CRLF);
            }
            RespValue::Integer(i) => {
                buffer.put_slice(format!(":{}\r\n", i).as_bytes());
            }
            RespValue::BulkString(s) => {
                buffer.put_slice(format!("${}\r\n", s.len()).as_bytes());
                buffer.put_slice(s.as_bytes());
                buffer.put_slice(CRLF);
            }
            RespValue::Array(elements) => {
                buffer.put_slice(format!("*{}\r\n", elements.len()).as_bytes());

                for element in elements {
                    element.encode_into(buffer);
                }
            }
            RespValue::Null => buffer.put_slice(b"$-1\r\n"),
        }
    }
}

/// Frames a snapshot for transfer: `$<len>\r\n` followed by the raw bytes,
/// without a trailing CRLF.
pub fn encode_snapshot(payload: &[u8]) -> Bytes {
    let mut buffer = BytesMut::with_capacity(payload.len() + 16);
    buffer.put_slice(format!("${}\r\n", payload.len()).as_bytes());
    buffer.put_slice(payload);
    buffer.freeze()
}
