//! Reading RESP messages off a network stream.
//!
//! Bytes are accumulated in a [`BytesMut`] owned by the caller so a message
//! split across several reads is completed by later reads, and several
//! pipelined messages arriving in one read are all returned.

use bytes::{Buf, BytesMut};
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt};
use tracing::warn;

use crate::resp::RespMessage;

/// Errors that can occur while reading commands from network streams.
#[derive(Error, Debug, PartialEq)]
pub enum CommandReadError {
    #[error("I/O error: {0}")]
    IoError(String),
    #[error("Connection closed")]
    ConnectionClosed,
}

/// Decodes every complete message at the front of `buffer`, removing the
/// consumed bytes.
///
/// An unfinished trailing message stays in the buffer. Malformed input cannot
/// be resynchronized, so it is logged and the buffered bytes are discarded.
pub fn parse_buffered_messages(buffer: &mut BytesMut) -> Vec<RespMessage> {
    let mut messages = Vec::new();

    loop {
        match RespMessage::decode(buffer) {
            Ok((consumed, message)) => {
                buffer.advance(consumed);
                messages.push(message);
            }
            Err(e) if e.is_incomplete() => break,
            Err(e) => {
                warn!(
                    "discarding {} bytes of malformed input: {}",
                    buffer.len(),
                    e
                );
                buffer.clear();
                break;
            }
        }
    }

    messages
}

/// Returns the next batch of complete messages, reading from `stream` only
/// when `buffer` does not already hold one.
///
/// # Returns
///
/// * `Ok(Vec<RespMessage>)` - At least one complete message
/// * `Err(CommandReadError::IoError)` - If reading from the stream fails
/// * `Err(CommandReadError::ConnectionClosed)` - If the peer closed the connection
pub async fn read_and_parse_resp<R>(
    stream: &mut R,
    buffer: &mut BytesMut,
) -> Result<Vec<RespMessage>, CommandReadError>
where
    R: AsyncRead + Unpin,
{
    loop {
        let messages = parse_buffered_messages(buffer);

        if !messages.is_empty() {
            return Ok(messages);
        }

        let number_of_bytes = stream
            .read_buf(buffer)
            .await
            .map_err(|e| CommandReadError::IoError(e.to_string()))?;

        if number_of_bytes == 0 {
            return Err(CommandReadError::ConnectionClosed);
        }
    }
}
