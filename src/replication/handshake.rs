//! The replica side of the replication handshake.

use std::sync::LazyLock;

use bytes::{Buf, BytesMut};
use regex::Regex;
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;
use tracing::{debug, info};

use crate::resp::{RespError, RespKind, RespMessage, RespValue};

static FULLRESYNC_REGEX: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^FULLRESYNC [a-zA-Z0-9]{40} \d+$").ok());

#[derive(Error, Debug)]
pub enum HandshakeError {
    #[error("failed to connect to master: {0}")]
    Connect(std::io::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("master closed the connection")]
    ConnectionClosed,
    #[error("malformed reply from master: {0}")]
    Resp(#[from] RespError),
    #[error("unexpected reply to {step}: {reply}")]
    UnexpectedReply { step: &'static str, reply: String },
    #[error("invalid snapshot header {0:?}")]
    InvalidSnapshotHeader(String),
}

/// A connection to the master after a successful handshake.
///
/// `buffer` holds any bytes of the command stream that arrived together with
/// the snapshot; they must be processed before reading from `stream` again.
#[derive(Debug)]
pub struct MasterLink<S> {
    pub stream: S,
    pub buffer: BytesMut,
    pub master_repl_id: String,
    pub master_repl_offset: u64,
}

pub async fn connect_to_master(
    host: &str,
    port: u16,
    listening_port: u16,
) -> Result<MasterLink<TcpStream>, HandshakeError> {
    let stream = TcpStream::connect((host, port))
        .await
        .map_err(HandshakeError::Connect)?;

    handshake(stream, listening_port).await
}

/// Performs the replication handshake on an open connection to the master:
///
/// 1. PING, expecting PONG
/// 2. REPLCONF listening-port <port>, expecting OK
/// 3. REPLCONF capa psync2, expecting OK
/// 4. PSYNC ? -1, expecting FULLRESYNC <replid> <offset>
/// 5. Reading and discarding the snapshot that follows
///
/// Any unexpected reply aborts the handshake. There is no retry.
pub async fn handshake<S>(mut stream: S, listening_port: u16) -> Result<MasterLink<S>, HandshakeError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let mut buffer = BytesMut::with_capacity(4096);

    let reply = send_command(&mut stream, &mut buffer, &["PING"]).await?;
    expect_simple_string(&reply, "PING", "PONG")?;

    let port = listening_port.to_string();
    let reply = send_command(
        &mut stream,
        &mut buffer,
        &["REPLCONF", "listening-port", &port],
    )
    .await?;
    expect_simple_string(&reply, "REPLCONF listening-port", "OK")?;

    let reply = send_command(&mut stream, &mut buffer, &["REPLCONF", "capa", "psync2"]).await?;
    expect_simple_string(&reply, "REPLCONF capa", "OK")?;

    let reply = send_command(&mut stream, &mut buffer, &["PSYNC", "?", "-1"]).await?;
    let (master_repl_id, master_repl_offset) = parse_fullresync(&reply)?;
    info!(%master_repl_id, master_repl_offset, "full resynchronization accepted");

    let snapshot_size = receive_snapshot(&mut stream, &mut buffer).await?;
    debug!(snapshot_size, "discarded snapshot from master");

    Ok(MasterLink {
        stream,
        buffer,
        master_repl_id,
        master_repl_offset,
    })
}

async fn send_command<S>(
    stream: &mut S,
    buffer: &mut BytesMut,
    command: &[&str],
) -> Result<RespMessage, HandshakeError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    stream.write_all(&RespValue::command(command).encode()).await?;
    stream.flush().await?;

    loop {
        match RespMessage::decode(buffer) {
            Ok((consumed, message)) => {
                buffer.advance(consumed);
                return Ok(message);
            }
            Err(e) if e.is_incomplete() => fill_buffer(stream, buffer).await?,
            Err(e) => return Err(e.into()),
        }
    }
}

async fn fill_buffer<S>(stream: &mut S, buffer: &mut BytesMut) -> Result<(), HandshakeError>
where
    S: AsyncRead + Unpin,
{
    if stream.read_buf(buffer).await? == 0 {
        return Err(HandshakeError::ConnectionClosed);
    }

    Ok(())
}

fn expect_simple_string(
    reply: &RespMessage,
    step: &'static str,
    expected: &str,
) -> Result<(), HandshakeError> {
    if reply.is_simple_string(expected) {
        return Ok(());
    }

    Err(unexpected_reply(step, reply))
}

fn unexpected_reply(step: &'static str, reply: &RespMessage) -> HandshakeError {
    HandshakeError::UnexpectedReply {
        step,
        reply: String::from_utf8_lossy(reply.raw()).into_owned(),
    }
}

fn is_valid_fullresync(line: &str) -> bool {
    FULLRESYNC_REGEX
        .as_ref()
        .is_some_and(|re| re.is_match(line))
}

fn parse_fullresync(reply: &RespMessage) -> Result<(String, u64), HandshakeError> {
    let line = match reply.kind() {
        RespKind::SimpleString => reply.as_str().unwrap_or_default(),
        _ => "",
    };

    if !is_valid_fullresync(line) {
        return Err(unexpected_reply("PSYNC", reply));
    }

    let mut parts = line.split(' ').skip(1);
    let repl_id = parts.next().unwrap_or_default().to_string();
    let offset = parts
        .next()
        .and_then(|offset| offset.parse::<u64>().ok())
        .ok_or_else(|| unexpected_reply("PSYNC", reply))?;

    Ok((repl_id, offset))
}

/// Reads the `$<size>\r\n` header and exactly `size` snapshot bytes, leaving
/// whatever follows in `buffer`.
async fn receive_snapshot<S>(stream: &mut S, buffer: &mut BytesMut) -> Result<usize, HandshakeError>
where
    S: AsyncRead + Unpin,
{
    let header_end = loop {
        if let Some(position) = buffer.windows(2).position(|window| window == b"\r\n") {
            break position;
        }

        fill_buffer(stream, buffer).await?;
    };

    let header = String::from_utf8_lossy(&buffer[..header_end]).into_owned();
    let size = header
        .strip_prefix('$')
        .and_then(|size| size.parse::<usize>().ok())
        .ok_or_else(|| HandshakeError::InvalidSnapshotHeader(header.clone()))?;

    buffer.advance(header_end + 2);

    while buffer.len() < size {
        fill_buffer(stream, buffer).await?;
    }

    buffer.advance(size);

    Ok(size)
}
