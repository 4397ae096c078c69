use std::sync::Arc;

use bytes::{Bytes, BytesMut};
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::net::tcp::OwnedWriteHalf;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, error, info, warn};

use crate::{
    commands::{CommandHandler, CommandResult},
    input::{CommandReadError, read_and_parse_resp},
    key_value_store::KeyValueStore,
    replication::{MasterLink, ReplicaRegistry},
    server::RedisServer,
};

/// Serves one client connection until the peer closes it.
///
/// Replies and, once the peer has issued PSYNC, propagated writes all go
/// through a single writer task, so frames leave in the order they were
/// queued.
pub async fn handle_client_connection(
    stream: TcpStream,
    client_address: String,
    server: Arc<RwLock<RedisServer>>,
    store: Arc<Mutex<KeyValueStore>>,
    replicas: Arc<Mutex<ReplicaRegistry>>,
) {
    let (mut reader, writer) = stream.into_split();
    let (sender, receiver) = mpsc::unbounded_channel();
    let writer_task = tokio::spawn(write_frames(writer, receiver));

    let mut buffer = BytesMut::with_capacity(4096);

    loop {
        let parsed_input = match read_and_parse_resp(&mut reader, &mut buffer).await {
            Ok(messages) => messages,
            Err(CommandReadError::ConnectionClosed) => {
                debug!(client = %client_address, "connection closed");
                break;
            }
            Err(e) => {
                warn!(client = %client_address, "error reading command: {}", e);
                break;
            }
        };

        for input in parsed_input {
            let command_handler = match CommandHandler::new(input) {
                Ok(handler) => handler,
                Err(e) => {
                    match e.reply() {
                        Some(reply) => {
                            debug!(client = %client_address, "rejecting request: {}", e);
                            queue_frame(&sender, reply);
                        }
                        None => debug!(client = %client_address, "ignoring request: {}", e),
                    }
                    continue;
                }
            };

            let command_result = match command_handler
                .handle_command(
                    &client_address,
                    Arc::clone(&server),
                    Arc::clone(&store),
                    Arc::clone(&replicas),
                )
                .await
            {
                Ok(result) => result,
                Err(e) => {
                    match e.reply() {
                        Some(reply) => {
                            debug!(client = %client_address, command = %command_handler.name, "command failed: {}", e);
                            queue_frame(&sender, reply);
                        }
                        None => {
                            warn!(client = %client_address, command = %command_handler.name, "unknown command")
                        }
                    }
                    continue;
                }
            };

            match command_result {
                CommandResult::NoResponse => (),
                CommandResult::Response(response) => queue_frame(&sender, response),
                CommandResult::Sync(response) => {
                    let snapshot = server.read().await.snapshot.encode();

                    // Registering, the reply and the snapshot happen under one
                    // lock so no propagated write can be queued between them.
                    let mut registry_guard = replicas.lock().await;
                    registry_guard.register(client_address.clone(), sender.clone());
                    queue_frame(&sender, response);
                    queue_frame(&sender, snapshot);
                    registry_guard.mark_snapshot_sent(&client_address);
                }
            }
        }
    }

    replicas.lock().await.remove(&client_address);

    drop(sender);
    if let Err(e) = writer_task.await {
        error!(client = %client_address, "writer task failed: {}", e);
    }
}

/// Consumes the command stream a replica receives from its master.
///
/// Writes are applied to the local store. Replies are suppressed except for
/// `REPLCONF GETACK`, which is answered with the number of stream bytes
/// processed before it. The replication offset of `server` follows the
/// processed byte count.
pub async fn handle_master_connection<S>(
    mut link: MasterLink<S>,
    server: Arc<RwLock<RedisServer>>,
    store: Arc<Mutex<KeyValueStore>>,
) where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let mut processed_bytes: u64 = 0;

    info!(master_repl_id = %link.master_repl_id, "streaming commands from master");

    loop {
        let parsed_input = match read_and_parse_resp(&mut link.stream, &mut link.buffer).await {
            Ok(messages) => messages,
            Err(CommandReadError::ConnectionClosed) => {
                info!("master closed the replication link");
                break;
            }
            Err(e) => {
                error!("error reading from master: {}", e);
                break;
            }
        };

        for input in parsed_input {
            let message_len = input.raw().len() as u64;

            match CommandHandler::new(input) {
                Ok(command_handler) => match command_handler
                    .handle_command_for_master_link(Arc::clone(&store), processed_bytes)
                    .await
                {
                    Ok(CommandResult::Response(response)) => {
                        if let Err(e) = write_to_stream(&mut link.stream, &response).await {
                            error!("error writing to master: {}", e);
                        }
                    }
                    Ok(_) => (),
                    Err(e) => {
                        warn!(command = %command_handler.name, "failed to apply command from master: {}", e)
                    }
                },
                Err(e) => debug!("ignoring message from master: {}", e),
            }

            processed_bytes += message_len;
            server.write().await.repl_offset = processed_bytes;
        }
    }
}

fn queue_frame(sender: &UnboundedSender<Bytes>, frame: Bytes) {
    if sender.send(frame).is_err() {
        debug!("dropping frame for closed connection");
    }
}

async fn write_frames(mut writer: OwnedWriteHalf, mut receiver: UnboundedReceiver<Bytes>) {
    while let Some(frame) = receiver.recv().await {
        if let Err(e) = write_to_stream(&mut writer, &frame).await {
            warn!("error writing to stream: {}", e);
            break;
        }
    }
}

async fn write_to_stream<W>(writer: &mut W, response: &[u8]) -> tokio::io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    writer.write_all(response).await?;
    writer.flush().await?;

    Ok(())
}
