//! Master/replica replication.
//!
//! The master side keeps a [`ReplicaRegistry`] of downstream replicas and
//! forwards every applied write to them. The replica side runs the handshake
//! in [`handshake`] once at startup and then consumes the master's command
//! stream (see [`crate::connection::handle_master_connection`]).

mod handshake;
mod registry;
mod snapshot;

use std::sync::Arc;

use bytes::Bytes;
use tokio::sync::{Mutex, RwLock};
use tracing::debug;

pub use handshake::{HandshakeError, MasterLink, connect_to_master, handshake};
pub use registry::{ReplicaHandle, ReplicaRegistry, getack_command};
pub use snapshot::Snapshot;

use crate::server::{RedisRole, RedisServer};

/// Forwards the raw bytes of an applied write command to every replica and
/// advances the master replication offset.
///
/// Replicas ignore this: their offset follows the bytes read from their own
/// master.
pub async fn propagate_write(
    server: &Arc<RwLock<RedisServer>>,
    replicas: &Arc<Mutex<ReplicaRegistry>>,
    command: &Bytes,
) {
    if server.read().await.role != RedisRole::Master {
        return;
    }

    let delivered = replicas.lock().await.propagate(command);

    let mut server_guard = server.write().await;
    server_guard.repl_offset += command.len() as u64;

    debug!(
        replicas = delivered,
        offset = server_guard.repl_offset,
        "propagated write command"
    );
}
