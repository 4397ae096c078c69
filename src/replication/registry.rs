use std::{collections::HashMap, sync::Arc};

use bytes::Bytes;
use tokio::sync::{Notify, mpsc::UnboundedSender};
use tracing::{debug, info};

use crate::resp::RespValue;

/// `REPLCONF GETACK *`, sent to solicit an acknowledgment.
pub fn getack_command() -> Bytes {
    RespValue::command(&["REPLCONF", "GETACK", "*"]).encode()
}

/// Server-side bookkeeping for one connected replica.
#[derive(Debug)]
pub struct ReplicaHandle {
    sender: UnboundedSender<Bytes>,
    pub bytes_sent: u64,
    pub acked_offset: u64,
    pub acknowledged: bool,
    pub snapshot_sent: bool,
}

impl ReplicaHandle {
    fn send(&mut self, frame: Bytes) -> bool {
        let len = frame.len() as u64;

        if self.sender.send(frame).is_err() {
            return false;
        }

        self.bytes_sent += len;
        true
    }
}

/// All replicas connected to this node, keyed by their connection address.
///
/// Frames for a replica go through the writer channel of its connection, so
/// each replica sees writes in the order they were applied here.
#[derive(Debug, Default)]
pub struct ReplicaRegistry {
    replicas: HashMap<String, ReplicaHandle>,
    ack_notify: Arc<Notify>,
}

impl ReplicaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a replica that has issued PSYNC. It receives no propagated writes
    /// until [`ReplicaRegistry::mark_snapshot_sent`] is called.
    pub fn register(&mut self, address: String, sender: UnboundedSender<Bytes>) {
        info!(replica = %address, "registering replica");

        self.replicas.insert(
            address,
            ReplicaHandle {
                sender,
                bytes_sent: 0,
                acked_offset: 0,
                acknowledged: true,
                snapshot_sent: false,
            },
        );
    }

    pub fn mark_snapshot_sent(&mut self, address: &str) {
        if let Some(replica) = self.replicas.get_mut(address) {
            replica.snapshot_sent = true;
        }
    }

    pub fn remove(&mut self, address: &str) -> bool {
        let removed = self.replicas.remove(address).is_some();

        if removed {
            info!(replica = %address, "replica disconnected");
        }

        removed
    }

    pub fn get(&self, address: &str) -> Option<&ReplicaHandle> {
        self.replicas.get(address)
    }

    pub fn len(&self) -> usize {
        self.replicas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.replicas.is_empty()
    }

    /// Starts a propagation round: clears every ready replica's acknowledgment
    /// flag, then sends it `command` followed by a GETACK.
    ///
    /// Returns the number of replicas the command was delivered to. Replicas
    /// whose connection is gone are dropped.
    pub fn propagate(&mut self, command: &Bytes) -> usize {
        let getack = getack_command();
        let mut delivered = 0;

        self.replicas.retain(|address, replica| {
            if !replica.snapshot_sent {
                return true;
            }

            replica.acknowledged = false;

            let alive = replica.send(command.clone()) && replica.send(getack.clone());

            if alive {
                delivered += 1;
            } else {
                debug!(replica = %address, "dropping replica with closed connection");
            }

            alive
        });

        delivered
    }

    /// Sends a GETACK to every ready replica without starting a new round.
    pub fn request_acks(&mut self) -> usize {
        let getack = getack_command();
        let mut solicited = 0;

        for replica in self.replicas.values_mut() {
            if replica.snapshot_sent && replica.send(getack.clone()) {
                solicited += 1;
            }
        }

        solicited
    }

    /// Records a `REPLCONF ACK <offset>` received from `address`.
    pub fn acknowledge(&mut self, address: &str, offset: u64) -> bool {
        let Some(replica) = self.replicas.get_mut(address) else {
            return false;
        };

        replica.acknowledged = true;
        replica.acked_offset = offset;
        self.ack_notify.notify_waiters();

        true
    }

    /// Number of ready replicas that acknowledged the latest propagation round.
    pub fn acknowledged_count(&self) -> usize {
        self.replicas
            .values()
            .filter(|replica| replica.snapshot_sent && replica.acknowledged)
            .count()
    }

    /// Notified every time an acknowledgment is recorded.
    pub fn ack_notify(&self) -> Arc<Notify> {
        Arc::clone(&self.ack_notify)
    }
}
