use bytes::Bytes;

use crate::resp::encode_snapshot;

/// An RDB image with no keys, the bootstrap payload a master sends when it
/// has nothing persisted.
const EMPTY_RDB_HEX: &str = "524544495330303131fa0972656469732d76657205372e322e30fa0a72656469732d62697473c040fa056374696d65c26d08bc65fa08757365642d6d656dc2b0c41000fa08616f662d62617365c000fff06e3bfec0ff5aa2";

/// Opaque snapshot payload sent to a replica after `FULLRESYNC`.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    payload: Bytes,
}

impl Snapshot {
    pub fn new(payload: impl Into<Bytes>) -> Self {
        Self {
            payload: payload.into(),
        }
    }

    pub fn empty() -> Self {
        let payload = hex::decode(EMPTY_RDB_HEX).unwrap_or_default();
        Self::new(payload)
    }

    pub fn payload(&self) -> &Bytes {
        &self.payload
    }

    /// The payload framed for the wire.
    pub fn encode(&self) -> Bytes {
        encode_snapshot(&self.payload)
    }
}
