//! An in-memory key-value server speaking the Redis Serialization Protocol.
//!
//! This crate provides a Redis-compatible server that supports:
//!
//! - Basic key-value operations (GET, SET with PX expiry)
//! - Server commands (PING, ECHO, INFO, CONFIG GET, KEYS)
//! - Master-replica replication (REPLCONF, PSYNC, WAIT)
//!
//! Every accepted connection is served by its own Tokio task. The key-value
//! store, the replica registry and the server state each sit behind their own
//! lock. When more than one is needed they are always acquired in the order
//! store, replica registry, server.

pub mod commands;
pub mod connection;
pub mod input;
pub mod key_value_store;
pub mod rdb;
pub mod replication;
pub mod resp;
pub mod server;
