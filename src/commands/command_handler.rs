use std::sync::Arc;

use bytes::Bytes;
use tokio::sync::{Mutex, RwLock};
use tracing::debug;

use crate::{
    commands::{
        command_error::CommandError,
        config_get::config_get,
        echo::echo,
        get::get,
        info::info,
        keys::keys,
        ping::ping,
        replication::{psync, replconf, wait},
        set::set,
    },
    key_value_store::KeyValueStore,
    replication::{ReplicaRegistry, propagate_write},
    resp::{RespKind, RespMessage, RespValue},
    server::RedisServer,
};

#[derive(Debug, PartialEq)]
pub enum CommandResult {
    NoResponse,
    Response(Bytes),
    /// A FULLRESYNC reply; the connection becomes a replica and must be sent
    /// a snapshot right after it.
    Sync(Bytes),
}

/// A decoded command: its upper-cased name, its arguments and the message it
/// was decoded from.
#[derive(Debug, PartialEq, Clone)]
pub struct CommandHandler {
    pub name: String,
    pub arguments: Vec<RespMessage>,
    pub input: RespMessage,
}

impl CommandHandler {
    pub fn new(input: RespMessage) -> Result<Self, CommandError> {
        if input.kind() != RespKind::Array {
            return Err(CommandError::InvalidCommand);
        }

        let elements = input.elements();

        let name = match elements.first().and_then(RespMessage::as_str) {
            Some(s) => s.to_uppercase(),
            None => return Err(CommandError::InvalidCommand),
        };

        let (name, rest_of_data) = match name.as_str() {
            "CONFIG" => {
                let sub_command = elements
                    .get(1)
                    .and_then(RespMessage::as_str)
                    .map(str::to_uppercase);

                // GET is the only CONFIG subcommand served.
                if sub_command.as_deref() != Some("GET") {
                    return Err(CommandError::InvalidConfigGetCommand);
                }

                ("CONFIG GET".to_string(), elements[2..].to_vec())
            }
            _ => (name, elements[1..].to_vec()),
        };

        Ok(Self {
            name,
            arguments: rest_of_data,
            input,
        })
    }

    /// Runs a command received from a client connection.
    ///
    /// An applied SET is forwarded to the replicas of this node.
    pub async fn handle_command(
        &self,
        client_address: &str,
        server: Arc<RwLock<RedisServer>>,
        store: Arc<Mutex<KeyValueStore>>,
        replicas: Arc<Mutex<ReplicaRegistry>>,
    ) -> Result<CommandResult, CommandError> {
        debug!(command = %self.name, client = %client_address, "handling command");

        match self.name.as_str() {
            "PING" => ping(&self.arguments),
            "ECHO" => echo(&self.arguments),
            "GET" => get(store, &self.arguments).await,
            "SET" => {
                // The store stays locked until the write is queued for every
                // replica, so replicas see writes in the order they were applied.
                let mut store_guard = store.lock().await;
                let response = set(&mut store_guard, &self.arguments)?;
                propagate_write(&server, &replicas, self.input.raw()).await;

                Ok(response)
            }
            "INFO" => info(server, &self.arguments).await,
            "REPLCONF" => replconf(client_address, replicas, &self.arguments).await,
            "PSYNC" => psync(server, &self.arguments).await,
            "WAIT" => wait(replicas, &self.arguments).await,
            "CONFIG GET" => config_get(server, &self.arguments).await,
            "KEYS" => keys(server, &self.arguments).await,
            _ => Err(CommandError::InvalidCommand),
        }
    }

    /// Runs a command received on a replica's link to its master.
    ///
    /// Only `REPLCONF GETACK` is answered, with the number of replication
    /// stream bytes processed before it. Every other reply is swallowed.
    pub async fn handle_command_for_master_link(
        &self,
        store: Arc<Mutex<KeyValueStore>>,
        processed_bytes: u64,
    ) -> Result<CommandResult, CommandError> {
        match self.name.as_str() {
            "SET" => {
                set(&mut *store.lock().await, &self.arguments)?;
                Ok(CommandResult::NoResponse)
            }
            "REPLCONF" if self.is_getack() => Ok(CommandResult::Response(
                RespValue::command(&["REPLCONF", "ACK", &processed_bytes.to_string()]).encode(),
            )),
            _ => {
                debug!(command = %self.name, "ignoring command from master");
                Ok(CommandResult::NoResponse)
            }
        }
    }

    fn is_getack(&self) -> bool {
        self.arguments
            .first()
            .and_then(RespMessage::as_str)
            .is_some_and(|sub_command| sub_command.eq_ignore_ascii_case("GETACK"))
    }
}

/// Reads a scalar argument as UTF-8 text.
pub(crate) fn string_argument(argument: &RespMessage) -> Result<String, CommandError> {
    if argument.kind() == RespKind::Array || argument.is_null() {
        return Err(CommandError::InvalidCommandArgument);
    }

    argument
        .as_str()
        .map(str::to_string)
        .ok_or(CommandError::InvalidCommandArgument)
}
