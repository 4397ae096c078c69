//! REPLCONF on a client-facing connection.
//!
//! A replica sends `listening-port` and `capa` during its handshake and
//! `ACK <offset>` whenever the master asks for it. `GETACK` only makes sense
//! on a replica's link to its master and is rejected here.

use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::debug;

use crate::{
    commands::{CommandError, CommandResult, command_handler::string_argument},
    replication::ReplicaRegistry,
    resp::{RespMessage, RespValue},
};

#[derive(Debug, PartialEq)]
enum ReplconfConfiguration {
    ListeningPort(u16),
    Capabilities(String),
    Ack(u64),
}

/// Represents the parsed arguments for the REPLCONF command.
#[derive(Debug, PartialEq)]
pub struct ReplconfArguments {
    configuration: ReplconfConfiguration,
}

impl ReplconfArguments {
    /// Parses and validates arguments for the REPLCONF command.
    ///
    /// # Arguments
    ///
    /// * `arguments` - Exactly two elements: the option name and its value
    ///
    /// # Returns
    ///
    /// * `Ok(ReplconfArguments)` - Successfully parsed arguments
    /// * `Err(CommandError::InvalidReplconfCommand)` - Wrong arity, an unknown
    ///   option or a value that does not parse
    pub fn parse(arguments: &[RespMessage]) -> Result<Self, CommandError> {
        let [option, value] = arguments else {
            return Err(CommandError::InvalidReplconfCommand);
        };

        let option = string_argument(option)?.to_lowercase();
        let value = string_argument(value)?;

        let configuration = match option.as_str() {
            "listening-port" => ReplconfConfiguration::ListeningPort(
                value
                    .parse::<u16>()
                    .map_err(|_| CommandError::InvalidReplconfCommand)?,
            ),
            "capa" => ReplconfConfiguration::Capabilities(value),
            "ack" => ReplconfConfiguration::Ack(
                value
                    .parse::<u64>()
                    .map_err(|_| CommandError::InvalidReplconfCommand)?,
            ),
            _ => return Err(CommandError::InvalidReplconfCommand),
        };

        Ok(Self { configuration })
    }
}

/// Handles the REPLCONF command.
///
/// # Arguments
///
/// * `client_address` - Address of the connection the command arrived on,
///   used to find the replica an ACK belongs to
/// * `replicas` - Registry of the replicas connected to this node
/// * `arguments` - Command arguments `[option, value]`
///
/// # Returns
///
/// * `Ok(CommandResult::Response)` - `+OK` for `listening-port` and `capa`
/// * `Ok(CommandResult::NoResponse)` - For `ACK`, which is never answered
/// * `Err(CommandError::InvalidReplconfCommand)` - If argument parsing fails
pub async fn replconf(
    client_address: &str,
    replicas: Arc<Mutex<ReplicaRegistry>>,
    arguments: &[RespMessage],
) -> Result<CommandResult, CommandError> {
    let replconf_arguments = ReplconfArguments::parse(arguments)?;

    match replconf_arguments.configuration {
        ReplconfConfiguration::ListeningPort(port) => {
            debug!(client = %client_address, port, "replica announced listening port");
            Ok(CommandResult::Response(
                RespValue::SimpleString("OK".to_string()).encode(),
            ))
        }
        ReplconfConfiguration::Capabilities(capability) => {
            debug!(client = %client_address, %capability, "replica announced capability");
            Ok(CommandResult::Response(
                RespValue::SimpleString("OK".to_string()).encode(),
            ))
        }
        ReplconfConfiguration::Ack(offset) => {
            if !replicas.lock().await.acknowledge(client_address, offset) {
                debug!(client = %client_address, offset, "ACK from unregistered connection");
            }

            Ok(CommandResult::NoResponse)
        }
    }
}
