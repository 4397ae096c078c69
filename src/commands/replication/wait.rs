use std::{sync::Arc, time::Duration};

use tokio::{sync::Mutex, time::timeout};
use tracing::debug;

use crate::{
    commands::{CommandError, CommandResult, command_handler::string_argument},
    replication::ReplicaRegistry,
    resp::{RespMessage, RespValue},
};

pub struct WaitArguments {
    pub number_of_replicas: usize,
    pub timeout: Duration,
}

impl WaitArguments {
    pub fn parse(arguments: &[RespMessage]) -> Result<Self, CommandError> {
        let [number_of_replicas, timeout] = arguments else {
            return Err(CommandError::InvalidWaitCommand);
        };

        let number_of_replicas = string_argument(number_of_replicas)?
            .parse::<usize>()
            .map_err(|_| CommandError::InvalidWaitCommandArgument)?;

        let timeout = string_argument(timeout)?
            .parse::<u64>()
            .map_err(|_| CommandError::InvalidWaitCommandArgument)?;

        Ok(Self {
            number_of_replicas,
            timeout: Duration::from_millis(timeout),
        })
    }
}

/// Asks every replica for an acknowledgment and waits until
/// `number_of_replicas` of them have acknowledged the latest write, or until
/// the timeout elapses. A zero timeout returns right away.
///
/// Replies with the number of acknowledged replicas when the wait ends.
pub async fn wait(
    replicas: Arc<Mutex<ReplicaRegistry>>,
    arguments: &[RespMessage],
) -> Result<CommandResult, CommandError> {
    let wait_arguments = WaitArguments::parse(arguments)?;

    let (ack_notify, acknowledged) = {
        let mut registry_guard = replicas.lock().await;
        let solicited = registry_guard.request_acks();
        debug!(solicited, "requested acknowledgments from replicas");

        (registry_guard.ack_notify(), registry_guard.acknowledged_count())
    };

    if wait_arguments.timeout.is_zero() || acknowledged >= wait_arguments.number_of_replicas {
        return Ok(CommandResult::Response(
            RespValue::Integer(acknowledged as i64).encode(),
        ));
    }

    let wait_for_acks = async {
        loop {
            let notified = ack_notify.notified();
            tokio::pin!(notified);
            // Register before checking so an ACK landing in between is not missed.
            notified.as_mut().enable();

            let acknowledged = replicas.lock().await.acknowledged_count();
            if acknowledged >= wait_arguments.number_of_replicas {
                return acknowledged;
            }

            notified.await;
        }
    };

    let acknowledged = match timeout(wait_arguments.timeout, wait_for_acks).await {
        Ok(acknowledged) => acknowledged,
        Err(_) => replicas.lock().await.acknowledged_count(),
    };

    Ok(CommandResult::Response(
        RespValue::Integer(acknowledged as i64).encode(),
    ))
}
