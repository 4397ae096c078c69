use bytes::Bytes;
use thiserror::Error;

use crate::resp::RespValue;

#[derive(Error, Debug, PartialEq)]
pub enum CommandError {
    #[error("invalid command")]
    InvalidCommand,
    #[error("invalid command argument")]
    InvalidCommandArgument,
    #[error("invalid PING command")]
    InvalidPingCommand,
    #[error("invalid ECHO command")]
    InvalidEchoCommand,
    #[error("invalid GET command")]
    InvalidGetCommand,
    #[error("invalid SET command")]
    InvalidSetCommand,
    #[error("invalid SET command value")]
    InvalidSetCommandValue,
    #[error("invalid SET command expiration")]
    InvalidSetCommandExpiration,
    #[error("invalid INFO command")]
    InvalidInfoCommand,
    #[error("invalid INFO section")]
    InvalidInfoSection,
    #[error("invalid REPLCONF command")]
    InvalidReplconfCommand,
    #[error("invalid PSYNC command")]
    InvalidPsyncCommand,
    #[error("invalid PSYNC offset")]
    InvalidPsyncOffset,
    #[error("invalid WAIT command")]
    InvalidWaitCommand,
    #[error("invalid WAIT command argument")]
    InvalidWaitCommandArgument,
    #[error("invalid CONFIG GET command")]
    InvalidConfigGetCommand,
    #[error("invalid CONFIG GET command argument")]
    InvalidConfigGetCommandArgument,
    #[error("invalid KEYS command")]
    InvalidKeysCommand,
    #[error("invalid glob pattern: {0}")]
    InvalidGlobPattern(String),
}

impl CommandError {
    /// The bytes sent back to the client for this error.
    ///
    /// Unknown commands get no reply at all. Every other error is answered
    /// with a null bulk string and the connection stays open.
    pub fn reply(&self) -> Option<Bytes> {
        match self {
            CommandError::InvalidCommand => None,
            _ => Some(RespValue::Null.encode()),
        }
    }
}
