use std::{ffi::OsString, path::PathBuf, sync::Arc};

use clap::Parser;
use rand::{Rng, distributions::Alphanumeric};
use thiserror::Error;
use tokio::{
    net::TcpListener,
    sync::{Mutex, RwLock},
};
use tracing::{error, info};

use crate::{
    connection::{handle_client_connection, handle_master_connection},
    key_value_store::KeyValueStore,
    replication::{ReplicaRegistry, Snapshot, connect_to_master},
};

const REPLICATION_ID_LENGTH: usize = 40;

#[derive(Error, Debug, PartialEq)]
pub enum CliError {
    #[error("invalid command line arguments: {0}")]
    InvalidArguments(String),
    #[error("invalid --replicaof value {0:?}, expected \"<host> <port>\"")]
    InvalidReplicaOf(String),
}

#[derive(Error, Debug)]
pub enum ServerError {
    #[error("failed to bind port {port}: {source}")]
    Bind {
        port: u16,
        source: std::io::Error,
    },
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Command line flags accepted by the server.
#[derive(Parser, Debug, Clone, PartialEq)]
#[command(name = "kvrepl", about = "In-memory key-value server with master/replica replication")]
pub struct ServerArgs {
    /// Port to listen on
    #[arg(long, default_value_t = 6379)]
    pub port: u16,

    /// Master to replicate from, as "<host> <port>"
    #[arg(long, value_name = "HOST PORT")]
    pub replicaof: Option<String>,

    /// Directory holding the snapshot file
    #[arg(long, default_value = "/tmp/redis-files")]
    pub dir: String,

    /// Name of the snapshot file
    #[arg(long, default_value = "dump.rdb")]
    pub dbfilename: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RedisRole {
    Master,
    Replica { host: String, port: u16 },
}

impl RedisRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            RedisRole::Master => "master",
            RedisRole::Replica { .. } => "slave",
        }
    }

    fn from_replicaof(replicaof: &str) -> Result<Self, CliError> {
        let invalid = || CliError::InvalidReplicaOf(replicaof.to_string());

        let mut parts = replicaof.split_whitespace();
        let (Some(host), Some(port), None) = (parts.next(), parts.next(), parts.next()) else {
            return Err(invalid());
        };

        let port = port.parse::<u16>().map_err(|_| invalid())?;

        Ok(RedisRole::Replica {
            host: host.to_string(),
            port,
        })
    }
}

/// Startup configuration together with this node's replication state.
#[derive(Debug)]
pub struct RedisServer {
    pub port: u16,
    pub role: RedisRole,
    pub repl_id: String,
    pub repl_offset: u64,
    pub rdb_directory: String,
    pub rdb_filename: String,
    pub snapshot: Snapshot,
}

impl RedisServer {
    /// Builds a server from a full argument list, program name included.
    pub fn new<I, T>(command_line_args: I) -> Result<Self, CliError>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        let args = ServerArgs::try_parse_from(command_line_args)
            .map_err(|e| CliError::InvalidArguments(e.to_string()))?;

        Self::from_args(args)
    }

    pub fn from_args(args: ServerArgs) -> Result<Self, CliError> {
        let role = match args.replicaof.as_deref() {
            Some(replicaof) => RedisRole::from_replicaof(replicaof)?,
            None => RedisRole::Master,
        };

        Ok(RedisServer {
            port: args.port,
            role,
            repl_id: generate_replication_id(),
            repl_offset: 0,
            rdb_directory: args.dir,
            rdb_filename: args.dbfilename,
            snapshot: Snapshot::empty(),
        })
    }

    pub fn rdb_path(&self) -> PathBuf {
        PathBuf::from(&self.rdb_directory).join(&self.rdb_filename)
    }

    /// Binds the configured port and serves connections until the process exits.
    pub async fn run(self) -> Result<(), ServerError> {
        let port = self.port;
        let listener = TcpListener::bind(("127.0.0.1", port))
            .await
            .map_err(|source| ServerError::Bind { port, source })?;

        self.serve(listener).await
    }

    /// Serves connections accepted on an already bound listener.
    ///
    /// In replica mode the handshake with the master runs first. A failed
    /// handshake is logged and the node keeps serving clients without a link
    /// to its master.
    pub async fn serve(mut self, listener: TcpListener) -> Result<(), ServerError> {
        self.port = listener.local_addr()?.port();
        info!(port = self.port, role = self.role.as_str(), "server listening");

        let role = self.role.clone();
        let listening_port = self.port;

        let server = Arc::new(RwLock::new(self));
        let store = Arc::new(Mutex::new(KeyValueStore::new()));
        let replicas = Arc::new(Mutex::new(ReplicaRegistry::new()));

        if let RedisRole::Replica { host, port } = role {
            match connect_to_master(&host, port, listening_port).await {
                Ok(link) => {
                    info!(master = %format!("{}:{}", host, port), "replication link established");
                    tokio::spawn(handle_master_connection(
                        link,
                        Arc::clone(&server),
                        Arc::clone(&store),
                    ));
                }
                Err(e) => error!("handshake with master {}:{} failed: {}", host, port, e),
            }
        }

        loop {
            let (stream, address) = match listener.accept().await {
                Ok(connection) => connection,
                Err(e) => {
                    error!("error accepting connection: {}", e);
                    continue;
                }
            };

            tokio::spawn(handle_client_connection(
                stream,
                address.to_string(),
                Arc::clone(&server),
                Arc::clone(&store),
                Arc::clone(&replicas),
            ));
        }
    }
}

fn generate_replication_id() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(REPLICATION_ID_LENGTH)
        .map(char::from)
        .collect()
}
