use clap::Parser;

use kvrepl::server::{RedisServer, ServerArgs};

fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    tracing_subscriber::fmt().with_env_filter(env_filter).init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let server = RedisServer::from_args(ServerArgs::parse())?;
    server.run().await?;

    Ok(())
}
