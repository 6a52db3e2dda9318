use digitnet::config::ServerConfig;
use digitnet::prelude::*;
use digitnet::server;

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let config = ServerConfig::from_env()?;
    server::serve(config).await
}
