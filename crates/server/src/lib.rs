use clap::Parser;
use tracing::info;

pub mod banner;
pub mod broadcast;
pub mod command;
pub mod config;
pub mod error;
pub mod history;
pub mod message;
pub mod registry;
pub mod room;
pub mod server;
pub mod session;

pub use config::{Cli, Config, ConfigError};
pub use room::Room;
pub use server::Server;

pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = match Config::try_from(cli) {
        Ok(config) => config,
        Err(usage @ ConfigError::TooManyArguments) => {
            println!("{usage}");
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    let server = Server::bind(config).await?;
    let port = server.local_addr()?.port();
    println!("Chat server started on port {port}...");
    info!(port, "listening");

    server.run().await
}
