use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use thiserror::Error;

pub const DEFAULT_PORT: u16 = 8989;
pub const DEFAULT_BANNER_PATH: &str = "file.txt";
const KEEPALIVE: Duration = Duration::from_secs(20);

#[derive(Parser, Debug)]
#[command(name = "TCPChat", version, about = "Line-oriented TCP chat server")]
pub struct Cli {
    /// Port to listen on
    pub port: Option<String>,

    #[arg(hide = true, trailing_var_arg = true, allow_hyphen_values = true)]
    pub extra: Vec<String>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("[USAGE]: ./TCPChat $port")]
    TooManyArguments,
    #[error("invalid port {0:?}")]
    InvalidPort(String),
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: IpAddr,
    pub port: u16,
    /// Greeting file, read again for every connection.
    pub banner_path: PathBuf,
    /// TCP keepalive idle time and probe interval; `None` leaves the OS default.
    pub keepalive: Option<Duration>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: DEFAULT_PORT,
            banner_path: PathBuf::from(DEFAULT_BANNER_PATH),
            keepalive: Some(KEEPALIVE),
        }
    }
}

impl Config {
    pub fn addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl TryFrom<Cli> for Config {
    type Error = ConfigError;

    fn try_from(cli: Cli) -> Result<Self, Self::Error> {
        if !cli.extra.is_empty() {
            return Err(ConfigError::TooManyArguments);
        }

        let port = match cli.port {
            Some(port) => port
                .parse()
                .map_err(|_| ConfigError::InvalidPort(port))?,
            None => DEFAULT_PORT,
        };

        Ok(Self {
            port,
            ..Self::default()
        })
    }
}
