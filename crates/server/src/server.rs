use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, error, info};

use crate::banner;
use crate::config::Config;
use crate::room::Room;
use crate::session::handle_client;

/// Accepts connections and runs one session task per client.
pub struct Server {
    listener: TcpListener,
    room: Arc<Room>,
    config: Config,
}

impl Server {
    pub async fn bind(config: Config) -> anyhow::Result<Self> {
        let addr = config.addr();
        let listener = TcpListener::bind(addr)
            .await
            .with_context(|| format!("failed to bind {addr}"))?;

        Ok(Self {
            listener,
            room: Arc::new(Room::new()),
            config,
        })
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    pub fn room(&self) -> Arc<Room> {
        Arc::clone(&self.room)
    }

    /// Accept forever. A failed accept is logged and skipped.
    pub async fn run(self) -> anyhow::Result<()> {
        loop {
            let (stream, peer) = match self.listener.accept().await {
                Ok(conn) => conn,
                Err(e) => {
                    error!("failed to accept connection: {e}");
                    continue;
                }
            };

            if let Some(idle) = self.config.keepalive
                && let Err(e) = set_keepalive(&stream, idle)
            {
                debug!(%peer, "failed to enable keepalive: {e}");
            }

            let room = Arc::clone(&self.room);
            let banner_path = self.config.banner_path.clone();
            tokio::spawn(async move {
                info!(%peer, "client connected");
                let banner = banner::load(&banner_path).await;
                handle_client(stream, room, banner).await;
                info!(%peer, "client disconnected");
            });
        }
    }
}

fn set_keepalive(stream: &TcpStream, idle: Duration) -> std::io::Result<()> {
    let keepalive = socket2::TcpKeepalive::new()
        .with_time(idle)
        .with_interval(idle);
    socket2::SockRef::from(stream).set_tcp_keepalive(&keepalive)
}
