use std::net::{Ipv4Addr, SocketAddr};
use std::sync::Arc;

use tokio::net::{TcpListener, TcpSocket};
use tracing::info;

use crate::config::{Config, ServerConfig};
use crate::http::connection::{Connection, ConnectionLimits};
use crate::site::Site;

/// Binds `0.0.0.0:<port>` with address reuse and the configured backlog.
pub fn bind(cfg: &ServerConfig) -> anyhow::Result<TcpListener> {
    let addr = SocketAddr::from((Ipv4Addr::UNSPECIFIED, cfg.port));
    let socket = TcpSocket::new_v4()?;
    socket.set_reuseaddr(true)?;
    socket.bind(addr)?;
    Ok(socket.listen(cfg.backlog)?)
}

pub async fn run(cfg: &Config, site: Arc<Site>) -> anyhow::Result<()> {
    let listener = bind(&cfg.server)?;
    let port = listener.local_addr()?.port();

    info!("Server started at http://localhost:{}", port);
    info!("Serving files from {}", site.resolver().root().display());
    info!("Try visiting: http://localhost:{}/ for the HTML sample", port);
    if let Some(ext) = cfg.script.extensions.first() {
        info!("Try visiting: http://localhost:{}/info.{} for the script sample", port, ext);
    }

    serve(listener, site, ConnectionLimits::from_config(cfg)).await
}

/// Accepts and handles connections one at a time, forever.
///
/// A connection is handled to completion before the next accept. Neither a
/// failed accept nor a failed connection stops the loop.
pub async fn serve(
    listener: TcpListener,
    site: Arc<Site>,
    limits: ConnectionLimits,
) -> anyhow::Result<()> {
    loop {
        let (socket, peer) = match listener.accept().await {
            Ok(accepted) => accepted,
            Err(e) => {
                tracing::warn!(error = %e, "Accept failed");
                continue;
            }
        };
        info!("Client connected: {}", peer);

        let conn = Connection::new(socket, site.clone(), limits);
        if let Err(e) = conn.run().await {
            tracing::error!("Connection error from {}: {}", peer, e);
        }
    }
}
