use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::config::Config;
use crate::error::ServeError;
use crate::http::request::Request;
use crate::http::writer::ResponseWriter;
use crate::site::Site;

/// Per-connection limits taken from the server configuration.
#[derive(Debug, Clone, Copy)]
pub struct ConnectionLimits {
    /// Upper bound of the single request read
    pub buffer_size: usize,
    pub max_path_length: usize,
    pub read_timeout: Option<Duration>,
}

impl ConnectionLimits {
    pub fn from_config(cfg: &Config) -> Self {
        Self {
            buffer_size: cfg.server.buffer_size,
            max_path_length: cfg.site.max_path_length,
            read_timeout: cfg.server.read_timeout(),
        }
    }
}

/// One accepted client: one request, one response, then close.
pub struct Connection<S> {
    stream: S,
    site: Arc<Site>,
    limits: ConnectionLimits,
    state: ConnectionState,
}

pub enum ConnectionState {
    Reading,
    Responding(Request),
    Closed,
}

impl<S> Connection<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    pub fn new(stream: S, site: Arc<Site>, limits: ConnectionLimits) -> Self {
        Self {
            stream,
            site,
            limits,
            state: ConnectionState::Reading,
        }
    }

    /// Drives the connection to completion.
    ///
    /// Only a failed request read is returned as an error. Everything after
    /// that is answered with a response or logged.
    pub async fn run(mut self) -> anyhow::Result<()> {
        let result = loop {
            match std::mem::replace(&mut self.state, ConnectionState::Closed) {
                ConnectionState::Reading => match self.read_request().await {
                    Ok(Some(req)) => self.state = ConnectionState::Responding(req),
                    Ok(None) => self.state = ConnectionState::Closed,
                    Err(e) => break Err(e),
                },

                ConnectionState::Responding(req) => {
                    self.respond(&req).await;
                    self.state = ConnectionState::Closed;
                }

                ConnectionState::Closed => break Ok(()),
            }
        };

        if let Err(e) = self.stream.shutdown().await {
            tracing::debug!(error = %e, "Shutdown after response failed");
        }

        result
    }

    /// Performs the single read. `None` when the peer sent nothing.
    pub async fn read_request(&mut self) -> anyhow::Result<Option<Request>> {
        let mut buf = vec![0u8; self.limits.buffer_size];

        let n = match self.limits.read_timeout {
            Some(limit) => tokio::time::timeout(limit, self.stream.read(&mut buf))
                .await
                .map_err(|_| anyhow::anyhow!("timed out reading request"))??,
            None => self.stream.read(&mut buf).await?,
        };

        if n == 0 {
            // Client closed connection
            return Ok(None);
        }

        buf.truncate(n);
        let request = Request::from_bytes(buf, self.limits.max_path_length);

        if request.malformed {
            tracing::debug!("No GET request line found, serving /");
        }
        tracing::info!(uri = %request.target_lossy(), "Requested path");

        Ok(Some(request))
    }

    async fn respond(&mut self, req: &Request) {
        let mut writer = ResponseWriter::new(&mut self.stream);

        if let Err(err) = self.site.respond(req, &mut writer).await {
            match &err {
                ServeError::NotFound => tracing::info!(uri = %req.target_lossy(), "Not found"),
                ServeError::ServerFault { .. } => {
                    tracing::error!(uri = %req.target_lossy(), error = %err, "Request failed")
                }
            }

            if let Err(e) = writer.send_canned(err.status()).await {
                tracing::debug!(error = %e, "Failed to send error page");
            }
        }

        if let Err(e) = writer.flush().await {
            tracing::debug!(error = %e, "Flush after response failed");
        }
    }
}
