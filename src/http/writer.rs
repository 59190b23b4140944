use std::io;

use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::http::response::{self, ResponseHead, StatusCode};

/// Writes the single response of a connection.
///
/// Once any byte of a status line has been handed to the stream the writer
/// is committed: a later canned error is refused, so a client never sees two
/// responses on one connection.
pub struct ResponseWriter<'a, W> {
    stream: &'a mut W,
    committed: bool,
    written: u64,
}

impl<'a, W> ResponseWriter<'a, W>
where
    W: AsyncWrite + Unpin,
{
    pub fn new(stream: &'a mut W) -> Self {
        Self {
            stream,
            committed: false,
            written: 0,
        }
    }

    pub fn is_committed(&self) -> bool {
        self.committed
    }

    /// Body bytes written so far.
    pub fn body_written(&self) -> u64 {
        self.written
    }

    pub async fn send_head(&mut self, head: &ResponseHead) -> io::Result<()> {
        if self.committed {
            return Err(io::Error::other("response already started"));
        }

        self.committed = true;
        self.stream.write_all(&head.serialize()).await
    }

    pub async fn send_body(&mut self, chunk: &[u8]) -> io::Result<()> {
        if !self.committed {
            return Err(io::Error::other("body written before status line"));
        }

        self.stream.write_all(chunk).await?;
        self.written += chunk.len() as u64;
        Ok(())
    }

    /// Sends a canned error page unless a response was already started.
    ///
    /// Returns `false` when the page was not sent because output is committed.
    pub async fn send_canned(&mut self, status: StatusCode) -> io::Result<bool> {
        if self.committed {
            tracing::debug!(status = status.as_u16(), "Response already started, dropping error page");
            return Ok(false);
        }

        self.committed = true;
        self.stream.write_all(&response::canned(status)).await?;
        Ok(true)
    }

    pub async fn flush(&mut self) -> io::Result<()> {
        self.stream.flush().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn canned_page_refused_after_head() {
        let mut out: Vec<u8> = Vec::new();
        let mut writer = ResponseWriter::new(&mut out);

        writer.send_head(&ResponseHead::ok("text/html", None)).await.unwrap();
        writer.send_body(b"partial").await.unwrap();
        let sent = writer.send_canned(StatusCode::InternalServerError).await.unwrap();

        assert!(!sent);
        assert_eq!(writer.body_written(), 7);
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text.matches("HTTP/1.1").count(), 1);
        assert!(text.ends_with("partial"));
    }

    #[tokio::test]
    async fn body_requires_head() {
        let mut out: Vec<u8> = Vec::new();
        let mut writer = ResponseWriter::new(&mut out);

        assert!(writer.send_body(b"x").await.is_err());
        assert!(out.is_empty());
    }
}
