use std::path::Path;

use bytes::BytesMut;
use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncWrite};

use crate::error::ServeError;
use crate::http::response::ResponseHead;
use crate::http::writer::ResponseWriter;

/// Streams an existing file with an exact `Content-Length`.
///
/// The resolver already saw the file, so an open or stat failure here is a
/// server fault (500), not a 404. Errors after the head is sent truncate the
/// body and are only logged.
pub async fn serve<W>(
    writer: &mut ResponseWriter<'_, W>,
    path: &Path,
    content_type: &str,
    chunk_size: usize,
) -> Result<(), ServeError>
where
    W: AsyncWrite + Unpin,
{
    tracing::info!(path = %path.display(), "Serving file");

    let mut file = File::open(path)
        .await
        .map_err(|e| ServeError::fault("open file", e))?;
    let size = file
        .metadata()
        .await
        .map_err(|e| ServeError::fault("stat file", e))?
        .len();

    if let Err(e) = writer.send_head(&ResponseHead::ok(content_type, Some(size))).await {
        tracing::debug!(error = %e, "Client went away before body");
        return Ok(());
    }

    let mut buf = BytesMut::with_capacity(chunk_size);
    loop {
        buf.clear();
        match file.read_buf(&mut buf).await {
            Ok(0) => break,
            Ok(_) => {
                if let Err(e) = writer.send_body(&buf).await {
                    tracing::debug!(error = %e, path = %path.display(), "Client went away mid-body");
                    break;
                }
            }
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    path = %path.display(),
                    sent = writer.body_written(),
                    expected = size,
                    "Read failed after headers were sent, truncating"
                );
                break;
            }
        }
    }

    Ok(())
}
