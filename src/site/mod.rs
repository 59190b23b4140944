//! The served site: document root, content typing and dispatch.
//!
//! A [`Site`] is built once from the configuration and shared read-only by
//! every connection.

pub mod resolver;
pub mod script;
pub mod static_file;

pub use resolver::{DispatchKind, ResolvedTarget, Resolver};
pub use script::ScriptRunner;

use anyhow::Context;
use tokio::io::AsyncWrite;

use crate::config::Config;
use crate::error::ServeError;
use crate::http::mime::MimeTable;
use crate::http::request::Request;
use crate::http::writer::ResponseWriter;

#[derive(Debug, Clone)]
pub struct Site {
    resolver: Resolver,
    mime: MimeTable,
    scripts: ScriptRunner,
    chunk_size: usize,
}

impl Site {
    /// Builds the site. The document root must already exist.
    pub fn new(cfg: &Config) -> anyhow::Result<Self> {
        cfg.validate()?;

        let resolver = Resolver::new(&cfg.site.document_root, &cfg.script)
            .with_context(|| {
                format!(
                    "Document root {} is not accessible",
                    cfg.site.document_root.display()
                )
            })?;

        Ok(Self {
            resolver,
            mime: MimeTable::new(&cfg.site.mime_types, cfg.site.case_insensitive_mime),
            scripts: ScriptRunner::new(&cfg.script, cfg.server.buffer_size),
            chunk_size: cfg.server.buffer_size,
        })
    }

    pub fn resolver(&self) -> &Resolver {
        &self.resolver
    }

    /// Answers `request` through `writer`.
    ///
    /// `Err` is only returned while nothing has been written, so the caller
    /// can still send the matching canned page.
    pub async fn respond<W>(
        &self,
        request: &Request,
        writer: &mut ResponseWriter<'_, W>,
    ) -> Result<(), ServeError>
    where
        W: AsyncWrite + Unpin,
    {
        let resolved = self.resolver.resolve(&request.target).await;
        tracing::debug!(uri = %request.target_lossy(), kind = ?resolved.kind, "Resolved request");

        match resolved.kind {
            DispatchKind::NotFound => Err(ServeError::NotFound),
            DispatchKind::Static => {
                let content_type = self.mime.content_type_for(&resolved.path);
                static_file::serve(writer, &resolved.path, content_type, self.chunk_size).await
            }
            DispatchKind::Script => self.scripts.run(writer, &resolved.path).await,
        }
    }
}
