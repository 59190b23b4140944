//! Mapping of request targets onto the document root.
//!
//! Every candidate is canonicalized and must still lie under the
//! canonical document root. Anything that escapes it (through `..`
//! segments or symlinks) resolves to `NotFound`.

use std::io;
use std::path::{Path, PathBuf};

use crate::config::ScriptConfig;

/// How a resolved target is answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchKind {
    Static,
    Script,
    NotFound,
}

/// A contained, canonical filesystem path and its dispatch kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTarget {
    /// Canonical path; empty for `NotFound`
    pub path: PathBuf,
    pub kind: DispatchKind,
}

impl ResolvedTarget {
    fn not_found() -> Self {
        Self {
            path: PathBuf::new(),
            kind: DispatchKind::NotFound,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Resolver {
    root: PathBuf,
    scripts: ScriptConfig,
    script_index: String,
}

impl Resolver {
    /// Creates a resolver for `document_root`, which must already exist.
    pub fn new(document_root: &Path, scripts: &ScriptConfig) -> io::Result<Self> {
        let root = std::fs::canonicalize(document_root)?;

        Ok(Self {
            root,
            script_index: format!("index.{}", scripts.index_extension()),
            scripts: scripts.clone(),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolves a decoded request target. The bytes are used as the path
    /// unchanged, so non-UTF-8 file names stay reachable.
    pub async fn resolve(&self, target: &[u8]) -> ResolvedTarget {
        let relative = &target[target.iter().take_while(|&&b| b == b'/').count()..];
        let candidate = self.root.join(target_path(relative));

        if target.ends_with(b"/") {
            if let Some(path) = self.contained_file(&candidate.join("index.html")).await {
                return ResolvedTarget {
                    path,
                    kind: DispatchKind::Static,
                };
            }
            if let Some(path) = self.contained_file(&candidate.join(&self.script_index)).await {
                return ResolvedTarget {
                    path,
                    kind: DispatchKind::Script,
                };
            }
            return ResolvedTarget::not_found();
        }

        match self.contained_file(&candidate).await {
            Some(path) => {
                let kind = if self.is_script(&path) {
                    DispatchKind::Script
                } else {
                    DispatchKind::Static
                };
                ResolvedTarget { path, kind }
            }
            None => ResolvedTarget::not_found(),
        }
    }

    fn is_script(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| self.scripts.is_script_extension(ext))
    }

    /// Canonical form of `candidate` if it is a regular file inside the root.
    async fn contained_file(&self, candidate: &Path) -> Option<PathBuf> {
        let path = tokio::fs::canonicalize(candidate).await.ok()?;

        if !path.starts_with(&self.root) {
            tracing::warn!(
                requested = %candidate.display(),
                resolved = %path.display(),
                "Rejected path escaping document root"
            );
            return None;
        }

        let meta = tokio::fs::metadata(&path).await.ok()?;
        meta.is_file().then_some(path)
    }
}

#[cfg(unix)]
fn target_path(bytes: &[u8]) -> &Path {
    use std::os::unix::ffi::OsStrExt;

    Path::new(std::ffi::OsStr::from_bytes(bytes))
}

#[cfg(not(unix))]
fn target_path(bytes: &[u8]) -> PathBuf {
    PathBuf::from(String::from_utf8_lossy(bytes).into_owned())
}
