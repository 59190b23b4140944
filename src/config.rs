//! Server configuration
//!
//! Loaded once at startup from YAML and never mutated afterwards.

use anyhow::Context;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default configuration file looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "porter.yaml";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub site: SiteConfig,
    pub script: ScriptConfig,
}

/// Listening socket and per-connection settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// TCP port, bound on all interfaces
    pub port: u16,
    /// Listen backlog length
    pub backlog: u32,
    /// Size of the single request read and of every body chunk
    pub buffer_size: usize,
    /// Deadline for reading the request; none waits forever
    pub read_timeout_secs: Option<u64>,
}

/// Document root and content typing.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    pub document_root: PathBuf,
    /// Request targets longer than this many bytes are truncated
    pub max_path_length: usize,
    /// Extra extension to MIME type entries, merged over the built-in table
    pub mime_types: HashMap<String, String>,
    pub case_insensitive_mime: bool,
}

/// External interpreter used for script files.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ScriptConfig {
    pub interpreter: PathBuf,
    /// Extensions dispatched to the interpreter, compared case-insensitively
    pub extensions: Vec<String>,
    /// Content-Type sent with interpreter output
    pub content_type: String,
    /// Kill the interpreter after this long; none lets it run indefinitely
    pub timeout_secs: Option<u64>,
    /// Hold the status line until the interpreter produced output or exited
    pub defer_headers: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            backlog: 10,
            buffer_size: 4096,
            read_timeout_secs: None,
        }
    }
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            document_root: PathBuf::from("./www"),
            max_path_length: 255,
            mime_types: HashMap::new(),
            case_insensitive_mime: false,
        }
    }
}

impl Default for ScriptConfig {
    fn default() -> Self {
        Self {
            interpreter: PathBuf::from("/usr/bin/php"),
            extensions: vec!["php".to_string()],
            content_type: "text/html".to_string(),
            timeout_secs: None,
            defer_headers: false,
        }
    }
}

impl ServerConfig {
    pub fn read_timeout(&self) -> Option<Duration> {
        self.read_timeout_secs.map(Duration::from_secs)
    }
}

impl ScriptConfig {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }

    /// Extension used for the script index file (`index.<ext>`).
    pub fn index_extension(&self) -> &str {
        self.extensions.first().map(String::as_str).unwrap_or("php")
    }

    pub fn is_script_extension(&self, ext: &str) -> bool {
        self.extensions.iter().any(|e| e.eq_ignore_ascii_case(ext))
    }
}

impl Config {
    /// Loads the configuration.
    ///
    /// The file named by `PORTER_CONFIG` is used when set, otherwise
    /// `porter.yaml` if it exists, otherwise built-in defaults. The
    /// `PORTER_PORT`, `PORTER_DOCUMENT_ROOT` and `PORTER_INTERPRETER`
    /// environment variables override the loaded values.
    pub fn load() -> anyhow::Result<Self> {
        let mut cfg = match std::env::var("PORTER_CONFIG") {
            Ok(path) => Self::from_file(&path)?,
            Err(_) if Path::new(DEFAULT_CONFIG_FILE).exists() => {
                Self::from_file(DEFAULT_CONFIG_FILE)?
            }
            Err(_) => Self::default(),
        };

        cfg.apply_env()?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_yaml(&raw)
            .with_context(|| format!("Invalid config file {}", path.display()))
    }

    pub fn from_yaml(raw: &str) -> anyhow::Result<Self> {
        // An empty document deserializes to unit, not to a map.
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        let cfg: Self = serde_yaml::from_str(raw)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Rejects values the server cannot run with.
    pub fn validate(&self) -> anyhow::Result<()> {
        // A zero-length read buffer reads zero bytes, which looks like a
        // closed peer on every connection.
        anyhow::ensure!(self.server.buffer_size > 0, "server.buffer_size must be greater than 0");
        Ok(())
    }

    fn apply_env(&mut self) -> anyhow::Result<()> {
        if let Ok(port) = std::env::var("PORTER_PORT") {
            self.server.port = port
                .parse()
                .with_context(|| format!("Invalid PORTER_PORT value {port:?}"))?;
        }
        if let Ok(root) = std::env::var("PORTER_DOCUMENT_ROOT") {
            self.site.document_root = PathBuf::from(root);
        }
        if let Ok(interpreter) = std::env::var("PORTER_INTERPRETER") {
            self.script.interpreter = PathBuf::from(interpreter);
        }
        Ok(())
    }
}
