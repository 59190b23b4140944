//! Startup preparation: document root seeding and interpreter check.

use std::path::Path;

use anyhow::Context;

use crate::config::Config;

const SAMPLE_INDEX: &str = "<!DOCTYPE html>
<html>
<head>
    <title>Welcome to Porter</title>
</head>
<body>
    <h1>Welcome to Porter</h1>
    <p>This is a sample HTML file being served by porter.</p>
    <p>Place your HTML files in the document root to serve them.</p>
</body>
</html>
";

const SAMPLE_PHP: &str = "<?php
    echo \"<h1>PHP is working!</h1>\";
    echo \"<p>This is generated by PHP running behind porter.</p>\";
    echo \"<h2>PHP Information</h2>\";
    phpinfo();
?>
";

/// Creates the document root with sample content when it does not exist.
///
/// An existing directory is left untouched. Returns whether it was created.
pub fn prepare_document_root(cfg: &Config) -> anyhow::Result<bool> {
    let root = &cfg.site.document_root;
    if root.exists() {
        return Ok(false);
    }

    tracing::info!(root = %root.display(), "Creating document root");
    create_private_dir(root)
        .with_context(|| format!("Failed to create document root {}", root.display()))?;

    seed(&root.join("index.html"), SAMPLE_INDEX);
    if cfg.script.is_script_extension("php") {
        seed(&root.join("info.php"), SAMPLE_PHP);
    }

    Ok(true)
}

/// Warns when the interpreter cannot be executed. Scripts then fail with 500.
pub fn check_interpreter(cfg: &Config) -> bool {
    let interpreter = &cfg.script.interpreter;
    let usable = is_executable(interpreter);

    if !usable {
        tracing::warn!(
            interpreter = %interpreter.display(),
            "Interpreter not found or not executable, scripts will not be processed correctly"
        );
    }
    usable
}

fn seed(path: &Path, contents: &str) {
    match std::fs::write(path, contents) {
        Ok(()) => tracing::info!(file = %path.display(), "Created sample file"),
        Err(e) => tracing::warn!(file = %path.display(), error = %e, "Failed to create sample file"),
    }
}

#[cfg(unix)]
fn create_private_dir(path: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::DirBuilderExt;

    std::fs::DirBuilder::new()
        .recursive(true)
        .mode(0o700)
        .create(path)
}

#[cfg(not(unix))]
fn create_private_dir(path: &Path) -> std::io::Result<()> {
    std::fs::create_dir_all(path)
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;

    std::fs::metadata(path)
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}
