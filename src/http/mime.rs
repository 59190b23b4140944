use std::collections::HashMap;
use std::path::Path;

pub const FALLBACK_TYPE: &str = "application/octet-stream";

const BUILTIN_TYPES: &[(&str, &str)] = &[
    ("html", "text/html"),
    ("htm", "text/html"),
    ("css", "text/css"),
    ("js", "application/javascript"),
    ("jpg", "image/jpeg"),
    ("jpeg", "image/jpeg"),
    ("png", "image/png"),
    ("gif", "image/gif"),
    ("txt", "text/plain"),
    ("php", "text/html"),
];

/// Read-only extension to MIME type mapping.
#[derive(Debug, Clone)]
pub struct MimeTable {
    types: HashMap<String, String>,
    case_insensitive: bool,
}

impl Default for MimeTable {
    fn default() -> Self {
        Self::new(&HashMap::new(), false)
    }
}

impl MimeTable {
    /// Builds the table from the built-in entries with `extra` layered on
    /// top. Keys are lower-cased up front when lookups are case-insensitive.
    pub fn new(extra: &HashMap<String, String>, case_insensitive: bool) -> Self {
        let normalize = |ext: &str| {
            if case_insensitive {
                ext.to_ascii_lowercase()
            } else {
                ext.to_string()
            }
        };

        let mut types: HashMap<String, String> = BUILTIN_TYPES
            .iter()
            .map(|(ext, ty)| (normalize(ext), ty.to_string()))
            .collect();
        for (ext, ty) in extra {
            types.insert(normalize(ext), ty.clone());
        }

        Self {
            types,
            case_insensitive,
        }
    }

    pub fn lookup(&self, extension: &str) -> &str {
        let hit = if self.case_insensitive {
            self.types.get(&extension.to_ascii_lowercase())
        } else {
            self.types.get(extension)
        };
        hit.map(String::as_str).unwrap_or(FALLBACK_TYPE)
    }

    pub fn content_type_for(&self, path: &Path) -> &str {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| self.lookup(ext))
            .unwrap_or(FALLBACK_TYPE)
    }
}
