use std::fmt;
use std::io;

use crate::http::response::StatusCode;

/// Failure detected while answering a request, before anything was sent.
///
/// Each variant maps to one of the canned error responses.
#[derive(Debug)]
pub enum ServeError {
    /// Resolved path does not exist (after index fallback) or escapes the
    /// document root
    NotFound,
    /// Pipe, spawn, open or stat failure
    ServerFault {
        context: &'static str,
        source: io::Error,
    },
}

impl ServeError {
    pub fn fault(context: &'static str, source: io::Error) -> Self {
        ServeError::ServerFault { context, source }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ServeError::NotFound => StatusCode::NotFound,
            ServeError::ServerFault { .. } => StatusCode::InternalServerError,
        }
    }
}

impl fmt::Display for ServeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServeError::NotFound => write!(f, "resource not found"),
            ServeError::ServerFault { context, source } => write!(f, "{context}: {source}"),
        }
    }
}

impl std::error::Error for ServeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ServeError::NotFound => None,
            ServeError::ServerFault { source, .. } => Some(source),
        }
    }
}
