use std::borrow::Cow;

use crate::http::parser::{self, RequestLine};

/// A request read from a client connection.
///
/// Lives for one connection only.
#[derive(Debug, Clone)]
pub struct Request {
    /// Bytes received in the single read
    pub raw: Vec<u8>,
    /// Decoded request target (e.g. "/index.html"). Not necessarily UTF-8:
    /// the bytes reach the filesystem unchanged.
    pub target: Vec<u8>,
    /// `true` when no usable `GET` line was found and the target defaulted
    /// to "/"
    pub malformed: bool,
}

impl Request {
    /// Builds a request from the bytes of one read.
    ///
    /// Never fails: a missing or unterminated `GET` line is served as a
    /// request for "/".
    pub fn from_bytes(raw: Vec<u8>, max_path_length: usize) -> Self {
        let (target, malformed) = match parser::parse_request_line(&raw, max_path_length) {
            RequestLine::Get(target) => (target, false),
            RequestLine::Malformed => (b"/".to_vec(), true),
        };

        Self {
            raw,
            target,
            malformed,
        }
    }

    /// Target for logging, with invalid UTF-8 replaced.
    pub fn target_lossy(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.target)
    }
}
