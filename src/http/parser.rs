//! Request-line parsing.
//!
//! Deliberately permissive: anything that does not contain a terminated
//! `GET <target> ` sequence is treated as a request for "/". This is a
//! convenience default, not a validation step.

const GET_TOKEN: &[u8] = b"GET ";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestLine {
    /// A `GET` with its decoded target, byte for byte
    Get(Vec<u8>),
    /// No `GET ` token, no space after the target, or an empty target
    Malformed,
}

pub fn parse_request_line(buf: &[u8], max_path_length: usize) -> RequestLine {
    let Some(start) = find(buf, GET_TOKEN).map(|pos| pos + GET_TOKEN.len()) else {
        return RequestLine::Malformed;
    };

    let rest = &buf[start..];
    let Some(end) = rest.iter().position(|&b| b == b' ') else {
        return RequestLine::Malformed;
    };

    let raw_target = &rest[..end.min(max_path_length)];
    if raw_target.is_empty() {
        return RequestLine::Malformed;
    }

    RequestLine::Get(decode_spaces(raw_target))
}

/// Decodes `%20` to a space. Every other percent sequence is left as is.
///
/// This is not a general percent-decoder: `%2F` stays `%2F`, so encoded
/// slashes and dots never reach the resolver as path separators.
pub fn decode_spaces(raw: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(raw.len());
    let mut i = 0;

    while i < raw.len() {
        if raw[i..].starts_with(b"%20") {
            out.push(b' ');
            i += 3;
        } else {
            out.push(raw[i]);
            i += 1;
        }
    }

    out
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|w| w == needle)
}
