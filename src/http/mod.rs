//! HTTP protocol implementation.
//!
//! This module implements the one-request-per-connection HTTP/1.1 subset the
//! server speaks: a single `GET` is read, exactly one response is written and
//! the connection is closed.
//!
//! # Architecture
//!
//! - **`connection`**: Drives one accepted connection through its states
//! - **`parser`**: Extracts the request target from the raw request bytes
//! - **`request`**: The per-connection request value
//! - **`response`**: Status codes, response heads and the canned error pages
//! - **`writer`**: Writes a response and guarantees only one is started
//! - **`mime`**: MIME type detection based on file extensions
//!
//! # Connection State Machine
//!
//! ```text
//!        ┌─────────────┐
//!        │   Reading   │ ← One read of at most `buffer_size` bytes
//!        └──────┬──────┘
//!               │ Request received
//!               ▼
//!        ┌──────────────────┐
//!        │   Responding     │ ← Resolve, dispatch, write response
//!        └──────┬───────────┘
//!               │ Response sent (or peer gone)
//!               ▼
//!        ┌──────────────────┐
//!        │    Closed        │ ← Socket shut down, never reused
//!        └──────────────────┘
//! ```

pub mod connection;
pub mod mime;
pub mod parser;
pub mod request;
pub mod response;
pub mod writer;
