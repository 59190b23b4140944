//! Porter - minimal origin HTTP server
//!
//! Serves static files from a document root and relays the output of an
//! external script interpreter for script files.

pub mod bootstrap;
pub mod config;
pub mod error;
pub mod http;
pub mod server;
pub mod site;
