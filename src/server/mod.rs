//! Listening socket and the sequential accept loop.

pub mod listener;
