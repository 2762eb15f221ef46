//! Unix-socket event capture.
//!
//! An external input helper connects to the socket and exchanges
//! newline-delimited JSON: raw events in, dispositions out.

pub mod listener;
pub mod permission;
