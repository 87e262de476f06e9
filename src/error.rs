//! Error types for the bus gateway and the command-connection layer.
//!
//! Mirrors the teacher's habit of one small [`thiserror`]-derived enum per
//! concern rather than a single crate-wide catch-all: decode failures,
//! gateway I/O failures, and command outcomes are distinct types because
//! callers handle them differently (§7 of the design doc).

use thiserror::Error;

/// A single telegram could not be sent or received on the bus.
///
/// Recoverable: the connection that triggered the send is told `ERR:BUS`;
/// the server and every other connection continue unaffected.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("bus I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("bus link closed")]
    Closed,
}

/// Result of parsing and dispatching one command line (§4.F `Outcome`).
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("unrecognised command")]
    InvalidCmd,
    #[error("recognised command with invalid arguments")]
    InvalidArgs,
    #[error("no matching bus reply within the deadline")]
    Timeout,
    #[error("bus send failed: {0}")]
    Bus(#[from] GatewayError),
}

impl CommandError {
    /// The short textual marker sent back to the client for this outcome.
    pub fn marker(&self) -> &'static str {
        match self {
            CommandError::InvalidCmd => "ERR:CMD",
            CommandError::InvalidArgs => "ERR:ARGS",
            CommandError::Timeout => "ERR:TIMEOUT",
            CommandError::Bus(_) => "ERR:BUS",
        }
    }
}
