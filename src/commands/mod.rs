//! Command handlers for the CLI application.
//!
//! - `notify`: the daemon itself plus client commands (send, close, info, capabilities)

pub mod notify;

/// Result type for command handlers
pub type CommandResult = Result<(), Box<dyn std::error::Error>>;
