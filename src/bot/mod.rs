//! Core bot functionality: command parsing, command handling, item lookups.
//!
//! The chat transport feeds raw lines into [`CommandHandler::handle`] along
//! with the sender's display name and sends whatever reply comes back. The
//! handler is transport-agnostic; the binary ships a console transport and a
//! real chat client plugs in the same way.

pub mod commands;
pub mod handler;
pub mod lookup;

pub use commands::{Command, CommandParser};
pub use handler::CommandHandler;
pub use lookup::ItemLookup;
