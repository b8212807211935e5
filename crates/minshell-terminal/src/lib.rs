//! Command interpreter for Minshell.
//!
//! Input lines are tokenized, the first token is looked up in a
//! case-insensitive registry, and the matching `Command` runs against a
//! `Session`. Every path argument goes through the `sandbox` module so no
//! command can reach outside the configured root.

mod archive_commands;
pub mod audit;
mod commands;
mod encoding_commands;
mod file_commands;
mod interpreter;
mod network_commands;
mod process_commands;
pub mod sandbox;
mod session;
mod system_commands;
mod text_commands;

#[cfg(test)]
mod test_utils;

/// Register every built-in command into a registry.
pub use commands::{VERSION_BANNER, register_builtins};
/// A single executable command trait.
pub use interpreter::Command;
/// Output produced by a command.
pub use interpreter::CommandOutput;
/// Registry of available commands with dispatch.
pub use interpreter::CommandRegistry;
/// Split a line into arguments, honouring double quotes.
pub use interpreter::tokenize;
/// Whether a sandboxed path may name a file, a directory, or either.
pub use sandbox::EntryRule;
/// Mutable state shared by every command in one session.
pub use session::{CLEAR_SCREEN, Frontend, Session};
