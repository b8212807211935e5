//! Error types for Minshell.

use std::io;

/// Reasons the path sandbox refuses a user-supplied path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SandboxViolation {
    /// The canonical path does not lie under the session root.
    #[error("Blocked: outside root.")]
    OutsideRoot,

    /// The path names an existing regular file where only directories are accepted.
    #[error("Blocked: file not allowed.")]
    FileNotAllowed,

    /// The path names an existing directory where only files are accepted.
    #[error("Blocked: directory not allowed.")]
    DirectoryNotAllowed,
}

/// Errors produced by command handlers and shell infrastructure.
#[derive(Debug, thiserror::Error)]
pub enum ShellError {
    #[error("Usage: {0}")]
    Usage(String),

    #[error(transparent)]
    Sandbox(#[from] SandboxViolation),

    #[error("Unknown command. Type 'help'.")]
    UnknownCommand,

    #[error("{0}")]
    Command(String),

    #[error("{0}")]
    Io(#[from] io::Error),

    #[error("platform error: {0}")]
    Platform(String),

    #[error("network error: {0}")]
    Network(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),
}

impl ShellError {
    /// Shorthand for a usage failure.
    pub fn usage(hint: impl Into<String>) -> Self {
        Self::Usage(hint.into())
    }

    /// Render the single output line a handler failure turns into.
    ///
    /// Usage and sandbox failures are reported verbatim since the operation
    /// was never attempted. Everything else is prefixed with the command name.
    pub fn report(&self, command: &str) -> String {
        match self {
            Self::Usage(_) | Self::Sandbox(_) | Self::UnknownCommand => self.to_string(),
            other => format!("{command} failed: {other}"),
        }
    }
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, ShellError>;
