//! Foundation types for Minshell.
//!
//! This crate holds the pieces shared by every Minshell crate: the error
//! taxonomy reported by command handlers and the session configuration.

pub mod config;
pub mod error;
