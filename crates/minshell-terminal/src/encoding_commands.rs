//! Encoding and hashing commands: base64 and file digests.

use std::fs::File;
use std::io;
use std::path::Path;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use md5::Md5;
use minshell_types::error::{Result, ShellError};
use sha2::{Digest, Sha256};

use crate::interpreter::{Command, CommandOutput, CommandRegistry};
use crate::sandbox::{self, EntryRule};
use crate::session::Session;

/// Register encoding and hashing commands.
pub fn register_encoding_commands(reg: &mut CommandRegistry) {
    reg.register(Box::new(B64EncCmd));
    reg.register(Box::new(B64DecCmd));
    reg.register(Box::new(Md5Cmd));
    reg.register(Box::new(Sha256Cmd));
}

/// Stream a file through `D` and return the lowercase hex digest.
fn file_digest<D: Digest + io::Write>(path: &Path) -> Result<String> {
    let mut hasher = D::new();
    io::copy(&mut File::open(path)?, &mut hasher)?;
    Ok(hasher
        .finalize()
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect())
}

// ---------------------------------------------------------------------------
// b64enc / b64dec
// ---------------------------------------------------------------------------

struct B64EncCmd;
impl Command for B64EncCmd {
    fn name(&self) -> &str {
        "b64enc"
    }
    fn description(&self) -> &str {
        "Base64-encode text"
    }
    fn usage(&self) -> &str {
        "b64enc <text...>"
    }
    fn category(&self) -> &str {
        "encoding"
    }
    fn execute(&self, args: &[&str], _session: &mut Session<'_>) -> Result<CommandOutput> {
        Ok(CommandOutput::Text(STANDARD.encode(args.join(" "))))
    }
}

struct B64DecCmd;
impl Command for B64DecCmd {
    fn name(&self) -> &str {
        "b64dec"
    }
    fn description(&self) -> &str {
        "Decode base64 to text"
    }
    fn usage(&self) -> &str {
        "b64dec <base64>"
    }
    fn category(&self) -> &str {
        "encoding"
    }
    fn execute(&self, args: &[&str], _session: &mut Session<'_>) -> Result<CommandOutput> {
        let Some(encoded) = args.first() else {
            return Err(ShellError::usage(self.usage()));
        };
        let bytes = STANDARD
            .decode(encoded)
            .map_err(|e| ShellError::Command(e.to_string()))?;
        Ok(CommandOutput::Text(String::from_utf8_lossy(&bytes).into_owned()))
    }
}

// ---------------------------------------------------------------------------
// md5 / sha256
// ---------------------------------------------------------------------------

struct Md5Cmd;
impl Command for Md5Cmd {
    fn name(&self) -> &str {
        "md5"
    }
    fn description(&self) -> &str {
        "MD5 digest of a file"
    }
    fn usage(&self) -> &str {
        "md5 <file>"
    }
    fn category(&self) -> &str {
        "encoding"
    }
    fn execute(&self, args: &[&str], session: &mut Session<'_>) -> Result<CommandOutput> {
        let Some(raw) = args.first() else {
            return Err(ShellError::usage(self.usage()));
        };
        let path = sandbox::resolve(session, raw, EntryRule::File)?;
        Ok(CommandOutput::Text(file_digest::<Md5>(&path)?))
    }
}

struct Sha256Cmd;
impl Command for Sha256Cmd {
    fn name(&self) -> &str {
        "sha256"
    }
    fn description(&self) -> &str {
        "SHA-256 digest of a file"
    }
    fn usage(&self) -> &str {
        "sha256 <file>"
    }
    fn category(&self) -> &str {
        "encoding"
    }
    fn execute(&self, args: &[&str], session: &mut Session<'_>) -> Result<CommandOutput> {
        let Some(raw) = args.first() else {
            return Err(ShellError::usage(self.usage()));
        };
        let path = sandbox::resolve(session, raw, EntryRule::File)?;
        Ok(CommandOutput::Text(file_digest::<Sha256>(&path)?))
    }
}
