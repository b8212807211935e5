//! Best-effort audit trail: one file per dispatched line.
//!
//! Files are named `yyyyMMdd_HHmmssfff.temp` (local time) so a plain
//! lexicographic sort of the directory is also chronological order.
//! Lines landing in the same millisecond get a `_001`, `_002`, ... suffix,
//! which still sorts after the unsuffixed name.

use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::Local;

/// Extension carried by every audit file.
pub const AUDIT_EXTENSION: &str = "temp";

/// Bound on same-millisecond collisions before giving up.
const MAX_SUFFIX: u32 = 1000;

/// Sink for the raw text of every dispatched line.
pub trait AuditLog: Send + Sync {
    /// Record `line` under `dir`. Returns where it was written.
    fn record(&self, dir: &Path, line: &str) -> io::Result<PathBuf>;
}

/// Writes each line to its own timestamp-named file.
#[derive(Debug, Default, Clone, Copy)]
pub struct TimestampedFileLog;

impl AuditLog for TimestampedFileLog {
    fn record(&self, dir: &Path, line: &str) -> io::Result<PathBuf> {
        std::fs::create_dir_all(dir)?;
        let stamp = Local::now().format("%Y%m%d_%H%M%S%3f").to_string();
        for n in 0..MAX_SUFFIX {
            let name = if n == 0 {
                format!("{stamp}.{AUDIT_EXTENSION}")
            } else {
                format!("{stamp}_{n:03}.{AUDIT_EXTENSION}")
            };
            let path = dir.join(name);
            match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(mut file) => {
                    file.write_all(line.as_bytes())?;
                    return Ok(path);
                },
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => continue,
                Err(e) => return Err(e),
            }
        }
        Err(io::Error::new(
            io::ErrorKind::AlreadyExists,
            format!("no free audit file name for {stamp}"),
        ))
    }
}

/// Discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullAuditLog;

impl AuditLog for NullAuditLog {
    fn record(&self, _dir: &Path, _line: &str) -> io::Result<PathBuf> {
        Ok(PathBuf::new())
    }
}

/// Audit files currently in `dir`, sorted oldest first.
/// A missing directory yields an empty list.
pub fn entries(dir: &Path) -> io::Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }
    let mut found = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        let is_audit = path.is_file()
            && path
                .extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case(AUDIT_EXTENSION));
        if is_audit {
            found.push(path);
        }
    }
    found.sort();
    Ok(found)
}

/// Delete every audit file in `dir`. Returns how many were removed.
pub fn clear(dir: &Path) -> io::Result<usize> {
    let found = entries(dir)?;
    for path in &found {
        std::fs::remove_file(path)?;
    }
    Ok(found.len())
}
