//! Archive commands: zip a directory, extract an archive.

use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

use minshell_types::error::{Result, ShellError};
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::interpreter::{Command, CommandOutput, CommandRegistry};
use crate::sandbox::{self, EntryRule};
use crate::session::Session;

/// Register archive commands.
pub fn register_archive_commands(reg: &mut CommandRegistry) {
    reg.register(Box::new(ZipCmd));
    reg.register(Box::new(UnzipCmd));
}

fn zip_err(e: zip::result::ZipError) -> ShellError {
    match e {
        zip::result::ZipError::Io(io) => ShellError::Io(io),
        other => ShellError::Command(other.to_string()),
    }
}

/// Archive entry name for `path` relative to `base`, always '/'-separated.
fn entry_name(base: &Path, path: &Path) -> Option<String> {
    let rel = path.strip_prefix(base).ok()?;
    let parts: Vec<String> = rel
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    Some(parts.join("/"))
}

/// Walk `dir` collecting (directories, files), depth first, sorted.
/// Symbolic links are skipped.
fn walk(dir: &Path, dirs: &mut Vec<PathBuf>, files: &mut Vec<PathBuf>) -> Result<()> {
    let mut entries: Vec<_> = fs::read_dir(dir)?.collect::<io::Result<_>>()?;
    entries.sort_by_key(|e| e.file_name());
    for entry in entries {
        let kind = entry.file_type()?;
        if kind.is_dir() {
            dirs.push(entry.path());
            walk(&entry.path(), dirs, files)?;
        } else if kind.is_file() {
            files.push(entry.path());
        }
    }
    Ok(())
}

/// Write every file below `src` into a new archive at `out`.
fn create_archive(src: &Path, out: &Path) -> Result<()> {
    let mut dirs = Vec::new();
    let mut files = Vec::new();
    walk(src, &mut dirs, &mut files)?;

    let mut zip = ZipWriter::new(File::create(out)?);
    let options = FileOptions::default().compression_method(CompressionMethod::Deflated);
    for dir in &dirs {
        if let Some(name) = entry_name(src, dir) {
            zip.add_directory(name, options).map_err(zip_err)?;
        }
    }
    for file in files.iter().filter(|f| f.as_path() != out) {
        let Some(name) = entry_name(src, file) else {
            continue;
        };
        zip.start_file(name, options).map_err(zip_err)?;
        io::copy(&mut File::open(file)?, &mut zip)?;
    }
    zip.finish().map_err(zip_err)?;
    Ok(())
}

/// Extract `archive` into `dest`, overwriting existing files. Entries whose
/// names would land outside `dest` or outside `root` abort the extraction.
fn extract_archive(archive: &Path, dest: &Path, root: &Path) -> Result<usize> {
    let mut zip = ZipArchive::new(File::open(archive)?).map_err(zip_err)?;
    fs::create_dir_all(dest)?;
    for i in 0..zip.len() {
        let mut entry = zip.by_index(i).map_err(zip_err)?;
        let Some(rel) = entry.enclosed_name().map(Path::to_path_buf) else {
            return Err(ShellError::Command(format!(
                "unsafe entry name {}",
                entry.name()
            )));
        };
        let target = dest.join(rel);
        if !sandbox::is_within(root, &sandbox::canonicalize_lenient(&target)) {
            return Err(ShellError::Command(format!(
                "unsafe entry name {}",
                entry.name()
            )));
        }
        if entry.is_dir() {
            fs::create_dir_all(&target)?;
        } else {
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)?;
            }
            io::copy(&mut entry, &mut File::create(&target)?)?;
        }
    }
    Ok(zip.len())
}

// ---------------------------------------------------------------------------
// zip
// ---------------------------------------------------------------------------

struct ZipCmd;
impl Command for ZipCmd {
    fn name(&self) -> &str {
        "zip"
    }
    fn description(&self) -> &str {
        "Compress a directory into a zip archive"
    }
    fn usage(&self) -> &str {
        "zip <srcDir> <zipFile>"
    }
    fn category(&self) -> &str {
        "archive"
    }
    fn execute(&self, args: &[&str], session: &mut Session<'_>) -> Result<CommandOutput> {
        if args.len() < 2 {
            return Err(ShellError::usage(self.usage()));
        }
        let src = sandbox::resolve(session, args[0], EntryRule::Directory)?;
        let out = sandbox::resolve(session, args[1], EntryRule::File)?;
        if !src.is_dir() {
            return Err(ShellError::Command(format!(
                "directory not found: {}",
                src.display()
            )));
        }
        if out.exists() {
            return Err(ShellError::Command(format!(
                "{} already exists",
                out.display()
            )));
        }
        create_archive(&src, &out)?;
        session.refresh_ui();
        Ok(CommandOutput::Text("Zipped.".to_string()))
    }
}

// ---------------------------------------------------------------------------
// unzip
// ---------------------------------------------------------------------------

struct UnzipCmd;
impl Command for UnzipCmd {
    fn name(&self) -> &str {
        "unzip"
    }
    fn description(&self) -> &str {
        "Extract a zip archive into a directory"
    }
    fn usage(&self) -> &str {
        "unzip <zipFile> <destDir>"
    }
    fn category(&self) -> &str {
        "archive"
    }
    fn execute(&self, args: &[&str], session: &mut Session<'_>) -> Result<CommandOutput> {
        if args.len() < 2 {
            return Err(ShellError::usage(self.usage()));
        }
        let archive = sandbox::resolve(session, args[0], EntryRule::File)?;
        let dest = sandbox::resolve(session, args[1], EntryRule::Directory)?;
        let count = extract_archive(&archive, &dest, session.root())?;
        log::debug!("unzip: {count} entries into {}", dest.display());
        session.refresh_ui();
        Ok(CommandOutput::Text("Unzipped.".to_string()))
    }
}
