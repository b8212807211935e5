//! Filesystem commands: create, remove, copy, move, read, split, join, tree,
//! plus attribute queries.
//!
//! Every path argument goes through [`sandbox::resolve`] before anything
//! touches the disk. Commands taking two paths resolve both up front so a
//! blocked destination never leaves a half-done operation behind.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use minshell_types::error::{Result, ShellError};

use crate::commands::read_dir_sorted;
use crate::interpreter::{Command, CommandOutput, CommandRegistry};
use crate::sandbox::{self, EntryRule};
use crate::session::Session;

/// Register filesystem and attribute commands.
pub fn register_file_commands(reg: &mut CommandRegistry) {
    reg.register(Box::new(MkdirCmd));
    reg.register(Box::new(RmdirCmd));
    reg.register(Box::new(RmdirAllCmd));
    reg.register(Box::new(MkfileCmd));
    reg.register(Box::new(AppendCmd));
    reg.register(Box::new(DelCmd));
    reg.register(Box::new(CopyCmd));
    reg.register(Box::new(MoveCmd));
    reg.register(Box::new(RenameCmd));
    reg.register(Box::new(TypeCmd));
    reg.register(Box::new(CatCmd));
    reg.register(Box::new(SplitCmd));
    reg.register(Box::new(JoinCmd));
    reg.register(Box::new(TreeCmd));
    reg.register(Box::new(RealpathCmd));
    reg.register(Box::new(ReadonlyCmd));
    reg.register(Box::new(HiddenCmd));
    reg.register(Box::new(AttribCmd));
}

/// Refuse to remove or relocate the root, or any directory holding the
/// working directory.
fn guard_removal(session: &Session<'_>, path: &Path) -> Result<()> {
    if path == session.root() {
        return Err(ShellError::Command("refusing to remove the root".to_string()));
    }
    if session.cwd().starts_with(path) {
        return Err(ShellError::Command(
            "cannot remove the working directory or its parent".to_string(),
        ));
    }
    Ok(())
}

/// Where `src` lands when moved or copied onto `dst`: inside `dst` if it is
/// an existing directory, otherwise `dst` itself.
fn landing_path(src: &Path, dst: &Path) -> PathBuf {
    match (dst.is_dir(), src.file_name()) {
        (true, Some(name)) => dst.join(name),
        _ => dst.to_path_buf(),
    }
}

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    Ok(())
}

/// Recursively copy a directory tree. Symbolic links are skipped.
fn copy_dir_recursive(src: &Path, dst: &Path) -> Result<()> {
    fs::create_dir_all(dst)?;
    for entry in fs::read_dir(src)? {
        let entry = entry?;
        let kind = entry.file_type()?;
        let target = dst.join(entry.file_name());
        if kind.is_dir() {
            copy_dir_recursive(&entry.path(), &target)?;
        } else if kind.is_file() {
            fs::copy(entry.path(), &target)?;
        }
    }
    Ok(())
}

/// Read a text file as lines, without line terminators.
pub(crate) fn read_lines(path: &Path) -> Result<Vec<String>> {
    let text = fs::read_to_string(path)?;
    Ok(text.lines().map(str::to_string).collect())
}

/// Write lines, each followed by a newline.
pub(crate) fn write_lines<S: AsRef<str>>(path: &Path, lines: &[S]) -> Result<()> {
    let mut out = String::new();
    for line in lines {
        out.push_str(line.as_ref());
        out.push('\n');
    }
    fs::write(path, out)?;
    Ok(())
}

// ---------------------------------------------------------------------------
// mkdir
// ---------------------------------------------------------------------------

struct MkdirCmd;
impl Command for MkdirCmd {
    fn name(&self) -> &str {
        "mkdir"
    }
    fn description(&self) -> &str {
        "Create a directory (and missing parents)"
    }
    fn usage(&self) -> &str {
        "mkdir <dir>"
    }
    fn category(&self) -> &str {
        "filesystem"
    }
    fn execute(&self, args: &[&str], session: &mut Session<'_>) -> Result<CommandOutput> {
        let Some(raw) = args.first() else {
            return Err(ShellError::usage(self.usage()));
        };
        let path = sandbox::resolve(session, raw, EntryRule::Directory)?;
        fs::create_dir_all(&path)?;
        session.refresh_ui();
        Ok(CommandOutput::Text(format!(
            "Created directory: {}",
            path.display()
        )))
    }
}

// ---------------------------------------------------------------------------
// rmdir
// ---------------------------------------------------------------------------

struct RmdirCmd;
impl Command for RmdirCmd {
    fn name(&self) -> &str {
        "rmdir"
    }
    fn description(&self) -> &str {
        "Remove an empty directory"
    }
    fn usage(&self) -> &str {
        "rmdir <dir>"
    }
    fn category(&self) -> &str {
        "filesystem"
    }
    fn execute(&self, args: &[&str], session: &mut Session<'_>) -> Result<CommandOutput> {
        let Some(raw) = args.first() else {
            return Err(ShellError::usage(self.usage()));
        };
        let path = sandbox::resolve(session, raw, EntryRule::Directory)?;
        guard_removal(session, &path)?;
        fs::remove_dir(&path)?;
        session.refresh_ui();
        Ok(CommandOutput::Text(format!(
            "Removed directory: {}",
            path.display()
        )))
    }
}

// ---------------------------------------------------------------------------
// rmdirall
// ---------------------------------------------------------------------------

struct RmdirAllCmd;
impl Command for RmdirAllCmd {
    fn name(&self) -> &str {
        "rmdirall"
    }
    fn description(&self) -> &str {
        "Remove a directory and everything in it"
    }
    fn usage(&self) -> &str {
        "rmdirall <dir>"
    }
    fn category(&self) -> &str {
        "filesystem"
    }
    fn execute(&self, args: &[&str], session: &mut Session<'_>) -> Result<CommandOutput> {
        let Some(raw) = args.first() else {
            return Err(ShellError::usage(self.usage()));
        };
        let path = sandbox::resolve(session, raw, EntryRule::Directory)?;
        guard_removal(session, &path)?;
        fs::remove_dir_all(&path)?;
        session.refresh_ui();
        Ok(CommandOutput::Text(format!(
            "Removed directory recursively: {}",
            path.display()
        )))
    }
}

// ---------------------------------------------------------------------------
// mkfile
// ---------------------------------------------------------------------------

struct MkfileCmd;
impl Command for MkfileCmd {
    fn name(&self) -> &str {
        "mkfile"
    }
    fn description(&self) -> &str {
        "Create or overwrite a file"
    }
    fn usage(&self) -> &str {
        "mkfile <file> [text...]"
    }
    fn category(&self) -> &str {
        "filesystem"
    }
    fn execute(&self, args: &[&str], session: &mut Session<'_>) -> Result<CommandOutput> {
        let Some((raw, text)) = args.split_first() else {
            return Err(ShellError::usage(self.usage()));
        };
        let path = sandbox::resolve(session, raw, EntryRule::File)?;
        fs::write(&path, text.join(" "))?;
        session.refresh_ui();
        Ok(CommandOutput::Text(format!("File created: {}", path.display())))
    }
}

// ---------------------------------------------------------------------------
// append
// ---------------------------------------------------------------------------

struct AppendCmd;
impl Command for AppendCmd {
    fn name(&self) -> &str {
        "append"
    }
    fn description(&self) -> &str {
        "Append a line of text to a file"
    }
    fn usage(&self) -> &str {
        "append <file> <text...>"
    }
    fn category(&self) -> &str {
        "filesystem"
    }
    fn execute(&self, args: &[&str], session: &mut Session<'_>) -> Result<CommandOutput> {
        if args.len() < 2 {
            return Err(ShellError::usage(self.usage()));
        }
        let path = sandbox::resolve(session, args[0], EntryRule::File)?;
        let mut file = OpenOptions::new().create(true).append(true).open(&path)?;
        writeln!(file, "{}", args[1..].join(" "))?;
        Ok(CommandOutput::Text("Appended.".to_string()))
    }
}

// ---------------------------------------------------------------------------
// del
// ---------------------------------------------------------------------------

struct DelCmd;
impl Command for DelCmd {
    fn name(&self) -> &str {
        "del"
    }
    fn description(&self) -> &str {
        "Delete a file"
    }
    fn usage(&self) -> &str {
        "del <file>"
    }
    fn category(&self) -> &str {
        "filesystem"
    }
    fn execute(&self, args: &[&str], session: &mut Session<'_>) -> Result<CommandOutput> {
        let Some(raw) = args.first() else {
            return Err(ShellError::usage(self.usage()));
        };
        let path = sandbox::resolve(session, raw, EntryRule::File)?;
        fs::remove_file(&path)?;
        session.refresh_ui();
        Ok(CommandOutput::Text(format!("Deleted: {}", path.display())))
    }
}

// ---------------------------------------------------------------------------
// copy
// ---------------------------------------------------------------------------

struct CopyCmd;
impl Command for CopyCmd {
    fn name(&self) -> &str {
        "copy"
    }
    fn description(&self) -> &str {
        "Copy a file or directory"
    }
    fn usage(&self) -> &str {
        "copy <src> <dst>"
    }
    fn category(&self) -> &str {
        "filesystem"
    }
    fn execute(&self, args: &[&str], session: &mut Session<'_>) -> Result<CommandOutput> {
        if args.len() < 2 {
            return Err(ShellError::usage(self.usage()));
        }
        let src = sandbox::resolve(session, args[0], EntryRule::Either)?;
        let dst = sandbox::resolve(session, args[1], EntryRule::Either)?;
        // Fails on a missing source before anything is created.
        let meta = fs::metadata(&src)?;
        if meta.is_dir() {
            if dst.starts_with(&src) {
                return Err(ShellError::Command(
                    "cannot copy a directory into itself".to_string(),
                ));
            }
            copy_dir_recursive(&src, &dst)?;
        } else {
            let dest = landing_path(&src, &dst);
            // fs::copy truncates the destination before reading the source.
            if dest == src {
                return Err(ShellError::Command(
                    "source and destination are the same file".to_string(),
                ));
            }
            ensure_parent(&dest)?;
            fs::copy(&src, &dest)?;
        }
        session.refresh_ui();
        Ok(CommandOutput::Text("Copied.".to_string()))
    }
}

// ---------------------------------------------------------------------------
// move
// ---------------------------------------------------------------------------

struct MoveCmd;
impl Command for MoveCmd {
    fn name(&self) -> &str {
        "move"
    }
    fn description(&self) -> &str {
        "Move a file or directory"
    }
    fn usage(&self) -> &str {
        "move <src> <dst>"
    }
    fn category(&self) -> &str {
        "filesystem"
    }
    fn execute(&self, args: &[&str], session: &mut Session<'_>) -> Result<CommandOutput> {
        if args.len() < 2 {
            return Err(ShellError::usage(self.usage()));
        }
        let src = sandbox::resolve(session, args[0], EntryRule::Either)?;
        let dst = sandbox::resolve(session, args[1], EntryRule::Either)?;
        fs::metadata(&src)?;
        guard_removal(session, &src)?;
        let dest = landing_path(&src, &dst);
        ensure_parent(&dest)?;
        fs::rename(&src, &dest)?;
        session.refresh_ui();
        Ok(CommandOutput::Text("Moved.".to_string()))
    }
}

// ---------------------------------------------------------------------------
// rename
// ---------------------------------------------------------------------------

struct RenameCmd;
impl Command for RenameCmd {
    fn name(&self) -> &str {
        "rename"
    }
    fn description(&self) -> &str {
        "Rename a file or directory"
    }
    fn usage(&self) -> &str {
        "rename <old> <new>"
    }
    fn category(&self) -> &str {
        "filesystem"
    }
    fn execute(&self, args: &[&str], session: &mut Session<'_>) -> Result<CommandOutput> {
        if args.len() < 2 {
            return Err(ShellError::usage(self.usage()));
        }
        let old = sandbox::resolve(session, args[0], EntryRule::Either)?;
        let new = sandbox::resolve(session, args[1], EntryRule::Either)?;
        fs::metadata(&old)?;
        guard_removal(session, &old)?;
        ensure_parent(&new)?;
        fs::rename(&old, &new)?;
        session.refresh_ui();
        Ok(CommandOutput::Text("Renamed.".to_string()))
    }
}

// ---------------------------------------------------------------------------
// type
// ---------------------------------------------------------------------------

struct TypeCmd;
impl Command for TypeCmd {
    fn name(&self) -> &str {
        "type"
    }
    fn description(&self) -> &str {
        "Print a file's contents"
    }
    fn usage(&self) -> &str {
        "type <file>"
    }
    fn category(&self) -> &str {
        "filesystem"
    }
    fn execute(&self, args: &[&str], session: &mut Session<'_>) -> Result<CommandOutput> {
        let Some(raw) = args.first() else {
            return Err(ShellError::usage(self.usage()));
        };
        let path = sandbox::resolve(session, raw, EntryRule::File)?;
        let data = fs::read(&path)?;
        Ok(CommandOutput::Text(String::from_utf8_lossy(&data).into_owned()))
    }
}

// ---------------------------------------------------------------------------
// cat
// ---------------------------------------------------------------------------

struct CatCmd;
impl Command for CatCmd {
    fn name(&self) -> &str {
        "cat"
    }
    fn description(&self) -> &str {
        "Print a file line by line"
    }
    fn usage(&self) -> &str {
        "cat <file>"
    }
    fn category(&self) -> &str {
        "filesystem"
    }
    fn execute(&self, args: &[&str], session: &mut Session<'_>) -> Result<CommandOutput> {
        let Some(raw) = args.first() else {
            return Err(ShellError::usage(self.usage()));
        };
        let path = sandbox::resolve(session, raw, EntryRule::File)?;
        let lines = read_lines(&path)?;
        if lines.is_empty() {
            return Ok(CommandOutput::None);
        }
        Ok(CommandOutput::lines(lines))
    }
}

// ---------------------------------------------------------------------------
// split
// ---------------------------------------------------------------------------

struct SplitCmd;
impl Command for SplitCmd {
    fn name(&self) -> &str {
        "split"
    }
    fn description(&self) -> &str {
        "Split a file into <prefix>_N.txt parts"
    }
    fn usage(&self) -> &str {
        "split <file> <linesPerFile> <prefix>"
    }
    fn category(&self) -> &str {
        "filesystem"
    }
    fn execute(&self, args: &[&str], session: &mut Session<'_>) -> Result<CommandOutput> {
        if args.len() < 3 {
            return Err(ShellError::usage(self.usage()));
        }
        let src = sandbox::resolve(session, args[0], EntryRule::File)?;
        let per_file = match args[1].parse::<usize>() {
            Ok(n) if n > 0 => n,
            _ => {
                return Err(ShellError::Command(
                    "linesPerFile must be a positive integer".to_string(),
                ));
            },
        };
        let prefix = args[2];
        let lines = read_lines(&src)?;

        // Resolve every part first so a blocked name writes nothing.
        let mut parts = Vec::new();
        for (i, chunk) in lines.chunks(per_file).enumerate() {
            let name = format!("{prefix}_{}.txt", i + 1);
            let path = sandbox::resolve(session, &name, EntryRule::File)?;
            parts.push((path, chunk));
        }
        for (path, chunk) in parts {
            ensure_parent(&path)?;
            write_lines(&path, chunk)?;
        }
        session.refresh_ui();
        Ok(CommandOutput::Text("Split completed.".to_string()))
    }
}

// ---------------------------------------------------------------------------
// join
// ---------------------------------------------------------------------------

struct JoinCmd;
impl Command for JoinCmd {
    fn name(&self) -> &str {
        "join"
    }
    fn description(&self) -> &str {
        "Concatenate files line by line into one"
    }
    fn usage(&self) -> &str {
        "join <out> <in1> [in2 ...]"
    }
    fn category(&self) -> &str {
        "filesystem"
    }
    fn execute(&self, args: &[&str], session: &mut Session<'_>) -> Result<CommandOutput> {
        if args.len() < 2 {
            return Err(ShellError::usage(self.usage()));
        }
        let out = sandbox::resolve(session, args[0], EntryRule::File)?;
        let inputs = args[1..]
            .iter()
            .map(|raw| sandbox::resolve(session, raw, EntryRule::File))
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let mut joined = Vec::new();
        for input in &inputs {
            joined.extend(read_lines(input)?);
        }
        write_lines(&out, &joined)?;
        session.refresh_ui();
        Ok(CommandOutput::Text("Join completed.".to_string()))
    }
}

// ---------------------------------------------------------------------------
// tree
// ---------------------------------------------------------------------------

struct TreeCmd;
impl Command for TreeCmd {
    fn name(&self) -> &str {
        "tree"
    }
    fn description(&self) -> &str {
        "Display the directory tree below the working directory"
    }
    fn usage(&self) -> &str {
        "tree"
    }
    fn category(&self) -> &str {
        "filesystem"
    }
    fn execute(&self, _args: &[&str], session: &mut Session<'_>) -> Result<CommandOutput> {
        let mut lines = Vec::new();
        tree_recursive(session.cwd(), 0, &mut lines)?;
        if lines.is_empty() {
            return Ok(CommandOutput::None);
        }
        Ok(CommandOutput::lines(lines))
    }
}

fn tree_recursive(dir: &Path, depth: usize, lines: &mut Vec<String>) -> Result<()> {
    let indent = "  ".repeat(depth);
    let (dirs, files) = read_dir_sorted(dir)?;
    for entry in &dirs {
        lines.push(format!("{indent}+ {}", entry.file_name().to_string_lossy()));
        tree_recursive(&entry.path(), depth + 1, lines)?;
    }
    for entry in &files {
        lines.push(format!("{indent}- {}", entry.file_name().to_string_lossy()));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// realpath
// ---------------------------------------------------------------------------

struct RealpathCmd;
impl Command for RealpathCmd {
    fn name(&self) -> &str {
        "realpath"
    }
    fn description(&self) -> &str {
        "Print the absolute form of a path"
    }
    fn usage(&self) -> &str {
        "realpath <path>"
    }
    fn category(&self) -> &str {
        "filesystem"
    }
    fn execute(&self, args: &[&str], session: &mut Session<'_>) -> Result<CommandOutput> {
        let Some(raw) = args.first() else {
            return Err(ShellError::usage(self.usage()));
        };
        let path = sandbox::resolve(session, raw, EntryRule::Either)?;
        Ok(CommandOutput::Text(path.display().to_string()))
    }
}

// ---------------------------------------------------------------------------
// readonly
// ---------------------------------------------------------------------------

struct ReadonlyCmd;
impl Command for ReadonlyCmd {
    fn name(&self) -> &str {
        "readonly"
    }
    fn description(&self) -> &str {
        "Mark a file read-only"
    }
    fn usage(&self) -> &str {
        "readonly <file>"
    }
    fn category(&self) -> &str {
        "attributes"
    }
    fn execute(&self, args: &[&str], session: &mut Session<'_>) -> Result<CommandOutput> {
        let Some(raw) = args.first() else {
            return Err(ShellError::usage(self.usage()));
        };
        let path = sandbox::resolve(session, raw, EntryRule::File)?;
        let mut perms = fs::metadata(&path)?.permissions();
        perms.set_readonly(true);
        fs::set_permissions(&path, perms)?;
        Ok(CommandOutput::Text("Marked readonly.".to_string()))
    }
}

// ---------------------------------------------------------------------------
// hidden
// ---------------------------------------------------------------------------

struct HiddenCmd;
impl Command for HiddenCmd {
    fn name(&self) -> &str {
        "hidden"
    }
    fn description(&self) -> &str {
        "Mark a file hidden"
    }
    fn usage(&self) -> &str {
        "hidden <file>"
    }
    fn category(&self) -> &str {
        "attributes"
    }
    fn execute(&self, args: &[&str], session: &mut Session<'_>) -> Result<CommandOutput> {
        let Some(raw) = args.first() else {
            return Err(ShellError::usage(self.usage()));
        };
        let path = sandbox::resolve(session, raw, EntryRule::File)?;
        fs::metadata(&path)?;
        mark_hidden(&path)?;
        session.refresh_ui();
        Ok(CommandOutput::Text("Marked hidden.".to_string()))
    }
}

/// Unix has no hidden bit; a leading dot is the convention.
#[cfg(not(windows))]
fn mark_hidden(path: &Path) -> Result<()> {
    if is_hidden(path) {
        return Ok(());
    }
    let Some(name) = path.file_name() else {
        return Err(ShellError::Command("path has no file name".to_string()));
    };
    let mut dotted = std::ffi::OsString::from(".");
    dotted.push(name);
    let target = path.with_file_name(dotted);
    if target.exists() {
        return Err(ShellError::Command(format!(
            "{} already exists",
            target.display()
        )));
    }
    fs::rename(path, target)?;
    Ok(())
}

#[cfg(windows)]
fn mark_hidden(path: &Path) -> Result<()> {
    let status = std::process::Command::new("attrib")
        .arg("+h")
        .arg(path)
        .status()?;
    if !status.success() {
        return Err(ShellError::Command(format!("attrib exited with {status}")));
    }
    Ok(())
}

#[cfg(not(windows))]
fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .is_some_and(|n| n.to_string_lossy().starts_with('.'))
}

#[cfg(windows)]
fn is_hidden(path: &Path) -> bool {
    use std::os::windows::fs::MetadataExt;
    const FILE_ATTRIBUTE_HIDDEN: u32 = 0x2;
    fs::metadata(path).is_ok_and(|m| m.file_attributes() & FILE_ATTRIBUTE_HIDDEN != 0)
}

// ---------------------------------------------------------------------------
// attrib
// ---------------------------------------------------------------------------

struct AttribCmd;
impl Command for AttribCmd {
    fn name(&self) -> &str {
        "attrib"
    }
    fn description(&self) -> &str {
        "Show a file's attributes"
    }
    fn usage(&self) -> &str {
        "attrib <file>"
    }
    fn category(&self) -> &str {
        "attributes"
    }
    fn execute(&self, args: &[&str], session: &mut Session<'_>) -> Result<CommandOutput> {
        let Some(raw) = args.first() else {
            return Err(ShellError::usage(self.usage()));
        };
        let path = sandbox::resolve(session, raw, EntryRule::File)?;
        let meta = fs::metadata(&path)?;
        let mut attrs = Vec::new();
        if meta.permissions().readonly() {
            attrs.push("ReadOnly");
        }
        if is_hidden(&path) {
            attrs.push("Hidden");
        }
        if attrs.is_empty() {
            attrs.push("Normal");
        }
        Ok(CommandOutput::Text(attrs.join(", ")))
    }
}
