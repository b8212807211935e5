//! Built-in commands for the Minshell terminal.

use std::fs::DirEntry;
use std::path::Path;
use std::time::SystemTime;

use chrono::{DateTime, Local};
use minshell_types::error::{Result, ShellError};

use crate::interpreter::{Command, CommandOutput, CommandRegistry};
use crate::sandbox::{self, EntryRule};
use crate::session::Session;

/// Banner printed by `ver`.
pub const VERSION_BANNER: &str = concat!("Minshell v", env!("CARGO_PKG_VERSION"), " (fixed root)");

/// Register every built-in command into a registry.
///
/// `help` is not registered here; the registry answers it itself.
pub fn register_builtins(reg: &mut CommandRegistry) {
    reg.register(Box::new(VerCmd));
    reg.register(Box::new(PwdCmd));
    reg.register(Box::new(ClsCmd));
    reg.register(Box::new(DirCmd));
    reg.alias("ls", "dir");
    reg.register(Box::new(CdCmd));
    crate::file_commands::register_file_commands(reg);
    crate::text_commands::register_text_commands(reg);
    crate::archive_commands::register_archive_commands(reg);
    crate::encoding_commands::register_encoding_commands(reg);
    crate::system_commands::register_system_commands(reg);
    crate::process_commands::register_process_commands(reg);
    crate::network_commands::register_network_commands(reg);
}

/// What a platform-backed command prints when the session has no platform.
pub(crate) fn no_platform(command: &str) -> CommandOutput {
    CommandOutput::Text(format!("{command}: no platform service available"))
}

/// Local wall-clock rendering of a file timestamp.
pub(crate) fn format_mtime(time: SystemTime) -> String {
    DateTime::<Local>::from(time)
        .format("%Y-%m-%d %H:%M:%S")
        .to_string()
}

/// Directory entries split into (directories, files), each sorted by name.
pub(crate) fn read_dir_sorted(dir: &Path) -> Result<(Vec<DirEntry>, Vec<DirEntry>)> {
    let mut dirs = Vec::new();
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        if entry.file_type()?.is_dir() {
            dirs.push(entry);
        } else {
            files.push(entry);
        }
    }
    dirs.sort_by_key(|e| e.file_name());
    files.sort_by_key(|e| e.file_name());
    Ok((dirs, files))
}

// ---------------------------------------------------------------------------
// ver
// ---------------------------------------------------------------------------

struct VerCmd;
impl Command for VerCmd {
    fn name(&self) -> &str {
        "ver"
    }
    fn description(&self) -> &str {
        "Show the shell version"
    }
    fn usage(&self) -> &str {
        "ver"
    }
    fn category(&self) -> &str {
        "core"
    }
    fn execute(&self, _args: &[&str], _session: &mut Session<'_>) -> Result<CommandOutput> {
        Ok(CommandOutput::Text(VERSION_BANNER.to_string()))
    }
}

// ---------------------------------------------------------------------------
// pwd
// ---------------------------------------------------------------------------

struct PwdCmd;
impl Command for PwdCmd {
    fn name(&self) -> &str {
        "pwd"
    }
    fn description(&self) -> &str {
        "Print working directory"
    }
    fn usage(&self) -> &str {
        "pwd"
    }
    fn category(&self) -> &str {
        "core"
    }
    fn execute(&self, _args: &[&str], session: &mut Session<'_>) -> Result<CommandOutput> {
        Ok(CommandOutput::Text(session.cwd().display().to_string()))
    }
}

// ---------------------------------------------------------------------------
// cls
// ---------------------------------------------------------------------------

struct ClsCmd;
impl Command for ClsCmd {
    fn name(&self) -> &str {
        "cls"
    }
    fn description(&self) -> &str {
        "Clear the screen"
    }
    fn usage(&self) -> &str {
        "cls"
    }
    fn category(&self) -> &str {
        "core"
    }
    fn execute(&self, _args: &[&str], _session: &mut Session<'_>) -> Result<CommandOutput> {
        Ok(CommandOutput::Clear)
    }
}

// ---------------------------------------------------------------------------
// dir
// ---------------------------------------------------------------------------

struct DirCmd;
impl Command for DirCmd {
    fn name(&self) -> &str {
        "dir"
    }
    fn description(&self) -> &str {
        "List directory contents"
    }
    fn usage(&self) -> &str {
        "dir [path]"
    }
    fn category(&self) -> &str {
        "core"
    }
    fn execute(&self, args: &[&str], session: &mut Session<'_>) -> Result<CommandOutput> {
        let dir = match args.first() {
            Some(raw) => sandbox::resolve(session, raw, EntryRule::Directory)?,
            None => session.cwd().to_path_buf(),
        };
        let (dirs, files) = read_dir_sorted(&dir)?;
        let mut lines = Vec::with_capacity(dirs.len() + files.len());
        for entry in &dirs {
            let meta = entry.metadata()?;
            lines.push(format!(
                "{} <DIR> {}",
                format_mtime(meta.modified()?),
                entry.file_name().to_string_lossy()
            ));
        }
        for entry in &files {
            let meta = entry.metadata()?;
            lines.push(format!(
                "{}       {} ({} bytes)",
                format_mtime(meta.modified()?),
                entry.file_name().to_string_lossy(),
                meta.len()
            ));
        }
        if lines.is_empty() {
            return Ok(CommandOutput::None);
        }
        Ok(CommandOutput::lines(lines))
    }
}

// ---------------------------------------------------------------------------
// cd
// ---------------------------------------------------------------------------

struct CdCmd;
impl Command for CdCmd {
    fn name(&self) -> &str {
        "cd"
    }
    fn description(&self) -> &str {
        "Change directory"
    }
    fn usage(&self) -> &str {
        "cd <dir>"
    }
    fn category(&self) -> &str {
        "core"
    }
    fn execute(&self, args: &[&str], session: &mut Session<'_>) -> Result<CommandOutput> {
        let Some(raw) = args.first() else {
            return Err(ShellError::usage(self.usage()));
        };
        session.change_dir(raw)?;
        session.refresh_ui();
        Ok(CommandOutput::None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{Fixture, registry, run};

    #[test]
    fn ver_prints_banner() {
        let reg = registry();
        let fx = Fixture::new();
        let mut frontend = fx.frontend();
        let log = frontend.clone();
        let mut session = fx.session(&mut frontend);
        assert_eq!(run(&reg, &mut session, &log, "ver"), VERSION_BANNER);
    }

    #[test]
    fn pwd_starts_at_root() {
        let reg = registry();
        let fx = Fixture::new();
        let mut frontend = fx.frontend();
        let log = frontend.clone();
        let mut session = fx.session(&mut frontend);
        let out = run(&reg, &mut session, &log, "pwd");
        assert_eq!(out, fx.root().display().to_string());
    }

    #[test]
    fn cls_emits_form_feed() {
        let reg = registry();
        let fx = Fixture::new();
        let mut frontend = fx.frontend();
        let log = frontend.clone();
        let mut session = fx.session(&mut frontend);
        assert_eq!(run(&reg, &mut session, &log, "CLS"), "\u{c}");
    }

    #[test]
    fn dir_lists_directories_first() {
        let reg = registry();
        let fx = Fixture::new();
        fx.write("b.txt", "hello");
        std::fs::create_dir(fx.root().join("zdir")).unwrap();
        let mut frontend = fx.frontend();
        let log = frontend.clone();
        let mut session = fx.session(&mut frontend);
        let out = run(&reg, &mut session, &log, "dir");
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with("<DIR> zdir"));
        assert!(lines[1].ends_with("b.txt (5 bytes)"));
    }

    #[test]
    fn ls_is_alias_of_dir() {
        let reg = registry();
        let fx = Fixture::new();
        fx.write("a.txt", "x");
        let mut frontend = fx.frontend();
        let log = frontend.clone();
        let mut session = fx.session(&mut frontend);
        let dir = run(&reg, &mut session, &log, "dir");
        let ls = run(&reg, &mut session, &log, "LS");
        assert_eq!(dir, ls);
    }

    #[test]
    fn dir_outside_root_blocked() {
        let reg = registry();
        let fx = Fixture::new();
        let mut frontend = fx.frontend();
        let log = frontend.clone();
        let mut session = fx.session(&mut frontend);
        assert_eq!(
            run(&reg, &mut session, &log, "dir .."),
            "Blocked: outside root."
        );
    }

    #[test]
    fn dir_on_file_blocked() {
        let reg = registry();
        let fx = Fixture::new();
        fx.write("a.txt", "x");
        let mut frontend = fx.frontend();
        let log = frontend.clone();
        let mut session = fx.session(&mut frontend);
        assert_eq!(
            run(&reg, &mut session, &log, "dir a.txt"),
            "Blocked: file not allowed."
        );
    }

    #[test]
    fn cd_without_args_prints_usage() {
        let reg = registry();
        let fx = Fixture::new();
        let mut frontend = fx.frontend();
        let log = frontend.clone();
        let mut session = fx.session(&mut frontend);
        assert_eq!(run(&reg, &mut session, &log, "cd"), "Usage: cd <dir>");
    }

    #[test]
    fn mkdir_cd_scenario() {
        let reg = registry();
        let fx = Fixture::new();
        let root = fx.root();
        let mut frontend = fx.frontend();
        let log = frontend.clone();
        let mut session = fx.session(&mut frontend);

        let out = run(&reg, &mut session, &log, "mkdir sub");
        let sub = root.join("sub");
        assert!(sub.is_dir());
        assert!(out.contains(&format!("Created directory: {}", sub.display())));

        run(&reg, &mut session, &log, "cd sub");
        assert_eq!(session.cwd(), sub);

        assert_eq!(run(&reg, &mut session, &log, "cd .."), "");
        assert_eq!(session.cwd(), root);

        run(&reg, &mut session, &log, "cd sub");
        let out = run(&reg, &mut session, &log, "cd ../..");
        assert_eq!(out, "Blocked: outside root.");
        assert_eq!(session.cwd(), sub);
        assert!(session.cwd().starts_with(session.root()));
    }

    #[test]
    fn cd_sets_address_and_refreshes() {
        let reg = registry();
        let fx = Fixture::new();
        std::fs::create_dir(fx.root().join("docs")).unwrap();
        let mut frontend = fx.frontend();
        let log = frontend.clone();
        let mut session = fx.session(&mut frontend);
        run(&reg, &mut session, &log, "cd docs");
        drop(session);
        assert_eq!(log.addresses(), vec![fx.root().join("docs")]);
        assert_eq!(log.refreshes(), 1);
    }

    #[test]
    fn cd_into_file_blocked() {
        let reg = registry();
        let fx = Fixture::new();
        fx.write("f.txt", "x");
        let mut frontend = fx.frontend();
        let log = frontend.clone();
        let mut session = fx.session(&mut frontend);
        assert_eq!(
            run(&reg, &mut session, &log, "cd f.txt"),
            "Blocked: file not allowed."
        );
        assert_eq!(session.cwd(), fx.root());
    }

    #[test]
    fn platform_commands_without_platform_fail_soft() {
        let reg = registry();
        let fx = Fixture::new();
        let mut frontend = fx.frontend();
        let log = frontend.clone();
        let mut session = fx.session(&mut frontend);
        assert_eq!(
            run(&reg, &mut session, &log, "ps"),
            "ps: no platform service available"
        );
    }

    #[test]
    fn builtins_cover_every_category() {
        let reg = registry();
        for name in [
            "ver", "pwd", "cls", "dir", "ls", "cd", "mkdir", "rmdir", "rmdirall", "mkfile",
            "append", "del", "copy", "move", "rename", "type", "cat", "split", "join", "tree",
            "realpath", "head", "tail", "wc", "sort", "uniq", "replace", "echo", "upper",
            "lower", "trim", "repeat", "newline", "readonly", "hidden", "attrib", "zip",
            "unzip", "b64enc", "b64dec", "md5", "sha256", "find", "grep", "date", "time",
            "datetime", "whoami", "hostname", "machine", "os", "uptime", "cpuarch", "uuid",
            "rand", "sleep", "nowticks", "ticks", "year", "month", "day", "hour", "minute",
            "second", "drives", "df", "run", "open", "ps", "kill", "ping", "resolve",
            "httpget", "logcount", "clearlogs",
        ] {
            assert!(reg.lookup(name).is_some(), "missing {name}");
        }
    }
}
