//! Text processing and search commands.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use minshell_types::error::{Result, ShellError};
use regex::{NoExpand, RegexBuilder};

use crate::file_commands::{read_lines, write_lines};
use crate::interpreter::{Command, CommandOutput, CommandRegistry};
use crate::sandbox::{self, EntryRule};
use crate::session::Session;

/// Lines shown by `head` and `tail` when no usable count is given.
const DEFAULT_LINES: usize = 10;

/// Upper bound on `repeat`'s count.
const MAX_REPEAT: i64 = 10_000;

/// Register text and search commands.
pub fn register_text_commands(reg: &mut CommandRegistry) {
    reg.register(Box::new(HeadCmd));
    reg.register(Box::new(TailCmd));
    reg.register(Box::new(WcCmd));
    reg.register(Box::new(SortCmd));
    reg.register(Box::new(UniqCmd));
    reg.register(Box::new(ReplaceCmd));
    reg.register(Box::new(EchoCmd));
    reg.register(Box::new(UpperCmd));
    reg.register(Box::new(LowerCmd));
    reg.register(Box::new(TrimCmd));
    reg.register(Box::new(RepeatCmd));
    reg.register(Box::new(NewlineCmd));
    reg.register(Box::new(FindCmd));
    reg.register(Box::new(GrepCmd));
}

fn line_count(arg: Option<&&str>) -> usize {
    arg.and_then(|s| s.parse().ok()).unwrap_or(DEFAULT_LINES)
}

fn text_or_none(lines: Vec<String>) -> CommandOutput {
    if lines.is_empty() {
        CommandOutput::None
    } else {
        CommandOutput::lines(lines)
    }
}

// ---------------------------------------------------------------------------
// head / tail
// ---------------------------------------------------------------------------

struct HeadCmd;
impl Command for HeadCmd {
    fn name(&self) -> &str {
        "head"
    }
    fn description(&self) -> &str {
        "Show the first lines of a file"
    }
    fn usage(&self) -> &str {
        "head <file> [n]"
    }
    fn category(&self) -> &str {
        "text"
    }
    fn execute(&self, args: &[&str], session: &mut Session<'_>) -> Result<CommandOutput> {
        let Some(raw) = args.first() else {
            return Err(ShellError::usage(self.usage()));
        };
        let path = sandbox::resolve(session, raw, EntryRule::File)?;
        let n = line_count(args.get(1));
        let lines: Vec<String> = read_lines(&path)?.into_iter().take(n).collect();
        Ok(text_or_none(lines))
    }
}

struct TailCmd;
impl Command for TailCmd {
    fn name(&self) -> &str {
        "tail"
    }
    fn description(&self) -> &str {
        "Show the last lines of a file"
    }
    fn usage(&self) -> &str {
        "tail <file> [n]"
    }
    fn category(&self) -> &str {
        "text"
    }
    fn execute(&self, args: &[&str], session: &mut Session<'_>) -> Result<CommandOutput> {
        let Some(raw) = args.first() else {
            return Err(ShellError::usage(self.usage()));
        };
        let path = sandbox::resolve(session, raw, EntryRule::File)?;
        let n = line_count(args.get(1));
        let mut lines = read_lines(&path)?;
        let skip = lines.len().saturating_sub(n);
        Ok(text_or_none(lines.split_off(skip)))
    }
}

// ---------------------------------------------------------------------------
// wc
// ---------------------------------------------------------------------------

struct WcCmd;
impl Command for WcCmd {
    fn name(&self) -> &str {
        "wc"
    }
    fn description(&self) -> &str {
        "Count lines, words and bytes"
    }
    fn usage(&self) -> &str {
        "wc <file>"
    }
    fn category(&self) -> &str {
        "text"
    }
    fn execute(&self, args: &[&str], session: &mut Session<'_>) -> Result<CommandOutput> {
        let Some(raw) = args.first() else {
            return Err(ShellError::usage(self.usage()));
        };
        let path = sandbox::resolve(session, raw, EntryRule::File)?;
        let text = fs::read_to_string(&path)?;
        // Line count is the number of newline-separated segments.
        let lines = text.split('\n').count();
        let words = text.split_whitespace().count();
        Ok(CommandOutput::Text(format!(
            "Lines: {lines}, Words: {words}, Bytes: {}",
            text.len()
        )))
    }
}

// ---------------------------------------------------------------------------
// sort / uniq
// ---------------------------------------------------------------------------

/// Resolve `<in> <out>` for commands that transform one file into another.
fn in_out(session: &Session<'_>, args: &[&str]) -> Result<(PathBuf, PathBuf)> {
    let input = sandbox::resolve(session, args[0], EntryRule::File)?;
    let output = sandbox::resolve(session, args[1], EntryRule::File)?;
    Ok((input, output))
}

struct SortCmd;
impl Command for SortCmd {
    fn name(&self) -> &str {
        "sort"
    }
    fn description(&self) -> &str {
        "Sort lines case-insensitively into another file"
    }
    fn usage(&self) -> &str {
        "sort <in> <out>"
    }
    fn category(&self) -> &str {
        "text"
    }
    fn execute(&self, args: &[&str], session: &mut Session<'_>) -> Result<CommandOutput> {
        if args.len() < 2 {
            return Err(ShellError::usage(self.usage()));
        }
        let (input, output) = in_out(session, args)?;
        let mut lines = read_lines(&input)?;
        lines.sort_by_cached_key(|l| l.to_lowercase());
        write_lines(&output, &lines)?;
        Ok(CommandOutput::Text("Sorted.".to_string()))
    }
}

struct UniqCmd;
impl Command for UniqCmd {
    fn name(&self) -> &str {
        "uniq"
    }
    fn description(&self) -> &str {
        "Drop repeated lines (case-insensitive) into another file"
    }
    fn usage(&self) -> &str {
        "uniq <in> <out>"
    }
    fn category(&self) -> &str {
        "text"
    }
    fn execute(&self, args: &[&str], session: &mut Session<'_>) -> Result<CommandOutput> {
        if args.len() < 2 {
            return Err(ShellError::usage(self.usage()));
        }
        let (input, output) = in_out(session, args)?;
        let mut seen = HashSet::new();
        let lines: Vec<String> = read_lines(&input)?
            .into_iter()
            .filter(|l| seen.insert(l.to_lowercase()))
            .collect();
        write_lines(&output, &lines)?;
        Ok(CommandOutput::Text("Uniq written.".to_string()))
    }
}

// ---------------------------------------------------------------------------
// replace
// ---------------------------------------------------------------------------

struct ReplaceCmd;
impl Command for ReplaceCmd {
    fn name(&self) -> &str {
        "replace"
    }
    fn description(&self) -> &str {
        "Replace text in a file (case-insensitive)"
    }
    fn usage(&self) -> &str {
        "replace <file> <old> <new>"
    }
    fn category(&self) -> &str {
        "text"
    }
    fn execute(&self, args: &[&str], session: &mut Session<'_>) -> Result<CommandOutput> {
        if args.len() < 3 {
            return Err(ShellError::usage(self.usage()));
        }
        let path = sandbox::resolve(session, args[0], EntryRule::File)?;
        if args[1].is_empty() {
            return Err(ShellError::Command("search text must not be empty".to_string()));
        }
        let pattern = RegexBuilder::new(&regex::escape(args[1]))
            .case_insensitive(true)
            .build()
            .map_err(|e| ShellError::Command(e.to_string()))?;
        let text = fs::read_to_string(&path)?;
        let replaced = pattern.replace_all(&text, NoExpand(args[2]));
        fs::write(&path, replaced.as_bytes())?;
        Ok(CommandOutput::Text("Replaced.".to_string()))
    }
}

// ---------------------------------------------------------------------------
// echo / upper / lower / trim
// ---------------------------------------------------------------------------

struct EchoCmd;
impl Command for EchoCmd {
    fn name(&self) -> &str {
        "echo"
    }
    fn description(&self) -> &str {
        "Print text"
    }
    fn usage(&self) -> &str {
        "echo [text...]"
    }
    fn category(&self) -> &str {
        "text"
    }
    fn execute(&self, args: &[&str], _session: &mut Session<'_>) -> Result<CommandOutput> {
        Ok(CommandOutput::Text(args.join(" ")))
    }
}

struct UpperCmd;
impl Command for UpperCmd {
    fn name(&self) -> &str {
        "upper"
    }
    fn description(&self) -> &str {
        "Print text in upper case"
    }
    fn usage(&self) -> &str {
        "upper [text...]"
    }
    fn category(&self) -> &str {
        "text"
    }
    fn execute(&self, args: &[&str], _session: &mut Session<'_>) -> Result<CommandOutput> {
        Ok(CommandOutput::Text(args.join(" ").to_uppercase()))
    }
}

struct LowerCmd;
impl Command for LowerCmd {
    fn name(&self) -> &str {
        "lower"
    }
    fn description(&self) -> &str {
        "Print text in lower case"
    }
    fn usage(&self) -> &str {
        "lower [text...]"
    }
    fn category(&self) -> &str {
        "text"
    }
    fn execute(&self, args: &[&str], _session: &mut Session<'_>) -> Result<CommandOutput> {
        Ok(CommandOutput::Text(args.join(" ").to_lowercase()))
    }
}

struct TrimCmd;
impl Command for TrimCmd {
    fn name(&self) -> &str {
        "trim"
    }
    fn description(&self) -> &str {
        "Print text without surrounding whitespace"
    }
    fn usage(&self) -> &str {
        "trim [text...]"
    }
    fn category(&self) -> &str {
        "text"
    }
    fn execute(&self, args: &[&str], _session: &mut Session<'_>) -> Result<CommandOutput> {
        Ok(CommandOutput::Text(args.join(" ").trim().to_string()))
    }
}

// ---------------------------------------------------------------------------
// repeat / newline
// ---------------------------------------------------------------------------

struct RepeatCmd;
impl Command for RepeatCmd {
    fn name(&self) -> &str {
        "repeat"
    }
    fn description(&self) -> &str {
        "Print text a number of times"
    }
    fn usage(&self) -> &str {
        "repeat <text...> <times>"
    }
    fn category(&self) -> &str {
        "text"
    }
    fn execute(&self, args: &[&str], _session: &mut Session<'_>) -> Result<CommandOutput> {
        let Some((times, text)) = args.split_last() else {
            return Err(ShellError::usage(self.usage()));
        };
        let Ok(times) = times.parse::<i64>() else {
            return Err(ShellError::usage(self.usage()));
        };
        if text.is_empty() {
            return Err(ShellError::usage(self.usage()));
        }
        if times > MAX_REPEAT {
            return Err(ShellError::Command(format!(
                "count must be at most {MAX_REPEAT}"
            )));
        }
        let text = text.join(" ");
        let lines: Vec<&str> = (0..times.max(0)).map(|_| text.as_str()).collect();
        if lines.is_empty() {
            return Ok(CommandOutput::None);
        }
        Ok(CommandOutput::lines(lines))
    }
}

struct NewlineCmd;
impl Command for NewlineCmd {
    fn name(&self) -> &str {
        "newline"
    }
    fn description(&self) -> &str {
        "Print an empty line"
    }
    fn usage(&self) -> &str {
        "newline"
    }
    fn category(&self) -> &str {
        "text"
    }
    fn execute(&self, _args: &[&str], _session: &mut Session<'_>) -> Result<CommandOutput> {
        Ok(CommandOutput::Text(String::new()))
    }
}

// ---------------------------------------------------------------------------
// find
// ---------------------------------------------------------------------------

struct FindCmd;
impl Command for FindCmd {
    fn name(&self) -> &str {
        "find"
    }
    fn description(&self) -> &str {
        "Find files below the working directory containing text"
    }
    fn usage(&self) -> &str {
        "find <text>"
    }
    fn category(&self) -> &str {
        "search"
    }
    fn execute(&self, args: &[&str], session: &mut Session<'_>) -> Result<CommandOutput> {
        let Some(term) = args.first() else {
            return Err(ShellError::usage(self.usage()));
        };
        let needle = term.to_lowercase();
        let mut files = Vec::new();
        collect_files(session.cwd(), &mut files);
        files.sort();

        let mut hits = Vec::new();
        for file in &files {
            // Unreadable files are skipped silently.
            let Ok(data) = fs::read(file) else {
                continue;
            };
            if String::from_utf8_lossy(&data).to_lowercase().contains(&needle) {
                let name = file.file_name().unwrap_or_default().to_string_lossy();
                hits.push(format!("FOUND in {name}"));
            }
        }
        Ok(text_or_none(hits))
    }
}

/// Every regular file below `dir`. Symbolic links are not followed.
fn collect_files(dir: &Path, out: &mut Vec<PathBuf>) {
    let Ok(entries) = fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let Ok(kind) = entry.file_type() else {
            continue;
        };
        if kind.is_dir() {
            collect_files(&entry.path(), out);
        } else if kind.is_file() {
            out.push(entry.path());
        }
    }
}

// ---------------------------------------------------------------------------
// grep
// ---------------------------------------------------------------------------

struct GrepCmd;
impl Command for GrepCmd {
    fn name(&self) -> &str {
        "grep"
    }
    fn description(&self) -> &str {
        "Print numbered lines of a file containing text"
    }
    fn usage(&self) -> &str {
        "grep <term> <file>"
    }
    fn category(&self) -> &str {
        "search"
    }
    fn execute(&self, args: &[&str], session: &mut Session<'_>) -> Result<CommandOutput> {
        if args.len() < 2 {
            return Err(ShellError::usage(self.usage()));
        }
        let needle = args[0].to_lowercase();
        let path = sandbox::resolve(session, args[1], EntryRule::File)?;
        let hits: Vec<String> = read_lines(&path)?
            .iter()
            .enumerate()
            .filter(|(_, line)| line.to_lowercase().contains(&needle))
            .map(|(i, line)| format!("{}: {line}", i + 1))
            .collect();
        Ok(text_or_none(hits))
    }
}
