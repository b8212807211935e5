//! Command trait, registry, and dispatch logic.
//!
//! A line is audited, tokenized (double quotes group words), and the first
//! token is looked up case-insensitively. The matched handler runs to
//! completion; whatever it returns, success or failure, reaches the user as
//! output through the session. Nothing escapes `execute`.

use std::collections::HashMap;
use std::sync::Arc;

use minshell_types::error::{Result, ShellError};

use crate::audit::{AuditLog, TimestampedFileLog};
use crate::session::{CLEAR_SCREEN, Session};

/// Output produced by a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutput {
    /// Text to print. May span several lines; an empty string prints a blank line.
    Text(String),
    /// Command produced no visible output.
    None,
    /// Signal to clear the terminal output buffer.
    Clear,
}

impl CommandOutput {
    /// Join output lines into a single text block.
    pub fn lines<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let joined: Vec<String> = lines.into_iter().map(|l| l.as_ref().to_string()).collect();
        Self::Text(joined.join("\n"))
    }
}

/// A single executable command.
pub trait Command: Send + Sync {
    /// The command name (what the user types).
    fn name(&self) -> &str;

    /// One-line description for `help`.
    fn description(&self) -> &str;

    /// Usage string (e.g. "copy <src> <dst>").
    fn usage(&self) -> &str;

    /// Command category for grouping in `help` output.
    fn category(&self) -> &str {
        "general"
    }

    /// Execute the command with the given arguments and session.
    fn execute(&self, args: &[&str], session: &mut Session<'_>) -> Result<CommandOutput>;
}

/// Registry of available commands with dispatch.
///
/// Built once at startup, read-only while dispatching. Keys are lowercase;
/// an alias is simply a second key sharing the same handler.
pub struct CommandRegistry {
    commands: HashMap<String, Arc<dyn Command>>,
    audit: Box<dyn AuditLog>,
}

impl CommandRegistry {
    /// Create an empty command registry that audits to timestamped files.
    pub fn new() -> Self {
        Self::with_audit(Box::new(TimestampedFileLog))
    }

    /// Create an empty command registry with a custom audit sink.
    pub fn with_audit(audit: Box<dyn AuditLog>) -> Self {
        Self {
            commands: HashMap::new(),
            audit,
        }
    }

    /// Register a command. Replaces any existing command with the same name,
    /// whatever its casing.
    pub fn register(&mut self, cmd: Box<dyn Command>) {
        let key = cmd.name().to_lowercase();
        self.commands.insert(key, Arc::from(cmd));
    }

    /// Bind `alias` to the handler already registered as `target`.
    ///
    /// Returns `false` (and registers nothing) if `target` is unknown.
    pub fn alias(&mut self, alias: &str, target: &str) -> bool {
        let Some(handler) = self.commands.get(&target.to_lowercase()) else {
            return false;
        };
        let handler = Arc::clone(handler);
        self.commands.insert(alias.to_lowercase(), handler);
        true
    }

    /// Case-insensitive lookup.
    pub fn lookup(&self, name: &str) -> Option<&dyn Command> {
        self.commands.get(&name.to_lowercase()).map(|c| c.as_ref())
    }

    /// Number of registered names, aliases included.
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Audit, tokenize and dispatch one raw input line.
    ///
    /// Every outcome, including unknown commands and handler failures, is
    /// reported through the session's output hook.
    pub fn execute(&self, line: &str, session: &mut Session<'_>) {
        if let Err(e) = self.audit.record(session.temp_path(), line) {
            log::debug!("audit write failed: {e}");
        }

        let tokens = tokenize(line);
        let Some((name, rest)) = tokens.split_first() else {
            return;
        };
        let args: Vec<&str> = rest.iter().map(String::as_str).collect();
        log::debug!("dispatch: {name} ({} args)", args.len());

        if name.eq_ignore_ascii_case("help") {
            let output = self.execute_help(&args, session);
            emit(name, output, session);
            return;
        }

        match self.commands.get(&name.to_lowercase()) {
            Some(cmd) => {
                let output = cmd.execute(&args, session);
                emit(cmd.name(), output, session);
            },
            None => session.print(&ShellError::UnknownCommand.to_string()),
        }
    }

    /// Built-in help with access to the registry.
    fn execute_help(&self, args: &[&str], session: &Session<'_>) -> Result<CommandOutput> {
        if let Some(&name) = args.first() {
            return match self.lookup(name) {
                Some(cmd) => {
                    let mut out = cmd.name().to_string();
                    out.push_str(&format!(" ({})\n", cmd.category()));
                    out.push_str(&format!("  {}\n", cmd.description()));
                    out.push_str(&format!("  Usage: {}", cmd.usage()));
                    Ok(CommandOutput::Text(out))
                },
                None => Err(ShellError::UnknownCommand),
            };
        }

        // Group commands by category.
        let mut categories: HashMap<&str, Vec<(&str, &str)>> = HashMap::new();
        categories
            .entry("core")
            .or_default()
            .push(("help", "List commands or show one command's usage"));
        for (key, cmd) in &self.commands {
            categories
                .entry(cmd.category())
                .or_default()
                .push((key.as_str(), cmd.description()));
        }

        let mut cats: Vec<&str> = categories.keys().copied().collect();
        cats.sort();

        let total: usize = categories.values().map(Vec::len).sum();
        let mut out = format!("Commands ({total}):\n");
        for cat in &cats {
            let mut cmds = categories.get(cat).cloned().unwrap_or_default();
            cmds.sort_by_key(|(name, _)| *name);
            out.push_str(&format!("\n  [{cat}]\n"));
            for (name, desc) in &cmds {
                out.push_str(&format!("    {name:12} {desc}\n"));
            }
        }
        out.push_str("\nType 'help <command>' for details.\n");
        out.push_str(&format!("Root: {}", session.root().display()));
        Ok(CommandOutput::Text(out))
    }

    /// List all registered command names with descriptions, sorted.
    pub fn list_commands(&self) -> Vec<(&str, &str)> {
        let mut cmds: Vec<(&str, &str)> = self
            .commands
            .iter()
            .map(|(key, c)| (key.as_str(), c.description()))
            .collect();
        cmds.sort_by_key(|(name, _)| *name);
        cmds
    }

    /// Command names starting with `partial` (case-insensitive), sorted.
    pub fn completions(&self, partial: &str) -> Vec<String> {
        let partial = partial.to_lowercase();
        let mut matches: Vec<String> = self
            .commands
            .keys()
            .filter(|k| k.starts_with(&partial))
            .cloned()
            .collect();
        matches.sort();
        matches
    }
}

impl Default for CommandRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Handler boundary: turn a handler's result into output.
fn emit(name: &str, output: Result<CommandOutput>, session: &mut Session<'_>) {
    match output {
        Ok(CommandOutput::Text(text)) => session.print(&text),
        Ok(CommandOutput::Clear) => session.print(CLEAR_SCREEN),
        Ok(CommandOutput::None) => {},
        Err(e) => session.print(&e.report(name)),
    }
}

/// Split a line into arguments.
///
/// Whitespace separates tokens except inside double quotes. A quote toggles
/// quoting and is dropped from the output; there is no escape for a literal
/// quote. An unterminated quote simply quotes to the end of the line.
pub fn tokenize(input: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;

    for ch in input.chars() {
        if ch == '"' {
            in_quotes = !in_quotes;
        } else if ch.is_whitespace() && !in_quotes {
            if !current.is_empty() {
                tokens.push(std::mem::take(&mut current));
            }
        } else {
            current.push(ch);
        }
    }
    if !current.is_empty() {
        tokens.push(current);
    }
    tokens
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::NullAuditLog;
    use crate::test_utils::Fixture;
    use proptest::prelude::*;

    struct EchoCmd;
    impl Command for EchoCmd {
        fn name(&self) -> &str {
            "echo"
        }
        fn description(&self) -> &str {
            "Print arguments"
        }
        fn usage(&self) -> &str {
            "echo [text...]"
        }
        fn execute(&self, args: &[&str], _session: &mut Session<'_>) -> Result<CommandOutput> {
            Ok(CommandOutput::Text(args.join(" ")))
        }
    }

    struct FailCmd;
    impl Command for FailCmd {
        fn name(&self) -> &str {
            "fail"
        }
        fn description(&self) -> &str {
            "Always fails"
        }
        fn usage(&self) -> &str {
            "fail"
        }
        fn execute(&self, args: &[&str], _session: &mut Session<'_>) -> Result<CommandOutput> {
            if args.is_empty() {
                return Err(ShellError::usage(self.usage()));
            }
            Err(ShellError::Io(std::io::Error::new(
                std::io::ErrorKind::PermissionDenied,
                "denied",
            )))
        }
    }

    fn echo_registry() -> CommandRegistry {
        let mut reg = CommandRegistry::with_audit(Box::new(NullAuditLog));
        reg.register(Box::new(EchoCmd));
        reg.register(Box::new(FailCmd));
        reg
    }

    #[test]
    fn register_and_execute() {
        let reg = echo_registry();
        let fx = Fixture::new();
        let mut frontend = fx.frontend();
        let log = frontend.clone();
        let mut session = fx.session(&mut frontend);
        reg.execute("echo hello world", &mut session);
        assert_eq!(log.lines(), vec!["hello world"]);
    }

    #[test]
    fn unknown_command_reported_generically() {
        let reg = echo_registry();
        let fx = Fixture::new();
        let mut frontend = fx.frontend();
        let log = frontend.clone();
        let mut session = fx.session(&mut frontend);
        reg.execute("frobnicate --all", &mut session);
        reg.execute("frobnicate --all", &mut session);
        assert_eq!(
            log.lines(),
            vec!["Unknown command. Type 'help'.", "Unknown command. Type 'help'."]
        );
        assert!(!log.lines()[0].contains("--all"));
        assert_eq!(session.cwd(), fx.root());
        assert_eq!(session.root(), fx.root());
    }

    #[test]
    fn empty_and_whitespace_input_print_nothing() {
        let reg = echo_registry();
        let fx = Fixture::new();
        let mut frontend = fx.frontend();
        let log = frontend.clone();
        let mut session = fx.session(&mut frontend);
        reg.execute("", &mut session);
        reg.execute("   \t  ", &mut session);
        assert!(log.lines().is_empty());
    }

    #[test]
    fn command_case_insensitive() {
        let reg = echo_registry();
        let fx = Fixture::new();
        let mut frontend = fx.frontend();
        let log = frontend.clone();
        let mut session = fx.session(&mut frontend);
        reg.execute("ECHO hi", &mut session);
        reg.execute("Echo hi", &mut session);
        assert_eq!(log.lines(), vec!["hi", "hi"]);
    }

    #[test]
    fn help_is_case_insensitive() {
        let reg = echo_registry();
        let fx = Fixture::new();
        let mut frontend = fx.frontend();
        let log = frontend.clone();
        let mut session = fx.session(&mut frontend);
        reg.execute("HELP", &mut session);
        reg.execute("help", &mut session);
        let lines = log.lines();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], lines[1]);
        assert!(lines[0].contains("echo"));
        assert!(lines[0].contains(&format!("Root: {}", fx.root().display())));
    }

    #[test]
    fn help_for_one_command() {
        let reg = echo_registry();
        let fx = Fixture::new();
        let mut frontend = fx.frontend();
        let log = frontend.clone();
        let mut session = fx.session(&mut frontend);
        reg.execute("help ECHO", &mut session);
        reg.execute("help nope", &mut session);
        let lines = log.lines();
        assert!(lines[0].contains("Usage: echo [text...]"));
        assert_eq!(lines[1], "Unknown command. Type 'help'.");
    }

    #[test]
    fn handler_failures_become_output() {
        let reg = echo_registry();
        let fx = Fixture::new();
        let mut frontend = fx.frontend();
        let log = frontend.clone();
        let mut session = fx.session(&mut frontend);
        reg.execute("fail", &mut session);
        reg.execute("fail now", &mut session);
        assert_eq!(log.lines(), vec!["Usage: fail", "fail failed: denied"]);
    }

    #[test]
    fn quoted_args_reach_handler_intact() {
        let reg = echo_registry();
        let fx = Fixture::new();
        let mut frontend = fx.frontend();
        let log = frontend.clone();
        let mut session = fx.session(&mut frontend);
        reg.execute(r#"echo "a   b" c"#, &mut session);
        assert_eq!(log.lines(), vec!["a   b c"]);
    }

    #[test]
    fn execute_audits_every_line() {
        let reg = CommandRegistry::new();
        let fx = Fixture::new();
        let mut frontend = fx.frontend();
        let mut session = fx.session(&mut frontend);
        reg.execute("echo one", &mut session);
        reg.execute("nothing here", &mut session);
        let files = crate::audit::entries(session.temp_path()).unwrap();
        assert_eq!(files.len(), 2);
        assert_eq!(std::fs::read_to_string(&files[0]).unwrap(), "echo one");
    }

    #[test]
    fn audit_failure_does_not_block_dispatch() {
        struct BrokenLog;
        impl AuditLog for BrokenLog {
            fn record(
                &self,
                _dir: &std::path::Path,
                _line: &str,
            ) -> std::io::Result<std::path::PathBuf> {
                Err(std::io::Error::other("disk full"))
            }
        }
        let mut reg = CommandRegistry::with_audit(Box::new(BrokenLog));
        reg.register(Box::new(EchoCmd));
        let fx = Fixture::new();
        let mut frontend = fx.frontend();
        let log = frontend.clone();
        let mut session = fx.session(&mut frontend);
        reg.execute("echo still works", &mut session);
        assert_eq!(log.lines(), vec!["still works"]);
    }

    #[test]
    fn register_replaces_existing_command_any_case() {
        struct Shout;
        impl Command for Shout {
            fn name(&self) -> &str {
                "ECHO"
            }
            fn description(&self) -> &str {
                "version B"
            }
            fn usage(&self) -> &str {
                "ECHO"
            }
            fn execute(&self, _: &[&str], _: &mut Session<'_>) -> Result<CommandOutput> {
                Ok(CommandOutput::Text("B".into()))
            }
        }

        let mut reg = echo_registry();
        reg.register(Box::new(Shout));
        assert_eq!(reg.len(), 2);
        assert_eq!(reg.lookup("echo").unwrap().description(), "version B");
    }

    #[test]
    fn alias_shares_handler() {
        let mut reg = echo_registry();
        assert!(reg.alias("say", "ECHO"));
        assert!(!reg.alias("ghost", "missing"));
        assert!(std::ptr::addr_eq(
            reg.lookup("say").unwrap(),
            reg.lookup("echo").unwrap()
        ));
        assert!(reg.lookup("ghost").is_none());
    }

    #[test]
    fn list_commands_sorted() {
        let mut reg = echo_registry();
        reg.alias("say", "echo");
        let names: Vec<&str> = reg.list_commands().iter().map(|(n, _)| *n).collect();
        assert_eq!(names, vec!["echo", "fail", "say"]);
    }

    #[test]
    fn completions_prefix() {
        let reg = echo_registry();
        assert_eq!(reg.completions("E"), vec!["echo".to_string()]);
        assert!(reg.completions("zz").is_empty());
    }

    #[test]
    fn command_output_lines_joins() {
        assert_eq!(
            CommandOutput::lines(["a", "b"]),
            CommandOutput::Text("a\nb".into())
        );
    }

    // -- tokenizer --

    #[test]
    fn tokenize_simple() {
        assert_eq!(tokenize("ls -la /home"), vec!["ls", "-la", "/home"]);
    }

    #[test]
    fn tokenize_double_quotes() {
        assert_eq!(tokenize(r#"cmd "a b" c"#), vec!["cmd", "a b", "c"]);
    }

    #[test]
    fn tokenize_empty() {
        assert!(tokenize("").is_empty());
        assert!(tokenize("   ").is_empty());
    }

    #[test]
    fn tokenize_unterminated_double() {
        assert_eq!(tokenize(r#"a "b"#), vec!["a", "b"]);
        assert_eq!(tokenize(r#"a "b   c"#), vec!["a", "b   c"]);
    }

    #[test]
    fn tokenize_quotes_join_adjacent_text() {
        assert_eq!(tokenize(r#"x"y z"w"#), vec!["xy zw"]);
    }

    #[test]
    fn tokenize_empty_quotes_produce_nothing() {
        assert_eq!(tokenize(r#"a "" b"#), vec!["a", "b"]);
    }

    #[test]
    fn tokenize_single_quote_is_literal() {
        assert_eq!(tokenize("it's fine"), vec!["it's", "fine"]);
    }

    #[test]
    fn tokenize_tabs_and_newlines() {
        assert_eq!(tokenize("a\tb\nc"), vec!["a", "b", "c"]);
    }

    proptest! {
        #[test]
        fn tokens_never_contain_quotes(line in ".*") {
            for token in tokenize(&line) {
                prop_assert!(!token.contains('"'));
                prop_assert!(!token.is_empty());
            }
        }

        #[test]
        fn unquoted_input_matches_split_whitespace(line in "[^\"]*") {
            let expected: Vec<String> =
                line.split_whitespace().map(str::to_string).collect();
            prop_assert_eq!(tokenize(&line), expected);
        }

        #[test]
        fn tokenize_is_deterministic(line in ".*") {
            prop_assert_eq!(tokenize(&line), tokenize(&line));
        }
    }
}
