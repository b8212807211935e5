//! Minshell console entry point.
//!
//! Reads one line at a time from stdin and dispatches it through the command
//! registry. The configuration path comes from the first argument or the
//! `MINSHELL_CONFIG` environment variable; without either, defaults apply.
//! Type `exit` or `quit` (or send EOF) to leave.

mod frontend;

use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};

use frontend::ConsoleFrontend;
use minshell_platform::DesktopPlatform;
use minshell_terminal::{CommandRegistry, Session, VERSION_BANNER, register_builtins};
use minshell_types::config::ShellConfig;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let config = match std::env::args()
        .nth(1)
        .or_else(|| std::env::var("MINSHELL_CONFIG").ok())
    {
        Some(path) => ShellConfig::load(&PathBuf::from(path))?,
        None => ShellConfig::default(),
    };

    let platform = DesktopPlatform::new(config.http_timeout(), config.ping_timeout());

    let mut registry = CommandRegistry::new();
    register_builtins(&mut registry);

    let mut console = ConsoleFrontend::new(io::stdout());
    let mut session = Session::new(&config.root, &config.temp_path, &mut console)
        .with_context(|| format!("cannot open sandbox root {}", config.root.display()))?
        .with_platform(&platform);

    log::info!(
        "session started: root {}, temp {}, {} commands",
        session.root().display(),
        session.temp_path().display(),
        registry.len(),
    );
    session.print(VERSION_BANNER);

    let stdin = io::stdin();
    let mut input = stdin.lock();
    let mut line = String::new();
    loop {
        print!("{}> ", session.cwd().display());
        io::stdout().flush()?;

        line.clear();
        if input.read_line(&mut line)? == 0 {
            break;
        }
        let raw = strip_line_ending(&line);
        if is_exit(raw) {
            break;
        }
        registry.execute(raw, &mut session);
    }

    log::info!("session ended");
    Ok(())
}

/// Drop the terminator `read_line` leaves in place; other whitespace is
/// part of the command line.
fn strip_line_ending(line: &str) -> &str {
    line.trim_end_matches(['\r', '\n'])
}

fn is_exit(line: &str) -> bool {
    let word = line.trim();
    word.eq_ignore_ascii_case("exit") || word.eq_ignore_ascii_case("quit")
}
