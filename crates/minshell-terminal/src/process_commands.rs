//! Process commands: launch, open, list and kill.

use minshell_types::error::{Result, ShellError};

use crate::commands::no_platform;
use crate::interpreter::{Command, CommandOutput, CommandRegistry};
use crate::sandbox::{self, EntryRule};
use crate::session::Session;

/// Register process commands.
pub fn register_process_commands(reg: &mut CommandRegistry) {
    reg.register(Box::new(RunCmd));
    reg.register(Box::new(OpenCmd));
    reg.register(Box::new(PsCmd));
    reg.register(Box::new(KillCmd));
}

// ---------------------------------------------------------------------------
// run
// ---------------------------------------------------------------------------

struct RunCmd;
impl Command for RunCmd {
    fn name(&self) -> &str {
        "run"
    }
    fn description(&self) -> &str {
        "Launch a program from inside the root"
    }
    fn usage(&self) -> &str {
        "run <exe> [args...]"
    }
    fn category(&self) -> &str {
        "process"
    }
    fn execute(&self, args: &[&str], session: &mut Session<'_>) -> Result<CommandOutput> {
        let Some((raw, rest)) = args.split_first() else {
            return Err(ShellError::usage(self.usage()));
        };
        let exe = sandbox::resolve(session, raw, EntryRule::File)?;
        let Some(platform) = session.platform() else {
            return Ok(no_platform(self.name()));
        };
        if !exe.is_file() {
            return Err(ShellError::Command(format!(
                "file not found: {}",
                exe.display()
            )));
        }
        let pid = platform.launch(&exe, rest, session.cwd())?;
        Ok(CommandOutput::Text(format!("Started process {pid}")))
    }
}

// ---------------------------------------------------------------------------
// open
// ---------------------------------------------------------------------------

struct OpenCmd;
impl Command for OpenCmd {
    fn name(&self) -> &str {
        "open"
    }
    fn description(&self) -> &str {
        "Open a file or folder with the desktop's default handler"
    }
    fn usage(&self) -> &str {
        "open <path>"
    }
    fn category(&self) -> &str {
        "process"
    }
    fn execute(&self, args: &[&str], session: &mut Session<'_>) -> Result<CommandOutput> {
        let Some(raw) = args.first() else {
            return Err(ShellError::usage(self.usage()));
        };
        let target = sandbox::resolve(session, raw, EntryRule::Either)?;
        let Some(platform) = session.platform() else {
            return Ok(no_platform(self.name()));
        };
        if !target.exists() {
            return Err(ShellError::Command(format!(
                "not found: {}",
                target.display()
            )));
        }
        platform.open(&target)?;
        Ok(CommandOutput::None)
    }
}

// ---------------------------------------------------------------------------
// ps
// ---------------------------------------------------------------------------

struct PsCmd;
impl Command for PsCmd {
    fn name(&self) -> &str {
        "ps"
    }
    fn description(&self) -> &str {
        "List running processes"
    }
    fn usage(&self) -> &str {
        "ps"
    }
    fn category(&self) -> &str {
        "process"
    }
    fn execute(&self, _args: &[&str], session: &mut Session<'_>) -> Result<CommandOutput> {
        let Some(platform) = session.platform() else {
            return Ok(no_platform(self.name()));
        };
        let procs = platform.processes()?;
        if procs.is_empty() {
            return Ok(CommandOutput::None);
        }
        Ok(CommandOutput::lines(
            procs.iter().map(|p| format!("{} {}", p.pid, p.name)),
        ))
    }
}

// ---------------------------------------------------------------------------
// kill
// ---------------------------------------------------------------------------

struct KillCmd;
impl Command for KillCmd {
    fn name(&self) -> &str {
        "kill"
    }
    fn description(&self) -> &str {
        "Terminate a process by pid"
    }
    fn usage(&self) -> &str {
        "kill <pid>"
    }
    fn category(&self) -> &str {
        "process"
    }
    fn execute(&self, args: &[&str], session: &mut Session<'_>) -> Result<CommandOutput> {
        let Some(pid) = args.first().and_then(|s| s.parse::<u32>().ok()) else {
            return Err(ShellError::usage(self.usage()));
        };
        let Some(platform) = session.platform() else {
            return Ok(no_platform(self.name()));
        };
        platform.kill(pid)?;
        Ok(CommandOutput::Text(format!("Killed process {pid}")))
    }
}
