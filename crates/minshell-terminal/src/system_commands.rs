//! System information, clock, random, disk and audit-log commands.

use std::time::Duration;

use chrono::{Datelike, Local, Timelike};
use minshell_types::error::{Result, ShellError};
use rand::Rng;

use crate::audit;
use crate::commands::no_platform;
use crate::interpreter::{Command, CommandOutput, CommandRegistry};
use crate::session::Session;

const MB: u64 = 1024 * 1024;

/// Register system, disk and log commands.
pub fn register_system_commands(reg: &mut CommandRegistry) {
    reg.register(Box::new(DateCmd));
    reg.register(Box::new(TimeCmd));
    reg.register(Box::new(DateTimeCmd));
    reg.register(Box::new(WhoamiCmd));
    reg.register(Box::new(HostnameCmd));
    reg.alias("machine", "hostname");
    reg.register(Box::new(OsCmd));
    reg.register(Box::new(UptimeCmd));
    reg.register(Box::new(CpuArchCmd));
    reg.register(Box::new(UuidCmd));
    reg.register(Box::new(RandCmd));
    reg.register(Box::new(SleepCmd));
    reg.register(Box::new(NowTicksCmd));
    reg.register(Box::new(TicksCmd));
    for part in ClockPart::ALL {
        reg.register(Box::new(part));
    }
    reg.register(Box::new(DrivesCmd));
    reg.register(Box::new(DfCmd));
    reg.register(Box::new(LogCountCmd));
    reg.register(Box::new(ClearLogsCmd));
}

/// Render a duration as `[d.]hh:mm:ss`.
fn format_uptime(secs: u64) -> String {
    let days = secs / 86_400;
    let h = (secs % 86_400) / 3600;
    let m = (secs % 3600) / 60;
    let s = secs % 60;
    if days > 0 {
        format!("{days}.{h:02}:{m:02}:{s:02}")
    } else {
        format!("{h:02}:{m:02}:{s:02}")
    }
}

// ---------------------------------------------------------------------------
// date / time / datetime
// ---------------------------------------------------------------------------

struct DateCmd;
impl Command for DateCmd {
    fn name(&self) -> &str {
        "date"
    }
    fn description(&self) -> &str {
        "Show the current date"
    }
    fn usage(&self) -> &str {
        "date"
    }
    fn category(&self) -> &str {
        "system"
    }
    fn execute(&self, _args: &[&str], _session: &mut Session<'_>) -> Result<CommandOutput> {
        Ok(CommandOutput::Text(Local::now().format("%Y-%m-%d").to_string()))
    }
}

struct TimeCmd;
impl Command for TimeCmd {
    fn name(&self) -> &str {
        "time"
    }
    fn description(&self) -> &str {
        "Show the current time"
    }
    fn usage(&self) -> &str {
        "time"
    }
    fn category(&self) -> &str {
        "system"
    }
    fn execute(&self, _args: &[&str], _session: &mut Session<'_>) -> Result<CommandOutput> {
        Ok(CommandOutput::Text(Local::now().format("%H:%M:%S").to_string()))
    }
}

struct DateTimeCmd;
impl Command for DateTimeCmd {
    fn name(&self) -> &str {
        "datetime"
    }
    fn description(&self) -> &str {
        "Show the current date and time"
    }
    fn usage(&self) -> &str {
        "datetime"
    }
    fn category(&self) -> &str {
        "system"
    }
    fn execute(&self, _args: &[&str], _session: &mut Session<'_>) -> Result<CommandOutput> {
        Ok(CommandOutput::Text(
            Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
        ))
    }
}

// ---------------------------------------------------------------------------
// year / month / day / hour / minute / second
// ---------------------------------------------------------------------------

#[derive(Clone, Copy)]
enum ClockPart {
    Year,
    Month,
    Day,
    Hour,
    Minute,
    Second,
}

impl ClockPart {
    const ALL: [ClockPart; 6] = [
        Self::Year,
        Self::Month,
        Self::Day,
        Self::Hour,
        Self::Minute,
        Self::Second,
    ];
}

impl Command for ClockPart {
    fn name(&self) -> &str {
        match self {
            Self::Year => "year",
            Self::Month => "month",
            Self::Day => "day",
            Self::Hour => "hour",
            Self::Minute => "minute",
            Self::Second => "second",
        }
    }
    fn description(&self) -> &str {
        match self {
            Self::Year => "Current year",
            Self::Month => "Current month (1-12)",
            Self::Day => "Current day of month",
            Self::Hour => "Current hour (0-23)",
            Self::Minute => "Current minute",
            Self::Second => "Current second",
        }
    }
    fn usage(&self) -> &str {
        self.name()
    }
    fn category(&self) -> &str {
        "system"
    }
    fn execute(&self, _args: &[&str], _session: &mut Session<'_>) -> Result<CommandOutput> {
        let now = Local::now();
        let value = match self {
            Self::Year => i64::from(now.year()),
            Self::Month => i64::from(now.month()),
            Self::Day => i64::from(now.day()),
            Self::Hour => i64::from(now.hour()),
            Self::Minute => i64::from(now.minute()),
            Self::Second => i64::from(now.second()),
        };
        Ok(CommandOutput::Text(value.to_string()))
    }
}

// ---------------------------------------------------------------------------
// whoami / hostname / os / uptime / cpuarch
// ---------------------------------------------------------------------------

struct WhoamiCmd;
impl Command for WhoamiCmd {
    fn name(&self) -> &str {
        "whoami"
    }
    fn description(&self) -> &str {
        "Show the current user name"
    }
    fn usage(&self) -> &str {
        "whoami"
    }
    fn category(&self) -> &str {
        "system"
    }
    fn execute(&self, _args: &[&str], session: &mut Session<'_>) -> Result<CommandOutput> {
        let Some(platform) = session.platform() else {
            return Ok(no_platform(self.name()));
        };
        let info = platform.host_info()?;
        let user = info
            .user
            .ok_or_else(|| ShellError::Platform("user name unavailable".to_string()))?;
        Ok(CommandOutput::Text(user))
    }
}

struct HostnameCmd;
impl Command for HostnameCmd {
    fn name(&self) -> &str {
        "hostname"
    }
    fn description(&self) -> &str {
        "Show the machine name"
    }
    fn usage(&self) -> &str {
        "hostname"
    }
    fn category(&self) -> &str {
        "system"
    }
    fn execute(&self, _args: &[&str], session: &mut Session<'_>) -> Result<CommandOutput> {
        let Some(platform) = session.platform() else {
            return Ok(no_platform(self.name()));
        };
        let info = platform.host_info()?;
        let name = info
            .hostname
            .ok_or_else(|| ShellError::Platform("host name unavailable".to_string()))?;
        Ok(CommandOutput::Text(name))
    }
}

struct OsCmd;
impl Command for OsCmd {
    fn name(&self) -> &str {
        "os"
    }
    fn description(&self) -> &str {
        "Show the operating system version"
    }
    fn usage(&self) -> &str {
        "os"
    }
    fn category(&self) -> &str {
        "system"
    }
    fn execute(&self, _args: &[&str], session: &mut Session<'_>) -> Result<CommandOutput> {
        let Some(platform) = session.platform() else {
            return Ok(no_platform(self.name()));
        };
        let info = platform.host_info()?;
        Ok(CommandOutput::Text(info.os))
    }
}

struct UptimeCmd;
impl Command for UptimeCmd {
    fn name(&self) -> &str {
        "uptime"
    }
    fn description(&self) -> &str {
        "Show time since the host booted"
    }
    fn usage(&self) -> &str {
        "uptime"
    }
    fn category(&self) -> &str {
        "system"
    }
    fn execute(&self, _args: &[&str], session: &mut Session<'_>) -> Result<CommandOutput> {
        let Some(platform) = session.platform() else {
            return Ok(no_platform(self.name()));
        };
        let info = platform.host_info()?;
        Ok(CommandOutput::Text(format_uptime(info.uptime_secs)))
    }
}

struct CpuArchCmd;
impl Command for CpuArchCmd {
    fn name(&self) -> &str {
        "cpuarch"
    }
    fn description(&self) -> &str {
        "Show the CPU architecture"
    }
    fn usage(&self) -> &str {
        "cpuarch"
    }
    fn category(&self) -> &str {
        "system"
    }
    fn execute(&self, _args: &[&str], _session: &mut Session<'_>) -> Result<CommandOutput> {
        Ok(CommandOutput::Text(std::env::consts::ARCH.to_string()))
    }
}

// ---------------------------------------------------------------------------
// uuid / rand / sleep
// ---------------------------------------------------------------------------

struct UuidCmd;
impl Command for UuidCmd {
    fn name(&self) -> &str {
        "uuid"
    }
    fn description(&self) -> &str {
        "Generate a random UUID"
    }
    fn usage(&self) -> &str {
        "uuid"
    }
    fn category(&self) -> &str {
        "system"
    }
    fn execute(&self, _args: &[&str], _session: &mut Session<'_>) -> Result<CommandOutput> {
        Ok(CommandOutput::Text(uuid::Uuid::new_v4().to_string()))
    }
}

struct RandCmd;
impl Command for RandCmd {
    fn name(&self) -> &str {
        "rand"
    }
    fn description(&self) -> &str {
        "Random integer in [min, max] (default 0-100)"
    }
    fn usage(&self) -> &str {
        "rand [min max]"
    }
    fn category(&self) -> &str {
        "system"
    }
    fn execute(&self, args: &[&str], _session: &mut Session<'_>) -> Result<CommandOutput> {
        let (min, max) = match args {
            [lo, hi] => (lo.parse().unwrap_or(0), hi.parse().unwrap_or(0)),
            _ => (0i64, 100i64),
        };
        if min > max {
            return Err(ShellError::Command(format!("{min} is greater than {max}")));
        }
        let value = rand::thread_rng().gen_range(min..=max);
        Ok(CommandOutput::Text(value.to_string()))
    }
}

struct SleepCmd;
impl Command for SleepCmd {
    fn name(&self) -> &str {
        "sleep"
    }
    fn description(&self) -> &str {
        "Block for a number of milliseconds"
    }
    fn usage(&self) -> &str {
        "sleep <ms>"
    }
    fn category(&self) -> &str {
        "system"
    }
    fn execute(&self, args: &[&str], _session: &mut Session<'_>) -> Result<CommandOutput> {
        let Some(ms) = args.first().and_then(|s| s.parse::<u64>().ok()) else {
            return Err(ShellError::usage(self.usage()));
        };
        std::thread::sleep(Duration::from_millis(ms));
        Ok(CommandOutput::Text(format!("Slept {ms}ms")))
    }
}

// ---------------------------------------------------------------------------
// nowticks / ticks
// ---------------------------------------------------------------------------

struct NowTicksCmd;
impl Command for NowTicksCmd {
    fn name(&self) -> &str {
        "nowticks"
    }
    fn description(&self) -> &str {
        "Milliseconds since the Unix epoch"
    }
    fn usage(&self) -> &str {
        "nowticks"
    }
    fn category(&self) -> &str {
        "system"
    }
    fn execute(&self, _args: &[&str], _session: &mut Session<'_>) -> Result<CommandOutput> {
        Ok(CommandOutput::Text(Local::now().timestamp_millis().to_string()))
    }
}

struct TicksCmd;
impl Command for TicksCmd {
    fn name(&self) -> &str {
        "ticks"
    }
    fn description(&self) -> &str {
        "Milliseconds since this session started"
    }
    fn usage(&self) -> &str {
        "ticks"
    }
    fn category(&self) -> &str {
        "system"
    }
    fn execute(&self, _args: &[&str], session: &mut Session<'_>) -> Result<CommandOutput> {
        Ok(CommandOutput::Text(session.elapsed_millis().to_string()))
    }
}

// ---------------------------------------------------------------------------
// drives / df
// ---------------------------------------------------------------------------

struct DrivesCmd;
impl Command for DrivesCmd {
    fn name(&self) -> &str {
        "drives"
    }
    fn description(&self) -> &str {
        "List mounted volumes and free space"
    }
    fn usage(&self) -> &str {
        "drives"
    }
    fn category(&self) -> &str {
        "disk"
    }
    fn execute(&self, _args: &[&str], session: &mut Session<'_>) -> Result<CommandOutput> {
        let Some(platform) = session.platform() else {
            return Ok(no_platform(self.name()));
        };
        let disks = platform.disks()?;
        if disks.is_empty() {
            return Ok(CommandOutput::None);
        }
        Ok(CommandOutput::lines(disks.iter().map(|d| {
            format!(
                "{} {} {} MB free",
                d.mount_point.display(),
                d.kind,
                d.available_bytes / MB
            )
        })))
    }
}

struct DfCmd;
impl Command for DfCmd {
    fn name(&self) -> &str {
        "df"
    }
    fn description(&self) -> &str {
        "Free space on the volume holding the working directory"
    }
    fn usage(&self) -> &str {
        "df"
    }
    fn category(&self) -> &str {
        "disk"
    }
    fn execute(&self, _args: &[&str], session: &mut Session<'_>) -> Result<CommandOutput> {
        let Some(platform) = session.platform() else {
            return Ok(no_platform(self.name()));
        };
        match platform.disk_for(session.cwd())? {
            Some(d) => Ok(CommandOutput::Text(format!(
                "Free: {} MB / Total: {} MB",
                d.available_bytes / MB,
                d.total_bytes / MB
            ))),
            None => Ok(CommandOutput::Text("Drive not ready.".to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// logcount / clearlogs
// ---------------------------------------------------------------------------

struct LogCountCmd;
impl Command for LogCountCmd {
    fn name(&self) -> &str {
        "logcount"
    }
    fn description(&self) -> &str {
        "Count audit log files"
    }
    fn usage(&self) -> &str {
        "logcount"
    }
    fn category(&self) -> &str {
        "logs"
    }
    fn execute(&self, _args: &[&str], session: &mut Session<'_>) -> Result<CommandOutput> {
        let count = audit::entries(session.temp_path())?.len();
        Ok(CommandOutput::Text(count.to_string()))
    }
}

struct ClearLogsCmd;
impl Command for ClearLogsCmd {
    fn name(&self) -> &str {
        "clearlogs"
    }
    fn description(&self) -> &str {
        "Delete all audit log files"
    }
    fn usage(&self) -> &str {
        "clearlogs"
    }
    fn category(&self) -> &str {
        "logs"
    }
    fn execute(&self, _args: &[&str], session: &mut Session<'_>) -> Result<CommandOutput> {
        if !session.temp_path().is_dir() {
            return Ok(CommandOutput::Text("No logs.".to_string()));
        }
        let removed = audit::clear(session.temp_path())?;
        log::debug!("clearlogs: removed {removed} files");
        Ok(CommandOutput::Text("Logs cleared.".to_string()))
    }
}
