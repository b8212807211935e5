//! Desktop implementation backed by `sysinfo`, `reqwest` and the host's
//! own `ping` and opener utilities.

use std::path::Path;
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

use minshell_types::error::{Result, ShellError};
use sysinfo::{Disks, Pid, System};

use crate::services::{
    DiskInfo, HostInfo, HttpResponse, NetworkService, PingReply, ProcessInfo, ProcessService,
    SystemService,
};

/// Platform services for a regular desktop or server OS.
#[derive(Debug, Clone)]
pub struct DesktopPlatform {
    http_timeout: Duration,
    ping_timeout: Duration,
}

impl DesktopPlatform {
    pub fn new(http_timeout: Duration, ping_timeout: Duration) -> Self {
        Self {
            http_timeout,
            ping_timeout,
        }
    }
}

impl Default for DesktopPlatform {
    fn default() -> Self {
        Self::new(Duration::from_secs(30), Duration::from_millis(2000))
    }
}

fn current_user() -> Option<String> {
    std::env::var("USER")
        .or_else(|_| std::env::var("USERNAME"))
        .ok()
        .filter(|u| !u.is_empty())
}

impl SystemService for DesktopPlatform {
    fn host_info(&self) -> Result<HostInfo> {
        Ok(HostInfo {
            hostname: System::host_name(),
            os: System::long_os_version().unwrap_or_else(|| std::env::consts::OS.to_string()),
            arch: std::env::consts::ARCH.to_string(),
            user: current_user(),
            uptime_secs: System::uptime(),
        })
    }

    fn disks(&self) -> Result<Vec<DiskInfo>> {
        let disks = Disks::new_with_refreshed_list();
        Ok(disks
            .list()
            .iter()
            .map(|d| DiskInfo {
                name: d.name().to_string_lossy().into_owned(),
                mount_point: d.mount_point().to_path_buf(),
                kind: format!("{:?}", d.kind()),
                available_bytes: d.available_space(),
                total_bytes: d.total_space(),
            })
            .collect())
    }
}

impl ProcessService for DesktopPlatform {
    fn processes(&self) -> Result<Vec<ProcessInfo>> {
        let mut sys = System::new();
        sys.refresh_processes();
        let mut list: Vec<ProcessInfo> = sys
            .processes()
            .iter()
            .map(|(pid, proc_)| ProcessInfo {
                pid: pid.as_u32(),
                name: proc_.name().to_string(),
            })
            .collect();
        list.sort_by_key(|p| p.pid);
        Ok(list)
    }

    fn kill(&self, pid: u32) -> Result<()> {
        let mut sys = System::new();
        sys.refresh_processes();
        let Some(process) = sys.process(Pid::from_u32(pid)) else {
            return Err(ShellError::Platform(format!("no process with id {pid}")));
        };
        if process.kill() {
            Ok(())
        } else {
            Err(ShellError::Platform(format!("could not signal process {pid}")))
        }
    }

    fn launch(&self, program: &Path, args: &[&str], cwd: &Path) -> Result<u32> {
        let child = Command::new(program)
            .args(args)
            .current_dir(cwd)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()?;
        log::debug!("launched {} as pid {}", program.display(), child.id());
        Ok(child.id())
    }

    fn open(&self, target: &Path) -> Result<()> {
        let mut cmd = opener_command();
        cmd.arg(target)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()?;
        Ok(())
    }
}

#[cfg(windows)]
fn opener_command() -> Command {
    let mut cmd = Command::new("cmd");
    cmd.args(["/C", "start", ""]);
    cmd
}

#[cfg(target_os = "macos")]
fn opener_command() -> Command {
    Command::new("open")
}

#[cfg(not(any(windows, target_os = "macos")))]
fn opener_command() -> Command {
    Command::new("xdg-open")
}

#[cfg(windows)]
fn ping_command(host: &str, timeout: Duration) -> Command {
    let mut cmd = Command::new("ping");
    cmd.args(["-n", "1", "-w"])
        .arg(timeout.as_millis().to_string())
        .arg(host);
    cmd
}

#[cfg(not(windows))]
fn ping_command(host: &str, timeout: Duration) -> Command {
    // `-W` takes whole seconds on Linux; round up so short timeouts still wait.
    let secs = timeout.as_millis().div_ceil(1000).max(1);
    let mut cmd = Command::new("ping");
    cmd.args(["-c", "1", "-W"]).arg(secs.to_string()).arg(host);
    cmd
}

impl NetworkService for DesktopPlatform {
    fn ping(&self, host: &str) -> Result<PingReply> {
        if host.is_empty() || host.starts_with('-') {
            return Err(ShellError::Network(format!("invalid host: {host}")));
        }
        let start = Instant::now();
        let output = ping_command(host, self.ping_timeout)
            .stdin(Stdio::null())
            .output()
            .map_err(|e| ShellError::Network(format!("ping unavailable: {e}")))?;
        Ok(PingReply {
            reachable: output.status.success(),
            round_trip_ms: start.elapsed().as_millis() as u64,
        })
    }

    fn http_get(&self, url: &str) -> Result<HttpResponse> {
        let client = reqwest::blocking::Client::builder()
            .timeout(self.http_timeout)
            .build()
            .map_err(|e| ShellError::Network(e.to_string()))?;
        let resp = client
            .get(url)
            .send()
            .map_err(|e| ShellError::Network(e.to_string()))?;
        let status_code = resp.status().as_u16();
        let body = resp
            .bytes()
            .map_err(|e| ShellError::Network(e.to_string()))?
            .to_vec();
        Ok(HttpResponse { status_code, body })
    }
}
