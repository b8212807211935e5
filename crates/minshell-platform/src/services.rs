//! Platform service traits.

use std::net::{IpAddr, ToSocketAddrs};
use std::path::{Path, PathBuf};

use minshell_types::error::{Result, ShellError};

// ---------------------------------------------------------------------------
// System service
// ---------------------------------------------------------------------------

/// Static facts about the host machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostInfo {
    pub hostname: Option<String>,
    /// Human-readable OS name and version.
    pub os: String,
    /// CPU architecture (e.g. "x86_64").
    pub arch: String,
    pub user: Option<String>,
    /// Seconds since the host booted.
    pub uptime_secs: u64,
}

/// One mounted volume.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiskInfo {
    pub name: String,
    pub mount_point: PathBuf,
    /// Disk kind as reported by the OS ("SSD", "HDD", "Unknown").
    pub kind: String,
    pub available_bytes: u64,
    pub total_bytes: u64,
}

/// Abstraction over host identity and storage queries.
pub trait SystemService {
    /// Query host identity, OS and uptime.
    fn host_info(&self) -> Result<HostInfo>;

    /// List mounted volumes.
    fn disks(&self) -> Result<Vec<DiskInfo>>;

    /// The volume holding `path`: the disk with the longest mount point
    /// that prefixes it.
    fn disk_for(&self, path: &Path) -> Result<Option<DiskInfo>> {
        let disks = self.disks()?;
        Ok(disks
            .into_iter()
            .filter(|d| path.starts_with(&d.mount_point))
            .max_by_key(|d| d.mount_point.as_os_str().len()))
    }
}

// ---------------------------------------------------------------------------
// Process service
// ---------------------------------------------------------------------------

/// A running process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessInfo {
    pub pid: u32,
    pub name: String,
}

/// Abstraction over the process table and program launching.
pub trait ProcessService {
    /// Snapshot of running processes, sorted by pid.
    fn processes(&self) -> Result<Vec<ProcessInfo>>;

    /// Terminate a process.
    fn kill(&self, pid: u32) -> Result<()>;

    /// Start `program` detached with `cwd` as its working directory.
    /// Returns the child's pid.
    fn launch(&self, program: &Path, args: &[&str], cwd: &Path) -> Result<u32>;

    /// Hand `target` to the desktop's default opener.
    fn open(&self, target: &Path) -> Result<()>;
}

// ---------------------------------------------------------------------------
// Network service
// ---------------------------------------------------------------------------

/// Result of a single echo request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PingReply {
    pub reachable: bool,
    pub round_trip_ms: u64,
}

impl PingReply {
    /// Status word shown to the user.
    pub fn status(&self) -> &'static str {
        if self.reachable { "Success" } else { "TimedOut" }
    }
}

/// HTTP response from a network service.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    /// HTTP status code (e.g. 200, 404).
    pub status_code: u16,
    /// Response body as bytes.
    pub body: Vec<u8>,
}

/// Abstraction over network egress. Remote targets are never sandboxed.
pub trait NetworkService {
    /// Send one echo request to `host`.
    fn ping(&self, host: &str) -> Result<PingReply>;

    /// Resolve a hostname to its addresses.
    fn resolve(&self, host: &str) -> Result<Vec<IpAddr>> {
        let addrs = (host, 0)
            .to_socket_addrs()
            .map_err(|e| ShellError::Network(format!("{host}: {e}")))?;
        let mut ips: Vec<IpAddr> = addrs.map(|a| a.ip()).collect();
        ips.dedup();
        Ok(ips)
    }

    /// Perform a blocking HTTP GET request.
    ///
    /// Default implementation returns an error (platform does not support HTTP).
    fn http_get(&self, _url: &str) -> Result<HttpResponse> {
        Err(ShellError::Network(
            "HTTP not supported on this platform".into(),
        ))
    }
}

// ---------------------------------------------------------------------------
// Unified platform trait
// ---------------------------------------------------------------------------

/// Everything a session can ask of the host.
pub trait Platform: SystemService + ProcessService + NetworkService {}

impl<T: SystemService + ProcessService + NetworkService> Platform for T {}
