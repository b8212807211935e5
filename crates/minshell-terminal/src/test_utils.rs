//! Shared fixtures for command tests.

use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use minshell_platform::{
    DiskInfo, HostInfo, HttpResponse, NetworkService, PingReply, ProcessInfo, ProcessService,
    SystemService,
};
use minshell_types::error::{Result, ShellError};
use tempfile::TempDir;

use crate::interpreter::CommandRegistry;
use crate::session::{Frontend, Session};

#[derive(Debug, Default)]
struct Recorded {
    lines: Vec<String>,
    refreshes: usize,
    addresses: Vec<PathBuf>,
    navigations: Vec<PathBuf>,
}

/// Frontend that remembers every hook call. Clones share one record, so a
/// clone can be inspected while the original is borrowed by a session.
#[derive(Debug, Default, Clone)]
pub struct RecordingFrontend {
    inner: Rc<RefCell<Recorded>>,
}

impl RecordingFrontend {
    pub fn lines(&self) -> Vec<String> {
        self.inner.borrow().lines.clone()
    }

    /// Drain printed output, leaving the record empty.
    pub fn take_lines(&self) -> Vec<String> {
        std::mem::take(&mut self.inner.borrow_mut().lines)
    }

    pub fn refreshes(&self) -> usize {
        self.inner.borrow().refreshes
    }

    pub fn addresses(&self) -> Vec<PathBuf> {
        self.inner.borrow().addresses.clone()
    }

    pub fn navigations(&self) -> Vec<PathBuf> {
        self.inner.borrow().navigations.clone()
    }
}

impl Frontend for RecordingFrontend {
    fn print(&mut self, text: &str) {
        self.inner.borrow_mut().lines.push(text.to_string());
    }

    fn refresh(&mut self) {
        self.inner.borrow_mut().refreshes += 1;
    }

    fn set_address(&mut self, path: &Path) {
        self.inner.borrow_mut().addresses.push(path.to_path_buf());
    }

    fn navigate_to(&mut self, path: &Path) {
        self.inner.borrow_mut().navigations.push(path.to_path_buf());
    }
}

/// Temporary sandbox: `<tmp>/files` is the root, `<tmp>/temps` holds audit
/// files, and `<tmp>/outside` is a directory beyond the root.
pub struct Fixture {
    dir: TempDir,
    root: PathBuf,
}

impl Fixture {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("files");
        std::fs::create_dir_all(&root).unwrap();
        std::fs::create_dir_all(dir.path().join("temps")).unwrap();
        let root = root.canonicalize().unwrap();
        Self { dir, root }
    }

    /// Canonical sandbox root.
    pub fn root(&self) -> PathBuf {
        self.root.clone()
    }

    pub fn temp(&self) -> PathBuf {
        self.dir.path().join("temps")
    }

    /// A directory outside the root, created on demand.
    pub fn outside_dir(&self) -> PathBuf {
        let outside = self.dir.path().join("outside");
        std::fs::create_dir_all(&outside).unwrap();
        outside.canonicalize().unwrap()
    }

    pub fn frontend(&self) -> RecordingFrontend {
        RecordingFrontend::default()
    }

    pub fn session<'a>(&self, frontend: &'a mut RecordingFrontend) -> Session<'a> {
        Session::new(&self.root, &self.temp(), frontend).unwrap()
    }

    /// Write `contents` to `rel` under the root, creating parents.
    pub fn write(&self, rel: &str, contents: &str) -> PathBuf {
        let path = self.root.join(rel);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(&path, contents).unwrap();
        path
    }

    pub fn read(&self, rel: &str) -> String {
        std::fs::read_to_string(self.root.join(rel)).unwrap()
    }
}

/// Registry with every built-in command and no audit trail.
pub fn registry() -> CommandRegistry {
    let mut reg = CommandRegistry::with_audit(Box::new(crate::audit::NullAuditLog));
    crate::commands::register_builtins(&mut reg);
    reg
}

/// Run one line and return what it printed, joined by newlines.
pub fn run(
    reg: &CommandRegistry,
    session: &mut Session<'_>,
    log: &RecordingFrontend,
    line: &str,
) -> String {
    log.take_lines();
    reg.execute(line, session);
    log.take_lines().join("\n")
}

/// Canned platform that records what commands asked of it.
#[derive(Debug, Default)]
pub struct FakePlatform {
    pub killed: RefCell<Vec<u32>>,
    pub launched: RefCell<Vec<(PathBuf, Vec<String>, PathBuf)>>,
    pub opened: RefCell<Vec<PathBuf>>,
}

impl SystemService for FakePlatform {
    fn host_info(&self) -> Result<HostInfo> {
        Ok(HostInfo {
            hostname: Some("testbox".into()),
            os: "TestOS 1.0".into(),
            arch: std::env::consts::ARCH.into(),
            user: Some("tester".into()),
            uptime_secs: 3600,
        })
    }

    fn disks(&self) -> Result<Vec<DiskInfo>> {
        Ok(vec![DiskInfo {
            name: "disk0".into(),
            mount_point: PathBuf::from("/"),
            kind: "SSD".into(),
            available_bytes: 512 * 1024 * 1024,
            total_bytes: 1024 * 1024 * 1024,
        }])
    }

    // Every path lives on the single fake disk.
    fn disk_for(&self, _path: &Path) -> Result<Option<DiskInfo>> {
        Ok(self.disks()?.into_iter().next())
    }
}

impl ProcessService for FakePlatform {
    fn processes(&self) -> Result<Vec<ProcessInfo>> {
        Ok(vec![
            ProcessInfo {
                pid: 1,
                name: "init".into(),
            },
            ProcessInfo {
                pid: 42,
                name: "minshell".into(),
            },
        ])
    }

    fn kill(&self, pid: u32) -> Result<()> {
        if pid != 42 {
            return Err(ShellError::Platform(format!("no process with pid {pid}")));
        }
        self.killed.borrow_mut().push(pid);
        Ok(())
    }

    fn launch(&self, program: &Path, args: &[&str], cwd: &Path) -> Result<u32> {
        self.launched.borrow_mut().push((
            program.to_path_buf(),
            args.iter().map(|a| a.to_string()).collect(),
            cwd.to_path_buf(),
        ));
        Ok(4242)
    }

    fn open(&self, target: &Path) -> Result<()> {
        self.opened.borrow_mut().push(target.to_path_buf());
        Ok(())
    }
}

impl NetworkService for FakePlatform {
    fn ping(&self, host: &str) -> Result<PingReply> {
        Ok(PingReply {
            reachable: host != "unreachable.test",
            round_trip_ms: 7,
        })
    }

    fn resolve(&self, host: &str) -> Result<Vec<std::net::IpAddr>> {
        match host {
            "example.test" => Ok(vec![
                "192.0.2.1".parse().map_err(|_| ShellError::Network("bad ip".into()))?,
                "2001:db8::1".parse().map_err(|_| ShellError::Network("bad ip".into()))?,
            ]),
            _ => Err(ShellError::Network(format!("{host}: not found"))),
        }
    }

    fn http_get(&self, url: &str) -> Result<HttpResponse> {
        match url {
            "http://example.test/data" => Ok(HttpResponse {
                status_code: 200,
                body: b"payload".to_vec(),
            }),
            "http://example.test/missing" => Ok(HttpResponse {
                status_code: 404,
                body: b"nope".to_vec(),
            }),
            _ => Err(ShellError::Network(format!("{url}: connection refused"))),
        }
    }
}
