//! Session context shared by every command in one interactive session.

use std::path::{Path, PathBuf};
use std::time::Instant;

use minshell_platform::Platform;
use minshell_types::error::{Result, ShellError};

use crate::sandbox::{self, EntryRule};

/// Control value asking the presentation layer to clear its output.
pub const CLEAR_SCREEN: &str = "\u{c}";

/// Hooks the presentation layer provides to a session.
///
/// All of these are fire-and-forget notifications.
pub trait Frontend {
    /// Emit one piece of output. [`CLEAR_SCREEN`] means "clear", not text.
    fn print(&mut self, text: &str);

    /// The filesystem tree changed; resynchronise any file view.
    fn refresh(&mut self) {}

    /// The current directory changed; update the address display.
    fn set_address(&mut self, _path: &Path) {}

    /// The session navigated into a directory at the presentation layer's request.
    fn navigate_to(&mut self, _path: &Path) {}
}

/// Mutable state for one interactive session.
pub struct Session<'a> {
    root: PathBuf,
    cwd: PathBuf,
    temp_path: PathBuf,
    frontend: &'a mut dyn Frontend,
    platform: Option<&'a dyn Platform>,
    started: Instant,
}

impl<'a> Session<'a> {
    /// Open a session rooted at `root`, creating `root` and `temp_path` if
    /// they do not exist yet. The working directory starts at the root.
    pub fn new(root: &Path, temp_path: &Path, frontend: &'a mut dyn Frontend) -> Result<Self> {
        std::fs::create_dir_all(root)?;
        std::fs::create_dir_all(temp_path)?;
        let root = root.canonicalize()?;
        let temp_path = temp_path.canonicalize()?;
        Ok(Self {
            cwd: root.clone(),
            root,
            temp_path,
            frontend,
            platform: None,
            started: Instant::now(),
        })
    }

    /// Attach host services.
    pub fn with_platform(mut self, platform: &'a dyn Platform) -> Self {
        self.platform = Some(platform);
        self
    }

    /// Host services for process, disk and network commands, if attached.
    pub fn platform(&self) -> Option<&'a dyn Platform> {
        self.platform
    }

    /// Canonical sandbox root. Never changes after construction.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Canonical working directory, always at or under [`Session::root`].
    pub fn cwd(&self) -> &Path {
        &self.cwd
    }

    /// Where audit files are written. Not sandboxed against the root.
    pub fn temp_path(&self) -> &Path {
        &self.temp_path
    }

    /// Time since the session opened.
    pub fn elapsed_millis(&self) -> u128 {
        self.started.elapsed().as_millis()
    }

    pub fn print(&mut self, text: &str) {
        self.frontend.print(text);
    }

    pub fn refresh_ui(&mut self) {
        self.frontend.refresh();
    }

    /// Resolve `raw` through the sandbox and make it the working directory.
    ///
    /// On failure the working directory is left untouched.
    pub fn change_dir(&mut self, raw: &str) -> Result<&Path> {
        let target = sandbox::resolve(self, raw, EntryRule::Directory)?;
        if !target.is_dir() {
            return Err(ShellError::Command(format!(
                "directory not found: {}",
                target.display()
            )));
        }
        self.cwd = target;
        self.frontend.set_address(&self.cwd);
        Ok(&self.cwd)
    }

    /// Presentation-layer navigation (e.g. opening a folder in a file view).
    pub fn navigate(&mut self, raw: &str) -> Result<()> {
        self.change_dir(raw)?;
        self.frontend.navigate_to(&self.cwd);
        self.frontend.refresh();
        Ok(())
    }
}
