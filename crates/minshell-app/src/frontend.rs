//! Console presentation layer: writes command output to a terminal stream.

use std::io::Write;
use std::path::Path;

use minshell_terminal::{CLEAR_SCREEN, Frontend};

/// ANSI sequence: erase the display and home the cursor.
const ANSI_CLEAR: &str = "\x1b[2J\x1b[H";

/// Frontend that renders to any byte stream, normally stdout.
pub struct ConsoleFrontend<W: Write> {
    out: W,
}

impl<W: Write> ConsoleFrontend<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn emit(&mut self, text: &str) {
        // A broken stdout leaves nothing useful to report to.
        if let Err(e) = self.out.write_all(text.as_bytes()).and_then(|()| self.out.flush()) {
            log::debug!("console write failed: {e}");
        }
    }
}

impl<W: Write> Frontend for ConsoleFrontend<W> {
    fn print(&mut self, text: &str) {
        if text == CLEAR_SCREEN {
            self.emit(ANSI_CLEAR);
        } else {
            self.emit(&format!("{text}\n"));
        }
    }

    fn refresh(&mut self) {
        log::debug!("file view refresh requested");
    }

    fn set_address(&mut self, path: &Path) {
        self.emit(&format!("\x1b]0;{}\x07", path.display()));
    }

    fn navigate_to(&mut self, path: &Path) {
        log::debug!("navigate to {}", path.display());
    }
}
