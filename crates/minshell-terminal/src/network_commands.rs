//! Network commands: ping, resolve, httpget.
//!
//! Remote hosts and URLs are passed through untouched; only the local output
//! file of `httpget` goes through the sandbox.

use minshell_types::error::{Result, ShellError};

use crate::commands::no_platform;
use crate::interpreter::{Command, CommandOutput, CommandRegistry};
use crate::sandbox::{self, EntryRule};
use crate::session::Session;

/// Register network commands.
pub fn register_network_commands(reg: &mut CommandRegistry) {
    reg.register(Box::new(PingCmd));
    reg.register(Box::new(ResolveCmd));
    reg.register(Box::new(HttpGetCmd));
}

// ---------------------------------------------------------------------------
// ping
// ---------------------------------------------------------------------------

struct PingCmd;
impl Command for PingCmd {
    fn name(&self) -> &str {
        "ping"
    }
    fn description(&self) -> &str {
        "Send one echo request to a host"
    }
    fn usage(&self) -> &str {
        "ping <host>"
    }
    fn category(&self) -> &str {
        "network"
    }
    fn execute(&self, args: &[&str], session: &mut Session<'_>) -> Result<CommandOutput> {
        let Some(host) = args.first() else {
            return Err(ShellError::usage(self.usage()));
        };
        let Some(net) = session.platform() else {
            return Ok(no_platform(self.name()));
        };
        let reply = net.ping(host)?;
        Ok(CommandOutput::Text(format!(
            "Ping {host}: {}, {}ms",
            reply.status(),
            reply.round_trip_ms
        )))
    }
}

// ---------------------------------------------------------------------------
// resolve
// ---------------------------------------------------------------------------

struct ResolveCmd;
impl Command for ResolveCmd {
    fn name(&self) -> &str {
        "resolve"
    }
    fn description(&self) -> &str {
        "Resolve a host name to IP addresses"
    }
    fn usage(&self) -> &str {
        "resolve <host>"
    }
    fn category(&self) -> &str {
        "network"
    }
    fn execute(&self, args: &[&str], session: &mut Session<'_>) -> Result<CommandOutput> {
        let Some(host) = args.first() else {
            return Err(ShellError::usage(self.usage()));
        };
        let Some(net) = session.platform() else {
            return Ok(no_platform(self.name()));
        };
        let ips = net.resolve(host)?;
        if ips.is_empty() {
            return Ok(CommandOutput::None);
        }
        Ok(CommandOutput::lines(ips.iter().map(|ip| ip.to_string())))
    }
}

// ---------------------------------------------------------------------------
// httpget
// ---------------------------------------------------------------------------

struct HttpGetCmd;
impl Command for HttpGetCmd {
    fn name(&self) -> &str {
        "httpget"
    }
    fn description(&self) -> &str {
        "Download a URL into a file"
    }
    fn usage(&self) -> &str {
        "httpget <url> <out>"
    }
    fn category(&self) -> &str {
        "network"
    }
    fn execute(&self, args: &[&str], session: &mut Session<'_>) -> Result<CommandOutput> {
        if args.len() < 2 {
            return Err(ShellError::usage(self.usage()));
        }
        let url = args[0];
        let out = sandbox::resolve(session, args[1], EntryRule::File)?;
        let Some(net) = session.platform() else {
            return Ok(no_platform(self.name()));
        };
        let resp = net.http_get(url)?;
        if !(200..300).contains(&resp.status_code) {
            return Err(ShellError::Network(format!("HTTP {}", resp.status_code)));
        }
        std::fs::write(&out, &resp.body)?;
        log::debug!("httpget: {} bytes -> {}", resp.body.len(), out.display());
        session.refresh_ui();
        Ok(CommandOutput::Text("Downloaded.".to_string()))
    }
}
