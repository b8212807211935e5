//! Platform service abstractions for Minshell.
//!
//! Commands never talk to the operating system's process table, disk list or
//! network stack directly. They go through the traits defined here so the
//! terminal can run (and be tested) without a real platform attached.

mod desktop;
mod services;


pub use desktop::DesktopPlatform;
pub use services::{
    DiskInfo, HostInfo, HttpResponse, NetworkService, PingReply, Platform, ProcessInfo,
    ProcessService, SystemService,
};
