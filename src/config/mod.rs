pub mod error;
pub mod loader;
pub mod validate;

pub use error::ConfigError;

use std::collections::HashMap;

/// One field of the YAML document, before validation: everything is
/// optional, and types are whatever serde_yaml happened to parse.
#[derive(Debug, Clone, Default, serde::Deserialize)]
pub struct RawProgramSpec {
    pub cmd: Option<String>,
    pub numprocs: Option<u32>,
    pub umask: Option<String>,
    pub workingdir: Option<String>,
    pub autostart: Option<bool>,
    pub autorestart: Option<String>,
    pub exitcodes: Option<Vec<i32>>,
    pub startretries: Option<u32>,
    pub starttime: Option<u64>,
    pub stopsignal: Option<String>,
    pub stoptime: Option<u64>,
    pub stdout: Option<String>,
    pub stderr: Option<String>,
    pub env: Option<HashMap<String, String>>,
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct RawConfigFile {
    pub programs: Option<HashMap<String, RawProgramSpec>>,
}

/// When a program exits with neither `restart=never` bailing out, nor
/// `restart=always` retrying unconditionally, this decides whether an
/// unexpected exit code should trigger a restart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AutoRestart {
    Never,
    Always,
    Unexpected,
}

/// One of the signal names `stopsignal` may name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopSignal {
    Term,
    Int,
    Hup,
    Kill,
    Usr1,
    Usr2,
    Quit,
}

impl StopSignal {
    pub fn as_nix_signal(self) -> nix::sys::signal::Signal {
        use nix::sys::signal::Signal;
        match self {
            StopSignal::Term => Signal::SIGTERM,
            StopSignal::Int => Signal::SIGINT,
            StopSignal::Hup => Signal::SIGHUP,
            StopSignal::Kill => Signal::SIGKILL,
            StopSignal::Usr1 => Signal::SIGUSR1,
            StopSignal::Usr2 => Signal::SIGUSR2,
            StopSignal::Quit => Signal::SIGQUIT,
        }
    }
}

/// Where a child's stdout/stderr goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Sink {
    Discard,
    Path(String),
}

/// A validated, normalized program declaration: the unit the validator
/// hands to the supervisor. Cheap to clone since every Task under a
/// group's replicas shares one of these.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgramSpec {
    pub name: String,
    pub argv: Vec<String>,
    pub numprocs: u32,
    pub umask: String,
    pub workingdir: String,
    pub autostart: bool,
    pub autorestart: AutoRestart,
    pub exitcodes: Vec<i32>,
    pub startretries: u32,
    pub starttime: u64,
    pub stopsignal: StopSignal,
    pub stoptime: u64,
    pub stdout: Sink,
    pub stderr: Sink,
    pub env: HashMap<String, String>,
}
