use std::os::unix::process::CommandExt;
use std::process::{Child, Command, ExitStatus, Stdio};

use nix::sys::signal::{self, Signal};
use nix::unistd::Pid;

use crate::config::{ProgramSpec, Sink};

use super::error::ProcessError;

/// A spawned child, plus the stdio sinks it owns (closed on any transition
/// into a STOPPED-like state, per invariant I2).
pub struct SpawnedProcess {
    child: Child,
}

impl SpawnedProcess {
    pub fn pid(&self) -> u32 {
        self.child.id()
    }

    /// Non-blocking poll: `Some(status)` once the child has been reaped.
    pub fn try_wait(&mut self) -> Result<Option<ExitStatus>, ProcessError> {
        Ok(self.child.try_wait()?)
    }

    pub fn signal(&self, sig: Signal) -> Result<(), ProcessError> {
        signal::kill(Pid::from_raw(self.pid() as i32), sig)?;
        Ok(())
    }

    pub fn kill(&self) -> Result<(), ProcessError> {
        self.signal(Signal::SIGKILL)
    }
}

fn open_sink(sink: &Sink) -> std::io::Result<Stdio> {
    match sink {
        Sink::Discard => Ok(Stdio::null()),
        Sink::Path(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)?;
            Ok(Stdio::from(file))
        }
    }
}

/// Spawns the child described by `spec`: stdio redirected per `stdout`/
/// `stderr`, working directory and merged environment applied, and a
/// pre-exec hook that puts the child in a new session (so supervisor-
/// directed signals are not forwarded by the kernel) and applies the
/// declared umask to the child only, leaving the supervisor's own umask
/// untouched.
pub fn spawn(spec: &ProgramSpec) -> Result<SpawnedProcess, ProcessError> {
    let (program, args) = spec
        .argv
        .split_first()
        .expect("validated ProgramSpec always has a non-empty argv");

    let mut command = Command::new(program);
    command
        .args(args)
        .current_dir(&spec.workingdir)
        .stdin(Stdio::null())
        .stdout(open_sink(&spec.stdout)?)
        .stderr(open_sink(&spec.stderr)?);

    for (key, value) in std::env::vars() {
        command.env(key, value);
    }
    for (key, value) in &spec.env {
        command.env(key, value);
    }

    let umask_value = u32::from_str_radix(&spec.umask, 8).unwrap_or(0o022);

    // SAFETY: only async-signal-safe calls (setsid, umask) run between fork
    // and exec.
    unsafe {
        command.pre_exec(move || {
            nix::unistd::setsid().map_err(|e| std::io::Error::from_raw_os_error(e as i32))?;
            libc::umask(umask_value as libc::mode_t);
            Ok(())
        });
    }

    let child = command.spawn()?;
    Ok(SpawnedProcess { child })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AutoRestart, StopSignal};
    use std::collections::HashMap;

    fn spec(cmd: &str) -> ProgramSpec {
        ProgramSpec {
            name: "t".into(),
            argv: cmd.split_whitespace().map(str::to_string).collect(),
            numprocs: 1,
            umask: "022".into(),
            workingdir: std::env::temp_dir().to_string_lossy().into_owned(),
            autostart: false,
            autorestart: AutoRestart::Never,
            exitcodes: vec![0],
            startretries: 3,
            starttime: 1,
            stopsignal: StopSignal::Term,
            stoptime: 10,
            stdout: Sink::Discard,
            stderr: Sink::Discard,
            env: HashMap::new(),
        }
    }

    #[test]
    fn spawns_and_reaps() {
        let mut process = spawn(&spec("/bin/true")).unwrap();
        let status = loop {
            if let Some(status) = process.try_wait().unwrap() {
                break status;
            }
            std::thread::sleep(std::time::Duration::from_millis(10));
        };
        assert!(status.success());
    }

    #[test]
    fn spawn_failure_surfaces_io_error() {
        let err = spawn(&spec("/no/such/binary"));
        assert!(err.is_err());
    }
}
