use std::time::Instant;

use chrono::{DateTime, Local};
use tracing::{error, info, warn};

use crate::config::{AutoRestart, ProgramSpec, StopSignal};

use super::backoff::Backoff;
use super::handle::{spawn, SpawnedProcess};
use super::state::TaskState;

#[derive(Debug)]
pub enum StartError {
    AlreadyStarted,
    SpawnFailed,
}

#[derive(Debug)]
pub enum StopError {
    NotRunning,
}

/// One child-process state machine. Owns its PID handle, stdio sinks
/// (implicitly, via the underlying `SpawnedProcess`), timers and retry
/// counter. `name` is the fully qualified replica name (`"web"` or
/// `"web:0"`) used in every operator-facing message.
pub struct Task {
    pub name: String,
    pub spec: ProgramSpec,
    state: TaskState,
    process: Option<SpawnedProcess>,
    start_timestamp: Option<Instant>,
    stop_timestamp: Option<Instant>,
    stop_wall_clock: Option<DateTime<Local>>,
    backoff: Backoff,
    stop_deadline_secs: u64,
    stop_signal_override: Option<StopSignal>,
}

impl Task {
    pub fn new(name: impl Into<String>, spec: ProgramSpec) -> Self {
        let startretries = spec.startretries;
        Self {
            name: name.into(),
            spec,
            state: TaskState::NeverStarted,
            process: None,
            start_timestamp: None,
            stop_timestamp: None,
            stop_wall_clock: None,
            backoff: Backoff::new(startretries),
            stop_deadline_secs: 0,
            stop_signal_override: None,
        }
    }

    pub fn state(&self) -> TaskState {
        self.state
    }

    pub fn pid(&self) -> Option<u32> {
        self.process.as_ref().map(|p| p.pid())
    }

    fn close_sinks(&mut self) {
        self.process = None;
    }

    /// `reset_retries` is true for every externally requested start
    /// (invariant I3), false for the internal BACKOFF -> STARTING retry.
    pub fn start(&mut self, reset_retries: bool) -> Result<(), StartError> {
        if matches!(self.state, TaskState::Starting | TaskState::Running) {
            warn!(task = %self.name, "already started");
            return Err(StartError::AlreadyStarted);
        }

        match spawn(&self.spec) {
            Ok(process) => {
                self.process = Some(process);
                self.start_timestamp = Some(Instant::now());
                self.state = TaskState::Starting;
                if reset_retries {
                    self.backoff.reset();
                }
                info!(task = %self.name, "starting");
                Ok(())
            }
            Err(e) => {
                error!(task = %self.name, error = %e, "spawn failed");
                self.close_sinks();
                self.state = TaskState::Fatal;
                Err(StartError::SpawnFailed)
            }
        }
    }

    pub fn stop(&mut self) -> Result<(), StopError> {
        self.stop_with(self.spec.stopsignal, self.spec.stoptime)
    }

    /// Forces `stopsignal=TERM` and `stoptime=2`, as the global shutdown
    /// path does.
    pub fn shutdown(&mut self) -> Result<(), StopError> {
        self.stop_with(StopSignal::Term, 2)
    }

    fn stop_with(&mut self, signal: StopSignal, stoptime: u64) -> Result<(), StopError> {
        if self.state.is_stopped_like() {
            warn!(task = %self.name, "not running");
            return Err(StopError::NotRunning);
        }

        self.stop_deadline_secs = stoptime;
        self.stop_signal_override = Some(signal);

        let reaped = match &mut self.process {
            Some(process) => matches!(process.try_wait(), Ok(Some(_))),
            None => true,
        };

        if reaped {
            self.transition_to_stopped();
            return Ok(());
        }

        if self.state.is_signallable() {
            if let Some(process) = &self.process {
                let _ = process.signal(signal.as_nix_signal());
            }
        }
        self.stop_timestamp = Some(Instant::now());
        self.state = TaskState::Stopping;
        info!(task = %self.name, "stopping");
        Ok(())
    }

    fn transition_to_stopped(&mut self) {
        self.close_sinks();
        self.state = TaskState::Stopped;
        self.stop_wall_clock = Some(Local::now());
        info!(task = %self.name, "stopped");
    }

    /// Advances one tick, per the table in the per-process state machine.
    pub fn supervise(&mut self) {
        match self.state {
            TaskState::Starting => self.supervise_starting(),
            TaskState::Backoff => self.supervise_backoff(),
            TaskState::Running => self.supervise_running(),
            TaskState::Stopping => self.supervise_stopping(),
            _ => {}
        }
    }

    fn supervise_starting(&mut self) {
        let exit = self
            .process
            .as_mut()
            .and_then(|p| p.try_wait().ok().flatten());

        if let Some(status) = exit {
            let code = status.code().unwrap_or(-1);
            if self.spec.exitcodes.contains(&code) {
                // Acceptable exit during STARTING is not a failure; fall
                // through to the elapsed-time check below.
            } else {
                self.close_sinks();
                if self.backoff.exhausted() {
                    self.state = TaskState::Fatal;
                    error!(task = %self.name, code, "fatal: exhausted retries during startup");
                } else {
                    self.backoff.enter();
                    self.state = TaskState::Backoff;
                    warn!(task = %self.name, code, "backoff");
                }
                return;
            }
        }

        let elapsed = self
            .start_timestamp
            .map(|t| t.elapsed().as_secs())
            .unwrap_or(0);
        if elapsed >= self.spec.starttime {
            self.state = TaskState::Running;
            self.backoff.reset();
            info!(task = %self.name, "running");
        }
    }

    fn supervise_backoff(&mut self) {
        if self.backoff.elapsed() {
            let _ = self.start(false);
        }
    }

    fn supervise_running(&mut self) {
        let exit = self
            .process
            .as_mut()
            .and_then(|p| p.try_wait().ok().flatten());

        let Some(status) = exit else { return };
        let code = status.code().unwrap_or(-1);
        self.close_sinks();
        self.stop_wall_clock = Some(Local::now());

        if self.spec.exitcodes.contains(&code) {
            self.state = TaskState::Exited;
            info!(task = %self.name, code, "exited");
            if self.spec.autorestart == AutoRestart::Always {
                self.backoff.reset();
                self.state = TaskState::Backoff;
            }
        } else {
            match self.spec.autorestart {
                AutoRestart::Always | AutoRestart::Unexpected => {
                    self.backoff.reset();
                    self.state = TaskState::Backoff;
                    warn!(task = %self.name, code, "unexpected exit, backing off");
                }
                AutoRestart::Never => {
                    self.state = TaskState::Fatal;
                    error!(task = %self.name, code, "fatal: unexpected exit");
                }
            }
        }
    }

    fn supervise_stopping(&mut self) {
        let exit = self
            .process
            .as_mut()
            .and_then(|p| p.try_wait().ok().flatten());

        if exit.is_some() {
            self.transition_to_stopped();
            return;
        }

        let elapsed = self
            .stop_timestamp
            .map(|t| t.elapsed().as_secs())
            .unwrap_or(0);
        if elapsed >= self.stop_deadline_secs {
            if let Some(process) = &self.process {
                let _ = process.kill();
            }
            self.transition_to_stopped();
        }
    }

    /// One `status` line, matching the fixed-width layout.
    pub fn status_line(&self) -> String {
        let header = format!("{:<32}{:<10}", self.name, self.state.to_string());
        match self.state {
            TaskState::Running => {
                let uptime = self
                    .start_timestamp
                    .map(|t| t.elapsed().as_secs())
                    .unwrap_or(0);
                format!(
                    "{header}pid {}, uptime {}",
                    self.pid().unwrap_or(0),
                    format_hms(uptime)
                )
            }
            TaskState::Stopped | TaskState::Exited => match self.stop_wall_clock {
                Some(ts) => format!("{header}{}", ts.format("%b %d %I:%M %p")),
                None => format!("{header}Not started"),
            },
            _ => header,
        }
    }
}

fn format_hms(total_secs: u64) -> String {
    let h = total_secs / 3600;
    let m = (total_secs % 3600) / 60;
    let s = total_secs % 60;
    format!("{h}:{m:02}:{s:02}")
}
