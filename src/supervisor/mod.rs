pub mod context;
pub mod error;
pub mod quiet;
pub mod reload;
pub mod resolver;

pub use error::SupervisorError;

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

use tracing::{error, info};

use crate::config::loader::ConfigLoaderFile;
use crate::process::{merge_all, OpResult, Program, StartError, StopError, Task, TaskState};
use context::SupervisorContext;
use quiet::Quiet;
use reload::ReloadPlan;

/// Cadence of the monitor's advance pass and of every blocking command's
/// poll loop.
pub const TICK: Duration = Duration::from_millis(500);

const RESERVED_ALL: &str = "all";

/// A fan-out command's target operation: applied whole to a `Program`
/// when the target is `"all"` or a bare group name, or to a single
/// `Task` when the target addresses one replica (`"group:idx"`). Both
/// branches return the same `{success, errors}` record §4.1/§4.2
/// mandate, which `act_on_targets` folds with `merge`/`merge_all`.
enum TargetOp {
    Start,
    Stop,
}

impl TargetOp {
    fn apply_program(&self, program: &mut Program) -> OpResult {
        match self {
            TargetOp::Start => program.start(),
            TargetOp::Stop => program.stop(),
        }
    }

    fn apply_task(&self, task: &mut Task) -> OpResult {
        let mut result = OpResult::default();
        match self {
            TargetOp::Start => match task.start(true) {
                Ok(()) => result.success.push(task.name.clone()),
                Err(StartError::AlreadyStarted) => result
                    .errors
                    .push((task.name.clone(), "already started".to_string())),
                Err(StartError::SpawnFailed) => result
                    .errors
                    .push((task.name.clone(), "spawn error".to_string())),
            },
            TargetOp::Stop => match task.stop() {
                Ok(()) => result.success.push(task.name.clone()),
                Err(StopError::NotRunning) => result
                    .errors
                    .push((task.name.clone(), "not running".to_string())),
            },
        }
        result
    }
}

/// Resolves `targets` (`"all"`, a bare group name, or `"group:idx"`) and
/// applies `op`, aggregating every resolved `Program`/`Task`'s outcome
/// into one `OpResult`. Unresolvable targets are reported immediately.
fn act_on_targets(state: &mut SupervisorState, targets: &[String], op: &TargetOp) -> OpResult {
    if targets.iter().any(|t| t == RESERVED_ALL) {
        let results: Vec<OpResult> = state
            .programs
            .values_mut()
            .map(|program| op.apply_program(program))
            .collect();
        return merge_all(results);
    }

    let mut result = OpResult::default();
    for target in targets {
        match target.split_once(':') {
            Some((group, idx)) => match idx.parse::<usize>() {
                Ok(idx) => {
                    match state
                        .programs
                        .get_mut(group)
                        .and_then(|program| program.get_subtask_mut(idx))
                    {
                        Some(task) => result.merge(op.apply_task(task)),
                        None => println!("{target} : ERROR (no such process)"),
                    }
                }
                Err(_) => println!("{target} : ERROR (no such process)"),
            },
            None => match state.programs.get_mut(target) {
                Some(program) => result.merge(op.apply_program(program)),
                None => println!("{target} : ERROR (no such process)"),
            },
        }
    }
    result
}

struct SupervisorState {
    programs: HashMap<String, Program>,
    staging: Option<ReloadPlan>,
}

/// Owns the program table, the reload staging area, and the one mutex
/// guarding both (invariant I4). The mutex is held for the full duration
/// of a tick's advance pass and for the body of every operator operation
/// except its `sleep(TICK)` waits (spec §5).
pub struct Supervisor {
    state: Mutex<SupervisorState>,
    config_path: PathBuf,
    pub quiet: Quiet,
}

impl Supervisor {
    /// Boot-time only: parses and validates the config, exiting the
    /// process with status 1 on any error.
    pub fn load_config(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        let loader = ConfigLoaderFile::new(&path);
        match loader.load() {
            Ok(specs) => {
                let programs = specs
                    .into_iter()
                    .map(|(name, spec)| (name, Program::new(spec)))
                    .collect();
                Supervisor {
                    state: Mutex::new(SupervisorState {
                        programs,
                        staging: None,
                    }),
                    config_path: path,
                    quiet: Quiet::new(),
                }
            }
            Err(e) => {
                error!(error = %e, "failed to load configuration");
                std::process::exit(1);
            }
        }
    }

    fn say(&self, line: String) {
        if !self.quiet.is_enabled() {
            println!("{line}");
        }
    }

    /// Resolves `"all"` or a list of explicit target names into the task
    /// names to act on, emitting `"{target} : ERROR (no such process)"`
    /// for anything unresolvable.
    fn resolve_names(state: &mut SupervisorState, targets: &[String]) -> Vec<String> {
        if targets.iter().any(|t| t == RESERVED_ALL) {
            return resolver::resolve_all(&mut state.programs)
                .into_iter()
                .map(|t| t.name.clone())
                .collect();
        }

        let mut names = Vec::new();
        for target in targets {
            match resolver::resolve(&mut state.programs, target) {
                Ok(tasks) => names.extend(tasks.into_iter().map(|t| t.name.clone())),
                Err(resolver::NoSuchProcess(name)) => {
                    println!("{name} : ERROR (no such process)");
                }
            }
        }
        names
    }

    /// `start(targets|all)`: resolves targets, calls `start()` on each,
    /// then blocks until every successfully-spawned task has reached
    /// `{RUNNING, BACKOFF}` (reported `": started"`) or a STOPPED-like
    /// state (reported `": ERROR (spawn error)"`).
    pub fn start(&self, targets: &[String]) {
        let mut waiting = {
            let mut state = self.state.lock().unwrap();
            let result = act_on_targets(&mut state, targets, &TargetOp::Start);
            for (name, message) in result.errors {
                self.say(format!("{name} : ERROR ({message})"));
            }
            result.success
        };

        while !waiting.is_empty() {
            std::thread::sleep(TICK);
            let mut state = self.state.lock().unwrap();
            waiting.retain(|name| {
                let Some(task) = find_task_mut(&mut state.programs, name) else {
                    return false;
                };
                let state = task.state();
                if state == TaskState::Running || state == TaskState::Backoff {
                    self.say(format!("{name} : started"));
                    false
                } else if state.is_stopped_like() {
                    self.say(format!("{name} : ERROR (spawn error)"));
                    false
                } else {
                    true
                }
            });
        }
    }

    /// `stop(targets|all)`: symmetric to `start`, waits for STOPPED-like.
    pub fn stop(&self, targets: &[String]) {
        let mut waiting = {
            let mut state = self.state.lock().unwrap();
            let result = act_on_targets(&mut state, targets, &TargetOp::Stop);
            for (name, message) in result.errors {
                self.say(format!("{name} : ERROR ({message})"));
            }
            result.success
        };

        while !waiting.is_empty() {
            std::thread::sleep(TICK);
            let mut state = self.state.lock().unwrap();
            waiting.retain(|name| {
                let Some(task) = find_task_mut(&mut state.programs, name) else {
                    return false;
                };
                if task.state().is_stopped_like() {
                    self.say(format!("{name} : stopped"));
                    false
                } else {
                    true
                }
            });
        }
    }

    /// Read-only observation of one task's current state, used by tests
    /// and by callers that need more than a printed status line.
    pub fn task_state(&self, name: &str) -> Option<TaskState> {
        let mut state = self.state.lock().unwrap();
        find_task_mut(&mut state.programs, name).map(|t| t.state())
    }

    /// Every replica name currently published for `program`, in
    /// replica-index order.
    pub fn replica_names(&self, program: &str) -> Vec<String> {
        let state = self.state.lock().unwrap();
        state
            .programs
            .get(program)
            .map(|p| p.tasks().iter().map(|t| t.name.clone()).collect())
            .unwrap_or_default()
    }

    /// `restart` = `stop` then `start` on the same targets.
    pub fn restart(&self, targets: &[String]) {
        self.stop(targets);
        self.start(targets);
    }

    /// One line per resolved Task, printed under the lock.
    pub fn status(&self, targets: &[String]) {
        let mut state = self.state.lock().unwrap();
        let names = Self::resolve_names(&mut state, targets);
        for name in names {
            if let Some(task) = find_task_mut(&mut state.programs, &name) {
                self.say(task.status_line());
            }
        }
    }

    /// `shutdown()`: forces `stopsignal=TERM`/`stoptime=2` on every
    /// program and waits for all to reach STOPPED-like. A SIGINT at this
    /// point abandons the waiting list (error handling §7.5) — callers
    /// drive that via `Ctrl-C`; this method itself always runs to
    /// completion or the caller drops it.
    pub fn shutdown(&self) {
        let mut waiting = {
            let mut state = self.state.lock().unwrap();
            let results: Vec<OpResult> = state
                .programs
                .values_mut()
                .map(|program| program.shutdown())
                .collect();
            merge_all(results).success
        };

        while !waiting.is_empty() {
            std::thread::sleep(TICK);
            let mut state = self.state.lock().unwrap();
            waiting.retain(|name| !find_task_mut(&mut state.programs, name)
                .map(|t| t.state().is_stopped_like())
                .unwrap_or(true));
        }
    }

    /// The monitor entry point. Autostarts every `autostart=true` program,
    /// then ticks `supervise()` on the whole table every `TICK` until
    /// `stop_event` is set.
    pub fn supervise(&self, stop_event: &SupervisorContext) {
        {
            let mut state = self.state.lock().unwrap();
            let autostart_names: Vec<String> = state
                .programs
                .iter()
                .filter_map(|(name, p)| p.autostart().then(|| name.clone()))
                .collect();
            for name in &autostart_names {
                if let Some(program) = state.programs.get_mut(name) {
                    let _ = program.start();
                }
            }
        }

        let (lock, cvar) = stop_event.get_lock_cvar();
        loop {
            {
                let mut state = self.state.lock().unwrap();
                for program in state.programs.values_mut() {
                    program.supervise();
                }
            }

            let guard = lock.lock().unwrap();
            let (done, _timeout) = cvar.wait_timeout(guard, TICK).unwrap();
            if *done {
                break;
            }
        }
        info!("monitor loop exiting");
    }

    /// Re-parses the config path and stages a diff against the running
    /// fleet, printing the §4.4 summary lines (never quiet-gated).
    pub fn reread(&self) -> Result<(), SupervisorError> {
        let loader = ConfigLoaderFile::new(&self.config_path);
        let new_raw = loader.load()?;

        let mut state = self.state.lock().unwrap();
        let plan = reload::compute_plan(&mut state.programs, new_raw);
        for line in &plan.messages {
            println!("{line}");
        }
        state.staging = Some(plan);
        Ok(())
    }

    /// Applies the staged diff atomically, per the seven-step protocol in
    /// §4.4. A no-op when the staging area is empty or absent.
    pub fn update(&self) {
        let plan = {
            let mut state = self.state.lock().unwrap();
            state.staging.take()
        };
        let Some(plan) = plan else { return };
        if plan.is_empty() {
            return;
        }

        self.quiet.enable();

        {
            let mut state = self.state.lock().unwrap();
            for name in &plan.removed {
                if let Some(program) = state.programs.get_mut(name) {
                    for task in program.tasks_mut() {
                        let _ = task.stop();
                    }
                }
            }
        }

        self.stop(&plan.to_stop);

        let autostart_names: Vec<String> = plan
            .to_start
            .iter()
            .filter(|name| {
                plan.new_specs
                    .get(*name)
                    .map(|spec| spec.autostart)
                    .unwrap_or(false)
            })
            .cloned()
            .collect();

        {
            let mut state = self.state.lock().unwrap();
            let old = std::mem::take(&mut state.programs);
            state.programs = reload::apply_new_table(old, &plan);
        }

        self.start(&autostart_names);

        self.quiet.disable();
    }
}

fn find_task_mut<'a>(
    programs: &'a mut HashMap<String, Program>,
    name: &str,
) -> Option<&'a mut crate::process::Task> {
    if let Some((group, idx)) = name.split_once(':') {
        let idx: usize = idx.parse().ok()?;
        programs.get_mut(group)?.get_subtask_mut(idx)
    } else {
        match programs.get_mut(name)? {
            Program::Single(task) => Some(task),
            Program::Group(_) => None,
        }
    }
}
