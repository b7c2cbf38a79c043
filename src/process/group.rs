use crate::config::ProgramSpec;

use super::task::{StartError, StopError, Task};

/// The aggregated outcome of a fan-out operation across one or more Tasks:
/// names that succeeded, and names paired with an operator-facing message
/// that did not.
#[derive(Debug, Default)]
pub struct OpResult {
    pub success: Vec<String>,
    pub errors: Vec<(String, String)>,
}

impl OpResult {
    pub fn merge(&mut self, other: OpResult) {
        self.success.extend(other.success);
        self.errors.extend(other.errors);
    }
}

/// A declared program: either one Task, or a replica group of N≥1 Tasks
/// sharing one declaration. Modeled as a sum type rather than a trait
/// object so fan-out stays a plain loop over `tasks()`.
pub enum Program {
    Single(Task),
    Group(Vec<Task>),
}

impl Program {
    pub fn new(spec: ProgramSpec) -> Self {
        if spec.numprocs <= 1 {
            let name = spec.name.clone();
            Program::Single(Task::new(name, spec))
        } else {
            let numprocs = spec.numprocs;
            let tasks = (0..numprocs)
                .map(|i| Task::new(format!("{}:{}", spec.name, i), spec.clone()))
                .collect();
            Program::Group(tasks)
        }
    }

    pub fn tasks(&self) -> Vec<&Task> {
        match self {
            Program::Single(t) => vec![t],
            Program::Group(ts) => ts.iter().collect(),
        }
    }

    pub fn tasks_mut(&mut self) -> Vec<&mut Task> {
        match self {
            Program::Single(t) => vec![t],
            Program::Group(ts) => ts.iter_mut().collect(),
        }
    }

    /// `autostart` is declared once per program and shared by every
    /// replica; replica 0 is representative.
    pub fn autostart(&self) -> bool {
        self.tasks()[0].spec.autostart
    }

    /// Looks up one replica by index, used by the name resolver for
    /// `name:idx` addressing.
    pub fn get_subtask(&self, idx: usize) -> Option<&Task> {
        match self {
            Program::Single(t) => (idx == 0).then_some(t),
            Program::Group(ts) => ts.get(idx),
        }
    }

    pub fn get_subtask_mut(&mut self, idx: usize) -> Option<&mut Task> {
        match self {
            Program::Single(t) => (idx == 0).then_some(t),
            Program::Group(ts) => ts.get_mut(idx),
        }
    }

    pub fn start(&mut self) -> OpResult {
        let mut result = OpResult::default();
        for task in self.tasks_mut() {
            match task.start(true) {
                Ok(()) => result.success.push(task.name.clone()),
                Err(StartError::AlreadyStarted) => result
                    .errors
                    .push((task.name.clone(), "already started".to_string())),
                Err(StartError::SpawnFailed) => result
                    .errors
                    .push((task.name.clone(), "spawn error".to_string())),
            }
        }
        result
    }

    pub fn stop(&mut self) -> OpResult {
        let mut result = OpResult::default();
        for task in self.tasks_mut() {
            match task.stop() {
                Ok(()) => result.success.push(task.name.clone()),
                Err(StopError::NotRunning) => result
                    .errors
                    .push((task.name.clone(), "not running".to_string())),
            }
        }
        result
    }

    pub fn shutdown(&mut self) -> OpResult {
        let mut result = OpResult::default();
        for task in self.tasks_mut() {
            match task.shutdown() {
                Ok(()) => result.success.push(task.name.clone()),
                Err(StopError::NotRunning) => result
                    .errors
                    .push((task.name.clone(), "not running".to_string())),
            }
        }
        result
    }

    pub fn supervise(&mut self) {
        for task in self.tasks_mut() {
            task.supervise();
        }
    }

    /// `status` for every replica, in replica-index order (P8).
    pub fn status_lines(&self) -> Vec<String> {
        self.tasks().iter().map(|t| t.status_line()).collect()
    }
}

/// Folds a fan-out's per-program outcomes into one aggregate record, used
/// by `Supervisor` when a command ("all", or a bare group name) spans more
/// than one `Program`.
pub fn merge_all(results: impl IntoIterator<Item = OpResult>) -> OpResult {
    let mut acc = OpResult::default();
    for r in results {
        acc.merge(r);
    }
    acc
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AutoRestart, Sink, StopSignal};
    use std::collections::HashMap;

    fn spec(numprocs: u32) -> ProgramSpec {
        ProgramSpec {
            name: "w".into(),
            argv: vec!["/bin/sleep".into(), "5".into()],
            numprocs,
            umask: "022".into(),
            workingdir: std::env::temp_dir().to_string_lossy().into_owned(),
            autostart: false,
            autorestart: AutoRestart::Never,
            exitcodes: vec![0],
            startretries: 3,
            starttime: 1,
            stopsignal: StopSignal::Term,
            stoptime: 2,
            stdout: Sink::Discard,
            stderr: Sink::Discard,
            env: HashMap::new(),
        }
    }

    #[test]
    fn single_program_has_one_task_named_bare() {
        let program = Program::new(spec(1));
        assert_eq!(program.tasks().len(), 1);
        assert_eq!(program.tasks()[0].name, "w");
    }

    #[test]
    fn group_publishes_colon_indexed_replica_names() {
        let program = Program::new(spec(3));
        let names: Vec<_> = program.tasks().iter().map(|t| t.name.clone()).collect();
        assert_eq!(names, vec!["w:0", "w:1", "w:2"]);
    }

    #[test]
    fn get_subtask_resolves_by_index() {
        let program = Program::new(spec(3));
        assert_eq!(program.get_subtask(1).unwrap().name, "w:1");
        assert!(program.get_subtask(5).is_none());
    }
}
