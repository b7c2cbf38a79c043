use std::collections::HashMap;

use crate::config::ProgramSpec;
use crate::process::Program;

/// The three-set staging area populated by `reread` and consumed by
/// `update` (design note: "use the three-set design exactly").
#[derive(Debug, Default)]
pub struct ReloadPlan {
    /// Every name the fleet should have after `update` is applied, mapped
    /// to its (possibly carried-over-unchanged) declaration.
    pub new_specs: HashMap<String, ProgramSpec>,
    /// Names needing a freshly constructed `Program` (new or changed).
    pub to_start: Vec<String>,
    /// Names of a *changed* running program that must be stopped before
    /// its replacement starts.
    pub to_stop: Vec<String>,
    /// Names present in the old table but absent from the new one.
    pub removed: Vec<String>,
    /// Operator-facing summary lines (`"{name}: changed"` etc.), printed
    /// unconditionally — reread's output is never gated by quiet mode.
    pub messages: Vec<String>,
}

impl ReloadPlan {
    pub fn is_empty(&self) -> bool {
        self.to_start.is_empty() && self.to_stop.is_empty() && self.removed.is_empty()
    }
}

/// Classifies every name in the freshly parsed config against the
/// currently running table, per §4.4. A changed declaration is written
/// back into the existing `Program`'s stored `ProgramSpec` immediately
/// (Python: `self.processus_list[name].raw_config = config`), so that a
/// follow-up `reread` with no intervening `update` sees the running
/// table as already current and reports "No config updates to
/// processes" instead of re-detecting the same diff (P5).
pub fn compute_plan(
    current: &mut HashMap<String, Program>,
    new_raw: HashMap<String, ProgramSpec>,
) -> ReloadPlan {
    let mut plan = ReloadPlan::default();

    for (name, new_spec) in new_raw {
        match current.get_mut(&name) {
            Some(program) if program.tasks()[0].spec == new_spec => {
                plan.new_specs.insert(name, new_spec);
            }
            Some(program) => {
                plan.to_stop.push(name.clone());
                plan.to_start.push(name.clone());
                plan.messages.push(format!("{name}: changed"));
                for task in program.tasks_mut() {
                    task.spec = new_spec.clone();
                }
                plan.new_specs.insert(name, new_spec);
            }
            None => {
                plan.to_start.push(name.clone());
                plan.messages.push(format!("{name}: available"));
                plan.new_specs.insert(name, new_spec);
            }
        }
    }

    for name in current.keys() {
        if !plan.new_specs.contains_key(name) {
            plan.removed.push(name.clone());
        }
    }

    if plan.messages.is_empty() {
        plan.messages.push("No config updates to processes".to_string());
    }

    plan
}

/// Swaps in the new program table: carried-over names keep their running
/// `Program` (with its live state), `to_start` names get a fresh one. Any
/// name left behind in `old` (changed-old, removed) is dropped here —
/// callers must have already driven it to a STOPPED-like state.
pub fn apply_new_table(
    mut old: HashMap<String, Program>,
    plan: &ReloadPlan,
) -> HashMap<String, Program> {
    let mut new_table = HashMap::with_capacity(plan.new_specs.len());
    for (name, spec) in &plan.new_specs {
        let program = if plan.to_start.contains(name) {
            Program::new(spec.clone())
        } else {
            old.remove(name).unwrap_or_else(|| Program::new(spec.clone()))
        };
        new_table.insert(name.clone(), program);
    }
    new_table
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AutoRestart, Sink, StopSignal};

    fn spec(name: &str, cmd: &str) -> ProgramSpec {
        ProgramSpec {
            name: name.to_string(),
            argv: cmd.split_whitespace().map(str::to_string).collect(),
            numprocs: 1,
            umask: "022".into(),
            workingdir: std::env::temp_dir().to_string_lossy().into_owned(),
            autostart: true,
            autorestart: AutoRestart::Never,
            exitcodes: vec![0],
            startretries: 3,
            starttime: 1,
            stopsignal: StopSignal::Term,
            stoptime: 2,
            stdout: Sink::Discard,
            stderr: Sink::Discard,
            env: Default::default(),
        }
    }

    #[test]
    fn unchanged_spec_is_carried_over_silently() {
        let mut current = HashMap::new();
        current.insert("a".to_string(), Program::new(spec("a", "/bin/sleep 60")));

        let mut new_raw = HashMap::new();
        new_raw.insert("a".to_string(), spec("a", "/bin/sleep 60"));

        let plan = compute_plan(&mut current, new_raw);
        assert!(plan.to_start.is_empty());
        assert!(plan.to_stop.is_empty());
        assert_eq!(plan.messages, vec!["No config updates to processes"]);
    }

    #[test]
    fn changed_spec_is_written_back_making_a_second_reread_a_noop() {
        let mut current = HashMap::new();
        current.insert("a".to_string(), Program::new(spec("a", "/bin/sleep 60")));

        let mut new_raw = HashMap::new();
        new_raw.insert("a".to_string(), spec("a", "/bin/sleep 120"));
        let plan = compute_plan(&mut current, new_raw);
        assert_eq!(plan.messages, vec!["a: changed"]);

        let mut new_raw_again = HashMap::new();
        new_raw_again.insert("a".to_string(), spec("a", "/bin/sleep 120"));
        let plan = compute_plan(&mut current, new_raw_again);
        assert_eq!(plan.messages, vec!["No config updates to processes"]);
    }

    #[test]
    fn changed_spec_is_staged_for_swap() {
        let mut current = HashMap::new();
        current.insert("a".to_string(), Program::new(spec("a", "/bin/sleep 60")));

        let mut new_raw = HashMap::new();
        new_raw.insert("a".to_string(), spec("a", "/bin/sleep 120"));

        let plan = compute_plan(&mut current, new_raw);
        assert_eq!(plan.to_start, vec!["a".to_string()]);
        assert_eq!(plan.to_stop, vec!["a".to_string()]);
        assert_eq!(plan.messages, vec!["a: changed"]);
    }

    #[test]
    fn new_name_is_available() {
        let mut current = HashMap::new();
        let mut new_raw = HashMap::new();
        new_raw.insert("b".to_string(), spec("b", "/bin/sleep 10"));

        let plan = compute_plan(&mut current, new_raw);
        assert_eq!(plan.to_start, vec!["b".to_string()]);
        assert_eq!(plan.messages, vec!["b: available"]);
    }

    #[test]
    fn removed_name_is_flagged() {
        let mut current = HashMap::new();
        current.insert("a".to_string(), Program::new(spec("a", "/bin/sleep 60")));

        let plan = compute_plan(&mut current, HashMap::new());
        assert_eq!(plan.removed, vec!["a".to_string()]);
    }
}
