use std::collections::HashMap;

use crate::process::{Program, Task};

/// A target named in an operator command could not be resolved to a
/// running program or replica.
#[derive(Debug)]
pub struct NoSuchProcess(pub String);

/// Resolves one operator-supplied target string (§4.6): `group:idx`
/// addresses one replica, a bare name addresses the whole program (every
/// replica it owns).
pub fn resolve<'a>(
    programs: &'a mut HashMap<String, Program>,
    target: &str,
) -> Result<Vec<&'a mut Task>, NoSuchProcess> {
    match target.split_once(':') {
        Some((group, idx)) => {
            let idx: usize = idx
                .parse()
                .map_err(|_| NoSuchProcess(target.to_string()))?;
            programs
                .get_mut(group)
                .and_then(|program| program.get_subtask_mut(idx))
                .map(|task| vec![task])
                .ok_or_else(|| NoSuchProcess(target.to_string()))
        }
        None => programs
            .get_mut(target)
            .map(|program| program.tasks_mut())
            .ok_or_else(|| NoSuchProcess(target.to_string())),
    }
}

/// Every task across every program, in table order, used by `all`.
pub fn resolve_all(programs: &mut HashMap<String, Program>) -> Vec<&mut Task> {
    programs.values_mut().flat_map(|p| p.tasks_mut()).collect()
}
