//! The operator-facing control shell: line editing and tab completion
//! over the fixed verb grammar (§4.7), plus the SIGHUP/SIGQUIT wiring
//! that lets an operator reload or shut down the fleet without typing.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use rustyline::completion::{Completer, Pair};
use rustyline::error::ReadlineError;
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::validate::Validator;
use rustyline::{Context as RustylineContext, Editor, Helper};
use signal_hook::consts::{SIGHUP, SIGQUIT};
use signal_hook::iterator::Signals;
use tracing::{error, info};

use crate::supervisor::context::SupervisorContext;
use crate::supervisor::Supervisor;

mod error;
pub use error::ShellError;

const VERBS: &[&str] = &[
    "status", "start", "stop", "restart", "reread", "update", "shutdown", "help",
];

const HELP_TEXT: &str = "\
status (all | <name>...)
start  (all | <name>...)
stop   (all | <name>...)
restart(all | <name>...)
reread
update
shutdown
help";

struct VerbCompleter;

impl Completer for VerbCompleter {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &RustylineContext<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let word = &line[..pos];
        if word.contains(' ') {
            return Ok((pos, Vec::new()));
        }
        let candidates = VERBS
            .iter()
            .filter(|verb| verb.starts_with(word))
            .map(|verb| Pair {
                display: verb.to_string(),
                replacement: verb.to_string(),
            })
            .collect();
        Ok((0, candidates))
    }
}

impl Hinter for VerbCompleter {
    type Hint = String;
}

impl Highlighter for VerbCompleter {}
impl Validator for VerbCompleter {}
impl Helper for VerbCompleter {}

/// Watches for SIGHUP (reread) and SIGQUIT (shutdown) on a dedicated
/// thread. `signal-hook`'s self-pipe delivery already runs this off any
/// restricted signal-handler frame, so it is safe to call straight into
/// the supervisor here rather than only setting a flag the blocked
/// `readline()` call on the shell thread could not otherwise observe in
/// good time.
fn spawn_signal_watcher(supervisor: Arc<Supervisor>, stop_event: SupervisorContext) {
    let mut signals = match Signals::new([SIGHUP, SIGQUIT]) {
        Ok(signals) => signals,
        Err(e) => {
            error!(error = %e, "failed to install signal handlers");
            return;
        }
    };

    std::thread::spawn(move || {
        for signal in signals.forever() {
            match signal {
                SIGHUP => {
                    info!("SIGHUP received, rereading configuration");
                    if let Err(e) = supervisor.reread() {
                        error!(error = %e, "reread failed");
                    }
                }
                SIGQUIT => {
                    info!("SIGQUIT received, shutting down");
                    supervisor.shutdown();
                    let _ = stop_event.cancel_all();
                    return;
                }
                _ => {}
            }
        }
    });
}

/// Runs the shell in the foreground until `shutdown` (explicit, EOF, or
/// SIGQUIT). Blocks the calling thread.
pub fn run(supervisor: Arc<Supervisor>, stop_event: SupervisorContext) -> Result<(), ShellError> {
    spawn_signal_watcher(Arc::clone(&supervisor), stop_event.clone());

    let config = rustyline::Config::builder().auto_add_history(true).build();
    let mut editor: Editor<VerbCompleter, rustyline::history::DefaultHistory> =
        Editor::with_config(config).map_err(ShellError::Init)?;
    editor.set_helper(Some(VerbCompleter));

    loop {
        match editor.readline("taskmaster> ") {
            Ok(line) => {
                if dispatch(line.trim(), &supervisor, &stop_event) {
                    break;
                }
            }
            Err(ReadlineError::Interrupted) => continue,
            Err(ReadlineError::Eof) => {
                supervisor.shutdown();
                let _ = stop_event.cancel_all();
                break;
            }
            Err(e) => {
                error!(error = %e, "shell read error");
                return Err(ShellError::Readline(e));
            }
        }
    }
    Ok(())
}

/// Dispatches one parsed command line. Returns `true` when the shell
/// should stop reading further input.
fn dispatch(line: &str, supervisor: &Supervisor, stop_event: &SupervisorContext) -> bool {
    let mut words = line.split_whitespace();
    let Some(verb) = words.next() else {
        return false;
    };
    let targets: Vec<String> = words.map(str::to_string).collect();

    match verb {
        "status" | "start" | "stop" | "restart" if targets.is_empty() => {
            println!("usage: {verb} (all | <name>...)");
            false
        }
        "status" => {
            supervisor.status(&targets);
            false
        }
        "start" => {
            supervisor.start(&targets);
            false
        }
        "stop" => {
            supervisor.stop(&targets);
            false
        }
        "restart" => {
            supervisor.restart(&targets);
            false
        }
        "reread" => {
            if let Err(e) = supervisor.reread() {
                println!("reread failed: {e}");
            }
            false
        }
        "update" => {
            supervisor.update();
            false
        }
        "shutdown" => {
            supervisor.shutdown();
            let _ = stop_event.cancel_all();
            true
        }
        "help" => {
            println!("{HELP_TEXT}");
            false
        }
        "" => false,
        other => {
            println!("unknown command '{other}', type 'help' for the grammar");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::VERBS;

    #[test]
    fn verb_set_matches_grammar() {
        assert_eq!(
            VERBS,
            &["status", "start", "stop", "restart", "reread", "update", "shutdown", "help"]
        );
    }
}
