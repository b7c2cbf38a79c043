use thiserror::Error;

/// Errors raised in the shell's own read loop, as distinct from the
/// errors the supervisor operations it dispatches may log internally.
#[derive(Error, Debug)]
pub enum ShellError {
    #[error("failed to initialize the line editor: {0}")]
    Init(#[source] rustyline::error::ReadlineError),
    #[error("shell read error: {0}")]
    Readline(#[from] rustyline::error::ReadlineError),
}
