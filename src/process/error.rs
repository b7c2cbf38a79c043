use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProcessError {
    #[error("io error spawning process: {0}")]
    Io(#[source] std::io::Error),

    #[cfg(target_family = "unix")]
    #[error("signal delivery failed: {0}")]
    Signal(#[source] nix::Error),
}

impl From<std::io::Error> for ProcessError {
    fn from(value: std::io::Error) -> Self {
        ProcessError::Io(value)
    }
}

#[cfg(target_family = "unix")]
impl From<nix::errno::Errno> for ProcessError {
    fn from(value: nix::errno::Errno) -> Self {
        ProcessError::Signal(value)
    }
}
