use thiserror::Error;

#[derive(Error, Debug)]
pub enum SupervisorError {
    #[error("error loading config: {0}")]
    Config(#[from] crate::config::ConfigError),
}
