use thiserror::Error;

/// Errors produced while loading or validating a program declaration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("error reading config file '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("error parsing YAML in '{path}': {source}")]
    Yaml {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("configuration file must have a top-level 'programs:' mapping")]
    MissingProgramsSection,

    #[error("task '{name}': {message}")]
    Validation { name: String, message: String },
}

impl ConfigError {
    pub fn validation(name: impl Into<String>, message: impl Into<String>) -> Self {
        ConfigError::Validation {
            name: name.into(),
            message: message.into(),
        }
    }
}
