use std::collections::HashMap;
use std::path::{Path, PathBuf};

use super::validate::validate_all;
use super::{ConfigError, ProgramSpec, RawConfigFile};

/// Loads and validates the YAML document at a fixed path, mirroring the
/// teacher's file-backed config loader: read bytes, parse with
/// `serde_yaml`, hand the raw document to the validator.
pub struct ConfigLoaderFile {
    path: PathBuf,
}

impl ConfigLoaderFile {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> Result<HashMap<String, ProgramSpec>, ConfigError> {
        let contents = std::fs::read_to_string(&self.path).map_err(|source| ConfigError::Io {
            path: self.path.display().to_string(),
            source,
        })?;

        let doc: RawConfigFile =
            serde_yaml::from_str(&contents).map_err(|source| ConfigError::Yaml {
                path: self.path.display().to_string(),
                source,
            })?;

        let programs = doc.programs.ok_or(ConfigError::MissingProgramsSection)?;
        validate_all(programs)
    }
}
