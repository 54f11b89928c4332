//! Reads the mock configuration from disk.
//!
//! Nothing is cached between calls: every `load` re-resolves the entry file and
//! re-parses it, so edits are always observed.

use std::{
    fs,
    path::{Path, PathBuf},
};

use serde_yaml::{Mapping, Value as YamlValue};
use tracing::debug;

use crate::{constants::mock::CONFIG_FILES, errors::MockError};

#[derive(Debug, Clone)]
pub struct ConfigLoader {
    mock_dir: PathBuf,
}

impl ConfigLoader {
    pub fn new(mock_dir: impl Into<PathBuf>) -> Self {
        Self { mock_dir: mock_dir.into() }
    }

    pub fn mock_dir(&self) -> &Path {
        &self.mock_dir
    }

    /// The entry file that `load` would read, if any exists right now.
    pub fn config_file(&self) -> Option<PathBuf> {
        CONFIG_FILES
            .iter()
            .map(|name| self.mock_dir.join(name))
            .find(|path| path.is_file())
    }

    /// Path to report in diagnostics: the existing entry file, or the first
    /// candidate when none exists.
    pub fn display_path(&self) -> PathBuf {
        self.config_file().unwrap_or_else(|| self.mock_dir.join(CONFIG_FILES[0]))
    }

    /// Loads the raw route mapping. A missing entry file is an empty mapping.
    pub fn load(&self) -> Result<Mapping, MockError> {
        let Some(path) = self.config_file() else {
            debug!(dir = ?self.mock_dir, "No mock config found");
            return Ok(Mapping::new());
        };

        let content = fs::read_to_string(&path).map_err(|e| MockError::config_load(&path, e))?;
        debug!(path = ?path, bytes = content.len(), "Read mock config");

        match serde_yaml::from_str::<YamlValue>(&content) {
            Ok(YamlValue::Mapping(mapping)) => Ok(mapping),
            Ok(YamlValue::Null) => Ok(Mapping::new()),
            Ok(_) => Err(MockError::config_load(&path, "top-level value must be a mapping of route keys")),
            Err(e) => Err(MockError::config_load(&path, e)),
        }
    }
}
