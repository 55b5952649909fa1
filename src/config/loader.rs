//! Configuration loading functionality.
//!
//! This module provides the [`ConfigLoader`] type for loading engine
//! configuration from YAML files.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use tracing::debug;

use crate::error::{EngineError, EngineResult};
use crate::models::ShiftPattern;

use super::types::{DirectoryConfig, EngineConfig, EngineSettings, SeedConfig};

/// Loads and provides access to engine configuration.
///
/// # Directory Structure
///
/// ```text
/// config/default/
/// ├── engine.yaml          # Invoice numbering, bind address, log level
/// ├── directory.yaml       # Agencies, facilities, temporary facilities
/// ├── work_records.yaml    # Optional seed shifts and work records
/// └── shift_patterns/
///     └── night.yaml       # One shift pattern per file
/// ```
///
/// # Example
///
/// ```no_run
/// use invoice_engine::config::ConfigLoader;
///
/// let loader = ConfigLoader::load("./config/default").unwrap();
/// println!("Invoice prefix: {}", loader.settings().invoice_number_prefix);
/// ```
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    config: EngineConfig,
}

impl ConfigLoader {
    /// Loads configuration from the specified directory.
    ///
    /// # Returns
    ///
    /// Returns a `ConfigLoader` instance on success, or an error if:
    /// - `engine.yaml`, `directory.yaml` or `shift_patterns/` is missing
    /// - Any file contains invalid YAML
    /// - Two shift pattern files share an id
    pub fn load<P: AsRef<Path>>(path: P) -> EngineResult<Self> {
        let path = path.as_ref();

        let settings = Self::load_yaml::<EngineSettings>(&path.join("engine.yaml"))?;
        let directory = Self::load_yaml::<DirectoryConfig>(&path.join("directory.yaml"))?;
        let shift_patterns = Self::load_shift_patterns(&path.join("shift_patterns"))?;

        let seed_path = path.join("work_records.yaml");
        let seed = if seed_path.exists() {
            Self::load_yaml::<SeedConfig>(&seed_path)?
        } else {
            SeedConfig::default()
        };

        debug!(
            path = %path.display(),
            shift_patterns = shift_patterns.len(),
            agencies = directory.agencies.len(),
            facilities = directory.facilities.len(),
            temporary_facilities = directory.temporary_facilities.len(),
            work_records = seed.work_records.len(),
            "Loaded engine configuration"
        );

        Ok(Self {
            config: EngineConfig::new(settings, directory, shift_patterns, seed),
        })
    }

    /// Loads and parses a YAML file.
    fn load_yaml<T: serde::de::DeserializeOwned>(path: &Path) -> EngineResult<T> {
        let path_str = path.display().to_string();

        let content = fs::read_to_string(path).map_err(|_| EngineError::ConfigNotFound {
            path: path_str.clone(),
        })?;

        serde_yaml::from_str(&content).map_err(|e| EngineError::ConfigParseError {
            path: path_str,
            message: e.to_string(),
        })
    }

    /// Loads all shift pattern files from the shift_patterns directory.
    fn load_shift_patterns(dir: &Path) -> EngineResult<HashMap<String, ShiftPattern>> {
        let dir_str = dir.display().to_string();

        if !dir.exists() {
            return Err(EngineError::ConfigNotFound { path: dir_str });
        }

        let entries = fs::read_dir(dir).map_err(|_| EngineError::ConfigNotFound {
            path: dir_str.clone(),
        })?;

        let mut patterns = HashMap::new();

        for entry in entries {
            let entry = entry.map_err(|_| EngineError::ConfigNotFound {
                path: dir_str.clone(),
            })?;

            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "yaml") {
                let pattern = Self::load_yaml::<ShiftPattern>(&path)?;
                if patterns.contains_key(&pattern.id) {
                    return Err(EngineError::ConfigParseError {
                        path: path.display().to_string(),
                        message: format!("duplicate shift pattern id '{}'", pattern.id),
                    });
                }
                patterns.insert(pattern.id.clone(), pattern);
            }
        }

        Ok(patterns)
    }

    /// Returns the underlying engine configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Returns the engine settings.
    pub fn settings(&self) -> &EngineSettings {
        self.config.settings()
    }

    /// Gets a shift pattern by id.
    pub fn shift_pattern(&self, id: &str) -> Option<&ShiftPattern> {
        self.config.shift_patterns().get(id)
    }
}
