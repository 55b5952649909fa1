//! Configuration types for the invoice engine.
//!
//! This module contains the strongly-typed configuration structures that
//! are deserialized from YAML configuration files.

use std::collections::HashMap;

use serde::Deserialize;

use crate::models::{Organization, Shift, ShiftPattern, WorkRecord};

fn default_invoice_number_prefix() -> String {
    "INV".to_string()
}

fn default_invoice_number_attempts() -> u32 {
    5
}

fn default_bind_address() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Engine settings from `engine.yaml`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct EngineSettings {
    /// Prefix of generated invoice numbers (`INV` gives `INV-YYMM-####`).
    #[serde(default = "default_invoice_number_prefix")]
    pub invoice_number_prefix: String,
    /// How many numbers to try before giving up on a collision.
    #[serde(default = "default_invoice_number_attempts")]
    pub invoice_number_attempts: u32,
    /// Address the HTTP API listens on.
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    /// Default log filter when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            invoice_number_prefix: default_invoice_number_prefix(),
            invoice_number_attempts: default_invoice_number_attempts(),
            bind_address: default_bind_address(),
            log_level: default_log_level(),
        }
    }
}

/// Organizations from `directory.yaml`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DirectoryConfig {
    /// Staffing agencies.
    #[serde(default)]
    pub agencies: Vec<Organization>,
    /// Verified facilities.
    #[serde(default)]
    pub facilities: Vec<Organization>,
    /// Temporary/unclaimed facilities.
    #[serde(default)]
    pub temporary_facilities: Vec<Organization>,
}

/// Optional seed data from `work_records.yaml`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SeedConfig {
    /// Shifts.
    #[serde(default)]
    pub shifts: Vec<Shift>,
    /// Work records against those shifts.
    #[serde(default)]
    pub work_records: Vec<WorkRecord>,
}

/// The complete engine configuration loaded from a configuration directory.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    settings: EngineSettings,
    directory: DirectoryConfig,
    shift_patterns: HashMap<String, ShiftPattern>,
    seed: SeedConfig,
}

impl EngineConfig {
    /// Creates a new EngineConfig from its component parts.
    pub fn new(
        settings: EngineSettings,
        directory: DirectoryConfig,
        shift_patterns: HashMap<String, ShiftPattern>,
        seed: SeedConfig,
    ) -> Self {
        Self {
            settings,
            directory,
            shift_patterns,
            seed,
        }
    }

    /// Returns the engine settings.
    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    /// Returns the organization directory.
    pub fn directory(&self) -> &DirectoryConfig {
        &self.directory
    }

    /// Returns all shift patterns keyed by id.
    pub fn shift_patterns(&self) -> &HashMap<String, ShiftPattern> {
        &self.shift_patterns
    }

    /// Returns the seed shifts and work records.
    pub fn seed(&self) -> &SeedConfig {
        &self.seed
    }
}
