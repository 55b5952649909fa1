//! Configuration loading and management for the invoice engine.
//!
//! This module loads engine settings, the organization directory, shift
//! patterns and optional seed data from a directory of YAML files.
//!
//! # Example
//!
//! ```no_run
//! use invoice_engine::config::ConfigLoader;
//!
//! let config = ConfigLoader::load("./config/default").unwrap();
//! println!("Listening on {}", config.settings().bind_address);
//! ```

mod loader;
mod types;

pub use loader::ConfigLoader;
pub use types::{DirectoryConfig, EngineConfig, EngineSettings, SeedConfig};
