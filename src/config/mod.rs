//! Dispatch Configuration Module
//!
//! Provides contractor profiles, nickname correction tables and matching
//! tunables loaded from TOML, replacing hardcoded tables in the parsers.
//!
//! ## Loading Order
//!
//! 1. `--config <path>` on the command line
//! 2. `DISPATCH_CONFIG` environment variable (path to TOML file)
//! 3. `dispatch.toml` in the current working directory
//! 4. Built-in defaults (the six known contractors)
//!
//! ## Usage
//!
//! Build the directory once at startup and pass it down explicitly:
//!
//! ```ignore
//! let config = DispatchConfig::load();
//! let directory = ContractorDirectory::from_config(&config);
//! let parsed = schedule::dispatch(&text, Some("SubT"), None, &directory);
//! ```

mod directory;
mod dispatch_config;
pub mod defaults;
pub mod validation;

pub use directory::{ContractorDirectory, ContractorProfile};
pub use dispatch_config::*;
