//! Configuration for the splice pipeline
//!
//! ## Configuration Files
//!
//! Searched in this order in every directory from the start directory up to
//! the filesystem root:
//! - `.splicerc.json`
//! - `.splicerc.toml`
//! - `splice.yaml` / `splice.yml`
//! - `splice.json`
//!
//! Every field is optional; missing fields take their defaults. See
//! [`PipelineConfig`] for the format.

mod loader;
mod splice_config;

pub use loader::{CONFIG_FILE_NAMES, ConfigLoader};
pub use splice_config::{ConfigFormat, FilesConfig, LineDirectivesConfig, PipelineConfig};
