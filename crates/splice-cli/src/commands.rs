//! CLI command implementations
//!
//! - `build` - discover shaders, run the pipeline and write artifacts
//! - `config` - configuration file management (init, show)

pub mod build;
pub mod config;
