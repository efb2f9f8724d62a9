//! Configuration management subcommands

use splice_core::{ConfigFormat, ConfigLoader, PipelineConfig, Result, SpliceError};
use std::path::{Path, PathBuf};
use tracing::{debug, error};

/// Write a default configuration file into the current directory
pub async fn init_command(format: ConfigFormat, force: bool) -> Result<()> {
    init_in(Path::new("."), format, force)
}

fn init_in(dir: &Path, format: ConfigFormat, force: bool) -> Result<()> {
    debug!("Initializing configuration file with format: {:?}", format);

    let filename = format.default_file_name();
    let config_path = dir.join(filename);

    if config_path.exists() && !force {
        error!(
            "Configuration file '{}' already exists. Use --force to overwrite.",
            filename
        );
        return Err(SpliceError::config_error(format!(
            "Configuration file '{filename}' already exists"
        )));
    }

    let content = PipelineConfig::default().render(format)?;
    std::fs::write(&config_path, content).map_err(|e| SpliceError::io_error(&config_path, e))?;

    println!("Created configuration file: {filename}");
    println!("   Map namespaces to directories under 'roots' to resolve imports.");
    Ok(())
}

/// Print the effective configuration
pub async fn show_command(format: ConfigFormat, config_path: Option<PathBuf>) -> Result<()> {
    debug!("Showing configuration");

    let config = ConfigLoader::load(config_path.as_deref(), None)?;
    println!("{}", config.render(format)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn init_refuses_to_overwrite_without_force() {
        let dir = TempDir::new().unwrap();
        init_in(dir.path(), ConfigFormat::Yaml, false).unwrap();
        assert!(dir.path().join("splice.yaml").is_file());

        let err = init_in(dir.path(), ConfigFormat::Yaml, false).unwrap_err();
        assert!(matches!(err, SpliceError::ConfigError { .. }));
        init_in(dir.path(), ConfigFormat::Yaml, true).unwrap();
    }

    #[test]
    fn written_config_loads_back() {
        let dir = TempDir::new().unwrap();
        init_in(dir.path(), ConfigFormat::Toml, false).unwrap();
        let config = ConfigLoader::load_from_file(&dir.path().join(".splicerc.toml")).unwrap();
        assert_eq!(config.namespace, "shader");
    }
}
