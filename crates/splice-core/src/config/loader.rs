//! Configuration file discovery and loading

use std::path::{Path, PathBuf};

use super::PipelineConfig;
use crate::{Result, SpliceError};

/// File names searched in each directory, in priority order
pub const CONFIG_FILE_NAMES: &[&str] = &[
    ".splicerc.json",
    ".splicerc.toml",
    "splice.yaml",
    "splice.yml",
    "splice.json",
];

/// Configuration loader for discovering and loading config files
pub struct ConfigLoader;

impl ConfigLoader {
    /// Auto-discover a config file by walking up from `start_path`
    ///
    /// Each directory is searched for [`CONFIG_FILE_NAMES`] in order; the
    /// first hit wins. Stops at the filesystem root.
    pub fn auto_discover(start_path: &Path) -> Result<Option<PathBuf>> {
        let mut current = start_path
            .canonicalize()
            .map_err(|e| SpliceError::config_error(format!("Invalid path: {e}")))?;

        loop {
            for filename in CONFIG_FILE_NAMES {
                let config_path = current.join(filename);
                if config_path.is_file() {
                    tracing::debug!("Found config: {}", config_path.display());
                    return Ok(Some(config_path));
                }
            }

            match current.parent() {
                Some(parent) => current = parent.to_path_buf(),
                None => break,
            }
        }

        Ok(None)
    }

    /// Load configuration from a specific file
    pub fn load_from_file(path: &Path) -> Result<PipelineConfig> {
        PipelineConfig::load(path)
    }

    /// Load config from `custom_path`, or discover one from `start_dir`
    /// (default: the current directory). Without any config file the
    /// defaults are used.
    pub fn load(custom_path: Option<&Path>, start_dir: Option<&Path>) -> Result<PipelineConfig> {
        if let Some(path) = custom_path {
            if !path.exists() {
                return Err(SpliceError::config_error(format!(
                    "Config file not found: {}",
                    path.display()
                )));
            }
            return Self::load_from_file(path);
        }

        let search_dir = start_dir.unwrap_or_else(|| Path::new("."));
        match Self::auto_discover(search_dir)? {
            Some(path) => Self::load_from_file(&path),
            None => {
                tracing::debug!(
                    "No config file found from {}, using defaults",
                    search_dir.display()
                );
                Ok(PipelineConfig::default())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn create_temp_config(dir: &Path, filename: &str, content: &str) -> PathBuf {
        let path = dir.join(filename);
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_auto_discover_walks_up() {
        let temp_dir = TempDir::new().unwrap();
        let nested = temp_dir.path().join("shaders/post");
        fs::create_dir_all(&nested).unwrap();
        create_temp_config(temp_dir.path(), "splice.yaml", "namespace: fx\n");

        let found = ConfigLoader::auto_discover(&nested).unwrap().unwrap();
        assert_eq!(found.file_name().unwrap(), "splice.yaml");

        let config = ConfigLoader::load(None, Some(nested.as_path())).unwrap();
        assert_eq!(config.namespace, "fx");
    }

    #[test]
    fn test_dotfile_takes_priority() {
        let temp_dir = TempDir::new().unwrap();
        create_temp_config(temp_dir.path(), "splice.json", r#"{"namespace": "json"}"#);
        create_temp_config(temp_dir.path(), ".splicerc.toml", "namespace = \"toml\"\n");

        let config = ConfigLoader::load(None, Some(temp_dir.path())).unwrap();
        assert_eq!(config.namespace, "toml");
    }

    #[test]
    fn test_explicit_path() {
        let temp_dir = TempDir::new().unwrap();
        let path = create_temp_config(temp_dir.path(), "custom.yml", "includeDir: lib\n");

        let config = ConfigLoader::load(Some(path.as_path()), None).unwrap();
        assert_eq!(config.include_dir, "lib");
        assert_eq!(config.base_dir.as_deref(), Some(temp_dir.path()));
    }

    #[test]
    fn test_load_nonexistent_file() {
        let result = ConfigLoader::load(Some(Path::new("nonexistent.json")), None);
        assert!(matches!(result, Err(SpliceError::ConfigError { .. })));
    }

    #[test]
    fn test_invalid_content_is_config_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = create_temp_config(temp_dir.path(), "splice.json", "{ not json");
        let result = ConfigLoader::load_from_file(&path);
        assert!(matches!(result, Err(SpliceError::ConfigError { .. })));
    }
}
