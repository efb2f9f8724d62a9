//! Pipeline configuration file format
//!
//! ## Example (splice.yaml)
//!
//! ```yaml
//! namespace: shader
//! includeDir: include
//! roots:
//!   shader: ./shaders
//!   engine: ../engine/glsl
//! lineDirectives:
//!   enabled: true
//!   marker: "#line"
//! stripNonAscii: true
//! maxImportDepth: 32
//! defines:
//!   USE_SHADOWS: null
//!   MAX_LIGHTS: "8"
//! files:
//!   include:
//!     - "**/*.frag"
//!     - "**/*.vert"
//!   exclude:
//!     - "**/include/**"
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::defines::{Defines, check_define};
use crate::line_directives::{DEFAULT_MARKER, LineDirectiveInjector};
use crate::preprocess::{DEFAULT_MAX_IMPORT_DEPTH, PreprocessOptions};
use crate::resolve::{DEFAULT_INCLUDE_DIR, DEFAULT_NAMESPACE, FsStore, ResolverOptions};
use crate::{Result, SpliceError};

/// Settings for one or more pipeline runs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PipelineConfig {
    /// Namespace for references that name none
    pub namespace: String,

    /// Sub-location for bare file names
    pub include_dir: String,

    /// Namespace to directory roots for the filesystem store. Relative
    /// directories are resolved against the config file's directory.
    pub roots: IndexMap<String, PathBuf>,

    pub line_directives: LineDirectivesConfig,

    /// Drop non-ASCII characters from the final text
    pub strip_non_ascii: bool,

    pub max_import_depth: usize,

    /// `#define` lines injected after `#version`
    pub defines: Defines,

    pub files: FilesConfig,

    /// Directory of the file this was loaded from
    #[serde(skip)]
    pub base_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LineDirectivesConfig {
    pub enabled: bool,
    pub marker: String,
}

impl Default for LineDirectivesConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            marker: DEFAULT_MARKER.to_string(),
        }
    }
}

/// Which files `splice build` picks up when given a directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FilesConfig {
    pub include: Vec<String>,
    pub exclude: Vec<String>,
}

impl Default for FilesConfig {
    fn default() -> Self {
        Self {
            include: ["vert", "frag", "geom", "tesc", "tese", "comp"]
                .iter()
                .map(|ext| format!("**/*.{ext}"))
                .collect(),
            exclude: Vec::new(),
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            namespace: DEFAULT_NAMESPACE.to_string(),
            include_dir: DEFAULT_INCLUDE_DIR.to_string(),
            roots: IndexMap::new(),
            line_directives: LineDirectivesConfig::default(),
            strip_non_ascii: true,
            max_import_depth: DEFAULT_MAX_IMPORT_DEPTH,
            defines: Defines::new(),
            files: FilesConfig::default(),
            base_dir: None,
        }
    }
}

/// Serialization format for config files
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Json,
    Toml,
    Yaml,
}

impl ConfigFormat {
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Some(Self::Json),
            Some("toml") => Some(Self::Toml),
            Some("yaml") | Some("yml") => Some(Self::Yaml),
            _ => None,
        }
    }

    /// File name `splice config init` writes
    pub fn default_file_name(&self) -> &'static str {
        match self {
            Self::Json => ".splicerc.json",
            Self::Toml => ".splicerc.toml",
            Self::Yaml => "splice.yaml",
        }
    }
}

impl PipelineConfig {
    /// Load configuration from a file, choosing the format by extension
    pub fn load(path: &Path) -> Result<Self> {
        let format = ConfigFormat::from_path(path).ok_or_else(|| {
            SpliceError::config_error(format!(
                "Unsupported config file '{}' (expected .json, .toml, .yaml or .yml)",
                path.display()
            ))
        })?;
        let content = fs::read_to_string(path).map_err(|e| SpliceError::io_error(path, e))?;

        let mut config = Self::parse(&content, format).map_err(|e| {
            SpliceError::config_error(format!("Failed to parse '{}': {}", path.display(), e))
        })?;
        config.base_dir = path.parent().map(Path::to_path_buf);
        config.validate()?;
        Ok(config)
    }

    pub fn parse(content: &str, format: ConfigFormat) -> std::result::Result<Self, String> {
        match format {
            ConfigFormat::Json => serde_json::from_str(content).map_err(|e| e.to_string()),
            ConfigFormat::Toml => toml::from_str(content).map_err(|e| e.to_string()),
            ConfigFormat::Yaml => serde_yaml::from_str(content).map_err(|e| e.to_string()),
        }
    }

    pub fn render(&self, format: ConfigFormat) -> Result<String> {
        let rendered = match format {
            ConfigFormat::Json => serde_json::to_string_pretty(self).map_err(|e| e.to_string()),
            ConfigFormat::Toml => toml::to_string_pretty(self).map_err(|e| e.to_string()),
            ConfigFormat::Yaml => serde_yaml::to_string(self).map_err(|e| e.to_string()),
        };
        rendered.map_err(|e| SpliceError::config_error(format!("Failed to render config: {e}")))
    }

    pub fn validate(&self) -> Result<()> {
        if self.namespace.is_empty() {
            return Err(SpliceError::config_error("namespace must not be empty"));
        }
        if self.line_directives.enabled && self.line_directives.marker.trim().is_empty() {
            return Err(SpliceError::config_error("lineDirectives.marker must not be empty"));
        }
        for pattern in self.files.include.iter().chain(&self.files.exclude) {
            glob::Pattern::new(pattern).map_err(|e| {
                SpliceError::config_error(format!("invalid file pattern '{pattern}': {e}"))
            })?;
        }
        for (name, value) in &self.defines {
            check_define(name, value.as_deref())?;
        }
        Ok(())
    }

    pub fn resolver_options(&self) -> ResolverOptions {
        ResolverOptions {
            default_namespace: self.namespace.clone(),
            include_dir: self.include_dir.clone(),
        }
    }

    pub fn preprocess_options(&self) -> PreprocessOptions {
        PreprocessOptions {
            max_import_depth: self.max_import_depth,
        }
    }

    /// Injector to use, `None` when line directives are disabled
    pub fn injector(&self) -> Option<LineDirectiveInjector> {
        self.line_directives
            .enabled
            .then(|| LineDirectiveInjector::new(self.line_directives.marker.clone()))
    }

    /// Root directory for `namespace`, made absolute against the config file
    pub fn root_dir(&self, namespace: &str) -> Option<PathBuf> {
        self.roots.get(namespace).map(|dir| self.resolve_path(dir))
    }

    fn resolve_path(&self, dir: &Path) -> PathBuf {
        match &self.base_dir {
            Some(base) if dir.is_relative() => base.join(dir),
            _ => dir.to_path_buf(),
        }
    }

    /// Filesystem store over every configured root
    pub fn fs_store(&self) -> FsStore {
        let mut store = FsStore::new();
        for (namespace, dir) in &self.roots {
            store.add_root(namespace.clone(), self.resolve_path(dir));
        }
        store
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn defaults() {
        let config = PipelineConfig::default();
        assert_eq!(config.namespace, "shader");
        assert_eq!(config.include_dir, "include");
        assert!(config.line_directives.enabled);
        assert_eq!(config.line_directives.marker, "#line");
        assert!(config.strip_non_ascii);
        assert_eq!(config.max_import_depth, 32);
        assert!(config.files.include.contains(&"**/*.frag".to_string()));
    }

    #[test]
    fn partial_yaml_keeps_defaults() {
        let yaml = "namespace: game\nlineDirectives:\n  enabled: false\ndefines:\n  USE_FOG: null\n  N: \"4\"\n";
        let config = PipelineConfig::parse(yaml, ConfigFormat::Yaml).unwrap();
        assert_eq!(config.namespace, "game");
        assert_eq!(config.include_dir, "include");
        assert!(!config.line_directives.enabled);
        assert_eq!(config.line_directives.marker, "#line");
        assert_eq!(config.defines.get("USE_FOG"), Some(&None));
        assert_eq!(config.defines.get("N"), Some(&Some("4".to_string())));
        assert!(config.injector().is_none());
    }

    #[test]
    fn json_and_toml_parse() {
        let json = r#"{"includeDir": "lib", "maxImportDepth": 4, "roots": {"shader": "src"}}"#;
        let config = PipelineConfig::parse(json, ConfigFormat::Json).unwrap();
        assert_eq!(config.include_dir, "lib");
        assert_eq!(config.preprocess_options().max_import_depth, 4);
        assert_eq!(config.roots.get("shader"), Some(&PathBuf::from("src")));

        let toml = "namespace = \"fx\"\nstripNonAscii = false\n\n[files]\ninclude = [\"*.glsl\"]\n";
        let config = PipelineConfig::parse(toml, ConfigFormat::Toml).unwrap();
        assert_eq!(config.resolver_options().default_namespace, "fx");
        assert!(!config.strip_non_ascii);
        assert_eq!(config.files.include, vec!["*.glsl"]);
    }

    #[test]
    fn load_resolves_roots_against_config_dir() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("splice.json");
        fs::write(&path, r#"{"roots": {"shader": "shaders", "abs": "/opt/glsl"}}"#).unwrap();

        let config = PipelineConfig::load(&path).unwrap();
        assert_eq!(config.root_dir("shader"), Some(dir.path().join("shaders")));
        assert_eq!(config.root_dir("abs"), Some(PathBuf::from("/opt/glsl")));
        assert_eq!(config.root_dir("missing"), None);
        assert_eq!(
            config.fs_store().root("shader"),
            Some(dir.path().join("shaders").as_path())
        );
    }

    #[test]
    fn validation_rejects_bad_values() {
        let mut config = PipelineConfig::default();
        config.line_directives.marker = " ".into();
        assert!(config.validate().is_err());

        let mut config = PipelineConfig::default();
        config.files.exclude.push("[".into());
        assert!(config.validate().is_err());

        let mut config = PipelineConfig::default();
        config.defines.insert("not valid".into(), None);
        assert!(config.validate().is_err());
    }

    #[test]
    fn unsupported_extension_is_an_error() {
        let err = PipelineConfig::load(Path::new("splice.ini")).unwrap_err();
        assert!(matches!(err, SpliceError::ConfigError { .. }));
    }

    #[test]
    fn render_round_trips() {
        let config = PipelineConfig::default();
        for format in [ConfigFormat::Json, ConfigFormat::Toml, ConfigFormat::Yaml] {
            let text = config.render(format).unwrap();
            assert_eq!(PipelineConfig::parse(&text, format).unwrap(), config);
        }
    }
}
