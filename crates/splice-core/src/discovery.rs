//! Shader source discovery
//!
//! Expands the paths given to `splice build` into concrete files: files are
//! taken as given, directories are walked and filtered through the
//! configured include and exclude globs.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use glob::Pattern;
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::config::FilesConfig;
use crate::{Result, SpliceError};

#[derive(Debug, Clone)]
pub struct ShaderDiscovery {
    include: Vec<Pattern>,
    exclude: Vec<Pattern>,
}

impl ShaderDiscovery {
    pub fn new(files: &FilesConfig) -> Result<Self> {
        Ok(Self {
            include: compile(&files.include)?,
            exclude: compile(&files.exclude)?,
        })
    }

    /// Whether `relative` (a path below a walked directory) should be built
    pub fn matches(&self, relative: &Path) -> bool {
        let path = relative.to_string_lossy().replace('\\', "/");
        self.include.iter().any(|p| p.matches(&path)) && !self.exclude.iter().any(|p| p.matches(&path))
    }

    /// All files under `root` matching the patterns, sorted
    pub fn discover_dir(&self, root: &Path) -> Vec<PathBuf> {
        let mut files = Vec::new();
        for entry in WalkDir::new(root).follow_links(true) {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!("Skipping unreadable entry: {}", e);
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }
            let relative = entry.path().strip_prefix(root).unwrap_or(entry.path());
            if self.matches(relative) {
                files.push(entry.into_path());
            }
        }
        files.sort();
        debug!("Discovered {} shader files under {}", files.len(), root.display());
        files
    }

    /// Expand a mix of files and directories, dropping duplicates
    pub fn expand(&self, inputs: &[PathBuf]) -> Result<Vec<PathBuf>> {
        let mut seen = BTreeSet::new();
        let mut files = Vec::new();
        for input in inputs {
            let found = if input.is_dir() {
                self.discover_dir(input)
            } else if input.is_file() {
                vec![input.clone()]
            } else {
                return Err(SpliceError::io_error(
                    input,
                    std::io::Error::new(std::io::ErrorKind::NotFound, "no such file or directory"),
                ));
            };
            for file in found {
                if seen.insert(file.clone()) {
                    files.push(file);
                }
            }
        }
        Ok(files)
    }
}

fn compile(patterns: &[String]) -> Result<Vec<Pattern>> {
    patterns
        .iter()
        .map(|pattern| {
            Pattern::new(pattern).map_err(|e| {
                SpliceError::config_error(format!("Invalid glob pattern '{pattern}': {e}"))
            })
        })
        .collect()
}
