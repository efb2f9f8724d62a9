//! Build command implementation
//!
//! Discovers shader files, expands each through a shared
//! [`ShaderPipeline`] (several at once) and writes the artifacts in input
//! order.

use futures::stream::{self, StreamExt};
use splice_core::{
    ConfigLoader, FsStore, PipelineConfig, ResourceId, Result, ResultExt, ShaderArtifact,
    ShaderDiscovery, ShaderPipeline, SpliceError, StoreResolver,
};
use std::path::{Component, Path, PathBuf};
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// Output directory when `-o` is not given
pub const DEFAULT_OUTPUT_DIR: &str = "splice-generated";

type FsPipeline = ShaderPipeline<StoreResolver<FsStore>>;

/// Options of `splice build`, after clap parsing
#[derive(Debug, Clone)]
pub struct BuildArgs {
    pub paths: Vec<PathBuf>,
    pub output: Option<PathBuf>,
    pub defines: Vec<(String, Option<String>)>,
    pub namespace: Option<String>,
    pub include_dir: Option<String>,
    pub roots: Vec<(String, PathBuf)>,
    pub no_line_directives: bool,
    pub keep_unicode: bool,
    pub emit_map: bool,
    pub stdout: bool,
    pub jobs: usize,
    pub config_path: Option<PathBuf>,
}

pub async fn build_command(args: BuildArgs) -> Result<()> {
    let start_time = Instant::now();
    debug!("Running build command on paths: {:?}", args.paths);

    let start_dir = search_start(&args.paths);
    let mut config = ConfigLoader::load(args.config_path.as_deref(), Some(start_dir.as_path()))?;
    apply_overrides(&mut config, &args)?;

    let namespace = config.namespace.clone();
    let root_dir = match config.root_dir(&namespace) {
        Some(dir) => canonical(&dir),
        None => {
            let dir = canonical(&start_dir);
            info!(
                "No root configured for namespace '{}', using {}",
                namespace,
                dir.display()
            );
            config.roots.insert(namespace.clone(), dir.clone());
            dir
        }
    };
    config.validate()?;

    let discovery = ShaderDiscovery::new(&config.files)?;
    let files = discovery.expand(&args.paths)?;
    if files.is_empty() {
        warn!("No shader files found");
        return Ok(());
    }
    info!("Building {} shaders", files.len());

    if args.emit_map && args.stdout {
        warn!("--emit-map is ignored with --stdout");
    }

    let pipeline = ShaderPipeline::from_config(config);
    let pipeline = &pipeline;
    let namespace = namespace.as_str();
    let root_dir = root_dir.as_path();

    let mut results: Vec<(usize, PathBuf, Result<ShaderArtifact>)> =
        stream::iter(files.into_iter().enumerate())
            .map(move |(index, file)| async move {
                let result = build_file(pipeline, namespace, root_dir, &file).await;
                (index, file, result)
            })
            .buffer_unordered(args.jobs)
            .collect()
            .await;
    results.sort_by_key(|(index, ..)| *index);

    let output_dir = args
        .output
        .clone()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR));
    let total = results.len();
    let mut failed = 0;

    for (_, file, result) in results {
        let Some(artifact) = result.recoverable()? else {
            error!("Failed to build {}", file.display());
            failed += 1;
            continue;
        };

        for diagnostic in &artifact.diagnostics {
            warn!("{}: {}", file.display(), diagnostic);
        }

        if args.stdout {
            if total > 1 {
                println!("// {}", artifact.id);
            }
            print!("{}", artifact.text);
        } else {
            write_artifact(&output_dir, &artifact, args.emit_map)?;
        }
    }

    info!(
        "Built {} of {} shaders in {:.2?}",
        total - failed,
        total,
        start_time.elapsed()
    );

    if failed > 0 {
        eprintln!("{failed} of {total} shaders failed to build");
        std::process::exit(1);
    }

    Ok(())
}

/// Apply command-line flags on top of the loaded configuration
fn apply_overrides(config: &mut PipelineConfig, args: &BuildArgs) -> Result<()> {
    if let Some(namespace) = &args.namespace {
        config.namespace = namespace.clone();
    }
    if let Some(include_dir) = &args.include_dir {
        config.include_dir = include_dir.clone();
    }
    if !args.roots.is_empty() {
        let cwd = std::env::current_dir().map_err(|e| SpliceError::io_error(".", e))?;
        for (namespace, dir) in &args.roots {
            // command-line roots are relative to the working directory
            config.roots.insert(namespace.clone(), cwd.join(dir));
        }
    }
    for (name, value) in &args.defines {
        config.defines.insert(name.clone(), value.clone());
    }
    if args.no_line_directives {
        config.line_directives.enabled = false;
    }
    if args.keep_unicode {
        config.strip_non_ascii = false;
    }
    Ok(())
}

async fn build_file(
    pipeline: &FsPipeline,
    namespace: &str,
    root_dir: &Path,
    file: &Path,
) -> Result<ShaderArtifact> {
    let text = tokio::fs::read_to_string(file)
        .await
        .map_err(|e| SpliceError::io_error(file, e))?;
    let id = ResourceId::new(namespace, resource_path(root_dir, file));
    debug!("Building {} as {}", file.display(), id);
    pipeline.build(id, &text).await
}

/// Write `artifact` below `output_dir`, mirroring its resource path
fn write_artifact(output_dir: &Path, artifact: &ShaderArtifact, emit_map: bool) -> Result<()> {
    let out_path = artifact
        .id
        .path()
        .split('/')
        .fold(output_dir.to_path_buf(), |dir, segment| dir.join(segment));
    if let Some(parent) = out_path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| SpliceError::io_error(parent, e))?;
    }
    std::fs::write(&out_path, &artifact.text).map_err(|e| SpliceError::io_error(&out_path, e))?;
    debug!("Wrote {}", out_path.display());

    if emit_map {
        let mut map_path = out_path.into_os_string();
        map_path.push(".map.json");
        let map_path = PathBuf::from(map_path);
        let json = serde_json::to_string_pretty(&artifact.manifest()).map_err(|e| {
            SpliceError::internal_error(format!("Failed to serialize source map: {e}"))
        })?;
        std::fs::write(&map_path, json).map_err(|e| SpliceError::io_error(&map_path, e))?;
    }
    Ok(())
}

/// Directory to start config discovery and the fallback root from
fn search_start(paths: &[PathBuf]) -> PathBuf {
    match paths.first() {
        Some(path) if path.is_dir() => path.clone(),
        Some(path) => match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        },
        None => PathBuf::from("."),
    }
}

fn canonical(path: &Path) -> PathBuf {
    std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}

/// Resource path of `file` inside `root_dir`, or its file name when it lives
/// elsewhere
fn resource_path(root_dir: &Path, file: &Path) -> String {
    let file = canonical(file);
    let relative = match file.strip_prefix(root_dir) {
        Ok(relative) => relative.to_path_buf(),
        Err(_) => file.file_name().map(PathBuf::from).unwrap_or_default(),
    };
    relative
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn args(paths: Vec<PathBuf>) -> BuildArgs {
        BuildArgs {
            paths,
            output: None,
            defines: Vec::new(),
            namespace: None,
            include_dir: None,
            roots: Vec::new(),
            no_line_directives: false,
            keep_unicode: false,
            emit_map: false,
            stdout: false,
            jobs: 1,
            config_path: None,
        }
    }

    #[test]
    fn resource_paths_are_relative_to_the_root() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join("post")).unwrap();
        let file = dir.path().join("post/bloom.frag");
        std::fs::write(&file, "").unwrap();

        let root = canonical(dir.path());
        assert_eq!(resource_path(&root, &file), "post/bloom.frag");

        let elsewhere = TempDir::new().unwrap();
        let outside = elsewhere.path().join("lone.vert");
        std::fs::write(&outside, "").unwrap();
        assert_eq!(resource_path(&root, &outside), "lone.vert");
    }

    #[test]
    fn overrides_replace_config_values() {
        let mut config = PipelineConfig::default();
        let mut build = args(vec![PathBuf::from(".")]);
        build.namespace = Some("fx".into());
        build.include_dir = Some("lib".into());
        build.defines = vec![("A".into(), Some("1".into()))];
        build.no_line_directives = true;
        build.keep_unicode = true;
        build.roots = vec![("engine".into(), PathBuf::from("glsl"))];

        apply_overrides(&mut config, &build).unwrap();
        assert_eq!(config.namespace, "fx");
        assert_eq!(config.include_dir, "lib");
        assert_eq!(config.defines.get("A"), Some(&Some("1".to_string())));
        assert!(config.injector().is_none());
        assert!(!config.strip_non_ascii);
        assert!(config.roots["engine"].is_absolute());
    }

    #[test]
    fn search_starts_next_to_a_file() {
        assert_eq!(
            search_start(&[PathBuf::from("main.frag")]),
            PathBuf::from(".")
        );
        assert_eq!(
            search_start(&[PathBuf::from("shaders/main.frag")]),
            PathBuf::from("shaders")
        );
    }
}
