//! Splice Core
//!
//! Shader source preprocessing: a lossless schema-driven syntax tree,
//! `@import` resolution and inlining with a source map, `#line` directive
//! injection, `#define` injection and a final ASCII-only pass.

pub mod ascii;
pub mod config;
pub mod cst; // Concrete Syntax Tree (lossless, Rowan-based)
pub mod defines;
pub mod discovery;
pub mod error;
pub mod line_directives;
pub mod pipeline;
pub mod preprocess;
pub mod resolve;
pub mod result;

// Re-export commonly used types
pub use ascii::{strip_non_ascii, strip_non_ascii_opt};
pub use config::{ConfigFormat, ConfigLoader, FilesConfig, LineDirectivesConfig, PipelineConfig};
pub use cst::{Editor, Position, Schema, ShaderSyntaxKind, Tree};
pub use defines::{Defines, inject_defines, parse_define, render_defines};
pub use discovery::ShaderDiscovery;
pub use error::{ErrorKind, SpliceError};
pub use line_directives::{Injection, LineDirectiveInjector};
pub use pipeline::{ArtifactManifest, ShaderArtifact, ShaderPipeline};
pub use preprocess::{
    ContentProvider, LineIndex, MappingKind, PreprocessOptions, PreprocessOutput, Preprocessor,
    ResourceContents, SourceLocation, SourceMap, SourceMapBuilder, SourceMapRange,
};
pub use resolve::{
    ContentStore, Diagnostic, DiagnosticKind, FsStore, MemoryStore, Resource, ResourceId,
    ResourceResolver, ResolverOptions, StoreResolver,
};
pub use result::{Result, ResultExt};
pub use tokio_util::sync::CancellationToken;

/// Initialize the tracing subscriber for logging
///
/// Logs go to stderr so built shader text can be piped from stdout.
pub fn init_tracing() {
    use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("splice=info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_thread_ids(false)
                .with_file(true)
                .with_line_number(true)
                .with_writer(std::io::stderr),
        )
        .init();
}

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
