//! End-to-end shader build
//!
//! [`ShaderPipeline::build`] runs the whole chain for one root document:
//!
//! ```text
//! parse -> check defines -> inline imports -> #line directives
//!       -> #define block -> render -> strip non-ASCII
//! ```
//!
//! Defines go in after the line directives, right below `#version` and ahead
//! of the first directive, so they never shift the provenance of an original
//! line.

use std::sync::Arc;

use indexmap::IndexMap;
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::ascii::strip_non_ascii;
use crate::config::PipelineConfig;
use crate::cst::{Schema, Tree};
use crate::defines::{inject_defines, validate_defines};
use crate::preprocess::{Preprocessor, SourceMap};
use crate::resolve::{FsStore, Resource, ResourceId, ResourceResolver, StoreResolver};
use crate::{Result, SpliceError};

/// Everything a build produces for one root document
#[derive(Debug, Clone)]
pub struct ShaderArtifact {
    pub id: ResourceId,
    /// Final text handed to the shader compiler
    pub text: String,
    /// Tree of the text before ASCII stripping
    pub tree: Tree,
    pub had_imports: bool,
    pub diagnostics: Vec<String>,
    /// Present only when the root had imports
    pub source_map: Option<SourceMap>,
    /// `#line` id to resource
    pub resource_paths: IndexMap<u32, ResourceId>,
}

/// Serializable sidecar written next to an artifact (`--emit-map`)
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtifactManifest<'a> {
    pub resource: &'a ResourceId,
    pub had_imports: bool,
    pub resource_paths: IndexMap<u32, String>,
    pub diagnostics: &'a [String],
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_map: Option<&'a SourceMap>,
}

impl ShaderArtifact {
    pub fn manifest(&self) -> ArtifactManifest<'_> {
        ArtifactManifest {
            resource: &self.id,
            had_imports: self.had_imports,
            resource_paths: self
                .resource_paths
                .iter()
                .map(|(id, resource)| (*id, resource.to_string()))
                .collect(),
            diagnostics: &self.diagnostics,
            source_map: self.source_map.as_ref(),
        }
    }
}

pub struct ShaderPipeline<R> {
    preprocessor: Preprocessor<R>,
    config: PipelineConfig,
    schema: Arc<Schema>,
}

impl ShaderPipeline<StoreResolver<FsStore>> {
    /// Pipeline over the filesystem roots named in `config`
    pub fn from_config(config: PipelineConfig) -> Self {
        let resolver = StoreResolver::new(config.fs_store(), config.resolver_options());
        Self::new(resolver, config)
    }
}

impl<R: ResourceResolver> ShaderPipeline<R> {
    pub fn new(resolver: R, config: PipelineConfig) -> Self {
        let preprocessor = Preprocessor::new(resolver, config.preprocess_options());
        Self {
            preprocessor,
            config,
            schema: Arc::new(Schema::glsl()),
        }
    }

    /// Use `schema` for the root and every import
    pub fn with_schema(mut self, schema: Arc<Schema>) -> Self {
        self.schema = schema;
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    pub fn resolver(&self) -> &R {
        self.preprocessor.resolver()
    }

    pub async fn build(&self, id: ResourceId, text: &str) -> Result<ShaderArtifact> {
        self.build_with_cancel(id, text, &CancellationToken::new())
            .await
    }

    pub async fn build_with_cancel(
        &self,
        id: ResourceId,
        text: &str,
        cancel: &CancellationToken,
    ) -> Result<ShaderArtifact> {
        let source_name = id.to_string();
        let root = Resource::parse(id, text, self.schema.clone());
        validate_defines(&root.tree, &self.config.defines, &source_name)?;

        let output = self.preprocessor.run(&root, cancel).await?;
        if !output.success {
            let joined = output.diagnostic_text();
            error!("Preprocessing {} failed:\n{}", source_name, joined);
            return Err(SpliceError::preprocess_error(&source_name, joined));
        }

        let (tree, resource_paths) = match self.config.injector() {
            Some(injector) => {
                let identity;
                let map = match &output.source_map {
                    Some(map) => map,
                    None => {
                        identity = SourceMap::identity(&root.id, u32::from(output.tree.len()));
                        &identity
                    }
                };
                match injector.inject(&output.tree, map, &output.contents) {
                    Ok(injection) => (injection.tree, injection.resource_paths),
                    Err(err) => {
                        warn!("Emitting {} without line directives: {}", source_name, err);
                        (output.tree.clone(), IndexMap::new())
                    }
                }
            }
            None => (output.tree.clone(), IndexMap::new()),
        };

        let tree = inject_defines(&tree, &self.config.defines, &source_name)?;
        let rendered = tree.text();
        let text = if self.config.strip_non_ascii {
            strip_non_ascii(&rendered).into_owned()
        } else {
            rendered
        };

        info!(
            "Built {} ({} bytes, {} resources, {} diagnostics)",
            source_name,
            text.len(),
            output.contents.len(),
            output.diagnostics.len()
        );

        Ok(ShaderArtifact {
            id: root.id,
            text,
            tree,
            had_imports: output.had_imports,
            diagnostics: output.diagnostics.iter().map(ToString::to_string).collect(),
            source_map: output.source_map,
            resource_paths,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolve::MemoryStore;

    const ROOT: &str = "#version 330 core\n@import \"inc\"\nvoid main(){}\n";

    fn pipeline(config: PipelineConfig) -> ShaderPipeline<StoreResolver<MemoryStore>> {
        let store = MemoryStore::new();
        store.insert_str("shader:include/inc", "float a=1.0; // \u{2550}\n");
        ShaderPipeline::new(StoreResolver::new(store, config.resolver_options()), config)
    }

    fn main_id() -> ResourceId {
        ResourceId::new("shader", "main.frag")
    }

    #[tokio::test]
    async fn builds_with_defines_directives_and_ascii() {
        let mut config = PipelineConfig::default();
        config.defines.insert("QUALITY".into(), Some("2".into()));
        let artifact = pipeline(config).build(main_id(), ROOT).await.unwrap();

        assert_eq!(
            artifact.text,
            "#version 330 core\n\
             #define QUALITY 2\n\
             #line 2 0\n/* @import \"inc\" */\n\
             #line 1 1\nfloat a=1.0; // \n\
             #line 2 0\n\nvoid main(){}\n"
        );
        assert!(artifact.had_imports);
        assert!(artifact.source_map.is_some());
        assert_eq!(artifact.resource_paths.get(&0), Some(&main_id()));
        // the tree keeps the text before stripping
        assert!(artifact.tree.text().contains('\u{2550}'));
    }

    #[tokio::test]
    async fn no_imports_still_gets_a_line_directive() {
        let mut config = PipelineConfig::default();
        config.defines.insert("A".into(), None);
        let artifact = pipeline(config)
            .build(main_id(), "#version 450\nvoid main(){}\n")
            .await
            .unwrap();

        assert_eq!(artifact.text, "#version 450\n#define A\n#line 2 0\nvoid main(){}\n");
        assert!(!artifact.had_imports);
        assert!(artifact.source_map.is_none());
    }

    #[tokio::test]
    async fn options_can_disable_post_passes() {
        let mut config = PipelineConfig::default();
        config.line_directives.enabled = false;
        config.strip_non_ascii = false;
        let artifact = pipeline(config).build(main_id(), ROOT).await.unwrap();

        assert!(!artifact.text.contains("#line"));
        assert!(artifact.text.contains('\u{2550}'));
        assert!(artifact.resource_paths.is_empty());
    }

    #[tokio::test]
    async fn defines_without_version_fail_before_preprocessing() {
        let mut config = PipelineConfig::default();
        config.defines.insert("A".into(), None);
        let err = pipeline(config)
            .build(main_id(), "void main(){}\n")
            .await
            .unwrap_err();
        assert!(matches!(err, SpliceError::MissingVersionDirective { .. }));
    }

    #[tokio::test]
    async fn store_failures_abort_the_artifact() {
        struct FailingStore;

        #[async_trait::async_trait]
        impl crate::resolve::ContentStore for FailingStore {
            async fn load(&self, id: &ResourceId) -> Result<Option<String>> {
                Err(SpliceError::io_error(
                    id.path(),
                    std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
                ))
            }
        }

        let config = PipelineConfig::default();
        let pipeline = ShaderPipeline::new(
            StoreResolver::new(FailingStore, config.resolver_options()),
            config,
        );
        let err = pipeline.build(main_id(), ROOT).await.unwrap_err();
        match err {
            SpliceError::PreprocessError { resource, diagnostics } => {
                assert_eq!(resource, "shader:main.frag");
                assert!(diagnostics.contains("denied"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn manifest_serializes() {
        let artifact = pipeline(PipelineConfig::default())
            .build(main_id(), ROOT)
            .await
            .unwrap();
        let json = serde_json::to_value(artifact.manifest()).unwrap();
        assert_eq!(json["resourcePaths"]["0"], "shader:main.frag");
        assert_eq!(json["resourcePaths"]["1"], "shader:include/inc");
        assert_eq!(json["hadImports"], true);
        assert!(json["sourceMap"]["ranges"].is_array());
    }
}
