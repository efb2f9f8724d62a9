//! Import inlining
//!
//! The [`Preprocessor`] replaces every `@import "..."` directive with the
//! fully expanded text of the resource it names and records where every byte
//! of the result came from in a [`SourceMap`].
//!
//! Each document goes through the same steps:
//!
//! 1. collect its import sites in document order (owned ranges and text, so
//!    nothing borrowed from the tree is held across an await)
//! 2. resolve each site and recursively expand what it resolves to
//! 3. queue every rewrite on one [`crate::cst::Editor`] and commit once
//!
//! A failed import is never fatal. It is rewritten to
//!
//! ```text
//! /* @import "missing" */
//! // WARNING: import 'missing' not found
//! ```
//!
//! and reported as a [`Diagnostic`]. Only store faults
//! ([`DiagnosticKind::StoreFailure`]) clear [`PreprocessOutput::success`].
//! Import cycles and runaway nesting are reported the same way instead of
//! recursing forever.

mod line_index;
mod source_map;

use std::sync::Arc;

use futures::FutureExt;
use futures::future::BoxFuture;
use indexmap::IndexMap;
use rowan::TextRange;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

use crate::cst::Tree;
use crate::cst::ast::AstNode;
use crate::resolve::{Diagnostic, DiagnosticKind, Resource, ResourceId, ResourceResolver};
use crate::{Result, SpliceError};

pub use line_index::LineIndex;
pub use source_map::{MappingKind, SourceLocation, SourceMap, SourceMapBuilder, SourceMapRange};

/// Default limit on import nesting
pub const DEFAULT_MAX_IMPORT_DEPTH: usize = 32;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreprocessOptions {
    /// Deepest allowed chain of nested imports below the root
    pub max_import_depth: usize,
}

impl Default for PreprocessOptions {
    fn default() -> Self {
        Self {
            max_import_depth: DEFAULT_MAX_IMPORT_DEPTH,
        }
    }
}

/// Original text of every resource that took part in a run
pub trait ContentProvider {
    fn content(&self, id: &ResourceId) -> Option<&str>;
}

/// [`ContentProvider`] collected by the preprocessor, in first-seen order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResourceContents {
    entries: IndexMap<ResourceId, Arc<str>>,
}

impl ResourceContents {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `content` unless `id` is already known
    pub fn insert(&mut self, id: ResourceId, content: Arc<str>) {
        self.entries.entry(id).or_insert(content);
    }

    pub fn ids(&self) -> impl Iterator<Item = &ResourceId> {
        self.entries.keys()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl ContentProvider for ResourceContents {
    fn content(&self, id: &ResourceId) -> Option<&str> {
        self.entries.get(id).map(|content| &**content)
    }
}

#[derive(Debug, Clone)]
pub struct PreprocessOutput {
    pub tree: Tree,
    /// False only when a protocol-level fault occurred
    pub success: bool,
    /// Whether the root document contained any import
    pub had_imports: bool,
    pub diagnostics: Vec<Diagnostic>,
    /// Present only when the root document had imports
    pub source_map: Option<SourceMap>,
    pub contents: ResourceContents,
}

impl PreprocessOutput {
    /// Diagnostics joined one per line
    pub fn diagnostic_text(&self) -> String {
        self.diagnostics
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// An import directive, detached from the tree
#[derive(Debug, Clone)]
struct ImportSite {
    range: TextRange,
    reference: String,
    text: String,
}

/// What replaces one import site
enum Inline {
    Expanded {
        id: ResourceId,
        source_len: u32,
        expansion: Expansion,
    },
    Failed(DiagnosticKind),
}

struct Expansion {
    tree: Tree,
    map: SourceMap,
    had_imports: bool,
}

#[derive(Default)]
struct RunState {
    diagnostics: Vec<Diagnostic>,
    contents: ResourceContents,
}

/// Recursive import expander over a [`ResourceResolver`]
#[derive(Debug, Clone)]
pub struct Preprocessor<R> {
    resolver: R,
    options: PreprocessOptions,
}

impl<R: ResourceResolver> Preprocessor<R> {
    pub fn new(resolver: R, options: PreprocessOptions) -> Self {
        Self { resolver, options }
    }

    pub fn resolver(&self) -> &R {
        &self.resolver
    }

    pub fn options(&self) -> &PreprocessOptions {
        &self.options
    }

    /// Expand `root` without a cancellation signal
    pub async fn preprocess(&self, root: &Resource) -> Result<PreprocessOutput> {
        self.run(root, &CancellationToken::new()).await
    }

    /// Expand `root`, giving up with [`SpliceError::Cancelled`] as soon as
    /// `cancel` fires. A cancelled run never yields a partial tree.
    pub async fn run(&self, root: &Resource, cancel: &CancellationToken) -> Result<PreprocessOutput> {
        let mut state = RunState::default();
        state.contents.insert(root.id.clone(), root.content.clone());
        let mut chain = Vec::new();

        let expansion = self.expand(root, &mut chain, &mut state, cancel).await?;
        let success = !state.diagnostics.iter().any(|d| d.kind.is_fatal());
        debug!(
            "Preprocessed {}: {} resources, {} diagnostics",
            root.id,
            state.contents.len(),
            state.diagnostics.len()
        );

        Ok(PreprocessOutput {
            tree: expansion.tree,
            success,
            had_imports: expansion.had_imports,
            diagnostics: state.diagnostics,
            source_map: expansion.had_imports.then_some(expansion.map),
            contents: state.contents,
        })
    }

    fn expand<'a>(
        &'a self,
        resource: &'a Resource,
        chain: &'a mut Vec<ResourceId>,
        state: &'a mut RunState,
        cancel: &'a CancellationToken,
    ) -> BoxFuture<'a, Result<Expansion>> {
        async move {
            if cancel.is_cancelled() {
                return Err(SpliceError::cancelled(&resource.id));
            }

            let sites = collect_import_sites(&resource.tree);
            if sites.is_empty() {
                return Ok(Expansion {
                    tree: resource.tree.clone(),
                    map: SourceMap::identity(&resource.id, u32::from(resource.tree.len())),
                    had_imports: false,
                });
            }
            trace!("{}: {} imports", resource.id, sites.len());

            chain.push(resource.id.clone());
            let mut inlines = Vec::with_capacity(sites.len());
            for site in &sites {
                if cancel.is_cancelled() {
                    return Err(SpliceError::cancelled(&resource.id));
                }

                let resolved = tokio::select! {
                    biased;
                    _ = cancel.cancelled() => return Err(SpliceError::cancelled(&resource.id)),
                    resolved = self.resolver.resolve(
                        &site.reference,
                        Some(&resource.id),
                        resource.tree.schema(),
                    ) => resolved,
                };

                let inline = match resolved {
                    Ok(child) if chain.contains(&child.id) => {
                        let cycle = chain
                            .iter()
                            .chain(std::iter::once(&child.id))
                            .map(ToString::to_string)
                            .collect::<Vec<_>>()
                            .join(" -> ");
                        self.fail(
                            state,
                            Diagnostic::new(
                                &site.reference,
                                DiagnosticKind::ImportCycle,
                                Some(&resource.id),
                                format!("import cycle detected: {cycle}"),
                            ),
                        )
                    }
                    Ok(child) if chain.len() > self.options.max_import_depth => self.fail(
                        state,
                        Diagnostic::new(
                            &site.reference,
                            DiagnosticKind::DepthExceeded,
                            Some(&resource.id),
                            format!(
                                "import of {} exceeds the maximum depth of {}",
                                child.id, self.options.max_import_depth
                            ),
                        ),
                    ),
                    Ok(child) => {
                        state.contents.insert(child.id.clone(), child.content.clone());
                        let expansion = self.expand(&child, chain, state, cancel).await?;
                        Inline::Expanded {
                            id: child.id.clone(),
                            source_len: u32::from(child.tree.len()),
                            expansion,
                        }
                    }
                    Err(diagnostic) => self.fail(state, diagnostic),
                };
                inlines.push(inline);
            }
            chain.pop();

            let (tree, map) = rewrite(resource, &sites, inlines)?;
            Ok(Expansion {
                tree,
                map,
                had_imports: true,
            })
        }
        .boxed()
    }

    fn fail(&self, state: &mut RunState, diagnostic: Diagnostic) -> Inline {
        warn!("{}", diagnostic);
        let kind = diagnostic.kind;
        state.diagnostics.push(diagnostic);
        Inline::Failed(kind)
    }
}

fn collect_import_sites(tree: &Tree) -> Vec<ImportSite> {
    tree.imports()
        .into_iter()
        .map(|import| ImportSite {
            range: import.text_range(),
            reference: import.reference().unwrap_or_default(),
            text: import.syntax().text().to_string(),
        })
        .collect()
}

/// Apply every inline of one document in a single commit and build the map
/// describing the result
fn rewrite(resource: &Resource, sites: &[ImportSite], inlines: Vec<Inline>) -> Result<(Tree, SourceMap)> {
    let id = &resource.id;
    let mut editor = resource.tree.edit();
    let mut map = SourceMap::builder();
    let mut cursor = 0u32;

    for (site, inline) in sites.iter().zip(inlines) {
        let start = u32::from(site.range.start());
        map.push_verbatim(start - cursor, id, cursor);

        let header = format!("/* {} */\n", site.text.replace("*/", "* /"));
        map.push_synthetic(header.len() as u32, id, start);

        let replacement = match inline {
            Inline::Expanded {
                id: child,
                source_len,
                expansion,
            } => {
                let mut body = expansion.tree.text();
                map.splice(&expansion.map);
                if !body.ends_with('\n') {
                    body.push('\n');
                    map.push_synthetic(1, &child, source_len);
                }
                header + &body
            }
            Inline::Failed(kind) => {
                let warning = format!("// WARNING: import '{}' {}", site.reference, kind.reason());
                map.push_synthetic(warning.len() as u32, id, start);
                header + &warning
            }
        };

        editor.replace_range(site.range, replacement);
        cursor = u32::from(site.range.end());
    }

    let len = u32::from(resource.tree.len());
    map.push_verbatim(len - cursor, id, cursor);

    let tree = editor.commit()?;
    let map = map.build();
    if map.generated_len() != u32::from(tree.len()) {
        return Err(SpliceError::internal_error(format!(
            "source map for {} covers {} bytes but the output has {}",
            id,
            map.generated_len(),
            u32::from(tree.len())
        )));
    }
    Ok((tree, map))
}
