//! `#line` directive injection
//!
//! After inlining, compiler diagnostics point at lines of the generated text.
//! The injector walks the [`SourceMap`] and, at the start of every mapped
//! range, inserts `#line <original line> <resource id>` so a downstream
//! compiler reports original coordinates. The id table in [`Injection`]
//! translates the numeric ids back to resources.

use std::collections::{BTreeMap, HashMap};

use indexmap::IndexMap;
use rowan::TextSize;
use tracing::{debug, trace, warn};

use crate::Result;
use crate::cst::ast::AstNode;
use crate::cst::{ShaderSyntaxKind, Tree};
use crate::preprocess::{ContentProvider, LineIndex, SourceMap};
use crate::resolve::ResourceId;

pub const DEFAULT_MARKER: &str = "#line";

/// Result of an injection pass
#[derive(Debug, Clone)]
pub struct Injection {
    pub tree: Tree,
    /// Numeric id used in the directives, in first-seen order
    pub resource_paths: IndexMap<u32, ResourceId>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineDirectiveInjector {
    marker: String,
    version_directive: String,
}

impl Default for LineDirectiveInjector {
    fn default() -> Self {
        Self::new(DEFAULT_MARKER)
    }
}

impl LineDirectiveInjector {
    pub fn new(marker: impl Into<String>) -> Self {
        Self {
            marker: marker.into(),
            version_directive: "version".to_string(),
        }
    }

    /// Name of the leading directive that must stay first (default `version`)
    pub fn with_version_directive(mut self, name: impl Into<String>) -> Self {
        self.version_directive = name.into();
        self
    }

    pub fn marker(&self) -> &str {
        &self.marker
    }

    /// Offset at or after which directives may go: just past the leading
    /// version line, or 0 without one
    pub fn min_insert_offset(&self, tree: &Tree) -> TextSize {
        tree.leading_directive(&self.version_directive)
            .map(|directive| tree.end_of_line(directive.syntax()))
            .unwrap_or_default()
    }

    /// Insert a directive at the start of every mapped range of `tree`.
    ///
    /// Ranges wholly before the leading version line are skipped and the
    /// rest are clamped to start after it. Resources missing from `contents`
    /// get no directive. Without any qualifying range the input tree is
    /// returned as is.
    pub fn inject(
        &self,
        tree: &Tree,
        map: &SourceMap,
        contents: &impl ContentProvider,
    ) -> Result<Injection> {
        let min = u32::from(self.min_insert_offset(tree));
        let len = u32::from(tree.len());

        let mut ids: IndexMap<ResourceId, u32> = IndexMap::new();
        let mut indexes: HashMap<ResourceId, LineIndex> = HashMap::new();
        let mut directives: BTreeMap<TextSize, String> = BTreeMap::new();

        for range in map.ranges() {
            if range.generated_start >= range.generated_end || range.generated_end <= min {
                continue;
            }
            let clamped = range.generated_start.max(min);
            if clamped >= len {
                continue;
            }
            // the map is authoritative at the clamped offset, not the range
            let Some(location) = map.query(clamped) else {
                continue;
            };
            let Some(content) = contents.content(&location.resource) else {
                warn!("No content for {}; skipping its line directive", location.resource);
                continue;
            };
            let line = indexes
                .entry(location.resource.clone())
                .or_insert_with(|| LineIndex::new(content))
                .line(location.offset);

            let next_id = ids.len() as u32;
            let id = *ids.entry(location.resource.clone()).or_insert(next_id);

            let Some(leaf) = tree.token_at_offset(TextSize::from(clamped)) else {
                continue;
            };
            let starts_line = leaf
                .prev_token()
                .is_none_or(|prev| prev.kind() == ShaderSyntaxKind::Newline);
            let directive = format!(
                "{}{} {} {}\n",
                if starts_line { "" } else { "\n" },
                self.marker,
                line,
                id
            );
            trace!("{} at {} -> {}:{}", self.marker, clamped, location.resource, line);
            // later ranges win on collisions
            directives.insert(leaf.text_range().start(), directive);
        }

        let resource_paths: IndexMap<u32, ResourceId> =
            ids.into_iter().map(|(resource, id)| (id, resource)).collect();

        if directives.is_empty() {
            return Ok(Injection {
                tree: tree.clone(),
                resource_paths,
            });
        }

        let mut editor = tree.edit();
        for (offset, directive) in &directives {
            editor.insert(*offset, directive.as_str());
        }
        let tree = editor.commit()?;
        debug!(
            "Injected {} line directives for {} resources",
            directives.len(),
            resource_paths.len()
        );
        Ok(Injection {
            tree,
            resource_paths,
        })
    }
}
