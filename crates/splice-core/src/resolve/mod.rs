//! Resource resolution for `@import` references
//!
//! A [`ResourceResolver`] turns the quoted text of an import into a parsed
//! [`Resource`]. Failures are values ([`Diagnostic`]), never errors: the
//! preprocessor degrades them to warning comments and keeps going.
//!
//! # Reference grammar
//!
//! Checked in this order:
//!
//! 1. empty or whitespace-only: [`DiagnosticKind::EmptyReference`]
//! 2. no `/` and no `:`: bare file name under [`ResolverOptions::include_dir`]
//!    in the default namespace
//! 3. contains `:`: absolute `namespace:path`
//! 4. starts with `./` or `../` and a `relative_to` resource is known:
//!    relative to that resource's directory, same namespace
//! 5. anything else: a path in the default namespace
//!
//! Every path is normalized against a virtual root. `.` segments vanish and
//! `..` pops a segment but can never climb above the root.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use splice_core::cst::Schema;
//! use splice_core::resolve::{MemoryStore, ResolverOptions, ResourceResolver, StoreResolver};
//!
//! # async fn example() {
//! let store = MemoryStore::new();
//! store.insert_str("shader:include/common.glsl", "float pi = 3.14159;\n");
//!
//! let resolver = StoreResolver::new(store, ResolverOptions::default());
//! let schema = Arc::new(Schema::glsl());
//! let resource = resolver.resolve("common.glsl", None, &schema).await.unwrap();
//! assert_eq!(resource.id.to_string(), "shader:include/common.glsl");
//! # }
//! ```

mod reference;
mod store;

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::cst::{Schema, Tree};

pub use reference::{normalize_path, resolve_reference};
pub use store::{ContentStore, FsStore, MemoryStore};

/// Namespace used when a reference names none
pub const DEFAULT_NAMESPACE: &str = "shader";

/// Sub-location searched for bare file names
pub const DEFAULT_INCLUDE_DIR: &str = "include";

/// Identity of a resolvable resource: a namespace plus a normalized path
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ResourceId {
    namespace: String,
    path: String,
}

impl ResourceId {
    /// Build an id from parts. The path is taken as given; use
    /// [`normalize_path`] first for untrusted input.
    pub fn new(namespace: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            path: path.into(),
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Directory part of the path (empty at the root)
    pub fn dir(&self) -> &str {
        match self.path.rfind('/') {
            Some(idx) => &self.path[..idx],
            None => "",
        }
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.namespace, self.path)
    }
}

impl FromStr for ResourceId {
    type Err = Diagnostic;

    /// Parse the canonical `namespace:path` form
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (namespace, _) = s
            .split_once(':')
            .ok_or_else(|| Diagnostic::malformed(s, None, "expected 'namespace:path'"))?;
        if namespace.is_empty() {
            return Err(Diagnostic::malformed(s, None, "empty namespace"));
        }
        resolve_reference(s, None, &ResolverOptions::default())
    }
}

/// A resolved unit of source text plus its parse tree
#[derive(Debug, Clone)]
pub struct Resource {
    pub id: ResourceId,
    pub content: Arc<str>,
    pub tree: Tree,
}

impl Resource {
    pub fn parse(id: ResourceId, content: impl Into<Arc<str>>, schema: Arc<Schema>) -> Self {
        let content = content.into();
        let tree = Tree::parse(&content, schema);
        Self { id, content, tree }
    }
}

/// Why a reference could not be turned into a resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DiagnosticKind {
    EmptyReference,
    MalformedReference,
    NotFound,
    EmptyContent,
    ImportCycle,
    DepthExceeded,
    /// The content store itself failed (I/O fault)
    StoreFailure,
}

impl DiagnosticKind {
    /// Short phrase used in inline warning comments
    pub fn reason(&self) -> &'static str {
        match self {
            DiagnosticKind::EmptyReference => "is empty",
            DiagnosticKind::MalformedReference => "is malformed",
            DiagnosticKind::NotFound => "not found",
            DiagnosticKind::EmptyContent => "resolved to empty content",
            DiagnosticKind::ImportCycle => "forms an import cycle",
            DiagnosticKind::DepthExceeded => "exceeds the maximum import depth",
            DiagnosticKind::StoreFailure => "could not be loaded",
        }
    }

    /// Protocol-level faults that fail the whole preprocessing run
    pub fn is_fatal(&self) -> bool {
        matches!(self, DiagnosticKind::StoreFailure)
    }
}

/// A failed reference, reported alongside the output
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Diagnostic {
    pub reference: String,
    pub kind: DiagnosticKind,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub relative_to: Option<ResourceId>,
}

impl Diagnostic {
    pub fn new(
        reference: impl Into<String>,
        kind: DiagnosticKind,
        relative_to: Option<&ResourceId>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            reference: reference.into(),
            kind,
            message: message.into(),
            relative_to: relative_to.cloned(),
        }
    }

    pub fn empty_reference(relative_to: Option<&ResourceId>) -> Self {
        Self::new(
            "",
            DiagnosticKind::EmptyReference,
            relative_to,
            "empty import reference",
        )
    }

    pub fn malformed(
        reference: &str,
        relative_to: Option<&ResourceId>,
        detail: impl fmt::Display,
    ) -> Self {
        Self::new(
            reference,
            DiagnosticKind::MalformedReference,
            relative_to,
            format!("malformed import reference '{reference}': {detail}"),
        )
    }

    pub fn not_found(reference: &str, id: &ResourceId, relative_to: Option<&ResourceId>) -> Self {
        Self::new(
            reference,
            DiagnosticKind::NotFound,
            relative_to,
            format!("import '{reference}' not found (looked for {id})"),
        )
    }

    pub fn empty_content(reference: &str, id: &ResourceId, relative_to: Option<&ResourceId>) -> Self {
        Self::new(
            reference,
            DiagnosticKind::EmptyContent,
            relative_to,
            format!("import '{reference}' resolved to {id}, which is empty"),
        )
    }

    pub fn store_failure(
        reference: &str,
        relative_to: Option<&ResourceId>,
        error: impl fmt::Display,
    ) -> Self {
        Self::new(
            reference,
            DiagnosticKind::StoreFailure,
            relative_to,
            format!("failed to load import '{reference}': {error}"),
        )
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.relative_to {
            Some(from) => write!(f, "{} (in {})", self.message, from),
            None => f.write_str(&self.message),
        }
    }
}

/// Explicit resolution settings; there is no global default namespace
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolverOptions {
    pub default_namespace: String,
    /// Sub-location for bare file names, relative to the namespace root
    pub include_dir: String,
}

impl Default for ResolverOptions {
    fn default() -> Self {
        Self {
            default_namespace: DEFAULT_NAMESPACE.to_string(),
            include_dir: DEFAULT_INCLUDE_DIR.to_string(),
        }
    }
}

/// Turns import references into parsed resources
///
/// Implementations must be usable from concurrent preprocessing runs and
/// treat their backing content as read-only.
#[async_trait::async_trait]
pub trait ResourceResolver: Send + Sync {
    /// Resolve `reference`, optionally relative to the importing resource.
    /// The content is parsed with `schema`, the root document's schema.
    async fn resolve(
        &self,
        reference: &str,
        relative_to: Option<&ResourceId>,
        schema: &Arc<Schema>,
    ) -> Result<Resource, Diagnostic>;
}

#[async_trait::async_trait]
impl<R: ResourceResolver + ?Sized> ResourceResolver for Arc<R> {
    async fn resolve(
        &self,
        reference: &str,
        relative_to: Option<&ResourceId>,
        schema: &Arc<Schema>,
    ) -> Result<Resource, Diagnostic> {
        (**self).resolve(reference, relative_to, schema).await
    }
}

/// [`ResourceResolver`] implementing the reference grammar over a
/// [`ContentStore`]
#[derive(Debug, Clone)]
pub struct StoreResolver<S> {
    store: S,
    options: ResolverOptions,
}

impl<S: ContentStore> StoreResolver<S> {
    pub fn new(store: S, options: ResolverOptions) -> Self {
        Self { store, options }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn options(&self) -> &ResolverOptions {
        &self.options
    }
}

#[async_trait::async_trait]
impl<S: ContentStore> ResourceResolver for StoreResolver<S> {
    async fn resolve(
        &self,
        reference: &str,
        relative_to: Option<&ResourceId>,
        schema: &Arc<Schema>,
    ) -> Result<Resource, Diagnostic> {
        let id = resolve_reference(reference, relative_to, &self.options)?;
        trace!("Reference '{}' maps to {}", reference, id);

        match self.store.load(&id).await {
            Ok(Some(content)) if content.is_empty() => {
                Err(Diagnostic::empty_content(reference, &id, relative_to))
            }
            Ok(Some(content)) => {
                debug!("Resolved '{}' to {} ({} bytes)", reference, id, content.len());
                Ok(Resource::parse(id, content, schema.clone()))
            }
            Ok(None) => Err(Diagnostic::not_found(reference, &id, relative_to)),
            Err(err) => Err(Diagnostic::store_failure(reference, relative_to, err)),
        }
    }
}
