//! Parsed shader tree
//!
//! A [`Tree`] owns an immutable rowan green tree plus the [`Schema`] it was
//! parsed with. The green tree is `Send + Sync` and cheap to clone, so a
//! `Tree` can be held across await points; red-tree views
//! ([`ShaderSyntaxNode`]) are created on demand and must stay on the current
//! task.

use std::sync::Arc;

use rowan::{GreenNode, TextSize};

use super::ast::{AstNode, Directive, Document, ImportDirective, node_name};
use super::editor::Editor;
use super::lexer::LexerError;
use super::parser::parse_shader;
use super::{Schema, ShaderSyntaxKind, ShaderSyntaxNode, ShaderSyntaxToken};

#[derive(Debug, Clone)]
pub struct Tree {
    green: GreenNode,
    schema: Arc<Schema>,
    errors: Arc<[LexerError]>,
}

impl Tree {
    /// Parse `text` against `schema`. Never fails; see [`Tree::errors`].
    pub fn parse(text: &str, schema: Arc<Schema>) -> Self {
        let (green, errors) = parse_shader(text, &schema);
        if !errors.is_empty() {
            tracing::trace!("Parsed with {} lexer diagnostics", errors.len());
        }
        Self {
            green,
            schema,
            errors: errors.into(),
        }
    }

    pub fn syntax(&self) -> ShaderSyntaxNode {
        ShaderSyntaxNode::new_root(self.green.clone())
    }

    pub fn document(&self) -> Document {
        Document::cast(self.syntax()).unwrap_or_else(|| unreachable!("tree root is always Root"))
    }

    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    /// Lexer diagnostics collected while parsing
    pub fn errors(&self) -> &[LexerError] {
        &self.errors
    }

    /// Render back to text (lossless)
    pub fn text(&self) -> String {
        self.syntax().text().to_string()
    }

    pub fn len(&self) -> TextSize {
        self.green.text_len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == TextSize::from(0)
    }

    /// Leaf containing `offset`. At a boundary between two leaves the one
    /// starting there wins; `None` at or past the end of the text.
    pub fn token_at_offset(&self, offset: TextSize) -> Option<ShaderSyntaxToken> {
        if offset >= self.len() {
            return None;
        }
        self.syntax().token_at_offset(offset).right_biased()
    }

    /// Every node of `kind` (optionally with `name`) in document order
    pub fn query(&self, kind: ShaderSyntaxKind, name: Option<&str>) -> Vec<ShaderSyntaxNode> {
        self.syntax()
            .descendants()
            .filter(|node| node.kind() == kind)
            .filter(|node| name.is_none_or(|n| node_name(node).as_deref() == Some(n)))
            .collect()
    }

    /// Import directives in document order
    pub fn imports(&self) -> Vec<ImportDirective> {
        self.query(ShaderSyntaxKind::ImportDirective, None)
            .into_iter()
            .filter_map(ImportDirective::cast)
            .collect()
    }

    /// A directive named `name` that is the first significant element of the
    /// document, e.g. the leading `#version`
    pub fn leading_directive(&self, name: &str) -> Option<Directive> {
        let first = self.document().first_significant()?;
        let directive = Directive::cast(first.into_node()?)?;
        (directive.name().as_deref() == Some(name)).then_some(directive)
    }

    /// Offset just past the line that `node` ends on (after its newline, or
    /// the end of the text on the last line)
    pub fn end_of_line(&self, node: &ShaderSyntaxNode) -> TextSize {
        let mut token = node.last_token().and_then(|t| t.next_token());
        while let Some(current) = token {
            if current.kind() == ShaderSyntaxKind::Newline {
                return current.text_range().end();
            }
            token = current.next_token();
        }
        self.len()
    }

    /// Start a batch of edits against this tree
    pub fn edit(&self) -> Editor<'_> {
        Editor::new(self)
    }
}

impl PartialEq for Tree {
    fn eq(&self, other: &Self) -> bool {
        self.green == other.green
    }
}

impl Eq for Tree {}
