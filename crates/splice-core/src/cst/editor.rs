//! Batched tree editing
//!
//! An [`Editor`] queues insertions and replacements against one [`Tree`].
//! Every position is resolved against that pre-edit tree, and
//! [`Editor::commit`] applies the whole batch in a single rewrite, producing a
//! fresh tree. The source tree is never touched.
//!
//! ```rust,ignore
//! let mut editor = tree.edit();
//! for import in tree.imports() {
//!     editor.replace(import.syntax(), "/* inlined */");
//! }
//! let rewritten = editor.commit()?;
//! ```

use std::fmt;

use rowan::{TextRange, TextSize};

use super::ast::{AstNode, Block};
use super::tree::Tree;
use super::{ShaderSyntaxElement, ShaderSyntaxNode};
use crate::{Result, SpliceError};

/// Where an insertion lands, resolved against the pre-edit tree
#[derive(Debug, Clone)]
pub enum Position {
    /// Immediately before an element
    Before(ShaderSyntaxElement),
    /// Immediately after an element
    After(ShaderSyntaxElement),
    /// Just inside a block's opening delimiter
    StartOf(ShaderSyntaxNode),
    /// Just inside a block's closing delimiter (or at its end when unclosed)
    EndOf(ShaderSyntaxNode),
    /// Explicit offset into the text
    Offset(TextSize),
}

impl Position {
    pub fn resolve(&self) -> TextSize {
        match self {
            Position::Before(element) => element.text_range().start(),
            Position::After(element) => element.text_range().end(),
            Position::StartOf(node) => match Block::cast(node.clone()) {
                Some(block) => block.inner_range().start(),
                None => node.text_range().start(),
            },
            Position::EndOf(node) => match Block::cast(node.clone()) {
                Some(block) => block.inner_range().end(),
                None => node.text_range().end(),
            },
            Position::Offset(offset) => *offset,
        }
    }
}

impl From<TextSize> for Position {
    fn from(offset: TextSize) -> Self {
        Position::Offset(offset)
    }
}

type Transform<'t> = Box<dyn FnOnce(&str) -> String + 't>;

enum Content<'t> {
    Text(String),
    Transform(Transform<'t>),
}

impl fmt::Debug for Content<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Content::Text(text) => f.debug_tuple("Text").field(text).finish(),
            Content::Transform(_) => f.write_str("Transform(..)"),
        }
    }
}

#[derive(Debug)]
struct PendingEdit<'t> {
    range: TextRange,
    content: Content<'t>,
}

/// Queue of edits against one tree; consumed by [`Editor::commit`]
#[derive(Debug)]
pub struct Editor<'t> {
    tree: &'t Tree,
    edits: Vec<PendingEdit<'t>>,
}

impl<'t> Editor<'t> {
    pub(crate) fn new(tree: &'t Tree) -> Self {
        Self {
            tree,
            edits: Vec::new(),
        }
    }

    pub fn insert(&mut self, position: impl Into<Position>, text: impl Into<String>) -> &mut Self {
        let offset = position.into().resolve();
        self.push(TextRange::empty(offset), Content::Text(text.into()))
    }

    /// Replace a node's full text
    pub fn replace(&mut self, node: &ShaderSyntaxNode, text: impl Into<String>) -> &mut Self {
        self.replace_range(node.text_range(), text)
    }

    pub fn replace_range(&mut self, range: TextRange, text: impl Into<String>) -> &mut Self {
        self.push(range, Content::Text(text.into()))
    }

    /// Replace a node with the result of `transform` applied to its current text
    pub fn replace_with<F>(&mut self, node: &ShaderSyntaxNode, transform: F) -> &mut Self
    where
        F: FnOnce(&str) -> String + 't,
    {
        self.push(node.text_range(), Content::Transform(Box::new(transform)))
    }

    pub fn delete(&mut self, node: &ShaderSyntaxNode) -> &mut Self {
        self.replace_range(node.text_range(), String::new())
    }

    pub fn len(&self) -> usize {
        self.edits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edits.is_empty()
    }

    fn push(&mut self, range: TextRange, content: Content<'t>) -> &mut Self {
        self.edits.push(PendingEdit { range, content });
        self
    }

    /// Apply every queued edit in one rewrite and parse the result with the
    /// source tree's schema.
    ///
    /// Insertions at the same offset keep queue order; an insertion at the
    /// start of a replaced range lands before the replacement. Overlapping
    /// replacements fail with [`SpliceError::EditConflict`]; offsets past the
    /// end or inside a character fail with [`SpliceError::OffsetOutOfRange`].
    pub fn commit(self) -> Result<Tree> {
        let source = self.tree.text();
        let len = u32::from(self.tree.len());

        let mut edits = self.edits;
        // offsets must land on char boundaries inside the text
        let misplaced = edits
            .iter()
            .flat_map(|e| [e.range.start(), e.range.end()])
            .find(|&offset| !source.is_char_boundary(usize::from(offset)));
        if let Some(offset) = misplaced {
            return Err(SpliceError::OffsetOutOfRange {
                offset: u32::from(offset),
                len,
            });
        }
        // stable: equal ranges keep queue order
        edits.sort_by_key(|e| (e.range.start(), e.range.end()));

        let mut output = String::with_capacity(source.len());
        let mut cursor = TextSize::from(0);
        let count = edits.len();
        for edit in edits {
            if edit.range.start() < cursor {
                return Err(SpliceError::edit_conflict(format!(
                    "edit at {:?} overlaps a previous edit ending at {}",
                    edit.range,
                    u32::from(cursor)
                )));
            }
            output.push_str(&source[TextRange::new(cursor, edit.range.start())]);
            match edit.content {
                Content::Text(text) => output.push_str(&text),
                Content::Transform(transform) => output.push_str(&transform(&source[edit.range])),
            }
            cursor = edit.range.end();
        }
        output.push_str(&source[TextRange::new(cursor, TextSize::from(len))]);

        tracing::debug!("Committed {} edits ({} -> {} bytes)", count, len, output.len());
        Ok(Tree::parse(&output, self.tree.schema().clone()))
    }
}
