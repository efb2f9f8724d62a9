//! Typed AST layer over CST
//!
//! This module provides ergonomic, type-safe wrappers over the raw CST nodes.
//! Each wrapper implements a `cast()` method to safely convert from CST nodes.
//!
//! # Example
//!
//! ```ignore
//! use splice_core::cst::{Tree, ast::{AstNode, ImportDirective}};
//!
//! let tree = Tree::parse("@import \"lighting\"\n", schema);
//! let import = &tree.imports()[0];
//! assert_eq!(import.reference().unwrap(), "lighting");
//! ```

use rowan::TextRange;

use super::{ShaderSyntaxElement, ShaderSyntaxKind, ShaderSyntaxNode, ShaderSyntaxToken};

/// Helper trait for casting CST nodes to typed wrappers
pub trait AstNode: Sized {
    fn can_cast(kind: ShaderSyntaxKind) -> bool;
    fn cast(node: ShaderSyntaxNode) -> Option<Self>;
    fn syntax(&self) -> &ShaderSyntaxNode;
}

macro_rules! ast_node {
    ($(#[$meta:meta])* $name:ident, $($kind:ident)|+) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq)]
        pub struct $name {
            syntax: ShaderSyntaxNode,
        }

        impl AstNode for $name {
            fn can_cast(kind: ShaderSyntaxKind) -> bool {
                matches!(kind, $(ShaderSyntaxKind::$kind)|+)
            }

            fn cast(node: ShaderSyntaxNode) -> Option<Self> {
                if Self::can_cast(node.kind()) {
                    Some(Self { syntax: node })
                } else {
                    None
                }
            }

            fn syntax(&self) -> &ShaderSyntaxNode {
                &self.syntax
            }
        }
    };
}

/// Helper function to find first child of a specific kind
fn child_of_kind(parent: &ShaderSyntaxNode, kind: ShaderSyntaxKind) -> Option<ShaderSyntaxNode> {
    parent.children().find(|n| n.kind() == kind)
}

/// Helper function to find first token of a specific kind
fn token_of_kind(parent: &ShaderSyntaxNode, kind: ShaderSyntaxKind) -> Option<ShaderSyntaxToken> {
    direct_tokens(parent).find(|t| t.kind() == kind)
}

fn direct_tokens(parent: &ShaderSyntaxNode) -> impl Iterator<Item = ShaderSyntaxToken> + use<> {
    parent
        .children_with_tokens()
        .filter_map(|e| e.into_token())
}

/// Tag text without its prefix character
fn tag_name(tag: &ShaderSyntaxToken) -> String {
    let text = tag.text();
    let mut chars = text.chars();
    match chars.next() {
        Some(c) if !c.is_ascii_alphanumeric() && c != '_' => chars.as_str().to_string(),
        _ => text.to_string(),
    }
}

/// Name used by [`super::Tree::query`] for name filtering
pub fn node_name(node: &ShaderSyntaxNode) -> Option<String> {
    match node.kind() {
        ShaderSyntaxKind::Directive | ShaderSyntaxKind::ImportDirective => {
            token_of_kind(node, ShaderSyntaxKind::Tag).map(|t| tag_name(&t))
        }
        ShaderSyntaxKind::Function => FunctionDef::cast(node.clone()).and_then(|f| f.name()),
        ShaderSyntaxKind::Struct => StructDef::cast(node.clone()).and_then(|s| s.name()),
        _ => None,
    }
}

// ============================================================================
// Document
// ============================================================================

ast_node!(
    /// Root of a parsed shader
    Document,
    Root
);

impl Document {
    pub fn directives(&self) -> impl Iterator<Item = Directive> + use<> {
        self.syntax.descendants().filter_map(Directive::cast)
    }

    pub fn imports(&self) -> impl Iterator<Item = ImportDirective> + use<> {
        self.syntax.descendants().filter_map(ImportDirective::cast)
    }

    pub fn functions(&self) -> impl Iterator<Item = FunctionDef> + use<> {
        self.syntax.children().filter_map(FunctionDef::cast)
    }

    pub fn structs(&self) -> impl Iterator<Item = StructDef> + use<> {
        self.syntax.children().filter_map(StructDef::cast)
    }

    /// First significant child, skipping whitespace, comments and newlines
    pub fn first_significant(&self) -> Option<ShaderSyntaxElement> {
        self.syntax.children_with_tokens().find(|e| {
            let kind = e.kind();
            !kind.is_trivia() && kind != ShaderSyntaxKind::Newline
        })
    }
}

// ============================================================================
// Directives
// ============================================================================

ast_node!(
    /// Tag followed by the rest of its line: `#version 330 core`
    Directive,
    Directive
);

impl Directive {
    pub fn tag(&self) -> Option<ShaderSyntaxToken> {
        token_of_kind(&self.syntax, ShaderSyntaxKind::Tag)
    }

    /// Tag name without the prefix, e.g. `version`
    pub fn name(&self) -> Option<String> {
        self.tag().map(|t| tag_name(&t))
    }

    /// Everything after the tag, trimmed
    pub fn arguments(&self) -> String {
        let Some(tag) = self.tag() else {
            return String::new();
        };
        let text = self.syntax.text().to_string();
        let offset = usize::from(tag.text_range().end() - self.syntax.text_range().start());
        text[offset..].trim().to_string()
    }
}

ast_node!(
    /// Import directive: `@import "namespace:path"`
    ImportDirective,
    ImportDirective
);

impl ImportDirective {
    pub fn tag(&self) -> Option<ShaderSyntaxToken> {
        token_of_kind(&self.syntax, ShaderSyntaxKind::Tag)
    }

    pub fn reference_token(&self) -> Option<ShaderSyntaxToken> {
        token_of_kind(&self.syntax, ShaderSyntaxKind::String)
    }

    /// Referenced resource with the surrounding quotes removed
    pub fn reference(&self) -> Option<String> {
        self.reference_token().map(|t| {
            let text = t.text();
            if text.len() >= 2 && text.starts_with('"') && text.ends_with('"') {
                text[1..text.len() - 1].to_string()
            } else {
                text.to_string()
            }
        })
    }

    pub fn text_range(&self) -> TextRange {
        self.syntax.text_range()
    }
}

// ============================================================================
// Definitions
// ============================================================================

ast_node!(
    /// Function definition: type, name, parameter block, body block
    FunctionDef,
    Function
);

impl FunctionDef {
    fn words(&self) -> impl Iterator<Item = ShaderSyntaxToken> + use<> {
        direct_tokens(&self.syntax)
            .filter(|t| matches!(t.kind(), ShaderSyntaxKind::Ident | ShaderSyntaxKind::Keyword))
    }

    pub fn return_type(&self) -> Option<String> {
        self.words().next().map(|t| t.text().to_string())
    }

    pub fn name(&self) -> Option<String> {
        self.words().nth(1).map(|t| t.text().to_string())
    }

    pub fn params(&self) -> Option<Block> {
        child_of_kind(&self.syntax, ShaderSyntaxKind::ParenBlock).and_then(Block::cast)
    }

    pub fn body(&self) -> Option<Block> {
        child_of_kind(&self.syntax, ShaderSyntaxKind::BraceBlock).and_then(Block::cast)
    }
}

ast_node!(
    /// Struct definition: `struct Name { ... }`
    StructDef,
    Struct
);

impl StructDef {
    pub fn name(&self) -> Option<String> {
        token_of_kind(&self.syntax, ShaderSyntaxKind::Ident).map(|t| t.text().to_string())
    }

    pub fn body(&self) -> Option<Block> {
        child_of_kind(&self.syntax, ShaderSyntaxKind::BraceBlock).and_then(Block::cast)
    }
}

ast_node!(
    /// Any delimited block: `(..)`, `{..}` or `[..]`
    Block,
    ParenBlock | BraceBlock | BracketBlock
);

impl Block {
    pub fn open_token(&self) -> Option<ShaderSyntaxToken> {
        self.syntax.first_token()
    }

    /// Closing delimiter, absent when the block was never closed
    pub fn close_token(&self) -> Option<ShaderSyntaxToken> {
        let closer = self.syntax.kind().closer()?;
        self.syntax.last_token().filter(|t| {
            t.kind() == closer && t.parent().as_ref() == Some(&self.syntax)
        })
    }

    pub fn is_closed(&self) -> bool {
        self.close_token().is_some()
    }

    /// Range between the delimiters
    pub fn inner_range(&self) -> TextRange {
        let range = self.syntax.text_range();
        let start = self
            .open_token()
            .map(|t| t.text_range().end())
            .unwrap_or(range.start());
        let end = self
            .close_token()
            .map(|t| t.text_range().start())
            .unwrap_or(range.end());
        TextRange::new(start, end)
    }
}
