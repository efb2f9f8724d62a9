//! Concrete Syntax Tree (CST) for shader sources
//!
//! A lossless syntax tree built with Rowan. Every byte of the input,
//! including whitespace, comments and malformed text, lives in exactly one
//! leaf, so `Tree::parse(s, schema).text() == s` for any input.
//!
//! ## Architecture
//!
//! - **Schema**: immutable lexing and pattern configuration, shared as
//!   `Arc<Schema>` by every parse.
//! - **Green tree**: immutable, `Send + Sync`, cheap to clone. A [`Tree`]
//!   owns one and can therefore cross await points.
//! - **Red tree**: [`ShaderSyntaxNode`] views with parent pointers, created on
//!   demand from a [`Tree`]. Typed wrappers live in [`ast`].
//! - **Editor**: batches insertions and replacements against one tree and
//!   commits them into a new one.
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use splice_core::cst::{Schema, Tree};
//!
//! let tree = Tree::parse("#version 330\n@import \"common\"\n", Arc::new(Schema::glsl()));
//! let import = &tree.imports()[0];
//! assert_eq!(import.reference().as_deref(), Some("common"));
//!
//! let mut editor = tree.edit();
//! editor.replace(import.syntax(), "// gone");
//! let edited = editor.commit()?;
//! assert_eq!(edited.text(), "#version 330\n// gone\n");
//! ```

mod editor;
mod language;
mod lexer;
mod parser;
mod schema;
mod syntax_kind;
mod tree;

pub mod ast;

pub use editor::{Editor, Position};
pub use language::{ShaderLanguage, ShaderSyntaxElement, ShaderSyntaxNode, ShaderSyntaxToken};
pub use lexer::{CstLexResult, CstSpan, LexerError, ShaderToken, lex_with_trivia};
pub use parser::parse_shader;
pub use schema::{CommentStyle, Matcher, Pattern, Schema, SchemaBuilder};
pub use syntax_kind::ShaderSyntaxKind;
pub use tree::Tree;
