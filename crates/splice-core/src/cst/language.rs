//! Rowan language implementation for the shader CST
//!
//! This module implements the `rowan::Language` trait, which connects
//! our ShaderSyntaxKind enum to Rowan's generic CST infrastructure.

use rowan::Language;

use super::ShaderSyntaxKind;

/// Language implementation for C-like shader sources
///
/// This is a zero-sized type that implements `rowan::Language` to provide
/// the connection between our syntax kinds and Rowan's generic tree types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ShaderLanguage;

impl Language for ShaderLanguage {
    type Kind = ShaderSyntaxKind;

    fn kind_from_raw(raw: rowan::SyntaxKind) -> Self::Kind {
        match raw.0 {
            // Trivia
            0 => ShaderSyntaxKind::Whitespace,
            1 => ShaderSyntaxKind::CommentLine,
            2 => ShaderSyntaxKind::CommentBlock,
            3 => ShaderSyntaxKind::Newline,

            // Leaves (10-99)
            10 => ShaderSyntaxKind::Tag,
            11 => ShaderSyntaxKind::Ident,
            12 => ShaderSyntaxKind::Keyword,
            13 => ShaderSyntaxKind::Number,
            14 => ShaderSyntaxKind::String,

            // Punctuation (100-149)
            100 => ShaderSyntaxKind::LParen,
            101 => ShaderSyntaxKind::RParen,
            102 => ShaderSyntaxKind::LBrace,
            103 => ShaderSyntaxKind::RBrace,
            104 => ShaderSyntaxKind::LBracket,
            105 => ShaderSyntaxKind::RBracket,
            106 => ShaderSyntaxKind::Semicolon,
            107 => ShaderSyntaxKind::Comma,
            108 => ShaderSyntaxKind::Punct,

            // Structure nodes (200-299)
            200 => ShaderSyntaxKind::Root,
            201 => ShaderSyntaxKind::Directive,
            202 => ShaderSyntaxKind::ImportDirective,
            203 => ShaderSyntaxKind::Function,
            204 => ShaderSyntaxKind::Struct,
            210 => ShaderSyntaxKind::ParenBlock,
            211 => ShaderSyntaxKind::BraceBlock,
            212 => ShaderSyntaxKind::BracketBlock,

            // Fallback leaves (400+)
            400 => ShaderSyntaxKind::Error,
            401 => ShaderSyntaxKind::Unknown,

            _ => {
                tracing::warn!("Unknown syntax kind: {}", raw.0);
                ShaderSyntaxKind::Unknown
            }
        }
    }

    fn kind_to_raw(kind: Self::Kind) -> rowan::SyntaxKind {
        rowan::SyntaxKind(kind as u16)
    }
}

/// Red-tree node over the shader language
pub type ShaderSyntaxNode = rowan::SyntaxNode<ShaderLanguage>;
/// Red-tree leaf over the shader language
pub type ShaderSyntaxToken = rowan::SyntaxToken<ShaderLanguage>;
/// Either a node or a leaf
pub type ShaderSyntaxElement = rowan::SyntaxElement<ShaderLanguage>;
