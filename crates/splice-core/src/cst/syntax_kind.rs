//! Syntax kinds for the shader CST
//!
//! Token kinds (leaves) occupy the low range, structural node kinds start at
//! 200. The numeric values are stable and mirrored in
//! [`ShaderLanguage::kind_from_raw`](super::ShaderLanguage).

/// Every token and node kind the shader CST can contain
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u16)]
pub enum ShaderSyntaxKind {
    // Trivia
    Whitespace = 0,
    CommentLine = 1,
    CommentBlock = 2,
    Newline = 3,

    // Leaves (10-99)
    /// Tag prefix glued to an identifier, e.g. `#version` or `@import`
    Tag = 10,
    Ident = 11,
    Keyword = 12,
    Number = 13,
    String = 14,

    // Punctuation (100-149)
    LParen = 100,
    RParen = 101,
    LBrace = 102,
    RBrace = 103,
    LBracket = 104,
    RBracket = 105,
    Semicolon = 106,
    Comma = 107,
    Punct = 108,

    // Structure nodes (200-299)
    Root = 200,
    Directive = 201,
    ImportDirective = 202,
    Function = 203,
    Struct = 204,
    ParenBlock = 210,
    BraceBlock = 211,
    BracketBlock = 212,

    // Fallback leaves (400+)
    /// A closing delimiter without a matching opener
    Error = 400,
    /// A character the lexer does not recognise
    Unknown = 401,
}

impl ShaderSyntaxKind {
    /// Whitespace and comments (newlines are tracked separately)
    pub fn is_trivia(self) -> bool {
        matches!(
            self,
            ShaderSyntaxKind::Whitespace
                | ShaderSyntaxKind::CommentLine
                | ShaderSyntaxKind::CommentBlock
        )
    }

    pub fn is_block(self) -> bool {
        matches!(
            self,
            ShaderSyntaxKind::ParenBlock
                | ShaderSyntaxKind::BraceBlock
                | ShaderSyntaxKind::BracketBlock
        )
    }

    /// Structural nodes produced by a schema pattern
    pub fn is_structural(self) -> bool {
        matches!(
            self,
            ShaderSyntaxKind::Directive
                | ShaderSyntaxKind::ImportDirective
                | ShaderSyntaxKind::Function
                | ShaderSyntaxKind::Struct
        )
    }

    pub fn is_node(self) -> bool {
        self == ShaderSyntaxKind::Root || self.is_block() || self.is_structural()
    }

    /// Block node kind opened by this delimiter
    pub fn block_for_opener(self) -> Option<ShaderSyntaxKind> {
        match self {
            ShaderSyntaxKind::LParen => Some(ShaderSyntaxKind::ParenBlock),
            ShaderSyntaxKind::LBrace => Some(ShaderSyntaxKind::BraceBlock),
            ShaderSyntaxKind::LBracket => Some(ShaderSyntaxKind::BracketBlock),
            _ => None,
        }
    }

    /// Closing delimiter expected by a block kind
    pub fn closer(self) -> Option<ShaderSyntaxKind> {
        match self {
            ShaderSyntaxKind::ParenBlock => Some(ShaderSyntaxKind::RParen),
            ShaderSyntaxKind::BraceBlock => Some(ShaderSyntaxKind::RBrace),
            ShaderSyntaxKind::BracketBlock => Some(ShaderSyntaxKind::RBracket),
            _ => None,
        }
    }

    pub fn is_closer(self) -> bool {
        matches!(
            self,
            ShaderSyntaxKind::RParen | ShaderSyntaxKind::RBrace | ShaderSyntaxKind::RBracket
        )
    }
}

impl From<ShaderSyntaxKind> for rowan::SyntaxKind {
    fn from(kind: ShaderSyntaxKind) -> Self {
        rowan::SyntaxKind(kind as u16)
    }
}
