//! Schema driving the shader lexer and structural parser
//!
//! A [`Schema`] is immutable configuration: which comment styles exist, which
//! characters mark directive-like tags, which identifiers are keywords (and in
//! which category), and the priority-ranked structural patterns that turn
//! runs of tokens and blocks into typed nodes.
//!
//! Build one with [`Schema::builder`] or take the stock GLSL flavour from
//! [`Schema::glsl`], wrap it in an `Arc`, and reuse it for every parse.

use std::collections::HashMap;

use indexmap::IndexMap;

use super::ShaderSyntaxKind;

/// Comment syntax recognised by the lexer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommentStyle {
    /// Runs to the end of the line, e.g. `//`
    Line(String),
    /// Delimited, e.g. `/*` .. `*/`
    Block { open: String, close: String },
}

/// One step of a structural pattern
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Matcher {
    /// A tag leaf; `Some(name)` restricts the identifier after the prefix
    Tag(Option<String>),
    /// A quoted string leaf
    QuotedString,
    /// All remaining leaves up to the end of the line (possibly none)
    RestOfLine,
    /// A plain identifier
    Ident,
    /// A keyword belonging to the named category
    Keyword(String),
    /// A keyword with exactly this text
    KeywordText(String),
    /// A delimited block of the given kind
    Block(ShaderSyntaxKind),
    /// The first alternative that matches
    AnyOf(Vec<Matcher>),
}

/// A structural pattern: when every matcher is satisfied in order, the
/// consumed elements are wrapped in a node of `kind`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pattern {
    pub name: String,
    pub kind: ShaderSyntaxKind,
    pub priority: i32,
    pub matchers: Vec<Matcher>,
    /// When set, the match may not cross a newline
    pub single_line: bool,
}

impl Pattern {
    pub fn new(name: impl Into<String>, kind: ShaderSyntaxKind, matchers: Vec<Matcher>) -> Self {
        Self {
            name: name.into(),
            kind,
            priority: 0,
            matchers,
            single_line: false,
        }
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn single_line(mut self) -> Self {
        self.single_line = true;
        self
    }
}

/// Immutable lexing and pattern configuration shared by every parse
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schema {
    comment_styles: Vec<CommentStyle>,
    tag_prefixes: Vec<char>,
    keyword_categories: IndexMap<String, Vec<String>>,
    keyword_index: HashMap<String, String>,
    /// Sorted by descending priority; ties keep declaration order
    patterns: Vec<Pattern>,
}

impl Schema {
    pub fn builder() -> SchemaBuilder {
        SchemaBuilder::default()
    }

    /// Stock schema for GLSL-style sources with `@import` directives
    pub fn glsl() -> Self {
        Self::builder()
            .line_comment("//")
            .block_comment("/*", "*/")
            .tag_prefix('#')
            .tag_prefix('@')
            .keywords("types", GLSL_TYPES.iter().copied())
            .keywords("qualifiers", GLSL_QUALIFIERS.iter().copied())
            .keywords("control", GLSL_CONTROL.iter().copied())
            .pattern(
                Pattern::new(
                    "import",
                    ShaderSyntaxKind::ImportDirective,
                    vec![Matcher::Tag(Some("import".into())), Matcher::QuotedString],
                )
                .with_priority(100)
                .single_line(),
            )
            .pattern(
                Pattern::new(
                    "directive",
                    ShaderSyntaxKind::Directive,
                    vec![Matcher::Tag(None), Matcher::RestOfLine],
                )
                .with_priority(50)
                .single_line(),
            )
            .pattern(
                Pattern::new(
                    "function",
                    ShaderSyntaxKind::Function,
                    vec![
                        Matcher::AnyOf(vec![Matcher::Keyword("types".into()), Matcher::Ident]),
                        Matcher::Ident,
                        Matcher::Block(ShaderSyntaxKind::ParenBlock),
                        Matcher::Block(ShaderSyntaxKind::BraceBlock),
                    ],
                )
                .with_priority(40),
            )
            .pattern(
                Pattern::new(
                    "struct",
                    ShaderSyntaxKind::Struct,
                    vec![
                        Matcher::KeywordText("struct".into()),
                        Matcher::Ident,
                        Matcher::Block(ShaderSyntaxKind::BraceBlock),
                    ],
                )
                .with_priority(30),
            )
            .build()
    }

    pub fn comment_styles(&self) -> &[CommentStyle] {
        &self.comment_styles
    }

    pub fn tag_prefixes(&self) -> &[char] {
        &self.tag_prefixes
    }

    pub fn is_tag_prefix(&self, c: char) -> bool {
        self.tag_prefixes.contains(&c)
    }

    /// Category of a keyword, `None` for plain identifiers
    pub fn keyword_category(&self, word: &str) -> Option<&str> {
        self.keyword_index.get(word).map(String::as_str)
    }

    pub fn is_keyword(&self, word: &str) -> bool {
        self.keyword_index.contains_key(word)
    }

    pub fn keyword_categories(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.keyword_categories
            .iter()
            .map(|(name, words)| (name.as_str(), words.as_slice()))
    }

    /// Patterns in match order (highest priority first)
    pub fn patterns(&self) -> &[Pattern] {
        &self.patterns
    }

    /// Tag text without its prefix character, e.g. `#version` -> `version`
    pub fn tag_name<'t>(&self, tag: &'t str) -> &'t str {
        match tag.chars().next() {
            Some(c) if self.is_tag_prefix(c) => &tag[c.len_utf8()..],
            _ => tag,
        }
    }
}

impl Default for Schema {
    fn default() -> Self {
        Self::glsl()
    }
}

/// Fluent builder for [`Schema`]
#[derive(Debug, Clone, Default)]
pub struct SchemaBuilder {
    comment_styles: Vec<CommentStyle>,
    tag_prefixes: Vec<char>,
    keyword_categories: IndexMap<String, Vec<String>>,
    patterns: Vec<Pattern>,
}

impl SchemaBuilder {
    pub fn line_comment(mut self, prefix: impl Into<String>) -> Self {
        self.comment_styles.push(CommentStyle::Line(prefix.into()));
        self
    }

    pub fn block_comment(mut self, open: impl Into<String>, close: impl Into<String>) -> Self {
        self.comment_styles.push(CommentStyle::Block {
            open: open.into(),
            close: close.into(),
        });
        self
    }

    pub fn tag_prefix(mut self, prefix: char) -> Self {
        if !self.tag_prefixes.contains(&prefix) {
            self.tag_prefixes.push(prefix);
        }
        self
    }

    /// Add words to a keyword category. A word already claimed by an earlier
    /// category stays there.
    pub fn keywords<I, S>(mut self, category: impl Into<String>, words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.keyword_categories
            .entry(category.into())
            .or_default()
            .extend(words.into_iter().map(Into::into));
        self
    }

    pub fn pattern(mut self, pattern: Pattern) -> Self {
        self.patterns.push(pattern);
        self
    }

    pub fn build(self) -> Schema {
        let mut keyword_index = HashMap::new();
        for (category, words) in &self.keyword_categories {
            for word in words {
                keyword_index
                    .entry(word.clone())
                    .or_insert_with(|| category.clone());
            }
        }

        let mut patterns = self.patterns;
        // stable: equal priorities keep declaration order
        patterns.sort_by(|a, b| b.priority.cmp(&a.priority));

        Schema {
            comment_styles: self.comment_styles,
            tag_prefixes: self.tag_prefixes,
            keyword_categories: self.keyword_categories,
            keyword_index,
            patterns,
        }
    }
}

const GLSL_TYPES: &[&str] = &[
    "void", "bool", "int", "uint", "float", "double", "vec2", "vec3", "vec4", "ivec2", "ivec3",
    "ivec4", "uvec2", "uvec3", "uvec4", "bvec2", "bvec3", "bvec4", "dvec2", "dvec3", "dvec4",
    "mat2", "mat3", "mat4", "mat2x2", "mat2x3", "mat2x4", "mat3x2", "mat3x3", "mat3x4", "mat4x2",
    "mat4x3", "mat4x4", "sampler1D", "sampler2D", "sampler3D", "samplerCube", "sampler2DArray",
    "sampler2DShadow", "samplerCubeShadow", "isampler2D", "usampler2D", "sampler2DMS",
    "samplerBuffer", "image2D", "image3D", "uimage2D", "iimage2D",
];

const GLSL_QUALIFIERS: &[&str] = &[
    "in", "out", "inout", "uniform", "buffer", "shared", "const", "layout", "flat", "smooth",
    "noperspective", "centroid", "sample", "patch", "highp", "mediump", "lowp", "precision",
    "invariant", "precise", "coherent", "volatile", "restrict", "readonly", "writeonly",
    "attribute", "varying",
];

const GLSL_CONTROL: &[&str] = &[
    "if", "else", "for", "while", "do", "switch", "case", "default", "return", "break",
    "continue", "discard", "struct", "true", "false",
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn glsl_schema_orders_patterns_by_priority() {
        let schema = Schema::glsl();
        let names: Vec<_> = schema.patterns().iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["import", "directive", "function", "struct"]);
    }

    #[test]
    fn keyword_categories_are_indexed() {
        let schema = Schema::glsl();
        assert_eq!(schema.keyword_category("vec3"), Some("types"));
        assert_eq!(schema.keyword_category("uniform"), Some("qualifiers"));
        assert_eq!(schema.keyword_category("return"), Some("control"));
        assert_eq!(schema.keyword_category("albedo"), None);
    }

    #[test]
    fn first_category_wins_for_duplicate_words() {
        let schema = Schema::builder()
            .keywords("a", ["x"])
            .keywords("b", ["x", "y"])
            .build();
        assert_eq!(schema.keyword_category("x"), Some("a"));
        assert_eq!(schema.keyword_category("y"), Some("b"));
    }

    #[test]
    fn tag_name_strips_prefix() {
        let schema = Schema::glsl();
        assert_eq!(schema.tag_name("#version"), "version");
        assert_eq!(schema.tag_name("@import"), "import");
        assert_eq!(schema.tag_name("plain"), "plain");
    }

    #[test]
    fn equal_priorities_keep_declaration_order() {
        let schema = Schema::builder()
            .pattern(Pattern::new("first", ShaderSyntaxKind::Directive, vec![]))
            .pattern(Pattern::new("second", ShaderSyntaxKind::Struct, vec![]))
            .build();
        let names: Vec<_> = schema.patterns().iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["first", "second"]);
    }
}
