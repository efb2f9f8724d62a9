//! CST-aware lexer that preserves all trivia (whitespace, comments)
//!
//! The lexer is driven by a [`Schema`]: comment delimiters, tag prefixes and
//! keyword categories all come from it. Every byte of the input ends up in
//! exactly one token, which is what makes `parse(source).text() == source`
//! hold for arbitrary (even malformed) shader text.

use std::ops::Range;

use super::{Schema, ShaderSyntaxKind, schema::CommentStyle};

/// Simple span representing a range in the source
pub type CstSpan = Range<usize>;

/// A lexer error
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LexerError {
    pub message: String,
    pub span: CstSpan,
}

impl LexerError {
    pub fn new(message: impl Into<String>, span: CstSpan) -> Self {
        Self {
            message: message.into(),
            span,
        }
    }
}

/// A token with its syntax kind and span
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShaderToken {
    pub kind: ShaderSyntaxKind,
    pub text: String,
    pub span: CstSpan,
}

impl ShaderToken {
    pub fn new(kind: ShaderSyntaxKind, text: impl Into<String>, span: CstSpan) -> Self {
        Self {
            kind,
            text: text.into(),
            span,
        }
    }
}

/// Result returned by the CST lexer
pub type CstLexResult = (Vec<ShaderToken>, Vec<LexerError>);

/// Lex input preserving ALL trivia for CST construction
///
/// - Preserves whitespace as `Whitespace` tokens
/// - Preserves comments as `CommentLine`/`CommentBlock` tokens
/// - Preserves newlines (`\n`, `\r\n`, `\r`) as `Newline` tokens
///
/// Never fails: problems are reported in the error list and the offending
/// text still becomes a token.
pub fn lex_with_trivia(input: &str, schema: &Schema) -> CstLexResult {
    let mut tokens = Vec::new();
    let mut errors = Vec::new();

    let len = input.len();
    let mut i = 0usize;

    while i < len {
        let Some((current, size)) = next_char(input, i) else {
            break;
        };
        let start = i;

        if let Some((kind, end)) = lex_comment(input, start, schema, &mut errors) {
            tokens.push(ShaderToken::new(kind, &input[start..end], span(start, end)));
            i = end;
            continue;
        }

        match current {
            '\n' => {
                tokens.push(ShaderToken::new(
                    ShaderSyntaxKind::Newline,
                    "\n",
                    span(start, i + size),
                ));
                i += size;
            }
            '\r' => {
                // Handle \r\n as single newline
                let mut end = i + size;
                if let Some(('\n', nl_size)) = next_char(input, end) {
                    end += nl_size;
                }
                tokens.push(ShaderToken::new(
                    ShaderSyntaxKind::Newline,
                    &input[start..end],
                    span(start, end),
                ));
                i = end;
            }

            c if c.is_whitespace() => {
                let end = scan_while(input, i + size, |c| {
                    c.is_whitespace() && c != '\n' && c != '\r'
                });
                tokens.push(ShaderToken::new(
                    ShaderSyntaxKind::Whitespace,
                    &input[start..end],
                    span(start, end),
                ));
                i = end;
            }

            c if schema.is_tag_prefix(c)
                && next_char(input, i + size).is_some_and(|(n, _)| is_ident_start(n)) =>
            {
                let end = scan_while(input, i + size, is_ident_continue);
                tokens.push(ShaderToken::new(
                    ShaderSyntaxKind::Tag,
                    &input[start..end],
                    span(start, end),
                ));
                i = end;
            }

            c if is_ident_start(c) => {
                let end = scan_while(input, i + size, is_ident_continue);
                let word = &input[start..end];
                let kind = if schema.is_keyword(word) {
                    ShaderSyntaxKind::Keyword
                } else {
                    ShaderSyntaxKind::Ident
                };
                tokens.push(ShaderToken::new(kind, word, span(start, end)));
                i = end;
            }

            c if c.is_ascii_digit()
                || (c == '.' && next_char(input, i + size).is_some_and(|(n, _)| n.is_ascii_digit())) =>
            {
                let end = lex_number(input, start);
                tokens.push(ShaderToken::new(
                    ShaderSyntaxKind::Number,
                    &input[start..end],
                    span(start, end),
                ));
                i = end;
            }

            '"' => {
                let (end, string_error) = lex_string(input, start);
                if let Some(err) = string_error {
                    errors.push(err);
                }
                tokens.push(ShaderToken::new(
                    ShaderSyntaxKind::String,
                    &input[start..end],
                    span(start, end),
                ));
                i = end;
            }

            _ => {
                let kind = match current {
                    '(' => ShaderSyntaxKind::LParen,
                    ')' => ShaderSyntaxKind::RParen,
                    '{' => ShaderSyntaxKind::LBrace,
                    '}' => ShaderSyntaxKind::RBrace,
                    '[' => ShaderSyntaxKind::LBracket,
                    ']' => ShaderSyntaxKind::RBracket,
                    ';' => ShaderSyntaxKind::Semicolon,
                    ',' => ShaderSyntaxKind::Comma,
                    c if c.is_ascii_punctuation() => ShaderSyntaxKind::Punct,
                    c => {
                        errors.push(LexerError::new(
                            format!("Unexpected character '{c}'"),
                            span(start, i + size),
                        ));
                        ShaderSyntaxKind::Unknown
                    }
                };
                tokens.push(ShaderToken::new(
                    kind,
                    &input[start..i + size],
                    span(start, i + size),
                ));
                i += size;
            }
        }
    }

    (tokens, errors)
}

/// Try every comment style of the schema at `start`
fn lex_comment(
    input: &str,
    start: usize,
    schema: &Schema,
    errors: &mut Vec<LexerError>,
) -> Option<(ShaderSyntaxKind, usize)> {
    let rest = &input[start..];
    for style in schema.comment_styles() {
        match style {
            CommentStyle::Line(prefix) if rest.starts_with(prefix.as_str()) => {
                // Don't include the newline in the comment
                let end = rest
                    .find(['\n', '\r'])
                    .map(|rel| start + rel)
                    .unwrap_or(input.len());
                return Some((ShaderSyntaxKind::CommentLine, end));
            }
            CommentStyle::Block { open, close } if rest.starts_with(open.as_str()) => {
                let body_start = start + open.len();
                let end = match input[body_start..].find(close.as_str()) {
                    Some(rel) => body_start + rel + close.len(),
                    None => {
                        errors.push(LexerError::new(
                            "Unterminated block comment",
                            span(start, input.len()),
                        ));
                        input.len()
                    }
                };
                return Some((ShaderSyntaxKind::CommentBlock, end));
            }
            _ => {}
        }
    }
    None
}

/// Numbers: digits, hex, fractions, exponents and type suffixes (`1.0e-3f`, `0xFFu`)
fn lex_number(input: &str, start: usize) -> usize {
    let is_hex = input[start..].starts_with("0x") || input[start..].starts_with("0X");
    let mut end = start;
    let mut prev: Option<char> = None;
    while let Some((c, size)) = next_char(input, end) {
        let exponent_sign =
            (c == '+' || c == '-') && !is_hex && matches!(prev, Some('e') | Some('E'));
        if c.is_ascii_alphanumeric() || c == '.' || c == '_' || exponent_sign {
            end += size;
            prev = Some(c);
        } else {
            break;
        }
    }
    end
}

/// Quoted string with backslash escapes; an unterminated string ends before
/// the newline so one bad quote cannot swallow the rest of the file
fn lex_string(input: &str, start: usize) -> (usize, Option<LexerError>) {
    let mut end = start + 1;
    while let Some((c, size)) = next_char(input, end) {
        match c {
            '"' => return (end + size, None),
            '\\' => {
                end += size;
                if let Some((escaped, escaped_size)) = next_char(input, end)
                    && escaped != '\n'
                    && escaped != '\r'
                {
                    end += escaped_size;
                }
            }
            '\n' | '\r' => break,
            _ => end += size,
        }
    }
    (
        end,
        Some(LexerError::new(
            "Unterminated string literal",
            span(start, end),
        )),
    )
}

fn scan_while(input: &str, mut end: usize, pred: impl Fn(char) -> bool) -> usize {
    while let Some((c, size)) = next_char(input, end) {
        if !pred(c) {
            break;
        }
        end += size;
    }
    end
}

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_ident_continue(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

fn next_char(input: &str, index: usize) -> Option<(char, usize)> {
    input[index..].chars().next().map(|c| (c, c.len_utf8()))
}

fn span(start: usize, end: usize) -> CstSpan {
    start..end
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(input: &str) -> Vec<ShaderSyntaxKind> {
        lex_with_trivia(input, &Schema::glsl())
            .0
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    fn texts(input: &str) -> Vec<String> {
        lex_with_trivia(input, &Schema::glsl())
            .0
            .into_iter()
            .map(|t| t.text)
            .collect()
    }

    #[test]
    fn test_lex_import_line() {
        use ShaderSyntaxKind::*;
        assert_eq!(
            kinds("@import \"common/math\"\n"),
            vec![Tag, Whitespace, String, Newline]
        );
    }

    #[test]
    fn test_lex_version_directive() {
        assert_eq!(
            texts("#version 330 core"),
            vec!["#version", " ", "330", " ", "core"]
        );
    }

    #[test]
    fn test_lex_keywords_and_idents() {
        use ShaderSyntaxKind::*;
        assert_eq!(
            kinds("vec3 albedo;"),
            vec![Keyword, Whitespace, Ident, Semicolon]
        );
    }

    #[test]
    fn test_lex_numbers() {
        assert_eq!(
            texts("1.0e-3f+0x1Fu .5"),
            vec!["1.0e-3f", "+", "0x1Fu", " ", ".5"]
        );
    }

    #[test]
    fn test_lex_comments() {
        use ShaderSyntaxKind::*;
        assert_eq!(
            kinds("a // line\n/* block\n */b"),
            vec![Ident, Whitespace, CommentLine, Newline, CommentBlock, Ident]
        );
    }

    #[test]
    fn test_lex_crlf_is_single_newline() {
        assert_eq!(texts("a\r\nb\rc"), vec!["a", "\r\n", "b", "\r", "c"]);
    }

    #[test]
    fn test_bare_tag_prefix_is_punct() {
        use ShaderSyntaxKind::*;
        assert_eq!(kinds("# 1"), vec![Punct, Whitespace, Number]);
    }

    #[test]
    fn test_unterminated_string_stops_at_newline() {
        let (tokens, errors) = lex_with_trivia("\"abc\nnext", &Schema::glsl());
        assert_eq!(tokens[0].text, "\"abc");
        assert_eq!(tokens[1].kind, ShaderSyntaxKind::Newline);
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn test_unterminated_block_comment_runs_to_end() {
        let (tokens, errors) = lex_with_trivia("a /* never closed\nvoid", &Schema::glsl());
        assert_eq!(tokens.last().map(|t| t.kind), Some(ShaderSyntaxKind::CommentBlock));
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn test_non_ascii_outside_comments_is_unknown() {
        let (tokens, errors) = lex_with_trivia("a\u{2550}b", &Schema::glsl());
        assert_eq!(tokens[1].kind, ShaderSyntaxKind::Unknown);
        assert_eq!(tokens[1].text, "\u{2550}");
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn test_escaped_quote_in_string() {
        assert_eq!(texts(r#""a\"b" x"#), vec![r#""a\"b""#, " ", "x"]);
    }

    #[test]
    fn test_tokens_cover_input() {
        let input = "#version 450\n@import \"x\"\r\nvoid main() { gl_Position = vec4(0.0); } \u{00e9}";
        let (tokens, _) = lex_with_trivia(input, &Schema::glsl());
        let joined: String = tokens.iter().map(|t| t.text.as_str()).collect();
        assert_eq!(joined, input);
    }
}
