//! Schema-driven structural parser
//!
//! Parsing runs in two passes over the token stream:
//!
//! 1. **Grouping** nests balanced `()`, `{}` and `[]` into blocks. Directive
//!    lines (a tag up to the end of its line, honouring `\` continuations)
//!    stay flat so a stray brace inside `#define` cannot unbalance the file.
//!    Closers with no opener become `Error` leaves; openers with no closer
//!    run to the end of their enclosing sequence.
//! 2. **Emission** walks each sequence and, at every significant element,
//!    tries the schema's patterns in priority order. A successful match wraps
//!    the consumed elements in a structural node; otherwise the element is
//!    emitted as-is. Blocks recurse, so patterns also apply inside bodies.
//!
//! Neither pass can fail: whatever does not match stays a leaf.

use rowan::{GreenNode, GreenNodeBuilder};

use super::lexer::{LexerError, ShaderToken, lex_with_trivia};
use super::schema::{Matcher, Pattern};
use super::{Schema, ShaderSyntaxKind};

/// Parse shader source into a green tree plus lexer diagnostics
pub fn parse_shader(source: &str, schema: &Schema) -> (GreenNode, Vec<LexerError>) {
    let (tokens, errors) = lex_with_trivia(source, schema);
    let elements = group(&tokens);
    let mut parser = Parser::new(&tokens, schema);
    parser.builder.start_node(ShaderSyntaxKind::Root.into());
    parser.emit_sequence(&elements);
    parser.builder.finish_node(); // ROOT
    (parser.builder.finish(), errors)
}

/// Token indices nested by delimiter
#[derive(Debug, Clone, PartialEq, Eq)]
enum Element {
    Token(usize),
    /// A closing delimiter without an opener
    Stray(usize),
    Block {
        kind: ShaderSyntaxKind,
        open: usize,
        children: Vec<Element>,
        close: Option<usize>,
    },
}

struct Frame {
    kind: ShaderSyntaxKind,
    open: usize,
    children: Vec<Element>,
}

fn group(tokens: &[ShaderToken]) -> Vec<Element> {
    let mut top = Vec::new();
    let mut stack: Vec<Frame> = Vec::new();
    let mut i = 0;

    while i < tokens.len() {
        let kind = tokens[i].kind;

        if kind == ShaderSyntaxKind::Tag {
            let end = line_end(tokens, i);
            let current = current_frame(&mut stack, &mut top);
            current.extend((i..end).map(Element::Token));
            i = end;
            continue;
        }

        if let Some(block) = kind.block_for_opener() {
            stack.push(Frame {
                kind: block,
                open: i,
                children: Vec::new(),
            });
        } else if kind.is_closer() {
            match stack.iter().rposition(|f| f.kind.closer() == Some(kind)) {
                Some(pos) => {
                    // Inner blocks left open are closed implicitly
                    while stack.len() > pos + 1 {
                        close_frame(&mut stack, &mut top, None);
                    }
                    close_frame(&mut stack, &mut top, Some(i));
                }
                None => current_frame(&mut stack, &mut top).push(Element::Stray(i)),
            }
        } else {
            current_frame(&mut stack, &mut top).push(Element::Token(i));
        }
        i += 1;
    }

    while !stack.is_empty() {
        close_frame(&mut stack, &mut top, None);
    }
    top
}

fn current_frame<'a>(stack: &'a mut [Frame], top: &'a mut Vec<Element>) -> &'a mut Vec<Element> {
    match stack.last_mut() {
        Some(frame) => &mut frame.children,
        None => top,
    }
}

fn close_frame(stack: &mut Vec<Frame>, top: &mut Vec<Element>, close: Option<usize>) {
    if let Some(frame) = stack.pop() {
        let block = Element::Block {
            kind: frame.kind,
            open: frame.open,
            children: frame.children,
            close,
        };
        current_frame(stack, top).push(block);
    }
}

/// Index of the newline ending the line that contains `start` (exclusive
/// end of a directive line). A newline right after `\` continues the line.
fn line_end(tokens: &[ShaderToken], start: usize) -> usize {
    let mut j = start;
    while j < tokens.len() {
        if tokens[j].kind == ShaderSyntaxKind::Newline && !is_continued(tokens, j) {
            break;
        }
        j += 1;
    }
    j
}

fn is_continued(tokens: &[ShaderToken], newline: usize) -> bool {
    newline > 0 && tokens[newline - 1].text == "\\"
}

struct Parser<'a> {
    tokens: &'a [ShaderToken],
    schema: &'a Schema,
    builder: GreenNodeBuilder<'static>,
}

impl<'a> Parser<'a> {
    fn new(tokens: &'a [ShaderToken], schema: &'a Schema) -> Self {
        Self {
            tokens,
            schema,
            builder: GreenNodeBuilder::new(),
        }
    }

    fn emit_sequence(&mut self, elements: &[Element]) {
        let mut i = 0;
        while i < elements.len() {
            if !self.is_skippable(&elements[i], false)
                && let Some((kind, end)) = self.match_at(elements, i)
            {
                self.builder.start_node(kind.into());
                for element in &elements[i..end] {
                    self.emit_element(element);
                }
                self.builder.finish_node();
                i = end;
                continue;
            }
            self.emit_element(&elements[i]);
            i += 1;
        }
    }

    fn emit_element(&mut self, element: &Element) {
        match element {
            Element::Token(idx) => self.add_token(*idx, None),
            Element::Stray(idx) => self.add_token(*idx, Some(ShaderSyntaxKind::Error)),
            Element::Block {
                kind,
                open,
                children,
                close,
            } => {
                self.builder.start_node((*kind).into());
                self.add_token(*open, None);
                self.emit_sequence(children);
                if let Some(close) = close {
                    self.add_token(*close, None);
                }
                self.builder.finish_node();
            }
        }
    }

    fn add_token(&mut self, idx: usize, kind_override: Option<ShaderSyntaxKind>) {
        let token = &self.tokens[idx];
        let kind = kind_override.unwrap_or(token.kind);
        self.builder.token(kind.into(), &token.text);
    }

    /// First pattern (in priority order) matching at `start`
    fn match_at(&self, elements: &[Element], start: usize) -> Option<(ShaderSyntaxKind, usize)> {
        self.schema
            .patterns()
            .iter()
            .find_map(|pattern| self.try_pattern(pattern, elements, start).map(|end| (pattern.kind, end)))
    }

    fn try_pattern(&self, pattern: &Pattern, elements: &[Element], start: usize) -> Option<usize> {
        if pattern.matchers.is_empty() {
            return None;
        }

        let mut pos = start;
        for (idx, matcher) in pattern.matchers.iter().enumerate() {
            if idx > 0 {
                pos = self.skip_trivia(elements, pos, pattern.single_line);
            }
            match matcher {
                Matcher::RestOfLine => pos = self.rest_of_line(elements, pos),
                _ => {
                    let element = elements.get(pos)?;
                    if !self.element_matches(matcher, element) {
                        return None;
                    }
                    pos += 1;
                }
            }
        }
        Some(pos)
    }

    fn element_matches(&self, matcher: &Matcher, element: &Element) -> bool {
        match (matcher, element) {
            (Matcher::AnyOf(options), _) => options.iter().any(|m| self.element_matches(m, element)),
            (Matcher::Block(expected), Element::Block { kind, .. }) => kind == expected,
            (Matcher::Block(_), _) => false,
            (_, Element::Token(idx)) => {
                let token = &self.tokens[*idx];
                match matcher {
                    Matcher::Tag(name) => {
                        token.kind == ShaderSyntaxKind::Tag
                            && name
                                .as_deref()
                                .is_none_or(|n| self.schema.tag_name(&token.text) == n)
                    }
                    Matcher::QuotedString => {
                        token.kind == ShaderSyntaxKind::String
                            && token.text.len() >= 2
                            && token.text.ends_with('"')
                    }
                    Matcher::Ident => token.kind == ShaderSyntaxKind::Ident,
                    Matcher::Keyword(category) => {
                        token.kind == ShaderSyntaxKind::Keyword
                            && self.schema.keyword_category(&token.text) == Some(category.as_str())
                    }
                    Matcher::KeywordText(text) => {
                        token.kind == ShaderSyntaxKind::Keyword && token.text == *text
                    }
                    _ => false,
                }
            }
            _ => false,
        }
    }

    fn skip_trivia(&self, elements: &[Element], mut pos: usize, single_line: bool) -> usize {
        while let Some(element) = elements.get(pos) {
            if !self.is_skippable(element, single_line) {
                break;
            }
            pos += 1;
        }
        pos
    }

    fn is_skippable(&self, element: &Element, single_line: bool) -> bool {
        match element {
            Element::Token(idx) => {
                let kind = self.tokens[*idx].kind;
                kind.is_trivia() || (!single_line && kind == ShaderSyntaxKind::Newline)
            }
            _ => false,
        }
    }

    /// Consume up to (not including) the newline ending the current line
    fn rest_of_line(&self, elements: &[Element], mut pos: usize) -> usize {
        while let Some(element) = elements.get(pos) {
            if let Element::Token(idx) = element
                && self.tokens[*idx].kind == ShaderSyntaxKind::Newline
                && !is_continued(self.tokens, *idx)
            {
                break;
            }
            pos += 1;
        }
        pos
    }
}
