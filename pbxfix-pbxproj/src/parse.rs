//! Lossless parser for the project file grammar.
//!
//! The grammar is the old-style ASCII property list: dictionaries
//! `{ key = value; }`, arrays `( a, b, )`, bare or double-quoted strings, and
//! C comments. Xcode annotates identifiers with a trailing `/* comment */`;
//! those are kept on the [`Scalar`] they follow. Every node records byte
//! offsets into the source so edits can be spliced without reformatting.

use crate::error::{ProjectError, ProjectResult};
use std::ops::Range;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scalar {
    /// Unescaped value.
    pub value: String,
    /// Text of a `/* ... */` comment directly following the value.
    pub comment: Option<String>,
    /// Byte range of the value token, quotes included, comment excluded.
    pub span: Range<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Array {
    pub items: Vec<Node>,
    /// Offset of `(`.
    pub open: usize,
    /// Offset of `)`.
    pub close: usize,
}

impl Array {
    pub fn values(&self) -> impl Iterator<Item = &str> {
        self.items.iter().filter_map(Node::as_str)
    }

    pub fn contains(&self, value: &str) -> bool {
        self.values().any(|v| v == value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub key: Scalar,
    pub value: Node,
    /// Offset just past the terminating `;`.
    pub end: usize,
}

impl Entry {
    pub fn span(&self) -> Range<usize> {
        self.key.span.start..self.end
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dict {
    pub entries: Vec<Entry>,
    /// Offset of `{`.
    pub open: usize,
    /// Offset of `}`.
    pub close: usize,
}

impl Dict {
    pub fn entry(&self, key: &str) -> Option<&Entry> {
        self.entries.iter().find(|e| e.key.value == key)
    }

    pub fn get(&self, key: &str) -> Option<&Node> {
        self.entry(key).map(|e| &e.value)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Node::as_str)
    }

    pub fn get_array(&self, key: &str) -> Option<&Array> {
        self.get(key).and_then(Node::as_array)
    }

    pub fn get_dict(&self, key: &str) -> Option<&Dict> {
        self.get(key).and_then(Node::as_dict)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Scalar(Scalar),
    Array(Array),
    Dict(Dict),
}

impl Node {
    pub fn as_scalar(&self) -> Option<&Scalar> {
        match self {
            Node::Scalar(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        self.as_scalar().map(|s| s.value.as_str())
    }

    pub fn as_array(&self) -> Option<&Array> {
        match self {
            Node::Array(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_dict(&self) -> Option<&Dict> {
        match self {
            Node::Dict(d) => Some(d),
            _ => None,
        }
    }

    /// Byte range of the whole value.
    pub fn span(&self) -> Range<usize> {
        match self {
            Node::Scalar(s) => s.span.clone(),
            Node::Array(a) => a.open..a.close + 1,
            Node::Dict(d) => d.open..d.close + 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum TokenKind {
    OpenBrace,
    CloseBrace,
    OpenParen,
    CloseParen,
    Equals,
    Semicolon,
    Comma,
    Str(String),
    Comment(String),
}

#[derive(Debug, Clone)]
struct Token {
    kind: TokenKind,
    span: Range<usize>,
}

fn is_bare(b: u8) -> bool {
    b.is_ascii_alphanumeric() || matches!(b, b'_' | b'$' | b'/' | b':' | b'.' | b'-' | b'+')
}

fn tokenize(text: &str) -> ProjectResult<Vec<Token>> {
    let bytes = text.as_bytes();
    let mut out = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        let b = bytes[i];
        let next = bytes.get(i + 1).copied();
        let single = match b {
            b'{' => Some(TokenKind::OpenBrace),
            b'}' => Some(TokenKind::CloseBrace),
            b'(' => Some(TokenKind::OpenParen),
            b')' => Some(TokenKind::CloseParen),
            b'=' => Some(TokenKind::Equals),
            b';' => Some(TokenKind::Semicolon),
            b',' => Some(TokenKind::Comma),
            _ => None,
        };
        if let Some(kind) = single {
            out.push(Token {
                kind,
                span: i..i + 1,
            });
            i += 1;
            continue;
        }

        match b {
            b' ' | b'\t' | b'\r' | b'\n' => i += 1,
            b'/' if next == Some(b'*') => {
                let body = i + 2;
                let end = text[body..]
                    .find("*/")
                    .map(|p| body + p)
                    .ok_or_else(|| ProjectError::parse(i, "unterminated comment"))?;
                out.push(Token {
                    kind: TokenKind::Comment(text[body..end].trim().to_string()),
                    span: i..end + 2,
                });
                i = end + 2;
            }
            b'/' if next == Some(b'/') => {
                i = text[i..].find('\n').map_or(bytes.len(), |p| i + p + 1);
            }
            b'"' => {
                let (value, end) = read_quoted(text, i)?;
                out.push(Token {
                    kind: TokenKind::Str(value),
                    span: i..end,
                });
                i = end;
            }
            _ if is_bare(b) => {
                let start = i;
                while i < bytes.len() && is_bare(bytes[i]) {
                    if bytes[i] == b'/' && matches!(bytes.get(i + 1), Some(b'*') | Some(b'/')) {
                        break;
                    }
                    i += 1;
                }
                out.push(Token {
                    kind: TokenKind::Str(text[start..i].to_string()),
                    span: start..i,
                });
            }
            _ => {
                let ch = text[i..].chars().next().unwrap_or('?');
                return Err(ProjectError::parse(i, format!("unexpected character {ch:?}")));
            }
        }
    }

    Ok(out)
}

/// Reads a quoted string starting at `start` (the opening quote). Returns the
/// unescaped value and the offset past the closing quote.
fn read_quoted(text: &str, start: usize) -> ProjectResult<(String, usize)> {
    let mut value = String::new();
    let mut chars = text[start + 1..].char_indices();

    while let Some((off, ch)) = chars.next() {
        match ch {
            '"' => return Ok((value, start + 1 + off + 1)),
            '\\' => {
                let (_, escaped) = chars
                    .next()
                    .ok_or_else(|| ProjectError::parse(start, "unterminated escape"))?;
                value.push(match escaped {
                    'n' => '\n',
                    't' => '\t',
                    'r' => '\r',
                    other => other,
                });
            }
            other => value.push(other),
        }
    }

    Err(ProjectError::parse(start, "unterminated string"))
}

struct Parser<'t> {
    tokens: &'t [Token],
    pos: usize,
    text_len: usize,
}

impl<'t> Parser<'t> {
    fn skip_comments(&mut self) {
        while let Some(Token {
            kind: TokenKind::Comment(_),
            ..
        }) = self.tokens.get(self.pos)
        {
            self.pos += 1;
        }
    }

    fn peek(&mut self) -> Option<&'t Token> {
        self.skip_comments();
        self.tokens.get(self.pos)
    }

    fn offset(&self) -> usize {
        self.tokens
            .get(self.pos)
            .map_or(self.text_len, |t| t.span.start)
    }

    fn bump(&mut self) -> ProjectResult<&'t Token> {
        self.skip_comments();
        let tok = self
            .tokens
            .get(self.pos)
            .ok_or_else(|| ProjectError::parse(self.text_len, "unexpected end of input"))?;
        self.pos += 1;
        Ok(tok)
    }

    fn expect(&mut self, kind: TokenKind, what: &str) -> ProjectResult<&'t Token> {
        let offset = self.offset();
        let tok = self.bump()?;
        if tok.kind != kind {
            return Err(ProjectError::parse(offset, format!("expected {what}")));
        }
        Ok(tok)
    }

    fn scalar(&mut self, value: String, span: Range<usize>) -> Scalar {
        let comment = match self.tokens.get(self.pos) {
            Some(Token {
                kind: TokenKind::Comment(c),
                ..
            }) => {
                self.pos += 1;
                Some(c.clone())
            }
            _ => None,
        };
        Scalar {
            value,
            comment,
            span,
        }
    }

    fn value(&mut self) -> ProjectResult<Node> {
        let offset = self.offset();
        let tok = self.bump()?;
        match &tok.kind {
            TokenKind::OpenBrace => Ok(Node::Dict(self.dict_body(tok.span.start)?)),
            TokenKind::OpenParen => Ok(Node::Array(self.array_body(tok.span.start)?)),
            TokenKind::Str(s) => Ok(Node::Scalar(self.scalar(s.clone(), tok.span.clone()))),
            _ => Err(ProjectError::parse(offset, "expected a value")),
        }
    }

    fn dict_body(&mut self, open: usize) -> ProjectResult<Dict> {
        let mut entries = Vec::new();
        loop {
            let offset = self.offset();
            let tok = self.bump()?;
            let key = match &tok.kind {
                TokenKind::CloseBrace => {
                    return Ok(Dict {
                        entries,
                        open,
                        close: tok.span.start,
                    });
                }
                TokenKind::Str(s) => self.scalar(s.clone(), tok.span.clone()),
                _ => return Err(ProjectError::parse(offset, "expected a key or `}`")),
            };
            self.expect(TokenKind::Equals, "`=`")?;
            let value = self.value()?;
            let semi = self.expect(TokenKind::Semicolon, "`;`")?;
            entries.push(Entry {
                key,
                value,
                end: semi.span.end,
            });
        }
    }

    fn array_body(&mut self, open: usize) -> ProjectResult<Array> {
        let mut items = Vec::new();
        loop {
            if let Some(tok) = self.peek()
                && tok.kind == TokenKind::CloseParen
            {
                self.pos += 1;
                return Ok(Array {
                    items,
                    open,
                    close: tok.span.start,
                });
            }
            items.push(self.value()?);

            let offset = self.offset();
            let tok = self.bump()?;
            match tok.kind {
                TokenKind::Comma => {}
                TokenKind::CloseParen => {
                    return Ok(Array {
                        items,
                        open,
                        close: tok.span.start,
                    });
                }
                _ => return Err(ProjectError::parse(offset, "expected `,` or `)`")),
            }
        }
    }
}

/// Parses a whole project file into its root dictionary.
pub fn parse_document(text: &str) -> ProjectResult<Dict> {
    let tokens = tokenize(text)?;
    let mut parser = Parser {
        tokens: &tokens,
        pos: 0,
        text_len: text.len(),
    };

    let open = parser.expect(TokenKind::OpenBrace, "`{` at document start")?;
    let root = parser.dict_body(open.span.start)?;
    if parser.peek().is_some() {
        return Err(ProjectError::parse(
            parser.offset(),
            "trailing content after root dictionary",
        ));
    }
    Ok(root)
}
