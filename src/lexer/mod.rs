use std::fmt::{Display, Formatter};
use std::iter::Enumerate;
use std::slice;

use tracing::{debug, trace_span};

pub use cursor::{CursorPosition, TokenCursor};
pub use token::{Keyword, Operator, Token};

use rules::{rules, Action};

mod cursor;
mod rules;
mod token;

/// Identifies a slot in the lexer's token array. The index one past the last
/// token stands for the end of the input.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TokenIndex(usize);

impl TokenIndex {
    pub fn new(index: usize) -> Self {
        Self(index)
    }

    pub fn index(self) -> usize {
        self.0
    }
}

impl Display for TokenIndex {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct TokSpan {
    pub start: usize,
    pub end: usize,
}

impl TokSpan {
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

impl From<TokSpan> for miette::SourceSpan {
    fn from(span: TokSpan) -> Self {
        (span.start, span.len()).into()
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl Display for Position {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LexError {
    #[error("Unexpected character '{character}'")]
    UnexpectedCharacter {
        character: char,
        position: Position,
        offset: usize,
    },
}

impl LexError {
    pub fn position(&self) -> Position {
        match self {
            LexError::UnexpectedCharacter { position, .. } => *position,
        }
    }

    pub fn offset(&self) -> usize {
        match self {
            LexError::UnexpectedCharacter { offset, .. } => *offset,
        }
    }
}

/// The scanned form of one source text: every token together with the span it
/// was read from, plus the line index used to turn offsets into positions.
pub struct Lexer<'src> {
    source: &'src str,
    tokens: Vec<Token>,
    spans: Vec<TokSpan>,
    line_starts: Vec<usize>,
}

impl<'src> Lexer<'src> {
    pub fn tokenize(source: &'src str) -> Result<Self, LexError> {
        let span = trace_span!("tokenize");
        let _e = span.enter();

        let mut lexer = Self {
            source,
            tokens: Vec::new(),
            spans: Vec::new(),
            line_starts: line_starts(source),
        };

        let mut offset = 0;
        'scan: while offset < source.len() {
            let rest = &source[offset..];
            for rule in rules() {
                let Some(len) = rule.matcher.match_len(rest) else {
                    continue;
                };
                match &rule.action {
                    Action::Ignore => {}
                    Action::Emit(token) => lexer.push(token.clone(), offset, len),
                    Action::Derive(derive) => match derive(&rest[..len]) {
                        Some(token) => lexer.push(token, offset, len),
                        None => return Err(lexer.unexpected_character(offset)),
                    },
                }
                offset += len;
                continue 'scan;
            }
            return Err(lexer.unexpected_character(offset));
        }

        debug!("scanned {} tokens", lexer.tokens.len());
        Ok(lexer)
    }

    fn push(&mut self, token: Token, start: usize, len: usize) {
        self.tokens.push(token);
        self.spans.push(TokSpan {
            start,
            end: start + len,
        });
    }

    fn unexpected_character(&self, offset: usize) -> LexError {
        LexError::UnexpectedCharacter {
            character: self.source[offset..].chars().next().unwrap_or_default(),
            position: self.position_of_offset(offset),
            offset,
        }
    }

    pub fn source(&self) -> &'src str {
        self.source
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn token(&self, index: TokenIndex) -> Option<&Token> {
        self.tokens.get(index.0)
    }

    pub fn cursor(&self) -> TokenCursor<'_> {
        TokenCursor::new(&self.tokens)
    }

    pub fn iter(&self) -> Tokens<'_> {
        Tokens {
            inner: self.tokens.iter().enumerate(),
        }
    }

    /// The source span of a token; the end of input maps to an empty span at the end.
    pub fn span(&self, index: TokenIndex) -> TokSpan {
        self.spans.get(index.0).copied().unwrap_or(TokSpan {
            start: self.source.len(),
            end: self.source.len(),
        })
    }

    pub fn lexeme(&self, index: TokenIndex) -> Option<&'src str> {
        let span = self.spans.get(index.0)?;
        Some(&self.source[span.start..span.end])
    }

    pub fn position(&self, index: TokenIndex) -> Position {
        self.position_of_offset(self.span(index).start)
    }

    pub fn position_of_offset(&self, offset: usize) -> Position {
        let line = self.line_starts.partition_point(|start| *start <= offset);
        let line_start = self.line_starts[line.saturating_sub(1)];
        let column = self.source[line_start..offset.min(self.source.len())]
            .chars()
            .count()
            + 1;
        Position { line, column }
    }
}

fn line_starts(source: &str) -> Vec<usize> {
    std::iter::once(0)
        .chain(source.match_indices('\n').map(|(i, _)| i + 1))
        .collect()
}

pub struct Tokens<'a> {
    inner: Enumerate<slice::Iter<'a, Token>>,
}

impl<'a> Iterator for Tokens<'a> {
    type Item = (TokenIndex, &'a Token);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(i, token)| (TokenIndex(i), token))
    }
}

impl<'a> IntoIterator for &'a Lexer<'_> {
    type Item = (TokenIndex, &'a Token);
    type IntoIter = Tokens<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
