use std::error::Error;
use std::fmt::{Display, Formatter};
use std::iter;

use miette::{LabeledSpan, NamedSource, SourceCode};

use crate::ast::ParseError;
use crate::lexer::{LexError, Lexer, Position, TokenIndex};
use crate::resolver::ResolverError;

/// A compile error from any phase, located in the source text.
#[derive(Debug)]
pub struct SourceDiagnostic {
    message: String,
    position: Position,
    /// `None` when the error is at the end of the input.
    lexeme: Option<String>,
    span: miette::SourceSpan,
    source_code: Option<NamedSource<String>>,
}

impl SourceDiagnostic {
    pub fn lex(error: &LexError) -> Self {
        let LexError::UnexpectedCharacter {
            character, offset, ..
        } = error;
        Self {
            message: error.to_string(),
            position: error.position(),
            lexeme: Some(character.to_string()),
            span: (*offset, character.len_utf8()).into(),
            source_code: None,
        }
    }

    pub fn at_token(lexer: &Lexer, at: TokenIndex, message: impl ToString) -> Self {
        Self {
            message: message.to_string(),
            position: lexer.position(at),
            lexeme: lexer.lexeme(at).map(str::to_owned),
            span: lexer.span(at).into(),
            source_code: None,
        }
    }

    pub fn parse(lexer: &Lexer, error: &ParseError) -> Self {
        Self::at_token(lexer, error.at(), error)
    }

    pub fn resolve(lexer: &Lexer, error: &ResolverError) -> Self {
        Self::at_token(lexer, error.at(), error)
    }

    /// Attaches the source text, which fancy rendering needs for its snippet.
    pub fn with_source(mut self, name: impl AsRef<str>, source: &str) -> Self {
        self.source_code = Some(NamedSource::new(name, source.to_owned()));
        self
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn position(&self) -> Position {
        self.position
    }
}

impl Error for SourceDiagnostic {}

impl Display for SourceDiagnostic {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match &self.lexeme {
            Some(lexeme) => write!(
                f,
                "[line {}] Error at '{}': {}",
                self.position, lexeme, self.message
            ),
            None => write!(f, "[line {}] Error at end: {}", self.position, self.message),
        }
    }
}

impl miette::Diagnostic for SourceDiagnostic {
    fn source_code(&self) -> Option<&dyn SourceCode> {
        self.source_code
            .as_ref()
            .map(|source| source as &dyn SourceCode)
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        Some(Box::new(iter::once(LabeledSpan::new_with_span(
            Some(self.message.clone()),
            self.span,
        ))))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::ast::parse;

    #[test]
    fn messages_name_the_token() {
        let lexer = Lexer::tokenize("local x =\n  x + )").unwrap();
        let err = parse(&lexer).unwrap_err();
        assert_eq!(
            SourceDiagnostic::parse(&lexer, &err).to_string(),
            "[line 2:7] Error at ')': Expect expression."
        );
    }

    #[test]
    fn end_of_input() {
        let lexer = Lexer::tokenize("while true do").unwrap();
        let err = parse(&lexer).unwrap_err();
        let diagnostic = SourceDiagnostic::parse(&lexer, &err);
        assert_eq!(
            diagnostic.to_string(),
            "[line 1:14] Error at end: Unexpected end of file."
        );
    }

    #[test]
    fn lexer_errors() {
        let err = Lexer::tokenize("x = $").err().unwrap();
        let diagnostic = SourceDiagnostic::lex(&err);
        assert_eq!(
            diagnostic.to_string(),
            "[line 1:5] Error at '$': Unexpected character '$'"
        );
    }

    #[test]
    fn fancy_report_renders_source() {
        let source = "class A: Missing end";
        let lexer = Lexer::tokenize(source).unwrap();
        let chunks = [parse(&lexer).unwrap()];
        let err = crate::resolver::Resolver::resolve(&chunks).unwrap_err();
        let diagnostic = SourceDiagnostic::resolve(&lexer, &err).with_source("test.luo", source);
        let rendered = format!("{:?}", miette::Report::new(diagnostic));
        assert!(rendered.contains("Undefined object 'Missing'."), "{rendered}");
    }
}
