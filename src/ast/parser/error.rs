use crate::lexer::{Token, TokenIndex};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ParseError {
    #[error("Unexpected {token}.")]
    UnexpectedToken { token: Token, at: TokenIndex },
    #[error("Statement after 'return'.")]
    AlreadyReturned { at: TokenIndex },
    #[error("Invalid assignment target.")]
    InvalidAssignmentTarget { at: TokenIndex },
    #[error("Expression is not a function call.")]
    InvalidCallTarget { at: TokenIndex },
    #[error("Expect expression.")]
    ExpectedExpression { at: TokenIndex },
    #[error("Unexpected end of file.")]
    EndOfStream { at: TokenIndex },
}

impl ParseError {
    pub(super) fn unexpected(at: TokenIndex, token: &Token) -> Self {
        Self::UnexpectedToken {
            token: token.clone(),
            at,
        }
    }

    pub fn at(&self) -> TokenIndex {
        match self {
            ParseError::UnexpectedToken { at, .. }
            | ParseError::AlreadyReturned { at }
            | ParseError::InvalidAssignmentTarget { at }
            | ParseError::InvalidCallTarget { at }
            | ParseError::ExpectedExpression { at }
            | ParseError::EndOfStream { at } => *at,
        }
    }
}
