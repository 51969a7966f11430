use super::{Token, TokenIndex};

/// Backtracking view over a lexer's tokens. The whole parser state is the index of
/// the next token, so undoing a speculative step is a decrement.
#[derive(Clone, Debug)]
pub struct TokenCursor<'l> {
    tokens: &'l [Token],
    next: usize,
}

/// A saved cursor location for speculation over more than one token.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct CursorPosition(usize);

impl<'l> TokenCursor<'l> {
    pub fn new(tokens: &'l [Token]) -> Self {
        Self { tokens, next: 0 }
    }

    fn at(&self, index: usize) -> Option<(TokenIndex, &'l Token)> {
        self.tokens.get(index).map(|token| (TokenIndex(index), token))
    }

    pub fn peek(&self) -> Option<(TokenIndex, &'l Token)> {
        self.at(self.next)
    }

    pub fn peek2(&self) -> Option<(TokenIndex, &'l Token)> {
        self.at(self.next + 1)
    }

    /// Returns the next token and moves past it. The cursor moves even at the end of
    /// the input, so an `undo` always reverts the preceding `advance`.
    pub fn advance(&mut self) -> Option<(TokenIndex, &'l Token)> {
        let token = self.peek();
        self.next += 1;
        token
    }

    pub fn skip(&mut self) {
        self.next += 1;
    }

    pub fn undo(&mut self) {
        debug_assert!(self.next > 0, "undo without a preceding advance");
        self.next = self.next.saturating_sub(1);
    }

    /// The token most recently consumed by `advance` or `skip`.
    pub fn last(&self) -> Option<(TokenIndex, &'l Token)> {
        self.next.checked_sub(1).and_then(|index| self.at(index))
    }

    pub fn position(&self) -> CursorPosition {
        CursorPosition(self.next)
    }

    pub fn rewind(&mut self, position: CursorPosition) {
        self.next = position.0;
    }

    pub fn next_index(&self) -> TokenIndex {
        TokenIndex(self.next.min(self.tokens.len()))
    }

    pub fn end_index(&self) -> TokenIndex {
        TokenIndex(self.tokens.len())
    }

    pub fn is_at_end(&self) -> bool {
        self.next >= self.tokens.len()
    }
}

#[cfg(test)]
mod test {
    use crate::lexer::{Lexer, Operator, Token, TokenIndex};

    #[test]
    fn undo_restores_advance() {
        let lexer = Lexer::tokenize("a , b").unwrap();
        let mut cursor = lexer.cursor();
        let first = cursor.advance();
        let second = cursor.advance();
        assert_eq!(cursor.last(), second);
        cursor.undo();
        assert_eq!(cursor.last(), first);
        assert_eq!(cursor.peek(), second);
        assert_eq!(cursor.advance(), second);
        assert_eq!(
            second,
            Some((TokenIndex::new(1), &Token::Operator(Operator::Comma)))
        );
    }

    #[test]
    fn lookahead_does_not_move() {
        let lexer = Lexer::tokenize("x: T").unwrap();
        let cursor = lexer.cursor();
        assert_eq!(cursor.peek().map(|(i, _)| i), Some(TokenIndex::new(0)));
        assert_eq!(
            cursor.peek2(),
            Some((TokenIndex::new(1), &Token::Operator(Operator::Colon)))
        );
        assert_eq!(cursor.next_index(), TokenIndex::new(0));
    }

    #[test]
    fn advance_past_end_can_be_undone() {
        let lexer = Lexer::tokenize("x").unwrap();
        let mut cursor = lexer.cursor();
        cursor.skip();
        assert!(cursor.is_at_end());
        assert_eq!(cursor.advance(), None);
        cursor.undo();
        assert_eq!(cursor.next_index(), cursor.end_index());
        cursor.undo();
        assert_eq!(cursor.peek().map(|(_, t)| t.identifier()), Some(Some("x")));
    }

    #[test]
    fn rewind_to_saved_position() {
        let lexer = Lexer::tokenize("a b c d").unwrap();
        let mut cursor = lexer.cursor();
        cursor.skip();
        let mark = cursor.position();
        cursor.skip();
        cursor.skip();
        cursor.rewind(mark);
        assert_eq!(cursor.peek().and_then(|(_, t)| t.identifier()), Some("b"));
    }
}
