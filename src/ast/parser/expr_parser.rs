use num_enum::{IntoPrimitive, TryFromPrimitive};

use super::{ParseError, Parser, Result};
use crate::ast::{
    expr::{self, Expr, ListExpr},
    FunctionBody, FunctionSignature, NodeOperator, TableItem, TableKey,
};
use crate::lexer::{Keyword, Operator, Token, TokenIndex};

#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, IntoPrimitive, TryFromPrimitive)]
#[repr(u8)]
pub(super) enum Precedence {
    Lowest,
    Or,
    And,
    Comparison,
    Additive,
    Multiplicative,
    Exponent,
}

impl Precedence {
    fn of(operator: NodeOperator) -> Self {
        use NodeOperator::*;
        match operator {
            Or => Self::Or,
            And => Self::And,
            Equal | NotEqual | LessThan | LessThanEqual | GreaterThan | GreaterThanEqual
            | Concatenate => Self::Comparison,
            Plus | Minus => Self::Additive,
            Multiply | Divide | Modulus => Self::Multiplicative,
            Exponent | Not | Length => Self::Exponent,
        }
    }

    fn next_lower(self) -> Self {
        Self::try_from(u8::from(self).saturating_sub(1)).unwrap_or(Self::Lowest)
    }

    /// The floor for the right operand. One lower than the operator's own level
    /// makes the operator right-associative.
    fn climbing(operator: NodeOperator) -> Self {
        match operator {
            NodeOperator::Exponent | NodeOperator::Concatenate => Self::of(operator).next_lower(),
            _ => Self::of(operator),
        }
    }
}

fn unary_operator(token: &Token) -> Option<NodeOperator> {
    match token {
        Token::Operator(Operator::Minus) => Some(NodeOperator::Minus),
        Token::Operator(Operator::Hash) => Some(NodeOperator::Length),
        Token::Keyword(Keyword::Not) => Some(NodeOperator::Not),
        _ => None,
    }
}

fn binary_operator(token: &Token) -> Option<NodeOperator> {
    match token {
        Token::Keyword(Keyword::Or) => Some(NodeOperator::Or),
        Token::Keyword(Keyword::And) => Some(NodeOperator::And),
        Token::Operator(operator) => NodeOperator::binary(*operator),
        _ => None,
    }
}

impl<'l> Parser<'l> {
    pub(super) fn expression(&mut self) -> Result<Expr> {
        self.expression_at(Precedence::Lowest)
    }

    fn expression_at(&mut self, min: Precedence) -> Result<Expr> {
        let at = self.cursor.next_index();
        self.try_expression(min)?
            .ok_or(ParseError::ExpectedExpression { at })
    }

    /// Parses an expression whose binary operators all bind tighter than `min`.
    /// Returns `None` without consuming anything when the next token cannot
    /// start an expression.
    pub(super) fn try_expression(&mut self, min: Precedence) -> Result<Option<Expr>> {
        let Some((at, token)) = self.cursor.peek() else {
            return Ok(None);
        };
        let mut left = match unary_operator(token) {
            Some(operator) => {
                self.cursor.skip();
                let operand = self.expression_at(Precedence::Multiplicative)?;
                expr::Operation::new(at, operator, operand, None)
            }
            None => match self.atom()? {
                Some(atom) => atom,
                None => return Ok(None),
            },
        };

        if self.match_keyword(Keyword::Is).is_some() {
            let ty = self.parse_type()?;
            left = expr::Is::new(at, left, ty);
        }

        while let Some((_, token)) = self.cursor.peek() {
            let Some(operator) = binary_operator(token) else {
                break;
            };
            if Precedence::of(operator) <= min {
                break;
            }
            self.cursor.skip();
            let right = self.expression_at(Precedence::climbing(operator))?;
            left = expr::Operation::new(at, operator, left, Some(right));
        }
        Ok(Some(left))
    }

    fn atom(&mut self) -> Result<Option<Expr>> {
        let Some((at, token)) = self.cursor.advance() else {
            self.cursor.undo();
            return Ok(None);
        };
        let atom = match token {
            Token::Keyword(Keyword::Nil) => expr::Nil::new(at),
            Token::Keyword(Keyword::True) => expr::Bool::new(at, true),
            Token::Keyword(Keyword::False) => expr::Bool::new(at, false),
            Token::Number(value) => expr::Number::new(at, *value),
            Token::String(value) => expr::Str::new(at, value.clone()),
            Token::Operator(Operator::VarArg) => expr::VarArgs::new(at),
            Token::Operator(Operator::CurlyBracketLeft) => self.table(at)?,
            Token::Keyword(Keyword::Function) => {
                let function = self.function_body()?;
                expr::Function::new(at, function)
            }
            Token::Identifier(_) | Token::Operator(Operator::RoundBracketLeft) => {
                self.cursor.undo();
                self.prefix_expression()?
            }
            _ => {
                self.cursor.undo();
                return Ok(None);
            }
        };
        Ok(Some(atom))
    }

    /// A variable or parenthesized expression followed by any chain of index,
    /// field, call and invocation suffixes. Every node in the chain carries the
    /// index of the seed.
    pub(super) fn prefix_expression(&mut self) -> Result<Expr> {
        let (at, token) = self.next()?;
        let mut prefix = match token {
            Token::Identifier(name) => expr::Variable::new(at, name.clone()),
            Token::Operator(Operator::RoundBracketLeft) => {
                let inner = self.expression()?;
                self.expect_operator(Operator::RoundBracketRight)?;
                expr::Parenthesized::new(at, inner)
            }
            other => return Err(ParseError::unexpected(at, other)),
        };

        loop {
            let Some((_, token)) = self.cursor.advance() else {
                self.cursor.undo();
                return Ok(prefix);
            };
            prefix = match token {
                Token::Operator(Operator::SquareBracketLeft) => {
                    let index = self.expression()?;
                    self.expect_operator(Operator::SquareBracketRight)?;
                    expr::ExpressionIndex::new(at, prefix, index)
                }
                Token::Operator(Operator::Dot) => {
                    let (_, name) = self.identifier()?;
                    expr::IdentifierIndex::new(at, prefix, name)
                }
                Token::Operator(Operator::Colon) => {
                    let (_, method) = self.identifier()?;
                    let arguments = self.call_arguments()?;
                    expr::Invocation::new(at, prefix, method, arguments)
                }
                Token::Operator(Operator::RoundBracketLeft | Operator::CurlyBracketLeft)
                | Token::String(_) => {
                    self.cursor.undo();
                    let arguments = self.call_arguments()?;
                    expr::Call::new(at, prefix, arguments)
                }
                _ => {
                    self.cursor.undo();
                    return Ok(prefix);
                }
            };
        }
    }

    fn call_arguments(&mut self) -> Result<ListExpr> {
        let (at, token) = self.next()?;
        match token {
            Token::Operator(Operator::RoundBracketLeft) => {
                if self.match_operator(Operator::RoundBracketRight).is_some() {
                    return Ok(Vec::new());
                }
                let arguments = self.expression_list()?;
                self.expect_operator(Operator::RoundBracketRight)?;
                Ok(arguments)
            }
            Token::Operator(Operator::CurlyBracketLeft) => Ok(vec![self.table(at)?]),
            Token::String(value) => Ok(vec![expr::Str::new(at, value.clone())]),
            other => Err(ParseError::unexpected(at, other)),
        }
    }

    /// The items of a table constructor; the opening brace is already consumed.
    fn table(&mut self, at: TokenIndex) -> Result<Expr> {
        let mut items = Vec::new();
        loop {
            if self.match_operator(Operator::CurlyBracketRight).is_some() {
                break;
            }
            items.push(self.table_item()?);
            if self.match_operator(Operator::Comma).is_some()
                || self.match_operator(Operator::Semicolon).is_some()
            {
                continue;
            }
            self.expect_operator(Operator::CurlyBracketRight)?;
            break;
        }
        Ok(expr::Table::new(at, items))
    }

    fn table_item(&mut self) -> Result<TableItem> {
        if self.match_operator(Operator::SquareBracketLeft).is_some() {
            let key = self.expression()?;
            self.expect_operator(Operator::SquareBracketRight)?;
            self.expect_operator(Operator::Equal)?;
            return Ok(TableItem {
                key: Some(TableKey::Expression(key)),
                value: self.expression()?,
            });
        }

        match self.cursor.advance() {
            Some((_, Token::Identifier(name))) if self.check_operator(Operator::Equal) => {
                self.cursor.skip();
                Ok(TableItem {
                    key: Some(TableKey::Name(name.clone())),
                    value: self.expression()?,
                })
            }
            _ => {
                self.cursor.undo();
                Ok(TableItem {
                    key: None,
                    value: self.expression()?,
                })
            }
        }
    }

    /// Parameters, return types and the body up to `end`.
    pub(super) fn function_body(&mut self) -> Result<FunctionBody> {
        let signature = self.function_signature()?;
        let body = self.block(super::Delimiters::END)?;
        Ok(FunctionBody { signature, body })
    }

    pub(super) fn function_signature(&mut self) -> Result<FunctionSignature> {
        self.expect_operator(Operator::RoundBracketLeft)?;
        let mut signature = FunctionSignature::default();
        if self.match_operator(Operator::RoundBracketRight).is_none() {
            loop {
                if self.match_operator(Operator::VarArg).is_some() {
                    signature.is_vararg = true;
                    self.expect_operator(Operator::RoundBracketRight)?;
                    break;
                }
                signature.parameters.push(self.typed_identifier()?);
                if self.match_operator(Operator::RoundBracketRight).is_some() {
                    break;
                }
                self.expect_operator(Operator::Comma)?;
            }
        }
        if self.match_operator(Operator::Colon).is_some() {
            signature.returns.push(self.parse_type()?);
            while self.match_operator(Operator::Comma).is_some() {
                signature.returns.push(self.parse_type()?);
            }
        }
        Ok(signature)
    }
}
