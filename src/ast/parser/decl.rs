use super::{ParseError, Parser, Result};
use crate::ast::{
    expr::{self, Expr},
    AssociatedType, Class, ClassStatement, Conformance, Enum, EnumCase, Property, Protocol,
    ProtocolStatement, Type, TypeAlias,
};
use crate::lexer::{Keyword, Operator, Token};

impl<'l> Parser<'l> {
    pub(super) fn class(&mut self) -> Result<Class> {
        self.expect_keyword(Keyword::Class)?;
        let (at, name) = self.identifier()?;
        let conforms = self.conformances()?;

        let mut body = Vec::new();
        loop {
            let (member_at, token) = self.next()?;
            let member = match token {
                Token::Keyword(Keyword::End) => break,
                Token::Keyword(Keyword::Default) => {
                    let (at, name) = self.identifier()?;
                    self.expect_operator(Operator::Equal)?;
                    ClassStatement::Default {
                        name,
                        value: self.expression()?,
                        at,
                    }
                }
                Token::Keyword(Keyword::Function) => {
                    let (at, name) = self.identifier()?;
                    ClassStatement::Function {
                        name,
                        function: self.function_body()?,
                        at,
                    }
                }
                Token::Identifier(name) => {
                    self.expect_operator(Operator::Colon)?;
                    let ty = self.parse_type()?;
                    let default = match self.match_operator(Operator::Equal) {
                        Some(_) => Some(self.expression()?),
                        None => None,
                    };
                    ClassStatement::Property(Property {
                        name: name.clone(),
                        ty,
                        default,
                        at: member_at,
                    })
                }
                other => return Err(ParseError::unexpected(member_at, other)),
            };
            body.push(member);
        }
        Ok(Class {
            name,
            at,
            conforms,
            body,
        })
    }

    pub(super) fn protocol(&mut self) -> Result<Protocol> {
        self.expect_keyword(Keyword::Protocol)?;
        let (at, name) = self.identifier()?;
        let conforms = self.conformances()?;

        let mut body = Vec::new();
        loop {
            let (member_at, token) = self.next()?;
            let member = match token {
                Token::Keyword(Keyword::End) => break,
                Token::Keyword(Keyword::Function) => {
                    let (at, name) = self.identifier()?;
                    ProtocolStatement::Function {
                        name,
                        signature: self.function_signature()?,
                        at,
                    }
                }
                Token::Identifier(name) => {
                    self.expect_operator(Operator::Colon)?;
                    ProtocolStatement::Property {
                        name: name.clone(),
                        ty: self.parse_type()?,
                        at: member_at,
                    }
                }
                other => return Err(ParseError::unexpected(member_at, other)),
            };
            body.push(member);
        }
        Ok(Protocol {
            name,
            at,
            conforms,
            body,
        })
    }

    pub(super) fn enumeration(&mut self) -> Result<Enum> {
        self.expect_keyword(Keyword::Enum)?;
        let (at, name) = self.identifier()?;
        let conforms = self.conformances()?;

        let mut cases = Vec::new();
        loop {
            if self.match_keyword(Keyword::End).is_some() {
                break;
            }
            cases.push(self.enum_case()?);
            if self.match_operator(Operator::Comma).is_none() {
                self.expect_keyword(Keyword::End)?;
                break;
            }
        }
        Ok(Enum {
            name,
            at,
            conforms,
            cases,
        })
    }

    fn enum_case(&mut self) -> Result<EnumCase> {
        let (at, name) = self.identifier()?;
        let mut associated = Vec::new();
        if self.match_operator(Operator::RoundBracketLeft).is_some()
            && self.match_operator(Operator::RoundBracketRight).is_none()
        {
            loop {
                let label = match (self.cursor.peek(), self.cursor.peek2()) {
                    (
                        Some((_, Token::Identifier(label))),
                        Some((_, Token::Operator(Operator::Colon))),
                    ) => {
                        self.cursor.skip();
                        self.cursor.skip();
                        Some(label.clone())
                    }
                    _ => None,
                };
                associated.push(AssociatedType {
                    label,
                    ty: self.parse_type()?,
                });
                if self.match_operator(Operator::RoundBracketRight).is_some() {
                    break;
                }
                self.expect_operator(Operator::Comma)?;
            }
        }
        let raw_value = match self.match_operator(Operator::Equal) {
            Some(_) => Some(self.literal()?),
            None => None,
        };
        Ok(EnumCase {
            name,
            at,
            associated,
            raw_value,
        })
    }

    /// A number, string or boolean literal. Numbers may carry a leading `-`.
    fn literal(&mut self) -> Result<Expr> {
        let (at, token) = self.next()?;
        Ok(match token {
            Token::Number(value) => expr::Number::new(at, *value),
            Token::Operator(Operator::Minus) => match self.next()? {
                (_, Token::Number(value)) => expr::Number::new(at, -*value),
                (at, other) => return Err(ParseError::unexpected(at, other)),
            },
            Token::String(value) => expr::Str::new(at, value.clone()),
            Token::Keyword(Keyword::True) => expr::Bool::new(at, true),
            Token::Keyword(Keyword::False) => expr::Bool::new(at, false),
            other => return Err(ParseError::unexpected(at, other)),
        })
    }

    pub(super) fn type_alias(&mut self) -> Result<TypeAlias> {
        self.expect_keyword(Keyword::Typealias)?;
        let (at, name) = self.identifier()?;
        self.expect_operator(Operator::Equal)?;
        Ok(TypeAlias {
            name,
            at,
            ty: self.parse_type()?,
        })
    }

    fn conformances(&mut self) -> Result<Vec<Conformance>> {
        let mut conforms = Vec::new();
        if self.match_operator(Operator::Colon).is_some() {
            loop {
                let (at, name) = self.identifier()?;
                conforms.push(Conformance { name, at });
                if self.match_operator(Operator::Comma).is_none() {
                    break;
                }
            }
        }
        Ok(conforms)
    }

    /// `Name`, `Name.Member`, `[T]` or `[K: V]`, each optionally followed by `?`.
    pub(super) fn parse_type(&mut self) -> Result<Type> {
        let (at, token) = self.next()?;
        let mut ty = match token {
            Token::Identifier(name) => match self.match_operator(Operator::Dot) {
                Some(_) => Type::Index {
                    parent: name.clone(),
                    name: self.identifier()?.1,
                    at,
                },
                None => Type::Name {
                    name: name.clone(),
                    at,
                },
            },
            Token::Operator(Operator::SquareBracketLeft) => {
                let first = self.parse_type()?;
                let ty = match self.match_operator(Operator::Colon) {
                    Some(_) => Type::Dictionary {
                        key: Box::new(first),
                        value: Box::new(self.parse_type()?),
                        at,
                    },
                    None => Type::Array {
                        element: Box::new(first),
                        at,
                    },
                };
                self.expect_operator(Operator::SquareBracketRight)?;
                ty
            }
            other => return Err(ParseError::unexpected(at, other)),
        };
        while self.match_operator(Operator::Optional).is_some() {
            ty = Type::Optional {
                inner: Box::new(ty),
                at,
            };
        }
        Ok(ty)
    }
}
