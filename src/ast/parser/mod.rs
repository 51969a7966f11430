use tracing::{debug, trace, trace_span};

use crate::ast::{
    expr::{Expr, ListExpr},
    stmt::{self, Stmt},
    AssignmentVariable, Block, Callable, Chunk, CompoundOperator, Conditional, TopStatement,
    TypedIdentifier,
};
use crate::lexer::{Keyword, Lexer, Operator, Token, TokenCursor, TokenIndex};

pub use error::ParseError;

mod decl;
mod error;
mod expr_parser;

type Result<T, E = ParseError> = core::result::Result<T, E>;

/// Keywords the enclosing construct accepts as the end of a block.
#[derive(Copy, Clone, Debug, Default)]
struct Delimiters {
    end: bool,
    else_: bool,
    until: bool,
}

impl Delimiters {
    const NONE: Self = Self {
        end: false,
        else_: false,
        until: false,
    };
    const END: Self = Self {
        end: true,
        else_: false,
        until: false,
    };
    const IF_BRANCH: Self = Self {
        end: true,
        else_: true,
        until: false,
    };
    const UNTIL: Self = Self {
        end: false,
        else_: false,
        until: true,
    };

    fn any(self) -> bool {
        self.end || self.else_ || self.until
    }

    fn accepts(self, keyword: Keyword) -> bool {
        match keyword {
            Keyword::End => self.end,
            Keyword::Else | Keyword::Elseif => self.else_,
            Keyword::Until => self.until,
            _ => false,
        }
    }
}

pub struct Parser<'l> {
    cursor: TokenCursor<'l>,
}

impl<'l> Parser<'l> {
    pub fn parse(lexer: &'l Lexer) -> Result<Chunk> {
        let span = trace_span!("parse");
        let _e = span.enter();

        let chunk = Self {
            cursor: lexer.cursor(),
        }
        .chunk()?;
        debug!("parsed {} top-level statements", chunk.len());
        Ok(chunk)
    }

    fn chunk(&mut self) -> Result<Chunk> {
        let mut chunk = Vec::new();
        let mut has_returned = false;
        loop {
            let declaration = match self.cursor.peek() {
                Some((at, Token::Keyword(keyword)))
                    if matches!(
                        keyword,
                        Keyword::Class | Keyword::Protocol | Keyword::Enum | Keyword::Typealias
                    ) =>
                {
                    if has_returned {
                        return Err(ParseError::AlreadyReturned { at });
                    }
                    Some(*keyword)
                }
                _ => None,
            };
            let top = match declaration {
                Some(Keyword::Class) => TopStatement::Class(self.class()?),
                Some(Keyword::Protocol) => TopStatement::Protocol(self.protocol()?),
                Some(Keyword::Enum) => TopStatement::Enum(self.enumeration()?),
                Some(_) => TopStatement::TypeAlias(self.type_alias()?),
                None => match self.statement(has_returned, Delimiters::NONE)? {
                    Some(stmt) => {
                        has_returned |= stmt.is_return();
                        TopStatement::Statement(stmt)
                    }
                    None => break,
                },
            };
            trace!(at = %top.at(), "top-level statement");
            chunk.push(top);
        }
        Ok(chunk)
    }

    fn block(&mut self, delimiters: Delimiters) -> Result<Block> {
        let mut body = Vec::new();
        let mut has_returned = false;
        while let Some(stmt) = self.statement(has_returned, delimiters)? {
            has_returned |= stmt.is_return();
            body.push(stmt);
        }
        Ok(body)
    }

    /// Returns `None` once a requested delimiter has been consumed, or at the end
    /// of a chunk.
    fn statement(&mut self, has_returned: bool, delimiters: Delimiters) -> Result<Option<Stmt>> {
        while self.match_operator(Operator::Semicolon).is_some() {}

        let Some((at, token)) = self.cursor.peek() else {
            return if delimiters.any() {
                Err(self.end_of_stream())
            } else {
                Ok(None)
            };
        };
        if let Token::Keyword(keyword) = token {
            if delimiters.accepts(*keyword) {
                self.cursor.skip();
                return Ok(None);
            }
        }
        if has_returned {
            return Err(ParseError::AlreadyReturned { at });
        }

        let stmt = match token {
            Token::Keyword(Keyword::Do) => {
                self.cursor.skip();
                stmt::Do::new(at, self.block(Delimiters::END)?)
            }
            Token::Keyword(Keyword::While) => {
                self.cursor.skip();
                let condition = self.expression()?;
                self.expect_keyword(Keyword::Do)?;
                stmt::While::new(at, condition, self.block(Delimiters::END)?)
            }
            Token::Keyword(Keyword::Repeat) => {
                self.cursor.skip();
                let body = self.block(Delimiters::UNTIL)?;
                stmt::Repeat::new(at, body, self.expression()?)
            }
            Token::Keyword(Keyword::If) => {
                self.cursor.skip();
                self.if_statement(at)?
            }
            Token::Keyword(Keyword::For) => {
                self.cursor.skip();
                self.for_statement(at)?
            }
            Token::Keyword(Keyword::Function) => {
                self.cursor.skip();
                self.function_statement(at)?
            }
            Token::Keyword(Keyword::Local) => {
                self.cursor.skip();
                if self.match_keyword(Keyword::Function).is_some() {
                    let (_, name) = self.identifier()?;
                    stmt::LocalFunction::new(at, name, self.function_body()?)
                } else {
                    self.local(at)?
                }
            }
            Token::Keyword(Keyword::Return) => {
                self.cursor.skip();
                let values = self.optional_expression_list()?;
                self.match_operator(Operator::Semicolon);
                stmt::Return::new(at, values)
            }
            Token::Keyword(Keyword::Break) => {
                self.cursor.skip();
                stmt::Break::new(at)
            }
            Token::Keyword(Keyword::Goto) => {
                self.cursor.skip();
                let (_, label) = self.identifier()?;
                stmt::Goto::new(at, label)
            }
            Token::Operator(Operator::DoubleColon) => {
                self.cursor.skip();
                let (_, name) = self.identifier()?;
                self.expect_operator(Operator::DoubleColon)?;
                stmt::Label::new(at, name)
            }
            Token::Identifier(_) | Token::Operator(Operator::RoundBracketLeft) => {
                self.assignment_or_call(at)?
            }
            other => return Err(ParseError::unexpected(at, other)),
        };
        Ok(Some(stmt))
    }

    fn if_statement(&mut self, at: TokenIndex) -> Result<Stmt> {
        let mut branches = Vec::new();
        let mut otherwise = None;
        loop {
            let condition = self.expression()?;
            self.expect_keyword(Keyword::Then)?;
            let body = self.block(Delimiters::IF_BRANCH)?;
            branches.push(Conditional { condition, body });
            match self.cursor.last() {
                Some((_, Token::Keyword(Keyword::Elseif))) => continue,
                Some((_, Token::Keyword(Keyword::Else))) => {
                    otherwise = Some(self.block(Delimiters::END)?);
                    break;
                }
                _ => break,
            }
        }
        Ok(stmt::If::new(at, branches, otherwise))
    }

    fn for_statement(&mut self, at: TokenIndex) -> Result<Stmt> {
        let mut variables = vec![self.typed_identifier()?];
        loop {
            let (token_at, token) = self.next()?;
            match token {
                Token::Operator(Operator::Comma) => variables.push(self.typed_identifier()?),
                Token::Operator(Operator::Equal) => {
                    if variables.len() != 1 {
                        return Err(ParseError::unexpected(token_at, token));
                    }
                    let variable = variables.remove(0);
                    return self.numeric_for(at, variable);
                }
                Token::Keyword(Keyword::In) => {
                    let iterators = self.expression_list()?;
                    self.expect_keyword(Keyword::Do)?;
                    let body = self.block(Delimiters::END)?;
                    return Ok(stmt::GenericFor::new(at, variables, iterators, body));
                }
                other => return Err(ParseError::unexpected(token_at, other)),
            }
        }
    }

    fn numeric_for(&mut self, at: TokenIndex, variable: TypedIdentifier) -> Result<Stmt> {
        let start = self.expression()?;
        self.expect_operator(Operator::Comma)?;
        let stop = self.expression()?;
        let step = match self.match_operator(Operator::Comma) {
            Some(_) => Some(self.expression()?),
            None => None,
        };
        self.expect_keyword(Keyword::Do)?;
        let body = self.block(Delimiters::END)?;
        Ok(stmt::NumericFor::new(at, variable, start, stop, step, body))
    }

    fn function_statement(&mut self, at: TokenIndex) -> Result<Stmt> {
        let (_, first) = self.identifier()?;
        let mut path = vec![first];
        let mut is_method = false;
        loop {
            if self.match_operator(Operator::Dot).is_some() {
                path.push(self.identifier()?.1);
            } else if self.match_operator(Operator::Colon).is_some() {
                path.push(self.identifier()?.1);
                is_method = true;
                break;
            } else {
                break;
            }
        }
        Ok(stmt::Function::new(at, path, is_method, self.function_body()?))
    }

    fn local(&mut self, at: TokenIndex) -> Result<Stmt> {
        let mut variables = vec![self.typed_identifier()?];
        while self.match_operator(Operator::Comma).is_some() {
            variables.push(self.typed_identifier()?);
        }
        let values = match self.match_operator(Operator::Equal) {
            Some(_) => self.expression_list()?,
            None => Vec::new(),
        };
        Ok(stmt::Local::new(at, variables, values))
    }

    fn assignment_or_call(&mut self, at: TokenIndex) -> Result<Stmt> {
        let first = match self.typed_target()? {
            Some(typed) => AssignmentVariable::Typed(typed),
            None => {
                let prefix = self.prefix_expression()?;
                match self.cursor.peek() {
                    Some((_, Token::Operator(Operator::Comma | Operator::Equal))) => {
                        assignment_variable(prefix)?
                    }
                    Some((_, Token::Operator(operator))) => {
                        match CompoundOperator::from_operator(*operator) {
                            Some(compound) => {
                                self.cursor.skip();
                                let target = assignment_variable(prefix)?;
                                let value = self.expression()?;
                                return Ok(stmt::CompoundAssignment::new(
                                    at, target, compound, value,
                                ));
                            }
                            None => return call_statement(at, prefix),
                        }
                    }
                    _ => return call_statement(at, prefix),
                }
            }
        };

        let mut targets = vec![first];
        while self.match_operator(Operator::Comma).is_some() {
            let target = match self.typed_target()? {
                Some(typed) => AssignmentVariable::Typed(typed),
                None => assignment_variable(self.prefix_expression()?)?,
            };
            targets.push(target);
        }
        self.expect_operator(Operator::Equal)?;
        let values = self.expression_list()?;
        Ok(stmt::Assignment::new(at, targets, values))
    }

    /// `name: Type` as an assignment target. Taken only when `,` or `=` follows the
    /// annotation, since `name:method()` starts an invocation.
    fn typed_target(&mut self) -> Result<Option<TypedIdentifier>> {
        let typed_start = matches!(
            (self.cursor.peek(), self.cursor.peek2()),
            (
                Some((_, Token::Identifier(_))),
                Some((_, Token::Operator(Operator::Colon)))
            )
        );
        if !typed_start {
            return Ok(None);
        }

        let mark = self.cursor.position();
        let (at, name) = self.identifier()?;
        self.cursor.skip();
        if let Ok(ty) = self.parse_type() {
            if self.check_operator(Operator::Comma) || self.check_operator(Operator::Equal) {
                return Ok(Some(TypedIdentifier {
                    name,
                    ty: Some(ty),
                    at,
                }));
            }
        }
        self.cursor.rewind(mark);
        Ok(None)
    }

    fn typed_identifier(&mut self) -> Result<TypedIdentifier> {
        let (at, name) = self.identifier()?;
        let ty = match self.match_operator(Operator::Colon) {
            Some(_) => Some(self.parse_type()?),
            None => None,
        };
        Ok(TypedIdentifier { name, ty, at })
    }

    fn next(&mut self) -> Result<(TokenIndex, &'l Token)> {
        match self.cursor.advance() {
            Some(next) => Ok(next),
            None => {
                self.cursor.undo();
                Err(self.end_of_stream())
            }
        }
    }

    fn end_of_stream(&self) -> ParseError {
        ParseError::EndOfStream {
            at: self.cursor.end_index(),
        }
    }

    fn identifier(&mut self) -> Result<(TokenIndex, String)> {
        match self.next()? {
            (at, Token::Identifier(name)) => Ok((at, name.clone())),
            (at, other) => Err(ParseError::unexpected(at, other)),
        }
    }

    fn expect_keyword(&mut self, keyword: Keyword) -> Result<TokenIndex> {
        match self.next()? {
            (at, token) if token.is_keyword(keyword) => Ok(at),
            (at, other) => Err(ParseError::unexpected(at, other)),
        }
    }

    fn expect_operator(&mut self, operator: Operator) -> Result<TokenIndex> {
        match self.next()? {
            (at, token) if token.is_operator(operator) => Ok(at),
            (at, other) => Err(ParseError::unexpected(at, other)),
        }
    }

    fn check_operator(&self, operator: Operator) -> bool {
        matches!(self.cursor.peek(), Some((_, token)) if token.is_operator(operator))
    }

    fn match_operator(&mut self, operator: Operator) -> Option<TokenIndex> {
        match self.cursor.peek() {
            Some((at, token)) if token.is_operator(operator) => {
                self.cursor.skip();
                Some(at)
            }
            _ => None,
        }
    }

    fn match_keyword(&mut self, keyword: Keyword) -> Option<TokenIndex> {
        match self.cursor.peek() {
            Some((at, token)) if token.is_keyword(keyword) => {
                self.cursor.skip();
                Some(at)
            }
            _ => None,
        }
    }

    fn expression_list(&mut self) -> Result<ListExpr> {
        let mut list = vec![self.expression()?];
        while self.match_operator(Operator::Comma).is_some() {
            list.push(self.expression()?);
        }
        Ok(list)
    }

    /// An expression list that may be empty, as after `return`.
    fn optional_expression_list(&mut self) -> Result<ListExpr> {
        let Some(first) = self.try_expression(expr_parser::Precedence::Lowest)? else {
            return Ok(Vec::new());
        };
        let mut list = vec![first];
        while self.match_operator(Operator::Comma).is_some() {
            list.push(self.expression()?);
        }
        Ok(list)
    }
}

fn assignment_variable(prefix: Expr) -> Result<AssignmentVariable> {
    AssignmentVariable::try_from(prefix)
        .map_err(|expr| ParseError::InvalidAssignmentTarget { at: expr.at() })
}

fn call_statement(at: TokenIndex, prefix: Expr) -> Result<Stmt> {
    let call = Callable::try_from(prefix)
        .map_err(|expr| ParseError::InvalidCallTarget { at: expr.at() })?;
    Ok(stmt::Call::new(at, call))
}

#[cfg(test)]
mod test {
    use crate::ast::{
        expr::{Expr, ExprTypes},
        parse,
        stmt::StmtTypes,
        AssignmentVariable, Callable, NodeOperator, ParseError, TableKey, TopStatement,
    };
    use crate::lexer::{Lexer, Token, TokenIndex};

    fn parse_source(source: &str) -> Result<Vec<TopStatement>, ParseError> {
        let lexer = Lexer::tokenize(source).unwrap();
        parse(&lexer)
    }

    fn statements(source: &str) -> Vec<StmtTypes> {
        parse_source(source)
            .unwrap()
            .into_iter()
            .map(|top| match top {
                TopStatement::Statement(stmt) => *stmt,
                other => panic!("expected a statement, got {other:?}"),
            })
            .collect()
    }

    fn operator(op: NodeOperator) -> &'static str {
        match op {
            NodeOperator::Or => "or",
            NodeOperator::And => "and",
            NodeOperator::Equal => "==",
            NodeOperator::NotEqual => "~=",
            NodeOperator::LessThan => "<",
            NodeOperator::LessThanEqual => "<=",
            NodeOperator::GreaterThan => ">",
            NodeOperator::GreaterThanEqual => ">=",
            NodeOperator::Concatenate => "..",
            NodeOperator::Plus => "+",
            NodeOperator::Minus => "-",
            NodeOperator::Multiply => "*",
            NodeOperator::Divide => "/",
            NodeOperator::Modulus => "%",
            NodeOperator::Exponent => "^",
            NodeOperator::Not => "not",
            NodeOperator::Length => "#",
        }
    }

    fn render(expr: &Expr) -> String {
        match &**expr {
            ExprTypes::Nil(_) => "nil".into(),
            ExprTypes::VarArgs(_) => "...".into(),
            ExprTypes::Bool(b) => b.value.to_string(),
            ExprTypes::Number(n) => n.value.to_string(),
            ExprTypes::Str(s) => format!("{:?}", s.value),
            ExprTypes::Function(_) => "function".into(),
            ExprTypes::Operation(op) => match &op.right {
                Some(right) => format!(
                    "({} {} {})",
                    operator(op.operator),
                    render(&op.left),
                    render(right)
                ),
                None => format!("({} {})", operator(op.operator), render(&op.left)),
            },
            ExprTypes::Table(table) => {
                let items: Vec<String> = table
                    .items
                    .iter()
                    .map(|item| match &item.key {
                        Some(TableKey::Name(name)) => format!("{name}={}", render(&item.value)),
                        Some(TableKey::Expression(key)) => {
                            format!("[{}]={}", render(key), render(&item.value))
                        }
                        None => render(&item.value),
                    })
                    .collect();
                format!("{{{}}}", items.join(" "))
            }
            ExprTypes::Parenthesized(p) => format!("({})", render(&p.expression)),
            ExprTypes::Call(call) => format!("{}({})", render(&call.callee), list(&call.arguments)),
            ExprTypes::Invocation(inv) => format!(
                "{}:{}({})",
                render(&inv.callee),
                inv.method,
                list(&inv.arguments)
            ),
            ExprTypes::Variable(var) => var.name.clone(),
            ExprTypes::ExpressionIndex(index) => {
                format!("{}[{}]", render(&index.indexed), render(&index.index))
            }
            ExprTypes::IdentifierIndex(index) => format!("{}.{}", render(&index.indexed), index.name),
            ExprTypes::Is(is) => format!("(is {} {:?})", render(&is.expression), is.ty),
        }
    }

    fn list(exprs: &[Expr]) -> String {
        exprs.iter().map(render).collect::<Vec<_>>().join(", ")
    }

    fn expression(source: &str) -> String {
        match &statements(&format!("return {source}"))[..] {
            [StmtTypes::Return(ret)] => list(&ret.values),
            other => panic!("expected a return, got {other:?}"),
        }
    }

    #[test]
    fn precedence_climbing() {
        assert_eq!(expression("1+2*3"), "(+ 1 (* 2 3))");
        assert_eq!(expression("2^2^3"), "(^ 2 (^ 2 3))");
        assert_eq!(expression("1 - 2 - 3"), "(- (- 1 2) 3)");
        assert_eq!(expression("a .. b .. c"), "(.. a (.. b c))");
        assert_eq!(expression("a or b and c == d"), "(or a (and b (== c d)))");
        assert_eq!(expression("-a * b"), "(* (- a) b)");
        assert_eq!(expression("-2^2"), "(- (^ 2 2))");
        assert_eq!(expression("not a == b"), "(== (not a) b)");
        assert_eq!(expression("#t + 1"), "(+ (# t) 1)");
    }

    #[test]
    fn is_binds_tighter_than_binary_operators() {
        assert_eq!(
            expression("a and b is Foo"),
            r#"(and a (is b Name { name: "Foo", at: TokenIndex(5) }))"#
        );
    }

    #[test]
    fn prefix_suffix_chains_keep_seed_index() {
        let stmts = statements("local x = a.b[c]:d(1)('s'){}");
        let [StmtTypes::Local(local)] = &stmts[..] else {
            panic!("expected a local, got {stmts:?}");
        };
        assert_eq!(render(&local.values[0]), r#"a.b[c]:d(1)("s")({})"#);
        assert_eq!(local.values[0].at(), TokenIndex::new(3));
    }

    #[test]
    fn tables() {
        assert_eq!(
            expression("{1, x = 2; [k] = 3, y, }"),
            "{1 x=2 [k]=3 y}"
        );
        assert_eq!(expression("{}"), "{}");
        assert_eq!(
            parse_source("return { x = }").unwrap_err(),
            ParseError::ExpectedExpression { at: TokenIndex::new(4) }
        );
    }

    #[test]
    fn locals_and_local_functions() {
        let stmts = statements("local a, b: Number? = 1, 2\nlocal function f() end");
        match &stmts[..] {
            [StmtTypes::Local(local), StmtTypes::LocalFunction(function)] => {
                assert_eq!(local.variables.len(), 2);
                assert_eq!(local.values.len(), 2);
                assert!(local.variables[0].ty.is_none());
                assert!(local.variables[1].ty.is_some());
                assert_eq!(function.name, "f");
            }
            other => panic!("unexpected statements {other:?}"),
        }
    }

    #[test]
    fn for_loop_kinds() {
        assert!(matches!(
            statements("for i = 1, 10 do end")[..],
            [StmtTypes::NumericFor(_)]
        ));
        assert!(matches!(
            statements("for i: Number = 1, 10, 2 do end")[..],
            [StmtTypes::NumericFor(ref numeric)] if numeric.step.is_some()
        ));
        assert!(matches!(
            statements("for k, v in pairs(t) do end")[..],
            [StmtTypes::GenericFor(ref generic)] if generic.variables.len() == 2
        ));
    }

    #[test]
    fn numeric_for_bounds() {
        assert!(matches!(
            parse_source("for a, b = 1, 2, 3, 4 do end"),
            Err(ParseError::UnexpectedToken { at, .. }) if at == TokenIndex::new(4)
        ));
        assert!(matches!(
            parse_source("for a = 1, 2, 3, 4 do end"),
            Err(ParseError::UnexpectedToken { at, .. }) if at == TokenIndex::new(8)
        ));
        assert!(matches!(
            parse_source("for a = 1 do end"),
            Err(ParseError::UnexpectedToken { at, .. }) if at == TokenIndex::new(4)
        ));
    }

    #[test]
    fn if_chains() {
        let stmts = statements("if a then x() elseif b then y() elseif c then else z() end");
        let [StmtTypes::If(chain)] = &stmts[..] else {
            panic!("expected an if, got {stmts:?}");
        };
        assert_eq!(chain.branches.len(), 3);
        assert!(chain.branches[2].body.is_empty());
        assert_eq!(chain.otherwise.as_ref().map(Vec::len), Some(1));

        let stmts = statements("if a then end");
        let [StmtTypes::If(chain)] = &stmts[..] else {
            panic!("expected an if, got {stmts:?}");
        };
        assert!(chain.otherwise.is_none());
    }

    #[test]
    fn loops_and_jumps() {
        let stmts = statements(
            "while x do break end repeat x = x - 1 until x == 0 do goto done end ::done:: ;;",
        );
        assert!(matches!(
            stmts[..],
            [
                StmtTypes::While(_),
                StmtTypes::Repeat(_),
                StmtTypes::Do(_),
                StmtTypes::Label(_)
            ]
        ));
    }

    #[test]
    fn function_declarations() {
        let stmts = statements("function a.b.c:m(x: T, ...): R, S end function f() end");
        match &stmts[..] {
            [StmtTypes::Function(method), StmtTypes::Function(plain)] => {
                assert_eq!(method.path, ["a", "b", "c", "m"]);
                assert!(method.is_method);
                assert!(method.function.signature.is_vararg);
                assert_eq!(method.function.signature.returns.len(), 2);
                assert!(!plain.is_method);
            }
            other => panic!("unexpected statements {other:?}"),
        }
    }

    #[test]
    fn assignments_and_calls() {
        let stmts = statements("a, t.x, t[1] = 1, 2, 3 x: Number = 4 obj:method() print 'hi' n += 1");
        match &stmts[..] {
            [StmtTypes::Assignment(multi), StmtTypes::Assignment(typed), StmtTypes::Call(invoke), StmtTypes::Call(call), StmtTypes::CompoundAssignment(compound)] =>
            {
                assert!(matches!(
                    multi.targets[..],
                    [
                        AssignmentVariable::Typed(_),
                        AssignmentVariable::IdentifierIndex(_),
                        AssignmentVariable::ExpressionIndex(_)
                    ]
                ));
                assert!(matches!(
                    &typed.targets[..],
                    [AssignmentVariable::Typed(ident)] if ident.ty.is_some()
                ));
                assert!(matches!(invoke.call, Callable::Invocation(_)));
                assert!(matches!(call.call, Callable::Call(_)));
                assert_eq!(render(&compound.value), "1");
            }
            other => panic!("unexpected statements {other:?}"),
        }
    }

    #[test]
    fn invalid_targets() {
        assert_eq!(
            parse_source("f() = 1").unwrap_err(),
            ParseError::InvalidAssignmentTarget { at: TokenIndex::new(0) }
        );
        assert_eq!(
            parse_source("x = 1 (y) += 2").unwrap_err(),
            ParseError::InvalidAssignmentTarget { at: TokenIndex::new(3) }
        );
        assert_eq!(
            parse_source("a.b").unwrap_err(),
            ParseError::InvalidCallTarget { at: TokenIndex::new(0) }
        );
    }

    #[test]
    fn statements_after_return() {
        assert!(parse_source("do return 1; end").is_ok());
        assert_eq!(
            parse_source("do return 1 x() end").unwrap_err(),
            ParseError::AlreadyReturned { at: TokenIndex::new(3) }
        );
        assert_eq!(
            parse_source("return\nclass A end").unwrap_err(),
            ParseError::AlreadyReturned { at: TokenIndex::new(1) }
        );
    }

    #[test]
    fn missing_tokens() {
        assert_eq!(
            parse_source("while x do").unwrap_err(),
            ParseError::EndOfStream { at: TokenIndex::new(3) }
        );
        assert_eq!(
            parse_source("x = ").unwrap_err(),
            ParseError::ExpectedExpression { at: TokenIndex::new(2) }
        );
        assert_eq!(
            parse_source("end").unwrap_err(),
            ParseError::UnexpectedToken {
                token: Token::Keyword(crate::lexer::Keyword::End),
                at: TokenIndex::new(0),
            }
        );
    }
}
