use std::collections::HashMap;

use tracing::trace;

use super::{ResolvedType, Resolver, ResolverError};
use crate::ast::{
    expr::{self, Expr},
    stmt::{self, Stmt},
    AssignmentVariable, Block, Callable, Chunk, ClassStatement, FunctionBody, FunctionSignature,
    ProtocolStatement, TableKey, TopStatement, Type, TypedIdentifier, Visitor,
};
use crate::lexer::TokenIndex;

type Ret = Result<(), ResolverError>;

/// Walks a chunk and resolves every type annotation in it.
pub(super) struct AnnotationChecker<'r, 'a> {
    resolver: &'r Resolver<'a>,
    found: HashMap<TokenIndex, ResolvedType>,
}

impl<'r, 'a> AnnotationChecker<'r, 'a> {
    pub(super) fn check(
        resolver: &'r Resolver<'a>,
        chunk: &Chunk,
    ) -> Result<HashMap<TokenIndex, ResolvedType>, ResolverError> {
        let mut me = Self {
            resolver,
            found: HashMap::new(),
        };
        for top in chunk {
            me.top_statement(top)?;
        }
        trace!("resolved {} annotations", me.found.len());
        Ok(me.found)
    }

    fn top_statement(&mut self, top: &TopStatement) -> Ret {
        match top {
            TopStatement::Class(class) => {
                for member in &class.body {
                    match member {
                        ClassStatement::Property(property) => {
                            self.annotation(&property.ty)?;
                            self.optional_expr(&property.default)?;
                        }
                        ClassStatement::Default { value, .. } => self.expr(value)?,
                        ClassStatement::Function { function, .. } => self.function(function)?,
                    }
                }
                Ok(())
            }
            TopStatement::Protocol(protocol) => {
                for member in &protocol.body {
                    match member {
                        ProtocolStatement::Property { ty, .. } => self.annotation(ty)?,
                        ProtocolStatement::Function { signature, .. } => self.signature(signature)?,
                    }
                }
                Ok(())
            }
            TopStatement::Enum(enumeration) => {
                for case in &enumeration.cases {
                    for associated in &case.associated {
                        self.annotation(&associated.ty)?;
                    }
                    self.optional_expr(&case.raw_value)?;
                }
                Ok(())
            }
            TopStatement::TypeAlias(alias) => self.annotation(&alias.ty),
            TopStatement::Statement(stmt) => self.stmt(stmt),
        }
    }

    fn annotation(&mut self, ty: &Type) -> Ret {
        let resolved = self.resolver.resolve_type(ty)?;
        self.found.insert(ty.at(), resolved);
        Ok(())
    }

    fn typed_identifiers(&mut self, identifiers: &[TypedIdentifier]) -> Ret {
        for ty in identifiers.iter().filter_map(|ident| ident.ty.as_ref()) {
            self.annotation(ty)?;
        }
        Ok(())
    }

    fn signature(&mut self, signature: &FunctionSignature) -> Ret {
        self.typed_identifiers(&signature.parameters)?;
        for ty in &signature.returns {
            self.annotation(ty)?;
        }
        Ok(())
    }

    fn function(&mut self, function: &FunctionBody) -> Ret {
        self.signature(&function.signature)?;
        self.block(&function.body)
    }

    fn block(&mut self, block: &Block) -> Ret {
        for stmt in block {
            self.stmt(stmt)?;
        }
        Ok(())
    }

    fn stmt(&mut self, stmt: &Stmt) -> Ret {
        stmt.accept(self)
    }

    fn expr(&mut self, expr: &Expr) -> Ret {
        expr.accept(self)
    }

    fn exprs(&mut self, exprs: &[Expr]) -> Ret {
        for expr in exprs {
            self.expr(expr)?;
        }
        Ok(())
    }

    fn optional_expr(&mut self, expr: &Option<Expr>) -> Ret {
        match expr {
            Some(expr) => self.expr(expr),
            None => Ok(()),
        }
    }

    fn target(&mut self, target: &AssignmentVariable) -> Ret {
        match target {
            AssignmentVariable::Typed(ident) => match &ident.ty {
                Some(ty) => self.annotation(ty),
                None => Ok(()),
            },
            AssignmentVariable::ExpressionIndex(index) => self.visit(index),
            AssignmentVariable::IdentifierIndex(index) => self.visit(index),
        }
    }
}

impl Visitor<expr::Nil, Ret> for AnnotationChecker<'_, '_> {
    fn visit(&mut self, _node: &expr::Nil) -> Ret {
        Ok(())
    }
}

impl Visitor<expr::VarArgs, Ret> for AnnotationChecker<'_, '_> {
    fn visit(&mut self, _node: &expr::VarArgs) -> Ret {
        Ok(())
    }
}

impl Visitor<expr::Bool, Ret> for AnnotationChecker<'_, '_> {
    fn visit(&mut self, _node: &expr::Bool) -> Ret {
        Ok(())
    }
}

impl Visitor<expr::Number, Ret> for AnnotationChecker<'_, '_> {
    fn visit(&mut self, _node: &expr::Number) -> Ret {
        Ok(())
    }
}

impl Visitor<expr::Str, Ret> for AnnotationChecker<'_, '_> {
    fn visit(&mut self, _node: &expr::Str) -> Ret {
        Ok(())
    }
}

impl Visitor<expr::Function, Ret> for AnnotationChecker<'_, '_> {
    fn visit(&mut self, node: &expr::Function) -> Ret {
        self.function(&node.function)
    }
}

impl Visitor<expr::Operation, Ret> for AnnotationChecker<'_, '_> {
    fn visit(&mut self, node: &expr::Operation) -> Ret {
        self.expr(&node.left)?;
        self.optional_expr(&node.right)
    }
}

impl Visitor<expr::Table, Ret> for AnnotationChecker<'_, '_> {
    fn visit(&mut self, node: &expr::Table) -> Ret {
        for item in &node.items {
            if let Some(TableKey::Expression(key)) = &item.key {
                self.expr(key)?;
            }
            self.expr(&item.value)?;
        }
        Ok(())
    }
}

impl Visitor<expr::Parenthesized, Ret> for AnnotationChecker<'_, '_> {
    fn visit(&mut self, node: &expr::Parenthesized) -> Ret {
        self.expr(&node.expression)
    }
}

impl Visitor<expr::Call, Ret> for AnnotationChecker<'_, '_> {
    fn visit(&mut self, node: &expr::Call) -> Ret {
        self.expr(&node.callee)?;
        self.exprs(&node.arguments)
    }
}

impl Visitor<expr::Invocation, Ret> for AnnotationChecker<'_, '_> {
    fn visit(&mut self, node: &expr::Invocation) -> Ret {
        self.expr(&node.callee)?;
        self.exprs(&node.arguments)
    }
}

impl Visitor<expr::Variable, Ret> for AnnotationChecker<'_, '_> {
    fn visit(&mut self, _node: &expr::Variable) -> Ret {
        Ok(())
    }
}

impl Visitor<expr::ExpressionIndex, Ret> for AnnotationChecker<'_, '_> {
    fn visit(&mut self, node: &expr::ExpressionIndex) -> Ret {
        self.expr(&node.indexed)?;
        self.expr(&node.index)
    }
}

impl Visitor<expr::IdentifierIndex, Ret> for AnnotationChecker<'_, '_> {
    fn visit(&mut self, node: &expr::IdentifierIndex) -> Ret {
        self.expr(&node.indexed)
    }
}

impl Visitor<expr::Is, Ret> for AnnotationChecker<'_, '_> {
    fn visit(&mut self, node: &expr::Is) -> Ret {
        self.expr(&node.expression)?;
        self.annotation(&node.ty)
    }
}

impl Visitor<stmt::Do, Ret> for AnnotationChecker<'_, '_> {
    fn visit(&mut self, node: &stmt::Do) -> Ret {
        self.block(&node.body)
    }
}

impl Visitor<stmt::Assignment, Ret> for AnnotationChecker<'_, '_> {
    fn visit(&mut self, node: &stmt::Assignment) -> Ret {
        for target in &node.targets {
            self.target(target)?;
        }
        self.exprs(&node.values)
    }
}

impl Visitor<stmt::CompoundAssignment, Ret> for AnnotationChecker<'_, '_> {
    fn visit(&mut self, node: &stmt::CompoundAssignment) -> Ret {
        self.target(&node.target)?;
        self.expr(&node.value)
    }
}

impl Visitor<stmt::While, Ret> for AnnotationChecker<'_, '_> {
    fn visit(&mut self, node: &stmt::While) -> Ret {
        self.expr(&node.condition)?;
        self.block(&node.body)
    }
}

impl Visitor<stmt::Repeat, Ret> for AnnotationChecker<'_, '_> {
    fn visit(&mut self, node: &stmt::Repeat) -> Ret {
        self.block(&node.body)?;
        self.expr(&node.condition)
    }
}

impl Visitor<stmt::If, Ret> for AnnotationChecker<'_, '_> {
    fn visit(&mut self, node: &stmt::If) -> Ret {
        for branch in &node.branches {
            self.expr(&branch.condition)?;
            self.block(&branch.body)?;
        }
        match &node.otherwise {
            Some(block) => self.block(block),
            None => Ok(()),
        }
    }
}

impl Visitor<stmt::NumericFor, Ret> for AnnotationChecker<'_, '_> {
    fn visit(&mut self, node: &stmt::NumericFor) -> Ret {
        self.typed_identifiers(std::slice::from_ref(&node.variable))?;
        self.expr(&node.start)?;
        self.expr(&node.stop)?;
        self.optional_expr(&node.step)?;
        self.block(&node.body)
    }
}

impl Visitor<stmt::GenericFor, Ret> for AnnotationChecker<'_, '_> {
    fn visit(&mut self, node: &stmt::GenericFor) -> Ret {
        self.typed_identifiers(&node.variables)?;
        self.exprs(&node.iterators)?;
        self.block(&node.body)
    }
}

impl Visitor<stmt::Local, Ret> for AnnotationChecker<'_, '_> {
    fn visit(&mut self, node: &stmt::Local) -> Ret {
        self.typed_identifiers(&node.variables)?;
        self.exprs(&node.values)
    }
}

impl Visitor<stmt::LocalFunction, Ret> for AnnotationChecker<'_, '_> {
    fn visit(&mut self, node: &stmt::LocalFunction) -> Ret {
        self.function(&node.function)
    }
}

impl Visitor<stmt::Function, Ret> for AnnotationChecker<'_, '_> {
    fn visit(&mut self, node: &stmt::Function) -> Ret {
        self.function(&node.function)
    }
}

impl Visitor<stmt::Goto, Ret> for AnnotationChecker<'_, '_> {
    fn visit(&mut self, _node: &stmt::Goto) -> Ret {
        Ok(())
    }
}

impl Visitor<stmt::Label, Ret> for AnnotationChecker<'_, '_> {
    fn visit(&mut self, _node: &stmt::Label) -> Ret {
        Ok(())
    }
}

impl Visitor<stmt::Return, Ret> for AnnotationChecker<'_, '_> {
    fn visit(&mut self, node: &stmt::Return) -> Ret {
        self.exprs(&node.values)
    }
}

impl Visitor<stmt::Break, Ret> for AnnotationChecker<'_, '_> {
    fn visit(&mut self, _node: &stmt::Break) -> Ret {
        Ok(())
    }
}

impl Visitor<stmt::Call, Ret> for AnnotationChecker<'_, '_> {
    fn visit(&mut self, node: &stmt::Call) -> Ret {
        match &node.call {
            Callable::Call(call) => self.visit(call),
            Callable::Invocation(invocation) => self.visit(invocation),
        }
    }
}

#[cfg(test)]
mod test {
    use crate::ast::parse;
    use crate::lexer::{Lexer, TokenIndex};
    use crate::resolver::{Resolver, ResolverError};

    fn annotations(source: &str) -> Result<Vec<(usize, String)>, ResolverError> {
        let lexer = Lexer::tokenize(source).unwrap();
        let chunks = [parse(&lexer).unwrap()];
        let resolver = Resolver::resolve(&chunks)?;
        Ok(resolver
            .annotations(0)
            .into_iter()
            .map(|(at, ty)| (at.index(), ty.display(&resolver).to_string()))
            .collect())
    }

    #[test]
    fn every_annotation_is_recorded() {
        let found = annotations(
            "protocol Shape end
             class Circle: Shape
                 radius: Number?
                 function scale(by: Number): Circle end
             end
             class Number end
             local shapes: [Shape] = {}
             for i: Number = 1, 2 do
                 local ok = shapes[i] is Circle.Type
             end",
        )
        .unwrap();
        let names: Vec<&str> = found.iter().map(|(_, ty)| ty.as_str()).collect();
        assert_eq!(
            names,
            ["Number?", "Number", "Circle", "[Shape]", "Number", "Circle.Type"]
        );
    }

    #[test]
    fn nested_function_literals_are_checked() {
        let err = annotations("x = f(function(a: Missing) end)").unwrap_err();
        assert_eq!(
            err,
            ResolverError::UndefinedType {
                name: "Missing".into(),
                at: TokenIndex::new(8),
            }
        );
    }

    #[test]
    fn any_is_builtin() {
        let found = annotations("local x: Any, y: [Any: Any?]").unwrap();
        assert_eq!(found[0], (3, "Any".to_string()));
        assert_eq!(found[1], (7, "[Any: Any?]".to_string()));
    }
}
