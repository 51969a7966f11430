use std::fmt::{Debug, Formatter};

use crate::lexer::{Operator, TokenIndex};

pub trait Visitor<NodeType, R> {
    fn visit(&mut self, node: &NodeType) -> R;
}

pub trait Accepts<V, R> {
    fn accept(&self, visitor: &mut V) -> R;
}

/// Generates one struct per node kind, all of them carrying the index of their
/// leading token, plus the enum tying them together.
macro_rules! ast_nodes {
    { [$enum_name:ident] $($node_type:ident : $($member_type:ident $member_name:ident),* ; )+ } => {
        #[derive(Clone)]
        pub enum $enum_name {
            $( $node_type ( $node_type ) ),+
        }

        impl Debug for $enum_name {
            fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
                match self {
                    $(Self::$node_type(typ) => typ.fmt(f) ),+
                }
            }
        }

        impl $enum_name {
            pub fn at(&self) -> TokenIndex {
                match self {
                    $(Self::$node_type(typ) => typ.at ),+
                }
            }

            pub fn accept<V, R>(&self, visitor: &mut V) -> R where
                $( V: Visitor<$node_type, R> ),+ {
                use $enum_name::*;
                    match self {
                        $($node_type(typ) => visitor.visit(typ) ),+
                    }
            }
        }

        impl<V, R> Accepts<V, R> for Box<$enum_name> where
                $( V: Visitor<$node_type, R> ),+ {
            fn accept(&self, visitor: &mut V) -> R {
                use $enum_name::*;
                    match **self {
                        $($node_type(ref typ) => visitor.visit(typ) ),+
                    }
            }
        }

        $(
        impl<V, R> Accepts<V, R> for $node_type where
            V: Visitor<$node_type, R>  {
            fn accept(&self, visitor: &mut V) -> R {
                visitor.visit(self)
            }
        }

        #[derive(Clone, Debug)]
        pub struct $node_type {
            pub at: TokenIndex,
            $( pub $member_name: $member_type),*
        }

        impl $node_type {
            #[allow(clippy::new_ret_no_self)]
            pub fn new(at: TokenIndex, $($member_name: $member_type),* ) -> Box<$enum_name> {
                Box::new( $enum_name::$node_type($node_type {
                    at,
                    $($member_name),*}))
            }

            /// Create a new AST node without wrapping it in the enum
            pub fn new_bare(at: TokenIndex, $($member_name: $member_type),* ) -> Self {
                $node_type {
                    at,
                    $($member_name),*
                }
            }
        }

        impl From<$node_type> for Box<$enum_name> {
            fn from(val: $node_type) -> Self {
                Box::new($enum_name::$node_type(val))
            }
        }

        impl TryFrom<Box<$enum_name>> for $node_type {
            type Error = Box<$enum_name>;
            fn try_from(value: Box<$enum_name>) -> Result<Self, Self::Error> {
                match *value {
                    $enum_name::$node_type(me) => Ok(me),
                    other => Err(Box::new(other)),
                }
            }
        }
        )+
    };
}

pub type Name = String;

#[derive(Clone, Debug, PartialEq)]
pub enum Type {
    Optional { inner: Box<Type>, at: TokenIndex },
    Array { element: Box<Type>, at: TokenIndex },
    Dictionary { key: Box<Type>, value: Box<Type>, at: TokenIndex },
    Name { name: Name, at: TokenIndex },
    /// `Parent.Name`, only meaningful as `Parent.Type`.
    Index { parent: Name, name: Name, at: TokenIndex },
}

impl Type {
    pub fn at(&self) -> TokenIndex {
        match self {
            Type::Optional { at, .. }
            | Type::Array { at, .. }
            | Type::Dictionary { at, .. }
            | Type::Name { at, .. }
            | Type::Index { at, .. } => *at,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct TypedIdentifier {
    pub name: Name,
    pub ty: Option<Type>,
    pub at: TokenIndex,
}

#[derive(Clone, Debug, Default)]
pub struct FunctionSignature {
    pub parameters: Vec<TypedIdentifier>,
    pub returns: Vec<Type>,
    pub is_vararg: bool,
}

#[derive(Clone, Debug)]
pub struct FunctionBody {
    pub signature: FunctionSignature,
    pub body: Block,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum NodeOperator {
    Or,
    And,
    Equal,
    NotEqual,
    LessThan,
    LessThanEqual,
    GreaterThan,
    GreaterThanEqual,
    Concatenate,
    Plus,
    Minus,
    Multiply,
    Divide,
    Modulus,
    Exponent,
    Not,
    Length,
}

impl NodeOperator {
    pub fn binary(operator: Operator) -> Option<Self> {
        Some(match operator {
            Operator::DoubleEqual => Self::Equal,
            Operator::NotEqual => Self::NotEqual,
            Operator::LessThan => Self::LessThan,
            Operator::LessThanEqual => Self::LessThanEqual,
            Operator::GreaterThan => Self::GreaterThan,
            Operator::GreaterThanEqual => Self::GreaterThanEqual,
            Operator::Concatenate => Self::Concatenate,
            Operator::Plus => Self::Plus,
            Operator::Minus => Self::Minus,
            Operator::Multiply => Self::Multiply,
            Operator::Divide => Self::Divide,
            Operator::Modulus => Self::Modulus,
            Operator::Exponent => Self::Exponent,
            _ => return None,
        })
    }

    pub fn is_unary(self) -> bool {
        matches!(self, Self::Minus | Self::Not | Self::Length)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum CompoundOperator {
    Plus,
    Minus,
    Multiply,
    Divide,
    Modulus,
    Exponent,
}

impl CompoundOperator {
    pub fn from_operator(operator: Operator) -> Option<Self> {
        Some(match operator {
            Operator::PlusEqual => Self::Plus,
            Operator::MinusEqual => Self::Minus,
            Operator::MultiplyEqual => Self::Multiply,
            Operator::DivideEqual => Self::Divide,
            Operator::ModulusEqual => Self::Modulus,
            Operator::ExponentEqual => Self::Exponent,
            _ => return None,
        })
    }
}

#[derive(Clone, Debug)]
pub enum TableKey {
    Expression(expr::Expr),
    Name(Name),
}

#[derive(Clone, Debug)]
pub struct TableItem {
    pub key: Option<TableKey>,
    pub value: expr::Expr,
}

pub type Block = Vec<stmt::Stmt>;

pub mod expr {
    use super::*;

    ast_nodes! { [ ExprTypes ]
        Nil             : ;
        VarArgs         : ;
        Bool            : bool value;
        Number          : f64 value;
        Str             : String value;
        Function        : FunctionBody function;
        Operation       : NodeOperator operator, Expr left, OptionExpr right;
        Table           : ListTableItem items;
        Parenthesized   : Expr expression;
        Call            : Expr callee, ListExpr arguments;
        Invocation      : Expr callee, Name method, ListExpr arguments;
        Variable        : Name name;
        ExpressionIndex : Expr indexed, Expr index;
        IdentifierIndex : Expr indexed, Name name;
        Is              : Expr expression, Type ty;
    }

    pub type Expr = Box<ExprTypes>;
    pub type ListExpr = Vec<Expr>;
    type OptionExpr = Option<Expr>;
    type ListTableItem = Vec<TableItem>;

    impl ExprTypes {
        /// Whether the node can start a chain of index and call suffixes.
        pub fn is_prefix(&self) -> bool {
            matches!(
                self,
                ExprTypes::Variable(_)
                    | ExprTypes::Parenthesized(_)
                    | ExprTypes::ExpressionIndex(_)
                    | ExprTypes::IdentifierIndex(_)
                    | ExprTypes::Call(_)
                    | ExprTypes::Invocation(_)
            )
        }
    }
}

/// Anything that may stand left of `=`.
#[derive(Clone, Debug)]
pub enum AssignmentVariable {
    Typed(TypedIdentifier),
    ExpressionIndex(expr::ExpressionIndex),
    IdentifierIndex(expr::IdentifierIndex),
}

impl AssignmentVariable {
    pub fn at(&self) -> TokenIndex {
        match self {
            AssignmentVariable::Typed(ident) => ident.at,
            AssignmentVariable::ExpressionIndex(index) => index.at,
            AssignmentVariable::IdentifierIndex(index) => index.at,
        }
    }
}

impl TryFrom<expr::Expr> for AssignmentVariable {
    type Error = expr::Expr;

    fn try_from(value: expr::Expr) -> Result<Self, Self::Error> {
        match *value {
            expr::ExprTypes::Variable(var) => Ok(Self::Typed(TypedIdentifier {
                name: var.name,
                ty: None,
                at: var.at,
            })),
            expr::ExprTypes::ExpressionIndex(index) => Ok(Self::ExpressionIndex(index)),
            expr::ExprTypes::IdentifierIndex(index) => Ok(Self::IdentifierIndex(index)),
            other => Err(Box::new(other)),
        }
    }
}

/// A prefix expression that is a function call.
#[derive(Clone, Debug)]
pub enum Callable {
    Call(expr::Call),
    Invocation(expr::Invocation),
}

impl TryFrom<expr::Expr> for Callable {
    type Error = expr::Expr;

    fn try_from(value: expr::Expr) -> Result<Self, Self::Error> {
        match *value {
            expr::ExprTypes::Call(call) => Ok(Self::Call(call)),
            expr::ExprTypes::Invocation(invocation) => Ok(Self::Invocation(invocation)),
            other => Err(Box::new(other)),
        }
    }
}

#[derive(Clone, Debug)]
pub struct Conditional {
    pub condition: expr::Expr,
    pub body: Block,
}

pub mod stmt {
    use super::*;
    use expr::Expr;

    ast_nodes! { [ StmtTypes ]
        Do                 : Block body;
        Assignment         : ListTarget targets, ListExpr values;
        CompoundAssignment : AssignmentVariable target, CompoundOperator operator, Expr value;
        While              : Expr condition, Block body;
        Repeat             : Block body, Expr condition;
        If                 : ListConditional branches, OptionBlock otherwise;
        NumericFor         : TypedIdentifier variable, Expr start, Expr stop, OptionExpr step, Block body;
        GenericFor         : ListTypedIdentifier variables, ListExpr iterators, Block body;
        Local              : ListTypedIdentifier variables, ListExpr values;
        LocalFunction      : Name name, FunctionBody function;
        Function           : ListName path, bool is_method, FunctionBody function;
        Goto               : Name label;
        Label              : Name name;
        Return             : ListExpr values;
        Break              : ;
        Call               : Callable call;
    }

    pub type Stmt = Box<StmtTypes>;
    type ListExpr = Vec<Expr>;
    type OptionExpr = Option<Expr>;
    type ListTarget = Vec<AssignmentVariable>;
    type ListConditional = Vec<Conditional>;
    type OptionBlock = Option<Block>;
    type ListTypedIdentifier = Vec<TypedIdentifier>;
    type ListName = Vec<Name>;

    impl StmtTypes {
        pub fn is_return(&self) -> bool {
            matches!(self, StmtTypes::Return(_))
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Conformance {
    pub name: Name,
    pub at: TokenIndex,
}

#[derive(Clone, Debug)]
pub struct Property {
    pub name: Name,
    pub ty: Type,
    pub default: Option<expr::Expr>,
    pub at: TokenIndex,
}

#[derive(Clone, Debug)]
pub enum ClassStatement {
    Property(Property),
    /// `default name = value` overriding an inherited property's default.
    Default {
        name: Name,
        value: expr::Expr,
        at: TokenIndex,
    },
    Function {
        name: Name,
        function: FunctionBody,
        at: TokenIndex,
    },
}

#[derive(Clone, Debug)]
pub struct Class {
    pub name: Name,
    pub at: TokenIndex,
    pub conforms: Vec<Conformance>,
    pub body: Vec<ClassStatement>,
}

#[derive(Clone, Debug)]
pub enum ProtocolStatement {
    Property {
        name: Name,
        ty: Type,
        at: TokenIndex,
    },
    Function {
        name: Name,
        signature: FunctionSignature,
        at: TokenIndex,
    },
}

#[derive(Clone, Debug)]
pub struct Protocol {
    pub name: Name,
    pub at: TokenIndex,
    pub conforms: Vec<Conformance>,
    pub body: Vec<ProtocolStatement>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct AssociatedType {
    pub label: Option<Name>,
    pub ty: Type,
}

#[derive(Clone, Debug)]
pub struct EnumCase {
    pub name: Name,
    pub at: TokenIndex,
    pub associated: Vec<AssociatedType>,
    pub raw_value: Option<expr::Expr>,
}

#[derive(Clone, Debug)]
pub struct Enum {
    pub name: Name,
    pub at: TokenIndex,
    pub conforms: Vec<Conformance>,
    pub cases: Vec<EnumCase>,
}

#[derive(Clone, Debug)]
pub struct TypeAlias {
    pub name: Name,
    pub at: TokenIndex,
    pub ty: Type,
}

#[derive(Clone, Debug)]
pub enum TopStatement {
    Class(Class),
    Protocol(Protocol),
    Enum(Enum),
    TypeAlias(TypeAlias),
    Statement(stmt::Stmt),
}

impl TopStatement {
    pub fn at(&self) -> TokenIndex {
        match self {
            TopStatement::Class(class) => class.at,
            TopStatement::Protocol(protocol) => protocol.at,
            TopStatement::Enum(enumeration) => enumeration.at,
            TopStatement::TypeAlias(alias) => alias.at,
            TopStatement::Statement(stmt) => stmt.at(),
        }
    }
}

pub type Chunk = Vec<TopStatement>;
