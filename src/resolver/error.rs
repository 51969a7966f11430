use crate::ast::Name;
use crate::lexer::TokenIndex;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ResolverError {
    #[error("An object named '{name}' is already declared.")]
    DuplicateName { name: Name, at: TokenIndex },
    #[error("Undefined object '{name}'.")]
    UndefinedObject { name: Name, at: TokenIndex },
    #[error("Class '{name}' would be a second superclass.")]
    MultipleSuperClasses { name: Name, at: TokenIndex },
    #[error("Protocol '{name}' is already conformed to.")]
    DuplicateProtocol { name: Name, at: TokenIndex },
    #[error("Undefined type '{name}'.")]
    UndefinedType { name: Name, at: TokenIndex },
    #[error("A type named '{name}' is already declared.")]
    DuplicateType { name: Name, at: TokenIndex },
    #[error("Only 'Type' can be used as a type member, found '{name}'.")]
    InvalidIndex { name: Name, at: TokenIndex },
    #[error("'{name}' is not a class or protocol and has no meta type.")]
    InvalidIndexedType { name: Name, at: TokenIndex },
    #[error("Cannot conform to '{name}' here.")]
    InvalidConformance { name: Name, at: TokenIndex },
    #[error("Conformance to '{name}' is cyclic.")]
    CyclicConformance { name: Name, at: TokenIndex },
    #[error("Type alias '{name}' refers to itself.")]
    CyclicTypeAlias { name: Name, at: TokenIndex },
}

impl ResolverError {
    pub fn at(&self) -> TokenIndex {
        self.parts().1
    }

    pub fn name(&self) -> &str {
        self.parts().0
    }

    fn parts(&self) -> (&str, TokenIndex) {
        use ResolverError::*;
        match self {
            DuplicateName { name, at }
            | UndefinedObject { name, at }
            | MultipleSuperClasses { name, at }
            | DuplicateProtocol { name, at }
            | UndefinedType { name, at }
            | DuplicateType { name, at }
            | InvalidIndex { name, at }
            | InvalidIndexedType { name, at }
            | InvalidConformance { name, at }
            | CyclicConformance { name, at }
            | CyclicTypeAlias { name, at } => (name, *at),
        }
    }
}
