use std::fmt::{Display, Formatter};
use std::rc::Rc;

use super::{ObjectId, Resolver};

/// A type annotation after name resolution. Alias expansions share their children.
#[derive(Clone, Debug)]
pub enum ResolvedType {
    Any,
    Optional(Rc<ResolvedType>),
    Array(Rc<ResolvedType>),
    Dictionary {
        key: Rc<ResolvedType>,
        value: Rc<ResolvedType>,
    },
    Protocol(ObjectId),
    Instance(ObjectId),
    Enum(ObjectId),
    MetaClass(ObjectId),
    MetaProtocol(ObjectId),
}

impl ResolvedType {
    /// Exact match, as used for protocol identity. `Any` on the left matches
    /// everything except an optional.
    pub fn identical_to(&self, other: &ResolvedType) -> bool {
        use ResolvedType::*;
        match (self, other) {
            (Any, Optional(_)) => false,
            (Any, _) => true,
            (Optional(lhs), Optional(rhs)) | (Array(lhs), Array(rhs)) => lhs.identical_to(rhs),
            (
                Dictionary {
                    key: lhs_key,
                    value: lhs_value,
                },
                Dictionary {
                    key: rhs_key,
                    value: rhs_value,
                },
            ) => lhs_key.identical_to(rhs_key) && lhs_value.identical_to(rhs_value),
            (Protocol(lhs), Protocol(rhs))
            | (Instance(lhs), Instance(rhs))
            | (Enum(lhs), Enum(rhs))
            | (MetaClass(lhs), MetaClass(rhs))
            | (MetaProtocol(lhs), MetaProtocol(rhs)) => lhs == rhs,
            _ => false,
        }
    }

    /// Whether a value of this type can be used where `to` is expected.
    pub fn conforms(&self, to: &ResolvedType, resolver: &Resolver) -> bool {
        use ResolvedType::*;
        match (to, self) {
            (Optional(target), Optional(candidate)) => candidate.conforms(target, resolver),
            (Optional(_), _) => false,
            (Any, Optional(_)) => false,
            (Any, _) => true,
            (Array(target), Array(candidate)) => candidate.conforms(target, resolver),
            (
                Dictionary { key, value },
                Dictionary {
                    key: candidate_key,
                    value: candidate_value,
                },
            ) => candidate_key.conforms(key, resolver) && candidate_value.conforms(value, resolver),
            (Enum(target), Enum(candidate)) => target == candidate,
            (Protocol(target), Protocol(candidate))
            | (MetaProtocol(target), MetaProtocol(candidate)) => {
                target == candidate || resolver.adopts(*candidate, *target)
            }
            (Protocol(target), Instance(candidate) | Enum(candidate))
            | (MetaProtocol(target), MetaClass(candidate)) => resolver.adopts(*candidate, *target),
            (Instance(target), Instance(candidate)) | (MetaClass(target), MetaClass(candidate)) => {
                resolver.is_subclass(*candidate, *target)
            }
            _ => false,
        }
    }

    pub fn display<'r, 'a>(&'r self, resolver: &'r Resolver<'a>) -> TypeDisplay<'r, 'a> {
        TypeDisplay { ty: self, resolver }
    }
}

/// Writes a resolved type back in annotation syntax.
pub struct TypeDisplay<'r, 'a> {
    ty: &'r ResolvedType,
    resolver: &'r Resolver<'a>,
}

impl Display for TypeDisplay<'_, '_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = |id: &ObjectId| self.resolver.object(*id).name();
        match self.ty {
            ResolvedType::Any => write!(f, "Any"),
            ResolvedType::Optional(inner) => write!(f, "{}?", inner.display(self.resolver)),
            ResolvedType::Array(element) => write!(f, "[{}]", element.display(self.resolver)),
            ResolvedType::Dictionary { key, value } => write!(
                f,
                "[{}: {}]",
                key.display(self.resolver),
                value.display(self.resolver)
            ),
            ResolvedType::Protocol(id) | ResolvedType::Instance(id) | ResolvedType::Enum(id) => {
                write!(f, "{}", name(id))
            }
            ResolvedType::MetaClass(id) | ResolvedType::MetaProtocol(id) => {
                write!(f, "{}.Type", name(id))
            }
        }
    }
}
