use std::fmt::{Display, Formatter};

use crate::ast::{Class, Conformance, Enum, Protocol};
use crate::lexer::TokenIndex;

/// Handle of an object in the resolver's arena. Two handles are equal exactly
/// when they name the same declaration.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ObjectId(pub(super) usize);

#[derive(Copy, Clone, Debug)]
pub enum ObjectKind<'a> {
    Class(&'a Class),
    Protocol(&'a Protocol),
    Enum(&'a Enum),
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(super) enum Resolution {
    Unresolved,
    InProgress,
    Resolved,
}

#[derive(Debug)]
pub struct ResolvedObject<'a> {
    pub(super) node: ObjectKind<'a>,
    pub(super) superclass: Option<ObjectId>,
    pub(super) protocols: Vec<ObjectId>,
    pub(super) resolution: Resolution,
}

impl<'a> ResolvedObject<'a> {
    pub(super) fn new(node: ObjectKind<'a>) -> Self {
        Self {
            node,
            superclass: None,
            protocols: Vec::new(),
            resolution: Resolution::Unresolved,
        }
    }

    pub fn node(&self) -> ObjectKind<'a> {
        self.node
    }

    pub fn name(&self) -> &'a str {
        match self.node {
            ObjectKind::Class(class) => &class.name,
            ObjectKind::Protocol(protocol) => &protocol.name,
            ObjectKind::Enum(enumeration) => &enumeration.name,
        }
    }

    pub fn at(&self) -> TokenIndex {
        match self.node {
            ObjectKind::Class(class) => class.at,
            ObjectKind::Protocol(protocol) => protocol.at,
            ObjectKind::Enum(enumeration) => enumeration.at,
        }
    }

    pub(super) fn conforms(&self) -> &'a [Conformance] {
        match self.node {
            ObjectKind::Class(class) => &class.conforms,
            ObjectKind::Protocol(protocol) => &protocol.conforms,
            ObjectKind::Enum(enumeration) => &enumeration.conforms,
        }
    }

    pub fn is_class(&self) -> bool {
        matches!(self.node, ObjectKind::Class(_))
    }

    pub fn is_protocol(&self) -> bool {
        matches!(self.node, ObjectKind::Protocol(_))
    }

    pub fn is_enum(&self) -> bool {
        matches!(self.node, ObjectKind::Enum(_))
    }

    /// Only classes have one.
    pub fn superclass(&self) -> Option<ObjectId> {
        self.superclass
    }

    /// For classes this includes every protocol inherited from the superclass chain.
    pub fn protocols(&self) -> &[ObjectId] {
        &self.protocols
    }

    fn keyword(&self) -> &'static str {
        match self.node {
            ObjectKind::Class(_) => "class",
            ObjectKind::Protocol(_) => "protocol",
            ObjectKind::Enum(_) => "enum",
        }
    }
}

/// One line summary, e.g. `class C : B [P, Q]`.
pub struct ObjectSummary<'r, 'a> {
    pub(super) object: &'r ResolvedObject<'a>,
    pub(super) objects: &'r [ResolvedObject<'a>],
}

impl Display for ObjectSummary<'_, '_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.object.keyword(), self.object.name())?;
        if let Some(superclass) = self.object.superclass {
            write!(f, " : {}", self.objects[superclass.0].name())?;
        }
        let protocols: Vec<&str> = self
            .object
            .protocols
            .iter()
            .map(|id| self.objects[id.0].name())
            .collect();
        write!(f, " [{}]", protocols.join(", "))
    }
}
