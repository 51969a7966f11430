use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use tracing::{debug, trace_span};

use crate::ast::{Chunk, TopStatement, Type, TypeAlias};
use crate::lexer::TokenIndex;

pub use error::ResolverError;
pub use object::{ObjectId, ObjectKind, ObjectSummary, ResolvedObject};
pub use types::{ResolvedType, TypeDisplay};

use annotations::AnnotationChecker;
use object::Resolution;

mod annotations;
mod error;
mod object;
mod types;

type Result<T, E = ResolverError> = core::result::Result<T, E>;

/// Name of the builtin type every non-optional value conforms to.
pub const ANY: &str = "Any";

/// The global symbol table built from a list of chunks.
#[derive(Debug)]
pub struct Resolver<'a> {
    objects: Vec<ResolvedObject<'a>>,
    names: HashMap<&'a str, ObjectId>,
    aliases: HashMap<&'a str, &'a TypeAlias>,
    /// Each alias is expanded once; later uses share the result.
    expanded_aliases: RefCell<HashMap<&'a str, ResolvedType>>,
    /// Resolved annotations, one table per chunk keyed by the annotation's token.
    annotations: Vec<HashMap<TokenIndex, ResolvedType>>,
}

impl<'a> Resolver<'a> {
    /// Collects every declaration, resolves the conformance graph and then every
    /// type annotation in the chunks.
    pub fn resolve(chunks: &'a [Chunk]) -> Result<Self> {
        let span = trace_span!("resolve");
        let _e = span.enter();

        let mut resolver = Self {
            objects: Vec::new(),
            names: HashMap::new(),
            aliases: HashMap::new(),
            expanded_aliases: RefCell::new(HashMap::new()),
            annotations: Vec::new(),
        };
        for chunk in chunks {
            resolver.collect(chunk)?;
        }
        for id in 0..resolver.objects.len() {
            resolver.resolve_conforms(ObjectId(id))?;
        }
        for chunk in chunks {
            let annotations = AnnotationChecker::check(&resolver, chunk)?;
            resolver.annotations.push(annotations);
        }
        Ok(resolver)
    }

    fn collect(&mut self, chunk: &'a Chunk) -> Result<()> {
        for top in chunk {
            let node = match top {
                TopStatement::Class(class) => ObjectKind::Class(class),
                TopStatement::Protocol(protocol) => ObjectKind::Protocol(protocol),
                TopStatement::Enum(enumeration) => ObjectKind::Enum(enumeration),
                TopStatement::TypeAlias(alias) => {
                    self.declare_alias(alias)?;
                    continue;
                }
                TopStatement::Statement(_) => continue,
            };
            self.declare(ResolvedObject::new(node))?;
        }
        Ok(())
    }

    fn declare(&mut self, object: ResolvedObject<'a>) -> Result<()> {
        let (name, at) = (object.name(), object.at());
        if self.names.contains_key(name) {
            return Err(ResolverError::DuplicateName {
                name: name.to_owned(),
                at,
            });
        }
        if name == ANY || self.aliases.contains_key(name) {
            return Err(ResolverError::DuplicateType {
                name: name.to_owned(),
                at,
            });
        }
        self.names.insert(name, ObjectId(self.objects.len()));
        self.objects.push(object);
        Ok(())
    }

    fn declare_alias(&mut self, alias: &'a TypeAlias) -> Result<()> {
        let name = alias.name.as_str();
        if name == ANY || self.aliases.contains_key(name) || self.names.contains_key(name) {
            return Err(ResolverError::DuplicateType {
                name: alias.name.clone(),
                at: alias.at,
            });
        }
        self.aliases.insert(name, alias);
        Ok(())
    }

    /// Resolves the conformance list of one object, superclasses first. Each
    /// object is resolved at most once; reaching an object whose resolution is
    /// still running means the graph has a cycle.
    fn resolve_conforms(&mut self, id: ObjectId) -> Result<()> {
        if self.objects[id.0].resolution != Resolution::Unresolved {
            return Ok(());
        }
        self.objects[id.0].resolution = Resolution::InProgress;

        let conforms = self.objects[id.0].conforms();
        for conformance in conforms {
            let target = *self.names.get(conformance.name.as_str()).ok_or_else(|| {
                ResolverError::UndefinedObject {
                    name: conformance.name.clone(),
                    at: conformance.at,
                }
            })?;
            let invalid = || ResolverError::InvalidConformance {
                name: conformance.name.clone(),
                at: conformance.at,
            };
            let this = &self.objects[id.0];
            let other = &self.objects[target.0];
            if other.is_enum() || (other.is_class() && !this.is_class()) {
                return Err(invalid());
            }
            if other.resolution == Resolution::InProgress {
                return Err(ResolverError::CyclicConformance {
                    name: conformance.name.clone(),
                    at: conformance.at,
                });
            }

            if other.is_class() {
                if this.superclass.is_some() {
                    return Err(ResolverError::MultipleSuperClasses {
                        name: conformance.name.clone(),
                        at: conformance.at,
                    });
                }
                self.resolve_conforms(target)?;
                self.objects[id.0].superclass = Some(target);
                for inherited in self.objects[target.0].protocols.clone() {
                    self.add_protocol(id, inherited, conformance.at)?;
                }
            } else {
                self.resolve_conforms(target)?;
                self.add_protocol(id, target, conformance.at)?;
            }
        }

        let object = &mut self.objects[id.0];
        object.resolution = Resolution::Resolved;
        debug!(
            object = object.name(),
            superclass = ?object.superclass,
            protocols = object.protocols.len(),
            "resolved conformances"
        );
        Ok(())
    }

    fn add_protocol(&mut self, id: ObjectId, protocol: ObjectId, at: TokenIndex) -> Result<()> {
        if self.objects[id.0].protocols.contains(&protocol) {
            return Err(ResolverError::DuplicateProtocol {
                name: self.objects[protocol.0].name().to_owned(),
                at,
            });
        }
        self.objects[id.0].protocols.push(protocol);
        Ok(())
    }

    pub fn object(&self, id: ObjectId) -> &ResolvedObject<'a> {
        &self.objects[id.0]
    }

    pub fn lookup(&self, name: &str) -> Option<ObjectId> {
        self.names.get(name).copied()
    }

    /// Objects in declaration order.
    pub fn objects(&self) -> impl Iterator<Item = (ObjectId, &ResolvedObject<'a>)> {
        self.objects
            .iter()
            .enumerate()
            .map(|(i, object)| (ObjectId(i), object))
    }

    pub fn summary(&self, id: ObjectId) -> ObjectSummary<'_, 'a> {
        ObjectSummary {
            object: &self.objects[id.0],
            objects: &self.objects,
        }
    }

    /// The resolved annotations of the chunk at `chunk`, in token order.
    pub fn annotations(&self, chunk: usize) -> Vec<(TokenIndex, &ResolvedType)> {
        let mut annotations: Vec<_> = self
            .annotations
            .get(chunk)
            .into_iter()
            .flatten()
            .map(|(at, ty)| (*at, ty))
            .collect();
        annotations.sort_by_key(|(at, _)| *at);
        annotations
    }

    pub fn annotation(&self, chunk: usize, at: TokenIndex) -> Option<&ResolvedType> {
        self.annotations.get(chunk)?.get(&at)
    }

    pub fn resolve_type(&self, ty: &Type) -> Result<ResolvedType> {
        self.resolve_type_in(ty, &mut Vec::new())
    }

    /// `expanding` holds the aliases currently being substituted.
    fn resolve_type_in(&self, ty: &Type, expanding: &mut Vec<&'a str>) -> Result<ResolvedType> {
        Ok(match ty {
            Type::Optional { inner, .. } => {
                ResolvedType::Optional(Rc::new(self.resolve_type_in(inner, expanding)?))
            }
            Type::Array { element, .. } => {
                ResolvedType::Array(Rc::new(self.resolve_type_in(element, expanding)?))
            }
            Type::Dictionary { key, value, .. } => ResolvedType::Dictionary {
                key: Rc::new(self.resolve_type_in(key, expanding)?),
                value: Rc::new(self.resolve_type_in(value, expanding)?),
            },
            Type::Name { name, at } => self.named_type(name, *at, expanding)?,
            Type::Index { parent, name, at } => {
                if name != "Type" {
                    return Err(ResolverError::InvalidIndex {
                        name: name.clone(),
                        at: *at,
                    });
                }
                match self.named_type(parent, *at, expanding)? {
                    ResolvedType::Instance(class) => ResolvedType::MetaClass(class),
                    ResolvedType::Protocol(protocol) => ResolvedType::MetaProtocol(protocol),
                    _ => {
                        return Err(ResolverError::InvalidIndexedType {
                            name: parent.clone(),
                            at: *at,
                        })
                    }
                }
            }
        })
    }

    /// Aliases shadow objects and objects shadow the builtin `Any`.
    fn named_type(
        &self,
        name: &str,
        at: TokenIndex,
        expanding: &mut Vec<&'a str>,
    ) -> Result<ResolvedType> {
        if let Some((alias_name, alias)) = self.aliases.get_key_value(name) {
            if let Some(expanded) = self.expanded_aliases.borrow().get(alias_name) {
                return Ok(expanded.clone());
            }
            if expanding.contains(alias_name) {
                return Err(ResolverError::CyclicTypeAlias {
                    name: name.to_owned(),
                    at,
                });
            }
            expanding.push(*alias_name);
            let resolved = self.resolve_type_in(&alias.ty, expanding)?;
            expanding.pop();
            self.expanded_aliases
                .borrow_mut()
                .insert(*alias_name, resolved.clone());
            return Ok(resolved);
        }
        if let Some(id) = self.lookup(name) {
            return Ok(match self.objects[id.0].node {
                ObjectKind::Class(_) => ResolvedType::Instance(id),
                ObjectKind::Protocol(_) => ResolvedType::Protocol(id),
                ObjectKind::Enum(_) => ResolvedType::Enum(id),
            });
        }
        if name == ANY {
            return Ok(ResolvedType::Any);
        }
        Err(ResolverError::UndefinedType {
            name: name.to_owned(),
            at,
        })
    }

    /// Whether `object` lists `protocol`, directly or through the protocols it lists.
    pub fn adopts(&self, object: ObjectId, protocol: ObjectId) -> bool {
        self.objects[object.0]
            .protocols
            .iter()
            .any(|adopted| *adopted == protocol || self.adopts(*adopted, protocol))
    }

    /// Whether `class` is `ancestor` or reaches it through its superclass chain.
    pub fn is_subclass(&self, class: ObjectId, ancestor: ObjectId) -> bool {
        let mut current = Some(class);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.objects[id.0].superclass;
        }
        false
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::ast::parse;
    use crate::lexer::Lexer;

    fn chunk(source: &str) -> Chunk {
        let lexer = Lexer::tokenize(source).unwrap();
        parse(&lexer).unwrap()
    }

    fn resolve_err(source: &str) -> ResolverError {
        let chunks = [chunk(source)];
        Resolver::resolve(&chunks).unwrap_err()
    }

    fn name_type(name: &str) -> Type {
        Type::Name {
            name: name.into(),
            at: TokenIndex::new(0),
        }
    }

    #[test]
    fn superclass_chain_in_any_order() {
        let chunks = [chunk("class C: B end class A end class B: A end")];
        let resolver = Resolver::resolve(&chunks).unwrap();
        let (a, b, c) = (
            resolver.lookup("A").unwrap(),
            resolver.lookup("B").unwrap(),
            resolver.lookup("C").unwrap(),
        );
        assert_eq!(resolver.object(c).superclass(), Some(b));
        assert_eq!(resolver.object(b).superclass(), Some(a));
        assert_eq!(resolver.object(a).superclass(), None);
        assert!(resolver.is_subclass(c, a));
        assert!(!resolver.is_subclass(a, c));
    }

    #[test]
    fn shared_ancestors_are_resolved_once() {
        let chunks = [chunk(
            "class D: B end class C: A end class B: A end class A: P end protocol P end",
        )];
        let resolver = Resolver::resolve(&chunks).unwrap();
        let (a, p) = (resolver.lookup("A").unwrap(), resolver.lookup("P").unwrap());
        // A second pass over A would have added P again.
        assert_eq!(resolver.object(a).protocols(), [p]);
        for name in ["B", "C", "D"] {
            let id = resolver.lookup(name).unwrap();
            assert_eq!(resolver.object(id).protocols(), [p], "{name}");
            assert!(resolver.is_subclass(id, a), "{name}");
        }
        for (_, object) in resolver.objects() {
            assert_eq!(object.resolution, Resolution::Resolved, "{}", object.name());
        }
    }

    #[test]
    fn duplicate_names() {
        assert_eq!(
            resolve_err("class Foo end enum Foo end"),
            ResolverError::DuplicateName {
                name: "Foo".into(),
                at: TokenIndex::new(4),
            }
        );
        let chunks = [chunk("protocol Foo end"), chunk("class Foo end")];
        assert!(matches!(
            Resolver::resolve(&chunks),
            Err(ResolverError::DuplicateName { .. })
        ));
    }

    #[test]
    fn conformance_errors() {
        assert!(matches!(
            resolve_err("class A end class B end class C: A, B end"),
            ResolverError::MultipleSuperClasses { name, .. } if name == "B"
        ));
        assert!(matches!(
            resolve_err("class A: Missing end"),
            ResolverError::UndefinedObject { name, .. } if name == "Missing"
        ));
        assert!(matches!(
            resolve_err("protocol P end class A: P, P end"),
            ResolverError::DuplicateProtocol { .. }
        ));
        assert!(matches!(
            resolve_err("protocol P end class A: P end class B: A, P end"),
            ResolverError::DuplicateProtocol { .. }
        ));
        assert!(matches!(
            resolve_err("protocol P end class A: P end class B: P, A end"),
            ResolverError::DuplicateProtocol { .. }
        ));
    }

    #[test]
    fn invalid_conformances() {
        for source in [
            "class A end protocol P: A end",
            "class A end enum E: A end",
            "enum E end class A: E end",
            "enum E end protocol P: E end",
        ] {
            assert!(
                matches!(resolve_err(source), ResolverError::InvalidConformance { .. }),
                "{source}"
            );
        }
    }

    #[test]
    fn cycles_are_rejected() {
        assert!(matches!(
            resolve_err("class A: A end"),
            ResolverError::CyclicConformance { name, .. } if name == "A"
        ));
        assert!(matches!(
            resolve_err("class A: B end class B: C end class C: A end"),
            ResolverError::CyclicConformance { .. }
        ));
        assert!(matches!(
            resolve_err("protocol P: Q end protocol Q: P end"),
            ResolverError::CyclicConformance { .. }
        ));
    }

    #[test]
    fn protocol_conformance() {
        let chunks = [chunk(
            "protocol Animal end protocol Pet: Animal end
             class Dog: Pet end class Cat end class Puppy: Dog end
             enum Breed: Animal end",
        )];
        let resolver = Resolver::resolve(&chunks).unwrap();
        let ty = |name| resolver.resolve_type(&name_type(name)).unwrap();

        assert!(ty("Dog").conforms(&ty("Animal"), &resolver));
        assert!(ty("Dog").conforms(&ty("Pet"), &resolver));
        assert!(!ty("Dog").conforms(&ty("Cat"), &resolver));
        assert!(ty("Puppy").conforms(&ty("Dog"), &resolver));
        assert!(ty("Puppy").conforms(&ty("Animal"), &resolver));
        assert!(!ty("Dog").conforms(&ty("Puppy"), &resolver));
        assert!(ty("Pet").conforms(&ty("Animal"), &resolver));
        assert!(!ty("Animal").conforms(&ty("Pet"), &resolver));
        assert!(ty("Breed").conforms(&ty("Animal"), &resolver));
        assert!(ty("Breed").conforms(&ty("Breed"), &resolver));
        assert!(!ty("Breed").conforms(&ty("Pet"), &resolver));
        assert!(ty("Cat").conforms(&ResolvedType::Any, &resolver));
    }

    #[test]
    fn composite_conformance() {
        let chunks = [chunk("protocol Animal end class Dog: Animal end")];
        let resolver = Resolver::resolve(&chunks).unwrap();
        let dog = ResolvedType::Instance(resolver.lookup("Dog").unwrap());
        let animal = ResolvedType::Protocol(resolver.lookup("Animal").unwrap());
        let optional = |ty: &ResolvedType| ResolvedType::Optional(Rc::new(ty.clone()));
        let array = |ty: &ResolvedType| ResolvedType::Array(Rc::new(ty.clone()));

        assert!(optional(&dog).conforms(&optional(&animal), &resolver));
        assert!(!dog.conforms(&optional(&animal), &resolver));
        assert!(!optional(&dog).conforms(&animal, &resolver));
        assert!(!optional(&dog).conforms(&ResolvedType::Any, &resolver));
        assert!(array(&dog).conforms(&array(&animal), &resolver));
        assert!(!array(&animal).conforms(&array(&dog), &resolver));
        let dictionary = ResolvedType::Dictionary {
            key: Rc::new(ResolvedType::Any),
            value: Rc::new(dog.clone()),
        };
        let wanted = ResolvedType::Dictionary {
            key: Rc::new(ResolvedType::Any),
            value: Rc::new(animal.clone()),
        };
        assert!(dictionary.conforms(&wanted, &resolver));
        assert!(!wanted.conforms(&dictionary, &resolver));
    }

    #[test]
    fn meta_types() {
        let chunks = [chunk(
            "protocol Shape end class Square: Shape end class Tile: Square end enum E end",
        )];
        let resolver = Resolver::resolve(&chunks).unwrap();
        let meta = |parent: &str, name: &str| {
            resolver.resolve_type(&Type::Index {
                parent: parent.into(),
                name: name.into(),
                at: TokenIndex::new(0),
            })
        };
        let square = meta("Square", "Type").unwrap();
        let shape = meta("Shape", "Type").unwrap();
        assert!(matches!(square, ResolvedType::MetaClass(_)));
        assert!(matches!(shape, ResolvedType::MetaProtocol(_)));
        assert!(square.conforms(&shape, &resolver));
        assert!(meta("Tile", "Type").unwrap().conforms(&square, &resolver));
        assert!(!square.conforms(&ResolvedType::Instance(resolver.lookup("Square").unwrap()), &resolver));
        assert!(matches!(
            meta("Square", "Kind"),
            Err(ResolverError::InvalidIndex { name, .. }) if name == "Kind"
        ));
        assert!(matches!(
            meta("E", "Type"),
            Err(ResolverError::InvalidIndexedType { name, .. }) if name == "E"
        ));
        assert!(matches!(
            meta("Nope", "Type"),
            Err(ResolverError::UndefinedType { .. })
        ));
    }

    #[test]
    fn type_aliases() {
        let chunks = [chunk(
            "typealias Pets = [Pet?] typealias Pet = Animal protocol Animal end",
        )];
        let resolver = Resolver::resolve(&chunks).unwrap();
        let pets = resolver.resolve_type(&name_type("Pets")).unwrap();
        assert_eq!(pets.display(&resolver).to_string(), "[Animal?]");

        assert!(matches!(
            resolve_err("typealias A = [B] typealias B = A?"),
            ResolverError::CyclicTypeAlias { .. }
        ));
        assert!(matches!(
            resolve_err("typealias Any = Number"),
            ResolverError::DuplicateType { name, .. } if name == "Any"
        ));
        assert!(matches!(
            resolve_err("class Any end"),
            ResolverError::DuplicateType { .. }
        ));
        assert!(matches!(
            resolve_err("class A end typealias A = A"),
            ResolverError::DuplicateType { .. }
        ));
        assert!(matches!(
            resolve_err("typealias A = B typealias A = B"),
            ResolverError::DuplicateType { .. }
        ));
    }

    #[test]
    fn alias_chains_expand_each_alias_once() {
        let mut source = String::from("typealias A0 = Any\n");
        for i in 1..=64 {
            source.push_str(&format!("typealias A{i} = [A{0}: A{0}]\n", i - 1));
        }
        source.push_str("local x: A64 = {}");
        let chunks = [chunk(&source)];
        let resolver = Resolver::resolve(&chunks).unwrap();
        assert_eq!(resolver.expanded_aliases.borrow().len(), 65);

        let children = |ty: &ResolvedType| match ty {
            ResolvedType::Dictionary { key, value } => (key.clone(), value.clone()),
            other => panic!("expected a dictionary, got {other:?}"),
        };
        let (left, right) = children(&resolver.resolve_type(&name_type("A64")).unwrap());
        assert!(Rc::ptr_eq(&children(&left).0, &children(&right).0));
    }

    #[test]
    fn object_summaries() {
        let chunks = [chunk(
            "protocol P end protocol Q: P end class B: Q end class C: B, P end enum E: P end",
        )];
        let resolver = Resolver::resolve(&chunks).unwrap();
        let summaries: Vec<String> = resolver
            .objects()
            .map(|(id, _)| resolver.summary(id).to_string())
            .collect();
        assert_eq!(
            summaries,
            [
                "protocol P []",
                "protocol Q [P]",
                "class B [Q]",
                "class C : B [Q, P]",
                "enum E [P]",
            ]
        );
    }
}
