use alloc::{
    collections::{BTreeMap, BTreeSet},
    vec,
    vec::Vec,
};

use crate::{
    factory::{boxed_constructor, BoxedCloneConstructor, Constructor},
    value::Value,
};

/// A declared parameter type: a builtin shape or a catalog class/interface
/// name.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TypeHint {
    Bool,
    Int,
    Float,
    Str,
    List,
    Class(&'static str),
}

impl TypeHint {
    #[must_use]
    pub(crate) fn label(self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::Int => "int",
            Self::Float => "float",
            Self::Str => "string",
            Self::List => "list",
            Self::Class(name) => name,
        }
    }
}

/// One formal constructor parameter, in declaration order.
#[derive(Clone)]
pub struct ParamSpec {
    pub(crate) name: &'static str,
    pub(crate) hints: Vec<TypeHint>,
    pub(crate) nullable: bool,
    pub(crate) default: Option<Value>,
    pub(crate) variadic: bool,
}

impl ParamSpec {
    #[must_use]
    pub fn new(name: &'static str, hint: TypeHint) -> Self {
        Self {
            name,
            hints: vec![hint],
            nullable: false,
            default: None,
            variadic: false,
        }
    }

    /// Adds an alternative declared type, keeping declaration order.
    #[must_use]
    pub fn or(mut self, hint: TypeHint) -> Self {
        self.hints.push(hint);
        self
    }

    #[must_use]
    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    #[must_use]
    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    /// Marks the parameter as the variadic tail; it must be the last one.
    #[must_use]
    pub fn variadic(mut self) -> Self {
        self.variadic = true;
        self
    }
}

/// Constructor metadata for one loadable type: the supertypes it satisfies,
/// its formal parameters and the closure that actually instantiates it.
#[derive(Clone)]
pub struct TypeMeta {
    pub(crate) name: &'static str,
    pub(crate) implements: Vec<&'static str>,
    pub(crate) params: Vec<ParamSpec>,
    pub(crate) constructor: Option<BoxedCloneConstructor>,
}

impl TypeMeta {
    #[must_use]
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            implements: Vec::new(),
            params: Vec::new(),
            constructor: None,
        }
    }

    /// Flattened list of every interface and parent class the type
    /// satisfies, transitive closure included.
    #[must_use]
    pub fn implements(mut self, supertypes: &[&'static str]) -> Self {
        self.implements.extend_from_slice(supertypes);
        self
    }

    #[must_use]
    pub fn param(mut self, spec: ParamSpec) -> Self {
        self.params.push(spec);
        self
    }

    #[must_use]
    pub fn constructor<C: Constructor>(mut self, constructor: C) -> Self {
        self.constructor = Some(boxed_constructor(constructor));
        self
    }
}

pub struct CatalogBuilder {
    types: BTreeMap<&'static str, TypeMeta>,
    interfaces: BTreeSet<&'static str>,
}

impl Default for CatalogBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl CatalogBuilder {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self {
            types: BTreeMap::new(),
            interfaces: BTreeSet::new(),
        }
    }

    #[must_use]
    pub fn interface(mut self, name: &'static str) -> Self {
        self.interfaces.insert(name);
        self
    }

    #[must_use]
    pub fn class(mut self, meta: TypeMeta) -> Self {
        self.types.insert(meta.name, meta);
        self
    }

    #[must_use]
    pub fn build(self) -> Catalog {
        Catalog {
            types: self.types,
            interfaces: self.interfaces,
        }
    }
}

/// The registered metadata table consulted at resolution time in place of
/// source-language reflection. Built once at startup, immutable afterwards.
pub struct Catalog {
    types: BTreeMap<&'static str, TypeMeta>,
    interfaces: BTreeSet<&'static str>,
}

impl Catalog {
    #[inline]
    #[must_use]
    pub fn builder() -> CatalogBuilder {
        CatalogBuilder::new()
    }

    /// True when `name` is loadable: a registered class or interface.
    #[must_use]
    pub fn has(&self, name: &str) -> bool {
        self.types.contains_key(name) || self.interfaces.contains(name)
    }

    #[must_use]
    pub fn is_interface(&self, name: &str) -> bool {
        self.interfaces.contains(name)
    }

    #[must_use]
    pub fn class(&self, name: &str) -> Option<&TypeMeta> {
        self.types.get(name)
    }

    /// Subtype check against the flattened supertype lists.
    #[must_use]
    pub fn is_a(&self, name: &str, target: &str) -> bool {
        name == target
            || self
                .types
                .get(name)
                .is_some_and(|meta| meta.implements.iter().any(|supertype| *supertype == target))
    }

    /// The registered interfaces among a class's supertypes; parent classes
    /// are filtered out so they cannot make interface inference ambiguous.
    pub(crate) fn registered_interfaces_of(&self, class: &str) -> Vec<&'static str> {
        self.types.get(class).map_or_else(Vec::new, |meta| {
            meta.implements
                .iter()
                .copied()
                .filter(|supertype| self.interfaces.contains(supertype))
                .collect()
        })
    }
}
