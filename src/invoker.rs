use alloc::{boxed::Box, string::ToString as _, sync::Arc, vec::Vec};
use tracing::{debug, info_span};

use crate::{
    arguments::{resolve_arguments, Arguments, Lookup},
    catalog::{Catalog, ParamSpec},
    errors::InvokeErrorKind,
    factory::{boxed_constructor, BoxedCloneConstructor, Constructor},
    value::Value,
    Container,
};

/// An arbitrary callable described by its formal parameters plus a body
/// taking the resolved argument list.
#[derive(Clone)]
pub struct Callable {
    pub(crate) params: Vec<ParamSpec>,
    pub(crate) body: BoxedCloneConstructor,
}

impl Callable {
    #[must_use]
    pub fn new<C: Constructor>(params: Vec<ParamSpec>, body: C) -> Self {
        Self {
            params,
            body: boxed_constructor(body),
        }
    }
}

/// Builds arbitrary objects and calls arbitrary functions through the
/// parameter resolver, optionally falling back to a container for typed
/// parameters.
pub struct Invoker {
    catalog: Arc<Catalog>,
    container: Option<Container>,
}

impl Invoker {
    /// Identifier under which a container resolves a fresh invoker.
    pub const ID: &'static str = "invoker";

    #[must_use]
    pub fn new(catalog: impl Into<Arc<Catalog>>) -> Self {
        Self {
            catalog: catalog.into(),
            container: None,
        }
    }

    #[must_use]
    pub fn with_container(container: Container) -> Self {
        let catalog = container.inner.catalog.clone();
        Self {
            catalog,
            container: Some(container),
        }
    }

    fn lookup(&self) -> Option<&dyn Lookup> {
        self.container.as_ref().map(|container| container as &dyn Lookup)
    }

    /// Resolves the callable's parameters from the supplied arguments and
    /// the attached container, then calls it.
    pub fn invoke(&self, callable: &Callable, arguments: &Arguments) -> Result<Value, InvokeErrorKind> {
        let span = info_span!("invoke");
        let _guard = span.enter();

        let arguments = resolve_arguments(&callable.params, arguments, self.lookup(), &self.catalog)?;
        callable.body.call(arguments).map_err(InvokeErrorKind::Call)
    }

    /// Constructs `type_name` the same way. An abstract target cannot be
    /// instantiated directly and resolves through a forked container
    /// instead, leaving the caller's cache untouched.
    pub fn make(&self, type_name: &str, arguments: &Arguments) -> Result<Value, InvokeErrorKind> {
        let span = info_span!("make", type_name);
        let _guard = span.enter();

        if self.catalog.is_interface(type_name) {
            let Some(container) = &self.container else {
                return Err(InvokeErrorKind::AbstractTarget {
                    name: type_name.to_string(),
                });
            };
            debug!("abstract target, resolving through a forked container");
            return container
                .fork()
                .get(type_name)
                .map_err(|err| InvokeErrorKind::Resolve(Box::new(err)));
        }

        let Some(meta) = self.catalog.class(type_name) else {
            return Err(InvokeErrorKind::UnknownType {
                name: type_name.to_string(),
            });
        };
        let Some(constructor) = &meta.constructor else {
            return Err(InvokeErrorKind::NoConstructor {
                name: type_name.to_string(),
            });
        };

        let arguments = resolve_arguments(&meta.params, arguments, self.lookup(), &self.catalog)?;
        constructor.call(arguments).map_err(InvokeErrorKind::Call)
    }
}
