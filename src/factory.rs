use alloc::{boxed::Box, vec::Vec};

use crate::{errors::InstantiateErrorKind, value::Value, Container};

/// A binding-level factory: produces the bound value lazily, invoked once
/// per container and cached afterwards.
pub trait Factory: Clone + Send + Sync + 'static {
    fn build(&mut self, container: Container) -> Result<Value, InstantiateErrorKind>;
}

impl<F> Factory for F
where
    F: FnMut(Container) -> Result<Value, InstantiateErrorKind> + Clone + Send + Sync + 'static,
{
    #[inline]
    fn build(&mut self, container: Container) -> Result<Value, InstantiateErrorKind> {
        self(container)
    }
}

pub(crate) trait CloneFactory: Send + Sync {
    fn call(&mut self, container: Container) -> Result<Value, InstantiateErrorKind>;

    #[must_use]
    fn clone_box(&self) -> Box<dyn CloneFactory>;
}

impl<T: Factory> CloneFactory for T {
    #[inline]
    fn call(&mut self, container: Container) -> Result<Value, InstantiateErrorKind> {
        self.build(container)
    }

    #[inline]
    fn clone_box(&self) -> Box<dyn CloneFactory> {
        Box::new(self.clone())
    }
}

pub(crate) struct BoxedCloneFactory(Box<dyn CloneFactory>);

impl Clone for BoxedCloneFactory {
    #[inline]
    fn clone(&self) -> Self {
        Self(self.0.clone_box())
    }
}

impl BoxedCloneFactory {
    /// Calls a clone of the stored closure, leaving the registry copy
    /// untouched.
    pub(crate) fn call(&self, container: Container) -> Result<Value, InstantiateErrorKind> {
        self.0.clone_box().call(container)
    }
}

#[inline]
#[must_use]
pub(crate) fn boxed_factory<F: Factory>(factory: F) -> BoxedCloneFactory {
    BoxedCloneFactory(Box::new(factory))
}

/// A catalog constructor: takes the resolved argument list in declaration
/// order and instantiates the type.
pub trait Constructor: Clone + Send + Sync + 'static {
    fn construct(&mut self, arguments: Vec<Value>) -> Result<Value, InstantiateErrorKind>;
}

impl<F> Constructor for F
where
    F: FnMut(Vec<Value>) -> Result<Value, InstantiateErrorKind> + Clone + Send + Sync + 'static,
{
    #[inline]
    fn construct(&mut self, arguments: Vec<Value>) -> Result<Value, InstantiateErrorKind> {
        self(arguments)
    }
}

pub(crate) trait CloneConstructor: Send + Sync {
    fn call(&mut self, arguments: Vec<Value>) -> Result<Value, InstantiateErrorKind>;

    #[must_use]
    fn clone_box(&self) -> Box<dyn CloneConstructor>;
}

impl<T: Constructor> CloneConstructor for T {
    #[inline]
    fn call(&mut self, arguments: Vec<Value>) -> Result<Value, InstantiateErrorKind> {
        self.construct(arguments)
    }

    #[inline]
    fn clone_box(&self) -> Box<dyn CloneConstructor> {
        Box::new(self.clone())
    }
}

pub(crate) struct BoxedCloneConstructor(Box<dyn CloneConstructor>);

impl Clone for BoxedCloneConstructor {
    #[inline]
    fn clone(&self) -> Self {
        Self(self.0.clone_box())
    }
}

impl BoxedCloneConstructor {
    pub(crate) fn call(&self, arguments: Vec<Value>) -> Result<Value, InstantiateErrorKind> {
        self.0.clone_box().call(arguments)
    }
}

#[inline]
#[must_use]
pub(crate) fn boxed_constructor<C: Constructor>(constructor: C) -> BoxedCloneConstructor {
    BoxedCloneConstructor(Box::new(constructor))
}
