use alloc::boxed::Box;

use crate::{errors::InstantiateErrorKind, value::Value, Container};

/// A post-construction hook, run exactly once per built instance, before
/// the instance is returned to any caller.
pub trait Callback: Clone + Send + Sync + 'static {
    fn configure(&mut self, instance: &Value, container: &Container) -> Result<(), InstantiateErrorKind>;
}

impl<F> Callback for F
where
    F: FnMut(&Value, &Container) -> Result<(), InstantiateErrorKind> + Clone + Send + Sync + 'static,
{
    #[inline]
    fn configure(&mut self, instance: &Value, container: &Container) -> Result<(), InstantiateErrorKind> {
        self(instance, container)
    }
}

pub(crate) trait CloneCallback: Send + Sync {
    fn call(&mut self, instance: &Value, container: &Container) -> Result<(), InstantiateErrorKind>;

    #[must_use]
    fn clone_box(&self) -> Box<dyn CloneCallback>;
}

impl<T: Callback> CloneCallback for T {
    #[inline]
    fn call(&mut self, instance: &Value, container: &Container) -> Result<(), InstantiateErrorKind> {
        self.configure(instance, container)
    }

    #[inline]
    fn clone_box(&self) -> Box<dyn CloneCallback> {
        Box::new(self.clone())
    }
}

pub(crate) struct BoxedCloneCallback(Box<dyn CloneCallback>);

impl Clone for BoxedCloneCallback {
    #[inline]
    fn clone(&self) -> Self {
        Self(self.0.clone_box())
    }
}

impl BoxedCloneCallback {
    pub(crate) fn call(&self, instance: &Value, container: &Container) -> Result<(), InstantiateErrorKind> {
        self.0.clone_box().call(instance, container)
    }
}

#[inline]
#[must_use]
pub(crate) fn boxed_callback<C: Callback>(callback: C) -> BoxedCloneCallback {
    BoxedCloneCallback(Box::new(callback))
}
