use alloc::{
    collections::BTreeMap,
    string::{String, ToString as _},
    sync::Arc,
    vec::Vec,
};
use parking_lot::Mutex;
use tracing::{debug, error, info_span};

use crate::{
    arguments::{check_supplied, fallback_value, Lookup},
    catalog::{Catalog, ParamSpec, TypeHint, TypeMeta},
    errors::{BuildErrorKind, ResolveErrorKind},
    invoker::Invoker,
    registry::{BindingKind, RedirectKind, Registry},
    value::Value,
};

/// Resolves identifiers against a locked registry into a cached object
/// graph. A `Container` is a cheap handle; [`Clone`] shares the graph, while
/// [`Self::fork`] starts an isolated one over the same configuration.
#[derive(Clone)]
pub struct Container {
    pub(crate) inner: Arc<ContainerInner>,
}

pub(crate) struct ContainerInner {
    pub(crate) registry: Arc<Registry>,
    pub(crate) catalog: Arc<Catalog>,
    pub(crate) cache: Mutex<BTreeMap<String, Value>>,
    pub(crate) building: Mutex<Vec<String>>,
}

impl Container {
    /// Identifier under which the container resolves itself.
    pub const ID: &'static str = "container";

    /// Takes over the registry and locks it; from here on the configuration
    /// is shared and immutable.
    #[must_use]
    pub fn new(registry: Registry) -> Self {
        registry.lock();
        let catalog = registry.catalog().clone();
        Self::with_parts(Arc::new(registry), catalog)
    }

    fn with_parts(registry: Arc<Registry>, catalog: Arc<Catalog>) -> Self {
        Self {
            inner: Arc::new(ContainerInner {
                registry,
                catalog,
                cache: Mutex::new(BTreeMap::new()),
                building: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Same registry and catalog, fresh cache and building set: an isolated
    /// object graph over shared configuration.
    #[must_use]
    pub fn fork(&self) -> Self {
        Self::with_parts(self.inner.registry.clone(), self.inner.catalog.clone())
    }

    #[must_use]
    pub fn registry(&self) -> &Arc<Registry> {
        &self.inner.registry
    }

    #[must_use]
    pub fn has(&self, id: &str) -> bool {
        id == Self::ID || id == Invoker::ID || self.inner.registry.has(id) || self.inner.catalog.has(id)
    }

    /// Returns the cached instance for `id`, building and caching it on the
    /// first request.
    pub fn get(&self, id: &str) -> Result<Value, ResolveErrorKind> {
        let span = info_span!("get", id);
        let _guard = span.enter();

        if id == Self::ID {
            return Ok(Value::object(Self::ID, self.clone()));
        }
        if id == Invoker::ID {
            return Ok(Value::object(Invoker::ID, Invoker::with_container(self.clone())));
        }
        if !self.has(id) {
            let err = ResolveErrorKind::NotFound { id: id.to_string() };
            error!("{err}");
            return Err(err);
        }

        if let Some(value) = self.inner.cache.lock().get(id) {
            debug!("found in cache");
            return Ok(value.clone());
        }
        debug!("not found in cache");

        Ok(self.build(id)?)
    }

    /// Assembles a fresh value for `id`, bypassing the cache read, then
    /// fills the cache slot if still empty and runs the configuration pass.
    pub fn build(&self, id: &str) -> Result<Value, BuildErrorKind> {
        let value = self.assemble(id)?;
        self.remember(id, &value);
        self.configure(&value, id)?;
        debug!(id, "built");
        Ok(value)
    }

    fn assemble(&self, id: &str) -> Result<Value, BuildErrorKind> {
        match self.inner.registry.binding(id).map(|binding| &binding.kind) {
            // Pre-built: nothing to construct, no cycle tracking.
            Some(BindingKind::Instance(value)) => Ok(value.clone()),
            Some(BindingKind::Factory(factory)) => {
                let _building = BuildGuard::enter(self, id)?;
                factory.call(self.clone()).map_err(BuildErrorKind::Instantiate)
            }
            Some(BindingKind::Alias(target)) => {
                let _building = BuildGuard::enter(self, id)?;
                self.assemble(target)
            }
            None => self.autowire(id),
        }
    }

    fn autowire(&self, id: &str) -> Result<Value, BuildErrorKind> {
        if self.inner.catalog.is_interface(id) {
            let err = BuildErrorKind::Abstract { id: id.to_string() };
            error!("{err}");
            return Err(err);
        }
        let Some(meta) = self.inner.catalog.class(id) else {
            let err = BuildErrorKind::MissingType { id: id.to_string() };
            error!("{err}");
            return Err(err);
        };
        let Some(constructor) = &meta.constructor else {
            let err = BuildErrorKind::NoConstructor { id: id.to_string() };
            error!("{err}");
            return Err(err);
        };

        let _building = BuildGuard::enter(self, id)?;
        let arguments = self.constructor_arguments(id, meta)?;
        constructor.call(arguments).map_err(BuildErrorKind::Instantiate)
    }

    fn constructor_arguments(&self, id: &str, meta: &TypeMeta) -> Result<Vec<Value>, BuildErrorKind> {
        let overrides = self.inner.registry.parameter_overrides(id);
        let mut arguments = Vec::with_capacity(meta.params.len());
        for param in &meta.params {
            arguments.push(self.constructor_argument(id, param, overrides)?);
        }
        Ok(arguments)
    }

    fn constructor_argument(
        &self,
        id: &str,
        param: &ParamSpec,
        overrides: Option<&BTreeMap<String, Value>>,
    ) -> Result<Value, BuildErrorKind> {
        if let Some(value) = overrides.and_then(|map| map.get(param.name)) {
            check_supplied(param, value, &self.inner.catalog).map_err(|cause| BuildErrorKind::Parameter {
                id: id.to_string(),
                parameter: param.name,
                cause,
            })?;
            return Ok(value.clone());
        }

        if param.variadic {
            return Ok(Value::List(Vec::new()));
        }

        for hint in &param.hints {
            let TypeHint::Class(type_name) = *hint else { continue };
            if let Some(value) = self.class_argument(id, param, type_name)? {
                return Ok(value);
            }
        }

        // List-typed parameters without a default get an empty container
        // value rather than null.
        if param.default.is_none() && param.hints.contains(&TypeHint::List) {
            return Ok(Value::List(Vec::new()));
        }

        fallback_value(param).map_err(|cause| {
            let err = BuildErrorKind::Parameter {
                id: id.to_string(),
                parameter: param.name,
                cause,
            };
            error!("{err}");
            err
        })
    }

    fn class_argument(&self, id: &str, param: &ParamSpec, type_name: &'static str) -> Result<Option<Value>, BuildErrorKind> {
        if let Some(redirect) = self.inner.registry.redirect(type_name, param.name, id).cloned() {
            match redirect.kind {
                RedirectKind::Supply(factory) => {
                    let value = factory.call(self.clone()).map_err(BuildErrorKind::Instantiate)?;
                    if !self.satisfies(&value, type_name) {
                        return Err(BuildErrorKind::UnsatisfiedService {
                            id: id.to_string(),
                            key: String::from("<resolver>"),
                            parameter: param.name,
                            expected: type_name,
                        });
                    }
                    debug!(type_name, "parameter supplied by resolver");
                    return Ok(Some(value));
                }
                RedirectKind::Key(key) => {
                    if self.has(&key) {
                        let value = self.get(&key).map_err(BuildErrorKind::from)?;
                        if !self.satisfies(&value, type_name) {
                            let err = BuildErrorKind::UnsatisfiedService {
                                id: id.to_string(),
                                key,
                                parameter: param.name,
                                expected: type_name,
                            };
                            error!("{err}");
                            return Err(err);
                        }
                        debug!(type_name, key = %key, "parameter redirected");
                        return Ok(Some(value));
                    }
                }
            }
        }

        if self.resolvable(type_name) {
            let value = self.get(type_name).map_err(BuildErrorKind::from)?;
            if !self.satisfies(&value, type_name) {
                let err = BuildErrorKind::UnsatisfiedService {
                    id: id.to_string(),
                    key: type_name.to_string(),
                    parameter: param.name,
                    expected: type_name,
                };
                error!("{err}");
                return Err(err);
            }
            return Ok(Some(value));
        }

        Ok(None)
    }

    /// A type is resolvable when it is bound or names a constructible class;
    /// an unbound interface is loadable but not resolvable, so parameters
    /// typed with it fall through to their defaults.
    fn resolvable(&self, type_name: &str) -> bool {
        self.inner.registry.has(type_name) || self.inner.catalog.class(type_name).is_some()
    }

    fn satisfies(&self, value: &Value, type_name: &str) -> bool {
        value
            .as_object()
            .is_some_and(|object| self.inner.catalog.is_a(object.type_name(), type_name))
    }

    /// Fills the cache slot only when vacant, and before any callback runs,
    /// so a callback re-entering the container for the same id observes the
    /// instance instead of re-triggering construction.
    fn remember(&self, id: &str, value: &Value) {
        self.inner
            .cache
            .lock()
            .entry(id.to_string())
            .or_insert_with(|| value.clone());
    }

    /// Runs the callback pass for a built value. Interface ids run their own
    /// callbacks before the concrete class's; any other id runs the concrete
    /// class's callbacks before the ones registered under the requested id.
    fn configure(&self, value: &Value, id: &str) -> Result<(), BuildErrorKind> {
        let concrete = value.as_object().map(|object| object.type_name());
        if self.inner.catalog.is_interface(id) {
            self.run_callbacks(id, value)?;
            if let Some(concrete) = concrete {
                if concrete != id {
                    self.run_callbacks(concrete, value)?;
                }
            }
        } else {
            if let Some(concrete) = concrete {
                if concrete != id {
                    self.run_callbacks(concrete, value)?;
                }
            }
            self.run_callbacks(id, value)?;
        }
        Ok(())
    }

    fn run_callbacks(&self, callback_id: &str, value: &Value) -> Result<(), BuildErrorKind> {
        let Some(callbacks) = self.inner.registry.callbacks_for(callback_id) else {
            return Ok(());
        };
        for entry in callbacks {
            entry.callback.call(value, self).map_err(|cause| {
                let err = BuildErrorKind::Callback {
                    id: callback_id.to_string(),
                    name: entry.name.clone(),
                    cause,
                };
                error!("{err}");
                err
            })?;
            debug!(id = callback_id, name = %entry.name, "callback run");
        }
        Ok(())
    }
}

impl Lookup for Container {
    #[inline]
    fn has(&self, type_name: &str) -> bool {
        self.resolvable(type_name)
    }

    #[inline]
    fn get(&self, type_name: &str) -> Result<Value, ResolveErrorKind> {
        Container::get(self, type_name)
    }
}

/// Marks an id as building for the extent of one `build` call; the mark is
/// removed on drop so a failed build never blocks later attempts.
struct BuildGuard<'a> {
    building: &'a Mutex<Vec<String>>,
    id: String,
}

impl<'a> BuildGuard<'a> {
    fn enter(container: &'a Container, id: &str) -> Result<Self, BuildErrorKind> {
        let mut building = container.inner.building.lock();
        if building.iter().any(|entry| entry.as_str() == id) {
            let mut chain = building.clone();
            chain.push(id.to_string());
            drop(building);
            let err = BuildErrorKind::CircularReference { chain };
            error!("{err}");
            return Err(err);
        }
        building.push(id.to_string());
        drop(building);
        Ok(Self {
            building: &container.inner.building,
            id: id.to_string(),
        })
    }
}

impl Drop for BuildGuard<'_> {
    fn drop(&mut self) {
        let mut building = self.building.lock();
        if let Some(position) = building.iter().rposition(|entry| *entry == self.id) {
            building.remove(position);
        }
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use alloc::{format, string::{String, ToString as _}, sync::Arc, vec::Vec};
    use core::sync::atomic::{AtomicU8, Ordering};

    use tracing_test::traced_test;

    use super::Container;
    use crate::{
        catalog::{Catalog, ParamSpec, TypeHint, TypeMeta},
        errors::{BuildErrorKind, InstantiateErrorKind, ResolveErrorKind},
        registry::{Binding, Redirect, Registry},
        value::Value,
    };

    struct Leaf;
    struct Node;

    fn cyclic_catalog() -> Catalog {
        Catalog::builder()
            .class(
                TypeMeta::new("First")
                    .param(ParamSpec::new("second", TypeHint::Class("Second")))
                    .constructor(|_args: Vec<Value>| Ok::<_, InstantiateErrorKind>(Value::object("First", Node))),
            )
            .class(
                TypeMeta::new("Second")
                    .param(ParamSpec::new("first", TypeHint::Class("First")))
                    .constructor(|_args: Vec<Value>| Ok::<_, InstantiateErrorKind>(Value::object("Second", Node))),
            )
            .build()
    }

    fn leaf_catalog() -> Catalog {
        Catalog::builder()
            .class(TypeMeta::new("Leaf").constructor(|_args: Vec<Value>| {
                Ok::<_, InstantiateErrorKind>(Value::object("Leaf", Leaf))
            }))
            .build()
    }

    #[test]
    #[traced_test]
    fn test_get_caches_by_identity() {
        let container = Container::new(Registry::new(leaf_catalog()));

        let first = container.get("Leaf").unwrap();
        let second = container.get("Leaf").unwrap();
        assert!(first.as_object().unwrap().ptr_eq(second.as_object().unwrap()));
    }

    #[test]
    #[traced_test]
    fn test_build_bypasses_cache_read() {
        let container = Container::new(Registry::new(leaf_catalog()));

        let cached = container.get("Leaf").unwrap();
        let fresh = container.build("Leaf").unwrap();
        assert!(!cached.as_object().unwrap().ptr_eq(fresh.as_object().unwrap()));
        // The cache slot stays on the first value.
        let again = container.get("Leaf").unwrap();
        assert!(cached.as_object().unwrap().ptr_eq(again.as_object().unwrap()));
    }

    #[test]
    #[traced_test]
    fn test_circular_reference_reports_chain() {
        let container = Container::new(Registry::new(cyclic_catalog()));

        let err = container.get("First").unwrap_err();
        let ResolveErrorKind::Build(BuildErrorKind::CircularReference { chain }) = err else {
            panic!("expected a circular reference, got {err:?}");
        };
        assert!(chain.iter().any(|id| id == "First"));
        assert!(chain.iter().any(|id| id == "Second"));
        assert_eq!(chain.first().map(alloc::string::String::as_str), Some("First"));
    }

    #[test]
    #[traced_test]
    fn test_failed_build_cleans_building_set() {
        let container = Container::new(Registry::new(cyclic_catalog()));

        assert!(container.get("First").is_err());
        assert!(container.inner.building.lock().is_empty());
        // The same id fails the same way instead of being blocked forever.
        assert!(matches!(
            container.get("First"),
            Err(ResolveErrorKind::Build(BuildErrorKind::CircularReference { .. }))
        ));
    }

    #[test]
    #[traced_test]
    fn test_factory_binding_runs_once() {
        let calls = Arc::new(AtomicU8::new(0));

        let mut registry = Registry::new(leaf_catalog());
        registry
            .set(
                "leaf.lazy",
                Binding::factory({
                    let calls = calls.clone();
                    move |container: Container| {
                        calls.fetch_add(1, Ordering::SeqCst);
                        container.get("Leaf").map_err(|err| {
                            InstantiateErrorKind::Custom(anyhow::anyhow!("{err}"))
                        })
                    }
                }),
            )
            .unwrap();

        let container = Container::new(registry);
        let first = container.get("leaf.lazy").unwrap();
        let second = container.get("leaf.lazy").unwrap();

        assert!(first.as_object().unwrap().ptr_eq(second.as_object().unwrap()));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    #[traced_test]
    fn test_fork_isolates_cache() {
        let container = Container::new(Registry::new(leaf_catalog()));
        let fork = container.fork();

        let original = container.get("Leaf").unwrap();
        let forked = fork.get("Leaf").unwrap();
        assert!(!original.as_object().unwrap().ptr_eq(forked.as_object().unwrap()));
    }

    #[test]
    #[traced_test]
    fn test_container_resolves_itself() {
        let container = Container::new(Registry::new(leaf_catalog()));

        let value = container.get(Container::ID).unwrap();
        let handle = value.downcast::<Container>().unwrap();
        let through_handle = handle.get("Leaf").unwrap();
        let direct = container.get("Leaf").unwrap();
        assert!(through_handle.as_object().unwrap().ptr_eq(direct.as_object().unwrap()));
    }

    #[test]
    #[traced_test]
    fn test_resolver_redirects_typed_parameter() {
        struct Connection(&'static str);

        let catalog = Catalog::builder()
            .class(
                TypeMeta::new("Connection")
                    .constructor(|_args: Vec<Value>| {
                        Ok::<_, InstantiateErrorKind>(Value::object("Connection", Connection("default")))
                    }),
            )
            .class(
                TypeMeta::new("Repository")
                    .param(ParamSpec::new("connection", TypeHint::Class("Connection")))
                    .constructor(|args: Vec<Value>| {
                        let connection = args[0].downcast::<Connection>().expect("connection expected");
                        Ok::<_, InstantiateErrorKind>(Value::object("Repository", connection.0))
                    }),
            )
            .build();

        let mut registry = Registry::new(catalog);
        registry
            .set(
                "db.replica",
                Binding::instance(Value::object("Connection", Connection("replica"))),
            )
            .unwrap()
            .resolver("Connection", "connection", Redirect::key("db.replica"))
            .unwrap();

        let container = Container::new(registry);
        let repository = container.get("Repository").unwrap();
        assert_eq!(*repository.downcast::<&'static str>().unwrap(), "replica");
    }
}
