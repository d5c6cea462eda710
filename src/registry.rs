use alloc::{
    collections::BTreeMap,
    format,
    string::{String, ToString as _},
    sync::Arc,
    vec::Vec,
};
use core::sync::atomic::{AtomicBool, Ordering};
use tracing::debug;

use crate::{
    callback::{boxed_callback, BoxedCloneCallback, Callback},
    catalog::Catalog,
    errors::RegistryErrorKind,
    factory::{boxed_factory, BoxedCloneFactory, Factory},
    value::Value,
};

const ANONYMOUS_CALLBACK_PREFIX: &str = "callback#";

/// How an identifier is produced: a pre-built instance, an alias to another
/// id, or a lazy factory. An id with no binding auto-wires from the catalog.
#[derive(Clone)]
pub struct Binding {
    pub(crate) kind: BindingKind,
}

#[derive(Clone)]
pub(crate) enum BindingKind {
    Instance(Value),
    Alias(String),
    Factory(BoxedCloneFactory),
}

impl Binding {
    #[must_use]
    pub fn instance(value: impl Into<Value>) -> Self {
        Self {
            kind: BindingKind::Instance(value.into()),
        }
    }

    #[must_use]
    pub fn alias(target: impl Into<String>) -> Self {
        Self {
            kind: BindingKind::Alias(target.into()),
        }
    }

    #[must_use]
    pub fn factory<F: Factory>(factory: F) -> Self {
        Self {
            kind: BindingKind::Factory(boxed_factory(factory)),
        }
    }
}

/// Redirects which named entry supplies a typed constructor parameter, for
/// example selecting between two database connections.
#[derive(Clone)]
pub struct Redirect {
    pub(crate) kind: RedirectKind,
}

#[derive(Clone)]
pub(crate) enum RedirectKind {
    Key(String),
    Supply(BoxedCloneFactory),
}

impl Redirect {
    #[must_use]
    pub fn key(target: impl Into<String>) -> Self {
        Self {
            kind: RedirectKind::Key(target.into()),
        }
    }

    #[must_use]
    pub fn supply<F: Factory>(factory: F) -> Self {
        Self {
            kind: RedirectKind::Supply(boxed_factory(factory)),
        }
    }
}

#[derive(Clone)]
pub(crate) struct NamedCallback {
    pub(crate) name: String,
    pub(crate) callback: BoxedCloneCallback,
}

/// The declarative configuration a container resolves against. Mutated only
/// before being handed over; every mutating operation fails once locked.
pub struct Registry {
    pub(crate) catalog: Arc<Catalog>,
    entries: BTreeMap<String, Binding>,
    parameters: BTreeMap<String, BTreeMap<String, Value>>,
    callbacks: BTreeMap<String, Vec<NamedCallback>>,
    resolvers: BTreeMap<String, BTreeMap<String, Redirect>>,
    locked: AtomicBool,
}

impl Registry {
    #[must_use]
    pub fn new(catalog: impl Into<Arc<Catalog>>) -> Self {
        Self {
            catalog: catalog.into(),
            entries: BTreeMap::new(),
            parameters: BTreeMap::new(),
            callbacks: BTreeMap::new(),
            resolvers: BTreeMap::new(),
            locked: AtomicBool::new(false),
        }
    }

    #[inline]
    #[must_use]
    pub fn catalog(&self) -> &Arc<Catalog> {
        &self.catalog
    }

    /// Stores a binding. An alias must name a loadable type or an id that is
    /// already bound, and nothing may be bound to null.
    pub fn set(&mut self, id: impl Into<String>, binding: Binding) -> Result<&mut Self, RegistryErrorKind> {
        self.ensure_unlocked()?;
        let id = id.into();
        match &binding.kind {
            BindingKind::Instance(Value::Null) => return Err(RegistryErrorKind::NullBinding { id }),
            BindingKind::Alias(target) => {
                if !self.catalog.has(target) && !self.entries.contains_key(target) {
                    return Err(RegistryErrorKind::UnknownType { name: target.clone() });
                }
            }
            _ => {}
        }
        debug!(id = %id, "binding set");
        self.entries.insert(id, binding);
        Ok(self)
    }

    #[must_use]
    pub fn has(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    #[must_use]
    pub fn miss(&self, id: &str) -> bool {
        !self.has(id)
    }

    /// Registers a constructed object under its concrete type name and every
    /// supertype it satisfies. First registration wins: ids already bound
    /// are left alone.
    pub fn add(&mut self, instance: Value) -> Result<&mut Self, RegistryErrorKind> {
        self.ensure_unlocked()?;
        let Value::Object(ref object) = instance else {
            return Err(RegistryErrorKind::NotAnInstance {
                kind: instance.type_label(),
            });
        };
        let type_name = object.type_name();
        let Some(meta) = self.catalog.class(type_name) else {
            return Err(RegistryErrorKind::UnknownType {
                name: type_name.to_string(),
            });
        };

        let mut ids: Vec<&'static str> = Vec::with_capacity(meta.implements.len() + 1);
        ids.push(type_name);
        ids.extend(meta.implements.iter().copied());
        for id in ids {
            if self.entries.contains_key(id) {
                continue;
            }
            debug!(id, type_name, "instance added");
            self.entries.insert(
                id.to_string(),
                Binding {
                    kind: BindingKind::Instance(instance.clone()),
                },
            );
        }
        Ok(self)
    }

    /// Binds an interface to a class. With no interface given it must be
    /// inferable as the single registered interface the class satisfies.
    pub fn bind(&mut self, class: &str, interface: Option<&str>) -> Result<&mut Self, RegistryErrorKind> {
        self.bind_with(class, interface, core::iter::empty::<(&str, Value)>())
    }

    /// Like [`Self::bind`], additionally recording parameter overrides for
    /// the class in the same call.
    pub fn bind_with<K: Into<String>>(
        &mut self,
        class: &str,
        interface: Option<&str>,
        parameters: impl IntoIterator<Item = (K, Value)>,
    ) -> Result<&mut Self, RegistryErrorKind> {
        self.ensure_unlocked()?;
        if self.catalog.class(class).is_none() {
            return Err(RegistryErrorKind::UnknownType { name: class.to_string() });
        }
        let interface: String = match interface {
            Some(interface) => {
                if !self.catalog.is_a(class, interface) {
                    return Err(RegistryErrorKind::NotImplemented {
                        class: class.to_string(),
                        interface: interface.to_string(),
                    });
                }
                interface.to_string()
            }
            None => {
                let candidates = self.catalog.registered_interfaces_of(class);
                match candidates.as_slice() {
                    [] => return Err(RegistryErrorKind::NoInterface { class: class.to_string() }),
                    [single] => (*single).to_string(),
                    _ => {
                        return Err(RegistryErrorKind::AmbiguousInterface {
                            class: class.to_string(),
                        })
                    }
                }
            }
        };
        debug!(class, interface = %interface, "interface bound");
        self.entries.insert(
            interface,
            Binding {
                kind: BindingKind::Alias(class.to_string()),
            },
        );
        let class_parameters = self.parameters.entry(class.to_string()).or_default();
        for (name, value) in parameters {
            class_parameters.insert(name.into(), value);
        }
        Ok(self)
    }

    /// Registers a parameter-redirection rule for a type. The key is `"*"`,
    /// a parameter name, or a consumer class name.
    pub fn resolver(&mut self, type_name: &str, key: &str, redirect: Redirect) -> Result<&mut Self, RegistryErrorKind> {
        self.ensure_unlocked()?;
        self.resolvers
            .entry(type_name.to_string())
            .or_default()
            .insert(key.to_string(), redirect);
        Ok(self)
    }

    pub fn parameter(&mut self, id: &str, name: &str, value: impl Into<Value>) -> Result<&mut Self, RegistryErrorKind> {
        self.ensure_unlocked()?;
        self.parameters
            .entry(id.to_string())
            .or_default()
            .insert(name.to_string(), value.into());
        Ok(self)
    }

    pub fn parameters<K: Into<String>>(
        &mut self,
        id: &str,
        pairs: impl IntoIterator<Item = (K, Value)>,
    ) -> Result<&mut Self, RegistryErrorKind> {
        self.ensure_unlocked()?;
        let map = self.parameters.entry(id.to_string()).or_default();
        for (name, value) in pairs {
            map.insert(name.into(), value);
        }
        Ok(self)
    }

    /// Appends a post-construction callback for an id. An omitted name gets
    /// a positional one so repeated anonymous registrations never overwrite;
    /// re-registering an existing name replaces that entry in place.
    pub fn callback<C: Callback>(&mut self, id: &str, callback: C, name: Option<&str>) -> Result<&mut Self, RegistryErrorKind> {
        self.ensure_unlocked()?;
        let list = self.callbacks.entry(id.to_string()).or_default();
        let name = match name {
            Some(name) => name.to_string(),
            None => format!("{ANONYMOUS_CALLBACK_PREFIX}{}", list.len()),
        };
        Self::push_callback(
            list,
            NamedCallback {
                name,
                callback: boxed_callback(callback),
            },
        );
        Ok(self)
    }

    /// Deep-unions another registry into this one: bindings overwrite,
    /// parameter and resolver maps merge per key, callback lists concatenate
    /// with anonymous entries re-indexed so neither side's are dropped.
    pub fn merge(&mut self, other: Registry) -> Result<&mut Self, RegistryErrorKind> {
        self.ensure_unlocked()?;
        self.entries.extend(other.entries);
        for (id, incoming) in other.parameters {
            self.parameters.entry(id).or_default().extend(incoming);
        }
        for (type_name, incoming) in other.resolvers {
            self.resolvers.entry(type_name).or_default().extend(incoming);
        }
        for (id, incoming) in other.callbacks {
            let list = self.callbacks.entry(id).or_default();
            for mut entry in incoming {
                if entry.name.starts_with(ANONYMOUS_CALLBACK_PREFIX) {
                    entry.name = format!("{ANONYMOUS_CALLBACK_PREFIX}{}", list.len());
                }
                Self::push_callback(list, entry);
            }
        }
        Ok(self)
    }

    pub fn lock(&self) {
        self.locked.store(true, Ordering::Release);
    }

    pub fn unlock(&self) {
        self.locked.store(false, Ordering::Release);
    }

    #[must_use]
    pub fn is_locked(&self) -> bool {
        self.locked.load(Ordering::Acquire)
    }

    fn ensure_unlocked(&self) -> Result<(), RegistryErrorKind> {
        if self.is_locked() {
            Err(RegistryErrorKind::Locked)
        } else {
            Ok(())
        }
    }

    fn push_callback(list: &mut Vec<NamedCallback>, callback: NamedCallback) {
        if let Some(existing) = list.iter_mut().find(|existing| existing.name == callback.name) {
            *existing = callback;
        } else {
            list.push(callback);
        }
    }
}

impl Registry {
    #[inline]
    pub(crate) fn binding(&self, id: &str) -> Option<&Binding> {
        self.entries.get(id)
    }

    #[inline]
    pub(crate) fn parameter_overrides(&self, id: &str) -> Option<&BTreeMap<String, Value>> {
        self.parameters.get(id)
    }

    #[inline]
    pub(crate) fn callbacks_for(&self, id: &str) -> Option<&[NamedCallback]> {
        self.callbacks.get(id).map(Vec::as_slice)
    }

    /// Most specific rule first: the parameter name, then a consumer class
    /// `is_a` match, then the catch-all `"*"`.
    pub(crate) fn redirect(&self, type_name: &str, parameter: &str, consumer: &str) -> Option<&Redirect> {
        let rules = self.resolvers.get(type_name)?;
        if let Some(rule) = rules.get(parameter) {
            return Some(rule);
        }
        for (key, rule) in rules {
            if key != "*" && self.catalog.is_a(consumer, key) {
                return Some(rule);
            }
        }
        rules.get("*")
    }
}
