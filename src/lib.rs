#![no_std]

extern crate alloc;

pub(crate) mod arguments;
pub(crate) mod callback;
pub(crate) mod catalog;
pub(crate) mod container;
pub(crate) mod errors;
pub(crate) mod factory;
pub(crate) mod invoker;
pub(crate) mod registry;
pub(crate) mod value;

pub use arguments::{resolve_arguments, Arguments, Lookup};
pub use callback::Callback;
pub use catalog::{Catalog, CatalogBuilder, ParamSpec, TypeHint, TypeMeta};
pub use container::Container;
pub use errors::{
    ArgumentsErrorKind, BuildErrorKind, InstantiateErrorKind, InvokeErrorKind, RegistryErrorKind, ResolveErrorKind,
};
pub use factory::{Constructor, Factory};
pub use invoker::{Callable, Invoker};
pub use registry::{Binding, Redirect, Registry};
pub use value::{Object, Value};
