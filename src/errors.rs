mod arguments;
mod container;
mod instantiate;
mod invoker;
mod registry;

pub use arguments::ArgumentsErrorKind;
pub use container::{BuildErrorKind, ResolveErrorKind};
pub use instantiate::InstantiateErrorKind;
pub use invoker::InvokeErrorKind;
pub use registry::RegistryErrorKind;
