use alloc::{boxed::Box, string::String};

use super::{arguments::ArgumentsErrorKind, container::ResolveErrorKind, instantiate::InstantiateErrorKind};

#[derive(thiserror::Error, Debug)]
pub enum InvokeErrorKind {
    #[error(transparent)]
    Arguments(#[from] ArgumentsErrorKind),
    #[error(transparent)]
    Call(InstantiateErrorKind),
    #[error("unknown type `{name}`")]
    UnknownType { name: String },
    #[error("`{name}` has no registered constructor")]
    NoConstructor { name: String },
    #[error("`{name}` is abstract and no container is attached")]
    AbstractTarget { name: String },
    #[error("{0}")]
    Resolve(Box<ResolveErrorKind>),
}
