use alloc::{string::String, vec::Vec};

use super::{arguments::ArgumentsErrorKind, instantiate::InstantiateErrorKind};

fn join_chain(chain: &[String]) -> String {
    chain.join(" -> ")
}

#[derive(thiserror::Error, Debug)]
pub enum BuildErrorKind {
    #[error("no type metadata for `{id}`")]
    MissingType { id: String },
    #[error("`{id}` is abstract and has no binding")]
    Abstract { id: String },
    #[error("`{id}` has no registered constructor")]
    NoConstructor { id: String },
    #[error("circular reference: {}", join_chain(.chain))]
    CircularReference { chain: Vec<String> },
    #[error("parameter `{parameter}` of `{id}`: {cause}")]
    Parameter {
        id: String,
        parameter: &'static str,
        cause: ArgumentsErrorKind,
    },
    #[error("service `{key}` does not satisfy `{expected}` wanted by parameter `{parameter}` of `{id}`")]
    UnsatisfiedService {
        id: String,
        key: String,
        parameter: &'static str,
        expected: &'static str,
    },
    #[error(transparent)]
    Instantiate(#[from] InstantiateErrorKind),
    #[error("callback `{name}` for `{id}` failed: {cause}")]
    Callback {
        id: String,
        name: String,
        cause: InstantiateErrorKind,
    },
}

#[derive(thiserror::Error, Debug)]
pub enum ResolveErrorKind {
    #[error("`{id}` is not known to the container")]
    NotFound { id: String },
    #[error(transparent)]
    Build(#[from] BuildErrorKind),
}

impl From<ResolveErrorKind> for BuildErrorKind {
    /// Dependency errors propagate unwrapped so a circular-reference error
    /// raised deep in the graph keeps its chain at the surface.
    fn from(err: ResolveErrorKind) -> Self {
        match err {
            ResolveErrorKind::NotFound { id } => Self::MissingType { id },
            ResolveErrorKind::Build(err) => err,
        }
    }
}
