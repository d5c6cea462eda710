use alloc::{boxed::Box, string::String};

use super::container::ResolveErrorKind;

#[derive(thiserror::Error, Debug)]
pub enum ArgumentsErrorKind {
    #[error("parameter `{parameter}` expects {expected}, got {actual}")]
    TypeMismatch {
        parameter: &'static str,
        expected: String,
        actual: &'static str,
    },
    #[error("parameter `{parameter}` cannot be resolved")]
    Unresolved { parameter: &'static str },
    #[error("lookup of `{type_name}` for parameter `{parameter}` failed: {cause}")]
    Lookup {
        parameter: &'static str,
        type_name: &'static str,
        cause: Box<ResolveErrorKind>,
    },
}
