use alloc::string::String;

#[derive(thiserror::Error, Debug)]
pub enum RegistryErrorKind {
    #[error("registry is locked")]
    Locked,
    #[error("unknown type `{name}`")]
    UnknownType { name: String },
    #[error("`{id}` cannot be bound to null")]
    NullBinding { id: String },
    #[error("add expects a constructed object, got {kind}")]
    NotAnInstance { kind: &'static str },
    #[error("`{class}` satisfies no registered interface")]
    NoInterface { class: String },
    #[error("`{class}` satisfies more than one interface, name one explicitly")]
    AmbiguousInterface { class: String },
    #[error("`{class}` does not implement `{interface}`")]
    NotImplemented { class: String, interface: String },
}
