#[derive(thiserror::Error, Debug)]
pub enum InstantiateErrorKind {
    #[error("{0}")]
    Custom(anyhow::Error),
}

impl From<anyhow::Error> for InstantiateErrorKind {
    fn from(err: anyhow::Error) -> Self {
        Self::Custom(err)
    }
}
