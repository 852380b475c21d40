use thiserror::Error;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("unknown entity type: {0}")]
    UnknownType(String),
}
