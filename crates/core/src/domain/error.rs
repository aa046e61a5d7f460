// Domain Error Types

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Record construction failed: {0}")]
    RecordConstruction(String),
}

pub type Result<T> = std::result::Result<T, DomainError>;
