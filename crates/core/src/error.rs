// Central Error Type for the Application

use thiserror::Error;

/// Application-level error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Domain error: {0}")]
    Domain(#[from] crate::domain::DomainError),

    #[error("Directory error: {0}")]
    Directory(#[from] crate::port::DirectoryError),

    #[error("Remote error: {0}")]
    Remote(#[from] crate::port::RemoteError),

    #[error("Secret store error: {0}")]
    SecretStore(#[from] crate::port::SecretStoreError),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl AppError {
    /// Stable short code, shown next to fatal CLI errors
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Domain(_) => "INVALID_ARGUMENT",
            AppError::Directory(_) => "DIRECTORY_ERROR",
            AppError::Remote(crate::port::RemoteError::TransportUnreachable { .. }) => {
                "TRANSPORT_UNREACHABLE"
            }
            AppError::Remote(crate::port::RemoteError::AccessDenied { .. }) => "ACCESS_DENIED",
            AppError::Remote(_) => "REMOTE_ERROR",
            AppError::SecretStore(_) => "SECRET_STORE_ERROR",
            AppError::Config(_) => "CONFIG_ERROR",
        }
    }
}

/// Result type alias using AppError
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::port::RemoteError;

    #[test]
    fn test_remote_codes() {
        let err: AppError = RemoteError::TransportUnreachable {
            host: "dc01".to_string(),
            message: "no route".to_string(),
        }
        .into();
        assert_eq!(err.code(), "TRANSPORT_UNREACHABLE");
        assert!(err.to_string().contains("dc01"));

        let err: AppError = RemoteError::Failed {
            host: "dc01".to_string(),
            message: "boom".to_string(),
        }
        .into();
        assert_eq!(err.code(), "REMOTE_ERROR");
    }
}
