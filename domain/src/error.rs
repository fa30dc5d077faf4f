//! Error types for gateway calls and the services built on them.

use thiserror::Error;

/// Failure of a single call against the data backend or auth provider
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GatewayError {
    /// The backend answered with an error body
    #[error("{message}")]
    Backend { code: Option<String>, message: String },

    /// A single-row read matched nothing
    #[error("No rows returned")]
    NoRows,

    #[error("Network error: {0}")]
    Network(String),

    /// A row did not match the record it was decoded into
    #[error("Failed to decode response: {0}")]
    Decode(String),

    #[error("Not authenticated")]
    NotAuthenticated,
}

impl GatewayError {
    pub fn backend(message: impl Into<String>) -> Self {
        GatewayError::Backend {
            code: None,
            message: message.into(),
        }
    }
}

impl From<serde_json::Error> for GatewayError {
    fn from(err: serde_json::Error) -> Self {
        GatewayError::Decode(err.to_string())
    }
}

/// Error returned by domain services
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Gateway(#[from] GatewayError),

    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    NotFound(String),

    #[error("You must be signed in")]
    NotAuthenticated,

    #[error("{0}")]
    InvalidImport(String),

    /// Writing an export file failed
    #[error("Export failed: {0}")]
    Export(String),
}

impl ServiceError {
    /// Text for a toast: the backend or validation message when there is one,
    /// otherwise `fallback`
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            ServiceError::Gateway(GatewayError::Backend { message, .. }) if !message.is_empty() => {
                message.clone()
            }
            ServiceError::Gateway(_) | ServiceError::Export(_) => fallback.to_string(),
            ServiceError::NotAuthenticated => self.to_string(),
            ServiceError::Validation(msg)
            | ServiceError::NotFound(msg)
            | ServiceError::InvalidImport(msg) => msg.clone(),
        }
    }
}

impl From<serde_json::Error> for ServiceError {
    fn from(err: serde_json::Error) -> Self {
        ServiceError::Gateway(GatewayError::from(err))
    }
}

impl From<csv::Error> for ServiceError {
    fn from(err: csv::Error) -> Self {
        ServiceError::Export(err.to_string())
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;
