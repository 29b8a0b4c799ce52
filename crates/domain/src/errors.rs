use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("Malformed DNS message: {0}")]
    MalformedMessage(String),

    #[error("Upstream timeout waiting for {server}")]
    UpstreamTimeout { server: String },

    #[error("Upstream transport error with {server}: {reason}")]
    UpstreamTransportError { server: String, reason: String },

    #[error("All upstream servers exhausted after {attempts} attempts, last error: {last_error}")]
    AllUpstreamsExhausted { attempts: usize, last_error: String },

    #[error("Invalid IP address: {0}")]
    InvalidAddress(String),

    #[error("Failed to persist replacement cache: {0}")]
    CacheStoreFailure(String),

    #[error("List file {path}: {reason}")]
    ListFile { path: String, reason: String },
}

impl DomainError {
    pub fn transport(server: impl ToString, reason: impl ToString) -> Self {
        DomainError::UpstreamTransportError {
            server: server.to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn timeout(server: impl ToString) -> Self {
        DomainError::UpstreamTimeout {
            server: server.to_string(),
        }
    }
}
