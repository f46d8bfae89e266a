//! Error hierarchy for the Review Board remote client.
//!
//! Single root `Error` for all public functions; HTTP failures are mapped to
//! provider-style kinds (401→Unauthorized, 429→RateLimited, 5xx→Server) the
//! same way the provider clients this crate is modeled on do.

use thiserror::Error;

/// Convenient alias for crate-wide results.
pub type RbResult<T> = Result<T, Error>;

/// Root error type for the `reviewbot-remote` crate.
#[derive(Debug, Error)]
pub enum Error {
    /// Unauthorized (HTTP 401).
    #[error("unauthorized")]
    Unauthorized,

    /// Forbidden (HTTP 403).
    #[error("forbidden")]
    Forbidden,

    /// Not found (HTTP 404).
    #[error("not found")]
    NotFound,

    /// Rate limited (HTTP 429).
    #[error("rate limited")]
    RateLimited,

    /// Gateway/server error (HTTP 5xx).
    #[error("server error: status {0}")]
    Server(u16),

    /// Other HTTP status not covered above.
    #[error("http status error: {0}")]
    HttpStatus(u16),

    /// Timeout at transport level.
    #[error("timeout")]
    Timeout,

    /// Network/transport failure without status (DNS/connect/reset).
    #[error("network error: {0}")]
    Network(String),

    /// JSON deserialization error.
    #[error("serde error: {0}")]
    Serde(#[from] serde_json::Error),

    /// Unexpected/invalid shape of a Review Board response.
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            return Error::Timeout;
        }
        if let Some(status) = e.status() {
            let code = status.as_u16();
            return match code {
                401 => Error::Unauthorized,
                403 => Error::Forbidden,
                404 => Error::NotFound,
                429 => Error::RateLimited,
                500..=599 => Error::Server(code),
                _ => Error::HttpStatus(code),
            };
        }
        Error::Network(e.to_string())
    }
}
