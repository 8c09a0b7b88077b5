//! Unified error type.

use http::StatusCode;

/// The error type returned by road's fallible operations.
///
/// Two families live here. Configuration errors (`InvalidRoute`,
/// `ConflictingRoute`, `InvalidMethod`, `InvalidAddress`) surface while the
/// application is being built. Everything else travels through a running
/// chain: a middleware returns `Err`, the chain stops, and
/// [`Road::dispatch`](crate::Road::dispatch) resolves to that same error.
///
/// The chain never turns an error into a response on its own. Register
/// [`middleware::Recover`](crate::middleware::Recover) near the front if you
/// want uniform error responses.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid socket address `{0}`")]
    InvalidAddress(String),

    #[error("invalid route `{pattern}`: {reason}")]
    InvalidRoute { pattern: String, reason: &'static str },

    #[error("route `{pattern}` conflicts with `{existing}` for {method}")]
    ConflictingRoute {
        method: String,
        pattern: String,
        existing: String,
    },

    #[error("invalid method `{0}`")]
    InvalidMethod(String),

    #[error("sub-request depth limit of {0} exceeded")]
    RecursionLimit(usize),

    /// A failure that should be reported to the client with a specific status.
    #[error("{status}: {message}")]
    Http { status: StatusCode, message: String },

    #[error(transparent)]
    Middleware(Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
    /// An error carrying the status the client should see.
    pub fn http(status: StatusCode, message: impl Into<String>) -> Self {
        Self::Http { status, message: message.into() }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::http(StatusCode::NOT_FOUND, message)
    }

    /// Wraps any error raised inside a middleware or handler.
    pub fn other<E>(err: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        Self::Middleware(err.into())
    }

    /// The status this error maps to when translated into a response.
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Http { status, .. } => *status,
            Self::InvalidMethod(_) => StatusCode::METHOD_NOT_ALLOWED,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_errors_keep_their_status() {
        let err = Error::not_found("no such user");
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
        assert_eq!(err.to_string(), "404 Not Found: no such user");
    }

    #[test]
    fn other_errors_map_to_500() {
        let err = Error::other("database unavailable");
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.to_string(), "database unavailable");
    }
}
