//! Error types for source, mirror and token operations.
//!
//! Every adapter reports failures as a [`ProviderError`]. The sync engine
//! only looks at the [`ProviderErrorCode`]: an authentication failure from
//! the task source means the credential expired, a retryable code means the
//! cycle can simply be skipped.

use std::fmt;
use thiserror::Error;

/// What went wrong, as far as the sync engine cares.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderErrorCode {
    /// The bearer credential was rejected (HTTP 401) or the token endpoint
    /// denied a refresh.
    AuthenticationFailed,
    /// HTTP 403.
    AuthorizationFailed,
    /// The remote could not be reached.
    NetworkError,
    /// HTTP 429.
    RateLimited,
    /// HTTP 5xx.
    ServerError,
    /// The body did not have the expected shape.
    InvalidResponse,
    /// Unknown task list, database or page (HTTP 404).
    NotFound,
    /// HTTP 400, 409 or 422.
    BadRequest,
    /// Adapter configuration is unusable.
    ConfigurationError,
    /// The mirror store refused to write an item.
    WriteRejected,
    /// Unexpected internal state.
    InternalError,
}

impl ProviderErrorCode {
    /// Returns true if a later attempt may succeed without intervention.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::NetworkError | Self::RateLimited | Self::ServerError
        )
    }

    /// Maps an HTTP error status.
    pub fn for_status(status: u16) -> Self {
        match status {
            401 => Self::AuthenticationFailed,
            403 => Self::AuthorizationFailed,
            404 => Self::NotFound,
            429 => Self::RateLimited,
            400 | 409 | 422 => Self::BadRequest,
            500..=599 => Self::ServerError,
            _ => Self::InvalidResponse,
        }
    }

    /// Returns the snake_case name used in logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AuthenticationFailed => "authentication_failed",
            Self::AuthorizationFailed => "authorization_failed",
            Self::NetworkError => "network_error",
            Self::RateLimited => "rate_limited",
            Self::ServerError => "server_error",
            Self::InvalidResponse => "invalid_response",
            Self::NotFound => "not_found",
            Self::BadRequest => "bad_request",
            Self::ConfigurationError => "configuration_error",
            Self::WriteRejected => "write_rejected",
            Self::InternalError => "internal_error",
        }
    }
}

impl fmt::Display for ProviderErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An error reported by a source, mirror or token endpoint adapter.
#[derive(Debug, Error)]
pub struct ProviderError {
    code: ProviderErrorCode,
    message: String,
    /// Adapter that produced the error ("google-tasks", "notion", ...).
    provider: Option<String>,
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl ProviderError {
    /// Creates an error with `code`.
    pub fn new(code: ProviderErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            provider: None,
            source: None,
        }
    }

    /// Rejected credential or denied refresh.
    pub fn authentication(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::AuthenticationFailed, message)
    }

    /// Transport failure.
    pub fn network(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::NetworkError, message)
    }

    pub fn rate_limited(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::RateLimited, message)
    }

    pub fn server(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::ServerError, message)
    }

    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::InvalidResponse, message)
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::ConfigurationError, message)
    }

    /// The mirror refused the item.
    pub fn write_rejected(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::WriteRejected, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::InternalError, message)
    }

    /// Builds the error for a non-success HTTP status.
    ///
    /// `context` names the call ("list tasks", "create page", ...).
    pub fn from_status(status: u16, context: &str, body: &str) -> Self {
        Self::new(
            ProviderErrorCode::for_status(status),
            format!("{} failed ({}): {}", context, status, body.trim()),
        )
    }

    /// Builder: name the adapter.
    pub fn with_provider(mut self, provider: impl Into<String>) -> Self {
        self.provider = Some(provider.into());
        self
    }

    /// Builder: attach the underlying error.
    pub fn with_source<E>(mut self, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        self.source = Some(Box::new(source));
        self
    }

    pub fn code(&self) -> ProviderErrorCode {
        self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn provider(&self) -> Option<&str> {
        self.provider.as_deref()
    }

    /// See [`ProviderErrorCode::is_retryable`].
    pub fn is_retryable(&self) -> bool {
        self.code.is_retryable()
    }

    /// Returns true if the credential used for the call was rejected.
    pub fn is_unauthorized(&self) -> bool {
        self.code == ProviderErrorCode::AuthenticationFailed
    }
}

impl fmt::Display for ProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.provider {
            Some(provider) => write!(f, "{}: {} ({})", provider, self.message, self.code),
            None => write!(f, "{} ({})", self.message, self.code),
        }
    }
}

/// A specialized Result type for provider operations.
pub type ProviderResult<T> = Result<T, ProviderError>;

/// Parses an endpoint URL from configuration.
#[cfg_attr(not(any(feature = "google", feature = "notion")), allow(dead_code))]
pub(crate) fn parse_url(raw: &str) -> ProviderResult<url::Url> {
    url::Url::parse(raw)
        .map_err(|e| ProviderError::configuration(format!("invalid URL {}: {}", raw, e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_code_retryable() {
        assert!(ProviderErrorCode::NetworkError.is_retryable());
        assert!(ProviderErrorCode::RateLimited.is_retryable());
        assert!(ProviderErrorCode::ServerError.is_retryable());
        assert!(!ProviderErrorCode::AuthenticationFailed.is_retryable());
        assert!(!ProviderErrorCode::WriteRejected.is_retryable());
    }

    #[test]
    fn unauthorized_only_for_authentication() {
        assert!(ProviderError::authentication("expired").is_unauthorized());
        assert!(!ProviderError::from_status(403, "list tasks", "").is_unauthorized());
        assert!(!ProviderError::network("timeout").is_unauthorized());
    }

    #[test]
    fn from_status_maps_codes() {
        let cases = [
            (401, ProviderErrorCode::AuthenticationFailed),
            (403, ProviderErrorCode::AuthorizationFailed),
            (404, ProviderErrorCode::NotFound),
            (429, ProviderErrorCode::RateLimited),
            (400, ProviderErrorCode::BadRequest),
            (503, ProviderErrorCode::ServerError),
            (302, ProviderErrorCode::InvalidResponse),
        ];
        for (status, code) in cases {
            assert_eq!(ProviderError::from_status(status, "list tasks", "").code(), code);
        }
    }

    #[test]
    fn display_names_adapter_and_code() {
        let err = ProviderError::rate_limited("too many requests").with_provider("notion");
        assert_eq!(err.to_string(), "notion: too many requests (rate_limited)");
        assert_eq!(
            ProviderError::network("timeout").to_string(),
            "timeout (network_error)"
        );
    }

    #[test]
    fn source_is_exposed() {
        use std::error::Error;
        let io_err = std::io::Error::other("connection reset");
        let err = ProviderError::network("request failed").with_source(io_err);
        assert!(err.source().is_some());
    }
}
