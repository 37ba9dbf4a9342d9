//! Error types for allocation API operations.
//!
//! One error enum covers the whole client: protocol failures raised by the
//! transport, lookup failures raised by managers, and attribute resolution
//! failures raised by resources.

use thiserror::Error;

/// Main error type for allocation client operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// A single-resource lookup or `find` matched nothing.
    #[error("{resource} not found: {detail}")]
    NotFound {
        /// Resource type that was searched for
        resource: String,
        /// Lookup detail (id, filters or URL)
        detail: String,
    },

    /// A `find` matched more than one resource.
    #[error("multiple {resource} records match {filters}")]
    NoUniqueMatch {
        /// Resource type that was searched for
        resource: String,
        /// Filters that produced the ambiguous match
        filters: String,
    },

    /// The server answered with a non-2xx status.
    #[error("HTTP {status} from {method} {url}: {message}")]
    Http {
        /// HTTP status code
        status: u16,
        /// HTTP method of the failed request
        method: String,
        /// Request URL
        url: String,
        /// Response body text, if any
        message: String,
    },

    /// An attribute was absent after at most one lazy-load attempt.
    #[error("attribute `{name}` not present on {resource}")]
    MissingAttribute {
        /// Resource type the attribute was read from
        resource: String,
        /// Attribute name
        name: String,
    },

    /// A caller-supplied parameter string lacked the `key=value` delimiter.
    #[error("malformed parameter `{0}`, use the key=value format")]
    MalformedParameter(String),

    /// A request was rejected before it reached the wire.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Configuration error
    #[error("configuration error: {0}")]
    ConfigError(String),

    /// A response body could not be decoded into the expected shape.
    #[error("failed to decode response: {0}")]
    DecodeError(String),

    /// The underlying HTTP transport failed before a response was produced.
    #[error("transport error: {0}")]
    TransportError(String),

    /// Operation timed out
    #[error("timeout waiting for allocation API: {0}")]
    Timeout(String),

    /// Invalid endpoint URL
    #[error("invalid endpoint: {0}")]
    InvalidEndpoint(String),
}

/// Specialized result type for allocation client operations.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Returns the error code for this error type.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "NOT_FOUND",
            Self::NoUniqueMatch { .. } => "NO_UNIQUE_MATCH",
            Self::Http { .. } => "HTTP_ERROR",
            Self::MissingAttribute { .. } => "MISSING_ATTRIBUTE",
            Self::MalformedParameter(_) => "MALFORMED_PARAMETER",
            Self::InvalidRequest(_) => "INVALID_REQUEST",
            Self::ConfigError(_) => "CONFIG_ERROR",
            Self::DecodeError(_) => "DECODE_ERROR",
            Self::TransportError(_) => "TRANSPORT_ERROR",
            Self::Timeout(_) => "TIMEOUT",
            Self::InvalidEndpoint(_) => "INVALID_ENDPOINT",
        }
    }

    /// Build a not-found error for a resource type and lookup detail.
    pub fn not_found(resource: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::NotFound {
            resource: resource.into(),
            detail: detail.into(),
        }
    }
}

// Conversions from external error types
impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout(err.to_string())
        } else {
            Self::TransportError(err.to_string())
        }
    }
}

impl From<url::ParseError> for Error {
    fn from(err: url::ParseError) -> Self {
        Self::InvalidEndpoint(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::DecodeError(err.to_string())
    }
}

impl From<validator::ValidationErrors> for Error {
    fn from(err: validator::ValidationErrors) -> Self {
        Self::ConfigError(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_codes() {
        assert_eq!(
            Error::not_found("Allocation", "id=42").error_code(),
            "NOT_FOUND"
        );
        assert_eq!(
            Error::NoUniqueMatch {
                resource: "Zone".to_string(),
                filters: "name=melbourne".to_string(),
            }
            .error_code(),
            "NO_UNIQUE_MATCH"
        );
        assert_eq!(
            Error::MalformedParameter("noequals".to_string()).error_code(),
            "MALFORMED_PARAMETER"
        );
        assert_eq!(
            Error::MissingAttribute {
                resource: "Quota".to_string(),
                name: "zone".to_string(),
            }
            .error_code(),
            "MISSING_ATTRIBUTE"
        );
    }

    #[test]
    fn error_display() {
        let err = Error::Http {
            status: 409,
            method: "POST".to_string(),
            url: "http://api/allocations/".to_string(),
            message: "duplicate".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "HTTP 409 from POST http://api/allocations/: duplicate"
        );

        let err = Error::not_found("Allocation", "project_id=abc");
        assert_eq!(err.to_string(), "Allocation not found: project_id=abc");
    }

    #[test]
    fn from_url_parse_error() {
        let err = url::Url::parse("not a url").unwrap_err();
        let err: Error = err.into();
        assert!(matches!(err, Error::InvalidEndpoint(_)));
    }

    #[test]
    fn from_serde_json_error() {
        let err = serde_json::from_str::<serde_json::Value>("{invalid}").unwrap_err();
        let err: Error = err.into();
        assert!(matches!(err, Error::DecodeError(_)));
    }

    #[test]
    fn error_partial_eq() {
        assert_eq!(
            Error::not_found("Zone", "id=1"),
            Error::not_found("Zone", "id=1")
        );
        assert_ne!(
            Error::not_found("Zone", "id=1"),
            Error::not_found("Zone", "id=2")
        );
    }
}
