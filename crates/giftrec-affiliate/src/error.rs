use thiserror::Error;

/// Errors returned by the affiliate gateway client.
#[derive(Debug, Error)]
pub enum AffiliateError {
    /// One or more upstream credentials are not configured. Raised before
    /// any network call is made.
    #[error("upstream is not configured: {0}")]
    Configuration(String),

    /// The gateway answered with a non-2xx HTTP status.
    #[error("upstream HTTP {status}: {body}")]
    Transport { status: u16, body: String },

    /// The gateway answered 2xx but the body carried an `error_response`
    /// envelope.
    #[error("upstream error: {0}")]
    Upstream(String),

    /// Network, TLS or timeout failure from the underlying HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The response body was not valid JSON.
    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },
}

impl AffiliateError {
    /// `true` for the one error kind every subsequent call would repeat.
    #[must_use]
    pub fn is_configuration(&self) -> bool {
        matches!(self, AffiliateError::Configuration(_))
    }
}
