#[derive(Debug, thiserror::Error)]
pub enum GelatoError {
    /// The request never produced an HTTP response
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    /// The relay network answered with a non-success status
    #[error("Relay API returned {status}: {body}")]
    Api { status: u16, body: String },
    /// Every attempt failed with a transient error
    #[error("Gave up on `{op}` after {attempts} attempts: {last}")]
    MaxRetries {
        op: &'static str,
        attempts: u32,
        last: Box<GelatoError>,
    },
    /// The reply body was not what we expected
    #[error("Could not decode relay API reply: {0}")]
    Decode(#[from] serde_json::Error),
    /// The reply parsed but a field held garbage
    #[error("Unexpected relay API reply: {0}")]
    InvalidReply(String),
    #[error("Invalid relay API url: {0}")]
    Url(#[from] url::ParseError),
}

impl GelatoError {
    /// Whether the same request may succeed if sent again: connection
    /// failures, timeouts, rate limiting and 5xx replies.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Http(e) => e.is_connect() || e.is_timeout() || e.is_request(),
            Self::Api { status, .. } => *status >= 500 || *status == 429,
            Self::MaxRetries { .. } | Self::Decode(_) | Self::InvalidReply(_) | Self::Url(_) => {
                false
            }
        }
    }
}
