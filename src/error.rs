use thiserror::Error;

/// Error type for all client operations.
///
/// Only connection-level and refresh-protocol failures surface here. HTTP
/// error statuses other than 401 are not errors: they come back to the caller
/// as ordinary responses. A 401 that survives one refresh-and-retry cycle is
/// also returned as a plain response, since at that point it is a genuine
/// permission failure rather than an expired token.
#[derive(Error, Debug)]
pub enum ClientError {
    /// A 401 was received but no refresh token is stored, so there is
    /// nothing to exchange. The session is terminated before this is
    /// returned.
    #[error("authorization failed and no refresh token is available")]
    NoRefreshToken,

    /// The refresh exchange itself failed: the auth server rejected it,
    /// returned an incomplete token pair, or the exchange timed out. The
    /// session is terminated before this is returned.
    #[error("token refresh failed: {reason}")]
    RefreshFailed { reason: String },

    /// Network-level failure from the underlying transport. Never triggers
    /// the refresh protocol.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The request could not be constructed (bad URL or header material).
    #[error("invalid request: {reason}")]
    InvalidRequest { reason: String },

    /// The response body could not be decoded into the expected shape.
    #[error("failed to decode response body: {0}")]
    Decode(#[from] serde_json::Error),
}

impl ClientError {
    /// Create a refresh failure with the given reason.
    pub fn refresh_failed(reason: impl Into<String>) -> Self {
        Self::RefreshFailed {
            reason: reason.into(),
        }
    }

    /// Create an invalid-request error with the given reason.
    pub fn invalid_request(reason: impl Into<String>) -> Self {
        Self::InvalidRequest {
            reason: reason.into(),
        }
    }

    /// Whether this error means the session was ended by the client
    /// (missing refresh token or failed refresh exchange).
    pub fn is_session_ended(&self) -> bool {
        matches!(self, Self::NoRefreshToken | Self::RefreshFailed { .. })
    }
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, ClientError>;
