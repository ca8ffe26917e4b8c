use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The session token pair issued by the auth server.
///
/// Both values are opaque bearer strings. At most one pair is "current" at
/// any time; the access token may expire independently of the refresh token.
/// The backend rotates both tokens on every refresh, so a refresh response
/// missing either value is treated as a failure rather than a partial
/// success.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionTokens {
    /// Short-lived bearer credential attached to each authenticated request
    pub access_token: String,

    /// Longer-lived credential exchanged for a new pair when the access
    /// token expires
    pub refresh_token: String,

    /// When this pair was issued or last rotated
    #[serde(default = "Utc::now")]
    pub issued_at: DateTime<Utc>,
}

impl SessionTokens {
    /// Create a new token pair, stamped with the current time.
    pub fn new(access_token: impl Into<String>, refresh_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token: refresh_token.into(),
            issued_at: Utc::now(),
        }
    }

    /// Whether both tokens are present and non-empty.
    pub fn is_complete(&self) -> bool {
        !self.access_token.is_empty() && !self.refresh_token.is_empty()
    }
}

/// Keys under which the session tokens are stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKey {
    AccessToken,
    RefreshToken,
}

impl TokenKey {
    /// The storage key string for this token.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AccessToken => "access_token",
            Self::RefreshToken => "refresh_token",
        }
    }
}
