//! Bearer credentials for the task source.

use std::fmt;

use chrono::{DateTime, Duration, Utc};

/// Safety margin subtracted from an expiry hint so a credential is renewed
/// before the remote starts rejecting it.
const EXPIRY_MARGIN_SECS: i64 = 60;

/// An access token for the task source, optionally paired with the refresh
/// token that can replace it.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    /// Bearer token sent with source requests.
    pub access_token: String,
    /// Opaque refresh token; `None` when the host cannot renew the credential.
    pub refresh_token: Option<String>,
    /// When the access token stops being accepted, if known.
    pub expires_at: Option<DateTime<Utc>>,
}

impl Credential {
    /// Creates a credential without refresh token or expiry hint.
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token: None,
            expires_at: None,
        }
    }

    /// Builder: attach a refresh token.
    pub fn with_refresh_token(mut self, refresh_token: impl Into<String>) -> Self {
        self.refresh_token = Some(refresh_token.into());
        self
    }

    /// Builder: set the expiry from a token endpoint's `expires_in`.
    pub fn expiring_in(mut self, expires_in_secs: i64) -> Self {
        self.expires_at =
            Some(Utc::now() + Duration::seconds(expires_in_secs) - Duration::seconds(EXPIRY_MARGIN_SECS));
        self
    }

    /// Builder: set an absolute expiry.
    pub fn with_expires_at(mut self, expires_at: DateTime<Utc>) -> Self {
        self.expires_at = Some(expires_at);
        self
    }

    /// Returns true if the expiry hint has passed. Credentials without a
    /// hint are assumed valid until the source rejects them.
    pub fn is_expired(&self) -> bool {
        self.expires_at.is_some_and(|expires_at| Utc::now() >= expires_at)
    }

    /// Returns true if the credential can be renewed.
    pub fn can_refresh(&self) -> bool {
        self.refresh_token.as_deref().is_some_and(|token| !token.is_empty())
    }
}

// Tokens stay out of logs.
impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("access_token", &"<redacted>")
            .field("refresh_token", &self.refresh_token.as_ref().map(|_| "<redacted>"))
            .field("expires_at", &self.expires_at)
            .finish()
    }
}
