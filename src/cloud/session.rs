//! Authorized session capability.

use std::fmt;

use chrono::{DateTime, Duration, Utc};

/// Proof that the user authorized access to their cloud storage.
///
/// Callers pass it around without looking inside; only uploaders read the
/// bearer token.
#[derive(Clone)]
pub struct AuthorizedSession {
    access_token: String,
    expires_at: Option<DateTime<Utc>>,
}

impl AuthorizedSession {
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            expires_at: None,
        }
    }

    /// Session that stops being usable `expires_in` seconds from now.
    pub fn expiring_in(access_token: impl Into<String>, expires_in: u64) -> Self {
        let seconds = expires_in.min(u64::from(u32::MAX)) as i64;
        Self {
            access_token: access_token.into(),
            expires_at: Utc::now().checked_add_signed(Duration::seconds(seconds)),
        }
    }

    pub fn is_expired(&self) -> bool {
        self.expires_at.is_some_and(|at| at <= Utc::now())
    }

    pub(crate) fn bearer_token(&self) -> &str {
        &self.access_token
    }
}

impl fmt::Debug for AuthorizedSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthorizedSession")
            .field("access_token", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}
