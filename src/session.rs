use serde::{Deserialize, Serialize};

use crate::types::PlayerId;

/// Tokens of the current (or cached) sign-in.
///
/// Owned and mutated only by
/// [`AuthenticationService`](crate::auth::AuthenticationService).
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[non_exhaustive]
pub struct Session {
    /// Short-lived identity token, sent as the bearer token.
    pub id_token: Option<String>,
    /// Long-lived token used to sign the same player back in.
    pub session_token: Option<String>,
    pub user_id: Option<PlayerId>,
    /// Identity token lifetime in seconds.
    pub expires_in: Option<u64>,
}

impl Session {
    #[must_use]
    pub fn new(id_token: impl Into<String>, session_token: impl Into<String>) -> Self {
        Self {
            id_token: Some(id_token.into()),
            session_token: Some(session_token.into()),
            user_id: None,
            expires_in: None,
        }
    }

    #[must_use]
    pub fn with_user_id(mut self, user_id: PlayerId) -> Self {
        self.user_id = Some(user_id);
        self
    }

    #[must_use]
    pub fn with_expires_in(mut self, seconds: u64) -> Self {
        self.expires_in = Some(seconds);
        self
    }

    /// True when neither token is present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.id_token.is_none() && self.session_token.is_none()
    }
}

// Tokens are credentials; keep them out of logs.
impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("id_token", &self.id_token.as_ref().map(|_| "<redacted>"))
            .field("session_token", &self.session_token.as_ref().map(|_| "<redacted>"))
            .field("user_id", &self.user_id)
            .field("expires_in", &self.expires_in)
            .finish()
    }
}
