use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::types::PlayerId;

/// Body returned by every sign-in and sign-up endpoint.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SignInResponse {
    pub(crate) user_id: PlayerId,
    pub(crate) id_token: String,
    pub(crate) session_token: String,
    #[serde(default)]
    pub(crate) expires_in: Option<u64>,
    #[serde(default)]
    pub(crate) user: Option<User>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SessionTokenRequest<'a> {
    pub(crate) session_token: &'a str,
}

#[derive(Debug, Serialize)]
pub(crate) struct UsernamePasswordRequest<'a> {
    pub(crate) username: &'a str,
    pub(crate) password: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct UpdatePasswordRequest<'a> {
    pub(crate) password: &'a str,
    pub(crate) new_password: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ExternalTokenRequest<'a> {
    pub(crate) token: &'a str,
    pub(crate) sign_in_only: bool,
}

#[derive(Debug, Serialize)]
pub(crate) struct PlayerNameRequest<'a> {
    pub(crate) name: &'a str,
}

/// Player account as known to the authentication service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[non_exhaustive]
pub struct User {
    pub id: PlayerId,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub disabled: bool,
    #[serde(default)]
    pub external_ids: Vec<ExternalIdentity>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub created_at: Option<OffsetDateTime>,
}

/// Identity provider account linked to a player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[non_exhaustive]
pub struct ExternalIdentity {
    pub provider_id: String,
    pub external_id: String,
}

/// Player name from the social service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[non_exhaustive]
pub struct PlayerName {
    pub id: PlayerId,
    pub name: String,
}

/// External identity provider accepted by the external-token sign-in.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum IdProvider {
    Apple,
    AppleGameCenter,
    Facebook,
    Google,
    GooglePlayGames,
    Oculus,
    Steam,
    Unity,
    /// OpenID Connect provider configured for the project (`oidc-<name>`).
    OpenIdConnect(String),
}

impl IdProvider {
    /// Path segment identifying the provider.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Apple => "apple.com",
            Self::AppleGameCenter => "apple-game-center",
            Self::Facebook => "facebook.com",
            Self::Google => "google.com",
            Self::GooglePlayGames => "google-play-games",
            Self::Oculus => "oculus",
            Self::Steam => "steam",
            Self::Unity => "unity",
            Self::OpenIdConnect(name) => name,
        }
    }
}

impl std::fmt::Display for IdProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Notifications published by [`AuthenticationService`](super::AuthenticationService).
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum AuthEvent {
    SignedIn { player_id: PlayerId },
    SignedOut,
    ProfileSwitched { profile: crate::types::Profile },
}
