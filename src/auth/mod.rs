//! Player authentication and the cached session.
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use ugs_client::{AuthenticationService, ReqwestTransport, ServicesConfig, TokenCache};
//!
//! let config = ServicesConfig::new("my-project-id");
//! let cache = TokenCache::from_config(&config)?;
//! let mut auth = AuthenticationService::new(config, Arc::new(ReqwestTransport::new()), cache);
//!
//! // Reuses the cached session token when there is one.
//! auth.sign_in_anonymously().await?;
//! println!("signed in as {}", auth.player_id().unwrap());
//! ```

mod models;

use std::sync::Arc;

use reqwest::Method;
use tokio::sync::broadcast;

use crate::cache::{TokenCache, TokenField};
use crate::claims::{Claims, decode_claims};
use crate::config::ServicesConfig;
use crate::error::{Error, ServiceKind};
use crate::services::PlayerCredentials;
use crate::session::Session;
use crate::transport::{ReqwestTransport, RestClient, Transport};
use crate::types::{PlayerId, Profile};

pub use models::{AuthEvent, ExternalIdentity, IdProvider, PlayerName, User};
use models::{
    ExternalTokenRequest, PlayerNameRequest, SessionTokenRequest, SignInResponse,
    UpdatePasswordRequest, UsernamePasswordRequest,
};

const EVENT_CAPACITY: usize = 64;

/// Signs players in and owns the resulting [`Session`].
///
/// Every flow takes `&mut self`, so two sign-ins on one service can never
/// interleave.
pub struct AuthenticationService<T = ReqwestTransport> {
    config: ServicesConfig,
    transport: Arc<T>,
    cache: TokenCache,
    profile: Profile,
    session: Session,
    claims: Option<Claims>,
    user: Option<User>,
    signed_in: bool,
    events: broadcast::Sender<AuthEvent>,
}

impl<T> std::fmt::Debug for AuthenticationService<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthenticationService")
            .field("profile", &self.profile)
            .field("session", &self.session)
            .field("signed_in", &self.signed_in)
            .finish_non_exhaustive()
    }
}

impl<T: Transport> AuthenticationService<T> {
    /// Create the service and restore the last-used profile and its cached session.
    #[must_use]
    pub fn new(config: ServicesConfig, transport: Arc<T>, cache: TokenCache) -> Self {
        let profile = cache.last_profile().unwrap_or_default();
        let session = cache.load(&profile).into_session();
        tracing::debug!(
            profile = %profile,
            has_session_token = session.session_token.is_some(),
            "Authentication initialized"
        );
        let (events, _) = broadcast::channel(EVENT_CAPACITY);

        Self {
            config,
            transport,
            cache,
            profile,
            session,
            claims: None,
            user: None,
            signed_in: false,
            events,
        }
    }

    /// Receive [`AuthEvent`]s in the order they are published.
    ///
    /// Each receiver buffers up to 64 events. A receiver that falls further
    /// behind gets `RecvError::Lagged` and the oldest events are dropped for it.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
        self.events.subscribe()
    }

    /// Sign in anonymously.
    ///
    /// When a session token is cached for the active profile, that player is
    /// signed back in first; only if that attempt fails is a new anonymous
    /// player created.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Service`] if the anonymous sign-in is rejected, or
    /// [`Error::Http`] on network failure.
    pub async fn sign_in_anonymously(&mut self) -> Result<(), Error> {
        if self.session.session_token.is_some() {
            match self.sign_in_with_session_token().await {
                Ok(()) => return Ok(()),
                Err(e) => {
                    tracing::warn!(error = %e, "Session token sign-in failed; signing in anonymously");
                }
            }
        }

        let rest = self.rest()?;
        let url = rest.url(&["v1", "authentication", "anonymous"], &[])?;
        let response: SignInResponse = rest
            .send_json(Method::POST, url, &serde_json::json!({}), "anonymous sign-in")
            .await?;
        self.complete_sign_in(response, "anonymous");
        Ok(())
    }

    /// Sign the cached player back in with the stored session token.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidOperation`] when no session token is cached,
    /// [`Error::Service`] if the token is rejected.
    pub async fn sign_in_with_session_token(&mut self) -> Result<(), Error> {
        let session_token = self.session.session_token.clone().ok_or_else(|| {
            Error::InvalidOperation(format!("no session token cached for profile '{}'", self.profile))
        })?;

        let rest = self.rest()?;
        let url = rest.url(&["v1", "authentication", "session-token"], &[])?;
        let response: SignInResponse = rest
            .send_json(
                Method::POST,
                url,
                &SessionTokenRequest {
                    session_token: &session_token,
                },
                "session token sign-in",
            )
            .await?;
        self.complete_sign_in(response, "session token");
        Ok(())
    }

    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] for an empty username or password,
    /// [`Error::Service`] if the credentials are rejected.
    pub async fn sign_in_with_username_password(
        &mut self,
        username: &str,
        password: &str,
    ) -> Result<(), Error> {
        self.username_password("sign-in", username, password, "username sign-in")
            .await
    }

    /// Create a username/password account and sign it in.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] for an empty username or password,
    /// [`Error::Service`] if the account cannot be created.
    pub async fn sign_up_with_username_password(
        &mut self,
        username: &str,
        password: &str,
    ) -> Result<(), Error> {
        self.username_password("sign-up", username, password, "username sign-up")
            .await
    }

    /// Sign in with a token issued by an external identity provider.
    ///
    /// With `sign_in_only`, no account is created for an unknown identity.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] for an empty token,
    /// [`Error::Service`] if the provider token is rejected.
    pub async fn sign_in_with_external_token(
        &mut self,
        provider: &IdProvider,
        token: &str,
        sign_in_only: bool,
    ) -> Result<(), Error> {
        if token.is_empty() {
            return Err(Error::InvalidArgument("external token is empty".into()));
        }

        let rest = self.rest()?;
        let url = rest.url(
            &["v1", "authentication", "external-token", provider.as_str()],
            &[],
        )?;
        let response: SignInResponse = rest
            .send_json(
                Method::POST,
                url,
                &ExternalTokenRequest {
                    token,
                    sign_in_only,
                },
                "external token sign-in",
            )
            .await?;
        self.complete_sign_in(response, "external token");
        Ok(())
    }

    /// Change the password of the signed-in username/password account.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidOperation`] when signed out,
    /// [`Error::InvalidArgument`] for an empty password,
    /// [`Error::Service`] if the current password is wrong.
    pub async fn update_password(
        &mut self,
        current_password: &str,
        new_password: &str,
    ) -> Result<(), Error> {
        if current_password.is_empty() || new_password.is_empty() {
            return Err(Error::InvalidArgument("password is empty".into()));
        }

        let rest = self.authorized_rest()?;
        let url = rest.url(
            &["v1", "authentication", "usernamepassword", "update-password"],
            &[],
        )?;
        let response: SignInResponse = rest
            .send_json(
                Method::POST,
                url,
                &UpdatePasswordRequest {
                    password: current_password,
                    new_password,
                },
                "update password",
            )
            .await?;
        self.complete_sign_in(response, "password update");
        Ok(())
    }

    /// Fetch the signed-in player's account.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidOperation`] when signed out,
    /// [`Error::Service`] if the request is rejected.
    pub async fn player_info(&mut self) -> Result<&User, Error> {
        let rest = self.authorized_rest()?;
        let url = rest.url(&["v1", "users", self.require_player_id()?.as_str()], &[])?;
        let user: User = rest.get(url, "get player info").await?;
        Ok(self.user.insert(user))
    }

    /// Permanently delete the signed-in player, then sign out and clear credentials.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidOperation`] when signed out,
    /// [`Error::Service`] if the deletion is rejected.
    pub async fn delete_account(&mut self) -> Result<(), Error> {
        let rest = self.authorized_rest()?;
        let url = rest.url(&["v1", "users", self.require_player_id()?.as_str()], &[])?;
        rest.execute(Method::DELETE, url, None, "delete account")
            .await?;
        tracing::info!("Player account deleted");

        // The account is gone; a stale cache entry only fails the next
        // session-token sign-in.
        if let Err(e) = self.sign_out(true) {
            tracing::error!(error = %e, "Failed to clear cached credentials after account deletion");
        }
        Ok(())
    }

    /// # Errors
    ///
    /// Returns [`Error::InvalidOperation`] when signed out,
    /// [`Error::Service`] if the request is rejected.
    pub async fn player_name(&self) -> Result<PlayerName, Error> {
        let rest = self.names_rest()?;
        let url = rest.url(&["names", self.require_player_id()?.as_str()], &[])?;
        rest.get(url, "get player name").await
    }

    /// Set the signed-in player's display name. Returns the name as stored,
    /// which may carry a service-assigned suffix.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidOperation`] when signed out,
    /// [`Error::InvalidArgument`] for an empty name,
    /// [`Error::Service`] if the name is rejected.
    pub async fn update_player_name(&self, name: &str) -> Result<PlayerName, Error> {
        if name.trim().is_empty() {
            return Err(Error::InvalidArgument("player name is empty".into()));
        }
        let rest = self.names_rest()?;
        let url = rest.url(&["names", self.require_player_id()?.as_str()], &[])?;
        rest.send_json(Method::PUT, url, &PlayerNameRequest { name }, "update player name")
            .await
    }

    /// Sign out. The cached identity token is always removed; the session
    /// token is removed too when `clear_credentials` is set, so the next
    /// anonymous sign-in creates a new player.
    ///
    /// The in-memory session is reset and [`AuthEvent::SignedOut`] published
    /// even when the cache write fails.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Cache`] if the credential cache cannot be written.
    pub fn sign_out(&mut self, clear_credentials: bool) -> Result<(), Error> {
        self.signed_in = false;
        self.session.id_token = None;
        self.session.user_id = None;
        self.session.expires_in = None;
        if clear_credentials {
            self.session.session_token = None;
        }
        self.claims = None;
        self.user = None;

        let cleared = self.cache.clear(TokenField::IdToken, &self.profile).and_then(|()| {
            if clear_credentials {
                self.cache.clear(TokenField::SessionToken, &self.profile)
            } else {
                Ok(())
            }
        });

        tracing::info!(profile = %self.profile, clear_credentials, "Signed out");
        self.publish(AuthEvent::SignedOut);
        cleared
    }

    /// Make `profile` the active cache partition and load its cached session.
    ///
    /// Nothing is copied between profiles.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidOperation`] while signed in,
    /// [`Error::Cache`] if the profile choice cannot be recorded.
    pub fn switch_profile(&mut self, profile: Profile) -> Result<(), Error> {
        if self.signed_in {
            return Err(Error::InvalidOperation(
                "sign out before switching profile".into(),
            ));
        }

        self.cache.set_last_profile(&profile)?;
        self.session = self.cache.load(&profile).into_session();
        self.claims = None;
        self.user = None;
        self.profile = profile;

        tracing::info!(profile = %self.profile, "Switched profile");
        self.publish(AuthEvent::ProfileSwitched {
            profile: self.profile.clone(),
        });
        Ok(())
    }

    /// Snapshot of the identity used to construct the player services.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidOperation`] when signed out.
    pub fn player_credentials(&self) -> Result<PlayerCredentials, Error> {
        let access_token = self.require_access_token()?;
        Ok(PlayerCredentials {
            player_id: self.require_player_id()?.clone(),
            access_token: access_token.to_owned(),
            environment_id: self
                .claims
                .as_ref()
                .and_then(Claims::environment_id)
                .map(str::to_owned),
        })
    }

    #[must_use]
    pub fn is_signed_in(&self) -> bool {
        self.signed_in
    }

    /// Whether a session token is cached for the active profile.
    #[must_use]
    pub fn session_token_exists(&self) -> bool {
        self.session.session_token.is_some()
    }

    #[must_use]
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Claims of the current identity token; `None` until signed in.
    #[must_use]
    pub fn claims(&self) -> Option<&Claims> {
        self.claims.as_ref()
    }

    #[must_use]
    pub fn player_id(&self) -> Option<&PlayerId> {
        self.session.user_id.as_ref().filter(|_| self.signed_in)
    }

    /// Current identity token, usable as a bearer token.
    #[must_use]
    pub fn access_token(&self) -> Option<&str> {
        self.session
            .id_token
            .as_deref()
            .filter(|_| self.signed_in)
    }

    /// Player account returned by the last sign-in or [`player_info`](Self::player_info).
    #[must_use]
    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    #[must_use]
    pub fn profile(&self) -> &Profile {
        &self.profile
    }

    #[must_use]
    pub fn config(&self) -> &ServicesConfig {
        &self.config
    }

    #[must_use]
    pub fn transport(&self) -> &Arc<T> {
        &self.transport
    }

    async fn username_password(
        &mut self,
        action: &'static str,
        username: &str,
        password: &str,
        operation: &'static str,
    ) -> Result<(), Error> {
        if username.trim().is_empty() {
            return Err(Error::InvalidArgument("username is empty".into()));
        }
        if password.is_empty() {
            return Err(Error::InvalidArgument("password is empty".into()));
        }

        let rest = self.rest()?;
        let url = rest.url(&["v1", "authentication", "usernamepassword", action], &[])?;
        let response: SignInResponse = rest
            .send_json(
                Method::POST,
                url,
                &UsernamePasswordRequest { username, password },
                operation,
            )
            .await?;
        self.complete_sign_in(response, "username/password");
        Ok(())
    }

    /// Installs a fresh session: memory first, then the cache, then subscribers.
    fn complete_sign_in(&mut self, response: SignInResponse, method: &'static str) {
        let claims = match decode_claims(&response.id_token) {
            Ok(Some(claims)) => Some(claims),
            Ok(None) => {
                tracing::warn!("Identity token is not a three-part token; claims unavailable");
                None
            }
            Err(e) => {
                tracing::warn!(error = %e, "Identity token claims could not be decoded");
                None
            }
        };

        let mut session = Session::new(response.id_token, response.session_token)
            .with_user_id(response.user_id.clone());
        session.expires_in = response.expires_in;

        self.session = session;
        self.claims = claims;
        if response.user.is_some() {
            self.user = response.user;
        }
        self.signed_in = true;

        // The player is signed in either way; a stale cache only costs a
        // fresh anonymous player next launch.
        if let Err(e) = self.cache.save(&self.session, &self.profile) {
            tracing::error!(error = %e, "Failed to persist session");
        }

        tracing::info!(player_id = %response.user_id, method, profile = %self.profile, "Signed in");
        self.publish(AuthEvent::SignedIn {
            player_id: response.user_id,
        });
    }

    fn publish(&self, event: AuthEvent) {
        // Err only means nobody is subscribed.
        if self.events.send(event).is_err() {
            tracing::trace!("No authentication event subscribers");
        }
    }

    fn rest(&self) -> Result<RestClient<T>, Error> {
        RestClient::new(
            ServiceKind::Authentication,
            self.transport.clone(),
            &self.config,
            self.config.auth_url(),
            &[],
        )
    }

    fn authorized_rest(&self) -> Result<RestClient<T>, Error> {
        let token = self.require_access_token()?;
        Ok(self.rest()?.with_bearer(token))
    }

    fn names_rest(&self) -> Result<RestClient<T>, Error> {
        let token = self.require_access_token()?;
        Ok(RestClient::new(
            ServiceKind::PlayerNames,
            self.transport.clone(),
            &self.config,
            self.config.social_url(),
            &["v1"],
        )?
        .with_bearer(token))
    }

    fn require_access_token(&self) -> Result<&str, Error> {
        self.access_token()
            .ok_or_else(|| Error::InvalidOperation("player is not signed in".into()))
    }

    fn require_player_id(&self) -> Result<&PlayerId, Error> {
        self.player_id()
            .ok_or_else(|| Error::InvalidOperation("player is not signed in".into()))
    }
}
