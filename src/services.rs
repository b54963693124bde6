//! Construction of the player-scoped services after sign-in.
//!
//! Each service captures one [`PlayerCredentials`] snapshot when it is
//! built and never sees later token changes. After a new sign-in (see
//! [`AuthenticationService::subscribe`]) rebuild them with
//! [`PlayerServices::connect`].

use std::marker::PhantomData;
use std::sync::Arc;

use crate::auth::AuthenticationService;
use crate::config::ServicesConfig;
use crate::error::Error;
use crate::transport::{ReqwestTransport, Transport};
use crate::types::PlayerId;

#[cfg(feature = "cloud-save")]
use crate::cloud_save::CloudSave;
#[cfg(feature = "economy")]
use crate::economy::Economy;
#[cfg(feature = "friends")]
use crate::friends::Friends;
#[cfg(feature = "leaderboards")]
use crate::leaderboards::Leaderboards;
#[cfg(feature = "ugc")]
use crate::ugc::Ugc;

/// Identity handed to the player services at construction.
#[derive(Clone, PartialEq, Eq)]
pub struct PlayerCredentials {
    pub player_id: PlayerId,
    pub access_token: String,
    /// Environment ID from the identity token, needed by UGC.
    pub environment_id: Option<String>,
}

impl std::fmt::Debug for PlayerCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlayerCredentials")
            .field("player_id", &self.player_id)
            .field("access_token", &"<redacted>")
            .field("environment_id", &self.environment_id)
            .finish()
    }
}

/// Every enabled player service, built from one credentials snapshot.
#[derive(Debug)]
#[non_exhaustive]
pub struct PlayerServices<T = ReqwestTransport> {
    #[cfg(feature = "cloud-save")]
    pub cloud_save: CloudSave<T>,
    #[cfg(feature = "economy")]
    pub economy: Economy<T>,
    #[cfg(feature = "friends")]
    pub friends: Friends<T>,
    #[cfg(feature = "leaderboards")]
    pub leaderboards: Leaderboards<T>,
    /// `None` when the identity token carries no environment ID.
    #[cfg(feature = "ugc")]
    pub ugc: Option<Ugc<T>>,
    transport: PhantomData<T>,
}

impl<T: Transport> PlayerServices<T> {
    /// Build the services for the player signed in on `auth`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidOperation`] when `auth` is signed out.
    pub fn connect(auth: &AuthenticationService<T>) -> Result<Self, Error> {
        let credentials = auth.player_credentials()?;
        Self::from_credentials(auth.config(), auth.transport(), &credentials)
    }

    /// Build the services in a fixed order: Cloud Save, Economy, Friends,
    /// Leaderboards, UGC.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if a configured base URL cannot carry a path.
    pub fn from_credentials(
        config: &ServicesConfig,
        transport: &Arc<T>,
        credentials: &PlayerCredentials,
    ) -> Result<Self, Error> {
        #[cfg(not(any(
            feature = "cloud-save",
            feature = "economy",
            feature = "friends",
            feature = "leaderboards",
            feature = "ugc"
        )))]
        let _ = (config, transport);

        let services = Self {
            #[cfg(feature = "cloud-save")]
            cloud_save: CloudSave::new(config, transport.clone(), credentials)?,
            #[cfg(feature = "economy")]
            economy: Economy::new(config, transport.clone(), credentials)?,
            #[cfg(feature = "friends")]
            friends: Friends::new(config, transport.clone(), credentials)?,
            #[cfg(feature = "leaderboards")]
            leaderboards: Leaderboards::new(config, transport.clone(), credentials)?,
            #[cfg(feature = "ugc")]
            ugc: match credentials.environment_id {
                Some(_) => Some(Ugc::new(config, transport.clone(), credentials)?),
                None => {
                    tracing::warn!("Identity token has no environment ID; UGC unavailable");
                    None
                }
            },
            transport: PhantomData,
        };
        tracing::debug!(player_id = %credentials.player_id, "Player services connected");
        Ok(services)
    }
}
