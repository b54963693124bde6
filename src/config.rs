use std::path::{Path, PathBuf};

use url::Url;

use crate::error::Error;

/// Project-level settings shared by every service client.
///
/// Required fields are constructor parameters; everything else has a
/// default and a `with_*` override.
///
/// ```rust,ignore
/// use ugs_client::ServicesConfig;
///
/// let config = ServicesConfig::new("my-project-id")
///     .with_environment("staging");
/// ```
#[derive(Debug, Clone)]
#[non_exhaustive]
pub struct ServicesConfig {
    pub(crate) project_id: String,
    pub(crate) environment: String,
    pub(crate) auth_url: Url,
    pub(crate) cloud_save_url: Url,
    pub(crate) economy_url: Url,
    pub(crate) social_url: Url,
    pub(crate) leaderboards_url: Url,
    pub(crate) ugc_url: Url,
    pub(crate) credentials_path: Option<PathBuf>,
}

impl ServicesConfig {
    /// Environment used when none is configured.
    pub const DEFAULT_ENVIRONMENT: &'static str = "production";

    /// Create a configuration for a project with default service endpoints.
    #[must_use]
    pub fn new(project_id: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            environment: Self::DEFAULT_ENVIRONMENT.into(),
            auth_url: default_url("https://player-auth.services.api.unity.com"),
            cloud_save_url: default_url("https://cloud-save.services.api.unity.com"),
            economy_url: default_url("https://economy.services.api.unity.com"),
            social_url: default_url("https://social.services.api.unity.com"),
            leaderboards_url: default_url("https://leaderboards.services.api.unity.com"),
            ugc_url: default_url("https://ugc.services.api.unity.com"),
            credentials_path: None,
        }
    }

    /// Create configuration from environment variables.
    ///
    /// # Required env vars
    /// - `UGS_PROJECT_ID`: UGS project ID
    ///
    /// # Optional env vars
    /// - `UGS_ENVIRONMENT`: environment name (default `production`)
    /// - `UGS_AUTH_URL`, `UGS_CLOUD_SAVE_URL`, `UGS_ECONOMY_URL`,
    ///   `UGS_SOCIAL_URL`, `UGS_LEADERBOARDS_URL`, `UGS_UGC_URL`: endpoint overrides
    /// - `UGS_CREDENTIALS_PATH`: credential cache file
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the project ID is missing or a URL is invalid.
    pub fn from_env() -> Result<Self, Error> {
        let project_id = std::env::var("UGS_PROJECT_ID")
            .map_err(|_| Error::Config("UGS_PROJECT_ID is required".into()))?;
        if project_id.trim().is_empty() {
            return Err(Error::Config("UGS_PROJECT_ID is empty".into()));
        }

        let mut config = Self::new(project_id);

        if let Ok(environment) = std::env::var("UGS_ENVIRONMENT") {
            config = config.with_environment(environment);
        }
        if let Some(url) = env_url("UGS_AUTH_URL")? {
            config = config.with_auth_url(url);
        }
        if let Some(url) = env_url("UGS_CLOUD_SAVE_URL")? {
            config = config.with_cloud_save_url(url);
        }
        if let Some(url) = env_url("UGS_ECONOMY_URL")? {
            config = config.with_economy_url(url);
        }
        if let Some(url) = env_url("UGS_SOCIAL_URL")? {
            config = config.with_social_url(url);
        }
        if let Some(url) = env_url("UGS_LEADERBOARDS_URL")? {
            config = config.with_leaderboards_url(url);
        }
        if let Some(url) = env_url("UGS_UGC_URL")? {
            config = config.with_ugc_url(url);
        }
        if let Ok(path) = std::env::var("UGS_CREDENTIALS_PATH") {
            config = config.with_credentials_path(path);
        }

        Ok(config)
    }

    #[must_use]
    pub fn with_environment(mut self, environment: impl Into<String>) -> Self {
        self.environment = environment.into();
        self
    }

    #[must_use]
    pub fn with_auth_url(mut self, url: Url) -> Self {
        self.auth_url = url;
        self
    }

    #[must_use]
    pub fn with_cloud_save_url(mut self, url: Url) -> Self {
        self.cloud_save_url = url;
        self
    }

    #[must_use]
    pub fn with_economy_url(mut self, url: Url) -> Self {
        self.economy_url = url;
        self
    }

    /// Override the social endpoint (friends, presence, player names).
    #[must_use]
    pub fn with_social_url(mut self, url: Url) -> Self {
        self.social_url = url;
        self
    }

    #[must_use]
    pub fn with_leaderboards_url(mut self, url: Url) -> Self {
        self.leaderboards_url = url;
        self
    }

    #[must_use]
    pub fn with_ugc_url(mut self, url: Url) -> Self {
        self.ugc_url = url;
        self
    }

    /// Store cached credentials at `path` instead of the platform data directory.
    #[must_use]
    pub fn with_credentials_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.credentials_path = Some(path.into());
        self
    }

    #[must_use]
    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    /// Environment name sent as the `UnityEnvironment` header.
    #[must_use]
    pub fn environment(&self) -> &str {
        &self.environment
    }

    #[must_use]
    pub fn auth_url(&self) -> &Url {
        &self.auth_url
    }

    #[must_use]
    pub fn cloud_save_url(&self) -> &Url {
        &self.cloud_save_url
    }

    #[must_use]
    pub fn economy_url(&self) -> &Url {
        &self.economy_url
    }

    #[must_use]
    pub fn social_url(&self) -> &Url {
        &self.social_url
    }

    #[must_use]
    pub fn leaderboards_url(&self) -> &Url {
        &self.leaderboards_url
    }

    #[must_use]
    pub fn ugc_url(&self) -> &Url {
        &self.ugc_url
    }

    /// Explicitly configured credential cache path, if any.
    #[must_use]
    pub fn credentials_path(&self) -> Option<&Path> {
        self.credentials_path.as_deref()
    }

    /// Credential cache path, falling back to `<data dir>/ugs-client/credentials.json`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if no path is configured and the platform
    /// has no local data directory.
    pub fn resolve_credentials_path(&self) -> Result<PathBuf, Error> {
        if let Some(path) = &self.credentials_path {
            return Ok(path.clone());
        }
        dirs::data_local_dir()
            .map(|dir| dir.join("ugs-client").join("credentials.json"))
            .ok_or_else(|| {
                Error::Config("no local data directory; set UGS_CREDENTIALS_PATH".into())
            })
    }
}

fn default_url(url: &'static str) -> Url {
    url.parse().expect("valid default URL")
}

fn env_url(var: &str) -> Result<Option<Url>, Error> {
    match std::env::var(var) {
        Ok(s) => s
            .parse()
            .map(Some)
            .map_err(|e| Error::Config(format!("{var}: {e}"))),
        Err(_) => Ok(None),
    }
}
