//! Local credential cache, partitioned by [`Profile`].
//!
//! The cache is a single JSON document:
//!
//! ```json
//! {
//!   "General": { "LastProfile": "default" },
//!   "profiles": {
//!     "default": { "idToken": "…", "sessionToken": "…" }
//!   }
//! }
//! ```
//!
//! Reads and writes replace the whole document. There is no file locking.

use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use serde::{Deserialize, Serialize};

use crate::config::ServicesConfig;
use crate::error::Error;
use crate::session::Session;
use crate::types::Profile;

/// Backing store for the cache document.
pub trait CacheStorage: Send + Sync {
    /// Returns `None` when nothing has been written yet.
    fn read(&self) -> io::Result<Option<String>>;

    fn write(&self, contents: &str) -> io::Result<()>;
}

/// Cache document stored in a file.
#[derive(Debug, Clone)]
pub struct FileStorage {
    path: PathBuf,
}

impl FileStorage {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CacheStorage for FileStorage {
    fn read(&self) -> io::Result<Option<String>> {
        match std::fs::read_to_string(&self.path) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn write(&self, contents: &str) -> io::Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, contents)
    }
}

/// Cache document held in memory; nothing survives the process.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    contents: Mutex<Option<String>>,
}

impl MemoryStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an existing document.
    #[must_use]
    pub fn with_contents(contents: impl Into<String>) -> Self {
        Self {
            contents: Mutex::new(Some(contents.into())),
        }
    }

    /// Current raw document.
    #[must_use]
    pub fn contents(&self) -> Option<String> {
        self.contents
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl CacheStorage for MemoryStorage {
    fn read(&self) -> io::Result<Option<String>> {
        Ok(self.contents())
    }

    fn write(&self, contents: &str) -> io::Result<()> {
        *self.contents.lock().unwrap_or_else(PoisonError::into_inner) = Some(contents.to_owned());
        Ok(())
    }
}

/// One token field of a profile partition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenField {
    IdToken,
    SessionToken,
}

/// Result of reading a profile partition.
#[derive(Debug)]
pub enum CacheLookup {
    Found(Session),
    /// Never saved, or every field has been cleared.
    Empty,
    /// The document exists but could not be read or parsed.
    Unreadable(Error),
}

impl CacheLookup {
    /// The cached session, with `Empty` and `Unreadable` both treated as no session.
    #[must_use]
    pub fn into_session(self) -> Session {
        match self {
            Self::Found(session) => session,
            Self::Empty => Session::default(),
            Self::Unreadable(e) => {
                tracing::warn!(error = %e, "Credential cache unreadable; starting without a cached session");
                Session::default()
            }
        }
    }

    #[must_use]
    pub fn is_found(&self) -> bool {
        matches!(self, Self::Found(_))
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct CacheDocument {
    #[serde(rename = "General", default)]
    general: GeneralSection,
    #[serde(default)]
    profiles: BTreeMap<String, ProfileSection>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct GeneralSection {
    #[serde(rename = "LastProfile", default, skip_serializing_if = "Option::is_none")]
    last_profile: Option<String>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProfileSection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    id_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    session_token: Option<String>,
}

/// Persists the identity and session tokens of each profile.
pub struct TokenCache {
    storage: Box<dyn CacheStorage>,
}

impl std::fmt::Debug for TokenCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenCache").finish_non_exhaustive()
    }
}

impl TokenCache {
    #[must_use]
    pub fn new(storage: impl CacheStorage + 'static) -> Self {
        Self {
            storage: Box::new(storage),
        }
    }

    /// File-backed cache at the configured (or platform default) path.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if no cache path can be determined.
    pub fn from_config(config: &ServicesConfig) -> Result<Self, Error> {
        Ok(Self::new(FileStorage::new(config.resolve_credentials_path()?)))
    }

    #[must_use]
    pub fn in_memory() -> Self {
        Self::new(MemoryStorage::new())
    }

    /// Reads the partition of `profile`.
    pub fn load(&self, profile: &Profile) -> CacheLookup {
        let document = match self.read_document() {
            Ok(Some(document)) => document,
            Ok(None) => return CacheLookup::Empty,
            Err(e) => return CacheLookup::Unreadable(e),
        };

        match document.profiles.get(profile.as_str()) {
            Some(section) if section.id_token.is_some() || section.session_token.is_some() => {
                CacheLookup::Found(Session {
                    id_token: section.id_token.clone(),
                    session_token: section.session_token.clone(),
                    user_id: None,
                    expires_in: None,
                })
            }
            _ => CacheLookup::Empty,
        }
    }

    /// Overwrites both token fields of `profile` with those of `session`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Cache`] if the document cannot be written.
    pub fn save(&self, session: &Session, profile: &Profile) -> Result<(), Error> {
        self.update(|document| {
            let section = document.profiles.entry(profile.to_string()).or_default();
            section.id_token.clone_from(&session.id_token);
            section.session_token.clone_from(&session.session_token);
        })
    }

    /// Removes one token field from `profile`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Cache`] if the document cannot be written.
    pub fn clear(&self, field: TokenField, profile: &Profile) -> Result<(), Error> {
        self.update(|document| {
            if let Some(section) = document.profiles.get_mut(profile.as_str()) {
                match field {
                    TokenField::IdToken => section.id_token = None,
                    TokenField::SessionToken => section.session_token = None,
                }
                if section.id_token.is_none() && section.session_token.is_none() {
                    document.profiles.remove(profile.as_str());
                }
            }
        })
    }

    /// Profile that was active when the cache was last written, if recorded and valid.
    #[must_use]
    pub fn last_profile(&self) -> Option<Profile> {
        let document = match self.read_document() {
            Ok(document) => document?,
            Err(e) => {
                tracing::warn!(error = %e, "Credential cache unreadable; using default profile");
                return None;
            }
        };
        let name = document.general.last_profile?;
        match name.parse() {
            Ok(profile) => Some(profile),
            Err(e) => {
                tracing::warn!(error = %e, "Ignoring invalid last profile in credential cache");
                None
            }
        }
    }

    /// # Errors
    ///
    /// Returns [`Error::Cache`] if the document cannot be written.
    pub fn set_last_profile(&self, profile: &Profile) -> Result<(), Error> {
        self.update(|document| {
            document.general.last_profile = Some(profile.to_string());
        })
    }

    fn read_document(&self) -> Result<Option<CacheDocument>, Error> {
        let Some(contents) = self
            .storage
            .read()
            .map_err(|e| Error::Cache(format!("read failed: {e}")))?
        else {
            return Ok(None);
        };
        serde_json::from_str(&contents)
            .map(Some)
            .map_err(|e| Error::Cache(format!("corrupt document: {e}")))
    }

    fn update(&self, apply: impl FnOnce(&mut CacheDocument)) -> Result<(), Error> {
        let mut document = match self.read_document() {
            Ok(document) => document.unwrap_or_default(),
            Err(e) => {
                tracing::warn!(error = %e, "Replacing unreadable credential cache");
                CacheDocument::default()
            }
        };
        apply(&mut document);

        let contents = serde_json::to_string_pretty(&document)?;
        self.storage
            .write(&contents)
            .map_err(|e| Error::Cache(format!("write failed: {e}")))
    }
}
