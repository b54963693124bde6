#![doc = include_str!("../README.md")]

pub mod auth;
pub mod cache;
pub mod claims;
pub mod config;
pub mod error;
pub mod services;
pub mod session;
pub mod transport;
pub mod types;

#[cfg(feature = "cloud-save")]
pub mod cloud_save;
#[cfg(feature = "economy")]
pub mod economy;
#[cfg(feature = "friends")]
pub mod friends;
#[cfg(feature = "leaderboards")]
pub mod leaderboards;
#[cfg(feature = "ugc")]
pub mod ugc;

// Re-exports for convenient access
pub use auth::{AuthEvent, AuthenticationService, IdProvider, User};
pub use cache::{CacheLookup, CacheStorage, FileStorage, MemoryStorage, TokenCache, TokenField};
pub use claims::{Claims, decode_claims};
pub use config::ServicesConfig;
pub use error::{Error, Problem, ServiceKind};
pub use services::{PlayerCredentials, PlayerServices};
pub use session::Session;
pub use transport::{HttpRequest, HttpResponse, ReqwestTransport, Transport};
pub use types::{Links, Page, PlayerId, Profile, Timestamp};

#[cfg(feature = "cloud-save")]
pub use cloud_save::CloudSave;
#[cfg(feature = "economy")]
pub use economy::Economy;
#[cfg(feature = "friends")]
pub use friends::Friends;
#[cfg(feature = "leaderboards")]
pub use leaderboards::Leaderboards;
#[cfg(feature = "ugc")]
pub use ugc::Ugc;
