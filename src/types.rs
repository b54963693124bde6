use derive_more::{Display, From, Into};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::error::Error;

/// UGS player identifier (the identity token's `sub` claim).
#[derive(
    Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Display, From, Into,
)]
#[serde(transparent)]
pub struct PlayerId(pub String);

impl PlayerId {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for PlayerId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

/// Name of a partition of the local credential cache.
///
/// Guaranteed valid by construction: 1 to 30 ASCII alphanumeric characters,
/// `-` or `_`. Use `"alt-account".parse::<Profile>()` or `Profile::try_from`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Profile(String);

impl Profile {
    /// Profile used when none was ever selected.
    pub const DEFAULT: &'static str = "default";

    const MAX_LEN: usize = 30;

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for Profile {
    fn default() -> Self {
        Self(Self::DEFAULT.to_owned())
    }
}

impl std::fmt::Display for Profile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for Profile {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::try_from(s.to_owned())
    }
}

impl TryFrom<String> for Profile {
    type Error = Error;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        let valid = !s.is_empty()
            && s.len() <= Self::MAX_LEN
            && s.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_');
        if valid {
            Ok(Self(s))
        } else {
            Err(Error::InvalidArgument(format!(
                "invalid profile name '{s}': use 1-30 letters, digits, '-' or '_'"
            )))
        }
    }
}

impl From<Profile> for String {
    fn from(p: Profile) -> Self {
        p.0
    }
}

/// One page of an offset/limit listing.
///
/// The caller drives pagination; nothing fetches the next page implicitly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[non_exhaustive]
pub struct Page<T> {
    #[serde(default)]
    pub offset: u32,
    #[serde(default)]
    pub limit: u32,
    #[serde(default)]
    pub total: u32,
    #[serde(default = "Vec::new")]
    pub results: Vec<T>,
}

impl<T> Page<T> {
    /// Whether entries exist beyond this page.
    #[must_use]
    pub fn has_more(&self) -> bool {
        u64::from(self.offset) + (self.results.len() as u64) < u64::from(self.total)
    }
}

/// Cursor link returned by cursor-paginated endpoints.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[non_exhaustive]
pub struct Links {
    #[serde(default)]
    pub next: Option<String>,
}

/// Timestamp wrapped in an object (`{"date": "…"}`), as Cloud Save and Economy send it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[non_exhaustive]
pub struct Timestamp {
    #[serde(with = "time::serde::rfc3339")]
    pub date: OffsetDateTime,
}
