use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use time::OffsetDateTime;

use crate::types::PlayerId;

/// One ranked score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[non_exhaustive]
pub struct LeaderboardEntry {
    pub player_id: PlayerId,
    #[serde(default)]
    pub player_name: Option<String>,
    /// Zero-based position on the leaderboard.
    pub rank: u64,
    pub score: f64,
    #[serde(default)]
    pub tier: Option<String>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub updated_time: Option<OffsetDateTime>,
    #[serde(default)]
    pub metadata: Option<JsonValue>,
}

/// Paging and metadata options for score listings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[non_exhaustive]
pub struct ScoresQuery {
    pub offset: Option<u32>,
    pub limit: Option<u32>,
    pub include_metadata: bool,
}

impl ScoresQuery {
    #[must_use]
    pub fn with_offset(mut self, offset: u32) -> Self {
        self.offset = Some(offset);
        self
    }

    #[must_use]
    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    #[must_use]
    pub fn with_metadata(mut self) -> Self {
        self.include_metadata = true;
        self
    }

    pub(crate) fn to_query(self) -> Vec<(&'static str, String)> {
        let mut query = Vec::new();
        if let Some(offset) = self.offset {
            query.push(("offset", offset.to_string()));
        }
        if let Some(limit) = self.limit {
            query.push(("limit", limit.to_string()));
        }
        if self.include_metadata {
            query.push(("includeMetadata", "true".to_owned()));
        }
        query
    }
}

/// Entries around the player, from `player_range`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[non_exhaustive]
pub struct RangeResults {
    #[serde(default)]
    pub results: Vec<LeaderboardEntry>,
}

/// Result of a lookup by player IDs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[non_exhaustive]
pub struct PlayerScores {
    #[serde(default)]
    pub results: Vec<LeaderboardEntry>,
    /// Requested players without a score.
    #[serde(default)]
    pub entries_not_found: Vec<PlayerId>,
}

/// An archived leaderboard version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[non_exhaustive]
pub struct LeaderboardVersion {
    pub id: String,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub start: Option<OffsetDateTime>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub end: Option<OffsetDateTime>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[non_exhaustive]
pub struct LeaderboardVersions {
    #[serde(default)]
    pub version_id: Option<String>,
    #[serde(default)]
    pub results: Vec<LeaderboardVersion>,
}

#[derive(Debug, Serialize)]
pub(crate) struct AddScoreRequest<'a> {
    pub(crate) score: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) metadata: Option<&'a JsonValue>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PlayerIdsRequest<'a> {
    pub(crate) player_ids: &'a [PlayerId],
}
