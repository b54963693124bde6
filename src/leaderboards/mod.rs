//! Score submission and ranked listings.

mod models;

use std::sync::Arc;

use reqwest::Method;
use serde_json::Value as JsonValue;

use crate::config::ServicesConfig;
use crate::error::{Error, ServiceKind};
use crate::services::PlayerCredentials;
use crate::transport::{ReqwestTransport, RestClient, Transport};
use crate::types::{Page, PlayerId};

pub use models::{
    LeaderboardEntry, LeaderboardVersion, LeaderboardVersions, PlayerScores, RangeResults,
    ScoresQuery,
};
use models::{AddScoreRequest, PlayerIdsRequest};

/// Leaderboards client for the signed-in player.
#[derive(Debug)]
pub struct Leaderboards<T = ReqwestTransport> {
    rest: RestClient<T>,
    player_id: PlayerId,
}

impl<T: Transport> Leaderboards<T> {
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the Leaderboards base URL cannot carry a path.
    pub fn new(
        config: &ServicesConfig,
        transport: Arc<T>,
        credentials: &PlayerCredentials,
    ) -> Result<Self, Error> {
        let rest = RestClient::new(
            ServiceKind::Leaderboards,
            transport,
            config,
            config.leaderboards_url(),
            &["v1", "projects", config.project_id(), "leaderboards"],
        )?
        .with_bearer(&credentials.access_token);
        Ok(Self {
            rest,
            player_id: credentials.player_id.clone(),
        })
    }

    /// Submit a score for the player. The leaderboard's update strategy
    /// decides whether it replaces the stored one.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] for a non-finite score,
    /// [`Error::Service`] if the leaderboard does not exist.
    pub async fn add_player_score(
        &self,
        leaderboard_id: &str,
        score: f64,
        metadata: Option<&JsonValue>,
    ) -> Result<LeaderboardEntry, Error> {
        if !score.is_finite() {
            return Err(Error::InvalidArgument(format!(
                "score for '{leaderboard_id}' must be finite"
            )));
        }
        let url = self.rest.url(
            &[leaderboard_id, "scores", "players", self.player_id.as_str()],
            &[],
        )?;
        self.rest
            .send_json(
                Method::POST,
                url,
                &AddScoreRequest { score, metadata },
                "add player score",
            )
            .await
    }

    /// # Errors
    ///
    /// Returns [`Error::Service`] if the leaderboard does not exist.
    pub async fn scores(
        &self,
        leaderboard_id: &str,
        query: ScoresQuery,
    ) -> Result<Page<LeaderboardEntry>, Error> {
        let url = self
            .rest
            .url(&[leaderboard_id, "scores"], &query.to_query())?;
        self.rest.get(url, "get scores").await
    }

    /// # Errors
    ///
    /// Returns [`Error::Service`] (404) if the player has no score.
    pub async fn player_score(
        &self,
        leaderboard_id: &str,
        include_metadata: bool,
    ) -> Result<LeaderboardEntry, Error> {
        let query = metadata_query(include_metadata);
        let url = self.rest.url(
            &[leaderboard_id, "scores", "players", self.player_id.as_str()],
            &query,
        )?;
        self.rest.get(url, "get player score").await
    }

    /// Entries ranked around the player, `range_limit` on each side.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Service`] (404) if the player has no score.
    pub async fn player_range(
        &self,
        leaderboard_id: &str,
        range_limit: Option<u32>,
    ) -> Result<RangeResults, Error> {
        let query: Vec<_> = range_limit
            .map(|l| ("rangeLimit", l.to_string()))
            .into_iter()
            .collect();
        let url = self.rest.url(
            &[
                leaderboard_id,
                "scores",
                "players",
                self.player_id.as_str(),
                "range",
            ],
            &query,
        )?;
        self.rest.get(url, "get player range").await
    }

    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] for an empty `player_ids`,
    /// [`Error::Service`] if the leaderboard does not exist.
    pub async fn scores_by_player_ids(
        &self,
        leaderboard_id: &str,
        player_ids: &[PlayerId],
    ) -> Result<PlayerScores, Error> {
        if player_ids.is_empty() {
            return Err(Error::InvalidArgument(
                "at least one player ID is required".to_owned(),
            ));
        }
        let url = self
            .rest
            .url(&[leaderboard_id, "scores", "player-ids"], &[])?;
        self.rest
            .send_json(
                Method::POST,
                url,
                &PlayerIdsRequest { player_ids },
                "get scores by player ids",
            )
            .await
    }

    /// Archived versions of a resetting leaderboard.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Service`] if the leaderboard does not exist.
    pub async fn versions(&self, leaderboard_id: &str) -> Result<LeaderboardVersions, Error> {
        let url = self.rest.url(&[leaderboard_id, "versions"], &[])?;
        self.rest.get(url, "get versions").await
    }

    /// # Errors
    ///
    /// Returns [`Error::Service`] if the version does not exist.
    pub async fn version_scores(
        &self,
        leaderboard_id: &str,
        version_id: &str,
        query: ScoresQuery,
    ) -> Result<Page<LeaderboardEntry>, Error> {
        let url = self.rest.url(
            &[leaderboard_id, "versions", version_id, "scores"],
            &query.to_query(),
        )?;
        self.rest.get(url, "get version scores").await
    }
}

fn metadata_query(include: bool) -> Vec<(&'static str, String)> {
    if include {
        vec![("includeMetadata", "true".to_owned())]
    } else {
        Vec::new()
    }
}
