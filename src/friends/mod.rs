//! Friends, friend requests, blocks and presence.
//!
//! The relationship list is loaded once by [`Friends::initialize`] and kept
//! up to date by the mutating calls. Mutations that name a member resolve
//! the relationship through that list, so they also require initialization.

mod models;

use std::sync::Arc;

use reqwest::Method;
use serde_json::Value as JsonValue;

use crate::config::ServicesConfig;
use crate::error::{Error, ServiceKind};
use crate::services::PlayerCredentials;
use crate::transport::{ReqwestTransport, RestClient, Transport};
use crate::types::PlayerId;

pub use models::{
    Availability, Member, MemberProfile, MemberRole, Presence, Relationship, RelationshipKind,
};
use models::{CreateRelationshipRequest, MemberIdentity, RelationshipsResponse, SetPresenceRequest};

const DEFAULT_PAGE_LIMIT: u32 = 100;

/// Friends client for the signed-in player.
#[derive(Debug)]
pub struct Friends<T = ReqwestTransport> {
    rest: RestClient<T>,
    player_id: PlayerId,
    page_limit: u32,
    relationships: Option<Vec<Relationship>>,
}

impl<T: Transport> Friends<T> {
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the social base URL cannot carry a path.
    pub fn new(
        config: &ServicesConfig,
        transport: Arc<T>,
        credentials: &PlayerCredentials,
    ) -> Result<Self, Error> {
        let rest = RestClient::new(
            ServiceKind::Friends,
            transport,
            config,
            config.social_url(),
            &["v1"],
        )?
        .with_bearer(&credentials.access_token);
        Ok(Self {
            rest,
            player_id: credentials.player_id.clone(),
            page_limit: DEFAULT_PAGE_LIMIT,
            relationships: None,
        })
    }

    /// Number of relationships fetched by [`initialize`](Self::initialize).
    #[must_use]
    pub fn with_page_limit(mut self, limit: u32) -> Self {
        self.page_limit = limit;
        self
    }

    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.relationships.is_some()
    }

    /// Load the relationship list, with member profiles and presence.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Service`] if the request is rejected; the previous
    /// list, if any, is kept.
    pub async fn initialize(&mut self) -> Result<(), Error> {
        let query = [
            ("limit", self.page_limit.to_string()),
            ("offset", "0".to_owned()),
            ("withPresence", "true".to_owned()),
            ("withProfile", "true".to_owned()),
        ];
        let url = self.rest.url(&["relationships"], &query)?;
        let response: RelationshipsResponse = self.rest.get(url, "get relationships").await?;
        let relationships = response.into_vec();
        tracing::debug!(count = relationships.len(), "relationships loaded");
        self.relationships = Some(relationships);
        Ok(())
    }

    /// Reload the relationship list.
    ///
    /// # Errors
    ///
    /// Same as [`initialize`](Self::initialize).
    pub async fn refresh(&mut self) -> Result<(), Error> {
        self.initialize().await
    }

    /// Every cached relationship.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidOperation`] before [`initialize`](Self::initialize).
    pub fn relationships(&self) -> Result<&[Relationship], Error> {
        self.relationships
            .as_deref()
            .ok_or_else(|| Error::InvalidOperation("friends are not initialized".to_owned()))
    }

    /// # Errors
    ///
    /// Returns [`Error::InvalidOperation`] before [`initialize`](Self::initialize).
    pub fn friends(&self) -> Result<Vec<&Relationship>, Error> {
        self.filtered(|rel, _| rel.kind == RelationshipKind::Friend)
    }

    /// Requests other players sent to this player.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidOperation`] before [`initialize`](Self::initialize).
    pub fn incoming_friend_requests(&self) -> Result<Vec<&Relationship>, Error> {
        self.filtered(|rel, me| is_request_with_role(rel, me, MemberRole::Source))
    }

    /// Requests this player sent and that are still pending.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidOperation`] before [`initialize`](Self::initialize).
    pub fn outgoing_friend_requests(&self) -> Result<Vec<&Relationship>, Error> {
        self.filtered(|rel, me| is_request_with_role(rel, me, MemberRole::Target))
    }

    /// # Errors
    ///
    /// Returns [`Error::InvalidOperation`] before [`initialize`](Self::initialize).
    pub fn blocks(&self) -> Result<Vec<&Relationship>, Error> {
        self.filtered(|rel, _| rel.kind == RelationshipKind::Block)
    }

    /// Send a friend request, or accept the pending request from `member_id`.
    /// Returns the resulting relationship (`FriendRequest` or `Friend`).
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidOperation`] before initialization,
    /// [`Error::Service`] if the request is rejected.
    pub async fn add_friend(&mut self, member_id: &PlayerId) -> Result<Relationship, Error> {
        self.create_relationship(RelationshipKind::FriendRequest, member_id, "add friend")
            .await
    }

    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if `member_id` is not a friend.
    pub async fn delete_friend(&mut self, member_id: &PlayerId) -> Result<(), Error> {
        let id = self.find(member_id, "friend", |rel, _| {
            rel.kind == RelationshipKind::Friend
        })?;
        self.delete_relationship(&id).await
    }

    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if there is no request from `member_id`.
    pub async fn decline_friend_request(&mut self, member_id: &PlayerId) -> Result<(), Error> {
        let id = self.find(member_id, "incoming friend request", |rel, me| {
            is_request_with_role(rel, me, MemberRole::Source)
        })?;
        self.delete_relationship(&id).await
    }

    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if there is no request to `member_id`.
    pub async fn cancel_friend_request(&mut self, member_id: &PlayerId) -> Result<(), Error> {
        let id = self.find(member_id, "outgoing friend request", |rel, me| {
            is_request_with_role(rel, me, MemberRole::Target)
        })?;
        self.delete_relationship(&id).await
    }

    /// Block `member_id`. Any friendship or request with them is dropped.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidOperation`] before initialization,
    /// [`Error::Service`] if the request is rejected.
    pub async fn block(&mut self, member_id: &PlayerId) -> Result<Relationship, Error> {
        self.create_relationship(RelationshipKind::Block, member_id, "block")
            .await
    }

    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if `member_id` is not blocked.
    pub async fn unblock(&mut self, member_id: &PlayerId) -> Result<(), Error> {
        let id = self.find(member_id, "block", |rel, _| {
            rel.kind == RelationshipKind::Block
        })?;
        self.delete_relationship(&id).await
    }

    /// # Errors
    ///
    /// Returns [`Error::InvalidOperation`] before initialization,
    /// [`Error::Service`] if the relationship does not exist.
    pub async fn delete_relationship(&mut self, relationship_id: &str) -> Result<(), Error> {
        self.relationships()?;
        let url = self.rest.url(&["relationships", relationship_id], &[])?;
        self.rest
            .execute(Method::DELETE, url, None, "delete relationship")
            .await?;
        if let Some(list) = self.relationships.as_mut() {
            list.retain(|rel| rel.id != relationship_id);
        }
        Ok(())
    }

    /// Publish this player's availability and an optional activity payload.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Service`] if the request is rejected.
    pub async fn set_presence(
        &self,
        availability: Availability,
        activity: Option<&JsonValue>,
    ) -> Result<(), Error> {
        let url = self
            .rest
            .url(&["presence", self.player_id.as_str()], &[])?;
        let body = serde_json::to_value(SetPresenceRequest {
            availability,
            activity,
        })?;
        self.rest
            .execute(Method::PUT, url, Some(body), "set presence")
            .await
    }

    async fn create_relationship(
        &mut self,
        kind: RelationshipKind,
        member_id: &PlayerId,
        operation: &'static str,
    ) -> Result<Relationship, Error> {
        self.relationships()?;
        if member_id == &self.player_id {
            return Err(Error::InvalidArgument(format!(
                "{operation}: cannot target the signed-in player"
            )));
        }
        let url = self.rest.url(&["relationships"], &[])?;
        let request = CreateRelationshipRequest {
            kind,
            members: [MemberIdentity {
                id: member_id.as_str(),
            }],
        };
        let created: Relationship = self
            .rest
            .send_json(Method::POST, url, &request, operation)
            .await?;

        let me = self.player_id.clone();
        if let Some(list) = self.relationships.as_mut() {
            // A block or an accepted request replaces whatever linked the two players.
            list.retain(|rel| {
                rel.id != created.id
                    && !(rel.involves(&me, member_id)
                        && matches!(
                            rel.kind,
                            RelationshipKind::Friend | RelationshipKind::FriendRequest
                        ))
            });
            list.push(created.clone());
        }
        Ok(created)
    }

    fn filtered(
        &self,
        keep: impl Fn(&Relationship, &PlayerId) -> bool,
    ) -> Result<Vec<&Relationship>, Error> {
        Ok(self
            .relationships()?
            .iter()
            .filter(|rel| keep(rel, &self.player_id))
            .collect())
    }

    fn find(
        &self,
        member_id: &PlayerId,
        what: &str,
        keep: impl Fn(&Relationship, &PlayerId) -> bool,
    ) -> Result<String, Error> {
        self.relationships()?
            .iter()
            .find(|rel| rel.involves(&self.player_id, member_id) && keep(rel, &self.player_id))
            .map(|rel| rel.id.clone())
            .ok_or_else(|| Error::InvalidArgument(format!("no {what} with player {member_id}")))
    }
}

fn is_request_with_role(rel: &Relationship, me: &PlayerId, role: MemberRole) -> bool {
    rel.kind == RelationshipKind::FriendRequest
        && rel.other_member(me).and_then(|m| m.role) == Some(role)
}
