use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use time::OffsetDateTime;

use crate::types::PlayerId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[non_exhaustive]
pub enum RelationshipKind {
    Friend,
    FriendRequest,
    Block,
    #[serde(other)]
    Unknown,
}

/// Side of a directed relationship (friend request or block) a member is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[non_exhaustive]
pub enum MemberRole {
    Source,
    Target,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[non_exhaustive]
pub enum Availability {
    Online,
    Busy,
    Away,
    Invisible,
    Offline,
    #[default]
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[non_exhaustive]
pub struct Presence {
    #[serde(default)]
    pub availability: Availability,
    #[serde(default)]
    pub activity: Option<JsonValue>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub last_seen: Option<OffsetDateTime>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[non_exhaustive]
pub struct MemberProfile {
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[non_exhaustive]
pub struct Member {
    pub id: PlayerId,
    #[serde(default)]
    pub role: Option<MemberRole>,
    #[serde(default)]
    pub profile: Option<MemberProfile>,
    #[serde(default)]
    pub presence: Option<Presence>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[non_exhaustive]
pub struct Relationship {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: RelationshipKind,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub created: Option<OffsetDateTime>,
    #[serde(default)]
    pub members: Vec<Member>,
}

impl Relationship {
    /// The member that is not `me`.
    #[must_use]
    pub fn other_member(&self, me: &PlayerId) -> Option<&Member> {
        self.members.iter().find(|m| &m.id != me)
    }

    pub(crate) fn involves(&self, me: &PlayerId, member_id: &PlayerId) -> bool {
        self.other_member(me).is_some_and(|m| &m.id == member_id)
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum RelationshipsResponse {
    List(Vec<Relationship>),
    Page { results: Vec<Relationship> },
}

impl RelationshipsResponse {
    pub(crate) fn into_vec(self) -> Vec<Relationship> {
        match self {
            Self::List(list) | Self::Page { results: list } => list,
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct MemberIdentity<'a> {
    pub(crate) id: &'a str,
}

#[derive(Debug, Serialize)]
pub(crate) struct CreateRelationshipRequest<'a> {
    #[serde(rename = "type")]
    pub(crate) kind: RelationshipKind,
    pub(crate) members: [MemberIdentity<'a>; 1],
}

#[derive(Debug, Serialize)]
pub(crate) struct SetPresenceRequest<'a> {
    pub(crate) availability: Availability,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) activity: Option<&'a JsonValue>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relationship_parses_members() {
        let body = r#"{
            "id": "rel-1",
            "type": "FRIEND_REQUEST",
            "created": "2024-03-01T08:00:00Z",
            "members": [{
                "id": "p2",
                "role": "SOURCE",
                "profile": {"name": "Ada#1234"},
                "presence": {"availability": "ONLINE", "activity": {"status": "in lobby"}}
            }]
        }"#;
        let rel: Relationship = serde_json::from_str(body).unwrap();

        assert_eq!(rel.kind, RelationshipKind::FriendRequest);
        let other = rel.other_member(&PlayerId::from("p1")).unwrap();
        assert_eq!(other.role, Some(MemberRole::Source));
        assert_eq!(
            other.presence.as_ref().unwrap().availability,
            Availability::Online
        );
    }

    #[test]
    fn availability_wire_names() {
        assert_eq!(
            serde_json::to_value(Availability::Online).unwrap(),
            serde_json::json!("ONLINE")
        );
        let parsed: Availability = serde_json::from_str("\"DO_NOT_DISTURB\"").unwrap();
        assert_eq!(parsed, Availability::Unknown);
        assert_eq!(Availability::default(), Availability::Unknown);
    }

    #[test]
    fn presence_defaults_missing_fields() {
        let presence: Presence = serde_json::from_str(
            r#"{"availability":"AWAY","lastSeen":"2024-03-01T08:00:00Z"}"#,
        )
        .unwrap();
        assert_eq!(presence.availability, Availability::Away);
        assert!(presence.activity.is_none());
        assert_eq!(presence.last_seen.unwrap().year(), 2024);

        let empty: Presence = serde_json::from_str("{}").unwrap();
        assert_eq!(empty.availability, Availability::Unknown);
    }

    #[test]
    fn presence_request_omits_missing_activity() {
        let body = serde_json::to_value(SetPresenceRequest {
            availability: Availability::Invisible,
            activity: None,
        })
        .unwrap();
        assert_eq!(body, serde_json::json!({"availability": "INVISIBLE"}));
    }

    #[test]
    fn relationships_accept_list_or_page() {
        let list: RelationshipsResponse =
            serde_json::from_str(r#"[{"id":"r","type":"FRIEND","members":[]}]"#).unwrap();
        assert_eq!(list.into_vec().len(), 1);

        let page: RelationshipsResponse =
            serde_json::from_str(r#"{"results":[{"id":"r","type":"BLOCK","members":[]}]}"#)
                .unwrap();
        assert_eq!(page.into_vec()[0].kind, RelationshipKind::Block);
    }

    #[test]
    fn create_request_shape() {
        let body = serde_json::to_value(CreateRelationshipRequest {
            kind: RelationshipKind::FriendRequest,
            members: [MemberIdentity { id: "p2" }],
        })
        .unwrap();
        assert_eq!(
            body,
            serde_json::json!({"type": "FRIEND_REQUEST", "members": [{"id": "p2"}]})
        );
    }
}
