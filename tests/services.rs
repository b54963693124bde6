mod common;

use std::collections::BTreeMap;

use reqwest::Method;
use serde_json::json;
use ugs_client::friends::{Availability, RelationshipKind};
use ugs_client::leaderboards::ScoresQuery;
use ugs_client::ugc::{CreateContentRequest, Ugc};
use ugs_client::{Error, PlayerCredentials, PlayerId, PlayerServices, ServiceKind};

use common::{ENVIRONMENT, ENVIRONMENT_ID, FakeTransport, PROJECT_ID};

async fn connect(
    transport: &std::sync::Arc<FakeTransport>,
) -> PlayerServices<FakeTransport> {
    let auth = common::signed_in(transport, "player-1").await;
    PlayerServices::connect(&auth).unwrap()
}

fn relationships_body() -> serde_json::Value {
    json!([
        {"id": "r-friend", "type": "FRIEND", "members": [{"id": "p-friend"}]},
        {"id": "r-in", "type": "FRIEND_REQUEST", "members": [{"id": "p-in", "role": "SOURCE"}]},
        {"id": "r-out", "type": "FRIEND_REQUEST", "members": [{"id": "p-out", "role": "TARGET"}]},
        {"id": "r-block", "type": "BLOCK", "members": [{"id": "p-blocked", "role": "TARGET"}]}
    ])
}

#[tokio::test]
async fn test_connect_requires_sign_in() {
    let transport = FakeTransport::new();
    let auth = common::auth(&transport);
    assert!(matches!(
        PlayerServices::connect(&auth),
        Err(Error::InvalidOperation(_))
    ));
}

#[tokio::test]
async fn test_every_service_sends_project_headers_and_bearer() {
    let transport = FakeTransport::new();
    let auth = common::signed_in(&transport, "player-1").await;
    let bearer = format!("Bearer {}", auth.access_token().unwrap());
    let services = PlayerServices::connect(&auth).unwrap();
    let sent_before = transport.request_count();

    transport.push(200, json!({"results": [], "links": {}}));
    services.cloud_save.list_keys(None).await.unwrap();
    transport.push(200, json!({"results": []}));
    services.economy.configuration().await.unwrap();
    transport.push_empty();
    services
        .friends
        .set_presence(Availability::Online, None)
        .await
        .unwrap();
    transport.push(200, json!({"offset": 0, "limit": 10, "total": 0, "results": []}));
    services
        .leaderboards
        .scores("weekly", ScoresQuery::default())
        .await
        .unwrap();
    transport.push(200, json!([]));
    services.ugc.as_ref().unwrap().tags().await.unwrap();

    let requests = transport.requests();
    assert_eq!(requests.len() - sent_before, 5);
    for request in &requests[sent_before..] {
        assert_eq!(request.header("ProjectId"), Some(PROJECT_ID), "{}", request.url);
        assert_eq!(request.header("UnityEnvironment"), Some(ENVIRONMENT), "{}", request.url);
        assert_eq!(request.header("Authorization"), Some(bearer.as_str()), "{}", request.url);
    }
}

#[tokio::test]
async fn test_cloud_save_item_round() {
    let transport = FakeTransport::new();
    let services = connect(&transport).await;

    transport.push(200, json!({"writeLock": "w-2"}));
    let saved = services
        .cloud_save
        .save_item("level", &json!({"stage": 3}), Some("w-1"))
        .await
        .unwrap();
    assert_eq!(saved.key.as_deref(), Some("level"));
    assert_eq!(saved.write_lock, "w-2");

    let request = transport.last_request();
    assert_eq!(request.method, Method::POST);
    assert_eq!(
        request.url.as_str(),
        "https://cloud-save.services.api.unity.com/v1/data/projects/proj-1/players/player-1/items"
    );
    assert_eq!(
        request.body,
        Some(json!({"key": "level", "value": {"stage": 3}, "writeLock": "w-1"}))
    );

    transport.push(200, json!({"results": [{"key": "level", "value": 3}], "links": {"next": null}}));
    let page = services
        .cloud_save
        .load_items(&["level", "coins"], None)
        .await
        .unwrap();
    assert_eq!(page.results[0].value, json!(3));
    assert_eq!(transport.last_request().url.query(), Some("keys=level&keys=coins"));
}

#[tokio::test]
async fn test_cloud_save_batch_save() {
    let transport = FakeTransport::new();
    let services = connect(&transport).await;

    let mut items = BTreeMap::new();
    items.insert("a".to_owned(), 1);
    items.insert("b".to_owned(), 2);
    transport.push(
        200,
        json!({"results": [{"key": "a", "writeLock": "l1"}, {"key": "b", "writeLock": "l2"}]}),
    );
    let saved = services.cloud_save.save_items(&items).await.unwrap();

    assert_eq!(saved.len(), 2);
    let request = transport.last_request();
    assert!(request.url.path().ends_with("/item-batch"));
    assert_eq!(
        request.body,
        Some(json!({"data": [{"key": "a", "value": 1}, {"key": "b", "value": 2}]}))
    );
}

#[tokio::test]
async fn test_cloud_save_invalid_key_sends_nothing() {
    let transport = FakeTransport::new();
    let services = connect(&transport).await;
    let sent = transport.request_count();

    let err = services
        .cloud_save
        .save_item("bad key!", &1, None)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::InvalidArgument(_)));
    assert!(matches!(
        services.cloud_save.delete_item("", None).await,
        Err(Error::InvalidArgument(_))
    ));
    assert_eq!(transport.request_count(), sent);
}

#[tokio::test]
async fn test_cloud_save_conflict_surfaces_detail() {
    let transport = FakeTransport::new();
    let services = connect(&transport).await;

    transport.push(
        409,
        json!({"title": "Conflict", "status": 409, "detail": "write lock mismatch", "code": 7007}),
    );
    let err = services
        .cloud_save
        .save_item("level", &1, Some("stale"))
        .await
        .unwrap_err();

    assert_eq!(err.service(), Some(ServiceKind::CloudSave));
    assert_eq!(err.status(), Some(409));
    assert_eq!(err.problem().unwrap().code, Some(7007));
    assert_eq!(
        err.to_string(),
        "cloud save save item failed: 409 Conflict: write lock mismatch"
    );
}

#[tokio::test]
async fn test_economy_balance_changes() {
    let transport = FakeTransport::new();
    let services = connect(&transport).await;

    transport.push(200, json!({"currencyId": "GOLD", "balance": 150}));
    let balance = services
        .economy
        .increment_balance("GOLD", 50, None)
        .await
        .unwrap();
    assert_eq!(balance.balance, 150);

    let request = transport.last_request();
    assert_eq!(
        request.url.path(),
        "/v2/projects/proj-1/players/player-1/currencies/GOLD/increment"
    );
    assert_eq!(request.body, Some(json!({"amount": 50})));

    let sent = transport.request_count();
    assert!(matches!(
        services.economy.decrement_balance("GOLD", 0, None).await,
        Err(Error::InvalidArgument(_))
    ));
    assert!(matches!(
        services.economy.set_balance("GOLD", -1, None).await,
        Err(Error::InvalidArgument(_))
    ));
    assert_eq!(transport.request_count(), sent);
}

#[tokio::test]
async fn test_economy_virtual_purchase() {
    let transport = FakeTransport::new();
    let services = connect(&transport).await;

    transport.push(
        200,
        json!({
            "costs": {"currency": [{"id": "GOLD", "amount": 100}], "inventory": []},
            "rewards": {"currency": [], "inventory": [{"id": "SWORD", "amount": 1, "playersInventoryItemIds": ["inv-1"]}]}
        }),
    );
    let result = services
        .economy
        .make_virtual_purchase("SWORD_FOR_GOLD", &[])
        .await
        .unwrap();

    assert_eq!(result.costs.currency[0].amount, 100);
    assert_eq!(result.rewards.inventory[0].players_inventory_item_ids, ["inv-1"]);
    let request = transport.last_request();
    assert!(request.url.path().ends_with("/purchases/virtual"));
    assert_eq!(request.body, Some(json!({"id": "SWORD_FOR_GOLD"})));
}

#[tokio::test]
async fn test_friends_require_initialize() {
    let transport = FakeTransport::new();
    let mut services = connect(&transport).await;
    let sent = transport.request_count();

    assert!(!services.friends.is_initialized());
    assert!(matches!(
        services.friends.friends(),
        Err(Error::InvalidOperation(_))
    ));
    assert!(matches!(
        services.friends.incoming_friend_requests(),
        Err(Error::InvalidOperation(_))
    ));
    assert!(matches!(
        services.friends.add_friend(&PlayerId::from("p2")).await,
        Err(Error::InvalidOperation(_))
    ));
    assert_eq!(transport.request_count(), sent);
}

#[tokio::test]
async fn test_friends_classify_relationships() {
    let transport = FakeTransport::new();
    let mut services = connect(&transport).await;

    transport.push(200, relationships_body());
    services.friends.initialize().await.unwrap();

    let request = transport.last_request();
    assert_eq!(request.url.host_str(), Some("social.services.api.unity.com"));
    assert_eq!(request.url.path(), "/v1/relationships");
    let query = request.url.query().unwrap();
    assert!(query.contains("withPresence=true"));
    assert!(query.contains("withProfile=true"));

    let friends = &services.friends;
    assert_eq!(friends.relationships().unwrap().len(), 4);
    assert_eq!(friends.friends().unwrap()[0].id, "r-friend");
    assert_eq!(friends.incoming_friend_requests().unwrap()[0].id, "r-in");
    assert_eq!(friends.outgoing_friend_requests().unwrap()[0].id, "r-out");
    assert_eq!(friends.blocks().unwrap()[0].id, "r-block");
}

#[tokio::test]
async fn test_accepting_request_replaces_it_with_friendship() {
    let transport = FakeTransport::new();
    let mut services = connect(&transport).await;
    transport.push(200, relationships_body());
    services.friends.initialize().await.unwrap();

    transport.push(
        200,
        json!({"id": "r-new", "type": "FRIEND", "members": [{"id": "p-in"}]}),
    );
    let created = services
        .friends
        .add_friend(&PlayerId::from("p-in"))
        .await
        .unwrap();
    assert_eq!(created.kind, RelationshipKind::Friend);

    let request = transport.last_request();
    assert_eq!(request.method, Method::POST);
    assert_eq!(
        request.body,
        Some(json!({"type": "FRIEND_REQUEST", "members": [{"id": "p-in"}]}))
    );
    assert!(services.friends.incoming_friend_requests().unwrap().is_empty());
    assert_eq!(services.friends.friends().unwrap().len(), 2);
}

#[tokio::test]
async fn test_friend_removals_delete_the_matching_relationship() {
    let transport = FakeTransport::new();
    let mut services = connect(&transport).await;
    transport.push(200, relationships_body());
    services.friends.initialize().await.unwrap();

    transport.push_empty();
    services
        .friends
        .decline_friend_request(&PlayerId::from("p-in"))
        .await
        .unwrap();
    let request = transport.last_request();
    assert_eq!(request.method, Method::DELETE);
    assert_eq!(request.url.path(), "/v1/relationships/r-in");

    transport.push_empty();
    services
        .friends
        .unblock(&PlayerId::from("p-blocked"))
        .await
        .unwrap();
    assert_eq!(transport.last_request().url.path(), "/v1/relationships/r-block");
    assert!(services.friends.blocks().unwrap().is_empty());

    let sent = transport.request_count();
    assert!(matches!(
        services.friends.delete_friend(&PlayerId::from("p-out")).await,
        Err(Error::InvalidArgument(_))
    ));
    assert_eq!(transport.request_count(), sent);
}

#[tokio::test]
async fn test_presence_update() {
    let transport = FakeTransport::new();
    let services = connect(&transport).await;

    transport.push_empty();
    services
        .friends
        .set_presence(Availability::Busy, Some(&json!({"status": "in match"})))
        .await
        .unwrap();

    let request = transport.last_request();
    assert_eq!(request.method, Method::PUT);
    assert_eq!(request.url.path(), "/v1/presence/player-1");
    assert_eq!(
        request.body,
        Some(json!({"availability": "BUSY", "activity": {"status": "in match"}}))
    );
}

#[tokio::test]
async fn test_leaderboard_score_submission_and_listing() {
    let transport = FakeTransport::new();
    let services = connect(&transport).await;

    transport.push(
        200,
        json!({"playerId": "player-1", "rank": 4, "score": 99.5, "updatedTime": "2024-05-10T10:00:00Z"}),
    );
    let entry = services
        .leaderboards
        .add_player_score("weekly", 99.5, Some(&json!({"map": "dunes"})))
        .await
        .unwrap();
    assert_eq!(entry.rank, 4);

    let request = transport.last_request();
    assert_eq!(
        request.url.path(),
        "/v1/projects/proj-1/leaderboards/weekly/scores/players/player-1"
    );
    assert_eq!(request.body, Some(json!({"score": 99.5, "metadata": {"map": "dunes"}})));

    transport.push(
        200,
        json!({
            "offset": 10, "limit": 2, "total": 30,
            "results": [
                {"playerId": "a", "rank": 10, "score": 5.0},
                {"playerId": "b", "rank": 11, "score": 4.0}
            ]
        }),
    );
    let page = services
        .leaderboards
        .scores("weekly", ScoresQuery::default().with_offset(10).with_limit(2))
        .await
        .unwrap();
    assert!(page.has_more());
    assert_eq!(transport.last_request().url.query(), Some("offset=10&limit=2"));

    let sent = transport.request_count();
    assert!(matches!(
        services.leaderboards.add_player_score("weekly", f64::NAN, None).await,
        Err(Error::InvalidArgument(_))
    ));
    assert_eq!(transport.request_count(), sent);
}

#[tokio::test]
async fn test_leaderboard_lookups() {
    let transport = FakeTransport::new();
    let services = connect(&transport).await;

    transport.push(200, json!({"results": [], "entriesNotFound": ["ghost"]}));
    let scores = services
        .leaderboards
        .scores_by_player_ids("weekly", &[PlayerId::from("ghost")])
        .await
        .unwrap();
    assert_eq!(scores.entries_not_found, [PlayerId::from("ghost")]);
    let request = transport.last_request();
    assert!(request.url.path().ends_with("/weekly/scores/player-ids"));
    assert_eq!(request.body, Some(json!({"playerIds": ["ghost"]})));

    transport.push(200, json!({"results": []}));
    services
        .leaderboards
        .player_range("weekly", Some(3))
        .await
        .unwrap();
    let request = transport.last_request();
    assert!(request.url.path().ends_with("/scores/players/player-1/range"));
    assert_eq!(request.url.query(), Some("rangeLimit=3"));

    transport.push(200, json!({"offset": 0, "limit": 10, "total": 0, "results": []}));
    services
        .leaderboards
        .version_scores("weekly", "v7", ScoresQuery::default())
        .await
        .unwrap();
    assert!(transport
        .last_request()
        .url
        .path()
        .ends_with("/weekly/versions/v7/scores"));
}

#[tokio::test]
async fn test_ugc_is_scoped_to_token_environment() {
    let transport = FakeTransport::new();
    let services = connect(&transport).await;
    let ugc = services.ugc.as_ref().unwrap();

    transport.push(
        200,
        json!({
            "content": {"id": "c1", "name": "Castle", "visibility": "Private"},
            "uploadContentUrl": "https://upload.example/c1",
            "uploadThumbnailUrl": "https://upload.example/c1-thumb"
        }),
    );
    let created = ugc
        .create_content(&CreateContentRequest::new("Castle", "A big castle"))
        .await
        .unwrap();
    assert_eq!(created.content.id, "c1");
    assert!(created.upload_content_url.is_some());

    let request = transport.last_request();
    assert_eq!(
        request.url.path(),
        format!("/v1/projects/{PROJECT_ID}/environments/{ENVIRONMENT_ID}/content")
    );

    transport.push(200, json!({"offset": 0, "limit": 5, "total": 0, "results": []}));
    ugc.subscriptions(0, 5).await.unwrap();
    assert_eq!(transport.last_request().url.query(), Some("offset=0&limit=5"));
}

#[tokio::test]
async fn test_ugc_needs_environment_id() {
    let transport = FakeTransport::new();
    let credentials = PlayerCredentials {
        player_id: PlayerId::from("player-1"),
        access_token: "tok".to_owned(),
        environment_id: None,
    };

    let err = Ugc::new(&common::config(), transport.clone(), &credentials).unwrap_err();
    assert!(matches!(err, Error::InvalidOperation(_)));

    let services =
        PlayerServices::from_credentials(&common::config(), &transport, &credentials).unwrap();
    assert!(services.ugc.is_none());
}

#[tokio::test]
async fn test_service_error_keeps_detail_with_null_details() {
    let transport = FakeTransport::new();
    let services = connect(&transport).await;

    transport.push_raw(
        400,
        r#"{"title":"Bad Request","status":400,"detail":"invalid key","code":"INVALID","details":null}"#,
    );
    let err = services.economy.balances(None, None).await.unwrap_err();

    assert_eq!(err.service(), Some(ServiceKind::Economy));
    assert_eq!(
        err.problem().and_then(|p| p.detail.as_deref()),
        Some("invalid key")
    );
    assert_eq!(err.status(), Some(400));
}
