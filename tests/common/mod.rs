#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde_json::{Value, json};
use ugs_client::{
    AuthenticationService, Error, HttpRequest, HttpResponse, MemoryStorage, ServicesConfig,
    TokenCache, Transport,
};

pub const PROJECT_ID: &str = "proj-1";
pub const ENVIRONMENT: &str = "staging";
pub const ENVIRONMENT_ID: &str = "env-42";

/// Replays queued responses in order and records every request.
#[derive(Debug, Default)]
pub struct FakeTransport {
    responses: Mutex<VecDeque<HttpResponse>>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl FakeTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn push(&self, status: u16, body: Value) {
        self.push_raw(status, body.to_string());
    }

    pub fn push_raw(&self, status: u16, body: impl Into<String>) {
        self.responses.lock().unwrap().push_back(HttpResponse {
            status,
            body: body.into(),
        });
    }

    pub fn push_empty(&self) {
        self.push_raw(204, "");
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn last_request(&self) -> HttpRequest {
        self.requests
            .lock()
            .unwrap()
            .last()
            .cloned()
            .expect("no request was sent")
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

impl Transport for FakeTransport {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, Error> {
        self.requests.lock().unwrap().push(request.clone());
        let response = self.responses.lock().unwrap().pop_front();
        Ok(response.unwrap_or_else(|| panic!("unexpected request {} {}", request.method, request.url)))
    }
}

pub fn config() -> ServicesConfig {
    ServicesConfig::new(PROJECT_ID).with_environment(ENVIRONMENT)
}

/// Unsigned three-part token carrying `sub` and the environment audience.
pub fn id_token(player_id: &str) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"RS256","typ":"JWT"}"#);
    let payload = URL_SAFE_NO_PAD.encode(
        json!({
            "sub": player_id,
            "aud": [format!("envId:{ENVIRONMENT_ID}"), format!("envName:{ENVIRONMENT}")],
            "exp": 1_900_000_000,
            "project_id": PROJECT_ID,
        })
        .to_string(),
    );
    format!("{header}.{payload}.c2ln")
}

pub fn sign_in_body(player_id: &str, session_token: &str) -> Value {
    json!({
        "userId": player_id,
        "idToken": id_token(player_id),
        "sessionToken": session_token,
        "expiresIn": 3600,
    })
}

pub fn auth_with_cache(
    transport: &Arc<FakeTransport>,
    cache: TokenCache,
) -> AuthenticationService<FakeTransport> {
    AuthenticationService::new(config(), transport.clone(), cache)
}

pub fn auth(transport: &Arc<FakeTransport>) -> AuthenticationService<FakeTransport> {
    auth_with_cache(transport, TokenCache::new(MemoryStorage::new()))
}

/// Signed-in service for `player_id`; the sign-in request is already consumed.
pub async fn signed_in(
    transport: &Arc<FakeTransport>,
    player_id: &str,
) -> AuthenticationService<FakeTransport> {
    let mut auth = auth(transport);
    transport.push(200, sign_in_body(player_id, "sess-1"));
    auth.sign_in_anonymously().await.unwrap();
    auth
}
