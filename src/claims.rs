use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value as JsonValue};
use time::OffsetDateTime;

use crate::error::Error;

/// Claims carried by a UGS identity token.
///
/// Decoded without signature verification; the issuing service and TLS are
/// the only trust anchors.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[non_exhaustive]
pub struct Claims {
    #[serde(default)]
    pub iss: Option<String>,
    #[serde(default)]
    pub sub: Option<String>,
    #[serde(default, deserialize_with = "one_or_many")]
    pub aud: Vec<String>,
    #[serde(default)]
    pub exp: Option<i64>,
    #[serde(default)]
    pub iat: Option<i64>,
    #[serde(default)]
    pub nbf: Option<i64>,
    #[serde(default)]
    pub jti: Option<String>,
    #[serde(default)]
    pub project_id: Option<String>,
    #[serde(default)]
    pub sign_in_provider: Option<String>,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, JsonValue>,
}

impl Claims {
    /// Environment ID from the `envId:` audience entry.
    #[must_use]
    pub fn environment_id(&self) -> Option<&str> {
        self.audience_value("envId:")
    }

    /// Environment name from the `envName:` audience entry.
    #[must_use]
    pub fn environment_name(&self) -> Option<&str> {
        self.audience_value("envName:")
    }

    /// Expiry as a timestamp, if `exp` is present and in range.
    #[must_use]
    pub fn expires_at(&self) -> Option<OffsetDateTime> {
        self.exp
            .and_then(|exp| OffsetDateTime::from_unix_timestamp(exp).ok())
    }

    fn audience_value(&self, prefix: &str) -> Option<&str> {
        self.aud.iter().find_map(|a| a.strip_prefix(prefix))
    }
}

/// Decodes the payload of an identity token.
///
/// Returns `Ok(None)` when the token does not have exactly three
/// dot-separated segments. No signature or expiry check is performed.
///
/// # Errors
///
/// Returns `Error::Token` if the payload segment is not base64url-encoded JSON.
pub fn decode_claims(token: &str) -> Result<Option<Claims>, Error> {
    let parts: Vec<&str> = token.split('.').collect();
    let [_, payload_b64, _] = parts.as_slice() else {
        return Ok(None);
    };

    let payload = URL_SAFE_NO_PAD
        .decode(payload_b64.trim_end_matches('='))
        .map_err(|e| Error::Token(format!("invalid payload encoding: {e}")))?;

    let claims = serde_json::from_slice::<Claims>(&payload)
        .map_err(|e| Error::Token(format!("invalid payload: {e}")))?;

    Ok(Some(claims))
}

fn one_or_many<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }

    Ok(match Option::<OneOrMany>::deserialize(deserializer)? {
        Some(OneOrMany::One(a)) => vec![a],
        Some(OneOrMany::Many(a)) => a,
        None => Vec::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token_with_payload(payload: &str) -> String {
        format!(
            "{}.{}.signature",
            URL_SAFE_NO_PAD.encode(r#"{"alg":"RS256","typ":"JWT"}"#),
            URL_SAFE_NO_PAD.encode(payload)
        )
    }

    #[test]
    fn decodes_ugs_identity_token() {
        let token = token_with_payload(
            r#"{
                "iss": "https://player-auth.services.api.unity.com",
                "sub": "player-1",
                "aud": ["upid:proj-1", "envName:production", "envId:env-42"],
                "exp": 1700003600,
                "iat": 1700000000,
                "nbf": 1700000000,
                "project_id": "proj-1",
                "sign_in_provider": "anonymous",
                "token_type": "authenticationToken"
            }"#,
        );

        let claims = decode_claims(&token).unwrap().unwrap();

        assert_eq!(claims.sub.as_deref(), Some("player-1"));
        assert_eq!(claims.environment_id(), Some("env-42"));
        assert_eq!(claims.environment_name(), Some("production"));
        assert_eq!(claims.project_id.as_deref(), Some("proj-1"));
        assert_eq!(claims.expires_at().unwrap().unix_timestamp(), 1_700_003_600);
    }

    #[test]
    fn accepts_single_audience_string() {
        let token = token_with_payload(r#"{"sub":"p","aud":"envId:e1"}"#);
        let claims = decode_claims(&token).unwrap().unwrap();
        assert_eq!(claims.aud, vec!["envId:e1".to_string()]);
    }

    #[test]
    fn keeps_unknown_claims() {
        let token = token_with_payload(r#"{"sub":"p","custom":{"tier":2}}"#);
        let claims = decode_claims(&token).unwrap().unwrap();
        assert_eq!(claims.extra["custom"]["tier"], 2);
    }

    #[test]
    fn tolerates_padded_payload() {
        let payload = base64::engine::general_purpose::URL_SAFE.encode(r#"{"sub":"ab"}"#);
        let token = format!("h.{payload}.s");
        let claims = decode_claims(&token).unwrap().unwrap();
        assert_eq!(claims.sub.as_deref(), Some("ab"));
    }

    #[test]
    fn wrong_segment_count_yields_none() {
        assert!(decode_claims("").unwrap().is_none());
        assert!(decode_claims("only-one").unwrap().is_none());
        assert!(decode_claims("two.parts").unwrap().is_none());
        assert!(decode_claims("a.b.c.d").unwrap().is_none());
    }

    #[test]
    fn garbage_payload_is_an_error() {
        assert!(matches!(decode_claims("a.!!!.c"), Err(Error::Token(_))));

        let not_json = format!("a.{}.c", URL_SAFE_NO_PAD.encode("not json"));
        assert!(matches!(decode_claims(&not_json), Err(Error::Token(_))));
    }
}
