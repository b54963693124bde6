use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value as JsonValue};

/// Backend service that produced an error response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, derive_more::Display)]
#[non_exhaustive]
pub enum ServiceKind {
    #[display("authentication")]
    Authentication,
    #[display("cloud save")]
    CloudSave,
    #[display("economy")]
    Economy,
    #[display("friends")]
    Friends,
    #[display("leaderboards")]
    Leaderboards,
    #[display("player names")]
    PlayerNames,
    #[display("ugc")]
    Ugc,
}

#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-2xx response from a service.
    #[error("{service} {operation} failed: {problem}")]
    Service {
        service: ServiceKind,
        operation: &'static str,
        problem: Problem,
    },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    #[error("Token error: {0}")]
    Token(String),

    #[error("Credential cache error: {0}")]
    Cache(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Problem details of a service error response.
    #[must_use]
    pub fn problem(&self) -> Option<&Problem> {
        match self {
            Self::Service { problem, .. } => Some(problem),
            _ => None,
        }
    }

    /// HTTP status of a service error response.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        self.problem().and_then(|p| p.status)
    }

    /// Which service rejected the request, if any.
    #[must_use]
    pub fn service(&self) -> Option<ServiceKind> {
        match self {
            Self::Service { service, .. } => Some(*service),
            _ => None,
        }
    }
}

/// Problem-details body returned by every UGS service on failure.
///
/// Service-specific members (`errors`, `details`, ...) that are not modelled
/// here are kept in [`extensions`](Problem::extensions).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[non_exhaustive]
pub struct Problem {
    #[serde(rename = "type", default, deserialize_with = "lenient_text")]
    pub kind: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "lenient_status")]
    pub status: Option<u16>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub detail: Option<String>,
    #[serde(default, deserialize_with = "lenient_code")]
    pub code: Option<i64>,
    #[serde(default, deserialize_with = "lenient_details")]
    pub details: Vec<JsonValue>,
    #[serde(flatten)]
    pub extensions: Map<String, JsonValue>,
}

// Problem members are parsed leniently: a member of an unexpected shape
// must not discard the rest of the body.

fn lenient_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    Ok(match JsonValue::deserialize(deserializer)? {
        JsonValue::Null => None,
        JsonValue::String(s) => Some(s),
        other => Some(other.to_string()),
    })
}

fn lenient_status<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u16>, D::Error> {
    Ok(match JsonValue::deserialize(deserializer)? {
        JsonValue::Number(n) => n.as_u64().and_then(|n| u16::try_from(n).ok()),
        JsonValue::String(s) => s.trim().parse().ok(),
        _ => None,
    })
}

fn lenient_code<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<i64>, D::Error> {
    Ok(match JsonValue::deserialize(deserializer)? {
        JsonValue::Number(n) => n.as_i64(),
        JsonValue::String(s) => s.trim().parse().ok(),
        _ => None,
    })
}

fn lenient_details<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Vec<JsonValue>, D::Error> {
    Ok(match JsonValue::deserialize(deserializer)? {
        JsonValue::Null => Vec::new(),
        JsonValue::Array(items) => items,
        other => vec![other],
    })
}

impl Problem {
    /// Parses an error response body.
    ///
    /// Bodies that are not a JSON object are kept verbatim as `detail`.
    #[must_use]
    pub fn from_response(status: u16, body: &str) -> Self {
        match serde_json::from_str::<Self>(body) {
            Ok(mut problem) => {
                problem.status.get_or_insert(status);
                problem
            }
            Err(_) => Self {
                status: Some(status),
                detail: (!body.is_empty()).then(|| body.to_owned()),
                ..Self::default()
            },
        }
    }
}

impl std::fmt::Display for Problem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(status) = self.status {
            write!(f, "{status}")?;
        }
        if let Some(title) = &self.title {
            write!(f, " {title}")?;
        }
        if let Some(detail) = &self.detail {
            write!(f, ": {detail}")?;
        }
        Ok(())
    }
}
