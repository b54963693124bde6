use std::future::Future;
use std::sync::Arc;

use reqwest::Method;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;
use url::Url;

use crate::config::ServicesConfig;
use crate::error::{Error, Problem, ServiceKind};

/// A fully built JSON request.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: Method,
    pub url: Url,
    pub headers: Vec<(String, String)>,
    pub body: Option<JsonValue>,
}

impl HttpRequest {
    /// Header value by case-insensitive name.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Status and raw body of a response.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Executes HTTP requests on behalf of the service clients.
///
/// [`ReqwestTransport`] is the production implementation; tests substitute
/// a scripted one.
pub trait Transport: Send + Sync + 'static {
    /// Send one request and return the response, whatever its status.
    ///
    /// Only connection-level failures are errors here.
    fn execute(
        &self,
        request: HttpRequest,
    ) -> impl Future<Output = Result<HttpResponse, Error>> + Send;
}

/// [`Transport`] backed by `reqwest`.
#[derive(Debug, Clone, Default)]
pub struct ReqwestTransport {
    http: reqwest::Client,
}

impl ReqwestTransport {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a custom HTTP client (for connection pool reuse, proxies or timeouts).
    #[must_use]
    pub fn with_http_client(mut self, client: reqwest::Client) -> Self {
        self.http = client;
        self
    }
}

impl Transport for ReqwestTransport {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, Error> {
        let mut builder = self.http.request(request.method, request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;
        Ok(HttpResponse { status, body })
    }
}

/// JSON client for one service: base URL, project headers and an optional
/// bearer token fixed at construction.
pub(crate) struct RestClient<T> {
    transport: Arc<T>,
    service: ServiceKind,
    base: Url,
    headers: Vec<(String, String)>,
}

impl<T> std::fmt::Debug for RestClient<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RestClient")
            .field("service", &self.service)
            .field("base", &self.base.as_str())
            .finish_non_exhaustive()
    }
}

impl<T: Transport> RestClient<T> {
    /// Client rooted at `base` extended with `prefix` path segments.
    pub(crate) fn new(
        service: ServiceKind,
        transport: Arc<T>,
        config: &ServicesConfig,
        base: &Url,
        prefix: &[&str],
    ) -> Result<Self, Error> {
        let base = extend_path(service, base, prefix)?;
        Ok(Self {
            transport,
            service,
            base,
            headers: vec![
                ("ProjectId".into(), config.project_id().to_owned()),
                ("UnityEnvironment".into(), config.environment().to_owned()),
            ],
        })
    }

    #[must_use]
    pub(crate) fn with_bearer(mut self, access_token: &str) -> Self {
        self.headers
            .push(("Authorization".into(), format!("Bearer {access_token}")));
        self
    }

    /// URL for `segments` under the base path, with non-empty query pairs.
    pub(crate) fn url(&self, segments: &[&str], query: &[(&str, String)]) -> Result<Url, Error> {
        let mut url = extend_path(self.service, &self.base, segments)?;
        if !query.is_empty() {
            url.query_pairs_mut()
                .extend_pairs(query.iter().map(|(k, v)| (*k, v.as_str())));
        }
        Ok(url)
    }

    pub(crate) async fn get<R: DeserializeOwned>(
        &self,
        url: Url,
        operation: &'static str,
    ) -> Result<R, Error> {
        let response = self.send(Method::GET, url, None, operation).await?;
        parse(&response)
    }

    pub(crate) async fn send_json<B, R>(
        &self,
        method: Method,
        url: Url,
        body: &B,
        operation: &'static str,
    ) -> Result<R, Error>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let body = serde_json::to_value(body)?;
        let response = self.send(method, url, Some(body), operation).await?;
        parse(&response)
    }

    /// Sends a request whose success body is ignored.
    pub(crate) async fn execute(
        &self,
        method: Method,
        url: Url,
        body: Option<JsonValue>,
        operation: &'static str,
    ) -> Result<(), Error> {
        self.send(method, url, body, operation).await.map(|_| ())
    }

    async fn send(
        &self,
        method: Method,
        url: Url,
        body: Option<JsonValue>,
        operation: &'static str,
    ) -> Result<HttpResponse, Error> {
        tracing::debug!(service = %self.service, operation, %method, path = url.path(), "UGS request");

        let request = HttpRequest {
            method,
            url,
            headers: self.headers.clone(),
            body,
        };
        let response = self.transport.execute(request).await?;
        self.ensure_success(response, operation)
    }

    /// Checks the response status; returns the response on success or the parsed problem.
    fn ensure_success(
        &self,
        response: HttpResponse,
        operation: &'static str,
    ) -> Result<HttpResponse, Error> {
        if response.is_success() {
            return Ok(response);
        }
        let problem = Problem::from_response(response.status, &response.body);
        tracing::warn!(
            service = %self.service,
            operation,
            status = response.status,
            "UGS request rejected"
        );
        Err(Error::Service {
            service: self.service,
            operation,
            problem,
        })
    }
}

fn extend_path(service: ServiceKind, base: &Url, segments: &[&str]) -> Result<Url, Error> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|()| Error::Config(format!("{service} base URL cannot be a base: {base}")))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

fn parse<R: DeserializeOwned>(response: &HttpResponse) -> Result<R, Error> {
    serde_json::from_str(&response.body).map_err(Into::into)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NoopTransport;

    impl Transport for NoopTransport {
        async fn execute(&self, _request: HttpRequest) -> Result<HttpResponse, Error> {
            Ok(HttpResponse {
                status: 204,
                body: String::new(),
            })
        }
    }

    fn client() -> RestClient<NoopTransport> {
        let config = ServicesConfig::new("proj-1").with_environment("dev");
        RestClient::new(
            ServiceKind::CloudSave,
            Arc::new(NoopTransport),
            &config,
            config.cloud_save_url(),
            &["v1", "data", "projects", "proj-1"],
        )
        .unwrap()
    }

    #[test]
    fn url_encodes_segments() {
        let url = client().url(&["items", "a b/c"], &[]).unwrap();
        assert_eq!(
            url.as_str(),
            "https://cloud-save.services.api.unity.com/v1/data/projects/proj-1/items/a%20b%2Fc"
        );
    }

    #[test]
    fn url_appends_query_only_when_present() {
        let client = client();
        let plain = client.url(&["keys"], &[]).unwrap();
        assert!(plain.query().is_none());

        let paged = client
            .url(&["keys"], &[("after", "k1".to_string()), ("limit", "5".to_string())])
            .unwrap();
        assert_eq!(paged.query(), Some("after=k1&limit=5"));
    }

    #[test]
    fn bearer_header_is_added() {
        let client = client().with_bearer("tok");
        assert!(client
            .headers
            .iter()
            .any(|(n, v)| n == "Authorization" && v == "Bearer tok"));
        assert!(client.headers.iter().any(|(n, v)| n == "ProjectId" && v == "proj-1"));
        assert!(client.headers.iter().any(|(n, v)| n == "UnityEnvironment" && v == "dev"));
    }

    #[test]
    fn ensure_success_wraps_problem() {
        let err = client()
            .ensure_success(
                HttpResponse {
                    status: 400,
                    body: r#"{"title":"Bad Request","detail":"invalid key"}"#.into(),
                },
                "save item",
            )
            .unwrap_err();

        assert_eq!(err.service(), Some(ServiceKind::CloudSave));
        assert_eq!(err.problem().unwrap().detail.as_deref(), Some("invalid key"));
    }
}
