//! User-generated content: items, representations, tags and subscriptions.

mod models;

use std::sync::Arc;

use reqwest::Method;

use crate::config::ServicesConfig;
use crate::error::{Error, ServiceKind};
use crate::services::PlayerCredentials;
use crate::transport::{ReqwestTransport, RestClient, Transport};
use crate::types::Page;

pub use models::{
    Content, ContentVisibility, CreateContentRequest, NewContent, Representation, Subscription,
    Tag, UpdateContentRequest,
};
use models::{ListResponse, SubscribeRequest};

/// UGC client for the signed-in player, scoped to the environment of its identity token.
#[derive(Debug)]
pub struct Ugc<T = ReqwestTransport> {
    rest: RestClient<T>,
}

impl<T: Transport> Ugc<T> {
    /// # Errors
    ///
    /// Returns [`Error::InvalidOperation`] if `credentials` carry no
    /// environment ID, [`Error::Config`] if the UGC base URL cannot carry a path.
    pub fn new(
        config: &ServicesConfig,
        transport: Arc<T>,
        credentials: &PlayerCredentials,
    ) -> Result<Self, Error> {
        let environment_id = credentials.environment_id.as_deref().ok_or_else(|| {
            Error::InvalidOperation("UGC needs an environment ID in the identity token".to_owned())
        })?;
        let rest = RestClient::new(
            ServiceKind::Ugc,
            transport,
            config,
            config.ugc_url(),
            &[
                "v1",
                "projects",
                config.project_id(),
                "environments",
                environment_id,
            ],
        )?
        .with_bearer(&credentials.access_token);
        Ok(Self { rest })
    }

    /// # Errors
    ///
    /// Returns [`Error::Service`] (404) if the content does not exist.
    pub async fn content(&self, content_id: &str) -> Result<Content, Error> {
        let url = self.rest.url(&["content", content_id], &[])?;
        self.rest.get(url, "get content").await
    }

    /// Create a content entry. The payload and thumbnail are then uploaded
    /// by the caller to the returned URLs.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] for an empty name,
    /// [`Error::Service`] if the request is rejected.
    pub async fn create_content(&self, request: &CreateContentRequest) -> Result<NewContent, Error> {
        if request.name.trim().is_empty() {
            return Err(Error::InvalidArgument("content name is required".to_owned()));
        }
        let url = self.rest.url(&["content"], &[])?;
        self.rest
            .send_json(Method::POST, url, request, "create content")
            .await
    }

    /// # Errors
    ///
    /// Returns [`Error::Service`] if the player does not own the content.
    pub async fn update_content_details(
        &self,
        content_id: &str,
        request: &UpdateContentRequest,
    ) -> Result<Content, Error> {
        let url = self.rest.url(&["content", content_id, "details"], &[])?;
        self.rest
            .send_json(Method::PUT, url, request, "update content details")
            .await
    }

    /// # Errors
    ///
    /// Returns [`Error::Service`] if the player does not own the content.
    pub async fn delete_content(&self, content_id: &str) -> Result<(), Error> {
        let url = self.rest.url(&["content", content_id], &[])?;
        self.rest
            .execute(Method::DELETE, url, None, "delete content")
            .await
    }

    /// # Errors
    ///
    /// Returns [`Error::Service`] (404) if the content does not exist.
    pub async fn representations(&self, content_id: &str) -> Result<Vec<Representation>, Error> {
        let url = self
            .rest
            .url(&["content", content_id, "representations"], &[])?;
        let response: ListResponse<Representation> =
            self.rest.get(url, "get representations").await?;
        Ok(response.into_vec())
    }

    /// Tags defined for the environment.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Service`] if the request is rejected.
    pub async fn tags(&self) -> Result<Vec<Tag>, Error> {
        let url = self.rest.url(&["tags"], &[])?;
        let response: ListResponse<Tag> = self.rest.get(url, "get tags").await?;
        Ok(response.into_vec())
    }

    /// # Errors
    ///
    /// Returns [`Error::Service`] if the content does not exist.
    pub async fn subscribe(&self, content_id: &str) -> Result<Subscription, Error> {
        let url = self.rest.url(&["subscriptions"], &[])?;
        self.rest
            .send_json(
                Method::POST,
                url,
                &SubscribeRequest { content_id },
                "subscribe",
            )
            .await
    }

    /// # Errors
    ///
    /// Returns [`Error::Service`] if the player is not subscribed.
    pub async fn unsubscribe(&self, content_id: &str) -> Result<(), Error> {
        let url = self.rest.url(&["subscriptions", content_id], &[])?;
        self.rest
            .execute(Method::DELETE, url, None, "unsubscribe")
            .await
    }

    /// # Errors
    ///
    /// Returns [`Error::Service`] if the request is rejected.
    pub async fn subscriptions(
        &self,
        offset: u32,
        limit: u32,
    ) -> Result<Page<Subscription>, Error> {
        let query = [("offset", offset.to_string()), ("limit", limit.to_string())];
        let url = self.rest.url(&["subscriptions"], &query)?;
        self.rest.get(url, "get subscriptions").await
    }
}
