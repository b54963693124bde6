//! Player key/value data and file metadata.

mod models;

use std::collections::BTreeMap;
use std::sync::Arc;

use reqwest::Method;
use serde::Serialize;

use crate::config::ServicesConfig;
use crate::error::{Error, ServiceKind};
use crate::services::PlayerCredentials;
use crate::transport::{ReqwestTransport, RestClient, Transport};

pub use models::{FileItem, FilesPage, Item, ItemsPage, KeyMetadata, KeysPage, SavedItem};
use models::{SavedItems, SetItemBatchRequest, SetItemRequest};

const MAX_KEY_LEN: usize = 255;

/// Cloud Save client for the signed-in player.
#[derive(Debug)]
pub struct CloudSave<T = ReqwestTransport> {
    rest: RestClient<T>,
}

impl<T: Transport> CloudSave<T> {
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the Cloud Save base URL cannot carry a path.
    pub fn new(
        config: &ServicesConfig,
        transport: Arc<T>,
        credentials: &PlayerCredentials,
    ) -> Result<Self, Error> {
        let rest = RestClient::new(
            ServiceKind::CloudSave,
            transport,
            config,
            config.cloud_save_url(),
            &[
                "v1",
                "data",
                "projects",
                config.project_id(),
                "players",
                credentials.player_id.as_str(),
            ],
        )?
        .with_bearer(&credentials.access_token);
        Ok(Self { rest })
    }

    /// Store one value. With `write_lock`, the write only succeeds if the
    /// stored item still carries that lock.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] for an invalid key,
    /// [`Error::Service`] if the write is rejected (409 on a lock mismatch).
    pub async fn save_item<V: Serialize + ?Sized>(
        &self,
        key: &str,
        value: &V,
        write_lock: Option<&str>,
    ) -> Result<SavedItem, Error> {
        validate_key(key)?;
        let request = SetItemRequest {
            key,
            value: serde_json::to_value(value)?,
            write_lock,
        };
        let url = self.rest.url(&["items"], &[])?;
        let mut saved: SavedItem = self
            .rest
            .send_json(Method::POST, url, &request, "save item")
            .await?;
        saved.key.get_or_insert_with(|| key.to_owned());
        Ok(saved)
    }

    /// Store several values in one request.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if any key is invalid,
    /// [`Error::Service`] if the batch is rejected.
    pub async fn save_items<V: Serialize>(
        &self,
        items: &BTreeMap<String, V>,
    ) -> Result<Vec<SavedItem>, Error> {
        if items.is_empty() {
            return Ok(Vec::new());
        }
        let data = items
            .iter()
            .map(|(key, value)| {
                validate_key(key)?;
                Ok(SetItemRequest {
                    key,
                    value: serde_json::to_value(value)?,
                    write_lock: None,
                })
            })
            .collect::<Result<Vec<_>, Error>>()?;

        let url = self.rest.url(&["item-batch"], &[])?;
        let saved: SavedItems = self
            .rest
            .send_json(Method::POST, url, &SetItemBatchRequest { data }, "save items")
            .await?;
        Ok(saved.results)
    }

    /// Load items by key; an empty `keys` loads every item. Pass the previous
    /// page's last key as `after` to continue.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] for an invalid key,
    /// [`Error::Service`] if the request is rejected.
    pub async fn load_items(&self, keys: &[&str], after: Option<&str>) -> Result<ItemsPage, Error> {
        let mut query = Vec::with_capacity(keys.len() + 1);
        for key in keys {
            validate_key(key)?;
            query.push(("keys", (*key).to_owned()));
        }
        if let Some(after) = after {
            query.push(("after", after.to_owned()));
        }
        let url = self.rest.url(&["items"], &query)?;
        self.rest.get(url, "load items").await
    }

    /// # Errors
    ///
    /// Returns [`Error::Service`] if the request is rejected.
    pub async fn list_keys(&self, after: Option<&str>) -> Result<KeysPage, Error> {
        let query: Vec<_> = after.map(|a| ("after", a.to_owned())).into_iter().collect();
        let url = self.rest.url(&["keys"], &query)?;
        self.rest.get(url, "list keys").await
    }

    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] for an invalid key,
    /// [`Error::Service`] if the deletion is rejected.
    pub async fn delete_item(&self, key: &str, write_lock: Option<&str>) -> Result<(), Error> {
        validate_key(key)?;
        let query: Vec<_> = write_lock
            .map(|w| ("writeLock", w.to_owned()))
            .into_iter()
            .collect();
        let url = self.rest.url(&["items", key], &query)?;
        self.rest
            .execute(Method::DELETE, url, None, "delete item")
            .await
    }

    /// Delete every item of the player.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Service`] if the deletion is rejected.
    pub async fn delete_all_items(&self) -> Result<(), Error> {
        let url = self.rest.url(&["items"], &[])?;
        self.rest
            .execute(Method::DELETE, url, None, "delete all items")
            .await
    }

    /// # Errors
    ///
    /// Returns [`Error::Service`] if the request is rejected.
    pub async fn list_files(&self, after: Option<&str>) -> Result<FilesPage, Error> {
        let query: Vec<_> = after.map(|a| ("after", a.to_owned())).into_iter().collect();
        let url = self.rest.url(&["files"], &query)?;
        self.rest.get(url, "list files").await
    }

    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] for an invalid key,
    /// [`Error::Service`] if the file does not exist.
    pub async fn file_metadata(&self, key: &str) -> Result<FileItem, Error> {
        validate_key(key)?;
        let url = self.rest.url(&["files", key, "metadata"], &[])?;
        self.rest.get(url, "get file metadata").await
    }
}

/// Keys are 1-255 characters of ASCII letters, digits, `-` and `_`.
fn validate_key(key: &str) -> Result<(), Error> {
    let valid = !key.is_empty()
        && key.len() <= MAX_KEY_LEN
        && key
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_');
    if valid {
        Ok(())
    } else {
        Err(Error::InvalidArgument(format!("invalid Cloud Save key '{key}'")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_keys() {
        assert!(validate_key("level").is_ok());
        assert!(validate_key("save_slot-2").is_ok());
        assert!(validate_key(&"k".repeat(255)).is_ok());
    }

    #[test]
    fn test_invalid_keys() {
        assert!(validate_key("").is_err());
        assert!(validate_key("with space").is_err());
        assert!(validate_key("slash/key").is_err());
        assert!(validate_key(&"k".repeat(256)).is_err());
    }
}
