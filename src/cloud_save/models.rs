use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::types::{Links, Timestamp};

/// One stored key/value pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[non_exhaustive]
pub struct Item {
    pub key: String,
    pub value: JsonValue,
    #[serde(default)]
    pub write_lock: Option<String>,
    #[serde(default)]
    pub modified: Option<Timestamp>,
    #[serde(default)]
    pub created: Option<Timestamp>,
}

impl Item {
    /// Deserialize the stored value into `V`.
    ///
    /// # Errors
    ///
    /// Returns a JSON error if the value does not have the shape of `V`.
    pub fn value_as<V: serde::de::DeserializeOwned>(&self) -> Result<V, serde_json::Error> {
        V::deserialize(&self.value)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[non_exhaustive]
pub struct ItemsPage {
    #[serde(default)]
    pub results: Vec<Item>,
    #[serde(default)]
    pub links: Links,
}

/// Key with its metadata, without the value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[non_exhaustive]
pub struct KeyMetadata {
    pub key: String,
    #[serde(default)]
    pub write_lock: Option<String>,
    #[serde(default)]
    pub modified: Option<Timestamp>,
    #[serde(default)]
    pub created: Option<Timestamp>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[non_exhaustive]
pub struct KeysPage {
    #[serde(default)]
    pub results: Vec<KeyMetadata>,
    #[serde(default)]
    pub links: Links,
}

/// Write lock assigned to a saved item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[non_exhaustive]
pub struct SavedItem {
    #[serde(default)]
    pub key: Option<String>,
    pub write_lock: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SavedItems {
    #[serde(default)]
    pub(crate) results: Vec<SavedItem>,
}

/// Metadata of a stored player file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[non_exhaustive]
pub struct FileItem {
    pub key: String,
    #[serde(default)]
    pub size: u64,
    #[serde(default)]
    pub content_type: Option<String>,
    #[serde(default)]
    pub write_lock: Option<String>,
    #[serde(default)]
    pub modified: Option<Timestamp>,
    #[serde(default)]
    pub created: Option<Timestamp>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[non_exhaustive]
pub struct FilesPage {
    #[serde(default)]
    pub results: Vec<FileItem>,
    #[serde(default)]
    pub links: Links,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SetItemRequest<'a> {
    pub(crate) key: &'a str,
    pub(crate) value: JsonValue,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) write_lock: Option<&'a str>,
}

#[derive(Debug, Serialize)]
pub(crate) struct SetItemBatchRequest<'a> {
    pub(crate) data: Vec<SetItemRequest<'a>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn item_parses_wrapped_dates() {
        let body = r#"{
            "key": "level",
            "value": {"stage": 3},
            "writeLock": "w1",
            "modified": {"date": "2024-02-01T12:00:00Z"},
            "created": {"date": "2024-01-01T12:00:00.5Z"}
        }"#;
        let item: Item = serde_json::from_str(body).unwrap();

        assert_eq!(item.write_lock.as_deref(), Some("w1"));
        assert_eq!(item.created.unwrap().date.year(), 2024);

        #[derive(Deserialize)]
        struct Level {
            stage: u32,
        }
        assert_eq!(item.value_as::<Level>().unwrap().stage, 3);
    }

    #[test]
    fn set_item_omits_missing_write_lock() {
        let body = serde_json::to_value(SetItemRequest {
            key: "k",
            value: serde_json::json!(1),
            write_lock: None,
        })
        .unwrap();
        assert_eq!(body, serde_json::json!({"key": "k", "value": 1}));
    }
}
