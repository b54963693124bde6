use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

use crate::types::{Links, Timestamp};

/// Kind of a published Economy resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[non_exhaustive]
pub enum ConfigItemKind {
    Currency,
    InventoryItem,
    VirtualPurchase,
    MoneyPurchase,
    #[serde(other)]
    Unknown,
}

/// One published Economy resource definition.
///
/// Kind-specific members (`initial`, `max`, `costs`, `rewards`, ...) are
/// kept in [`definition`](ConfigItem::definition).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[non_exhaustive]
pub struct ConfigItem {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: ConfigItemKind,
    #[serde(default)]
    pub custom_data: Option<JsonValue>,
    #[serde(default)]
    pub created: Option<Timestamp>,
    #[serde(default)]
    pub modified: Option<Timestamp>,
    #[serde(flatten)]
    pub definition: Map<String, JsonValue>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ConfigResponse {
    #[serde(default)]
    pub(crate) results: Vec<ConfigItem>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[non_exhaustive]
pub struct CurrencyBalance {
    pub currency_id: String,
    pub balance: i64,
    #[serde(default)]
    pub write_lock: Option<String>,
    #[serde(default)]
    pub created: Option<Timestamp>,
    #[serde(default)]
    pub modified: Option<Timestamp>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[non_exhaustive]
pub struct BalancesPage {
    #[serde(default)]
    pub results: Vec<CurrencyBalance>,
    #[serde(default)]
    pub links: Links,
}

/// Inventory item instance owned by the player.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[non_exhaustive]
pub struct PlayersInventoryItem {
    pub players_inventory_item_id: String,
    pub inventory_item_id: String,
    #[serde(default)]
    pub instance_data: Option<JsonValue>,
    #[serde(default)]
    pub write_lock: Option<String>,
    #[serde(default)]
    pub created: Option<Timestamp>,
    #[serde(default)]
    pub modified: Option<Timestamp>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[non_exhaustive]
pub struct InventoryPage {
    #[serde(default)]
    pub results: Vec<PlayersInventoryItem>,
    #[serde(default)]
    pub links: Links,
}

/// Currency amount moved by a purchase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[non_exhaustive]
pub struct CurrencyExchange {
    pub id: String,
    pub amount: i64,
}

/// Inventory items moved by a purchase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[non_exhaustive]
pub struct InventoryExchange {
    pub id: String,
    pub amount: i64,
    #[serde(default)]
    pub players_inventory_item_ids: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[non_exhaustive]
pub struct PurchaseExchanges {
    #[serde(default)]
    pub currency: Vec<CurrencyExchange>,
    #[serde(default)]
    pub inventory: Vec<InventoryExchange>,
}

/// What a virtual purchase cost and granted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[non_exhaustive]
pub struct VirtualPurchaseResult {
    #[serde(default)]
    pub costs: PurchaseExchanges,
    #[serde(default)]
    pub rewards: PurchaseExchanges,
}

/// Optional settings for adding an inventory item.
#[derive(Debug, Clone, Default)]
#[non_exhaustive]
pub struct AddInventoryItemOptions {
    pub players_inventory_item_id: Option<String>,
    pub instance_data: Option<JsonValue>,
}

impl AddInventoryItemOptions {
    /// Choose the instance ID instead of letting the service generate one.
    #[must_use]
    pub fn with_players_inventory_item_id(mut self, id: impl Into<String>) -> Self {
        self.players_inventory_item_id = Some(id.into());
        self
    }

    #[must_use]
    pub fn with_instance_data(mut self, data: JsonValue) -> Self {
        self.instance_data = Some(data);
        self
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SetBalanceRequest<'a> {
    pub(crate) balance: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) write_lock: Option<&'a str>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct AmountRequest<'a> {
    pub(crate) amount: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) write_lock: Option<&'a str>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct AddInventoryRequest<'a> {
    pub(crate) inventory_item_id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) players_inventory_item_id: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) instance_data: Option<&'a JsonValue>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct InstanceDataRequest<'a> {
    pub(crate) instance_data: &'a JsonValue,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) write_lock: Option<&'a str>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct VirtualPurchaseRequest<'a> {
    pub(crate) id: &'a str,
    #[serde(skip_serializing_if = "is_empty")]
    pub(crate) players_inventory_item_ids: &'a [String],
}

fn is_empty(ids: &&[String]) -> bool {
    ids.is_empty()
}
