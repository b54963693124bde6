//! Currencies, inventory and virtual purchases.

mod models;

use std::sync::Arc;

use reqwest::Method;
use serde_json::Value as JsonValue;

use crate::config::ServicesConfig;
use crate::error::{Error, ServiceKind};
use crate::services::PlayerCredentials;
use crate::transport::{ReqwestTransport, RestClient, Transport};

pub use models::{
    AddInventoryItemOptions, BalancesPage, ConfigItem, ConfigItemKind, CurrencyBalance,
    CurrencyExchange, InventoryExchange, InventoryPage, PlayersInventoryItem, PurchaseExchanges,
    VirtualPurchaseResult,
};
use models::{
    AddInventoryRequest, AmountRequest, ConfigResponse, InstanceDataRequest, SetBalanceRequest,
    VirtualPurchaseRequest,
};

/// Economy client for the signed-in player.
#[derive(Debug)]
pub struct Economy<T = ReqwestTransport> {
    rest: RestClient<T>,
}

impl<T: Transport> Economy<T> {
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the Economy base URL cannot carry a path.
    pub fn new(
        config: &ServicesConfig,
        transport: Arc<T>,
        credentials: &PlayerCredentials,
    ) -> Result<Self, Error> {
        let rest = RestClient::new(
            ServiceKind::Economy,
            transport,
            config,
            config.economy_url(),
            &[
                "v2",
                "projects",
                config.project_id(),
                "players",
                credentials.player_id.as_str(),
            ],
        )?
        .with_bearer(&credentials.access_token);
        Ok(Self { rest })
    }

    /// Published resource definitions (currencies, items, purchases) as seen by this player.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Service`] if the request is rejected.
    pub async fn configuration(&self) -> Result<Vec<ConfigItem>, Error> {
        let url = self
            .rest
            .url(&["configs", "published", "resources"], &[])?;
        let response: ConfigResponse = self.rest.get(url, "get configuration").await?;
        Ok(response.results)
    }

    /// # Errors
    ///
    /// Returns [`Error::Service`] if the request is rejected.
    pub async fn balances(
        &self,
        limit: Option<u32>,
        after: Option<&str>,
    ) -> Result<BalancesPage, Error> {
        let url = self.rest.url(&["currencies"], &cursor_query(limit, after))?;
        self.rest.get(url, "get balances").await
    }

    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] for a negative balance,
    /// [`Error::Service`] if the write is rejected.
    pub async fn set_balance(
        &self,
        currency_id: &str,
        balance: i64,
        write_lock: Option<&str>,
    ) -> Result<CurrencyBalance, Error> {
        if balance < 0 {
            return Err(Error::InvalidArgument(format!(
                "balance of '{currency_id}' cannot be negative"
            )));
        }
        let url = self.rest.url(&["currencies", currency_id], &[])?;
        self.rest
            .send_json(
                Method::PUT,
                url,
                &SetBalanceRequest {
                    balance,
                    write_lock,
                },
                "set balance",
            )
            .await
    }

    /// # Errors
    ///
    /// Returns [`Error::Service`] if the change is rejected (for example past the currency max).
    pub async fn increment_balance(
        &self,
        currency_id: &str,
        amount: i64,
        write_lock: Option<&str>,
    ) -> Result<CurrencyBalance, Error> {
        self.change_balance(currency_id, "increment", amount, write_lock, "increment balance")
            .await
    }

    /// # Errors
    ///
    /// Returns [`Error::Service`] if the change is rejected (for example an insufficient balance).
    pub async fn decrement_balance(
        &self,
        currency_id: &str,
        amount: i64,
        write_lock: Option<&str>,
    ) -> Result<CurrencyBalance, Error> {
        self.change_balance(currency_id, "decrement", amount, write_lock, "decrement balance")
            .await
    }

    /// # Errors
    ///
    /// Returns [`Error::Service`] if the request is rejected.
    pub async fn inventory(
        &self,
        limit: Option<u32>,
        after: Option<&str>,
    ) -> Result<InventoryPage, Error> {
        let url = self.rest.url(&["inventory"], &cursor_query(limit, after))?;
        self.rest.get(url, "get inventory").await
    }

    /// Grant an instance of `inventory_item_id` to the player.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Service`] if the item does not exist or the grant is rejected.
    pub async fn add_inventory_item(
        &self,
        inventory_item_id: &str,
        options: &AddInventoryItemOptions,
    ) -> Result<PlayersInventoryItem, Error> {
        let url = self.rest.url(&["inventory"], &[])?;
        self.rest
            .send_json(
                Method::POST,
                url,
                &AddInventoryRequest {
                    inventory_item_id,
                    players_inventory_item_id: options.players_inventory_item_id.as_deref(),
                    instance_data: options.instance_data.as_ref(),
                },
                "add inventory item",
            )
            .await
    }

    /// # Errors
    ///
    /// Returns [`Error::Service`] if the instance does not exist or the write is rejected.
    pub async fn update_inventory_item(
        &self,
        players_inventory_item_id: &str,
        instance_data: &JsonValue,
        write_lock: Option<&str>,
    ) -> Result<PlayersInventoryItem, Error> {
        let url = self
            .rest
            .url(&["inventory", players_inventory_item_id], &[])?;
        self.rest
            .send_json(
                Method::PUT,
                url,
                &InstanceDataRequest {
                    instance_data,
                    write_lock,
                },
                "update inventory item",
            )
            .await
    }

    /// # Errors
    ///
    /// Returns [`Error::Service`] if the instance does not exist.
    pub async fn delete_inventory_item(
        &self,
        players_inventory_item_id: &str,
        write_lock: Option<&str>,
    ) -> Result<(), Error> {
        let url = self
            .rest
            .url(&["inventory", players_inventory_item_id], &[])?;
        let body = write_lock.map(|w| serde_json::json!({ "writeLock": w }));
        self.rest
            .execute(Method::DELETE, url, body, "delete inventory item")
            .await
    }

    /// Execute a configured virtual purchase. `players_inventory_item_ids`
    /// picks which owned instances pay an inventory cost; leave empty to let
    /// the service choose.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Service`] if the player cannot afford the purchase.
    pub async fn make_virtual_purchase(
        &self,
        purchase_id: &str,
        players_inventory_item_ids: &[String],
    ) -> Result<VirtualPurchaseResult, Error> {
        let url = self.rest.url(&["purchases", "virtual"], &[])?;
        self.rest
            .send_json(
                Method::POST,
                url,
                &VirtualPurchaseRequest {
                    id: purchase_id,
                    players_inventory_item_ids,
                },
                "virtual purchase",
            )
            .await
    }

    async fn change_balance(
        &self,
        currency_id: &str,
        direction: &'static str,
        amount: i64,
        write_lock: Option<&str>,
        operation: &'static str,
    ) -> Result<CurrencyBalance, Error> {
        if amount <= 0 {
            return Err(Error::InvalidArgument(format!(
                "{operation} amount must be positive, got {amount}"
            )));
        }
        let url = self.rest.url(&["currencies", currency_id, direction], &[])?;
        self.rest
            .send_json(
                Method::POST,
                url,
                &AmountRequest { amount, write_lock },
                operation,
            )
            .await
    }
}

fn cursor_query(limit: Option<u32>, after: Option<&str>) -> Vec<(&'static str, String)> {
    let mut query = Vec::new();
    if let Some(limit) = limit {
        query.push(("limit", limit.to_string()));
    }
    if let Some(after) = after {
        query.push(("after", after.to_owned()));
    }
    query
}
