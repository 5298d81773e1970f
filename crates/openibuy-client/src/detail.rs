//! Shop-id fallback lookup against the REST detail endpoint
//!
//! Search results sometimes omit the shop id the order needs. The detail
//! endpoint knows it, under one of several field spellings and nesting
//! levels.

use async_trait::async_trait;
use tracing::debug;

use openibuy_extract::shop_id_from_detail;

use crate::auth::BearerToken;
use crate::error::{ClientError, Result};

/// Resolve a product's shop id from its detail record.
#[async_trait]
pub trait ShopDetailResolver: Send + Sync {
    async fn resolve(
        &self,
        item_id: &str,
        item_resource: &str,
        language: &str,
    ) -> Result<Option<String>>;
}

/// HTTP implementation against `<rest_base>/api/products/detail`.
pub struct HttpShopDetailResolver {
    rest_base: String,
    token: BearerToken,
    http: reqwest::Client,
}

impl HttpShopDetailResolver {
    pub fn new(rest_base: &str, token: BearerToken, http: reqwest::Client) -> Self {
        Self {
            rest_base: rest_base.trim_end_matches('/').to_string(),
            token,
            http,
        }
    }
}

#[async_trait]
impl ShopDetailResolver for HttpShopDetailResolver {
    async fn resolve(
        &self,
        item_id: &str,
        item_resource: &str,
        language: &str,
    ) -> Result<Option<String>> {
        let url = format!("{}/api/products/detail", self.rest_base);
        let resp = self
            .http
            .get(&url)
            .query(&[
                ("item_resource", item_resource),
                ("item_id", item_id),
                ("language", language),
            ])
            .bearer_auth(self.token.as_str())
            .send()
            .await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(ClientError::HttpStatus {
                status: status.as_u16(),
                body: resp.text().await.unwrap_or_default(),
            });
        }
        let payload: serde_json::Value = resp.json().await?;
        let shop_id = shop_id_from_detail(&payload);
        debug!(item_id = %item_id, shop_id = ?shop_id, "detail lookup");
        Ok(shop_id)
    }
}
