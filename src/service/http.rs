//! HTTP client for the storefront cart and pricing API.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::{
    items::{ProductRef, VariantKey},
    lock::PriceLock,
    service::{CartService, CartServiceError, NewItem, PricingService, UnitQuote},
    snapshot::CartSnapshot,
};

/// Configuration for connecting to the storefront API.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// API base address, e.g. `"https://api.example.com/api/v1"`.
    pub base_url: String,

    /// Bearer token for the shopper's session, when authenticated.
    pub bearer_token: Option<String>,
}

/// HTTP client implementing both external service contracts against the
/// storefront API.
///
/// All successful responses arrive wrapped in a `{ "data": … }` envelope.
#[derive(Debug, Clone)]
pub struct StorefrontClient {
    config: StorefrontConfig,
    http: Client,
}

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    data: T,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

impl StorefrontClient {
    /// Create a new client from the given configuration.
    #[must_use]
    pub fn new(config: StorefrontConfig) -> Self {
        Self {
            config,
            http: Client::new(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.config.base_url)
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, CartServiceError> {
        let request = match &self.config.bearer_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        };

        let response = request.send().await?;

        if response.status().is_success() {
            return Ok(response);
        }

        let status = response.status();
        let message = response
            .json::<ErrorBody>()
            .await
            .ok()
            .and_then(|body| body.message)
            .unwrap_or_else(|| format!("request failed with status {status}"));

        Err(match status {
            StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
                CartServiceError::Validation(message)
            }
            StatusCode::NOT_FOUND => CartServiceError::NotFound,
            StatusCode::CONFLICT => CartServiceError::Conflict(message),
            _ => CartServiceError::UnexpectedResponse(message),
        })
    }

    async fn unwrap_envelope<T: DeserializeOwned>(
        response: Response,
    ) -> Result<T, CartServiceError> {
        let envelope: Envelope<T> = response.json().await?;

        Ok(envelope.data)
    }
}

#[async_trait]
impl CartService for StorefrontClient {
    async fn fetch_cart(&self) -> Result<CartSnapshot, CartServiceError> {
        let response = self.send(self.http.get(self.url("/cart"))).await?;

        Self::unwrap_envelope(response).await
    }

    async fn add_item(&self, item: NewItem) -> Result<CartSnapshot, CartServiceError> {
        let response = self
            .send(self.http.post(self.url("/cart")).json(&item))
            .await?;

        Self::unwrap_envelope(response).await
    }

    async fn update_item(
        &self,
        product_ref: ProductRef,
        variant_key: VariantKey,
        quantity: u32,
    ) -> Result<CartSnapshot, CartServiceError> {
        let url = self.url(&format!("/cart/items/{}", product_ref.as_str()));
        let body = serde_json::json!({ "purity": variant_key, "quantity": quantity });

        let response = self.send(self.http.put(url).json(&body)).await?;

        Self::unwrap_envelope(response).await
    }

    async fn remove_item(
        &self,
        product_ref: ProductRef,
        variant_key: VariantKey,
    ) -> Result<CartSnapshot, CartServiceError> {
        let url = self.url(&format!("/cart/items/{}", product_ref.as_str()));
        let body = serde_json::json!({ "purity": variant_key });

        let response = self.send(self.http.delete(url).json(&body)).await?;

        Self::unwrap_envelope(response).await
    }

    async fn clear_cart(&self) -> Result<(), CartServiceError> {
        self.send(self.http.delete(self.url("/cart"))).await?;

        Ok(())
    }
}

#[async_trait]
impl PricingService for StorefrontClient {
    async fn lock_prices(&self) -> Result<PriceLock, CartServiceError> {
        let response = self.send(self.http.post(self.url("/price-lock"))).await?;

        Self::unwrap_envelope(response).await
    }

    async fn unit_prices(
        &self,
        pairs: Vec<(ProductRef, VariantKey)>,
    ) -> Result<Vec<UnitQuote>, CartServiceError> {
        let quotes: Vec<serde_json::Value> = pairs
            .iter()
            .map(|(product_ref, variant_key)| {
                serde_json::json!({ "productId": product_ref, "purity": variant_key })
            })
            .collect();

        let body = serde_json::json!({ "items": quotes });

        let response = self
            .send(self.http.post(self.url("/prices/quote")).json(&body))
            .await?;

        Self::unwrap_envelope(response).await
    }
}
