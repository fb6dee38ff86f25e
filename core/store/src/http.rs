//! HTTP item store client.
//!
//! Speaks the JSON protocol of the vault item service:
//! - `POST   {base}/vault/items`      body: item, response: `{ "id": ... }`
//! - `GET    {base}/vault/items`      response: `{ "items": [...] }` or `[...]`
//! - `GET    {base}/vault/items/{id}` response: item
//! - `DELETE {base}/vault/items/{id}`
//! - `GET    {base}/healthz`
//!
//! `POST` carries an id chosen here, once per `create` call. The service
//! keys items by that id, so a retried `POST` whose first response was lost
//! overwrites the same item instead of storing a second copy.

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info};
use url::Url;
use uuid::Uuid;

use crate::provider::{validate_item, ItemStore};
use crate::retry::{RetryConfig, RetryExecutor};
use zkvault_common::{Error, ItemId, Result};
use zkvault_crypto::CipherItem;

const ITEMS_PATH: &str = "vault/items";
const HEALTH_PATH: &str = "healthz";

#[derive(Debug, Deserialize)]
struct CreatedResponse {
    id: ItemId,
}

/// The service wraps the list in `{ "items": [...] }`; older deployments
/// return the bare array.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ListResponse {
    Bare(Vec<CipherItem>),
    Wrapped {
        #[serde(default)]
        items: Vec<CipherItem>,
    },
}

impl ListResponse {
    fn into_items(self) -> Vec<CipherItem> {
        match self {
            ListResponse::Bare(items) | ListResponse::Wrapped { items } => items,
        }
    }
}

/// Item store reached over HTTP(S).
pub struct HttpStore {
    http: Client,
    base: Url,
    retry: RetryExecutor,
}

impl HttpStore {
    /// Create a client for the service at `api_base`.
    ///
    /// # Errors
    /// - `InvalidInput` if `api_base` is not an http(s) URL
    /// - `Network` if the HTTP client cannot be built
    pub fn new(api_base: &str, timeout: Duration, retry: RetryConfig) -> Result<Self> {
        let base = parse_base(api_base)?;

        let http = Client::builder()
            .user_agent(concat!("zkvault/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Network(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base,
            retry: RetryExecutor::new(retry),
        })
    }

    /// Base URL of the service.
    pub fn base(&self) -> &Url {
        &self.base
    }

    /// Check the service answers its health endpoint.
    pub async fn health(&self) -> Result<()> {
        let url = self.endpoint(&[HEALTH_PATH])?;
        let http = &self.http;

        self.retry
            .execute("health", move || {
                let url = url.clone();
                async move {
                    let response = http.get(url).send().await.map_err(transport)?;
                    check_status(response).await.map(|_| ())
                }
            })
            .await
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| Error::InvalidInput(format!("Cannot use {} as a base URL", self.base)))?
            .pop_if_empty()
            .extend(segments.iter().flat_map(|s| s.split('/')));
        Ok(url)
    }

    fn item_endpoint(&self, id: &ItemId) -> Result<Url> {
        let mut url = self.endpoint(&[ITEMS_PATH])?;
        url.path_segments_mut()
            .map_err(|_| Error::InvalidInput(format!("Cannot use {} as a base URL", self.base)))?
            .push(id.as_str());
        Ok(url)
    }
}

#[async_trait]
impl ItemStore for HttpStore {
    fn name(&self) -> &str {
        "http"
    }

    async fn create(&self, item: &CipherItem) -> Result<ItemId> {
        validate_item(item)?;

        let url = self.endpoint(&[ITEMS_PATH])?;
        let http = &self.http;
        let body = &CipherItem {
            id: Some(ItemId::new(Uuid::new_v4().to_string())?),
            ..item.clone()
        };

        let created: CreatedResponse = self
            .retry
            .execute("create", move || {
                let url = url.clone();
                async move {
                    let response = http.post(url).json(body).send().await.map_err(transport)?;
                    parse_json(response).await
                }
            })
            .await?;

        info!(id = %created.id, "Item stored");
        Ok(created.id)
    }

    async fn list(&self) -> Result<Vec<CipherItem>> {
        let url = self.endpoint(&[ITEMS_PATH])?;
        let http = &self.http;

        let listed: ListResponse = self
            .retry
            .execute("list", move || {
                let url = url.clone();
                async move {
                    let response = http.get(url).send().await.map_err(transport)?;
                    parse_json(response).await
                }
            })
            .await?;

        let items = listed.into_items();
        debug!(count = items.len(), "Items listed");
        Ok(items)
    }

    async fn get(&self, id: &ItemId) -> Result<CipherItem> {
        let url = self.item_endpoint(id)?;
        let http = &self.http;

        self.retry
            .execute("get", move || {
                let url = url.clone();
                async move {
                    let response = http.get(url).send().await.map_err(transport)?;
                    parse_json(response).await
                }
            })
            .await
    }

    async fn delete(&self, id: &ItemId) -> Result<()> {
        let url = self.item_endpoint(id)?;
        let http = &self.http;

        self.retry
            .execute("delete", move || {
                let url = url.clone();
                async move {
                    let response = http.delete(url).send().await.map_err(transport)?;
                    check_status(response).await.map(|_| ())
                }
            })
            .await?;

        info!(id = %id, "Item deleted");
        Ok(())
    }
}

fn parse_base(api_base: &str) -> Result<Url> {
    let url = Url::parse(api_base)
        .map_err(|e| Error::InvalidInput(format!("Invalid API base '{}': {}", api_base, e)))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(Error::InvalidInput(format!(
            "Unsupported API scheme '{}'",
            other
        ))),
    }
}

fn transport(e: reqwest::Error) -> Error {
    Error::Network(format!("Request failed: {}", e))
}

async fn parse_json<T: DeserializeOwned>(response: Response) -> Result<T> {
    check_status(response)
        .await?
        .json()
        .await
        .map_err(|e| Error::Serialization(format!("Failed to parse response: {}", e)))
}

async fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(status_error(status, &body))
}

fn status_error(status: StatusCode, body: &str) -> Error {
    match status {
        StatusCode::NOT_FOUND => Error::NotFound("Item not found".to_string()),
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            Error::NotPermitted(format!("Store refused access: {}", status))
        }
        StatusCode::BAD_REQUEST => Error::InvalidInput(format!("Store rejected item: {}", body)),
        s if s.is_server_error() || s == StatusCode::TOO_MANY_REQUESTS => {
            Error::Network(format!("API error: {} - {}", status, body))
        }
        _ => Error::Storage(format!("API error: {} - {}", status, body)),
    }
}
