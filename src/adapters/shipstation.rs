use crate::domain::model::{
    NewTag, OrderId, ProductQuery, ProductsPage, ShipmentQuery, ShipmentsPage, Tag,
    WebhookOrderBatch,
};
use crate::domain::ports::ShippingApi;
use crate::utils::error::{DashError, Result};
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Method, RequestBuilder, Response};
use std::time::Duration;
use url::Url;

const UPSTREAM_FALLBACK_MESSAGE: &str = "ShipStation API Connection Failed";

/// ShipStation V2 client. The account API key travels in the custom
/// `api-key` header on every request.
pub struct ShipStationClient {
    client: Client,
    base_url: Url,
    api_key: String,
}

impl ShipStationClient {
    pub fn new(base_url: &str, api_key: &str, timeout_seconds: u64) -> Result<Self> {
        let base_url =
            Url::parse(base_url).map_err(|e| DashError::InvalidConfigValueError {
                field: "upstream.base_url".to_string(),
                value: base_url.to_string(),
                reason: format!("Invalid URL format: {}", e),
            })?;

        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_seconds))
            .build()?;

        Ok(Self {
            client,
            base_url,
            api_key: api_key.to_string(),
        })
    }

    /// 組出端點 URL，路徑片段交給 url crate 做百分比編碼
    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| DashError::InvalidConfigValueError {
                field: "upstream.base_url".to_string(),
                value: self.base_url.to_string(),
                reason: "URL cannot be a base for API paths".to_string(),
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        self.client
            .request(method, url)
            .header("api-key", &self.api_key)
            .header(CONTENT_TYPE, "application/json")
    }

    /// Map a non-2xx response to an upstream error carrying the
    /// provider's `message` field when one is present.
    async fn check(response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        tracing::error!("SS_SERVICE_ERROR: {} {}", status, body);

        let message = serde_json::from_str::<serde_json::Value>(&body)
            .ok()
            .and_then(|v| {
                v.get("message")
                    .and_then(|m| m.as_str())
                    .map(str::to_string)
            })
            .unwrap_or_else(|| UPSTREAM_FALLBACK_MESSAGE.to_string());

        Err(DashError::upstream(message))
    }
}

#[async_trait]
impl ShippingApi for ShipStationClient {
    async fn list_shipments(&self, query: &ShipmentQuery) -> Result<ShipmentsPage> {
        let url = self.endpoint(&["shipments"])?;
        let mut request = self.request(Method::GET, url).query(&[
            ("page", query.page.unwrap_or(1).to_string()),
            ("page_size", query.page_size.unwrap_or(100).to_string()),
        ]);

        if let Some(status) = &query.shipment_status {
            request = request.query(&[("shipment_status", status)]);
        }
        if let Some(tag) = &query.tag {
            request = request.query(&[("tag", tag)]);
        }

        tracing::debug!("Fetching shipments page {}", query.page.unwrap_or(1));
        let response = Self::check(request.send().await?).await?;
        Ok(response.json().await?)
    }

    async fn list_products(&self, query: &ProductQuery) -> Result<ProductsPage> {
        let url = self.endpoint(&["products"])?;
        let mut request = self.request(Method::GET, url).query(&[
            ("page", query.page.unwrap_or(1).to_string()),
            ("page_size", query.page_size.unwrap_or(100).to_string()),
        ]);

        if let Some(active) = query.active {
            request = request.query(&[("active", active.to_string())]);
        }
        if let Some(sku) = &query.sku {
            request = request.query(&[("sku", sku)]);
        }
        if let Some(name) = &query.name {
            request = request.query(&[("name", name)]);
        }

        let response = Self::check(request.send().await?).await?;
        Ok(response.json().await?)
    }

    async fn list_tags(&self) -> Result<Vec<Tag>> {
        let url = self.endpoint(&["tags"])?;
        let response = Self::check(self.request(Method::GET, url).send().await?).await?;
        let json_data: serde_json::Value = response.json().await?;

        // provider 版本差異：有的包在 tags 欄位，有的直接回陣列
        let tags = match json_data {
            serde_json::Value::Array(_) => serde_json::from_value(json_data)?,
            serde_json::Value::Object(mut obj) => match obj.remove("tags") {
                Some(list) => serde_json::from_value(list)?,
                None => Vec::new(),
            },
            _ => Vec::new(),
        };

        Ok(tags)
    }

    async fn create_tag(&self, tag: &NewTag) -> Result<Tag> {
        let url = self.endpoint(&["tags"])?;
        let response =
            Self::check(self.request(Method::POST, url).json(tag).send().await?).await?;
        Ok(response.json().await?)
    }

    async fn attach_tag(&self, order_id: &OrderId, tag_name: &str) -> Result<()> {
        let url = self.endpoint(&["shipments", &order_id.to_string(), "tags", tag_name])?;
        Self::check(self.request(Method::PUT, url).send().await?).await?;
        Ok(())
    }

    async fn detach_tag(&self, order_id: &OrderId, tag_name: &str) -> Result<()> {
        let url = self.endpoint(&["shipments", &order_id.to_string(), "tags", tag_name])?;
        Self::check(self.request(Method::DELETE, url).send().await?).await?;
        Ok(())
    }

    async fn fetch_order_batch(&self, resource_url: &str) -> Result<WebhookOrderBatch> {
        let url = Url::parse(resource_url).map_err(|e| {
            DashError::validation(format!("Invalid webhook resource URL: {}", e))
        })?;

        tracing::debug!("Fetching webhook resource: {}", url);
        let response = Self::check(self.request(Method::GET, url).send().await?).await?;
        Ok(response.json().await?)
    }
}
