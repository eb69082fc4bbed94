use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Shipment identifier as ShipStation sends it: numeric in V1-style
/// webhook payloads, string in V2 resources.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OrderId {
    Number(i64),
    Text(String),
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderId::Number(n) => write!(f, "{}", n),
            OrderId::Text(s) => f.write_str(s),
        }
    }
}

impl From<i64> for OrderId {
    fn from(n: i64) -> Self {
        OrderId::Number(n)
    }
}

impl From<&str> for OrderId {
    fn from(s: &str) -> Self {
        OrderId::Text(s.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TagAction {
    // 舊版前端送 add / remove，保留別名
    #[serde(alias = "add")]
    Attach,
    #[serde(alias = "remove")]
    Detach,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutcomeStatus {
    Success,
    Failed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TagBatchRequest {
    #[serde(alias = "shipmentIds")]
    pub order_ids: Vec<OrderId>,
    #[serde(alias = "tag_name")]
    pub tag_name: String,
    pub action: TagAction,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderTagOutcome {
    pub order_id: OrderId,
    pub status: OutcomeStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl OrderTagOutcome {
    pub fn success(order_id: OrderId) -> Self {
        Self {
            order_id,
            status: OutcomeStatus::Success,
            error_message: None,
        }
    }

    pub fn failed(order_id: OrderId, message: impl Into<String>) -> Self {
        Self {
            order_id,
            status: OutcomeStatus::Failed,
            error_message: Some(message.into()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum BatchStatus {
    Success,
    PartialFailure { message: String },
}

/// Built fresh for every batch request, never persisted.
#[derive(Debug, Clone)]
pub struct TagBatchReport {
    pub outcomes: Vec<OrderTagOutcome>,
    pub overall: BatchStatus,
}

impl TagBatchReport {
    pub fn is_success(&self) -> bool {
        self.overall == BatchStatus::Success
    }

    pub fn failure_message(&self) -> Option<&str> {
        match &self.overall {
            BatchStatus::Success => None,
            BatchStatus::PartialFailure { message } => Some(message),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tag {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewTag {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

/// Line item. Pricing objects coming back from shipments can be complex,
/// so the raw value is kept as-is.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderItem {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub sku: Option<String>,
    #[serde(default, alias = "unitPrice", skip_serializing_if = "Option::is_none")]
    pub unit_price: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Shipment {
    pub shipment_id: OrderId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shipment_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shipment_status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ship_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<Tag>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub items: Vec<OrderItem>,
    // ShipStation sends far more fields than the dashboard renders;
    // pass them through untouched
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ShipmentsPage {
    #[serde(default)]
    pub shipments: Vec<Shipment>,
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub page: u32,
    #[serde(default)]
    pub pages: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_id: Option<OrderId>,
    #[serde(default)]
    pub sku: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProductsPage {
    #[serde(default)]
    pub products: Vec<Product>,
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub page: u32,
    #[serde(default)]
    pub pages: u32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ShipmentQuery {
    #[serde(default)]
    pub page: Option<u32>,
    #[serde(default, alias = "pageSize")]
    pub page_size: Option<u32>,
    #[serde(default)]
    pub shipment_status: Option<String>,
    #[serde(default)]
    pub tag: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProductQuery {
    #[serde(default)]
    pub page: Option<u32>,
    #[serde(default, alias = "pageSize")]
    pub page_size: Option<u32>,
    #[serde(default)]
    pub active: Option<bool>,
    #[serde(default)]
    pub sku: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookEvent {
    pub resource_url: String,
    pub resource_type: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WebhookOrderBatch {
    #[serde(default)]
    pub orders: Vec<WebhookOrder>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookOrder {
    pub order_id: OrderId,
    #[serde(default)]
    pub order_number: Option<String>,
    #[serde(default)]
    pub items: Vec<OrderItem>,
}
