use crate::domain::model::{
    NewTag, OrderId, ProductQuery, ProductsPage, ShipmentQuery, ShipmentsPage, Tag,
    WebhookOrderBatch,
};
use crate::utils::error::Result;
use async_trait::async_trait;

/// Boundary to the upstream shipping-management system. The upstream is
/// the system of record; every call here is one HTTP round trip.
#[async_trait]
pub trait ShippingApi: Send + Sync {
    async fn list_shipments(&self, query: &ShipmentQuery) -> Result<ShipmentsPage>;

    async fn list_products(&self, query: &ProductQuery) -> Result<ProductsPage>;

    async fn list_tags(&self) -> Result<Vec<Tag>>;

    async fn create_tag(&self, tag: &NewTag) -> Result<Tag>;

    async fn attach_tag(&self, order_id: &OrderId, tag_name: &str) -> Result<()>;

    async fn detach_tag(&self, order_id: &OrderId, tag_name: &str) -> Result<()>;

    /// Fetch the order batch a webhook notification points at. The
    /// resource URL is absolute and comes from the provider.
    async fn fetch_order_batch(&self, resource_url: &str) -> Result<WebhookOrderBatch>;
}
