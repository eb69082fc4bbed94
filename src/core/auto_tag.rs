use crate::domain::model::{NewTag, WebhookOrder};
use crate::domain::ports::ShippingApi;
use crate::utils::error::Result;
use std::collections::HashSet;
use std::sync::Arc;

pub const ORDER_NOTIFY_EVENT: &str = "ORDER_NOTIFY";
pub const DEFAULT_TAG_COLOR: &str = "#3b82f6";

/// Derive a short, URL-safe tag name from a free-text item name: keep
/// letters, digits and whitespace, then take the first three words.
/// Returns None when nothing usable remains.
pub fn derive_tag_name(item_name: &str) -> Option<String> {
    let cleaned: String = item_name
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace())
        .collect();

    let tag_name = cleaned
        .split_whitespace()
        .take(3)
        .collect::<Vec<_>>()
        .join(" ");

    if tag_name.is_empty() {
        None
    } else {
        Some(tag_name)
    }
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct AutoTagSummary {
    pub orders_seen: usize,
    pub tags_applied: usize,
    pub failures: usize,
}

/// Tags newly imported orders by their item names when the provider
/// notifies us through a webhook.
pub struct AutoTagger {
    api: Arc<dyn ShippingApi>,
    tag_color: String,
}

impl AutoTagger {
    pub fn new(api: Arc<dyn ShippingApi>) -> Self {
        Self {
            api,
            tag_color: DEFAULT_TAG_COLOR.to_string(),
        }
    }

    pub fn with_tag_color(mut self, color: impl Into<String>) -> Self {
        self.tag_color = color.into();
        self
    }

    /// Fetch the notified order batch and tag every order by its item
    /// names. One item's failure never stops the remaining items or
    /// orders.
    pub async fn process_batch(&self, resource_url: &str) -> Result<AutoTagSummary> {
        let batch = self.api.fetch_order_batch(resource_url).await?;

        let mut summary = AutoTagSummary::default();
        // 同一次 webhook 內已嘗試建立過的標籤
        let mut attempted = HashSet::new();

        for order in &batch.orders {
            summary.orders_seen += 1;
            self.tag_order_items(order, &mut attempted, &mut summary)
                .await;
        }

        Ok(summary)
    }

    async fn tag_order_items(
        &self,
        order: &WebhookOrder,
        attempted: &mut HashSet<String>,
        summary: &mut AutoTagSummary,
    ) {
        for item in &order.items {
            let Some(item_name) = item.name.as_deref() else {
                continue;
            };
            let Some(tag_name) = derive_tag_name(item_name) else {
                continue;
            };

            if attempted.insert(tag_name.clone()) {
                // 建立標籤是 best effort；已存在時上游會回錯誤
                let new_tag = NewTag {
                    name: tag_name.clone(),
                    color: Some(self.tag_color.clone()),
                };
                if let Err(e) = self.api.create_tag(&new_tag).await {
                    tracing::debug!("Tag creation skipped for \"{}\": {}", tag_name, e);
                }
            }

            let order_display = order
                .order_number
                .clone()
                .unwrap_or_else(|| order.order_id.to_string());

            match self.api.attach_tag(&order.order_id, &tag_name).await {
                Ok(()) => {
                    summary.tags_applied += 1;
                    tracing::info!(
                        "✅ Automatically tagged Order {} with \"{}\"",
                        order_display,
                        tag_name
                    );
                }
                Err(e) => {
                    summary.failures += 1;
                    tracing::error!("❌ Failed to tag Order {}: {}", order_display, e);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{
        OrderId, OrderItem, ProductQuery, ProductsPage, ShipmentQuery, ShipmentsPage, Tag,
        WebhookOrderBatch,
    };
    use crate::utils::error::DashError;
    use async_trait::async_trait;
    use tokio::sync::Mutex;

    #[test]
    fn test_derive_strips_punctuation_and_keeps_three_words() {
        assert_eq!(
            derive_tag_name("Men's T-Shirt (Blue/Large)!!"),
            Some("Mens TShirt BlueLarge".to_string())
        );
    }

    #[test]
    fn test_derive_truncates_to_three_words() {
        assert_eq!(
            derive_tag_name("Organic Cotton Crew Neck Tee"),
            Some("Organic Cotton Crew".to_string())
        );
    }

    #[test]
    fn test_derive_collapses_whitespace_runs() {
        assert_eq!(
            derive_tag_name("  Blue \t  Mug  "),
            Some("Blue Mug".to_string())
        );
    }

    #[test]
    fn test_derive_strips_underscores() {
        assert_eq!(derive_tag_name("a_b c"), Some("ab c".to_string()));
    }

    #[test]
    fn test_derive_punctuation_only_yields_none() {
        assert_eq!(derive_tag_name("!!!"), None);
        assert_eq!(derive_tag_name("   "), None);
        assert_eq!(derive_tag_name(""), None);
    }

    struct WebhookMockApi {
        batch: WebhookOrderBatch,
        created: Mutex<Vec<String>>,
        attached: Mutex<Vec<String>>,
        fail_create: bool,
        fail_attach_for: Option<String>,
    }

    impl WebhookMockApi {
        fn with_orders(orders: Vec<WebhookOrder>) -> Self {
            Self {
                batch: WebhookOrderBatch { orders },
                created: Mutex::new(Vec::new()),
                attached: Mutex::new(Vec::new()),
                fail_create: false,
                fail_attach_for: None,
            }
        }

        fn failing_creates(mut self) -> Self {
            self.fail_create = true;
            self
        }

        fn failing_attach_for(mut self, tag_name: &str) -> Self {
            self.fail_attach_for = Some(tag_name.to_string());
            self
        }
    }

    #[async_trait]
    impl ShippingApi for WebhookMockApi {
        async fn list_shipments(&self, _query: &ShipmentQuery) -> Result<ShipmentsPage> {
            Ok(ShipmentsPage::default())
        }

        async fn list_products(&self, _query: &ProductQuery) -> Result<ProductsPage> {
            Ok(ProductsPage::default())
        }

        async fn list_tags(&self) -> Result<Vec<Tag>> {
            Ok(Vec::new())
        }

        async fn create_tag(&self, tag: &NewTag) -> Result<Tag> {
            self.created.lock().await.push(tag.name.clone());
            if self.fail_create {
                return Err(DashError::upstream("Tag already exists"));
            }
            Ok(Tag {
                name: tag.name.clone(),
                color: tag.color.clone(),
            })
        }

        async fn attach_tag(&self, order_id: &OrderId, tag_name: &str) -> Result<()> {
            self.attached
                .lock()
                .await
                .push(format!("{}:{}", order_id, tag_name));
            if self.fail_attach_for.as_deref() == Some(tag_name) {
                return Err(DashError::upstream("Order not found"));
            }
            Ok(())
        }

        async fn detach_tag(&self, _order_id: &OrderId, _tag_name: &str) -> Result<()> {
            Ok(())
        }

        async fn fetch_order_batch(&self, _resource_url: &str) -> Result<WebhookOrderBatch> {
            Ok(self.batch.clone())
        }
    }

    fn order(id: i64, number: &str, item_names: Vec<&str>) -> WebhookOrder {
        WebhookOrder {
            order_id: OrderId::Number(id),
            order_number: Some(number.to_string()),
            items: item_names
                .into_iter()
                .map(|name| OrderItem {
                    name: Some(name.to_string()),
                    sku: None,
                    unit_price: None,
                })
                .collect(),
        }
    }

    #[tokio::test]
    async fn test_tags_every_item_of_every_order() {
        let api = Arc::new(WebhookMockApi::with_orders(vec![
            order(1, "1001", vec!["Blue Mug", "Red Mug"]),
            order(2, "1002", vec!["Blue Mug"]),
        ]));
        let tagger = AutoTagger::new(api.clone());

        let summary = tagger.process_batch("http://example.com/batch").await.unwrap();

        assert_eq!(summary.orders_seen, 2);
        assert_eq!(summary.tags_applied, 3);
        assert_eq!(summary.failures, 0);
        assert_eq!(
            api.attached.lock().await.clone(),
            vec!["1:Blue Mug", "1:Red Mug", "2:Blue Mug"]
        );
    }

    #[tokio::test]
    async fn test_creates_each_tag_once_per_run_even_when_creation_fails() {
        let api = Arc::new(
            WebhookMockApi::with_orders(vec![
                order(1, "1001", vec!["Blue Mug"]),
                order(2, "1002", vec!["Blue Mug"]),
            ])
            .failing_creates(),
        );
        let tagger = AutoTagger::new(api.clone());

        let summary = tagger.process_batch("http://example.com/batch").await.unwrap();

        // creation failed but the name is still used for both orders
        assert_eq!(api.created.lock().await.clone(), vec!["Blue Mug"]);
        assert_eq!(summary.tags_applied, 2);
    }

    #[tokio::test]
    async fn test_attach_failure_does_not_stop_siblings() {
        let api = Arc::new(
            WebhookMockApi::with_orders(vec![order(
                1,
                "1001",
                vec!["Bad Item", "Good Item"],
            )])
            .failing_attach_for("Bad Item"),
        );
        let tagger = AutoTagger::new(api.clone());

        let summary = tagger.process_batch("http://example.com/batch").await.unwrap();

        assert_eq!(summary.failures, 1);
        assert_eq!(summary.tags_applied, 1);
        assert_eq!(api.attached.lock().await.len(), 2);
    }

    #[tokio::test]
    async fn test_punctuation_only_items_are_skipped_silently() {
        let api = Arc::new(WebhookMockApi::with_orders(vec![order(
            1,
            "1001",
            vec!["!!!"],
        )]));
        let tagger = AutoTagger::new(api.clone());

        let summary = tagger.process_batch("http://example.com/batch").await.unwrap();

        assert_eq!(summary.tags_applied, 0);
        assert_eq!(summary.failures, 0);
        assert!(api.created.lock().await.is_empty());
        assert!(api.attached.lock().await.is_empty());
    }

    #[tokio::test]
    async fn test_items_without_name_are_skipped() {
        let api = Arc::new(WebhookMockApi::with_orders(vec![WebhookOrder {
            order_id: OrderId::Number(1),
            order_number: None,
            items: vec![OrderItem {
                name: None,
                sku: Some("SKU-1".to_string()),
                unit_price: None,
            }],
        }]));
        let tagger = AutoTagger::new(api.clone());

        let summary = tagger.process_batch("http://example.com/batch").await.unwrap();

        assert_eq!(summary.tags_applied, 0);
        assert!(api.attached.lock().await.is_empty());
    }

    #[tokio::test]
    async fn test_custom_tag_color_is_used() {
        struct ColorCapture {
            color: Mutex<Option<String>>,
        }

        #[async_trait]
        impl ShippingApi for ColorCapture {
            async fn list_shipments(&self, _q: &ShipmentQuery) -> Result<ShipmentsPage> {
                Ok(ShipmentsPage::default())
            }
            async fn list_products(&self, _q: &ProductQuery) -> Result<ProductsPage> {
                Ok(ProductsPage::default())
            }
            async fn list_tags(&self) -> Result<Vec<Tag>> {
                Ok(Vec::new())
            }
            async fn create_tag(&self, tag: &NewTag) -> Result<Tag> {
                *self.color.lock().await = tag.color.clone();
                Ok(Tag {
                    name: tag.name.clone(),
                    color: tag.color.clone(),
                })
            }
            async fn attach_tag(&self, _id: &OrderId, _t: &str) -> Result<()> {
                Ok(())
            }
            async fn detach_tag(&self, _id: &OrderId, _t: &str) -> Result<()> {
                Ok(())
            }
            async fn fetch_order_batch(&self, _u: &str) -> Result<WebhookOrderBatch> {
                Ok(WebhookOrderBatch {
                    orders: vec![WebhookOrder {
                        order_id: OrderId::Number(1),
                        order_number: None,
                        items: vec![OrderItem {
                            name: Some("Mug".to_string()),
                            sku: None,
                            unit_price: None,
                        }],
                    }],
                })
            }
        }

        let api = Arc::new(ColorCapture {
            color: Mutex::new(None),
        });
        let tagger = AutoTagger::new(api.clone()).with_tag_color("#22c55e");

        tagger.process_batch("http://example.com/batch").await.unwrap();

        assert_eq!(api.color.lock().await.clone(), Some("#22c55e".to_string()));
    }
}
