use crate::core::report::summarize;
use crate::domain::model::{OrderId, OrderTagOutcome, TagAction, TagBatchReport, TagBatchRequest};
use crate::domain::ports::ShippingApi;
use crate::utils::error::{DashError, Result};
use std::sync::Arc;

/// Applies one tag action to every order in a request, one upstream call
/// per order. A single order's failure never aborts the batch.
pub struct TagBatchCoordinator {
    api: Arc<dyn ShippingApi>,
    max_in_flight: usize,
}

impl TagBatchCoordinator {
    pub fn new(api: Arc<dyn ShippingApi>) -> Self {
        Self {
            api,
            max_in_flight: 1,
        }
    }

    /// 上游是帳號層級的速率限制，預設一次只送一個請求
    pub fn with_max_in_flight(mut self, max_in_flight: usize) -> Self {
        self.max_in_flight = max_in_flight.max(1);
        self
    }

    pub async fn apply_tag_batch(&self, request: &TagBatchRequest) -> Result<TagBatchReport> {
        validate_request(request)?;

        let tag_name = request.tag_name.trim().to_string();
        tracing::info!(
            "Applying {:?} of \"{}\" to {} orders (max in flight: {})",
            request.action,
            tag_name,
            request.order_ids.len(),
            self.max_in_flight
        );

        let outcomes = if self.max_in_flight <= 1 {
            self.run_sequential(request, &tag_name).await
        } else {
            self.run_chunked(request, &tag_name).await
        };

        Ok(summarize(outcomes))
    }

    async fn run_sequential(
        &self,
        request: &TagBatchRequest,
        tag_name: &str,
    ) -> Vec<OrderTagOutcome> {
        let mut outcomes = Vec::with_capacity(request.order_ids.len());

        for order_id in &request.order_ids {
            let outcome =
                match apply_one(self.api.as_ref(), request.action, order_id, tag_name).await {
                    Ok(()) => OrderTagOutcome::success(order_id.clone()),
                    Err(e) => {
                        tracing::warn!("Tagging failed for order {}: {}", order_id, e);
                        OrderTagOutcome::failed(order_id.clone(), e.to_string())
                    }
                };
            outcomes.push(outcome);
        }

        outcomes
    }

    /// 分批並行；結果照輸入索引寫回，順序不變
    async fn run_chunked(
        &self,
        request: &TagBatchRequest,
        tag_name: &str,
    ) -> Vec<OrderTagOutcome> {
        let mut outcomes: Vec<Option<OrderTagOutcome>> = vec![None; request.order_ids.len()];
        let mut base = 0;

        for chunk in request.order_ids.chunks(self.max_in_flight) {
            let mut handles = Vec::with_capacity(chunk.len());

            for (offset, order_id) in chunk.iter().enumerate() {
                let api = Arc::clone(&self.api);
                let order_id = order_id.clone();
                let tag_name = tag_name.to_string();
                let action = request.action;

                handles.push((
                    base + offset,
                    tokio::spawn(async move {
                        match apply_one(api.as_ref(), action, &order_id, &tag_name).await {
                            Ok(()) => OrderTagOutcome::success(order_id),
                            Err(e) => {
                                tracing::warn!("Tagging failed for order {}: {}", order_id, e);
                                OrderTagOutcome::failed(order_id, e.to_string())
                            }
                        }
                    }),
                ));
            }

            for (index, handle) in handles {
                // join 失敗視同該筆失敗
                let outcome = match handle.await {
                    Ok(outcome) => outcome,
                    Err(e) => {
                        OrderTagOutcome::failed(request.order_ids[index].clone(), e.to_string())
                    }
                };
                outcomes[index] = Some(outcome);
            }

            base += chunk.len();
        }

        outcomes.into_iter().flatten().collect()
    }
}

async fn apply_one(
    api: &dyn ShippingApi,
    action: TagAction,
    order_id: &OrderId,
    tag_name: &str,
) -> Result<()> {
    match action {
        TagAction::Attach => api.attach_tag(order_id, tag_name).await,
        TagAction::Detach => api.detach_tag(order_id, tag_name).await,
    }
}

fn validate_request(request: &TagBatchRequest) -> Result<()> {
    if request.order_ids.is_empty() {
        return Err(DashError::validation("orderIds must be a non-empty array"));
    }
    if request.tag_name.trim().is_empty() {
        return Err(DashError::validation("tagName must not be blank"));
    }
    Ok(())
}
