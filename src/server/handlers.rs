use crate::core::auto_tag::ORDER_NOTIFY_EVENT;
use crate::domain::model::{NewTag, ProductQuery, ShipmentQuery, TagBatchRequest, WebhookEvent};
use crate::server::AppState;
use crate::utils::error::DashError;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

const INVALID_BATCH_PAYLOAD: &str =
    "Invalid payload: Requires orderIds array, tagName, and action ('attach' or 'detach').";

fn error_response(status: StatusCode, e: DashError) -> Response {
    (status, Json(json!({ "message": e.to_string() }))).into_response()
}

pub async fn health() -> impl IntoResponse {
    "API is healthy"
}

pub async fn fetch_shipments(
    State(state): State<AppState>,
    Query(query): Query<ShipmentQuery>,
) -> Response {
    match state.api.list_shipments(&query).await {
        Ok(page) => Json(page).into_response(),
        Err(e) => error_response(StatusCode::BAD_GATEWAY, e),
    }
}

pub async fn fetch_products(
    State(state): State<AppState>,
    Query(query): Query<ProductQuery>,
) -> Response {
    match state.api.list_products(&query).await {
        Ok(page) => Json(page).into_response(),
        Err(e) => error_response(StatusCode::BAD_GATEWAY, e),
    }
}

pub async fn get_all_tags(State(state): State<AppState>) -> Response {
    match state.api.list_tags().await {
        Ok(tags) => Json(tags).into_response(),
        Err(e) => error_response(StatusCode::INTERNAL_SERVER_ERROR, e),
    }
}

pub async fn create_new_tag(
    State(state): State<AppState>,
    Json(payload): Json<serde_json::Value>,
) -> Response {
    let name = payload
        .get("name")
        .and_then(|n| n.as_str())
        .map(str::trim)
        .unwrap_or_default();

    // 不收空白標籤名
    if name.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "message": "Tag name is required" })),
        )
            .into_response();
    }

    let new_tag = NewTag {
        name: name.to_string(),
        color: payload
            .get("color")
            .and_then(|c| c.as_str())
            .map(str::to_string),
    };

    match state.api.create_tag(&new_tag).await {
        Ok(tag) => (StatusCode::CREATED, Json(tag)).into_response(),
        Err(e) => error_response(StatusCode::INTERNAL_SERVER_ERROR, e),
    }
}

pub async fn update_order_tags(
    State(state): State<AppState>,
    Json(payload): Json<serde_json::Value>,
) -> Response {
    let request: TagBatchRequest = match serde_json::from_value(payload) {
        Ok(request) => request,
        Err(_) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({ "message": INVALID_BATCH_PAYLOAD })),
            )
                .into_response();
        }
    };

    match state.coordinator.apply_tag_batch(&request).await {
        Ok(report) => match report.failure_message() {
            None => (
                StatusCode::OK,
                Json(json!({
                    "message": "Tag update process complete",
                    "results": report.outcomes,
                })),
            )
                .into_response(),
            // 部分失敗：帶最後一筆錯誤訊息，成功的結果一併回傳
            Some(message) => (
                StatusCode::BAD_GATEWAY,
                Json(json!({
                    "message": message,
                    "results": report.outcomes,
                })),
            )
                .into_response(),
        },
        Err(DashError::ValidationError { message }) => (
            StatusCode::BAD_REQUEST,
            Json(json!({ "message": message })),
        )
            .into_response(),
        Err(e) => error_response(StatusCode::INTERNAL_SERVER_ERROR, e),
    }
}

pub async fn handle_shipstation_webhook(
    State(state): State<AppState>,
    Json(event): Json<WebhookEvent>,
) -> Response {
    tracing::info!("Webhook received: {} {}", event.resource_type, event.resource_url);

    // 只處理新訂單事件
    if event.resource_type != ORDER_NOTIFY_EVENT {
        return (StatusCode::OK, "Event ignored").into_response();
    }

    match state.tagger.process_batch(&event.resource_url).await {
        Ok(summary) => {
            tracing::info!(
                "Webhook processed: {} orders seen, {} tags applied, {} failures",
                summary.orders_seen,
                summary.tags_applied,
                summary.failures
            );
            (StatusCode::OK, "Webhook Processed Successfully").into_response()
        }
        Err(e) => {
            tracing::error!("Webhook Processing Error: {}", e);
            // 仍回 200，避免供應商認定服務掛了而停用 webhook
            (StatusCode::OK, "Webhook Processed with Errors").into_response()
        }
    }
}
