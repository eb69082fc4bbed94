mod handlers;

use crate::config::AppConfig;
use crate::core::auto_tag::AutoTagger;
use crate::core::tag_batch::TagBatchCoordinator;
use crate::domain::ports::ShippingApi;
use axum::http::{HeaderValue, Method};
use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

#[derive(Clone)]
pub struct AppState {
    pub api: Arc<dyn ShippingApi>,
    pub coordinator: Arc<TagBatchCoordinator>,
    pub tagger: Arc<AutoTagger>,
}

impl AppState {
    pub fn new(api: Arc<dyn ShippingApi>, config: &AppConfig) -> Self {
        let coordinator = TagBatchCoordinator::new(Arc::clone(&api))
            .with_max_in_flight(config.batch.max_in_flight);
        let tagger = AutoTagger::new(Arc::clone(&api))
            .with_tag_color(config.webhook.auto_tag_color.clone());

        Self {
            api,
            coordinator: Arc::new(coordinator),
            tagger: Arc::new(tagger),
        }
    }
}

pub fn build_router(state: AppState, cors_origins: &[String]) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/api/shipments", get(handlers::fetch_shipments))
        .route("/api/shipments/tags", post(handlers::update_order_tags))
        .route(
            "/api/tags",
            get(handlers::get_all_tags).post(handlers::create_new_tag),
        )
        .route("/api/products", get(handlers::fetch_products))
        .route(
            "/api/webhooks/shipstation",
            post(handlers::handle_shipstation_webhook),
        )
        .layer(cors_layer(cors_origins))
        .with_state(state)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any);

    let parsed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    if parsed.is_empty() {
        layer.allow_origin(Any)
    } else {
        layer.allow_origin(AllowOrigin::list(parsed))
    }
}
