//! REST API
//!
//! Provides HTTP endpoints for the scraped quotes and the views derived from
//! them.

use crate::{
    price_aggregator::QuoteAggregator,
    types::{AverageResult, Quote, SlippageEntry},
};
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::error;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub aggregator: Arc<QuoteAggregator>,
}

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/quotes", get(get_quotes))
        .route("/average", get(get_average))
        .route("/slippage", get(get_slippage))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// GET /quotes
///
/// Quotes from every source that answered. An empty list is still a success.
async fn get_quotes(State(state): State<AppState>) -> Json<Vec<Quote>> {
    Json(state.aggregator.get_quotes().await)
}

/// GET /average
async fn get_average(State(state): State<AppState>) -> Result<Json<AverageResult>, ApiError> {
    state.aggregator.get_average().await.map(Json).map_err(|e| {
        error!("Error fetching average: {}", e);
        ApiError::Internal("Failed to retrieve average")
    })
}

/// GET /slippage
async fn get_slippage(
    State(state): State<AppState>,
) -> Result<Json<Vec<SlippageEntry>>, ApiError> {
    state.aggregator.get_slippage().await.map(Json).map_err(|e| {
        error!("Error fetching slippage: {}", e);
        ApiError::Internal("Failed to retrieve slippage")
    })
}

// ============================================================================
// ERROR HANDLING
// ============================================================================

/// Error reported to clients
///
/// Carries only a fixed message; the underlying cause is logged, not sent.
#[derive(Debug)]
pub enum ApiError {
    Internal(&'static str),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        let body = Json(serde_json::json!({
            "error": message,
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{ManualClock, QuoteCache};
    use crate::sources::{stub::StubSource, QuoteSource};
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn router(sources: Vec<Arc<StubSource>>) -> Router {
        let sources = sources
            .into_iter()
            .map(|s| s as Arc<dyn QuoteSource>)
            .collect();
        let cache = Arc::new(QuoteCache::new(sources, ManualClock::new()));
        create_router(AppState {
            aggregator: Arc::new(QuoteAggregator::new(cache)),
        })
    }

    async fn get_json(router: &Router, path: &str) -> (StatusCode, Value) {
        let response = router
            .clone()
            .oneshot(Request::builder().uri(path).body(Body::empty()).unwrap())
            .await
            .unwrap();

        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_endpoints_with_quotes() {
        let router = router(vec![
            StubSource::quoting("https://a.example", 1000.0, 1010.0),
            StubSource::quoting("https://b.example", 1020.0, 1030.0),
        ]);

        let (status, body) = get_json(&router, "/quotes").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!([
                {"buy_price": 1000.0, "sell_price": 1010.0, "source": "https://a.example"},
                {"buy_price": 1020.0, "sell_price": 1030.0, "source": "https://b.example"},
            ])
        );

        let (status, body) = get_json(&router, "/average").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!({"average_buy_price": 1010.0, "average_sell_price": 1020.0})
        );

        let (status, body) = get_json(&router, "/slippage").await;
        assert_eq!(status, StatusCode::OK);
        let entries = body.as_array().unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0]["source"], "https://a.example");
        assert!(entries[0]["buy_price_slippage"].as_f64().unwrap() < 0.0);
        assert!(entries[0].get("error").is_none());
    }

    #[tokio::test]
    async fn test_endpoints_when_every_source_fails() {
        let router = router(vec![
            StubSource::failing("https://a.example"),
            StubSource::failing("https://b.example"),
        ]);

        let (status, body) = get_json(&router, "/quotes").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!([]));

        let (status, body) = get_json(&router, "/average").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, json!({"error": "Failed to retrieve average"}));

        let (status, body) = get_json(&router, "/slippage").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, json!({"error": "Failed to retrieve slippage"}));
    }

    #[tokio::test]
    async fn test_zero_price_quote_is_reported_not_failed() {
        let router = router(vec![
            StubSource::quoting("https://a.example", 0.0, 1010.0),
            StubSource::quoting("https://b.example", 1000.0, 1100.0),
        ]);

        let (status, body) = get_json(&router, "/slippage").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body[0],
            json!({
                "buy_price_slippage": null,
                "sell_price_slippage": null,
                "source": "https://a.example",
                "error": "Could not retrieve valid price from this source.",
            })
        );
        assert_eq!(body[1]["buy_price_slippage"], json!(0.0));
        assert_eq!(body[1]["sell_price_slippage"], json!(0.1));
    }
}
