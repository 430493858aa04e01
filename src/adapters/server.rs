use crate::core::aggregator::Aggregator;
use crate::domain::model::Response;
use crate::domain::ports::Upstream;
use crate::utils::error::{AggregatorError, Result};
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use std::sync::Arc;
use tokio::net::TcpListener;

/// Failed aggregation as seen by HTTP clients: a 502 without any partial data.
#[derive(Debug)]
pub struct ApiError(AggregatorError);

impl From<AggregatorError> for ApiError {
    fn from(error: AggregatorError) -> Self {
        Self(error)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        tracing::error!("GET /api failed: {}", self.0);

        let body = serde_json::json!({
            "error": self.0.user_friendly_message(),
            "failedPosts": self.0.failed_post_ids(),
        });
        (StatusCode::BAD_GATEWAY, Json(body)).into_response()
    }
}

pub fn router<U: Upstream + 'static>(aggregator: Arc<Aggregator<U>>) -> Router {
    Router::new()
        .route("/api", get(aggregate_handler::<U>))
        .with_state(aggregator)
}

async fn aggregate_handler<U: Upstream + 'static>(
    State(aggregator): State<Arc<Aggregator<U>>>,
) -> std::result::Result<Json<Vec<Response>>, ApiError> {
    let responses = aggregator.aggregate().await?;
    Ok(Json(responses))
}

/// Serves `GET /api` on `bind` until Ctrl-C.
pub async fn serve<U: Upstream + 'static>(aggregator: Arc<Aggregator<U>>, bind: &str) -> Result<()> {
    let listener = TcpListener::bind(bind).await?;
    tracing::info!("🚀 Listening on http://{}/api", listener.local_addr()?);

    axum::serve(listener, router(aggregator))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
