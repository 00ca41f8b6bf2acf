use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::{Path, Query},
    http::{Method, StatusCode},
    response::{IntoResponse, Json},
    routing::get,
    Extension, Router,
};
use hyper::Server;
use serde::Deserialize;
use serde_json::json;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use crate::pipeline::Processor;
use crate::storage::Storage;

#[derive(Deserialize)]
struct ListParams {
    #[serde(default = "default_limit")]
    limit: usize,
}

fn default_limit() -> usize {
    10
}

/// Health check endpoint
async fn health() -> impl IntoResponse {
    Json(json!({
        "status": "healthy",
        "service": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Trigger one pipeline run. Either reports success with counts or an error
/// with a reason string; never partial success.
async fn process_pending(
    Extension(storage): Extension<Arc<dyn Storage>>,
) -> impl IntoResponse {
    match Processor::new(storage).process_pending_batch().await {
        Ok(summary) => (
            StatusCode::OK,
            Json(json!({
                "status": "success",
                "processed_count": summary.processed_count,
                "canonical_count": summary.canonical_count,
            })),
        ),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "status": "error", "reason": e.to_string() })),
        ),
    }
}

async fn list_messages(
    Query(params): Query<ListParams>,
    Extension(storage): Extension<Arc<dyn Storage>>,
) -> impl IntoResponse {
    match storage.get_messages(params.limit, None).await {
        Ok(messages) => (StatusCode::OK, Json(json!(messages))),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": e.to_string() })),
        ),
    }
}

async fn list_messages_by_channel(
    Path(channel_title): Path<String>,
    Query(params): Query<ListParams>,
    Extension(storage): Extension<Arc<dyn Storage>>,
) -> impl IntoResponse {
    match storage
        .get_messages(params.limit, Some(&channel_title))
        .await
    {
        Ok(messages) => (StatusCode::OK, Json(json!(messages))),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": e.to_string() })),
        ),
    }
}

async fn list_raw_messages(
    Query(params): Query<ListParams>,
    Extension(storage): Extension<Arc<dyn Storage>>,
) -> impl IntoResponse {
    match storage.get_raw_messages(params.limit).await {
        Ok(messages) => (StatusCode::OK, Json(json!(messages))),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": e.to_string() })),
        ),
    }
}

#[derive(Deserialize)]
struct MessageUpdate {
    text: String,
}

async fn update_message(
    Path(key): Path<String>,
    Extension(storage): Extension<Arc<dyn Storage>>,
    Json(update): Json<MessageUpdate>,
) -> impl IntoResponse {
    let message_id: i64 = match key.parse() {
        Ok(id) => id,
        Err(_) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": "message id must be an integer" })),
            )
        }
    };
    match storage.update_message_text(message_id, &update.text).await {
        Ok(true) => (
            StatusCode::OK,
            Json(json!({ "message": format!("Message {message_id} updated") })),
        ),
        Ok(false) => (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": format!("Message {message_id} not found") })),
        ),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": e.to_string() })),
        ),
    }
}

async fn delete_message(
    Path(key): Path<String>,
    Extension(storage): Extension<Arc<dyn Storage>>,
) -> impl IntoResponse {
    let message_id: i64 = match key.parse() {
        Ok(id) => id,
        Err(_) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": "message id must be an integer" })),
            )
        }
    };
    match storage.delete_message(message_id).await {
        Ok(true) => (
            StatusCode::OK,
            Json(json!({ "message": format!("Message {message_id} deleted") })),
        ),
        Ok(false) => (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": format!("Message {message_id} not found") })),
        ),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": e.to_string() })),
        ),
    }
}

/// Create the HTTP server with all routes.
///
/// `/messages/:key` is read by channel title and written by message id,
/// matching the original API surface.
pub fn create_server(storage: Arc<dyn Storage>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .route("/process", axum::routing::post(process_pending))
        .route("/messages", get(list_messages))
        .route(
            "/messages/:key",
            get(list_messages_by_channel)
                .put(update_message)
                .delete(delete_message),
        )
        .route("/raw_messages", get(list_raw_messages))
        .layer(ServiceBuilder::new().layer(Extension(storage)).layer(cors))
}

pub async fn run_server(addr: SocketAddr, storage: Arc<dyn Storage>) -> anyhow::Result<()> {
    let app = create_server(storage);
    info!("API server listening on {addr}");
    Server::bind(&addr).serve(app.into_make_service()).await?;
    Ok(())
}
