use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{ConnectInfo, Query, Request, State};
use axum::http::StatusCode;
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;

use crate::orchestrator::{PoemRequest, PoemService, ServeError};

impl IntoResponse for ServeError {
    fn into_response(self) -> Response {
        match self {
            ServeError::InvalidInput(msg) => {
                (StatusCode::BAD_REQUEST, Json(json!({ "error": msg }))).into_response()
            }
            ServeError::Internal(e) => {
                tracing::error!(error = ?e, "request failed unexpectedly");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({
                        "error": "internal server error",
                        "details": e.to_string(),
                    })),
                )
                    .into_response()
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct LocationQuery {
    latitude: Option<f64>,
    longitude: Option<f64>,
}

/// Builds the `/api` router over the shared service state.
pub fn router(svc: Arc<PoemService>) -> Router {
    Router::new()
        .route("/api/poem", post(poem))
        .route("/api/health", get(health))
        .route("/api/location", get(location))
        .layer(middleware::from_fn_with_state(svc.clone(), rate_limit))
        .with_state(svc)
}

async fn poem(
    State(svc): State<Arc<PoemService>>,
    body: Result<Json<PoemRequest>, JsonRejection>,
) -> Result<Json<serde_json::Value>, ServeError> {
    let Json(req) = body.map_err(|e| ServeError::InvalidInput(e.to_string()))?;
    let poem = svc.compose_poem(req).await?;
    Ok(Json(json!({ "poem": poem })))
}

async fn health(State(svc): State<Arc<PoemService>>) -> impl IntoResponse {
    Json(svc.health().await)
}

async fn location(
    State(svc): State<Arc<PoemService>>,
    query: Result<Query<LocationQuery>, QueryRejection>,
) -> Result<Json<serde_json::Value>, ServeError> {
    let Query(q) = query.map_err(|e| ServeError::InvalidInput(e.to_string()))?;
    let name = svc.resolve_location(q.latitude, q.longitude).await?;
    Ok(Json(json!({ "locationName": name })))
}

async fn rate_limit(
    State(svc): State<Arc<PoemService>>,
    req: Request,
    next: Next,
) -> Response {
    let client = client_identity(&req);
    if !svc.limiter().allow(&client).await {
        tracing::debug!(%client, "rate limit exceeded");
        return (
            StatusCode::TOO_MANY_REQUESTS,
            "Too many requests, please try again later.",
        )
            .into_response();
    }
    next.run(req).await
}

/// Client identity for rate limiting: the forwarded address when fronted
/// by a proxy, otherwise the peer address.
fn client_identity(req: &Request) -> String {
    if let Some(forwarded) = req
        .headers()
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
    {
        let forwarded = forwarded.trim();
        if !forwarded.is_empty() {
            return forwarded.to_string();
        }
    }
    req.extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|info| info.0.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}
