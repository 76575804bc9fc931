//! Webhook request handlers.

use std::net::SocketAddr;

use axum::{
    body::Bytes,
    extract::{ConnectInfo, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};

use super::auth::verify_bearer;
use super::client_ip::client_ip;
use crate::app::App;
use crate::error::SyncError;
use crate::models::OptimizationPayload;
use crate::rate_limit::RateDecision;

/// Liveness plus a database round trip.
pub async fn health(State(app): State<App>) -> Response {
    match app.db.test_connection().await {
        Ok(()) => Json(json!({
            "status": "ok",
            "version": env!("CARGO_PKG_VERSION"),
        }))
        .into_response(),
        Err(e) => {
            tracing::error!("Health check database error: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({ "status": "unavailable" })),
            )
                .into_response()
        }
    }
}

/// `POST /clickrank-ai/v1/update-post`
pub async fn update_post(
    State(app): State<App>,
    peer: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let ip = client_ip(
        &headers,
        peer.map(|ConnectInfo(addr)| addr),
        app.settings.trust_forwarded_headers,
    );

    if let RateDecision::Limited { retry_after } = app.rate_limiter.check(&ip).await {
        tracing::warn!("Rate limit exceeded for {}", ip);
        return error_response(SyncError::RateLimited { retry_after });
    }

    let authorization = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());
    if let Err(e) = verify_bearer(app.settings.api_key(), authorization) {
        let message = match &e {
            SyncError::Forbidden(_) => format!("Webhook blocked: Invalid API key from IP: {}", ip),
            SyncError::Unauthorized(m) if m == "API key not configured" => {
                "Webhook blocked: No API key configured".to_string()
            }
            _ => "Webhook blocked: Invalid authorization".to_string(),
        };
        app.log.warning(&message, None).await;
        return error_response(e);
    }

    let payload = match parse_payload(&body) {
        Some(payload) => payload,
        None => return error_response(SyncError::Validation("Invalid request data".into())),
    };

    match app.engine.handle(payload).await {
        Ok(outcome) => {
            let mut body = serde_json::to_value(&outcome).unwrap_or_else(|_| json!({}));
            if let Value::Object(map) = &mut body {
                map.insert("success".into(), Value::Bool(true));
            }
            (StatusCode::OK, Json(body)).into_response()
        }
        Err(e) => error_response(e),
    }
}

/// A JSON object with a non-empty `page_url`.
fn parse_payload(body: &[u8]) -> Option<OptimizationPayload> {
    let value: Value = serde_json::from_slice(body).ok()?;
    if !value.is_object() {
        return None;
    }
    let payload: OptimizationPayload = serde_json::from_value(value).ok()?;
    (!payload.page_url.trim().is_empty()).then_some(payload)
}

fn error_response(error: SyncError) -> Response {
    let status =
        StatusCode::from_u16(error.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let message = match &error {
        SyncError::RateLimited { .. } => "Rate limit exceeded".to_string(),
        other => other.to_string(),
    };
    let mut response = (
        status,
        Json(json!({ "success": false, "message": message })),
    )
        .into_response();

    if let SyncError::RateLimited { retry_after } = error {
        if let Ok(value) = HeaderValue::from_str(&retry_after.as_secs().max(1).to_string()) {
            response.headers_mut().insert(header::RETRY_AFTER, value);
        }
    }
    response
}
