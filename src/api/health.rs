use std::sync::Arc;

use bytes::Bytes;
use http_body_util::Full;
use hyper::{Response, StatusCode};
use tracing::warn;

use crate::api::json_response;
use crate::error::Result;
use crate::registry::Registry;

/// Mirror readiness, including whether the catalog file currently loads
#[derive(serde::Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    extensions: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

/// Handle GET /health
///
/// Answers 503 while the catalog file is missing or unreadable.
pub async fn health(registry: Arc<dyn Registry>) -> Result<Response<Full<Bytes>>> {
    let (status, response) = match registry.document().await {
        Ok(document) => (
            StatusCode::OK,
            HealthResponse {
                status: "ok",
                version: env!("CARGO_PKG_VERSION"),
                extensions: Some(document.extensions.len()),
                error: None,
            },
        ),
        Err(e) => {
            warn!("Catalog unavailable: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                HealthResponse {
                    status: "unavailable",
                    version: env!("CARGO_PKG_VERSION"),
                    extensions: None,
                    error: Some(e.to_string()),
                },
            )
        }
    };

    let body = serde_json::to_string(&response)?;
    Ok(json_response(status, body))
}
