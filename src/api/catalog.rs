use std::sync::Arc;

use bytes::Bytes;
use http_body_util::Full;
use hyper::{Response, StatusCode};

use crate::api::json_response;
use crate::error::Result;
use crate::registry::Registry;

/// Handle GET /api/extensions.json
pub async fn document(registry: Arc<dyn Registry>) -> Result<Response<Full<Bytes>>> {
    let document = registry.document().await?;
    let body = serde_json::to_string(&document)?;
    Ok(json_response(StatusCode::OK, body))
}

/// Handle GET /api/extensions/{id}
pub async fn get(registry: Arc<dyn Registry>, id: &str) -> Result<Response<Full<Bytes>>> {
    let extension = registry.get(id).await?;
    let body = serde_json::to_string(&extension)?;
    Ok(json_response(StatusCode::OK, body))
}
