use axum::{
    body::Bytes,
    extract::{Query, State},
    http::StatusCode,
    Extension, Json,
};
use giftrec_recommend::{parse_request, RecommendResponse};
use serde_json::Value;

use crate::middleware::RequestId;

use super::{ApiError, AppState};

#[derive(Debug, Default)]
pub(super) struct RecommendParams {
    page: Option<String>,
    debug: Option<String>,
}

/// First value of `key` in a raw query-pair list.
pub(super) fn first_value(pairs: &[(String, String)], key: &str) -> Option<String> {
    pairs
        .iter()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.clone())
}

impl RecommendParams {
    /// Repeated keys keep their first value; unknown keys are ignored.
    fn from_pairs(pairs: &[(String, String)]) -> Self {
        Self {
            page: first_value(pairs, "page"),
            debug: first_value(pairs, "debug"),
        }
    }

    /// Anything that is not a positive integer means page 1.
    fn page(&self) -> u32 {
        self.page
            .as_deref()
            .and_then(|p| p.trim().parse::<u32>().ok())
            .filter(|p| *p >= 1)
            .unwrap_or(1)
    }

    fn debug(&self) -> bool {
        self.debug.as_deref() == Some("1")
    }
}

/// An empty body is an empty object; anything else must be JSON.
fn parse_body(raw: &[u8]) -> Result<Value, serde_json::Error> {
    if raw.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Object(serde_json::Map::new()));
    }
    serde_json::from_slice(raw)
}

pub(super) async fn recommend(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(pairs): Query<Vec<(String, String)>>,
    body: Bytes,
) -> Result<Json<RecommendResponse>, ApiError> {
    let params = RecommendParams::from_pairs(&pairs);
    let body = parse_body(&body).map_err(|e| {
        tracing::error!(request_id = %req_id.0, error = %e, "malformed recommendation request");
        ApiError::new(req_id.0.clone(), "internal_error", "server error")
    })?;

    let ctx = parse_request(&body, params.page(), state.recommender.catalog());
    let response = state.recommender.recommend(&ctx, params.debug()).await;
    Ok(Json(response))
}

pub(super) async fn preflight() -> StatusCode {
    StatusCode::OK
}

pub(super) async fn method_not_allowed(Extension(req_id): Extension<RequestId>) -> ApiError {
    ApiError::new(req_id.0, "method_not_allowed", "POST only")
}
