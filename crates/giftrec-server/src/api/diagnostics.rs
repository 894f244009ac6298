use axum::{
    body::Bytes,
    extract::{Query, State},
    Json,
};
use giftrec_affiliate::{probe, ProbeRequest};
use serde_json::{json, Value};

use super::recommendations::first_value;
use super::AppState;

#[derive(Debug, Default)]
pub(super) struct ProbeParams {
    kw: Option<String>,
    lang: Option<String>,
    page: Option<String>,
    ship: Option<String>,
    priced: Option<String>,
}

impl ProbeParams {
    fn from_pairs(pairs: &[(String, String)]) -> Self {
        Self {
            kw: first_value(pairs, "kw"),
            lang: first_value(pairs, "lang"),
            page: first_value(pairs, "page"),
            ship: first_value(pairs, "ship"),
            priced: first_value(pairs, "priced"),
        }
    }
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Query parameters first; a JSON body may override `keywords` and `lang`.
fn probe_request(params: &ProbeParams, body: &[u8]) -> ProbeRequest {
    let defaults = ProbeRequest::default();
    let json: Value = serde_json::from_slice(body).unwrap_or(Value::Null);
    let body_text = |key: &str| non_blank(json.get(key).and_then(Value::as_str));

    ProbeRequest {
        keywords: body_text("keywords")
            .or_else(|| non_blank(params.kw.as_deref()))
            .unwrap_or(defaults.keywords),
        lang: body_text("lang")
            .or_else(|| non_blank(params.lang.as_deref()))
            .unwrap_or(defaults.lang),
        page: params
            .page
            .as_deref()
            .and_then(|p| p.trim().parse::<u32>().ok())
            .filter(|p| *p >= 1)
            .unwrap_or(defaults.page),
        ship: non_blank(params.ship.as_deref()).map(|s| s.to_ascii_uppercase()),
        priced: params.priced.as_deref() == Some("1"),
    }
}

/// Runs one raw upstream query and reports its shape. Always answers 200;
/// failures are described in the body.
pub(super) async fn probe_upstream(
    State(state): State<AppState>,
    Query(pairs): Query<Vec<(String, String)>>,
    body: Bytes,
) -> Json<Value> {
    let params = ProbeParams::from_pairs(&pairs);
    if !state.credentials.all() {
        return Json(json!({
            "error": "missing upstream credentials",
            "info": state.credentials,
        }));
    }

    let request = probe_request(&params, &body);
    match probe(state.recommender.source(), &request).await {
        Ok(report) => Json(serde_json::to_value(report).unwrap_or(Value::Null)),
        Err(e) => {
            tracing::warn!(error = %e, "upstream probe failed");
            Json(json!({ "error": e.to_string() }))
        }
    }
}
